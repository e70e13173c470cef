// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::helpers::{draft, id, now, region, write_xx_region, zone};
use crate::{
    LoadedRegion, PersistenceError, RESET_BACKUP_LABEL, RegionPaths, RegionStore, journal_path,
    read_change_log, read_palette,
};
use std::fs;
use zonemap_audit::{ChangeEvent, ChangeLog};
use zonemap_domain::{Palette, ZoneColor};

fn create_test_store(dir: &std::path::Path) -> RegionStore {
    let paths: RegionPaths = write_xx_region(dir);
    RegionStore::new(region(), paths)
}

fn recolored_palette(store: &RegionStore) -> Palette {
    let mut palette: Palette = store.load(now()).unwrap().view.palette().clone();
    palette
        .recolor(&zone("North"), ZoneColor::parse("#112233").unwrap())
        .unwrap();
    palette
}

#[test]
fn test_persisted_mutation_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let store: RegionStore = create_test_store(dir.path());
    let mut log: ChangeLog = ChangeLog::new(now());
    let events: Vec<ChangeEvent> = log.append(vec![draft("001", "North", "South")], now());

    store.persist_mutation(None, &log, &events, now()).unwrap();

    let loaded: LoadedRegion = store.load(now()).unwrap();
    assert_eq!(loaded.view.row(&id("001")).unwrap().municipality.zone, zone("South"));
    assert!(journal_path(&store.paths().history_dir, now()).is_file());
}

#[test]
fn test_failed_change_log_write_restores_previous_palette() {
    let dir = tempfile::tempdir().unwrap();
    let store: RegionStore = create_test_store(dir.path());
    let before: Vec<u8> = fs::read(&store.paths().palette).unwrap();
    let palette: Palette = recolored_palette(&store);

    // A directory in place of the log file makes the rename fail
    fs::create_dir_all(store.paths().change_log.join("blocker")).unwrap();
    let mut log: ChangeLog = ChangeLog::new(now());
    let events: Vec<ChangeEvent> = log.append(vec![draft("001", "North", "South")], now());

    let result: Result<(), PersistenceError> =
        store.persist_mutation(Some(&palette), &log, &events, now());

    assert!(matches!(result, Err(PersistenceError::Io { .. })));
    assert_eq!(fs::read(&store.paths().palette).unwrap(), before);
}

#[test]
fn test_palette_only_mutation_does_not_touch_log() {
    let dir = tempfile::tempdir().unwrap();
    let store: RegionStore = create_test_store(dir.path());
    let palette: Palette = recolored_palette(&store);

    store
        .persist_mutation(Some(&palette), &ChangeLog::new(now()), &[], now())
        .unwrap();

    assert!(!store.paths().change_log.exists());
    let stored = read_palette(&store.paths().palette).unwrap().unwrap();
    assert_eq!(stored.palette.color_of(&zone("North")).as_str(), "#112233");
}

#[test]
fn test_reset_backs_up_then_empties_log() {
    let dir = tempfile::tempdir().unwrap();
    let store: RegionStore = create_test_store(dir.path());
    let mut log: ChangeLog = ChangeLog::new(now());
    let events: Vec<ChangeEvent> = log.append(vec![draft("001", "North", "South")], now());
    store.persist_mutation(None, &log, &events, now()).unwrap();

    let backup = store.reset(now()).unwrap();

    assert!(backup.id.ends_with(RESET_BACKUP_LABEL));
    assert_eq!(backup.event_count, 1);
    assert!(read_change_log(&store.paths().change_log, now()).unwrap().is_empty());
    let loaded: LoadedRegion = store.load(now()).unwrap();
    assert_eq!(loaded.view.row(&id("001")).unwrap().municipality.zone, zone("North"));

    store.restore(&backup.id).unwrap();
    let restored: LoadedRegion = store.load(now()).unwrap();
    assert_eq!(restored.view.row(&id("001")).unwrap().municipality.zone, zone("South"));
}
