// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::helpers::{draft, id, later, now, region, write_xx_region, zone};
use crate::{
    LoadTier, LoadedRegion, PaletteSource, PersistenceError, RegionPaths, create_backup,
    load_region, write_change_log,
};
use std::fs;
use indexmap::IndexMap;
use zonemap::statistics::{self, ZoneStatistics};
use zonemap_audit::ChangeLog;
use zonemap_domain::{UNASSIGNED_COLOR, ZoneName};

#[test]
fn test_primary_files_load_with_placeholders_for_orphan_boundaries() {
    let dir = tempfile::tempdir().unwrap();
    let paths: RegionPaths = write_xx_region(dir.path());

    let loaded: LoadedRegion = load_region(&region(), &paths, now()).unwrap();

    assert_eq!(loaded.report.tier, LoadTier::Primary);
    assert_eq!(loaded.report.palette_source, PaletteSource::File);
    assert_eq!(loaded.view.rows().len(), 3);
    let gamma = loaded.view.row(&id("003")).unwrap();
    assert!(!gamma.has_backing_data);
    assert!(gamma.municipality.zone.is_unassigned());
    assert_eq!(gamma.color.as_str(), UNASSIGNED_COLOR);
    assert_eq!(loaded.report.integrity.orphan_boundaries, vec![id("003")]);
    assert!(loaded.change_log.is_empty());
}

#[test]
fn test_change_log_is_replayed_over_the_entity_table() {
    let dir = tempfile::tempdir().unwrap();
    let paths: RegionPaths = write_xx_region(dir.path());
    let mut log: ChangeLog = ChangeLog::new(now());
    log.append(vec![draft("001", "North", "South")], now());
    log.append(vec![draft("001", "South", "North"), draft("002", "North", "South")], later());
    write_change_log(&paths.change_log, &log).unwrap();

    let loaded: LoadedRegion = load_region(&region(), &paths, now()).unwrap();

    assert_eq!(loaded.view.row(&id("001")).unwrap().municipality.zone, zone("North"));
    assert_eq!(loaded.view.row(&id("002")).unwrap().municipality.zone, zone("South"));
    assert_eq!(loaded.report.replayed_events, 3);
    assert_eq!(loaded.change_log.len(), 3);
}

#[test]
fn test_events_for_unknown_municipalities_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let paths: RegionPaths = write_xx_region(dir.path());
    let mut log: ChangeLog = ChangeLog::new(now());
    log.append(vec![draft("999", "North", "South")], now());
    write_change_log(&paths.change_log, &log).unwrap();

    let loaded: LoadedRegion = load_region(&region(), &paths, now()).unwrap();

    assert_eq!(loaded.report.skipped_events, vec![1]);
    assert_eq!(loaded.report.replayed_events, 0);
}

#[test]
fn test_missing_entity_table_falls_back_to_latest_backup() {
    let dir = tempfile::tempdir().unwrap();
    let paths: RegionPaths = write_xx_region(dir.path());
    create_backup(&paths, Some("nightly"), now()).unwrap();
    fs::remove_file(&paths.entities).unwrap();

    let loaded: LoadedRegion = load_region(&region(), &paths, now()).unwrap();

    assert_eq!(
        loaded.report.tier,
        LoadTier::Backup(String::from("20260314_093000_nightly"))
    );
    assert!(loaded.view.row(&id("002")).unwrap().has_backing_data);
}

#[test]
fn test_no_entity_table_anywhere_synthesizes_one_row() {
    let dir = tempfile::tempdir().unwrap();
    let paths: RegionPaths = write_xx_region(dir.path());
    fs::write(&paths.entities, [0xFF, 0xFE, 0x00]).unwrap();

    let loaded: LoadedRegion = load_region(&region(), &paths, now()).unwrap();

    assert_eq!(loaded.report.tier, LoadTier::Synthesized);
    let entities = loaded.view.entities();
    assert_eq!(entities.len(), 1);
    assert!(entities[0].zone.is_unassigned());
    assert!(!loaded.view.capabilities().supports_share());
}

#[test]
fn test_missing_palette_is_synthesized_from_zones_in_use() {
    let dir = tempfile::tempdir().unwrap();
    let paths: RegionPaths = write_xx_region(dir.path());
    fs::remove_file(&paths.palette).unwrap();

    let loaded: LoadedRegion = load_region(&region(), &paths, now()).unwrap();

    assert_eq!(loaded.report.palette_source, PaletteSource::Synthesized);
    assert_eq!(loaded.view.palette().len(), 1);
    assert_eq!(
        loaded.view.palette().color_of(&zone("North")).as_str(),
        "#228B22"
    );
}

#[test]
fn test_invalid_palette_colors_become_gray() {
    let dir = tempfile::tempdir().unwrap();
    let paths: RegionPaths = write_xx_region(dir.path());
    fs::write(&paths.palette, r##"{"North": "blue", "South": "#00ff00", "unassigned": "#000000"}"##)
        .unwrap();

    let loaded: LoadedRegion = load_region(&region(), &paths, now()).unwrap();

    assert_eq!(loaded.report.palette_source, PaletteSource::File);
    assert_eq!(loaded.report.coerced_colors, vec![String::from("North")]);
    assert_eq!(loaded.view.palette().len(), 2);
    assert_eq!(
        loaded.view.palette().color_of(&zone("South")).as_str(),
        "#00FF00"
    );
}

#[test]
fn test_missing_boundaries_fail_the_load() {
    let dir = tempfile::tempdir().unwrap();
    let paths: RegionPaths = write_xx_region(dir.path());
    fs::remove_file(&paths.boundaries).unwrap();

    let result: Result<LoadedRegion, PersistenceError> = load_region(&region(), &paths, now());
    assert!(matches!(result, Err(PersistenceError::MissingFile { .. })));
}

#[test]
fn test_malformed_boundaries_fail_the_load() {
    let dir = tempfile::tempdir().unwrap();
    let paths: RegionPaths = write_xx_region(dir.path());
    fs::write(&paths.boundaries, r#"{"type": "Feature"}"#).unwrap();

    let result: Result<LoadedRegion, PersistenceError> = load_region(&region(), &paths, now());
    assert!(matches!(result, Err(PersistenceError::MalformedFile { .. })));
}

#[test]
fn test_malformed_change_log_is_never_discarded() {
    let dir = tempfile::tempdir().unwrap();
    let paths: RegionPaths = write_xx_region(dir.path());
    fs::write(&paths.change_log, "[truncated").unwrap();

    let result: Result<LoadedRegion, PersistenceError> = load_region(&region(), &paths, now());
    assert!(matches!(result, Err(PersistenceError::MalformedFile { .. })));
    assert_eq!(fs::read_to_string(&paths.change_log).unwrap(), "[truncated");
}

#[test]
fn test_legacy_numeric_boundary_ids_join_entity_rows() {
    let dir = tempfile::tempdir().unwrap();
    let paths: RegionPaths = write_xx_region(dir.path());
    fs::write(&paths.entities, "CD_Mun,Cidade,Zona\n2611606,Recife,North\n").unwrap();
    fs::write(
        &paths.boundaries,
        r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"CD_Mun":2611606.0,"NM_MUN":"Recife"},"geometry":null}
        ]}"#,
    )
    .unwrap();

    let loaded: LoadedRegion = load_region(&region(), &paths, now()).unwrap();

    assert!(loaded.report.integrity.is_clean());
    assert!(loaded.view.row(&id("2611606")).unwrap().has_backing_data);
}

#[test]
fn test_legacy_sem_zona_loads_as_unassigned() {
    let dir = tempfile::tempdir().unwrap();
    let paths: RegionPaths = write_xx_region(dir.path());
    fs::write(
        &paths.entities,
        "CD_Mun,Cidade,Zona\n001,Alpha,North\n002,Beta,Sem Zona\n003,Gamma,North\n",
    )
    .unwrap();
    fs::write(&paths.palette, r##"{"North": "#FF0000", "Sem Zona": "#999999"}"##).unwrap();
    fs::write(
        &paths.change_log,
        r#"{"alteracoes": [
            {"id": 1, "timestamp": "2024-01-15T10:30:00", "cd_mun": "001",
             "cidade": "Alpha", "zona_anterior": "North", "zona_nova": "Sem Zona",
             "usuario": "Sistema"}
        ]}"#,
    )
    .unwrap();

    let loaded: LoadedRegion = load_region(&region(), &paths, now()).unwrap();

    assert!(loaded.view.row(&id("001")).unwrap().municipality.zone.is_unassigned());
    assert!(loaded.view.row(&id("002")).unwrap().municipality.zone.is_unassigned());
    assert!(loaded.change_log.changes()[0].new_zone.is_unassigned());
    assert!(!loaded.view.palette().zones().any(|z| z.as_str() == "Sem Zona"));
    assert_eq!(loaded.view.palette().len(), 1);

    let stats: IndexMap<ZoneName, ZoneStatistics> = statistics::by_zone(&loaded.view);
    let buckets: Vec<&str> = stats.keys().map(ZoneName::as_str).collect();
    assert_eq!(buckets, vec!["North", "unassigned"]);
    assert_eq!(stats[&ZoneName::unassigned()].count, 2);
}
