// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::helpers::{create_test_actor, create_test_engine, fixed_now, zone_of};
use crate::session::RegionSession;
use crate::{ApiError, ReassignZoneRequest, RegisterRegionRequest, TerritoryEngine};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use zonemap::Command;
use zonemap_domain::{MunicipalityId, ZoneName};

fn reassign(municipality_id: &str, zone: &str) -> Command {
    Command::ReassignZone {
        municipality_id: MunicipalityId::normalize(municipality_id).unwrap(),
        zone: ZoneName::new(zone).unwrap(),
    }
}

fn request(municipality_id: &str, zone: &str) -> ReassignZoneRequest {
    ReassignZoneRequest {
        municipality_id: municipality_id.to_string(),
        zone: zone.to_string(),
    }
}

#[test]
fn test_unknown_backup_keeps_the_loaded_session() {
    let dir: TempDir = tempfile::tempdir().unwrap();
    let engine: TerritoryEngine = create_test_engine(dir.path());
    let held: Arc<RegionSession> = engine.session("XX").unwrap();

    let err: ApiError = engine.restore("XX", "nope").unwrap_err();
    assert_eq!(err.kind(), "not_found");

    engine
        .reassign_zone("XX", &request("001", "South"), &create_test_actor())
        .unwrap();
    held.mutate(reassign("002", "South"), &create_test_actor(), fixed_now())
        .unwrap();

    let current: Arc<RegionSession> = engine.session("XX").unwrap();
    assert!(Arc::ptr_eq(&held, &current));
    engine.reload_region("XX").unwrap();
    let map: Value = engine.map_view("XX").unwrap();
    assert_eq!(zone_of(&map, "001"), "South");
    assert_eq!(zone_of(&map, "002"), "South");
    assert_eq!(engine.change_history("XX", None).unwrap().changes.len(), 2);
}

#[test]
fn test_deactivated_session_refuses_writes() {
    let dir: TempDir = tempfile::tempdir().unwrap();
    let engine: TerritoryEngine = create_test_engine(dir.path());
    let held: Arc<RegionSession> = engine.session("XX").unwrap();

    engine.deactivate_region("XX").unwrap();

    assert!(held.is_retired());
    let err: ApiError = held
        .mutate(reassign("001", "South"), &create_test_actor(), fixed_now())
        .unwrap_err();
    assert_eq!(err.kind(), "not_found");
    assert_eq!(held.snapshot(None, fixed_now()).unwrap_err().kind(), "not_found");
}

#[test]
fn test_reregistered_region_has_a_single_writer() {
    let dir: TempDir = tempfile::tempdir().unwrap();
    let engine: TerritoryEngine = create_test_engine(dir.path());
    let held: Arc<RegionSession> = engine.session("XX").unwrap();
    engine.deactivate_region("XX").unwrap();
    engine
        .register_region(&RegisterRegionRequest {
            code: String::from("XX"),
            name: String::new(),
        })
        .unwrap();

    engine
        .reassign_zone("XX", &request("001", "South"), &create_test_actor())
        .unwrap();
    let stale: Result<_, ApiError> =
        held.mutate(reassign("002", "South"), &create_test_actor(), fixed_now());

    assert!(stale.is_err());
    engine.reload_region("XX").unwrap();
    let map: Value = engine.map_view("XX").unwrap();
    assert_eq!(zone_of(&map, "001"), "South");
    assert_eq!(zone_of(&map, "002"), "North");
    assert_eq!(engine.change_history("XX", None).unwrap().changes.len(), 1);
}

#[test]
fn test_failed_reset_keeps_serving_the_region() {
    let dir: TempDir = tempfile::tempdir().unwrap();
    let engine: TerritoryEngine = create_test_engine(dir.path());
    engine
        .reassign_zone("XX", &request("001", "South"), &create_test_actor())
        .unwrap();
    let held: Arc<RegionSession> = engine.session("XX").unwrap();
    let backups = dir.path().join("XX").join("backups");
    std::fs::remove_dir_all(&backups).unwrap();
    std::fs::write(&backups, "not a directory").unwrap();

    let err: ApiError = engine.reset_region("XX").unwrap_err();

    assert_eq!(err.kind(), "persistence_error");
    assert!(!held.is_retired());
    assert!(Arc::ptr_eq(&held, &engine.session("XX").unwrap()));
    assert_eq!(zone_of(&engine.map_view("XX").unwrap(), "001"), "South");
    assert_eq!(engine.change_history("XX", None).unwrap().changes.len(), 1);
}
