// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::helpers::{
    boundary, create_test_palette, create_test_view, create_xx_view, id, municipality, zone,
};
use crate::{IntegrityReport, MaterializedView, ViewRow, ZoneEntry};
use serde_json::Value;
use zonemap_domain::{
    Metrics, MunicipalityId, RegionCode, SchemaCapabilities, UNASSIGNED_COLOR, UNIDENTIFIED_NAME,
};

#[test]
fn test_xx_map_view_renders_every_boundary() {
    let view: MaterializedView = create_xx_view();
    let collection: Value = view.feature_collection();

    assert_eq!(collection["type"], "FeatureCollection");
    let features: &Vec<Value> = collection["features"].as_array().unwrap();
    assert_eq!(features.len(), 3);

    let unassigned: Vec<&Value> = features
        .iter()
        .filter(|f| f["properties"]["unassigned"] == Value::Bool(true))
        .collect();
    assert_eq!(unassigned.len(), 1);
    assert_eq!(unassigned[0]["id"], "003");
}

#[test]
fn test_boundary_without_entity_is_gray_zero_placeholder() {
    let view: MaterializedView = create_xx_view();
    let row: &ViewRow = view.row(&id("003")).unwrap();

    assert!(!row.has_backing_data);
    assert!(row.has_boundary());
    assert!(row.municipality.zone.is_unassigned());
    assert_eq!(row.color.as_str(), UNASSIGNED_COLOR);
    assert_eq!(row.municipality.metrics, Metrics::default());
    assert_eq!(row.municipality.name, "Gamma");
}

#[test]
fn test_unlabelled_placeholder_is_unidentified() {
    let (view, _) = MaterializedView::build(
        RegionCode::parse("XX").unwrap(),
        Vec::new(),
        vec![boundary("009", None)],
        create_test_palette(),
        SchemaCapabilities::full(),
    );
    assert_eq!(
        view.row(&id("009")).unwrap().municipality.name,
        UNIDENTIFIED_NAME
    );
}

#[test]
fn test_integrity_report_lists_orphans_and_duplicates() {
    let (_, report) = MaterializedView::build(
        RegionCode::parse("XX").unwrap(),
        vec![
            municipality("001", "Alpha", "North", 0.0, 0.0),
            municipality("001", "Alpha again", "South", 0.0, 0.0),
            municipality("005", "Echo", "North", 0.0, 0.0),
        ],
        vec![
            boundary("001", None),
            boundary("002", None),
            boundary("002", None),
        ],
        create_test_palette(),
        SchemaCapabilities::full(),
    );

    let expected: IntegrityReport = IntegrityReport {
        orphan_boundaries: vec![id("002")],
        orphan_entities: vec![id("005")],
        duplicate_entities: vec![id("001")],
        duplicate_boundaries: vec![id("002")],
    };
    assert_eq!(report, expected);
    assert!(!report.is_clean());
}

#[test]
fn test_first_duplicate_entity_wins() {
    let (view, _) = MaterializedView::build(
        RegionCode::parse("XX").unwrap(),
        vec![
            municipality("001", "First", "North", 0.0, 0.0),
            municipality("001", "Second", "South", 0.0, 0.0),
        ],
        vec![boundary("001", None)],
        create_test_palette(),
        SchemaCapabilities::full(),
    );
    assert_eq!(view.rows().len(), 1);
    assert_eq!(view.row(&id("001")).unwrap().municipality.name, "First");
}

#[test]
fn test_join_uses_normalized_identifiers() {
    let entity_id: MunicipalityId = MunicipalityId::normalize("2611606.0").unwrap();
    let mut entity = municipality("1", "Recife", "North", 0.0, 0.0);
    entity.id = entity_id;

    let (view, report) = MaterializedView::build(
        RegionCode::parse("XX").unwrap(),
        vec![entity],
        vec![boundary(" 2611606 ", None)],
        create_test_palette(),
        SchemaCapabilities::full(),
    );

    assert!(report.is_clean());
    assert!(view.row(&id("2611606")).unwrap().has_backing_data);
}

#[test]
fn test_entity_without_boundary_is_kept_but_not_rendered() {
    let view: MaterializedView = create_test_view();

    assert_eq!(view.rows().len(), 5);
    let row: &ViewRow = view.row(&id("005")).unwrap();
    assert!(row.has_backing_data);
    assert!(!row.has_boundary());

    let collection: Value = view.feature_collection();
    assert_eq!(collection["features"].as_array().unwrap().len(), 4);
}

#[test]
fn test_rows_resolve_palette_colors() {
    let view: MaterializedView = create_test_view();
    assert_eq!(view.row(&id("001")).unwrap().color.as_str(), "#FF0000");
    assert_eq!(view.row(&id("003")).unwrap().color.as_str(), "#00FF00");
}

#[test]
fn test_unknown_zone_resolves_to_gray() {
    let (view, _) = MaterializedView::build(
        RegionCode::parse("XX").unwrap(),
        vec![municipality("001", "Alpha", "Elsewhere", 0.0, 0.0)],
        vec![boundary("001", None)],
        create_test_palette(),
        SchemaCapabilities::full(),
    );
    assert_eq!(view.row(&id("001")).unwrap().color.as_str(), UNASSIGNED_COLOR);
}

#[test]
fn test_municipality_index_is_sorted_by_name_and_skips_placeholders() {
    let view: MaterializedView = create_xx_view();
    let names: Vec<&str> = view
        .municipality_index()
        .iter()
        .map(|row| row.municipality.name.as_str())
        .collect();
    assert_eq!(names, vec!["Alpha", "Beta"]);

    let view: MaterializedView = create_test_view();
    let names: Vec<&str> = view
        .municipality_index()
        .iter()
        .map(|row| row.municipality.name.as_str())
        .collect();
    assert_eq!(names, vec!["Alpha", "Bravo", "Charlie", "Delta", "Echo"]);
}

#[test]
fn test_zones_lists_palette_then_sentinel_with_counts() {
    let view: MaterializedView = create_xx_view();
    let zones: Vec<ZoneEntry> = view.zones();

    assert_eq!(zones.len(), 3);
    assert_eq!(zones[0].name, zone("North"));
    assert_eq!(zones[0].member_count, 2);
    assert_eq!(zones[1].name, zone("South"));
    assert_eq!(zones[1].member_count, 0);
    assert!(zones[2].reserved);
    assert!(zones[2].name.is_unassigned());
    assert_eq!(zones[2].member_count, 1);
    assert_eq!(zones[2].color.as_str(), UNASSIGNED_COLOR);
}

#[test]
fn test_zone_members_in_view_order() {
    let view: MaterializedView = create_test_view();
    let members: Vec<&str> = view
        .zone_members(&zone("South"))
        .iter()
        .map(|row| row.municipality.id.as_str())
        .collect();
    assert_eq!(members, vec!["003", "004", "005"]);
}

#[test]
fn test_build_is_deterministic() {
    assert_eq!(create_test_view(), create_test_view());
    assert_eq!(
        create_test_view().feature_collection(),
        create_test_view().feature_collection()
    );
}

#[test]
fn test_entities_excludes_placeholders() {
    let view: MaterializedView = create_xx_view();
    let ids: Vec<String> = view
        .entities()
        .into_iter()
        .map(|m| m.id.to_string())
        .collect();
    assert_eq!(ids, vec![String::from("001"), String::from("002")]);
}
