// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::helpers::{XX_ENTITIES, id, zone};
use crate::{EntityTable, PersistenceError, parse_entity_table, read_entity_table, write_entity_table};
use zonemap_domain::ZoneName;

#[test]
fn test_canonical_headers_load_every_column() {
    let table: EntityTable = parse_entity_table(XX_ENTITIES).unwrap();

    assert_eq!(table.municipalities.len(), 2);
    let alpha = &table.municipalities[0];
    assert_eq!(alpha.id, id("001"));
    assert_eq!(alpha.name, "Alpha");
    assert_eq!(alpha.state, "XX");
    assert_eq!(alpha.sub_region, "Coast");
    assert_eq!(alpha.zone, zone("North"));
    assert!((alpha.metrics.annual_sales - 10.0).abs() < f64::EPSILON);
    assert!((alpha.metrics.annual_potential - 100.0).abs() < f64::EPSILON);
    assert!((alpha.metrics.population - 1000.0).abs() < f64::EPSILON);

    assert!(table.capabilities.supports_share());
    assert!(table.capabilities.has_sub_region);
    assert!(table.synthesized_columns.is_empty());
    assert_eq!(table.coerced_cells, 0);
}

#[test]
fn test_legacy_headers_are_recognized() {
    let body: &str = "\
CD_Mun,Cidade,UF,Mesorregião Geográfica,Zona,SELL OUT ANUAL,POTENCIAL ANUAL,POPULAÇÃO,PDV,%SHARE
2611606.0,Recife,PE,Metropolitana,Leste,500,1000,1500000,40,50
";
    let table: EntityTable = parse_entity_table(body).unwrap();

    let recife = &table.municipalities[0];
    assert_eq!(recife.id, id("2611606"));
    assert_eq!(recife.name, "Recife");
    assert_eq!(recife.state, "PE");
    assert_eq!(recife.sub_region, "Metropolitana");
    assert_eq!(recife.zone, zone("Leste"));
    assert!((recife.metrics.points_of_sale - 40.0).abs() < f64::EPSILON);
    assert!((recife.metrics.stored_share - 50.0).abs() < f64::EPSILON);
    assert!(table.capabilities.supports_share());
}

#[test]
fn test_non_numeric_cells_are_zero_and_counted() {
    let body: &str = "id,name,zone,annual_sales,annual_potential\n001,Alpha,North,lots,\n";
    let table: EntityTable = parse_entity_table(body).unwrap();

    assert!(table.municipalities[0].metrics.annual_sales.abs() < f64::EPSILON);
    assert!(table.municipalities[0].metrics.annual_potential.abs() < f64::EPSILON);
    assert_eq!(table.coerced_cells, 1);
}

#[test]
fn test_missing_optional_columns_clear_capabilities() {
    let body: &str = "id,name,zone\n001,Alpha,North\n";
    let table: EntityTable = parse_entity_table(body).unwrap();

    assert!(!table.capabilities.has_sales);
    assert!(!table.capabilities.supports_share());
    assert!(!table.capabilities.has_population);
}

#[test]
fn test_missing_required_columns_are_synthesized() {
    let body: &str = "annual_sales\n5\n7\n";
    let table: EntityTable = parse_entity_table(body).unwrap();

    assert_eq!(table.synthesized_columns, vec!["id", "name", "zone"]);
    assert_eq!(table.municipalities.len(), 2);
    assert_eq!(table.municipalities[1].id, id("2"));
    assert_eq!(table.municipalities[1].name, "Municipality 2");
    assert_eq!(table.municipalities[1].zone, ZoneName::unassigned());
}

#[test]
fn test_blank_zone_means_unassigned() {
    let body: &str = "id,name,zone\n001,Alpha,\n";
    let table: EntityTable = parse_entity_table(body).unwrap();
    assert!(table.municipalities[0].zone.is_unassigned());
}

#[test]
fn test_duplicate_ids_keep_first_row() {
    let body: &str = "id,name,zone\n001,Alpha,North\n001,Impostor,South\n002,Beta,South\n";
    let table: EntityTable = parse_entity_table(body).unwrap();

    assert_eq!(table.municipalities.len(), 2);
    assert_eq!(table.municipalities[0].name, "Alpha");
    assert_eq!(table.duplicate_ids, vec![id("001")]);
}

#[test]
fn test_rows_without_id_are_skipped() {
    let body: &str = "id,name,zone\n,Nowhere,North\n001,Alpha,North\n";
    let table: EntityTable = parse_entity_table(body).unwrap();

    assert_eq!(table.municipalities.len(), 1);
    assert_eq!(table.skipped_rows, 1);
}

#[test]
fn test_written_table_reads_back_with_integers_intact() {
    let table: EntityTable = parse_entity_table(XX_ENTITIES).unwrap();
    let written: String = write_entity_table(&table.municipalities).unwrap();

    assert!(written.starts_with("id,name,state,sub_region,zone,"));
    assert!(written.contains("001,Alpha,XX,Coast,North,10,1,100,8,1000,1,10"));
    assert!(written.contains("002,Beta,XX,Coast,North,30,2.5,100,8,2000,3,30"));

    let reread: EntityTable = parse_entity_table(&written).unwrap();
    assert_eq!(reread.municipalities, table.municipalities);
}

#[test]
fn test_missing_entity_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let result: Result<EntityTable, PersistenceError> =
        read_entity_table(&dir.path().join("entities.csv"));
    assert!(matches!(result, Err(PersistenceError::MissingFile { .. })));
}
