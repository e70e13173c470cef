// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{BoundaryFeature, MaterializedView};
use serde_json::json;
use zonemap_audit::Actor;
use zonemap_domain::{
    Metrics, Municipality, MunicipalityId, Palette, RegionCode, SchemaCapabilities, ZoneColor,
    ZoneName,
};

pub fn create_test_actor() -> Actor {
    Actor::new(String::from("ana"), String::from("operator"))
}

pub fn id(raw: &str) -> MunicipalityId {
    MunicipalityId::normalize(raw).unwrap()
}

pub fn zone(name: &str) -> ZoneName {
    ZoneName::new(name).unwrap()
}

pub fn color(value: &str) -> ZoneColor {
    ZoneColor::parse(value).unwrap()
}

pub fn municipality(raw_id: &str, name: &str, zone_name: &str, sales: f64, potential: f64) -> Municipality {
    let mut m: Municipality = Municipality::new(id(raw_id), name, zone(zone_name));
    m.state = String::from("XX");
    m.metrics = Metrics {
        annual_sales: sales,
        annual_potential: potential,
        points_of_sale: 1.0,
        population: 1000.0,
        ..Metrics::default()
    };
    m
}

pub fn boundary(raw_id: &str, label: Option<&str>) -> BoundaryFeature {
    BoundaryFeature {
        id: id(raw_id),
        label: label.map(String::from),
        geometry: json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]
        }),
    }
}

pub fn create_test_palette() -> Palette {
    Palette::from_entries(vec![
        (zone("North"), color("#FF0000")),
        (zone("South"), color("#00FF00")),
    ])
}

/// Three boundaries, two entity rows sharing identifiers with them.
pub fn create_xx_view() -> MaterializedView {
    let (view, _) = MaterializedView::build(
        RegionCode::parse("XX").unwrap(),
        vec![
            municipality("001", "Alpha", "North", 10.0, 100.0),
            municipality("002", "Beta", "North", 30.0, 100.0),
        ],
        vec![
            boundary("001", Some("Alpha")),
            boundary("002", Some("Beta")),
            boundary("003", Some("Gamma")),
        ],
        create_test_palette(),
        SchemaCapabilities::full(),
    );
    view
}

/// Four mapped municipalities split across two zones, plus one with no shape.
pub fn create_test_view() -> MaterializedView {
    let (view, _) = MaterializedView::build(
        RegionCode::parse("XX").unwrap(),
        vec![
            municipality("001", "Delta", "North", 10.0, 100.0),
            municipality("002", "Alpha", "North", 90.0, 900.0),
            municipality("003", "Echo", "South", 50.0, 100.0),
            municipality("004", "Bravo", "South", 0.0, 0.0),
            municipality("005", "Charlie", "South", 5.0, 10.0),
        ],
        vec![
            boundary("001", None),
            boundary("002", None),
            boundary("003", None),
            boundary("004", None),
        ],
        create_test_palette(),
        SchemaCapabilities::full(),
    );
    view
}
