// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helper functions and fixtures.

use crate::{RegisterRegionRequest, TerritoryEngine};
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::macros::datetime;
use zonemap_audit::Actor;

/// Two municipalities in North with unequal potential.
pub const XX_ENTITIES: &str = "\
id,name,state,sub_region,zone,annual_sales,monthly_sales,annual_potential,monthly_potential,population,points_of_sale,share
001,Alpha,XX,Coast,North,10,1,100,8,1000,1,10
002,Beta,XX,Coast,North,30,2.5,50,4,2000,3,60
";

pub fn create_test_actor() -> Actor {
    Actor::operator("ana")
}

pub fn fixed_now() -> OffsetDateTime {
    datetime!(2026-03-14 09:30:00 UTC)
}

pub fn region_dir(root: &Path) -> PathBuf {
    root.join("XX")
}

fn write_xx_files(root: &Path) {
    let dir: PathBuf = region_dir(root);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("entities.csv"), XX_ENTITIES).unwrap();

    let features: Vec<Value> = [("001", "Alpha"), ("002", "Beta"), ("003", "Gamma")]
        .iter()
        .map(|(id, name)| {
            json!({
                "type": "Feature",
                "properties": { "id": id, "name": name },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]
                }
            })
        })
        .collect();
    fs::write(
        dir.join("boundaries.geojson"),
        json!({ "type": "FeatureCollection", "features": features }).to_string(),
    )
    .unwrap();
    fs::write(
        dir.join("zone_colors.json"),
        json!({ "North": "#FF0000", "South": "#00FF00" }).to_string(),
    )
    .unwrap();
}

/// Opens an engine over `root` with the XX fixture region registered:
/// three boundaries, two entity rows (both North) and a two-zone palette.
pub fn create_test_engine(root: &Path) -> TerritoryEngine {
    write_xx_files(root);
    let engine: TerritoryEngine = TerritoryEngine::open_with_clock(root, fixed_now).unwrap();
    engine
        .register_region(&RegisterRegionRequest {
            code: String::from("XX"),
            name: String::from("Test region"),
        })
        .unwrap();
    engine
}

/// Returns the feature with `id` from a map view.
pub fn feature<'a>(map: &'a Value, id: &str) -> &'a Value {
    map["features"]
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["id"] == id)
        .unwrap()
}

/// Returns a feature's zone from a map view.
pub fn zone_of(map: &Value, id: &str) -> String {
    feature(map, id)["properties"]["zone"]
        .as_str()
        .unwrap()
        .to_string()
}
