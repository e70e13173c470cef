// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{RegionFiles, RegionPaths};
use serde_json::json;
use std::fs;
use std::path::Path;
use time::OffsetDateTime;
use time::macros::datetime;
use zonemap_audit::{Actor, ChangeDraft, ChangeKind};
use zonemap_domain::{MunicipalityId, RegionCode, ZoneName};

pub const XX_ENTITIES: &str = "\
id,name,state,sub_region,zone,annual_sales,monthly_sales,annual_potential,monthly_potential,population,points_of_sale,share
001,Alpha,XX,Coast,North,10,1,100,8,1000,1,10
002,Beta,XX,Coast,North,30,2.5,100,8,2000,3,30
";

pub fn create_test_actor() -> Actor {
    Actor::new(String::from("ana"), String::from("operator"))
}

pub fn region() -> RegionCode {
    RegionCode::parse("XX").unwrap()
}

pub fn id(raw: &str) -> MunicipalityId {
    MunicipalityId::normalize(raw).unwrap()
}

pub fn zone(name: &str) -> ZoneName {
    ZoneName::new(name).unwrap()
}

pub fn now() -> OffsetDateTime {
    datetime!(2026-03-14 09:30:00 UTC)
}

pub fn later() -> OffsetDateTime {
    datetime!(2026-03-14 10:45:12 UTC)
}

pub fn draft(raw_id: &str, from: &str, to: &str) -> ChangeDraft {
    ChangeDraft {
        municipality_id: id(raw_id),
        municipality_name: format!("Municipality {raw_id}"),
        prior_zone: zone(from),
        new_zone: zone(to),
        actor: create_test_actor().label().to_string(),
        kind: ChangeKind::Reassignment,
    }
}

pub fn boundaries_json(ids: &[(&str, &str)]) -> String {
    let features: Vec<serde_json::Value> = ids
        .iter()
        .map(|(raw_id, name)| {
            json!({
                "type": "Feature",
                "properties": { "id": raw_id, "name": name },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]
                }
            })
        })
        .collect();
    json!({ "type": "FeatureCollection", "features": features }).to_string()
}

/// Writes the XX fixture region: two entity rows, three boundaries and a
/// two-zone palette. No change log.
pub fn write_xx_region(dir: &Path) -> RegionPaths {
    let paths: RegionPaths = RegionPaths::new(dir.to_path_buf(), &RegionFiles::default());
    fs::create_dir_all(&paths.dir).unwrap();
    fs::write(&paths.entities, XX_ENTITIES).unwrap();
    fs::write(
        &paths.boundaries,
        boundaries_json(&[("001", "Alpha"), ("002", "Beta"), ("003", "Gamma")]),
    )
    .unwrap();
    fs::write(
        &paths.palette,
        json!({ "North": "#FF0000", "South": "#00FF00" }).to_string(),
    )
    .unwrap();
    paths
}
