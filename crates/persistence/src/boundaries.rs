// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::PersistenceError;
use serde_json::Value;
use std::path::Path;
use zonemap::BoundaryFeature;
use zonemap_domain::MunicipalityId;

/// Boundary features read from a GeoJSON file.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundarySet {
    /// Features in file order.
    pub features: Vec<BoundaryFeature>,
    /// Features dropped because they carry no usable identifier.
    pub skipped: usize,
}

/// Reads a boundary file.
///
/// There is no fallback for shapes: a missing or unusable file is an error.
///
/// # Errors
///
/// * `PersistenceError::MissingFile` if the file does not exist
/// * `PersistenceError::MalformedFile` if it is not a GeoJSON `FeatureCollection`
pub fn read_boundaries(path: &Path) -> Result<BoundarySet, PersistenceError> {
    let body: String = crate::storage::read_text(path)?;
    let document: Value =
        serde_json::from_str(&body).map_err(|e| PersistenceError::malformed(path, &e))?;
    parse_boundaries(&document).map_err(|reason| PersistenceError::malformed(path, &reason))
}

/// Extracts features from a parsed GeoJSON document.
///
/// The identifier comes from `properties.id` or the legacy
/// `properties.CD_Mun`, falling back to the feature's top-level `id`, which
/// some writers fill with a row index. The label comes from
/// `properties.name` or `properties.NM_MUN`.
///
/// # Errors
///
/// Returns a description of the problem if the document is not a
/// `FeatureCollection` with a `features` array.
pub fn parse_boundaries(document: &Value) -> Result<BoundarySet, String> {
    if document.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
        return Err(String::from("expected a GeoJSON FeatureCollection"));
    }
    let features: &Vec<Value> = document
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| String::from("FeatureCollection has no features array"))?;

    let mut set: BoundarySet = BoundarySet {
        features: Vec::with_capacity(features.len()),
        skipped: 0,
    };
    for feature in features {
        let properties: Option<&Value> = feature.get("properties");
        let id: Option<MunicipalityId> = properties
            .and_then(|p| p.get("id").or_else(|| p.get("CD_Mun")))
            .and_then(MunicipalityId::from_json)
            .or_else(|| feature.get("id").and_then(MunicipalityId::from_json));
        let Some(id) = id else {
            set.skipped += 1;
            continue;
        };
        let label: Option<String> = properties
            .and_then(|p| p.get("name").or_else(|| p.get("NM_MUN")))
            .and_then(Value::as_str)
            .map(str::to_string);
        set.features.push(BoundaryFeature {
            id,
            label,
            geometry: feature.get("geometry").cloned().unwrap_or(Value::Null),
        });
    }
    Ok(set)
}
