// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use serde::Serialize;
use serde_json::{Map, Value, json};
use std::collections::{HashMap, HashSet};
use zonemap_domain::{
    Municipality, MunicipalityId, Palette, RegionCode, SchemaCapabilities, ZoneColor, ZoneName,
};

/// One boundary shape as read from a region's boundary file.
///
/// Geometry is carried opaquely and never inspected.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryFeature {
    /// Normalized identifier joining the shape to an entity row.
    pub id: MunicipalityId,
    /// The shape's own name, if the file carried one.
    pub label: Option<String>,
    /// The GeoJSON geometry object.
    pub geometry: Value,
}

/// A row of the materialized view.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewRow {
    /// The municipality, with its current zone.
    pub municipality: Municipality,
    /// Resolved zone color.
    pub color: ZoneColor,
    /// Per-row share (see [`Municipality::row_share`]).
    pub row_share: f64,
    /// `false` for placeholders synthesized from a boundary with no entity row.
    pub has_backing_data: bool,
    /// The boundary geometry, absent for entity rows without a shape.
    pub geometry: Option<Value>,
}

impl ViewRow {
    /// Returns whether the row renders on the map.
    #[must_use]
    pub const fn has_boundary(&self) -> bool {
        self.geometry.is_some()
    }
}

/// Join anomalies found while building a view.
///
/// None of these stop the build; they are resolved by placeholders or by
/// keeping the first occurrence, and reported for operators.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct IntegrityReport {
    /// Boundary shapes with no entity row (rendered as placeholders).
    pub orphan_boundaries: Vec<MunicipalityId>,
    /// Entity rows with no boundary shape (kept for statistics only).
    pub orphan_entities: Vec<MunicipalityId>,
    /// Entity identifiers seen more than once (first row kept).
    pub duplicate_entities: Vec<MunicipalityId>,
    /// Boundary identifiers seen more than once (first shape kept).
    pub duplicate_boundaries: Vec<MunicipalityId>,
}

impl IntegrityReport {
    /// Returns whether the join was one-to-one.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.orphan_boundaries.is_empty()
            && self.orphan_entities.is_empty()
            && self.duplicate_entities.is_empty()
            && self.duplicate_boundaries.is_empty()
    }
}

/// A palette zone (or the sentinel) with its current member count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneEntry {
    /// Zone name.
    pub name: ZoneName,
    /// Zone color.
    pub color: ZoneColor,
    /// Number of rows currently in the zone.
    pub member_count: usize,
    /// `true` only for the unassigned sentinel.
    pub reserved: bool,
}

/// The joined, colored state of one region.
///
/// A view is never modified after it is built. Mutations produce a new view
/// that replaces the old one as a whole.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializedView {
    region: RegionCode,
    rows: Vec<ViewRow>,
    index: HashMap<MunicipalityId, usize>,
    palette: Palette,
    capabilities: SchemaCapabilities,
}

impl MaterializedView {
    /// Builds a view by left-joining boundaries to municipalities.
    ///
    /// Rows come in boundary order, followed by municipalities that have no
    /// boundary in entity order. Boundaries without a municipality become
    /// unassigned, zero-valued placeholders.
    ///
    /// # Arguments
    ///
    /// * `region` - The region the data belongs to
    /// * `municipalities` - Entity rows with the change log already replayed
    /// * `boundaries` - Boundary shapes
    /// * `palette` - The region's palette
    /// * `capabilities` - Columns the entity table carried
    ///
    /// # Returns
    ///
    /// The view and a report of join anomalies.
    #[must_use]
    pub fn build(
        region: RegionCode,
        municipalities: Vec<Municipality>,
        boundaries: Vec<BoundaryFeature>,
        palette: Palette,
        capabilities: SchemaCapabilities,
    ) -> (Self, IntegrityReport) {
        let mut report: IntegrityReport = IntegrityReport::default();

        let mut entities: HashMap<MunicipalityId, Municipality> = HashMap::new();
        let mut entity_order: Vec<MunicipalityId> = Vec::new();
        for municipality in municipalities {
            if entities.contains_key(&municipality.id) {
                report.duplicate_entities.push(municipality.id.clone());
                continue;
            }
            entity_order.push(municipality.id.clone());
            entities.insert(municipality.id.clone(), municipality);
        }

        let mut rows: Vec<ViewRow> = Vec::with_capacity(boundaries.len().max(entity_order.len()));
        let mut seen_boundaries: HashSet<MunicipalityId> = HashSet::new();
        for boundary in boundaries {
            if !seen_boundaries.insert(boundary.id.clone()) {
                report.duplicate_boundaries.push(boundary.id);
                continue;
            }
            let (municipality, has_backing_data): (Municipality, bool) =
                match entities.remove(&boundary.id) {
                    Some(entity) => (entity, true),
                    None => {
                        report.orphan_boundaries.push(boundary.id.clone());
                        (
                            Municipality::placeholder(
                                boundary.id,
                                boundary.label.as_deref(),
                                region.as_str(),
                            ),
                            false,
                        )
                    }
                };
            rows.push(Self::make_row(
                municipality,
                has_backing_data,
                Some(boundary.geometry),
                &palette,
            ));
        }

        for id in entity_order {
            if let Some(entity) = entities.remove(&id) {
                report.orphan_entities.push(id);
                rows.push(Self::make_row(entity, true, None, &palette));
            }
        }

        let view: Self = Self::from_rows(region, rows, palette, capabilities);
        (view, report)
    }

    fn make_row(
        municipality: Municipality,
        has_backing_data: bool,
        geometry: Option<Value>,
        palette: &Palette,
    ) -> ViewRow {
        let color: ZoneColor = palette.color_of(&municipality.zone);
        let row_share: f64 = municipality.row_share();
        ViewRow {
            municipality,
            color,
            row_share,
            has_backing_data,
            geometry,
        }
    }

    fn from_rows(
        region: RegionCode,
        rows: Vec<ViewRow>,
        palette: Palette,
        capabilities: SchemaCapabilities,
    ) -> Self {
        let index: HashMap<MunicipalityId, usize> = rows
            .iter()
            .enumerate()
            .map(|(i, row)| (row.municipality.id.clone(), i))
            .collect();
        Self {
            region,
            rows,
            index,
            palette,
            capabilities,
        }
    }

    /// Produces a new view with some zones changed and a (possibly new) palette.
    ///
    /// Every row's color is resolved again against `palette`.
    #[must_use]
    pub fn with_changes(&self, zones: &HashMap<MunicipalityId, ZoneName>, palette: Palette) -> Self {
        let rows: Vec<ViewRow> = self
            .rows
            .iter()
            .map(|row| {
                let mut municipality: Municipality = row.municipality.clone();
                if let Some(zone) = zones.get(&municipality.id) {
                    municipality.zone = zone.clone();
                }
                Self::make_row(
                    municipality,
                    row.has_backing_data,
                    row.geometry.clone(),
                    &palette,
                )
            })
            .collect();
        Self::from_rows(self.region.clone(), rows, palette, self.capabilities)
    }

    /// The region this view belongs to.
    #[must_use]
    pub const fn region(&self) -> &RegionCode {
        &self.region
    }

    /// All rows, boundary rows first.
    #[must_use]
    pub fn rows(&self) -> &[ViewRow] {
        &self.rows
    }

    /// Looks up a row by identifier.
    #[must_use]
    pub fn row(&self, id: &MunicipalityId) -> Option<&ViewRow> {
        self.index.get(id).map(|&i| &self.rows[i])
    }

    /// The palette the view was colored with.
    #[must_use]
    pub const fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Columns the entity table carried.
    #[must_use]
    pub const fn capabilities(&self) -> SchemaCapabilities {
        self.capabilities
    }

    /// Municipalities backed by entity rows, in view order.
    ///
    /// This is the data written back when the entity table is exported.
    #[must_use]
    pub fn entities(&self) -> Vec<Municipality> {
        self.rows
            .iter()
            .filter(|row| row.has_backing_data)
            .map(|row| row.municipality.clone())
            .collect()
    }

    /// Returns whether any row currently sits in `zone`.
    #[must_use]
    pub fn zone_has_members(&self, zone: &ZoneName) -> bool {
        self.rows.iter().any(|row| &row.municipality.zone == zone)
    }

    /// Rows currently in `zone`, in view order.
    #[must_use]
    pub fn zone_members(&self, zone: &ZoneName) -> Vec<&ViewRow> {
        self.rows
            .iter()
            .filter(|row| &row.municipality.zone == zone)
            .collect()
    }

    /// Every municipality backed by data, sorted by name then identifier.
    #[must_use]
    pub fn municipality_index(&self) -> Vec<&ViewRow> {
        let mut rows: Vec<&ViewRow> = self.rows.iter().filter(|r| r.has_backing_data).collect();
        rows.sort_by(|a, b| {
            a.municipality
                .name
                .cmp(&b.municipality.name)
                .then_with(|| a.municipality.id.cmp(&b.municipality.id))
        });
        rows
    }

    /// Palette zones in palette order with member counts, then the sentinel.
    #[must_use]
    pub fn zones(&self) -> Vec<ZoneEntry> {
        let mut counts: HashMap<&ZoneName, usize> = HashMap::new();
        for row in &self.rows {
            *counts.entry(&row.municipality.zone).or_insert(0) += 1;
        }

        let mut entries: Vec<ZoneEntry> = self
            .palette
            .iter()
            .map(|(name, color)| ZoneEntry {
                name: name.clone(),
                color: color.clone(),
                member_count: counts.get(name).copied().unwrap_or(0),
                reserved: false,
            })
            .collect();
        let sentinel: ZoneName = ZoneName::unassigned();
        let sentinel_count: usize = counts.get(&sentinel).copied().unwrap_or(0);
        entries.push(ZoneEntry {
            name: sentinel,
            color: ZoneColor::unassigned(),
            member_count: sentinel_count,
            reserved: true,
        });
        entries
    }

    /// Renders the rows that have a boundary as a GeoJSON feature collection.
    ///
    /// Each feature's properties carry the zone, its color and the metrics.
    #[must_use]
    pub fn feature_collection(&self) -> Value {
        let features: Vec<Value> = self
            .rows
            .iter()
            .filter_map(|row| {
                row.geometry.as_ref().map(|geometry| {
                    json!({
                        "type": "Feature",
                        "id": row.municipality.id.as_str(),
                        "geometry": geometry,
                        "properties": Value::Object(feature_properties(row)),
                    })
                })
            })
            .collect();
        json!({
            "type": "FeatureCollection",
            "features": features,
        })
    }
}

fn feature_properties(row: &ViewRow) -> Map<String, Value> {
    let municipality: &Municipality = &row.municipality;
    let mut properties: Map<String, Value> = Map::new();
    properties.insert(String::from("id"), json!(municipality.id.as_str()));
    properties.insert(String::from("name"), json!(municipality.name));
    properties.insert(String::from("state"), json!(municipality.state));
    properties.insert(String::from("sub_region"), json!(municipality.sub_region));
    properties.insert(String::from("zone"), json!(municipality.zone.as_str()));
    properties.insert(String::from("color"), json!(row.color.as_str()));
    properties.insert(
        String::from("unassigned"),
        json!(municipality.zone.is_unassigned()),
    );
    properties.insert(String::from("has_backing_data"), json!(row.has_backing_data));
    properties.insert(
        String::from("annual_sales"),
        json!(municipality.metrics.annual_sales),
    );
    properties.insert(
        String::from("monthly_sales"),
        json!(municipality.metrics.monthly_sales),
    );
    properties.insert(
        String::from("annual_potential"),
        json!(municipality.metrics.annual_potential),
    );
    properties.insert(
        String::from("monthly_potential"),
        json!(municipality.metrics.monthly_potential),
    );
    properties.insert(
        String::from("population"),
        json!(municipality.metrics.population),
    );
    properties.insert(
        String::from("points_of_sale"),
        json!(municipality.metrics.points_of_sale),
    );
    properties.insert(String::from("row_share"), json!(row.row_share));
    properties
}
