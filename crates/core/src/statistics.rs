// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Per-zone and whole-region aggregates over a materialized view.
//!
//! Zone share is always `sum(sales) / sum(potential) * 100` over the zone's
//! members. The mean of per-row shares weights a tiny municipality the same
//! as a large one and is only ever reported as a separately labelled
//! `row_share_*` figure.

use crate::view::{MaterializedView, ViewRow};
use indexmap::IndexMap;
use num_traits::ToPrimitive;
use serde::Serialize;
use zonemap_domain::{RegionCode, SchemaCapabilities, ZoneColor, ZoneName};

/// Aggregates for one zone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneStatistics {
    /// Zone color.
    pub color: ZoneColor,
    /// Number of member rows, placeholders included.
    pub count: usize,
    /// `count` as a percentage of all rows in the region.
    pub percent_of_total: f64,
    /// Sum of annual sales.
    pub sum_sales: f64,
    /// Sum of annual potential.
    pub sum_potential: f64,
    /// Sum of points of sale.
    pub sum_points_of_sale: f64,
    /// Sum of population.
    pub sum_population: f64,
    /// `sum_sales / sum_potential * 100`; `None` without sales or potential data.
    pub zone_share: Option<f64>,
    /// Smallest per-row share among members with data (informational).
    pub row_share_min: Option<f64>,
    /// Largest per-row share among members with data (informational).
    pub row_share_max: Option<f64>,
}

/// Whole-region totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionSummary {
    /// The region.
    pub region: RegionCode,
    /// All rows in the view.
    pub total_municipalities: usize,
    /// Rows backed by entity data.
    pub with_data: usize,
    /// Rows synthesized from boundaries without entity data.
    pub placeholders: usize,
    /// Rows with data but no boundary shape.
    pub without_boundary: usize,
    /// Named zones with at least one member.
    pub zones_in_use: usize,
    /// Rows in the unassigned zone.
    pub unassigned: usize,
    /// Sum of annual sales.
    pub total_sales: f64,
    /// Sum of annual potential.
    pub total_potential: f64,
    /// Sum of points of sale.
    pub total_points_of_sale: f64,
    /// Sum of population.
    pub total_population: f64,
    /// `total_sales / total_potential * 100`; `None` without sales or potential data.
    pub region_share: Option<f64>,
}

/// Spread of per-row share across municipalities with data.
///
/// These are informational figures about individual rows. They are not a
/// zone or region share.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareDistribution {
    /// Number of rows considered.
    pub sample_size: usize,
    /// Smallest per-row share.
    pub row_share_min: Option<f64>,
    /// Largest per-row share.
    pub row_share_max: Option<f64>,
    /// Unweighted mean of per-row share.
    pub row_share_mean: Option<f64>,
    /// Median per-row share.
    pub row_share_median: Option<f64>,
}

#[derive(Default)]
struct Totals {
    count: usize,
    sales: f64,
    potential: f64,
    points_of_sale: f64,
    population: f64,
    row_share_min: Option<f64>,
    row_share_max: Option<f64>,
}

impl Totals {
    fn add(&mut self, row: &ViewRow) {
        let metrics = &row.municipality.metrics;
        self.count += 1;
        self.sales += metrics.annual_sales;
        self.potential += metrics.annual_potential;
        self.points_of_sale += metrics.points_of_sale;
        self.population += metrics.population;
        if row.has_backing_data {
            self.row_share_min = Some(
                self.row_share_min
                    .map_or(row.row_share, |m| m.min(row.row_share)),
            );
            self.row_share_max = Some(
                self.row_share_max
                    .map_or(row.row_share, |m| m.max(row.row_share)),
            );
        }
    }
}

/// Computes aggregates for every zone with at least one member.
///
/// Zones appear in palette order, then zones that are only named by rows,
/// then the unassigned bucket last.
///
/// # Arguments
///
/// * `view` - The view to aggregate
#[must_use]
pub fn by_zone(view: &MaterializedView) -> IndexMap<ZoneName, ZoneStatistics> {
    let mut totals: IndexMap<ZoneName, Totals> = IndexMap::new();
    for zone in view.palette().zones() {
        totals.insert(zone.clone(), Totals::default());
    }
    for row in view.rows() {
        if !row.municipality.zone.is_unassigned() {
            totals
                .entry(row.municipality.zone.clone())
                .or_default()
                .add(row);
        }
    }
    let mut unassigned: Totals = Totals::default();
    for row in view.rows() {
        if row.municipality.zone.is_unassigned() {
            unassigned.add(row);
        }
    }
    totals.insert(ZoneName::unassigned(), unassigned);

    let capabilities: SchemaCapabilities = view.capabilities();
    let total_rows: usize = view.rows().len();
    totals
        .into_iter()
        .filter(|(_, t)| t.count > 0)
        .map(|(zone, t)| {
            let stats: ZoneStatistics = ZoneStatistics {
                color: view.palette().color_of(&zone),
                count: t.count,
                percent_of_total: percentage(t.count, total_rows),
                sum_sales: t.sales,
                sum_potential: t.potential,
                sum_points_of_sale: t.points_of_sale,
                sum_population: t.population,
                zone_share: share(capabilities, t.sales, t.potential),
                row_share_min: t.row_share_min.filter(|_| capabilities.supports_share()),
                row_share_max: t.row_share_max.filter(|_| capabilities.supports_share()),
            };
            (zone, stats)
        })
        .collect()
}

/// Computes whole-region totals.
#[must_use]
pub fn region_summary(view: &MaterializedView) -> RegionSummary {
    let mut totals: Totals = Totals::default();
    let mut with_data: usize = 0;
    let mut without_boundary: usize = 0;
    let mut unassigned: usize = 0;
    for row in view.rows() {
        totals.add(row);
        if row.has_backing_data {
            with_data += 1;
            if !row.has_boundary() {
                without_boundary += 1;
            }
        }
        if row.municipality.zone.is_unassigned() {
            unassigned += 1;
        }
    }

    let zones_in_use: usize = by_zone(view)
        .keys()
        .filter(|zone| !zone.is_unassigned())
        .count();

    RegionSummary {
        region: view.region().clone(),
        total_municipalities: totals.count,
        with_data,
        placeholders: totals.count - with_data,
        without_boundary,
        zones_in_use,
        unassigned,
        total_sales: totals.sales,
        total_potential: totals.potential,
        total_points_of_sale: totals.points_of_sale,
        total_population: totals.population,
        region_share: share(view.capabilities(), totals.sales, totals.potential),
    }
}

/// Describes the spread of per-row share across municipalities with data.
///
/// Every figure is `None` when the region has no sales or potential data,
/// or no municipality with data.
#[must_use]
pub fn share_distribution(view: &MaterializedView) -> ShareDistribution {
    let mut shares: Vec<f64> = if view.capabilities().supports_share() {
        view.rows()
            .iter()
            .filter(|row| row.has_backing_data)
            .map(|row| row.row_share)
            .collect()
    } else {
        Vec::new()
    };
    shares.sort_by(f64::total_cmp);

    let sample_size: usize = shares.len();
    if sample_size == 0 {
        return ShareDistribution {
            sample_size,
            row_share_min: None,
            row_share_max: None,
            row_share_mean: None,
            row_share_median: None,
        };
    }

    let sum: f64 = shares.iter().sum();
    let mean: Option<f64> = sample_size.to_f64().map(|n| sum / n);
    let middle: usize = sample_size / 2;
    let median: f64 = if sample_size % 2 == 0 {
        f64::midpoint(shares[middle - 1], shares[middle])
    } else {
        shares[middle]
    };

    ShareDistribution {
        sample_size,
        row_share_min: shares.first().copied(),
        row_share_max: shares.last().copied(),
        row_share_mean: mean,
        row_share_median: Some(median),
    }
}

fn share(capabilities: SchemaCapabilities, sales: f64, potential: f64) -> Option<f64> {
    if !capabilities.supports_share() {
        return None;
    }
    if potential > 0.0 {
        Some(sales / potential * 100.0)
    } else {
        Some(0.0)
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    match (part.to_f64(), whole.to_f64()) {
        (Some(p), Some(w)) if w > 0.0 => p / w * 100.0,
        _ => 0.0,
    }
}
