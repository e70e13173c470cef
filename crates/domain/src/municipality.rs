// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::types::{MunicipalityId, ZoneName};
use serde::{Deserialize, Serialize};

/// Display name given to boundary shapes that carry no label of their own.
pub const UNIDENTIFIED_NAME: &str = "unidentified";

/// Sub-region label given to placeholder rows.
pub const UNCLASSIFIED_SUB_REGION: &str = "unclassified";

/// Business metrics tracked per municipality.
///
/// Missing or non-numeric source values are zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Metrics {
    /// Annual sell-out.
    pub annual_sales: f64,
    /// Monthly sell-out.
    pub monthly_sales: f64,
    /// Annual sales potential.
    pub annual_potential: f64,
    /// Monthly sales potential.
    pub monthly_potential: f64,
    /// Resident population.
    pub population: f64,
    /// Number of points of sale.
    pub points_of_sale: f64,
    /// Share value as stored in the source table (informational).
    pub stored_share: f64,
}

/// One municipality row of a region's entity table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Municipality {
    /// Stable identifier, unique within the region.
    pub id: MunicipalityId,
    /// Display name.
    pub name: String,
    /// State label carried by the source table (often the region code).
    pub state: String,
    /// Sub-region label (e.g. mesoregion).
    pub sub_region: String,
    /// Current zone assignment.
    pub zone: ZoneName,
    /// Business metrics.
    pub metrics: Metrics,
}

impl Municipality {
    /// Creates a municipality with zero metrics and no sub-region.
    ///
    /// # Arguments
    ///
    /// * `id` - The normalized identifier
    /// * `name` - The display name
    /// * `zone` - The current zone
    #[must_use]
    pub fn new(id: MunicipalityId, name: &str, zone: ZoneName) -> Self {
        Self {
            id,
            name: name.to_string(),
            state: String::new(),
            sub_region: String::new(),
            zone,
            metrics: Metrics::default(),
        }
    }

    /// Creates the zero-valued, unassigned stand-in used for a boundary
    /// shape that has no entity row.
    #[must_use]
    pub fn placeholder(id: MunicipalityId, label: Option<&str>, state: &str) -> Self {
        let name: &str = label
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(UNIDENTIFIED_NAME);
        Self {
            id,
            name: name.to_string(),
            state: state.to_string(),
            sub_region: String::from(UNCLASSIFIED_SUB_REGION),
            zone: ZoneName::unassigned(),
            metrics: Metrics::default(),
        }
    }

    /// Per-row share: `annual_sales / annual_potential * 100`, or zero when
    /// there is no potential.
    ///
    /// This is a single municipality's figure. Zone-level share is computed
    /// from summed sales and potential, never by averaging this value.
    #[must_use]
    pub fn row_share(&self) -> f64 {
        if self.metrics.annual_potential > 0.0 {
            self.metrics.annual_sales / self.metrics.annual_potential * 100.0
        } else {
            0.0
        }
    }
}

/// Which optional columns the entity table actually carried.
///
/// Computed once at load time so aggregation never re-probes the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct SchemaCapabilities {
    /// Annual sales column present.
    pub has_sales: bool,
    /// Annual potential column present.
    pub has_potential: bool,
    /// Points-of-sale column present.
    pub has_points_of_sale: bool,
    /// Population column present.
    pub has_population: bool,
    /// Sub-region column present.
    pub has_sub_region: bool,
}

impl SchemaCapabilities {
    /// Capabilities of a table carrying every optional column.
    #[must_use]
    pub const fn full() -> Self {
        Self {
            has_sales: true,
            has_potential: true,
            has_points_of_sale: true,
            has_population: true,
            has_sub_region: true,
        }
    }

    /// Share figures need both sales and potential.
    #[must_use]
    pub const fn supports_share(&self) -> bool {
        self.has_sales && self.has_potential
    }
}
