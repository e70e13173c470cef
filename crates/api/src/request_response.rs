// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API request and response data transfer objects.

use serde::{Deserialize, Serialize};
use zonemap::{AffectedMunicipality, RegionSummary, ViewRow, ZoneEntry};
use zonemap_audit::{ChangeEvent, ChangeSummary};
use zonemap_domain::{Metrics, MunicipalityId, RegionCode, ZoneColor, ZoneName};
use zonemap_persistence::{BackupMetadata, LoadReport, RegionListing};

/// API request to register (or reactivate) a region.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RegisterRegionRequest {
    /// Two-letter region code.
    pub code: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
}

/// API request to move one municipality to a zone.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReassignZoneRequest {
    /// The municipality identifier.
    pub municipality_id: String,
    /// The target zone (a palette zone or `unassigned`).
    pub zone: String,
}

/// API request to move several municipalities to one zone.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReassignManyRequest {
    /// The municipality identifiers.
    pub municipality_ids: Vec<String>,
    /// The target zone.
    pub zone: String,
}

/// API request to move a municipality back to the unassigned zone.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UnassignRequest {
    /// The municipality identifier.
    pub municipality_id: String,
}

/// API request to rename a zone and set its color.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RenameZoneRequest {
    /// Current zone name.
    pub from: String,
    /// New zone name.
    pub to: String,
    /// Color for the renamed zone (`#RRGGBB`).
    pub color: String,
}

/// API request to change a zone's color.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RecolorZoneRequest {
    /// Zone name.
    pub zone: String,
    /// New color (`#RRGGBB`).
    pub color: String,
}

/// API request to add a zone to the palette.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AddZoneRequest {
    /// New zone name.
    pub zone: String,
    /// Zone color (`#RRGGBB`).
    pub color: String,
}

/// A municipality as listed by the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MunicipalityInfo {
    /// Identifier.
    pub id: MunicipalityId,
    /// Display name.
    pub name: String,
    /// State label.
    pub state: String,
    /// Sub-region label.
    pub sub_region: String,
    /// Current zone.
    pub zone: ZoneName,
    /// Current zone color.
    pub color: ZoneColor,
    /// `false` for boundary placeholders.
    pub has_backing_data: bool,
    /// `false` for rows with no shape on the map.
    pub has_boundary: bool,
    /// Per-row share (informational).
    pub row_share: f64,
    /// Business metrics.
    pub metrics: Metrics,
}

impl From<&ViewRow> for MunicipalityInfo {
    fn from(row: &ViewRow) -> Self {
        Self {
            id: row.municipality.id.clone(),
            name: row.municipality.name.clone(),
            state: row.municipality.state.clone(),
            sub_region: row.municipality.sub_region.clone(),
            zone: row.municipality.zone.clone(),
            color: row.color.clone(),
            has_backing_data: row.has_backing_data,
            has_boundary: row.has_boundary(),
            row_share: row.row_share,
            metrics: row.municipality.metrics,
        }
    }
}

/// What a caller sees after selecting or reloading a region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionOverview {
    /// Region code.
    pub region: RegionCode,
    /// Display name from the registry.
    pub name: String,
    /// Whole-region totals.
    pub summary: RegionSummary,
    /// Palette zones with member counts, then the sentinel.
    pub zones: Vec<ZoneEntry>,
    /// How the region's files were loaded.
    pub load: LoadReport,
}

/// The change log as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeHistory {
    /// Region code.
    pub region: RegionCode,
    /// Counters over the whole log.
    pub summary: ChangeSummary,
    /// Events, newest first, possibly limited.
    pub changes: Vec<ChangeEvent>,
}

/// A fact about a committed change, for observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeNotification {
    /// One or more municipalities changed zone.
    ZoneReassigned {
        /// Region code.
        region: RegionCode,
        /// The moved municipalities with their new zone and color.
        municipalities: Vec<AffectedMunicipality>,
    },
    /// A zone was renamed; its members moved with it.
    ZoneRenamed {
        /// Region code.
        region: RegionCode,
        /// Old name.
        from: ZoneName,
        /// New name.
        to: ZoneName,
        /// Color of the renamed zone.
        color: ZoneColor,
        /// The moved municipalities.
        municipalities: Vec<AffectedMunicipality>,
    },
    /// A zone's color changed.
    ZoneRecolored {
        /// Region code.
        region: RegionCode,
        /// Zone name.
        zone: ZoneName,
        /// New color.
        color: ZoneColor,
    },
    /// A zone was added to the palette.
    ZoneAdded {
        /// Region code.
        region: RegionCode,
        /// Zone name.
        zone: ZoneName,
        /// Zone color.
        color: ZoneColor,
    },
    /// A region's files were restored from a backup.
    RegionRestored {
        /// Region code.
        region: RegionCode,
        /// The backup that was restored.
        backup_id: String,
    },
    /// A region's change log was archived and cleared.
    RegionReset {
        /// Region code.
        region: RegionCode,
        /// The backup taken before the reset.
        backup_id: String,
    },
    /// A region was registered or reactivated.
    RegionRegistered {
        /// Region code.
        region: RegionCode,
        /// Display name.
        name: String,
    },
}

/// The result of a committed zone mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MutationOutcome {
    /// Municipalities whose zone or color changed, as they are now.
    pub affected: Vec<AffectedMunicipality>,
    /// Events appended to the change log.
    pub events: Vec<ChangeEvent>,
    /// What to tell observers.
    pub notification: ChangeNotification,
}

/// The result of a restore or reset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaintenanceOutcome {
    /// The backup restored from, or taken before a reset.
    pub backup: BackupMetadata,
    /// The region as reloaded from disk.
    pub overview: RegionOverview,
    /// What to tell observers.
    pub notification: ChangeNotification,
}

/// The result of registering a region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationOutcome {
    /// The registry entry.
    pub region: RegionListing,
    /// What to tell observers.
    pub notification: ChangeNotification,
}
