// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Region code is not two ASCII letters.
    InvalidRegionCode(String),
    /// Municipality identifier is empty after normalization.
    InvalidMunicipalityId(String),
    /// Zone name is empty or otherwise unusable.
    InvalidZoneName(String),
    /// Color is not in `#RRGGBB` form.
    InvalidColor {
        /// The rejected value.
        value: String,
    },
    /// The unassigned sentinel cannot be created, renamed, or recolored.
    ReservedZone {
        /// The operation that was attempted.
        operation: &'static str,
    },
    /// A zone with this name already exists in the region.
    DuplicateZone(String),
    /// The zone does not exist in the palette.
    ZoneNotFound(String),
    /// A reassignment targets a zone that is neither in the palette nor the sentinel.
    UnknownTargetZone(String),
    /// The municipality does not exist in the region.
    MunicipalityNotFound(String),
    /// The municipality is a boundary placeholder with no entity row behind it.
    MunicipalityWithoutData(String),
    /// The requested change would leave the value as it already is.
    NoOpChange {
        /// What the change targeted (municipality id or zone name).
        target: String,
        /// The unchanged value.
        value: String,
    },
    /// A batch reassignment named no municipalities.
    EmptySelection,
}

impl DomainError {
    /// Returns a stable machine-readable name for the violated rule.
    #[must_use]
    pub const fn rule(&self) -> &'static str {
        match self {
            Self::InvalidRegionCode(_) => "region_code_format",
            Self::InvalidMunicipalityId(_) => "municipality_id_format",
            Self::InvalidZoneName(_) => "zone_name_format",
            Self::InvalidColor { .. } => "color_format",
            Self::ReservedZone { .. } => "reserved_zone",
            Self::DuplicateZone(_) => "zone_name_unique",
            Self::ZoneNotFound(_) => "zone_exists",
            Self::UnknownTargetZone(_) => "target_zone_exists",
            Self::MunicipalityNotFound(_) => "municipality_exists",
            Self::MunicipalityWithoutData(_) => "municipality_has_data",
            Self::NoOpChange { .. } => "change_not_noop",
            Self::EmptySelection => "selection_not_empty",
        }
    }

    /// Returns whether this error names something that does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::ZoneNotFound(_) | Self::MunicipalityNotFound(_))
    }
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRegionCode(value) => {
                write!(f, "Invalid region code '{value}': expected two letters")
            }
            Self::InvalidMunicipalityId(msg) => write!(f, "Invalid municipality id: {msg}"),
            Self::InvalidZoneName(msg) => write!(f, "Invalid zone name: {msg}"),
            Self::InvalidColor { value } => {
                write!(f, "Invalid color '{value}': expected #RRGGBB")
            }
            Self::ReservedZone { operation } => {
                write!(f, "Cannot {operation} the reserved unassigned zone")
            }
            Self::DuplicateZone(name) => write!(f, "Zone '{name}' already exists"),
            Self::ZoneNotFound(name) => write!(f, "Zone '{name}' not found"),
            Self::UnknownTargetZone(name) => {
                write!(f, "Target zone '{name}' does not exist")
            }
            Self::MunicipalityNotFound(id) => write!(f, "Municipality '{id}' not found"),
            Self::MunicipalityWithoutData(id) => {
                write!(
                    f,
                    "Municipality '{id}' has a boundary but no data row and cannot be reassigned"
                )
            }
            Self::NoOpChange { target, value } => {
                write!(f, "'{target}' is already '{value}'")
            }
            Self::EmptySelection => write!(f, "No municipalities were selected"),
        }
    }
}

impl std::error::Error for DomainError {}
