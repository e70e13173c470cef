// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};

/// Name of the reserved zone holding municipalities with no assignment.
pub const UNASSIGNED_ZONE: &str = "unassigned";

/// Name the legacy data files use for the unassigned zone.
pub const LEGACY_UNASSIGNED_ZONE: &str = "Sem Zona";

/// Fixed color of the unassigned zone and of any zone missing from the palette.
pub const UNASSIGNED_COLOR: &str = "#CCCCCC";

/// A two-letter region code (e.g. `PE`).
///
/// Codes are normalized to uppercase so `pe` and `PE` name the same region.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegionCode {
    value: String,
}

impl RegionCode {
    /// Parses and normalizes a region code.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidRegionCode` unless the input is exactly
    /// two ASCII letters after trimming.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed: &str = raw.trim();
        if trimmed.len() != 2 || !trimmed.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(DomainError::InvalidRegionCode(raw.to_string()));
        }
        Ok(Self {
            value: trimmed.to_ascii_uppercase(),
        })
    }

    /// Returns the normalized code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl TryFrom<String> for RegionCode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RegionCode> for String {
    fn from(code: RegionCode) -> Self {
        code.value
    }
}

impl std::fmt::Display for RegionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

/// A municipality identifier in its normalized string form.
///
/// Entity tables usually carry identifiers as numbers while boundary files
/// carry them as strings. Both sides go through the same normalization so
/// the join compares like with like: surrounding whitespace is dropped and
/// an integral float rendering (`2611606.0`) collapses to its digits.
/// Leading zeros are significant and kept.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MunicipalityId {
    value: String,
}

impl MunicipalityId {
    /// Normalizes a raw identifier.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidMunicipalityId` if the identifier is empty.
    pub fn normalize(raw: &str) -> Result<Self, DomainError> {
        let trimmed: &str = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidMunicipalityId(String::from(
                "identifier cannot be empty",
            )));
        }

        let value: &str = match trimmed.split_once('.') {
            Some((integral, fraction))
                if !integral.is_empty()
                    && integral.bytes().all(|b| b.is_ascii_digit())
                    && !fraction.is_empty()
                    && fraction.bytes().all(|b| b == b'0') =>
            {
                integral
            }
            _ => trimmed,
        };

        Ok(Self {
            value: value.to_string(),
        })
    }

    /// Normalizes an identifier taken from JSON, where it may be a string or a number.
    ///
    /// Returns `None` for null, booleans, containers, and empty strings.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Self::normalize(s).ok(),
            serde_json::Value::Number(n) => {
                if let Some(unsigned) = n.as_u64() {
                    Self::normalize(&unsigned.to_string()).ok()
                } else if let Some(signed) = n.as_i64() {
                    Self::normalize(&signed.to_string()).ok()
                } else {
                    Self::normalize(&n.to_string()).ok()
                }
            }
            _ => None,
        }
    }

    /// Returns the normalized identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl TryFrom<String> for MunicipalityId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::normalize(&value)
    }
}

impl From<MunicipalityId> for String {
    fn from(id: MunicipalityId) -> Self {
        id.value
    }
}

impl std::fmt::Display for MunicipalityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

/// The name of a zone. Names are case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ZoneName {
    value: String,
}

impl ZoneName {
    /// Creates a zone name, trimming surrounding whitespace.
    ///
    /// The legacy name [`LEGACY_UNASSIGNED_ZONE`] becomes the unassigned zone.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidZoneName` if the name is empty.
    pub fn new(raw: &str) -> Result<Self, DomainError> {
        let trimmed: &str = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidZoneName(String::from(
                "Zone name cannot be empty",
            )));
        }
        if trimmed == LEGACY_UNASSIGNED_ZONE {
            return Ok(Self::unassigned());
        }
        Ok(Self {
            value: trimmed.to_string(),
        })
    }

    /// Returns the reserved unassigned zone.
    #[must_use]
    pub fn unassigned() -> Self {
        Self {
            value: String::from(UNASSIGNED_ZONE),
        }
    }

    /// Returns whether this is the reserved unassigned zone.
    #[must_use]
    pub fn is_unassigned(&self) -> bool {
        self.value == UNASSIGNED_ZONE
    }

    /// Returns the zone name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl TryFrom<String> for ZoneName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<ZoneName> for String {
    fn from(name: ZoneName) -> Self {
        name.value
    }
}

impl std::fmt::Display for ZoneName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

/// A zone color in `#RRGGBB` form, stored uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ZoneColor {
    value: String,
}

impl ZoneColor {
    /// Parses a color.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidColor` unless the input is `#` followed by
    /// exactly six hexadecimal digits.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed: &str = raw.trim();
        let valid: bool = trimmed.len() == 7
            && trimmed.starts_with('#')
            && trimmed[1..].bytes().all(|b| b.is_ascii_hexdigit());
        if !valid {
            return Err(DomainError::InvalidColor {
                value: raw.to_string(),
            });
        }
        Ok(Self {
            value: trimmed.to_ascii_uppercase(),
        })
    }

    /// Returns the fixed gray used for unassigned and unknown zones.
    #[must_use]
    pub fn unassigned() -> Self {
        Self {
            value: String::from(UNASSIGNED_COLOR),
        }
    }

    /// Returns the color string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl TryFrom<String> for ZoneColor {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ZoneColor> for String {
    fn from(color: ZoneColor) -> Self {
        color.value
    }
}

impl std::fmt::Display for ZoneColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}
