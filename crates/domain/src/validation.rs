// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::palette::Palette;
use crate::types::ZoneName;

/// Validates that a zone can receive municipalities.
///
/// # Arguments
///
/// * `palette` - The region's palette
/// * `zone` - The requested target zone
///
/// # Errors
///
/// Returns `DomainError::UnknownTargetZone` unless the zone is the
/// unassigned sentinel or a palette entry.
pub fn validate_target_zone(palette: &Palette, zone: &ZoneName) -> Result<(), DomainError> {
    if zone.is_unassigned() || palette.contains(zone) {
        Ok(())
    } else {
        Err(DomainError::UnknownTargetZone(zone.to_string()))
    }
}

/// Validates that a zone name is free to be created or renamed onto.
///
/// Names are compared case-sensitively.
///
/// # Arguments
///
/// * `palette` - The region's palette
/// * `zone` - The proposed name
/// * `operation` - Reported when the name is the reserved sentinel
///
/// # Errors
///
/// * `DomainError::ReservedZone` if the name is the sentinel
/// * `DomainError::DuplicateZone` if the palette already has the name
pub fn validate_zone_name_available(
    palette: &Palette,
    zone: &ZoneName,
    operation: &'static str,
) -> Result<(), DomainError> {
    if zone.is_unassigned() {
        return Err(DomainError::ReservedZone { operation });
    }
    if palette.contains(zone) {
        return Err(DomainError::DuplicateZone(zone.to_string()));
    }
    Ok(())
}

/// Rejects operations that may not touch the sentinel.
///
/// # Errors
///
/// Returns `DomainError::ReservedZone` if `zone` is the sentinel.
pub fn validate_not_reserved(zone: &ZoneName, operation: &'static str) -> Result<(), DomainError> {
    if zone.is_unassigned() {
        return Err(DomainError::ReservedZone { operation });
    }
    Ok(())
}

/// Rejects a change whose new value equals the current one.
///
/// # Arguments
///
/// * `target` - What is being changed, for the error message
/// * `current` - The current value
/// * `requested` - The requested value
///
/// # Errors
///
/// Returns `DomainError::NoOpChange` if the two values are equal.
pub fn validate_change_not_noop<T>(target: &str, current: &T, requested: &T) -> Result<(), DomainError>
where
    T: PartialEq + std::fmt::Display,
{
    if current == requested {
        return Err(DomainError::NoOpChange {
            target: target.to_string(),
            value: requested.to_string(),
        });
    }
    Ok(())
}
