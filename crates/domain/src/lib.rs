// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod error;
mod municipality;
mod palette;
mod types;
mod validation;

#[cfg(test)]
mod tests;

// Re-export public types
pub use error::DomainError;
pub use municipality::{
    Metrics, Municipality, SchemaCapabilities, UNCLASSIFIED_SUB_REGION, UNIDENTIFIED_NAME,
};
pub use palette::{Palette, SYNTHESIZED_COLOR_CYCLE};
pub use types::{
    LEGACY_UNASSIGNED_ZONE, MunicipalityId, RegionCode, UNASSIGNED_COLOR, UNASSIGNED_ZONE,
    ZoneColor, ZoneName,
};
pub use validation::{
    validate_change_not_noop, validate_not_reserved, validate_target_zone,
    validate_zone_name_available,
};
