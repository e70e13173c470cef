// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The zone map engine.
//!
//! [`TerritoryEngine`] is the single entry point for transports. It owns
//! the region catalog and one session per loaded region. Each session keeps
//! the committed change log behind a mutex (the region's writer lock) and
//! the committed view behind an `ArcSwap`, so reads never wait on writes.
//!
//! A mutation validates against the current view, appends to a copy of the
//! log, persists, and only then publishes. A failed write leaves the
//! session exactly as it was.

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

mod engine;
mod error;
mod request_response;
mod session;

#[cfg(test)]
mod tests;

pub use engine::{Clock, TerritoryEngine};
pub use error::{
    ApiError, translate_core_error, translate_domain_error, translate_persistence_error,
};
pub use request_response::{
    AddZoneRequest, ChangeHistory, ChangeNotification, MaintenanceOutcome, MunicipalityInfo,
    MutationOutcome, ReassignManyRequest, ReassignZoneRequest, RecolorZoneRequest,
    RegionOverview, RegisterRegionRequest, RegistrationOutcome, RenameZoneRequest,
    UnassignRequest,
};

pub use zonemap_audit::Actor;
pub use zonemap_persistence::{BackupMetadata, RegionListing, ReportFormat};
