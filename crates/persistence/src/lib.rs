// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! File-backed persistence for the zone map engine.
//!
//! Every region lives in its own directory under the data directory:
//!
//! - `entities.csv`: the entity table (municipalities and metrics)
//! - `boundaries.geojson`: boundary shapes
//! - `zone_colors.json`: the ordered zone palette
//! - `change_log.json`: the append-only change log
//! - `history/`: a daily journal of committed events
//! - `backups/`: point-in-time copies
//!
//! The registry `regions.json` at the root of the data directory lists the
//! regions and may override any of these names.
//!
//! ## Durability
//!
//! All writes go through [`storage::write_atomic`]: content is written to a
//! sibling temporary file and renamed over the target, so a reader never
//! sees a partially written file. A mutation writes the palette before the
//! change log and restores the palette if the change log write fails.
//!
//! ## Loading
//!
//! [`load_region`] applies a fixed fallback ladder and reports every
//! decision in a [`LoadReport`]. See the [`loader`] module.

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

mod backup;
mod boundaries;
mod catalog;
mod change_log_file;
mod entity_table;
mod error;
mod journal;
pub mod loader;
mod palette_file;
mod report;
pub mod storage;
mod store;

#[cfg(test)]
mod tests;

pub use backup::{
    BackupMetadata, METADATA_FILE, create_backup, latest_entity_table, list_backups,
    restore_backup,
};
pub use boundaries::{BoundarySet, parse_boundaries, read_boundaries};
pub use catalog::{
    REGISTRY_FILE, RegionCatalog, RegionFiles, RegionListing, RegionPaths, RegionRecord,
};
pub use change_log_file::{read_change_log, write_change_log};
pub use entity_table::{
    CANONICAL_HEADERS, EntityTable, parse_entity_table, read_entity_table, write_entity_table,
};
pub use error::PersistenceError;
pub use journal::{append_to_journal, journal_path};
pub use loader::{LoadReport, LoadTier, LoadedRegion, PaletteSource, load_region};
pub use palette_file::{PaletteFile, read_palette, write_palette};
pub use report::{ReportFormat, change_report, export_entity_table};
pub use store::{RESET_BACKUP_LABEL, RegionStore};
