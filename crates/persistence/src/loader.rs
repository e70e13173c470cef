// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Region loading with a fixed fallback ladder.
//!
//! Entity table: primary file, then the newest backup copy, then a single
//! synthesized placeholder row. Palette: file, then synthesized from the
//! zones in use. Boundaries and the change log have no fallback beyond
//! "missing change log means empty".

use crate::backup::latest_entity_table;
use crate::boundaries::{BoundarySet, read_boundaries};
use crate::catalog::RegionPaths;
use crate::change_log_file::read_change_log;
use crate::entity_table::{EntityTable, read_entity_table};
use crate::error::PersistenceError;
use crate::palette_file::{PaletteFile, read_palette};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{debug, info, warn};
use zonemap::{IntegrityReport, MaterializedView};
use zonemap_audit::{ChangeLog, ReplayOutcome};
use zonemap_domain::{Municipality, MunicipalityId, Palette, RegionCode, SchemaCapabilities};

/// Identifier of the row synthesized when no entity table can be read.
pub const SYNTHESIZED_MUNICIPALITY_ID: &str = "0000000";

/// Where the entity table came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "tier", content = "backup_id", rename_all = "snake_case")]
pub enum LoadTier {
    /// The region's own entity table.
    Primary,
    /// The entity table of the named backup.
    Backup(String),
    /// A single placeholder row; no table could be read.
    Synthesized,
}

/// Where the palette came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaletteSource {
    /// The region's palette file.
    File,
    /// Generated from the zones in use.
    Synthesized,
}

/// Everything decided while loading a region, for logs and callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Entity table source.
    pub tier: LoadTier,
    /// Palette source.
    pub palette_source: PaletteSource,
    /// Required entity columns that were filled with defaults.
    pub synthesized_columns: Vec<&'static str>,
    /// Numeric cells read as zero because they did not parse.
    pub coerced_cells: usize,
    /// Palette zones whose stored color was replaced with gray.
    pub coerced_colors: Vec<String>,
    /// Entity rows dropped for having no identifier.
    pub skipped_rows: usize,
    /// Boundary features dropped for having no identifier.
    pub skipped_boundaries: usize,
    /// Change log events applied during replay.
    pub replayed_events: usize,
    /// Sequences of events naming municipalities absent from the table.
    pub skipped_events: Vec<u64>,
    /// Join anomalies between boundaries and entity rows.
    pub integrity: IntegrityReport,
}

/// A fully loaded region: the merged view and its change log.
#[derive(Debug, Clone)]
pub struct LoadedRegion {
    /// The merged, colored view.
    pub view: MaterializedView,
    /// The region's change log as read from disk.
    pub change_log: ChangeLog,
    /// How the region was loaded.
    pub report: LoadReport,
}

/// Loads a region from its files and materializes its view.
///
/// # Arguments
///
/// * `region` - The region code
/// * `paths` - The region's files
/// * `now` - Creation time for a new empty change log
///
/// # Errors
///
/// * `PersistenceError::MissingFile` or `MalformedFile` for the boundary file
/// * `PersistenceError::MalformedFile` for an unparseable change log
/// * `PersistenceError::Io` when a file exists but cannot be read
pub fn load_region(
    region: &RegionCode,
    paths: &RegionPaths,
    now: OffsetDateTime,
) -> Result<LoadedRegion, PersistenceError> {
    let (table, tier): (EntityTable, LoadTier) = load_entity_table(region, paths)?;
    let boundaries: BoundarySet = read_boundaries(&paths.boundaries)?;
    if boundaries.skipped > 0 {
        warn!(region = %region, skipped = boundaries.skipped, "Boundary features without an identifier were skipped");
    }
    let change_log: ChangeLog = read_change_log(&paths.change_log, now)?;

    let ReplayOutcome {
        municipalities,
        applied,
        skipped,
    } = change_log.replay_onto(&table.municipalities);
    if !skipped.is_empty() {
        warn!(region = %region, events = ?skipped, "Change log events name municipalities absent from the entity table");
    }

    let (palette, palette_source, coerced_colors): (Palette, PaletteSource, Vec<String>) =
        load_palette(region, paths, &municipalities)?;

    let (view, mut integrity): (MaterializedView, IntegrityReport) = MaterializedView::build(
        region.clone(),
        municipalities,
        boundaries.features,
        palette,
        table.capabilities,
    );
    integrity
        .duplicate_entities
        .extend(table.duplicate_ids.iter().cloned());
    log_integrity(region, &integrity);

    info!(
        region = %region,
        rows = view.rows().len(),
        events = change_log.len(),
        tier = ?tier,
        "Loaded region"
    );

    Ok(LoadedRegion {
        view,
        change_log,
        report: LoadReport {
            tier,
            palette_source,
            synthesized_columns: table.synthesized_columns,
            coerced_cells: table.coerced_cells,
            coerced_colors,
            skipped_rows: table.skipped_rows,
            skipped_boundaries: boundaries.skipped,
            replayed_events: applied,
            skipped_events: skipped,
            integrity,
        },
    })
}

fn load_entity_table(
    region: &RegionCode,
    paths: &RegionPaths,
) -> Result<(EntityTable, LoadTier), PersistenceError> {
    match read_entity_table(&paths.entities) {
        Ok(table) => {
            log_table_quality(region, &table);
            return Ok((table, LoadTier::Primary));
        }
        Err(e @ (PersistenceError::MissingFile { .. } | PersistenceError::MalformedFile { .. })) => {
            warn!(region = %region, error = %e, "Primary entity table unusable, trying backups");
        }
        Err(e) => return Err(e),
    }

    if let Some((id, path)) = latest_entity_table(paths)? {
        match read_entity_table(&path) {
            Ok(table) => {
                warn!(region = %region, backup = %id, "Loaded entity table from backup");
                log_table_quality(region, &table);
                return Ok((table, LoadTier::Backup(id)));
            }
            Err(e) => {
                warn!(region = %region, backup = %id, error = %e, "Backup entity table unusable");
            }
        }
    }

    warn!(region = %region, "No entity table available, synthesizing a placeholder row");
    Ok((synthesized_table(region), LoadTier::Synthesized))
}

fn synthesized_table(region: &RegionCode) -> EntityTable {
    let municipalities: Vec<Municipality> = MunicipalityId::normalize(SYNTHESIZED_MUNICIPALITY_ID)
        .map(|id| vec![Municipality::placeholder(id, None, region.as_str())])
        .unwrap_or_default();
    EntityTable {
        municipalities,
        capabilities: SchemaCapabilities::default(),
        coerced_cells: 0,
        synthesized_columns: Vec::new(),
        duplicate_ids: Vec::new(),
        skipped_rows: 0,
    }
}

fn load_palette(
    region: &RegionCode,
    paths: &RegionPaths,
    municipalities: &[Municipality],
) -> Result<(Palette, PaletteSource, Vec<String>), PersistenceError> {
    let synthesized = || Palette::synthesize(municipalities.iter().map(|m| &m.zone));

    match read_palette(&paths.palette) {
        Ok(Some(PaletteFile { palette, coerced })) => {
            if !coerced.is_empty() {
                warn!(region = %region, zones = ?coerced, "Invalid palette colors replaced with gray");
            }
            let coerced: Vec<String> = coerced.iter().map(ToString::to_string).collect();
            Ok((palette, PaletteSource::File, coerced))
        }
        Ok(None) => {
            warn!(region = %region, "Palette file missing, synthesizing colors");
            Ok((synthesized(), PaletteSource::Synthesized, Vec::new()))
        }
        Err(e @ PersistenceError::MalformedFile { .. }) => {
            warn!(region = %region, error = %e, "Palette file malformed, synthesizing colors");
            Ok((synthesized(), PaletteSource::Synthesized, Vec::new()))
        }
        Err(e) => Err(e),
    }
}

fn log_table_quality(region: &RegionCode, table: &EntityTable) {
    if !table.synthesized_columns.is_empty() {
        warn!(region = %region, columns = ?table.synthesized_columns, "Entity table columns missing, filled with defaults");
    }
    if table.coerced_cells > 0 {
        warn!(region = %region, cells = table.coerced_cells, "Non-numeric entity cells read as zero");
    }
    if table.skipped_rows > 0 {
        warn!(region = %region, rows = table.skipped_rows, "Entity rows without an identifier were skipped");
    }
    debug!(region = %region, capabilities = ?table.capabilities, "Entity table capabilities");
}

fn log_integrity(region: &RegionCode, report: &IntegrityReport) {
    if report.is_clean() {
        return;
    }
    if !report.orphan_boundaries.is_empty() {
        warn!(region = %region, count = report.orphan_boundaries.len(), "Boundaries without entity data rendered as placeholders");
    }
    if !report.orphan_entities.is_empty() {
        warn!(region = %region, count = report.orphan_entities.len(), "Entity rows without a boundary kept for statistics only");
    }
    if !report.duplicate_entities.is_empty() {
        warn!(region = %region, ids = ?report.duplicate_entities, "Duplicate entity identifiers, first row kept");
    }
    if !report.duplicate_boundaries.is_empty() {
        warn!(region = %region, ids = ?report.duplicate_boundaries, "Duplicate boundary identifiers, first shape kept");
    }
}
