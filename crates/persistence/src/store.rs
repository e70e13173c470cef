// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::backup::{self, BackupMetadata};
use crate::catalog::RegionPaths;
use crate::change_log_file::write_change_log;
use crate::error::PersistenceError;
use crate::journal::append_to_journal;
use crate::loader::{LoadedRegion, load_region};
use crate::palette_file::write_palette;
use crate::storage::{read_optional, write_atomic};
use std::fs;
use time::OffsetDateTime;
use tracing::{debug, error, info, warn};
use zonemap_audit::{ChangeEvent, ChangeLog};
use zonemap_domain::{Palette, RegionCode};

/// Label given to the automatic backup taken before a reset.
pub const RESET_BACKUP_LABEL: &str = "before_reset";

/// Durable storage of one region.
///
/// The store performs no locking of its own; callers serialize writes.
#[derive(Debug, Clone)]
pub struct RegionStore {
    region: RegionCode,
    paths: RegionPaths,
}

impl RegionStore {
    /// Creates a store over resolved region paths.
    #[must_use]
    pub const fn new(region: RegionCode, paths: RegionPaths) -> Self {
        Self { region, paths }
    }

    /// The region code.
    #[must_use]
    pub const fn region(&self) -> &RegionCode {
        &self.region
    }

    /// The region's file paths.
    #[must_use]
    pub const fn paths(&self) -> &RegionPaths {
        &self.paths
    }

    /// Loads the region from disk.
    ///
    /// # Errors
    ///
    /// See [`load_region`].
    pub fn load(&self, now: OffsetDateTime) -> Result<LoadedRegion, PersistenceError> {
        load_region(&self.region, &self.paths, now)
    }

    /// Persists a validated mutation.
    ///
    /// The palette (when it changed) is written before the change log. If
    /// the change log write fails, the previous palette content is put back
    /// so the files on disk stay consistent with each other. The daily
    /// journal is written last and its failure is only logged.
    ///
    /// # Arguments
    ///
    /// * `palette` - The new palette, if the mutation changed it
    /// * `log` - The complete change log including `appended`
    /// * `appended` - Events added by this mutation
    /// * `now` - Commit time
    ///
    /// # Errors
    ///
    /// Returns the first write failure; nothing is left half-written.
    pub fn persist_mutation(
        &self,
        palette: Option<&Palette>,
        log: &ChangeLog,
        appended: &[ChangeEvent],
        now: OffsetDateTime,
    ) -> Result<(), PersistenceError> {
        let prior_palette: Option<Option<Vec<u8>>> = match palette {
            Some(palette) => {
                let prior: Option<Vec<u8>> = read_optional(&self.paths.palette)?;
                write_palette(&self.paths.palette, palette)?;
                Some(prior)
            }
            None => None,
        };

        // Palette-only mutations leave the log untouched
        let log_result: Result<(), PersistenceError> =
            if appended.is_empty() && prior_palette.is_some() {
                Ok(())
            } else {
                write_change_log(&self.paths.change_log, log)
            };
        if let Err(e) = log_result {
            error!(region = %self.region, error = %e, "Change log write failed");
            if let Some(prior) = prior_palette {
                self.roll_back_palette(prior);
            }
            return Err(e);
        }

        if let Err(e) = append_to_journal(&self.paths.history_dir, appended, now) {
            warn!(region = %self.region, error = %e, "Daily journal write failed");
        }
        debug!(region = %self.region, events = appended.len(), "Persisted mutation");
        Ok(())
    }

    fn roll_back_palette(&self, prior: Option<Vec<u8>>) {
        let result: Result<(), PersistenceError> = match prior {
            Some(bytes) => write_atomic(&self.paths.palette, &bytes),
            None => fs::remove_file(&self.paths.palette)
                .map_err(|e| PersistenceError::io(&self.paths.palette, &e)),
        };
        match result {
            Ok(()) => warn!(region = %self.region, "Rolled back palette after failed change log write"),
            Err(e) => error!(region = %self.region, error = %e, "Palette rollback failed"),
        }
    }

    /// Copies the current files into a new backup.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Io` if a copy fails.
    pub fn snapshot(
        &self,
        label: Option<&str>,
        now: OffsetDateTime,
    ) -> Result<BackupMetadata, PersistenceError> {
        backup::create_backup(&self.paths, label, now)
    }

    /// Lists backups, newest first.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Io` if the backup directory cannot be read.
    pub fn list_backups(&self) -> Result<Vec<BackupMetadata>, PersistenceError> {
        backup::list_backups(&self.paths.backups_dir)
    }

    /// Copies a backup's files back over the region's files.
    ///
    /// # Errors
    ///
    /// * `PersistenceError::BackupNotFound` if the id is unknown or unsafe
    /// * `PersistenceError::Io` if a copy fails
    pub fn restore(&self, id: &str) -> Result<BackupMetadata, PersistenceError> {
        let metadata: BackupMetadata = backup::restore_backup(&self.paths, id)?;
        info!(region = %self.region, backup = %id, "Region restored from backup");
        Ok(metadata)
    }

    /// Backs up the region and starts an empty change log.
    ///
    /// The entity table and palette are kept, so assignments fall back to
    /// those recorded in the entity table.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Io` if the backup or the log write fails.
    pub fn reset(&self, now: OffsetDateTime) -> Result<BackupMetadata, PersistenceError> {
        let metadata: BackupMetadata = self.snapshot(Some(RESET_BACKUP_LABEL), now)?;
        write_change_log(&self.paths.change_log, &ChangeLog::new(now))?;
        info!(region = %self.region, backup = %metadata.id, "Region change log reset");
        Ok(metadata)
    }
}
