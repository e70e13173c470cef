// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Per-region in-memory state.

use crate::error::{ApiError, translate_core_error, translate_persistence_error};
use arc_swap::ArcSwap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use time::OffsetDateTime;
use tracing::{debug, info, warn};
use zonemap::{AffectedMunicipality, Command, MaterializedView, TransitionResult, apply};
use zonemap_audit::{Actor, ChangeEvent, ChangeLog};
use zonemap_domain::{Palette, RegionCode};
use zonemap_persistence::{
    BackupMetadata, LoadReport, LoadedRegion, PersistenceError, RegionStore,
};

/// The outcome of a committed mutation, before it is shaped for callers.
#[derive(Debug)]
pub struct CommittedMutation {
    /// Municipalities whose zone or color changed.
    pub affected: Vec<AffectedMunicipality>,
    /// Events appended to the change log.
    pub events: Vec<ChangeEvent>,
    /// The view now being served.
    pub view: Arc<MaterializedView>,
}

/// A loaded region.
///
/// The `log` mutex is the region's single-writer lock: every mutation,
/// snapshot, restore, reset and reload holds it from start to finish.
/// Readers never take it; they load the last committed view from `view`.
///
/// A retired session refuses every operation that takes the lock. The flag
/// is only set while the lock is held, so a writer that acquires the lock
/// afterwards always sees it.
#[derive(Debug)]
pub struct RegionSession {
    store: RegionStore,
    name: String,
    log: Mutex<ChangeLog>,
    retired: AtomicBool,
    view: ArcSwap<MaterializedView>,
    report: ArcSwap<LoadReport>,
}

impl RegionSession {
    /// Loads a region from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity ladder is exhausted or a file without a
    /// fallback is unusable.
    pub fn load(store: RegionStore, name: String, now: OffsetDateTime) -> Result<Self, ApiError> {
        let loaded: LoadedRegion = store.load(now).map_err(translate_persistence_error)?;
        info!(
            region = %store.region(),
            rows = loaded.view.rows().len(),
            events = loaded.change_log.len(),
            "Region session opened"
        );
        Ok(Self {
            store,
            name,
            log: Mutex::new(loaded.change_log),
            retired: AtomicBool::new(false),
            view: ArcSwap::from_pointee(loaded.view),
            report: ArcSwap::from_pointee(loaded.report),
        })
    }

    #[must_use]
    pub const fn region(&self) -> &RegionCode {
        self.store.region()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The last committed view.
    #[must_use]
    pub fn view(&self) -> Arc<MaterializedView> {
        self.view.load_full()
    }

    /// The report of the most recent load.
    #[must_use]
    pub fn report(&self) -> Arc<LoadReport> {
        self.report.load_full()
    }

    /// A copy of the committed change log.
    ///
    /// # Errors
    ///
    /// * `ApiError::NotFound` if the session was retired
    /// * `ApiError::Internal` if the region lock is poisoned
    pub fn change_log(&self) -> Result<ChangeLog, ApiError> {
        Ok(self.lock()?.clone())
    }

    /// `true` once the session no longer serves its region.
    #[must_use]
    pub fn is_retired(&self) -> bool {
        self.retired.load(Ordering::SeqCst)
    }

    /// Stops the session from serving any further writes.
    ///
    /// Waits for an in-flight mutation to finish first.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Internal` if the region lock is poisoned.
    pub fn retire(&self) -> Result<(), ApiError> {
        let _guard: MutexGuard<'_, ChangeLog> = self.raw_lock()?;
        self.mark_retired();
        Ok(())
    }

    fn mark_retired(&self) {
        if !self.retired.swap(true, Ordering::SeqCst) {
            info!(region = %self.region(), "Region session retired");
        }
    }

    fn raw_lock(&self) -> Result<MutexGuard<'_, ChangeLog>, ApiError> {
        self.log
            .lock()
            .map_err(|_| ApiError::internal("Region lock poisoned"))
    }

    fn lock(&self) -> Result<MutexGuard<'_, ChangeLog>, ApiError> {
        let guard: MutexGuard<'_, ChangeLog> = self.raw_lock()?;
        if self.is_retired() {
            return Err(ApiError::NotFound {
                resource_type: String::from("Region"),
                message: format!("Region '{}' is no longer loaded", self.region()),
            });
        }
        Ok(guard)
    }

    /// Applies, persists and publishes a command.
    ///
    /// Nothing in memory changes unless the files were written.
    ///
    /// # Errors
    ///
    /// * Validation and not-found errors from the state transition
    /// * `ApiError::Persistence` if the files could not be written
    pub fn mutate(
        &self,
        command: Command,
        actor: &Actor,
        now: OffsetDateTime,
    ) -> Result<CommittedMutation, ApiError> {
        let mut log: MutexGuard<'_, ChangeLog> = self.lock()?;
        let current: Arc<MaterializedView> = self.view.load_full();
        let command_name: &'static str = command.name();

        let result: TransitionResult =
            apply(&current, command, actor).map_err(translate_core_error)?;

        let mut next_log: ChangeLog = log.clone();
        let events: Vec<ChangeEvent> = next_log.append(result.drafts, now);
        let palette: Option<&Palette> = result
            .palette_changed
            .then(|| result.new_view.palette());
        self.store
            .persist_mutation(palette, &next_log, &events, now)
            .map_err(translate_persistence_error)?;

        let view: Arc<MaterializedView> = Arc::new(result.new_view);
        *log = next_log;
        self.view.store(Arc::clone(&view));

        info!(
            region = %self.region(),
            command = command_name,
            actor = actor.label(),
            events = events.len(),
            "Committed mutation"
        );
        Ok(CommittedMutation {
            affected: result.affected,
            events,
            view,
        })
    }

    /// Copies the current files into a new backup.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Persistence` if the copy fails.
    pub fn snapshot(
        &self,
        label: Option<&str>,
        now: OffsetDateTime,
    ) -> Result<BackupMetadata, ApiError> {
        let _guard: MutexGuard<'_, ChangeLog> = self.lock()?;
        self.store
            .snapshot(label, now)
            .map_err(translate_persistence_error)
    }

    /// Lists the region's backups, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Persistence` if the backup directory is unreadable.
    pub fn list_backups(&self) -> Result<Vec<BackupMetadata>, ApiError> {
        self.store
            .list_backups()
            .map_err(translate_persistence_error)
    }

    /// Restores a backup and rebuilds the view from the restored files.
    ///
    /// An unknown backup touches nothing. Any other failure rebuilds the
    /// session from whatever is on disk; if that fails too the session is
    /// retired.
    ///
    /// # Errors
    ///
    /// * `ApiError::NotFound` if the backup does not exist
    /// * Any copy error, or any load error from the restored files
    pub fn restore(&self, backup_id: &str, now: OffsetDateTime) -> Result<BackupMetadata, ApiError> {
        let mut log: MutexGuard<'_, ChangeLog> = self.lock()?;
        match self.store.restore(backup_id) {
            Ok(metadata) => {
                self.rebuild_or_retire(&mut log, now)?;
                Ok(metadata)
            }
            Err(err @ PersistenceError::BackupNotFound(_)) => {
                Err(translate_persistence_error(err))
            }
            Err(err) => {
                let err: ApiError = translate_persistence_error(err);
                self.recover(&mut log, now, &err);
                Err(err)
            }
        }
    }

    /// Archives the region and starts an empty change log.
    ///
    /// On failure the session is rebuilt from disk, or retired if that fails.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Persistence` if the backup or the log write fails.
    pub fn reset(&self, now: OffsetDateTime) -> Result<BackupMetadata, ApiError> {
        let mut log: MutexGuard<'_, ChangeLog> = self.lock()?;
        match self.store.reset(now) {
            Ok(metadata) => {
                self.rebuild_or_retire(&mut log, now)?;
                Ok(metadata)
            }
            Err(err) => {
                let err: ApiError = translate_persistence_error(err);
                self.recover(&mut log, now, &err);
                Err(err)
            }
        }
    }

    /// Rebuilds the view from the files on disk.
    ///
    /// # Errors
    ///
    /// Returns any load error; the previous state is kept in that case.
    pub fn reload(&self, now: OffsetDateTime) -> Result<(), ApiError> {
        let mut log: MutexGuard<'_, ChangeLog> = self.lock()?;
        self.rebuild(&mut log, now)
    }

    fn rebuild_or_retire(&self, log: &mut ChangeLog, now: OffsetDateTime) -> Result<(), ApiError> {
        self.rebuild(log, now).inspect_err(|e| {
            warn!(
                region = %self.region(),
                error = %e,
                "Region files unusable after maintenance"
            );
            self.mark_retired();
        })
    }

    fn recover(&self, log: &mut ChangeLog, now: OffsetDateTime, cause: &ApiError) {
        warn!(
            region = %self.region(),
            error = %cause,
            "Region maintenance failed, rebuilding from disk"
        );
        if self.rebuild_or_retire(log, now).is_ok() {
            debug!(region = %self.region(), "Region rebuilt after failed maintenance");
        }
    }

    fn rebuild(&self, log: &mut ChangeLog, now: OffsetDateTime) -> Result<(), ApiError> {
        let loaded: LoadedRegion = self.store.load(now).map_err(translate_persistence_error)?;
        *log = loaded.change_log;
        self.view.store(Arc::new(loaded.view));
        self.report.store(Arc::new(loaded.report));
        debug!(region = %self.region(), events = log.len(), "Rebuilt region from disk");
        Ok(())
    }
}
