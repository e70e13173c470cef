// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The engine facade: the complete operation contract over all regions.

use crate::error::{ApiError, translate_domain_error, translate_persistence_error};
use crate::request_response::{
    AddZoneRequest, ChangeHistory, ChangeNotification, MaintenanceOutcome, MunicipalityInfo,
    MutationOutcome, ReassignManyRequest, ReassignZoneRequest, RecolorZoneRequest,
    RegionOverview, RegisterRegionRequest, RegistrationOutcome, RenameZoneRequest,
    UnassignRequest,
};
use crate::session::{CommittedMutation, RegionSession};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};
use time::OffsetDateTime;
use tracing::{info, warn};
use zonemap::statistics::{self, RegionSummary, ShareDistribution, ZoneStatistics};
use zonemap::{Command, MaterializedView, ZoneEntry};
use zonemap_audit::{Actor, ChangeEvent, ChangeLog};
use zonemap_domain::{DomainError, MunicipalityId, RegionCode, ZoneColor, ZoneName};
use zonemap_persistence::{
    BackupMetadata, RegionCatalog, RegionListing, RegionPaths, RegionStore, ReportFormat,
    change_report, export_entity_table,
};

/// Source of the current time.
pub type Clock = fn() -> OffsetDateTime;

/// Every region the data directory knows about, loaded on demand.
///
/// Regions are independent: each has its own session and its own writer
/// lock, and nothing is ever locked across regions.
#[derive(Debug)]
pub struct TerritoryEngine {
    catalog: RwLock<RegionCatalog>,
    sessions: RwLock<HashMap<RegionCode, Arc<RegionSession>>>,
    clock: Clock,
}

fn parse_region(code: &str) -> Result<RegionCode, ApiError> {
    RegionCode::parse(code).map_err(translate_domain_error)
}

fn parse_municipality(id: &str) -> Result<MunicipalityId, ApiError> {
    MunicipalityId::normalize(id).map_err(translate_domain_error)
}

fn parse_zone(zone: &str) -> Result<ZoneName, ApiError> {
    ZoneName::new(zone).map_err(translate_domain_error)
}

fn parse_color(color: &str) -> Result<ZoneColor, ApiError> {
    ZoneColor::parse(color).map_err(translate_domain_error)
}

fn poisoned() -> ApiError {
    ApiError::internal("Engine lock poisoned")
}

impl TerritoryEngine {
    /// Opens the data directory.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::MalformedFile` if the region registry cannot be
    /// read. This is the one load failure with no fallback.
    pub fn open(data_dir: &Path) -> Result<Self, ApiError> {
        Self::open_with_clock(data_dir, OffsetDateTime::now_utc)
    }

    /// Opens the data directory with a custom clock.
    ///
    /// # Errors
    ///
    /// See [`TerritoryEngine::open`].
    pub fn open_with_clock(data_dir: &Path, clock: Clock) -> Result<Self, ApiError> {
        let catalog: RegionCatalog =
            RegionCatalog::open(data_dir).map_err(translate_persistence_error)?;
        info!(
            data_dir = %data_dir.display(),
            regions = catalog.list().len(),
            "Opened region catalog"
        );
        Ok(Self {
            catalog: RwLock::new(catalog),
            sessions: RwLock::new(HashMap::new()),
            clock,
        })
    }

    fn now(&self) -> OffsetDateTime {
        (self.clock)()
    }

    /// Returns the session for a region, loading it on first use.
    ///
    /// The catalog read lock is held until the new session is in the map,
    /// so a concurrent deactivation cannot leave a stale session behind.
    pub(crate) fn session(&self, code: &str) -> Result<Arc<RegionSession>, ApiError> {
        let code: RegionCode = parse_region(code)?;
        {
            let sessions = self.sessions.read().map_err(|_| poisoned())?;
            if let Some(session) = sessions.get(&code) {
                return Ok(Arc::clone(session));
            }
        }

        let catalog = self.catalog.read().map_err(|_| poisoned())?;
        let paths: RegionPaths = catalog
            .resolve_paths(&code)
            .map_err(translate_persistence_error)?;
        let name: String = catalog
            .list()
            .into_iter()
            .find(|listing| listing.code == code)
            .map_or_else(|| code.to_string(), |listing| listing.name);

        let mut sessions = self.sessions.write().map_err(|_| poisoned())?;
        if let Some(session) = sessions.get(&code) {
            return Ok(Arc::clone(session));
        }
        let loaded: Arc<RegionSession> = Arc::new(RegionSession::load(
            RegionStore::new(code.clone(), paths),
            name,
            self.now(),
        )?);
        sessions.insert(code, Arc::clone(&loaded));
        drop(sessions);
        drop(catalog);
        Ok(loaded)
    }

    /// Removes a region's session and retires it, so holders of the old
    /// `Arc` can no longer write.
    ///
    /// Callers hold the catalog write lock.
    fn retire_session(&self, code: &RegionCode) -> Result<(), ApiError> {
        let mut sessions = self.sessions.write().map_err(|_| poisoned())?;
        if let Some(session) = sessions.remove(code) {
            session.retire()?;
        }
        Ok(())
    }

    fn overview(session: &RegionSession) -> RegionOverview {
        let view: Arc<MaterializedView> = session.view();
        RegionOverview {
            region: session.region().clone(),
            name: session.name().to_string(),
            summary: statistics::region_summary(&view),
            zones: view.zones(),
            load: session.report().as_ref().clone(),
        }
    }

    /// Lists every registered region, active or not.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Internal` if the catalog lock is poisoned.
    pub fn list_regions(&self) -> Result<Vec<RegionListing>, ApiError> {
        let catalog = self.catalog.read().map_err(|_| poisoned())?;
        Ok(catalog.list())
    }

    /// Registers a region, seeding placeholder files, or reactivates one.
    ///
    /// # Errors
    ///
    /// * `ApiError::Validation` if the code is malformed or already active
    /// * `ApiError::Persistence` if the files or registry cannot be written
    pub fn register_region(
        &self,
        request: &RegisterRegionRequest,
    ) -> Result<RegistrationOutcome, ApiError> {
        let code: RegionCode = parse_region(&request.code)?;
        let listing: RegionListing = {
            let mut catalog = self.catalog.write().map_err(|_| poisoned())?;
            catalog
                .register_region(&code, &request.name, self.now())
                .map_err(translate_persistence_error)?;
            self.retire_session(&code)?;
            catalog
                .list()
                .into_iter()
                .find(|listing| listing.code == code)
                .ok_or_else(|| ApiError::internal("Registered region missing from catalog"))?
        };

        Ok(RegistrationOutcome {
            notification: ChangeNotification::RegionRegistered {
                region: code,
                name: listing.name.clone(),
            },
            region: listing,
        })
    }

    /// Marks a region inactive. Its files stay on disk.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the region is unknown or already inactive.
    pub fn deactivate_region(&self, code: &str) -> Result<(), ApiError> {
        let code: RegionCode = parse_region(code)?;
        let mut catalog = self.catalog.write().map_err(|_| poisoned())?;
        catalog
            .deactivate_region(&code)
            .map_err(translate_persistence_error)?;
        let retired: Result<(), ApiError> = self.retire_session(&code);
        drop(catalog);
        retired
    }

    /// Loads a region (if needed) and describes it.
    ///
    /// # Errors
    ///
    /// * `ApiError::NotFound` if the region is unknown or inactive
    /// * `ApiError::MalformedFile` if a file without a fallback is unusable
    pub fn select_region(&self, code: &str) -> Result<RegionOverview, ApiError> {
        let session: Arc<RegionSession> = self.session(code)?;
        Ok(Self::overview(&session))
    }

    /// Rebuilds a region from its files, discarding the cached view.
    ///
    /// # Errors
    ///
    /// See [`TerritoryEngine::select_region`].
    pub fn reload_region(&self, code: &str) -> Result<RegionOverview, ApiError> {
        let session: Arc<RegionSession> = self.session(code)?;
        session.reload(self.now())?;
        Ok(Self::overview(&session))
    }

    /// The region's boundaries as a GeoJSON feature collection annotated
    /// with zone, color and metrics.
    ///
    /// # Errors
    ///
    /// See [`TerritoryEngine::select_region`].
    pub fn map_view(&self, code: &str) -> Result<Value, ApiError> {
        Ok(self.session(code)?.view().feature_collection())
    }

    /// Palette zones with member counts, followed by the unassigned zone.
    ///
    /// # Errors
    ///
    /// See [`TerritoryEngine::select_region`].
    pub fn zones(&self, code: &str) -> Result<Vec<ZoneEntry>, ApiError> {
        Ok(self.session(code)?.view().zones())
    }

    /// Per-zone aggregates.
    ///
    /// # Errors
    ///
    /// See [`TerritoryEngine::select_region`].
    pub fn stats(&self, code: &str) -> Result<IndexMap<ZoneName, ZoneStatistics>, ApiError> {
        Ok(statistics::by_zone(&self.session(code)?.view()))
    }

    /// Whole-region totals.
    ///
    /// # Errors
    ///
    /// See [`TerritoryEngine::select_region`].
    pub fn region_summary(&self, code: &str) -> Result<RegionSummary, ApiError> {
        Ok(statistics::region_summary(&self.session(code)?.view()))
    }

    /// Spread of per-municipality shares.
    ///
    /// # Errors
    ///
    /// See [`TerritoryEngine::select_region`].
    pub fn share_distribution(&self, code: &str) -> Result<ShareDistribution, ApiError> {
        Ok(statistics::share_distribution(&self.session(code)?.view()))
    }

    /// The municipalities currently in a zone.
    ///
    /// # Errors
    ///
    /// * `ApiError::NotFound` if the zone is neither in the palette, the
    ///   unassigned zone, nor held by any municipality
    /// * See [`TerritoryEngine::select_region`]
    pub fn zone_members(&self, code: &str, zone: &str) -> Result<Vec<MunicipalityInfo>, ApiError> {
        let view: Arc<MaterializedView> = self.session(code)?.view();
        let zone: ZoneName = parse_zone(zone)?;
        if !zone.is_unassigned()
            && !view.palette().contains(&zone)
            && !view.zone_has_members(&zone)
        {
            return Err(translate_domain_error(DomainError::ZoneNotFound(
                zone.to_string(),
            )));
        }
        Ok(view
            .zone_members(&zone)
            .into_iter()
            .map(MunicipalityInfo::from)
            .collect())
    }

    /// Every municipality backed by data, sorted by name.
    ///
    /// # Errors
    ///
    /// See [`TerritoryEngine::select_region`].
    pub fn municipalities(&self, code: &str) -> Result<Vec<MunicipalityInfo>, ApiError> {
        let view: Arc<MaterializedView> = self.session(code)?.view();
        Ok(view
            .municipality_index()
            .into_iter()
            .map(MunicipalityInfo::from)
            .collect())
    }

    /// The change log, newest first.
    ///
    /// # Arguments
    ///
    /// * `code` - Region code
    /// * `limit` - Maximum number of events to return, if any
    ///
    /// # Errors
    ///
    /// See [`TerritoryEngine::select_region`].
    pub fn change_history(
        &self,
        code: &str,
        limit: Option<usize>,
    ) -> Result<ChangeHistory, ApiError> {
        let session: Arc<RegionSession> = self.session(code)?;
        let log: ChangeLog = session.change_log()?;
        let changes: Vec<ChangeEvent> = log
            .changes()
            .iter()
            .rev()
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(ChangeHistory {
            region: session.region().clone(),
            summary: log.summary().clone(),
            changes,
        })
    }

    /// The entity table with current zones, as CSV.
    ///
    /// # Errors
    ///
    /// * `ApiError::Persistence` if encoding fails
    /// * See [`TerritoryEngine::select_region`]
    pub fn export_entity_table(&self, code: &str) -> Result<String, ApiError> {
        let view: Arc<MaterializedView> = self.session(code)?.view();
        export_entity_table(&view.entities()).map_err(translate_persistence_error)
    }

    /// The change log rendered as a report.
    ///
    /// # Errors
    ///
    /// * `ApiError::Persistence` if encoding fails
    /// * See [`TerritoryEngine::select_region`]
    pub fn change_report(&self, code: &str, format: ReportFormat) -> Result<String, ApiError> {
        let log: ChangeLog = self.session(code)?.change_log()?;
        change_report(&log, format).map_err(translate_persistence_error)
    }

    fn commit(
        &self,
        code: &str,
        command: Command,
        actor: &Actor,
    ) -> Result<(Arc<RegionSession>, CommittedMutation), ApiError> {
        let session: Arc<RegionSession> = self.session(code)?;
        let committed: CommittedMutation = session.mutate(command, actor, self.now())?;
        Ok((session, committed))
    }

    fn reassigned(session: &RegionSession, committed: CommittedMutation) -> MutationOutcome {
        MutationOutcome {
            notification: ChangeNotification::ZoneReassigned {
                region: session.region().clone(),
                municipalities: committed.affected.clone(),
            },
            affected: committed.affected,
            events: committed.events,
        }
    }

    /// Moves one municipality to a zone.
    ///
    /// # Errors
    ///
    /// * `ApiError::NotFound` if the municipality does not exist
    /// * `ApiError::Validation` if the zone is unknown, the municipality is
    ///   a placeholder, or it is already in that zone
    /// * `ApiError::Persistence` if the change could not be saved
    pub fn reassign_zone(
        &self,
        code: &str,
        request: &ReassignZoneRequest,
        actor: &Actor,
    ) -> Result<MutationOutcome, ApiError> {
        let command: Command = Command::ReassignZone {
            municipality_id: parse_municipality(&request.municipality_id)?,
            zone: parse_zone(&request.zone)?,
        };
        let (session, committed) = self.commit(code, command, actor)?;
        Ok(Self::reassigned(&session, committed))
    }

    /// Moves several municipalities to one zone, all or nothing.
    ///
    /// # Errors
    ///
    /// As [`TerritoryEngine::reassign_zone`], for any of the municipalities.
    pub fn reassign_many(
        &self,
        code: &str,
        request: &ReassignManyRequest,
        actor: &Actor,
    ) -> Result<MutationOutcome, ApiError> {
        let municipality_ids: Vec<MunicipalityId> = request
            .municipality_ids
            .iter()
            .map(|id| parse_municipality(id))
            .collect::<Result<_, _>>()?;
        let command: Command = Command::ReassignMany {
            municipality_ids,
            zone: parse_zone(&request.zone)?,
        };
        let (session, committed) = self.commit(code, command, actor)?;
        Ok(Self::reassigned(&session, committed))
    }

    /// Moves a municipality back to the unassigned zone.
    ///
    /// # Errors
    ///
    /// As [`TerritoryEngine::reassign_zone`].
    pub fn unassign_municipality(
        &self,
        code: &str,
        request: &UnassignRequest,
        actor: &Actor,
    ) -> Result<MutationOutcome, ApiError> {
        let command: Command = Command::ReassignZone {
            municipality_id: parse_municipality(&request.municipality_id)?,
            zone: ZoneName::unassigned(),
        };
        let (session, committed) = self.commit(code, command, actor)?;
        Ok(Self::reassigned(&session, committed))
    }

    /// Renames a zone, moving all its members, and sets its color.
    ///
    /// # Errors
    ///
    /// * `ApiError::NotFound` if the zone does not exist
    /// * `ApiError::Validation` if either name is reserved, the new name is
    ///   taken, the color is malformed, or nothing would change
    /// * `ApiError::Persistence` if the change could not be saved
    pub fn rename_zone(
        &self,
        code: &str,
        request: &RenameZoneRequest,
        actor: &Actor,
    ) -> Result<MutationOutcome, ApiError> {
        let from: ZoneName = parse_zone(&request.from)?;
        let to: ZoneName = parse_zone(&request.to)?;
        let color: ZoneColor = parse_color(&request.color)?;
        let command: Command = Command::RenameZone {
            from: from.clone(),
            to: to.clone(),
            color: color.clone(),
        };
        let (session, committed) = self.commit(code, command, actor)?;
        Ok(MutationOutcome {
            notification: ChangeNotification::ZoneRenamed {
                region: session.region().clone(),
                from,
                to,
                color,
                municipalities: committed.affected.clone(),
            },
            affected: committed.affected,
            events: committed.events,
        })
    }

    /// Changes a zone's color.
    ///
    /// # Errors
    ///
    /// * `ApiError::NotFound` if the zone does not exist
    /// * `ApiError::Validation` if the color is malformed, the zone is
    ///   reserved, or the color is unchanged
    /// * `ApiError::Persistence` if the palette could not be saved
    pub fn recolor_zone(
        &self,
        code: &str,
        request: &RecolorZoneRequest,
        actor: &Actor,
    ) -> Result<MutationOutcome, ApiError> {
        let zone: ZoneName = parse_zone(&request.zone)?;
        let color: ZoneColor = parse_color(&request.color)?;
        let command: Command = Command::RecolorZone {
            zone: zone.clone(),
            color: color.clone(),
        };
        let (session, committed) = self.commit(code, command, actor)?;
        Ok(MutationOutcome {
            notification: ChangeNotification::ZoneRecolored {
                region: session.region().clone(),
                zone,
                color,
            },
            affected: committed.affected,
            events: committed.events,
        })
    }

    /// Adds an empty zone to the palette.
    ///
    /// # Errors
    ///
    /// * `ApiError::Validation` if the name is reserved or taken, or the
    ///   color is malformed
    /// * `ApiError::Persistence` if the palette could not be saved
    pub fn add_zone(
        &self,
        code: &str,
        request: &AddZoneRequest,
        actor: &Actor,
    ) -> Result<MutationOutcome, ApiError> {
        let zone: ZoneName = parse_zone(&request.zone)?;
        let color: ZoneColor = parse_color(&request.color)?;
        let command: Command = Command::AddZone {
            zone: zone.clone(),
            color: color.clone(),
        };
        let (session, committed) = self.commit(code, command, actor)?;
        Ok(MutationOutcome {
            notification: ChangeNotification::ZoneAdded {
                region: session.region().clone(),
                zone,
                color,
            },
            affected: committed.affected,
            events: committed.events,
        })
    }

    /// Copies the region's files into a new backup.
    ///
    /// # Errors
    ///
    /// * `ApiError::Persistence` if the copy fails
    /// * See [`TerritoryEngine::select_region`]
    pub fn snapshot(&self, code: &str, label: Option<&str>) -> Result<BackupMetadata, ApiError> {
        let session: Arc<RegionSession> = self.session(code)?;
        let metadata: BackupMetadata = session.snapshot(label, self.now())?;
        info!(region = %session.region(), backup = %metadata.id, "Backup created");
        Ok(metadata)
    }

    /// Lists the region's backups, newest first.
    ///
    /// # Errors
    ///
    /// See [`TerritoryEngine::select_region`].
    pub fn list_backups(&self, code: &str) -> Result<Vec<BackupMetadata>, ApiError> {
        self.session(code)?.list_backups()
    }

    /// Restores a backup and rebuilds the region from it.
    ///
    /// # Errors
    ///
    /// * `ApiError::NotFound` if the backup does not exist
    /// * `ApiError::MalformedFile` if the restored files cannot be loaded
    pub fn restore(&self, code: &str, backup_id: &str) -> Result<MaintenanceOutcome, ApiError> {
        let session: Arc<RegionSession> = self.session(code)?;
        match session.restore(backup_id, self.now()) {
            Ok(backup) => Ok(MaintenanceOutcome {
                notification: ChangeNotification::RegionRestored {
                    region: session.region().clone(),
                    backup_id: backup.id.clone(),
                },
                overview: Self::overview(&session),
                backup,
            }),
            Err(e) => {
                self.discard_after_failure(&session, &e)?;
                Err(e)
            }
        }
    }

    /// Backs up the region and clears its change log.
    ///
    /// # Errors
    ///
    /// * `ApiError::Persistence` if the backup or the log write fails
    /// * See [`TerritoryEngine::select_region`]
    pub fn reset_region(&self, code: &str) -> Result<MaintenanceOutcome, ApiError> {
        let session: Arc<RegionSession> = self.session(code)?;
        match session.reset(self.now()) {
            Ok(backup) => Ok(MaintenanceOutcome {
                notification: ChangeNotification::RegionReset {
                    region: session.region().clone(),
                    backup_id: backup.id.clone(),
                },
                overview: Self::overview(&session),
                backup,
            }),
            Err(e) => {
                self.discard_after_failure(&session, &e)?;
                Err(e)
            }
        }
    }

    /// Drops a session that retired itself after failed maintenance, so the
    /// next access loads from disk. A session still serving is kept.
    fn discard_after_failure(
        &self,
        session: &Arc<RegionSession>,
        e: &ApiError,
    ) -> Result<(), ApiError> {
        if !session.is_retired() {
            return Ok(());
        }
        warn!(region = %session.region(), error = %e, "Dropping retired region session");
        let mut sessions = self.sessions.write().map_err(|_| poisoned())?;
        let current: bool = sessions
            .get(session.region())
            .is_some_and(|loaded| Arc::ptr_eq(loaded, session));
        if current {
            sessions.remove(session.region());
        }
        Ok(())
    }
}
