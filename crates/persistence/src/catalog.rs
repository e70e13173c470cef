// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The region registry and per-region file layout.

use crate::change_log_file::write_change_log;
use crate::error::PersistenceError;
use crate::storage::{ensure_dir, read_optional, write_atomic, write_json_atomic};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tracing::{info, warn};
use zonemap_audit::ChangeLog;
use zonemap_domain::RegionCode;

/// File name of the registry inside the data directory.
pub const REGISTRY_FILE: &str = "regions.json";

/// Per-region file names, relative to the region directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionFiles {
    /// Entity table CSV.
    #[serde(default = "default_entities")]
    pub entities: String,
    /// Boundary GeoJSON.
    #[serde(default = "default_boundaries")]
    pub boundaries: String,
    /// Zone color palette.
    #[serde(default = "default_palette")]
    pub palette: String,
    /// Change log.
    #[serde(default = "default_change_log")]
    pub change_log: String,
    /// Daily journal directory.
    #[serde(default = "default_history")]
    pub history: String,
    /// Backup directory.
    #[serde(default = "default_backups")]
    pub backups: String,
}

impl Default for RegionFiles {
    fn default() -> Self {
        Self {
            entities: default_entities(),
            boundaries: default_boundaries(),
            palette: default_palette(),
            change_log: default_change_log(),
            history: default_history(),
            backups: default_backups(),
        }
    }
}

/// One registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRecord {
    /// Display name.
    pub name: String,
    /// Inactive regions are kept on disk but refuse every operation.
    #[serde(default = "default_active")]
    pub active: bool,
    /// Directory relative to the data directory; defaults to the code.
    #[serde(default)]
    pub directory: Option<String>,
    /// File names inside the region directory.
    #[serde(default)]
    pub files: RegionFiles,
}

/// A registry entry as shown to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionListing {
    /// Region code.
    pub code: RegionCode,
    /// Display name.
    pub name: String,
    /// Whether the region can be selected.
    pub active: bool,
}

/// Absolute paths of one region's files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionPaths {
    /// Region directory.
    pub dir: PathBuf,
    /// Entity table CSV.
    pub entities: PathBuf,
    /// Boundary GeoJSON.
    pub boundaries: PathBuf,
    /// Zone color palette.
    pub palette: PathBuf,
    /// Change log.
    pub change_log: PathBuf,
    /// Daily journal directory.
    pub history_dir: PathBuf,
    /// Backup directory.
    pub backups_dir: PathBuf,
}

impl RegionPaths {
    /// Resolves the file names of `files` under `dir`.
    #[must_use]
    pub fn new(dir: PathBuf, files: &RegionFiles) -> Self {
        Self {
            entities: dir.join(&files.entities),
            boundaries: dir.join(&files.boundaries),
            palette: dir.join(&files.palette),
            change_log: dir.join(&files.change_log),
            history_dir: dir.join(&files.history),
            backups_dir: dir.join(&files.backups),
            dir,
        }
    }
}

/// The registry of regions rooted at a data directory.
#[derive(Debug, Clone)]
pub struct RegionCatalog {
    root: PathBuf,
    regions: BTreeMap<String, RegionRecord>,
}

impl RegionCatalog {
    /// Opens the registry, creating an empty one if none exists.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::RegistryUnreadable` if the registry file
    /// exists but cannot be read or parsed. This is fatal to startup.
    pub fn open(root: &Path) -> Result<Self, PersistenceError> {
        let path: PathBuf = root.join(REGISTRY_FILE);
        let unreadable = |reason: String| PersistenceError::RegistryUnreadable {
            path: path.display().to_string(),
            reason,
        };

        let regions: BTreeMap<String, RegionRecord> = match read_optional(&path) {
            Ok(Some(bytes)) => {
                serde_json::from_slice(&bytes).map_err(|e| unreadable(e.to_string()))?
            }
            Ok(None) => {
                info!(path = %path.display(), "Creating empty region registry");
                let empty: BTreeMap<String, RegionRecord> = BTreeMap::new();
                write_json_atomic(&path, &empty)?;
                empty
            }
            Err(e) => return Err(unreadable(e.to_string())),
        };

        Ok(Self {
            root: root.to_path_buf(),
            regions,
        })
    }

    /// The data directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All registered regions, active or not, ordered by code.
    #[must_use]
    pub fn list(&self) -> Vec<RegionListing> {
        self.regions
            .iter()
            .filter_map(|(code, record)| {
                let Ok(code) = RegionCode::parse(code) else {
                    warn!(code = %code, "Ignoring registry entry with invalid region code");
                    return None;
                };
                Some(RegionListing {
                    code,
                    name: record.name.clone(),
                    active: record.active,
                })
            })
            .collect()
    }

    /// Resolves the file paths of an active region.
    ///
    /// # Errors
    ///
    /// * `PersistenceError::RegionNotFound` if the code is not registered
    /// * `PersistenceError::RegionInactive` if the region was deactivated
    pub fn resolve_paths(&self, code: &RegionCode) -> Result<RegionPaths, PersistenceError> {
        let record: &RegionRecord = self
            .regions
            .get(code.as_str())
            .ok_or_else(|| PersistenceError::RegionNotFound(code.to_string()))?;
        if !record.active {
            return Err(PersistenceError::RegionInactive(code.to_string()));
        }
        Ok(self.paths_for(code, record))
    }

    /// Registers a region and seeds placeholder files for it.
    ///
    /// The seed is one example municipality, a five-zone palette, one
    /// placeholder boundary and an empty change log.
    ///
    /// Existing files in the region directory are left untouched. An
    /// inactive region with the same code is reactivated.
    ///
    /// # Errors
    ///
    /// * `PersistenceError::RegionAlreadyRegistered` if the code is active
    /// * `PersistenceError::Io` if seeding or saving the registry fails
    pub fn register_region(
        &mut self,
        code: &RegionCode,
        name: &str,
        now: OffsetDateTime,
    ) -> Result<RegionPaths, PersistenceError> {
        let record: RegionRecord = match self.regions.get(code.as_str()) {
            Some(existing) if existing.active => {
                return Err(PersistenceError::RegionAlreadyRegistered(code.to_string()));
            }
            Some(existing) => {
                info!(region = %code, "Reactivating region");
                RegionRecord {
                    active: true,
                    name: if name.trim().is_empty() {
                        existing.name.clone()
                    } else {
                        name.trim().to_string()
                    },
                    ..existing.clone()
                }
            }
            None => RegionRecord {
                name: if name.trim().is_empty() {
                    code.to_string()
                } else {
                    name.trim().to_string()
                },
                active: true,
                directory: None,
                files: RegionFiles::default(),
            },
        };

        let paths: RegionPaths = self.paths_for(code, &record);
        seed_region_files(&paths, &record.name, now)?;

        let mut regions: BTreeMap<String, RegionRecord> = self.regions.clone();
        regions.insert(code.to_string(), record);
        self.save(&regions)?;
        self.regions = regions;
        info!(region = %code, dir = %paths.dir.display(), "Registered region");
        Ok(paths)
    }

    /// Marks a region inactive. Its files stay on disk.
    ///
    /// # Errors
    ///
    /// * `PersistenceError::RegionNotFound` if the code is not registered
    /// * `PersistenceError::RegionInactive` if it is already inactive
    pub fn deactivate_region(&mut self, code: &RegionCode) -> Result<(), PersistenceError> {
        let mut regions: BTreeMap<String, RegionRecord> = self.regions.clone();
        let record: &mut RegionRecord = regions
            .get_mut(code.as_str())
            .ok_or_else(|| PersistenceError::RegionNotFound(code.to_string()))?;
        if !record.active {
            return Err(PersistenceError::RegionInactive(code.to_string()));
        }
        record.active = false;
        self.save(&regions)?;
        self.regions = regions;
        info!(region = %code, "Deactivated region");
        Ok(())
    }

    fn paths_for(&self, code: &RegionCode, record: &RegionRecord) -> RegionPaths {
        let dir_name: &str = record.directory.as_deref().unwrap_or(code.as_str());
        RegionPaths::new(self.root.join(dir_name), &record.files)
    }

    fn save(&self, regions: &BTreeMap<String, RegionRecord>) -> Result<(), PersistenceError> {
        write_json_atomic(&self.root.join(REGISTRY_FILE), regions)
    }
}

/// Seed palette for new regions.
const SEED_PALETTE: [(&str, &str); 5] = [
    ("Central", "#228B22"),
    ("North", "#000080"),
    ("South", "#8B0000"),
    ("East", "#4B0082"),
    ("West", "#B8860B"),
];

const SEED_MUNICIPALITY_ID: &str = "0000000";

fn seed_region_files(
    paths: &RegionPaths,
    name: &str,
    now: OffsetDateTime,
) -> Result<(), PersistenceError> {
    ensure_dir(&paths.dir)?;
    ensure_dir(&paths.history_dir)?;
    ensure_dir(&paths.backups_dir)?;

    if !paths.entities.exists() {
        let body: String = format!(
            "id,name,state,sub_region,zone,annual_sales,monthly_sales,annual_potential,monthly_potential,population,points_of_sale,share\n\
             {SEED_MUNICIPALITY_ID},Example municipality,,unclassified,Central,0,0,0,0,0,0,0\n"
        );
        write_atomic(&paths.entities, body.as_bytes())?;
    }

    if !paths.palette.exists() {
        let palette: serde_json::Map<String, serde_json::Value> = SEED_PALETTE
            .iter()
            .map(|(zone, color)| ((*zone).to_string(), json!(color)))
            .collect();
        write_json_atomic(&paths.palette, &palette)?;
    }

    if !paths.boundaries.exists() {
        let boundaries: serde_json::Value = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "id": SEED_MUNICIPALITY_ID, "name": format!("{name} placeholder") },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]]
                }
            }]
        });
        write_json_atomic(&paths.boundaries, &boundaries)?;
    }

    if !paths.change_log.exists() {
        write_change_log(&paths.change_log, &ChangeLog::new(now))?;
    }

    Ok(())
}

fn default_entities() -> String {
    String::from("entities.csv")
}

fn default_boundaries() -> String {
    String::from("boundaries.geojson")
}

fn default_palette() -> String {
    String::from("zone_colors.json")
}

fn default_change_log() -> String {
    String::from("change_log.json")
}

fn default_history() -> String {
    String::from("history")
}

fn default_backups() -> String {
    String::from("backups")
}

const fn default_active() -> bool {
    true
}
