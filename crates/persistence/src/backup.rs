// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Point-in-time copies of a region's mutable files.
//!
//! Each backup is a directory `backups/<id>/` holding copies of the entity
//! table, change log and palette plus a `backup.json` metadata file.

use crate::catalog::RegionPaths;
use crate::error::PersistenceError;
use crate::storage::{ensure_dir, read_optional, write_atomic, write_json_atomic};
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fs;
use std::path::{Component, Path, PathBuf};
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::{debug, info, warn};
use zonemap_audit::ChangeLog;

/// Metadata file inside each backup directory.
pub const METADATA_FILE: &str = "backup.json";

const MAX_LABEL_LEN: usize = 40;

/// Description of one backup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupMetadata {
    /// Directory name, unique within the region.
    pub id: String,
    /// Optional operator label.
    #[serde(default)]
    pub label: Option<String>,
    /// Creation time; unknown when the metadata could not be read.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    /// File names copied into the backup.
    #[serde(default)]
    pub files: Vec<String>,
    /// File names the region did not have when the backup was taken.
    #[serde(default)]
    pub absent: Vec<String>,
    /// Number of events in the backed-up change log.
    #[serde(default)]
    pub event_count: usize,
}

/// Copies the region's current files into a new backup.
///
/// Files that do not exist yet are recorded as absent, so a restore can
/// remove them again.
///
/// # Arguments
///
/// * `paths` - The region's files
/// * `label` - Optional label, sanitized into the id
/// * `now` - Creation time, used for the id stamp
///
/// # Errors
///
/// Returns `PersistenceError::Io` if any copy fails.
pub fn create_backup(
    paths: &RegionPaths,
    label: Option<&str>,
    now: OffsetDateTime,
) -> Result<BackupMetadata, PersistenceError> {
    ensure_dir(&paths.backups_dir)?;
    let label: Option<String> = label.map(sanitize_label).filter(|l| !l.is_empty());
    let id: String = unique_id(&paths.backups_dir, now, label.as_deref());
    let dir: PathBuf = paths.backups_dir.join(&id);
    ensure_dir(&dir)?;

    let mut files: Vec<String> = Vec::new();
    let mut absent: Vec<String> = Vec::new();
    let mut event_count: usize = 0;
    for source in [&paths.entities, &paths.change_log, &paths.palette] {
        let Some(name) = file_name(source) else {
            continue;
        };
        let Some(bytes) = read_optional(source)? else {
            absent.push(name);
            continue;
        };
        if source == &paths.change_log {
            event_count = std::str::from_utf8(&bytes)
                .ok()
                .and_then(|body| ChangeLog::from_json(body).ok())
                .map_or(0, |log| log.len());
        }
        write_atomic(&dir.join(&name), &bytes)?;
        files.push(name);
    }

    let metadata: BackupMetadata = BackupMetadata {
        id,
        label,
        created_at: Some(now),
        files,
        absent,
        event_count,
    };
    write_json_atomic(&dir.join(METADATA_FILE), &metadata)?;
    info!(backup = %metadata.id, files = metadata.files.len(), "Created backup");
    Ok(metadata)
}

/// Lists backups, newest first.
///
/// Directories whose metadata cannot be read are still listed, with an
/// unknown creation time and zero events, after every dated backup.
///
/// # Errors
///
/// Returns `PersistenceError::Io` if the backup directory cannot be read.
pub fn list_backups(backups_dir: &Path) -> Result<Vec<BackupMetadata>, PersistenceError> {
    let entries = match fs::read_dir(backups_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(PersistenceError::io(backups_dir, &e)),
    };

    let mut backups: Vec<BackupMetadata> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PersistenceError::io(backups_dir, &e))?;
        let path: PathBuf = entry.path();
        if !path.is_dir() {
            continue;
        }
        let Some(id) = file_name(&path) else {
            continue;
        };
        backups.push(read_metadata(&path, id));
    }

    backups.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
    Ok(backups)
}

/// Copies a backup's files back over the region's files.
///
/// Files recorded as absent at capture time are removed, so the next load
/// sees exactly what the region held then. Files the backup neither copied
/// nor recorded are left alone.
///
/// # Errors
///
/// * `PersistenceError::BackupNotFound` if the id is unsafe or unknown
/// * `PersistenceError::Io` if a copy fails
pub fn restore_backup(paths: &RegionPaths, id: &str) -> Result<BackupMetadata, PersistenceError> {
    let dir: PathBuf = backup_dir(&paths.backups_dir, id)?;
    let metadata: BackupMetadata = read_metadata(&dir, id.to_string());

    for target in [&paths.entities, &paths.change_log, &paths.palette] {
        let Some(name) = file_name(target) else {
            continue;
        };
        match read_optional(&dir.join(&name))? {
            Some(bytes) => write_atomic(target, &bytes)?,
            None if metadata.absent.contains(&name) => remove_if_present(target)?,
            None => debug!(backup = %id, file = %name, "Backup has no copy of file"),
        }
    }
    info!(backup = %id, "Restored backup");
    Ok(metadata)
}

/// Finds the entity table of the most recent backup that has one.
///
/// # Errors
///
/// Returns `PersistenceError::Io` if the backup directory cannot be read.
pub fn latest_entity_table(
    paths: &RegionPaths,
) -> Result<Option<(String, PathBuf)>, PersistenceError> {
    let Some(name) = file_name(&paths.entities) else {
        return Ok(None);
    };
    Ok(list_backups(&paths.backups_dir)?
        .into_iter()
        .map(|backup| {
            let candidate: PathBuf = paths.backups_dir.join(&backup.id).join(&name);
            (backup.id, candidate)
        })
        .find(|(_, candidate)| candidate.is_file()))
}

fn remove_if_present(path: &Path) -> Result<(), PersistenceError> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(file = %path.display(), "Removed file absent from backup");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(PersistenceError::io(path, &e)),
    }
}

/// Accepts only a single plain directory name.
fn is_plain_name(id: &str) -> bool {
    if id.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(id).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(name)), None) if name == OsStr::new(id)
    )
}

fn backup_dir(backups_dir: &Path, id: &str) -> Result<PathBuf, PersistenceError> {
    if !is_plain_name(id) || id.contains("..") {
        warn!(backup = %id, "Rejected backup id");
        return Err(PersistenceError::BackupNotFound(id.to_string()));
    }
    let dir: PathBuf = backups_dir.join(id);
    if !dir.is_dir() {
        return Err(PersistenceError::BackupNotFound(id.to_string()));
    }
    Ok(dir)
}

fn read_metadata(dir: &Path, id: String) -> BackupMetadata {
    let parsed: Option<BackupMetadata> = read_optional(&dir.join(METADATA_FILE))
        .ok()
        .flatten()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok());
    match parsed {
        Some(metadata) => BackupMetadata { id, ..metadata },
        None => {
            warn!(backup = %id, "Backup metadata is missing or unreadable");
            BackupMetadata {
                id,
                label: None,
                created_at: None,
                files: Vec::new(),
                absent: Vec::new(),
                event_count: 0,
            }
        }
    }
}

fn unique_id(backups_dir: &Path, now: OffsetDateTime, label: Option<&str>) -> String {
    let stamp: String = now
        .format(format_description!(
            "[year][month][day]_[hour][minute][second]"
        ))
        .unwrap_or_else(|_| now.unix_timestamp().to_string());
    let base: String = match label {
        Some(label) => format!("{stamp}_{label}"),
        None => stamp,
    };
    if !backups_dir.join(&base).exists() {
        return base;
    }
    let mut n: usize = 2;
    loop {
        let candidate: String = format!("{base}_{n}");
        if !backups_dir.join(&candidate).exists() {
            return candidate;
        }
        n += 1;
    }
}

fn sanitize_label(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_LABEL_LEN)
        .collect();
    cleaned.trim_matches('_').to_string()
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}
