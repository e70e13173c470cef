// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::path::Path;

/// Errors that can occur during persistence operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistenceError {
    /// The region registry exists but cannot be read or parsed.
    #[error("Region registry {path} is unreadable: {reason}")]
    RegistryUnreadable {
        /// Registry file path.
        path: String,
        /// What went wrong.
        reason: String,
    },
    /// No region is registered under this code.
    #[error("Region '{0}' is not registered")]
    RegionNotFound(String),
    /// The region exists but has been deactivated.
    #[error("Region '{0}' is inactive")]
    RegionInactive(String),
    /// An active region is already registered under this code.
    #[error("Region '{0}' is already registered")]
    RegionAlreadyRegistered(String),
    /// A required file does not exist.
    #[error("Required file {path} does not exist")]
    MissingFile {
        /// File path.
        path: String,
    },
    /// A file exists but its content is not usable.
    #[error("File {path} is malformed: {reason}")]
    MalformedFile {
        /// File path.
        path: String,
        /// What is wrong with it.
        reason: String,
    },
    /// No backup with this id exists for the region.
    #[error("Backup '{0}' not found")]
    BackupNotFound(String),
    /// Reading or writing durable storage failed.
    #[error("I/O error on {path}: {reason}")]
    Io {
        /// File or directory path.
        path: String,
        /// The underlying error.
        reason: String,
    },
    /// A value could not be encoded for storage.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PersistenceError {
    pub(crate) fn io(path: &Path, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            reason: err.to_string(),
        }
    }

    pub(crate) fn malformed(path: &Path, reason: &dyn std::fmt::Display) -> Self {
        Self::MalformedFile {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn missing(path: &Path) -> Self {
        Self::MissingFile {
            path: path.display().to_string(),
        }
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<csv::Error> for PersistenceError {
    fn from(err: csv::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
