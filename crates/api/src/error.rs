// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use tracing::error;
use zonemap::CoreError;
use zonemap_domain::DomainError;
use zonemap_persistence::PersistenceError;

/// API-level errors.
///
/// These are distinct from domain, core and persistence errors and are the
/// only failures callers of the engine ever see. Each carries a stable
/// [`kind`](ApiError::kind) and a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// A region, municipality, zone or backup does not exist.
    NotFound {
        /// The type of resource that was not found.
        resource_type: String,
        /// A human-readable description of what was not found.
        message: String,
    },
    /// The request was rejected by a validation rule.
    Validation {
        /// The rule that was violated.
        rule: String,
        /// A human-readable description of the violation.
        message: String,
    },
    /// A region file is missing or unusable and has no fallback.
    MalformedFile {
        /// A description of the problem, including the path.
        message: String,
    },
    /// Durable storage could not be written; nothing was changed.
    Persistence {
        /// A description of the storage failure.
        message: String,
    },
    /// An internal error occurred.
    Internal {
        /// A description of the internal error.
        message: String,
    },
}

impl ApiError {
    /// Stable machine-readable error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Validation { .. } => "validation_error",
            Self::MalformedFile { .. } => "malformed_file",
            Self::Persistence { .. } => "persistence_error",
            Self::Internal { .. } => "internal",
        }
    }

    pub(crate) fn internal(message: &str) -> Self {
        Self::Internal {
            message: message.to_string(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound {
                resource_type,
                message,
            } => write!(f, "{resource_type} not found: {message}"),
            Self::Validation { rule, message } => {
                write!(f, "Validation failed ({rule}): {message}")
            }
            Self::MalformedFile { message } => write!(f, "Malformed file: {message}"),
            Self::Persistence { message } => write!(f, "Persistence error: {message}"),
            Self::Internal { message } => write!(f, "Internal error: {message}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Translates a domain error into an API error.
///
/// This translation is explicit and ensures domain errors are not leaked directly.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    match err {
        DomainError::ZoneNotFound(name) => ApiError::NotFound {
            resource_type: String::from("Zone"),
            message: format!("Zone '{name}' does not exist"),
        },
        DomainError::MunicipalityNotFound(id) => ApiError::NotFound {
            resource_type: String::from("Municipality"),
            message: format!("Municipality '{id}' does not exist"),
        },
        other => ApiError::Validation {
            rule: other.rule().to_string(),
            message: other.to_string(),
        },
    }
}

/// Translates a core error into an API error.
#[must_use]
pub fn translate_core_error(err: CoreError) -> ApiError {
    match err {
        CoreError::DomainViolation(domain_err) => translate_domain_error(domain_err),
    }
}

/// Translates a persistence error into an API error.
///
/// Storage write failures are logged here so every caller reports them the
/// same way.
#[must_use]
pub fn translate_persistence_error(err: PersistenceError) -> ApiError {
    match err {
        PersistenceError::RegionNotFound(code) => ApiError::NotFound {
            resource_type: String::from("Region"),
            message: format!("Region '{code}' is not registered"),
        },
        PersistenceError::RegionInactive(code) => ApiError::NotFound {
            resource_type: String::from("Region"),
            message: format!("Region '{code}' is inactive"),
        },
        PersistenceError::BackupNotFound(id) => ApiError::NotFound {
            resource_type: String::from("Backup"),
            message: format!("Backup '{id}' does not exist"),
        },
        PersistenceError::RegionAlreadyRegistered(code) => ApiError::Validation {
            rule: String::from("region_unique"),
            message: format!("Region '{code}' is already registered"),
        },
        PersistenceError::MissingFile { .. }
        | PersistenceError::MalformedFile { .. }
        | PersistenceError::RegistryUnreadable { .. } => ApiError::MalformedFile {
            message: err.to_string(),
        },
        PersistenceError::Io { .. } | PersistenceError::Serialization(_) => {
            error!(error = %err, "Storage failure");
            ApiError::Persistence {
                message: err.to_string(),
            }
        }
    }
}
