// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::entity_table::write_entity_table;
use crate::error::PersistenceError;
use serde::{Deserialize, Serialize};
use zonemap_audit::{ChangeLog, timestamp};
use zonemap_domain::Municipality;

/// Output format of a change report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// The change log document with its summary.
    #[default]
    Json,
    /// One row per event.
    Csv,
}

impl ReportFormat {
    /// MIME type of the rendered report.
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Csv => "text/csv",
        }
    }
}

const REPORT_HEADERS: [&str; 8] = [
    "sequence",
    "timestamp",
    "municipality_id",
    "municipality_name",
    "prior_zone",
    "new_zone",
    "actor",
    "kind",
];

/// Renders the change log as a report.
///
/// # Errors
///
/// Returns `PersistenceError::Serialization` if encoding fails.
pub fn change_report(log: &ChangeLog, format: ReportFormat) -> Result<String, PersistenceError> {
    match format {
        ReportFormat::Json => Ok(serde_json::to_string_pretty(log)?),
        ReportFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            writer.write_record(REPORT_HEADERS)?;
            for change in log.changes() {
                let when: String = timestamp::format(&change.timestamp)
                    .map_err(|e| PersistenceError::Serialization(e.to_string()))?;
                writer.write_record([
                    change.sequence.to_string().as_str(),
                    when.as_str(),
                    change.municipality_id.as_str(),
                    change.municipality_name.as_str(),
                    change.prior_zone.as_str(),
                    change.new_zone.as_str(),
                    change.actor.as_str(),
                    change.kind.as_str(),
                ])?;
            }
            let bytes: Vec<u8> = writer
                .into_inner()
                .map_err(|e| PersistenceError::Serialization(e.to_string()))?;
            String::from_utf8(bytes).map_err(|e| PersistenceError::Serialization(e.to_string()))
        }
    }
}

/// Renders municipalities with their current zones as an entity table CSV.
///
/// # Errors
///
/// Returns `PersistenceError::Serialization` if encoding fails.
pub fn export_entity_table(municipalities: &[Municipality]) -> Result<String, PersistenceError> {
    write_entity_table(municipalities)
}
