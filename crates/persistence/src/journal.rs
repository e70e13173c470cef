// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Daily journal of committed events.
//!
//! The journal is a convenience copy for operators; the change log stays
//! the source of truth and a journal failure never fails a mutation.

use crate::error::PersistenceError;
use crate::storage::{read_optional, write_json_atomic};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use zonemap_audit::ChangeEvent;

#[derive(Debug, Serialize, Deserialize)]
struct JournalDay {
    date: String,
    #[serde(default)]
    changes: Vec<ChangeEvent>,
}

/// Path of the journal file for the day of `now`.
#[must_use]
pub fn journal_path(history_dir: &Path, now: OffsetDateTime) -> PathBuf {
    history_dir.join(format!("changes_{}.json", day_stamp(now.date())))
}

/// Appends events to the journal file for the day of `now`.
///
/// An unreadable journal for the day is replaced rather than appended to.
///
/// # Errors
///
/// Returns `PersistenceError::Io` or `PersistenceError::Serialization`
/// if the file cannot be written.
pub fn append_to_journal(
    history_dir: &Path,
    events: &[ChangeEvent],
    now: OffsetDateTime,
) -> Result<(), PersistenceError> {
    if events.is_empty() {
        return Ok(());
    }
    let path: PathBuf = journal_path(history_dir, now);
    let mut day: JournalDay = read_optional(&path)?
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_else(|| JournalDay {
            date: day_stamp(now.date()),
            changes: Vec::new(),
        });
    day.changes.extend_from_slice(events);
    write_json_atomic(&path, &day)
}

fn day_stamp(date: Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| date.to_string())
}
