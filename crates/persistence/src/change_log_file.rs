// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::PersistenceError;
use crate::storage::{read_optional, write_json_atomic};
use std::path::Path;
use time::OffsetDateTime;
use zonemap_audit::ChangeLog;

/// Reads a change log, or starts an empty one if the file does not exist.
///
/// A file that exists but cannot be parsed is an error, never an empty log:
/// dropping it would silently discard every recorded assignment.
///
/// # Errors
///
/// * `PersistenceError::MalformedFile` if the file is not a change log
/// * `PersistenceError::Io` if the file cannot be read
pub fn read_change_log(path: &Path, now: OffsetDateTime) -> Result<ChangeLog, PersistenceError> {
    let Some(bytes) = read_optional(path)? else {
        return Ok(ChangeLog::new(now));
    };
    let body: &str = std::str::from_utf8(&bytes).map_err(|e| PersistenceError::malformed(path, &e))?;
    ChangeLog::from_json(body).map_err(|e| PersistenceError::malformed(path, &e))
}

/// Writes a change log atomically.
///
/// # Errors
///
/// Returns `PersistenceError::Io` or `PersistenceError::Serialization`.
pub fn write_change_log(path: &Path, log: &ChangeLog) -> Result<(), PersistenceError> {
    write_json_atomic(path, log)
}
