// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Small filesystem helpers shared by every durable file.

use crate::error::PersistenceError;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Writes `bytes` to `path` so readers see either the old or the new content.
///
/// The data goes to a sibling temporary file first and is then renamed over
/// the target. The parent directory is created if needed.
///
/// # Errors
///
/// Returns `PersistenceError::Io` if any step fails; the temporary file is
/// removed on failure.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| PersistenceError::io(parent, &e))?;
    }

    let temp: PathBuf = temp_path_for(path);
    if let Err(e) = fs::write(&temp, bytes) {
        let _ = fs::remove_file(&temp);
        return Err(PersistenceError::io(&temp, &e));
    }
    if let Err(e) = fs::rename(&temp, path) {
        let _ = fs::remove_file(&temp);
        return Err(PersistenceError::io(path, &e));
    }
    Ok(())
}

/// Serializes `value` as pretty JSON and writes it atomically.
///
/// # Errors
///
/// Returns `PersistenceError::Serialization` or `PersistenceError::Io`.
pub fn write_json_atomic<T>(path: &Path, value: &T) -> Result<(), PersistenceError>
where
    T: Serialize + ?Sized,
{
    let mut body: Vec<u8> = serde_json::to_vec_pretty(value)?;
    body.push(b'\n');
    write_atomic(path, &body)
}

/// Reads a file as UTF-8 text.
///
/// # Errors
///
/// * `PersistenceError::MissingFile` if the file does not exist
/// * `PersistenceError::MalformedFile` if it is not UTF-8
/// * `PersistenceError::Io` for anything else
pub fn read_text(path: &Path) -> Result<String, PersistenceError> {
    match fs::read(path) {
        Ok(bytes) => String::from_utf8(bytes).map_err(|e| PersistenceError::malformed(path, &e)),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(PersistenceError::missing(path)),
        Err(e) => Err(PersistenceError::io(path, &e)),
    }
}

/// Reads a file's bytes, or `None` if it does not exist.
///
/// # Errors
///
/// Returns `PersistenceError::Io` for failures other than absence.
pub fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, PersistenceError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(PersistenceError::io(path, &e)),
    }
}

/// Creates a directory and its parents.
///
/// # Errors
///
/// Returns `PersistenceError::Io` on failure.
pub fn ensure_dir(path: &Path) -> Result<(), PersistenceError> {
    fs::create_dir_all(path).map_err(|e| PersistenceError::io(path, &e))
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name: String = path
        .file_name()
        .map_or_else(|| String::from("file"), |n| n.to_string_lossy().into_owned());
    let suffix: u64 = rand::random::<u64>();
    path.with_file_name(format!(".{name}.{suffix:016x}.tmp"))
}
