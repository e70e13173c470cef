// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::PersistenceError;
use crate::storage::{read_optional, write_json_atomic};
use indexmap::IndexMap;
use serde_json::Value;
use std::path::Path;
use zonemap_domain::{Palette, ZoneColor, ZoneName};

/// A palette read from disk, with entries that had to be corrected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteFile {
    /// The usable palette.
    pub palette: Palette,
    /// Zones whose stored color was invalid and replaced with gray.
    pub coerced: Vec<ZoneName>,
}

/// Reads a palette file, or `None` if it does not exist.
///
/// The body is a JSON object mapping zone name to color, in display order.
/// Entries for the sentinel or with an empty name are dropped; invalid
/// colors become the unassigned gray.
///
/// # Errors
///
/// * `PersistenceError::MalformedFile` if the body is not a JSON object
/// * `PersistenceError::Io` if the file cannot be read
pub fn read_palette(path: &Path) -> Result<Option<PaletteFile>, PersistenceError> {
    let Some(bytes) = read_optional(path)? else {
        return Ok(None);
    };
    let raw: IndexMap<String, Value> =
        serde_json::from_slice(&bytes).map_err(|e| PersistenceError::malformed(path, &e))?;

    let mut coerced: Vec<ZoneName> = Vec::new();
    let mut entries: Vec<(ZoneName, ZoneColor)> = Vec::with_capacity(raw.len());
    for (name, value) in raw {
        let Ok(zone) = ZoneName::new(&name) else {
            continue;
        };
        if zone.is_unassigned() {
            continue;
        }
        let color: ZoneColor = match value.as_str().map(ZoneColor::parse) {
            Some(Ok(color)) => color,
            _ => {
                coerced.push(zone.clone());
                ZoneColor::unassigned()
            }
        };
        entries.push((zone, color));
    }

    Ok(Some(PaletteFile {
        palette: Palette::from_entries(entries),
        coerced,
    }))
}

/// Writes a palette atomically as a pretty JSON object.
///
/// # Errors
///
/// Returns `PersistenceError::Io` or `PersistenceError::Serialization`.
pub fn write_palette(path: &Path, palette: &Palette) -> Result<(), PersistenceError> {
    write_json_atomic(path, palette)
}
