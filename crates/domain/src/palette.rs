// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::types::{ZoneColor, ZoneName};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Colors handed out, in order, when a palette has to be synthesized.
pub const SYNTHESIZED_COLOR_CYCLE: [&str; 8] = [
    "#228B22", "#000080", "#8B0000", "#4B0082", "#B8860B", "#2F4F4F", "#FF8C00", "#008B8B",
];

/// The ordered zone → color catalog of one region.
///
/// The unassigned sentinel is implicit and never stored here; lookups for
/// it (or for any zone the palette does not know) resolve to the fixed gray.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Palette {
    entries: IndexMap<ZoneName, ZoneColor>,
}

impl Palette {
    /// Creates an empty palette.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a palette from an ordered list of entries.
    ///
    /// Sentinel entries are dropped. Later duplicates overwrite the color of
    /// the first occurrence without moving it.
    #[must_use]
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (ZoneName, ZoneColor)>,
    {
        let mut palette: Self = Self::new();
        for (zone, color) in entries {
            if !zone.is_unassigned() {
                palette.entries.insert(zone, color);
            }
        }
        palette
    }

    /// Synthesizes a palette from observed zone names.
    ///
    /// Colors come from [`SYNTHESIZED_COLOR_CYCLE`] in first-seen order,
    /// wrapping around when there are more zones than colors. The sentinel
    /// and repeated names are skipped.
    #[must_use]
    pub fn synthesize<'a, I>(zones: I) -> Self
    where
        I: IntoIterator<Item = &'a ZoneName>,
    {
        let mut palette: Self = Self::new();
        for zone in zones {
            if zone.is_unassigned() || palette.entries.contains_key(zone) {
                continue;
            }
            let slot: usize = palette.entries.len() % SYNTHESIZED_COLOR_CYCLE.len();
            let color: ZoneColor = ZoneColor::parse(SYNTHESIZED_COLOR_CYCLE[slot])
                .unwrap_or_else(|_| ZoneColor::unassigned());
            palette.entries.insert(zone.clone(), color);
        }
        palette
    }

    /// Returns whether the palette names this zone.
    #[must_use]
    pub fn contains(&self, zone: &ZoneName) -> bool {
        self.entries.contains_key(zone)
    }

    /// Resolves the display color of a zone.
    #[must_use]
    pub fn color_of(&self, zone: &ZoneName) -> ZoneColor {
        self.entries
            .get(zone)
            .cloned()
            .unwrap_or_else(ZoneColor::unassigned)
    }

    /// Returns the stored color of a zone, if any.
    #[must_use]
    pub fn get(&self, zone: &ZoneName) -> Option<&ZoneColor> {
        self.entries.get(zone)
    }

    /// Adds a zone at the end of the palette.
    ///
    /// # Errors
    ///
    /// * `DomainError::ReservedZone` if `zone` is the sentinel
    /// * `DomainError::DuplicateZone` if the palette already has it
    pub fn insert(&mut self, zone: ZoneName, color: ZoneColor) -> Result<(), DomainError> {
        if zone.is_unassigned() {
            return Err(DomainError::ReservedZone { operation: "create" });
        }
        if self.entries.contains_key(&zone) {
            return Err(DomainError::DuplicateZone(zone.to_string()));
        }
        self.entries.insert(zone, color);
        Ok(())
    }

    /// Replaces the color of an existing zone.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ZoneNotFound` if the zone is not in the palette.
    pub fn recolor(&mut self, zone: &ZoneName, color: ZoneColor) -> Result<(), DomainError> {
        match self.entries.get_mut(zone) {
            Some(slot) => {
                *slot = color;
                Ok(())
            }
            None => Err(DomainError::ZoneNotFound(zone.to_string())),
        }
    }

    /// Renames a zone and sets its color.
    ///
    /// The renamed zone keeps the position of the old one. A zone that has
    /// members but no palette entry yet is appended instead.
    pub fn rename(&mut self, from: &ZoneName, to: ZoneName, color: ZoneColor) {
        match self.entries.get_index_of(from) {
            Some(index) => {
                self.entries.shift_remove_index(index);
                self.entries.shift_insert(index, to, color);
            }
            None => {
                self.entries.insert(to, color);
            }
        }
    }

    /// Iterates over the entries in palette order.
    pub fn iter(&self) -> impl Iterator<Item = (&ZoneName, &ZoneColor)> {
        self.entries.iter()
    }

    /// Zone names in palette order.
    pub fn zones(&self) -> impl Iterator<Item = &ZoneName> {
        self.entries.keys()
    }

    /// Number of named zones (the sentinel is not counted).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the palette names no zones.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
