// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use zonemap_domain::{MunicipalityId, ZoneColor, ZoneName};

/// A command represents operator intent as data only.
///
/// Commands are the only way to request zone changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Move one municipality to another zone.
    ReassignZone {
        /// The municipality to move.
        municipality_id: MunicipalityId,
        /// The target zone (may be the unassigned sentinel).
        zone: ZoneName,
    },
    /// Move several municipalities to one zone, all or nothing.
    ReassignMany {
        /// The municipalities to move. Repeats are ignored.
        municipality_ids: Vec<MunicipalityId>,
        /// The target zone (may be the unassigned sentinel).
        zone: ZoneName,
    },
    /// Rename a zone, moving all of its members, and set its color.
    RenameZone {
        /// The current name.
        from: ZoneName,
        /// The new name.
        to: ZoneName,
        /// The color of the renamed zone.
        color: ZoneColor,
    },
    /// Change the color of a zone.
    RecolorZone {
        /// The zone to recolor.
        zone: ZoneName,
        /// The new color.
        color: ZoneColor,
    },
    /// Add an empty zone to the palette.
    AddZone {
        /// The zone name.
        zone: ZoneName,
        /// The zone color.
        color: ZoneColor,
    },
}

impl Command {
    /// Short name of the command, for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ReassignZone { .. } => "reassign_zone",
            Self::ReassignMany { .. } => "reassign_many",
            Self::RenameZone { .. } => "rename_zone",
            Self::RecolorZone { .. } => "recolor_zone",
            Self::AddZone { .. } => "add_zone",
        }
    }
}
