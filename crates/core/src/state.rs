// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::view::{MaterializedView, ViewRow};
use serde::Serialize;
use zonemap_audit::ChangeDraft;
use zonemap_domain::{MunicipalityId, ZoneColor, ZoneName};

/// A municipality touched by a transition, as observers should now see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AffectedMunicipality {
    /// The municipality.
    pub id: MunicipalityId,
    /// Its display name.
    pub name: String,
    /// Its zone after the transition.
    pub zone: ZoneName,
    /// Its color after the transition.
    pub color: ZoneColor,
}

impl AffectedMunicipality {
    pub(crate) fn from_row(row: &ViewRow) -> Self {
        Self {
            id: row.municipality.id.clone(),
            name: row.municipality.name.clone(),
            zone: row.municipality.zone.clone(),
            color: row.color.clone(),
        }
    }
}

/// The result of a successful state transition.
///
/// Transitions are atomic: they either succeed completely or fail without
/// side effects. Nothing here has been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionResult {
    /// The view after the transition.
    pub new_view: MaterializedView,
    /// One change per moved municipality, to be appended to the log.
    pub drafts: Vec<ChangeDraft>,
    /// Whether the palette must be written.
    pub palette_changed: bool,
    /// Municipalities whose zone or color changed.
    pub affected: Vec<AffectedMunicipality>,
}
