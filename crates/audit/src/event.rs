// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::SYSTEM_ACTOR;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;
use zonemap_domain::{MunicipalityId, ZoneName};

/// What produced a change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// A municipality was moved to another zone.
    #[default]
    #[serde(alias = "alteracao_zona")]
    Reassignment,
    /// A municipality moved because its zone was renamed.
    ZoneRename,
}

impl ChangeKind {
    /// Stable string form, as written to disk.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reassignment => "reassignment",
            Self::ZoneRename => "zone_rename",
        }
    }
}

/// A change that has been validated but not yet written to the log.
///
/// Drafts carry everything except the sequence number and timestamp,
/// which the log assigns on append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeDraft {
    /// The municipality that moved.
    pub municipality_id: MunicipalityId,
    /// Its display name at the time of the change.
    pub municipality_name: String,
    /// The zone it left.
    pub prior_zone: ZoneName,
    /// The zone it joined.
    pub new_zone: ZoneName,
    /// Who made the change.
    pub actor: String,
    /// What produced the change.
    pub kind: ChangeKind,
}

/// One committed zone reassignment.
///
/// Events are immutable once appended. Older logs used Portuguese field
/// names, which are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Monotonically increasing position in the log. Zero when absent.
    #[serde(default, alias = "id")]
    pub sequence: u64,
    /// When the change was committed.
    #[serde(with = "crate::timestamp")]
    pub timestamp: OffsetDateTime,
    /// The municipality that moved.
    #[serde(alias = "cd_mun", alias = "municipio_id")]
    #[serde(deserialize_with = "deserialize_municipality_id")]
    pub municipality_id: MunicipalityId,
    /// Its display name at the time of the change.
    #[serde(default, alias = "cidade")]
    pub municipality_name: String,
    /// The zone it left.
    #[serde(alias = "zona_anterior", deserialize_with = "deserialize_zone")]
    pub prior_zone: ZoneName,
    /// The zone it joined.
    #[serde(alias = "zona_nova", deserialize_with = "deserialize_zone")]
    pub new_zone: ZoneName,
    /// Who made the change.
    #[serde(default = "default_actor", alias = "usuario")]
    pub actor: String,
    /// What produced the change.
    #[serde(default, alias = "tipo")]
    pub kind: ChangeKind,
}

impl ChangeEvent {
    /// Stamps a draft with its sequence number and commit time.
    #[must_use]
    pub fn from_draft(draft: ChangeDraft, sequence: u64, timestamp: OffsetDateTime) -> Self {
        Self {
            sequence,
            timestamp,
            municipality_id: draft.municipality_id,
            municipality_name: draft.municipality_name,
            prior_zone: draft.prior_zone,
            new_zone: draft.new_zone,
            actor: draft.actor,
            kind: draft.kind,
        }
    }
}

fn default_actor() -> String {
    String::from(SYSTEM_ACTOR)
}

/// Identifiers may be stored as JSON numbers or strings.
fn deserialize_municipality_id<'de, D>(deserializer: D) -> Result<MunicipalityId, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: serde_json::Value = serde_json::Value::deserialize(deserializer)?;
    MunicipalityId::from_json(&raw)
        .ok_or_else(|| D::Error::custom(format!("invalid municipality id: {raw}")))
}

/// Missing or blank zones mean the municipality had no assignment.
fn deserialize_zone<'de, D>(deserializer: D) -> Result<ZoneName, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(ZoneName::unassigned()),
        Some(name) => ZoneName::new(name).map_err(D::Error::custom),
    }
}
