// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::event::{ChangeDraft, ChangeEvent};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use time::OffsetDateTime;
use zonemap_domain::{Municipality, MunicipalityId, ZoneName};

/// Format version written into new change logs.
pub const CHANGE_LOG_VERSION: &str = "2.0";

/// Counters kept alongside the change list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChangeSummary {
    /// Number of events in the log.
    #[serde(default)]
    pub total_changes: u64,
    /// Number of distinct municipalities with at least one event.
    #[serde(default)]
    pub municipalities_changed: u64,
    /// Zones that received municipalities, in first-seen order.
    #[serde(default)]
    pub zones_touched: Vec<ZoneName>,
}

/// The result of replaying a log over base data.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayOutcome {
    /// Base municipalities with every applicable event applied.
    pub municipalities: Vec<Municipality>,
    /// Number of events that changed a base row.
    pub applied: usize,
    /// Events naming municipalities absent from the base, by sequence.
    pub skipped: Vec<u64>,
}

/// A region's append-only list of zone reassignments.
///
/// The log is the durable source of truth for assignments: the current
/// state of a region is always `replay_onto(base)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeLog {
    /// File format version.
    #[serde(default = "default_version", alias = "versao")]
    pub version: String,
    /// When the log was started.
    #[serde(
        default = "epoch",
        alias = "criado_em",
        with = "crate::timestamp"
    )]
    pub created_at: OffsetDateTime,
    /// When the log was last appended to.
    #[serde(
        default = "epoch",
        alias = "ultima_atualizacao",
        with = "crate::timestamp"
    )]
    pub updated_at: OffsetDateTime,
    /// Events in append order.
    #[serde(default, alias = "alteracoes")]
    changes: Vec<ChangeEvent>,
    /// Counters derived from `changes`. Rebuilt rather than read.
    #[serde(default, skip_deserializing)]
    summary: ChangeSummary,
}

impl ChangeLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            version: default_version(),
            created_at: now,
            updated_at: now,
            changes: Vec::new(),
            summary: ChangeSummary::default(),
        }
    }

    /// Parses a log file body and rebuilds its counters.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if the body is not a change log.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        let mut log: Self = serde_json::from_str(body)?;
        log.recompute_summary();
        Ok(log)
    }

    /// Events in append order.
    #[must_use]
    pub fn changes(&self) -> &[ChangeEvent] {
        &self.changes
    }

    /// The derived counters.
    #[must_use]
    pub const fn summary(&self) -> &ChangeSummary {
        &self.summary
    }

    /// Number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Returns whether the log holds no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Highest sequence number in the log, or zero.
    #[must_use]
    pub fn last_sequence(&self) -> u64 {
        self.changes.iter().map(|c| c.sequence).max().unwrap_or(0)
    }

    /// Appends drafts as new events.
    ///
    /// Sequences continue from the current maximum, so they stay strictly
    /// increasing even for logs whose older entries carry no sequence.
    ///
    /// # Arguments
    ///
    /// * `drafts` - Validated changes, in the order they were produced
    /// * `now` - Commit time stamped on every new event
    ///
    /// # Returns
    ///
    /// The appended events.
    pub fn append(&mut self, drafts: Vec<ChangeDraft>, now: OffsetDateTime) -> Vec<ChangeEvent> {
        let mut next: u64 = self.last_sequence() + 1;
        let mut appended: Vec<ChangeEvent> = Vec::with_capacity(drafts.len());
        for draft in drafts {
            appended.push(ChangeEvent::from_draft(draft, next, now));
            next += 1;
        }
        self.changes.extend(appended.iter().cloned());
        if !appended.is_empty() {
            self.updated_at = now;
        }
        self.recompute_summary();
        appended
    }

    /// Rebuilds the summary counters from the event list.
    ///
    /// Stored counters are never read back, so this runs after every parse.
    pub fn recompute_summary(&mut self) {
        let distinct: HashSet<&MunicipalityId> =
            self.changes.iter().map(|c| &c.municipality_id).collect();
        let mut zones: Vec<ZoneName> = Vec::new();
        for change in &self.changes {
            if !zones.contains(&change.new_zone) {
                zones.push(change.new_zone.clone());
            }
        }
        self.summary = ChangeSummary {
            total_changes: u64::try_from(self.changes.len()).unwrap_or(u64::MAX),
            municipalities_changed: u64::try_from(distinct.len()).unwrap_or(u64::MAX),
            zones_touched: zones,
        };
    }

    /// Applies the log to base data.
    ///
    /// Events are applied in increasing sequence order; events with equal
    /// sequence keep their file order. The last event for a municipality
    /// wins, regardless of timestamps. Replay never reads the current zone
    /// of a row, so replaying the same log twice gives the same result.
    ///
    /// # Arguments
    ///
    /// * `base` - Municipalities as loaded from the entity table
    #[must_use]
    pub fn replay_onto(&self, base: &[Municipality]) -> ReplayOutcome {
        let mut municipalities: Vec<Municipality> = base.to_vec();
        let index: HashMap<MunicipalityId, usize> = municipalities
            .iter()
            .enumerate()
            .map(|(i, m)| (m.id.clone(), i))
            .collect();

        let mut ordered: Vec<&ChangeEvent> = self.changes.iter().collect();
        ordered.sort_by_key(|c| c.sequence);

        let mut applied: usize = 0;
        let mut skipped: Vec<u64> = Vec::new();
        for change in ordered {
            match index.get(&change.municipality_id) {
                Some(&row) => {
                    municipalities[row].zone = change.new_zone.clone();
                    applied += 1;
                }
                None => skipped.push(change.sequence),
            }
        }

        ReplayOutcome {
            municipalities,
            applied,
            skipped,
        }
    }
}

fn default_version() -> String {
    String::from(CHANGE_LOG_VERSION)
}

const fn epoch() -> OffsetDateTime {
    OffsetDateTime::UNIX_EPOCH
}
