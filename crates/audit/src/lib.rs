// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod event;
mod log;
pub mod timestamp;

#[cfg(test)]
mod tests;

pub use event::{ChangeDraft, ChangeEvent, ChangeKind};
pub use log::{CHANGE_LOG_VERSION, ChangeLog, ChangeSummary, ReplayOutcome};

/// Label recorded for changes made by the engine itself.
pub const SYSTEM_ACTOR: &str = "system";

/// Represents the entity performing an action.
///
/// An actor is any identifiable entity that initiates a state change.
/// Only the id ends up in the change log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// The unique identifier for this actor.
    pub id: String,
    /// The type of actor (e.g., "operator", "system").
    pub actor_type: String,
}

impl Actor {
    /// Creates a new Actor.
    ///
    /// # Arguments
    ///
    /// * `id` - The unique identifier for this actor
    /// * `actor_type` - The type of actor
    #[must_use]
    pub const fn new(id: String, actor_type: String) -> Self {
        Self { id, actor_type }
    }

    /// An operator identified by a free-form label.
    ///
    /// Blank labels fall back to the system actor.
    #[must_use]
    pub fn operator(label: &str) -> Self {
        let trimmed: &str = label.trim();
        if trimmed.is_empty() {
            return Self::system();
        }
        Self::new(trimmed.to_string(), String::from("operator"))
    }

    /// The engine itself.
    #[must_use]
    pub fn system() -> Self {
        Self::new(String::from(SYSTEM_ACTOR), String::from("system"))
    }

    /// The label written into change events.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.id
    }
}
