// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Serde helpers for change log timestamps.
//!
//! Timestamps are written as RFC 3339. Older logs recorded local times
//! without an offset (`2024-01-15T10:30:00.123456`); those are read as UTC.

use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serializer};
use time::format_description::well_known::{Iso8601, Rfc3339};
use time::{OffsetDateTime, PrimitiveDateTime};

/// Parses an RFC 3339 timestamp, or an ISO 8601 one without offset as UTC.
///
/// # Errors
///
/// Returns the parse error of the offset-less attempt when neither form matches.
pub fn parse(raw: &str) -> Result<OffsetDateTime, time::error::Parse> {
    let trimmed: &str = raw.trim();
    OffsetDateTime::parse(trimmed, &Rfc3339).or_else(|_| {
        PrimitiveDateTime::parse(trimmed, &Iso8601::DEFAULT).map(PrimitiveDateTime::assume_utc)
    })
}

/// Formats a timestamp as RFC 3339.
///
/// # Errors
///
/// Fails only for years outside the RFC 3339 range.
pub fn format(value: &OffsetDateTime) -> Result<String, time::error::Format> {
    value.format(&Rfc3339)
}

/// Serializes as RFC 3339.
///
/// # Errors
///
/// Propagates formatting failures as serializer errors.
pub fn serialize<S>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let text: String = format(value).map_err(S::Error::custom)?;
    serializer.serialize_str(&text)
}

/// Deserializes RFC 3339 or offset-less ISO 8601.
///
/// # Errors
///
/// Fails when the value is not a string in either form.
pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: String = String::deserialize(deserializer)?;
    parse(&raw).map_err(D::Error::custom)
}
