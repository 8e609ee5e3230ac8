//! Timestamp helpers shared by the model, storage and backup layers.
//!
//! # Responsibility
//! - Produce millisecond-precision UTC timestamps for new records.
//! - Encode timestamps as RFC 3339 text with milliseconds and `Z` suffix.
//! - Decode the timestamp shapes found in stored and imported data.
//!
//! # Invariants
//! - `now_utc()` never carries sub-millisecond precision, so encode/decode
//!   round trips compare equal.
//! - Decoding accepts RFC 3339 text, `YYYY-MM-DD` dates (midnight UTC) and
//!   integer epoch milliseconds.
//! - Decoding never fails on a bad value: required dates fall back to the
//!   current time, optional dates to `None`.

use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, Utc};
use serde::de::IgnoredAny;
use serde::Deserialize;

/// Current UTC time truncated to millisecond precision.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Formats a timestamp as `YYYY-MM-DDTHH:MM:SS.sssZ`.
pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Drops sub-millisecond precision from a caller-supplied timestamp.
pub fn to_millis(value: DateTime<Utc>) -> DateTime<Utc> {
    value.trunc_subsecs(3)
}

/// Parses a textual timestamp.
///
/// Returns `None` for text that is neither RFC 3339 nor a plain date.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let trimmed = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Text(String),
    Other(IgnoredAny),
}

impl RawTimestamp {
    fn resolve(self) -> Option<DateTime<Utc>> {
        let parsed = match self {
            Self::Millis(millis) => DateTime::from_timestamp_millis(millis),
            Self::Text(text) => parse_timestamp(&text),
            Self::Other(_) => None,
        };
        parsed.map(to_millis)
    }
}

/// Required-with-fallback timestamps: `null` or an unreadable value decodes
/// to the current time, matching a missing field under
/// `#[serde(default = "now_utc")]`.
pub(crate) mod or_now {
    use super::{format_timestamp, now_utc, RawTimestamp};
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub(crate) fn serialize<S: Serializer>(
        value: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_timestamp(value))
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        Ok(Option::<RawTimestamp>::deserialize(deserializer)?
            .and_then(RawTimestamp::resolve)
            .unwrap_or_else(now_utc))
    }
}

/// Optional timestamps: `null` or an unreadable value decodes to `None`.
pub(crate) mod option {
    use super::{format_timestamp, RawTimestamp};
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub(crate) fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => serializer.serialize_str(&format_timestamp(value)),
            None => serializer.serialize_none(),
        }
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Ok(Option::<RawTimestamp>::deserialize(deserializer)?.and_then(RawTimestamp::resolve))
    }
}
