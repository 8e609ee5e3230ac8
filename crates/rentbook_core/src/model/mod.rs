//! Domain model for rental units and their rent history.
//!
//! # Responsibility
//! - Define canonical records persisted locally and exported in backups.
//! - Keep write-path validation next to the data it guards.
//!
//! # Invariants
//! - Every record is identified by an opaque, stable `RecordId`.
//! - Timestamps are UTC with millisecond precision.

pub mod rent_increase;
pub mod timestamp;
pub mod unit;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Opaque record identifier.
///
/// New records get UUID v4 text; ids read from older data are kept as-is.
pub type RecordId = String;

/// Record id from stored data: non-blank text, or a legacy numeric id.
pub(crate) fn record_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<RecordId, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(text) if !text.trim().is_empty() => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        other => Err(D::Error::custom(format!("unusable record id: {other}"))),
    }
}

/// `null` or a value of the wrong shape decodes to `T::default()`.
pub(crate) fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}
