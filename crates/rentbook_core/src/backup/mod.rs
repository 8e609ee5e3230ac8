//! Whole-dataset backup codec.
//!
//! # Responsibility
//! - Encode units + rent-increase events into one portable JSON document.
//! - Decode and validate such a document before anything is replaced.
//! - Maintain the standing "last backup" snapshot in storage.
//!
//! # Invariants
//! - Document shape: `{ units, events, backupDate, version: "1.0" }`.
//! - A document is rejected only for its shape (not JSON, not an object,
//!   `units`/`events` missing or not arrays); records inside get the same
//!   per-record defaulting and skipping as a storage load.
//! - Snapshot text and its timestamp are written in a single storage write.

mod hook;

pub use hook::AutoBackupHook;

use crate::model::rent_increase::RentIncreaseEvent;
use crate::model::timestamp::{format_timestamp, parse_timestamp};
use crate::model::unit::Unit;
use crate::repo::record_repo::decode_records;
use crate::repo::kv_repo::{KvRepository, RepoError, RepoResult};
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Format tag written into every backup document.
pub const BACKUP_FORMAT_VERSION: &str = "1.0";
/// Storage key of the standing backup snapshot.
pub const LAST_BACKUP_KEY: &str = "last-backup";
/// Storage key of the standing snapshot's creation time.
pub const LAST_BACKUP_AT_KEY: &str = "last-backup-at";

const UNITS_FIELD: &str = "units";
const EVENTS_FIELD: &str = "events";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BackupDocument<'a> {
    units: &'a [Unit],
    events: &'a [RentIncreaseEvent],
    backup_date: String,
    version: &'static str,
}

/// Decoded backup contents.
#[derive(Debug, Clone, PartialEq)]
pub struct BackupSnapshot {
    pub units: Vec<Unit>,
    pub events: Vec<RentIncreaseEvent>,
    /// `None` when the document carried no readable `backupDate`.
    pub backup_date: Option<DateTime<Utc>>,
    pub version: Option<String>,
}

/// Reasons a backup document is rejected.
#[derive(Debug)]
pub enum DecodeError {
    /// Text is not JSON.
    Malformed(serde_json::Error),
    /// JSON top level is not an object.
    NotAnObject,
    /// A required top-level field is absent or `null`.
    MissingField(&'static str),
    /// A required top-level field is not an array.
    NotAnArray(&'static str),
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(err) => write!(f, "backup is not valid JSON: {err}"),
            Self::NotAnObject => write!(f, "backup top level must be an object"),
            Self::MissingField(field) => write!(f, "backup is missing `{field}`"),
            Self::NotAnArray(field) => write!(f, "backup `{field}` must be an array"),
        }
    }
}

impl Error for DecodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Malformed(err) => Some(err),
            Self::NotAnObject | Self::MissingField(_) | Self::NotAnArray(_) => None,
        }
    }
}

/// Encodes the dataset as a backup document stamped with `now`.
pub fn encode_backup(
    units: &[Unit],
    events: &[RentIncreaseEvent],
    now: DateTime<Utc>,
) -> Result<String, serde_json::Error> {
    serde_json::to_string(&BackupDocument {
        units,
        events,
        backup_date: format_timestamp(&now),
        version: BACKUP_FORMAT_VERSION,
    })
}

/// Decodes and validates a backup document.
///
/// Records get the same date rebuilding and field defaulting as a
/// storage load; a record that cannot be decoded is skipped. Unknown
/// top-level and record fields are ignored.
pub fn decode_backup(text: &str) -> Result<BackupSnapshot, DecodeError> {
    let document: Value = serde_json::from_str(text.trim()).map_err(DecodeError::Malformed)?;
    let Value::Object(mut fields) = document else {
        return Err(DecodeError::NotAnObject);
    };

    let units_value = take_array(&mut fields, UNITS_FIELD)?;
    let events_value = take_array(&mut fields, EVENTS_FIELD)?;
    let units: Vec<Unit> = decode_records(UNITS_FIELD, units_value);
    let events: Vec<RentIncreaseEvent> = decode_records(EVENTS_FIELD, events_value);

    let backup_date = fields
        .get("backupDate")
        .and_then(Value::as_str)
        .and_then(parse_timestamp);
    let version = fields
        .get("version")
        .and_then(Value::as_str)
        .map(str::to_string);
    if version.as_deref() != Some(BACKUP_FORMAT_VERSION) {
        warn!(
            "event=backup_decode module=backup status=warn reason=unexpected_version version={}",
            version.as_deref().unwrap_or("none")
        );
    }

    Ok(BackupSnapshot {
        units,
        events,
        backup_date,
        version,
    })
}

/// Encodes the dataset and stores it as the standing snapshot.
///
/// Returns the encoded text so callers can export it.
pub fn write_backup<R: KvRepository + ?Sized>(
    repo: &mut R,
    units: &[Unit],
    events: &[RentIncreaseEvent],
    now: DateTime<Utc>,
) -> RepoResult<String> {
    let text = encode_backup(units, events, now).map_err(RepoError::Encode)?;
    let stamp = format_timestamp(&now);
    repo.set_values(&[(LAST_BACKUP_KEY, text.as_str()), (LAST_BACKUP_AT_KEY, stamp.as_str())])?;
    info!(
        "event=backup_write module=backup status=ok units={} events={} bytes={}",
        units.len(),
        events.len(),
        text.len()
    );
    Ok(text)
}

/// Reads the creation time of the standing snapshot.
pub fn read_last_backup_timestamp<R: KvRepository + ?Sized>(
    repo: &R,
) -> RepoResult<Option<DateTime<Utc>>> {
    match repo.get_value(LAST_BACKUP_AT_KEY)? {
        Some(text) => parse_timestamp(&text).map(Some).ok_or_else(|| {
            RepoError::InvalidData(format!("unreadable last backup timestamp `{text}`"))
        }),
        None => Ok(None),
    }
}

/// Reads the standing snapshot text, if any backup has run.
pub fn read_last_backup<R: KvRepository + ?Sized>(repo: &R) -> RepoResult<Option<String>> {
    repo.get_value(LAST_BACKUP_KEY)
}

fn take_array(
    fields: &mut serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<Vec<Value>, DecodeError> {
    match fields.remove(field) {
        Some(Value::Null) | None => Err(DecodeError::MissingField(field)),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(DecodeError::NotAnArray(field)),
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_backup, encode_backup, DecodeError, BACKUP_FORMAT_VERSION};
    use crate::model::timestamp::now_utc;

    #[test]
    fn empty_dataset_round_trips() {
        let now = now_utc();
        let text = encode_backup(&[], &[], now).expect("encode");
        let snapshot = decode_backup(&text).expect("decode");
        assert!(snapshot.units.is_empty());
        assert!(snapshot.events.is_empty());
        assert_eq!(snapshot.backup_date, Some(now));
        assert_eq!(snapshot.version.as_deref(), Some(BACKUP_FORMAT_VERSION));
    }

    #[test]
    fn missing_events_field_is_rejected() {
        let err = decode_backup(r#"{"units":[],"version":"1.0"}"#).expect_err("events required");
        assert!(matches!(err, DecodeError::MissingField("events")));
    }

    #[test]
    fn null_units_field_is_rejected() {
        let err = decode_backup(r#"{"units":null,"events":[]}"#).expect_err("units required");
        assert!(matches!(err, DecodeError::MissingField("units")));
    }

    #[test]
    fn non_object_and_garbage_are_rejected() {
        assert!(matches!(
            decode_backup("[1,2,3]"),
            Err(DecodeError::NotAnObject)
        ));
        assert!(matches!(
            decode_backup("definitely not json"),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn non_array_collection_is_rejected() {
        let err = decode_backup(r#"{"units":{"id":"1"},"events":[]}"#).expect_err("array required");
        assert!(matches!(err, DecodeError::NotAnArray("units")));
    }

    #[test]
    fn record_without_id_is_skipped_not_fatal() {
        let snapshot = decode_backup(
            r#"{"units":[{"address":"x"},{"id":"2","name":"Kept","address":"y"}],"events":[]}"#,
        )
        .expect("document shape is valid");
        let ids: Vec<&str> = snapshot.units.iter().map(|unit| unit.id.as_str()).collect();
        assert_eq!(ids, vec!["2"]);
    }
}
