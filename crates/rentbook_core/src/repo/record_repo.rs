//! Unit and rent-increase collection persistence.
//!
//! # Responsibility
//! - Load and save the two record collections under fixed storage keys.
//! - Rebuild dates and default missing fields on load.
//!
//! # Invariants
//! - Saves always write the full collection, never deltas.
//! - `load_*` never fails: a storage error or a value that is not a JSON
//!   array yields an empty collection and an `event=records_load
//!   status=error` log line.
//! - Records are decoded one by one; a record that cannot be decoded is
//!   skipped with a warning and never costs the rest of the collection.

use crate::model::rent_increase::RentIncreaseEvent;
use crate::model::unit::Unit;
use crate::repo::kv_repo::{KvRepository, RepoError, RepoResult};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Storage key of the unit collection.
pub const UNITS_KEY: &str = "units";
/// Storage key of the rent-increase event collection.
pub const EVENTS_KEY: &str = "rent-increase-events";

/// Loads the unit collection, falling back to empty on any failure.
pub fn load_units<R: KvRepository + ?Sized>(repo: &R) -> Vec<Unit> {
    load_or_empty(repo, UNITS_KEY)
}

/// Loads the event collection, falling back to empty on any failure.
pub fn load_events<R: KvRepository + ?Sized>(repo: &R) -> Vec<RentIncreaseEvent> {
    load_or_empty(repo, EVENTS_KEY)
}

/// Rewrites the full unit collection.
pub fn save_units<R: KvRepository + ?Sized>(repo: &mut R, units: &[Unit]) -> RepoResult<()> {
    save_collection(repo, UNITS_KEY, units)
}

/// Rewrites the full event collection.
pub fn save_events<R: KvRepository + ?Sized>(
    repo: &mut R,
    events: &[RentIncreaseEvent],
) -> RepoResult<()> {
    save_collection(repo, EVENTS_KEY, events)
}

/// Reads one stored collection, surfacing failures.
///
/// A key that was never written reads as an empty collection.
pub fn try_load_collection<R, T>(repo: &R, key: &str) -> RepoResult<Vec<T>>
where
    R: KvRepository + ?Sized,
    T: DeserializeOwned,
{
    match repo.get_value(key)? {
        Some(text) => decode_collection(key, &text)
            .map_err(|err| RepoError::InvalidData(format!("collection `{key}`: {err}"))),
        None => Ok(Vec::new()),
    }
}

/// Decodes a stored JSON array of records, applying per-field defaults.
///
/// # Errors
/// - `text` is not a JSON array.
pub fn decode_collection<T: DeserializeOwned>(
    collection: &str,
    text: &str,
) -> Result<Vec<T>, serde_json::Error> {
    let values: Vec<Value> = serde_json::from_str(text)?;
    Ok(decode_records(collection, values))
}

/// Decodes already-parsed records, keeping every one that decodes.
///
/// Skipped records are logged by position, never by content.
pub fn decode_records<T: DeserializeOwned>(collection: &str, values: Vec<Value>) -> Vec<T> {
    let total = values.len();
    let records: Vec<T> = values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(
                    "event=record_decode module=repo status=skipped collection={collection} index={index} category={:?}",
                    err.classify()
                );
                None
            }
        })
        .collect();
    if records.len() < total {
        warn!(
            "event=records_decode module=repo status=partial collection={collection} kept={} skipped={}",
            records.len(),
            total - records.len()
        );
    }
    records
}

fn load_or_empty<R, T>(repo: &R, key: &str) -> Vec<T>
where
    R: KvRepository + ?Sized,
    T: DeserializeOwned,
{
    match try_load_collection(repo, key) {
        Ok(records) => {
            debug!(
                "event=records_load module=repo status=ok key={key} count={}",
                records.len()
            );
            records
        }
        Err(err) => {
            warn!(
                "event=records_load module=repo status=error key={key} fallback=empty error={err}"
            );
            Vec::new()
        }
    }
}

fn save_collection<R, T>(repo: &mut R, key: &str, records: &[T]) -> RepoResult<()>
where
    R: KvRepository + ?Sized,
    T: Serialize,
{
    let text = serde_json::to_string(records).map_err(RepoError::Encode)?;
    repo.set_value(key, &text)?;
    debug!(
        "event=records_save module=repo status=ok key={key} count={} bytes={}",
        records.len(),
        text.len()
    );
    Ok(())
}
