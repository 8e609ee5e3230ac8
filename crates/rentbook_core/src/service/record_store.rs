//! In-memory record store with write-through persistence.
//!
//! # Responsibility
//! - Own the canonical unit and rent-increase collections for a session.
//! - Apply mutations, persist the touched collections, then notify
//!   post-mutation hooks (auto-backup is one of them).
//! - Restore a backup as a wholesale replacement of both collections.
//!
//! # Invariants
//! - A mutation is fully applied in memory before anything is persisted;
//!   a rejected mutation leaves both collections untouched.
//! - Unit order is insertion order and is never re-sorted here.
//! - Deleting a unit never deletes its rent-increase events.
//! - Save and hook failures are logged and swallowed; the in-memory
//!   effect of the mutation stands.

use crate::backup::{self, AutoBackupHook, DecodeError};
use crate::config::{AutoBackupPolicy, StoreConfig};
use crate::model::rent_increase::RentIncreaseEvent;
use crate::model::timestamp::{format_timestamp, now_utc};
use crate::model::unit::{NewUnit, Unit, UnitPatch, ValidationError};
use crate::model::RecordId;
use crate::repo::kv_repo::{KvRepository, RepoError, RepoResult};
use crate::repo::record_repo;
use crate::stats::increase_history;
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Error surfaced by record store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Bad input to a mutation; nothing was changed.
    Validation(ValidationError),
    /// The referenced unit does not exist.
    NotFound(RecordId),
    /// Durable storage read or write failed.
    Persistence(RepoError),
    /// Backup text could not be decoded.
    Decode(DecodeError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "unit not found: {id}"),
            Self::Persistence(err) => write!(f, "storage failure: {err}"),
            Self::Decode(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
            Self::Persistence(err) => Some(err),
            Self::Decode(err) => Some(err),
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Persistence(value)
    }
}

impl From<DecodeError> for StoreError {
    fn from(value: DecodeError) -> Self {
        Self::Decode(value)
    }
}

/// The two record collections held by a store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    pub units: Vec<Unit>,
    pub events: Vec<RentIncreaseEvent>,
}

/// Completed mutation, passed to hooks after persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    UnitAdded(RecordId),
    UnitUpdated(RecordId),
    UnitDeleted(RecordId),
    RentIncreased { unit_id: RecordId, event_id: RecordId },
}

impl Mutation {
    /// Stable label used in log events.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnitAdded(_) => "unit_added",
            Self::UnitUpdated(_) => "unit_updated",
            Self::UnitDeleted(_) => "unit_deleted",
            Self::RentIncreased { .. } => "rent_increased",
        }
    }
}

/// Listener run after every successful, persisted mutation.
///
/// Errors are logged by the store and never reach the mutation caller.
pub trait MutationHook<R: KvRepository>: Send {
    fn name(&self) -> &'static str;
    fn after_mutation(
        &mut self,
        mutation: &Mutation,
        records: &RecordSet,
        repo: &mut R,
    ) -> StoreResult<()>;
}

/// Counts reported by a successful restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreSummary {
    pub units: usize,
    pub events: usize,
}

#[derive(Debug, Clone, Copy)]
enum Touched {
    Units,
    Both,
}

/// Session handle over the unit and rent-increase collections.
pub struct RecordStore<R: KvRepository> {
    repo: R,
    records: RecordSet,
    hooks: Vec<Box<dyn MutationHook<R>>>,
}

impl<R: KvRepository> RecordStore<R> {
    /// Opens a session: loads both collections and registers the
    /// auto-backup hook selected by `config`.
    ///
    /// Load failures leave the affected collection empty (logged).
    pub fn open(repo: R, config: &StoreConfig) -> Self {
        let records = RecordSet {
            units: record_repo::load_units(&repo),
            events: record_repo::load_events(&repo),
        };
        info!(
            "event=store_open module=store status=ok units={} events={}",
            records.units.len(),
            records.events.len()
        );

        let mut store = Self {
            repo,
            records,
            hooks: Vec::new(),
        };
        match config.auto_backup {
            AutoBackupPolicy::EveryMutation => {
                store.add_hook(Box::new(AutoBackupHook::every_mutation()));
            }
            AutoBackupPolicy::Throttled(interval) => {
                store.add_hook(Box::new(AutoBackupHook::throttled(interval)));
            }
            AutoBackupPolicy::Disabled => {}
        }
        store
    }

    /// Registers an additional post-mutation hook.
    pub fn add_hook(&mut self, hook: Box<dyn MutationHook<R>>) {
        self.hooks.push(hook);
    }

    /// Storage backing this session.
    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Ends the session and hands back the storage.
    pub fn into_repository(self) -> R {
        self.repo
    }

    /// Current in-memory collections.
    pub fn records(&self) -> &RecordSet {
        &self.records
    }

    /// All units in insertion order.
    pub fn list_units(&self) -> &[Unit] {
        &self.records.units
    }

    /// All rent-increase events in insertion order, orphans included.
    pub fn list_events(&self) -> &[RentIncreaseEvent] {
        &self.records.events
    }

    /// Looks up one unit; a miss is not an error.
    pub fn get_unit(&self, id: &str) -> Option<&Unit> {
        self.records.units.iter().find(|unit| unit.id == id)
    }

    /// Looks up one rent-increase event, even if its unit is gone.
    pub fn get_event(&self, id: &str) -> Option<&RentIncreaseEvent> {
        self.records.events.iter().find(|event| event.id == id)
    }

    /// Events for `unit_id` in insertion order.
    pub fn events_for_unit(&self, unit_id: &str) -> Vec<&RentIncreaseEvent> {
        self.records
            .events
            .iter()
            .filter(|event| event.unit_id == unit_id)
            .collect()
    }

    /// Events for `unit_id`, newest `increase_date` first.
    pub fn increase_history_for(&self, unit_id: &str) -> Vec<&RentIncreaseEvent> {
        increase_history(&self.records.events, unit_id)
    }

    /// Creates a unit and returns its id.
    ///
    /// # Errors
    /// - `Validation` for blank name/address or invalid amounts.
    pub fn add_unit(&mut self, input: NewUnit) -> StoreResult<RecordId> {
        let unit = Unit::from_new(input, now_utc());
        if let Err(err) = unit.validate() {
            warn!("event=unit_add module=store status=rejected reason={err}");
            return Err(err.into());
        }

        let id = unit.id.clone();
        self.records.units.push(unit);
        info!("event=unit_add module=store status=ok unit_id={id}");
        self.commit(Touched::Units, Mutation::UnitAdded(id.clone()));
        Ok(id)
    }

    /// Merges `patch` into an existing unit.
    ///
    /// # Errors
    /// - `NotFound` for an unknown id.
    /// - `Validation` when the merged unit is invalid; the stored unit is
    ///   left unchanged.
    pub fn update_unit(&mut self, id: &str, patch: UnitPatch) -> StoreResult<()> {
        self.modify_unit(id, |unit, now| {
            unit.apply_patch(patch, now);
            Ok(())
        })
    }

    /// Appends a photo reference to the end of a unit's photo list.
    pub fn add_photo(&mut self, id: &str, uri: impl Into<String>) -> StoreResult<()> {
        let uri = uri.into();
        self.modify_unit(id, move |unit, now| {
            unit.photos.push(uri);
            unit.touch(now);
            Ok(())
        })
    }

    /// Removes the photo at `index`, keeping the order of the rest.
    ///
    /// # Errors
    /// - `Validation` when `index` is out of range.
    pub fn remove_photo(&mut self, id: &str, index: usize) -> StoreResult<()> {
        self.modify_unit(id, |unit, now| {
            if index >= unit.photos.len() {
                return Err(ValidationError::PhotoIndexOutOfRange {
                    index,
                    len: unit.photos.len(),
                });
            }
            unit.photos.remove(index);
            unit.touch(now);
            Ok(())
        })
    }

    /// Removes a unit. Its rent-increase events stay in place.
    ///
    /// # Errors
    /// - `NotFound` for an unknown id.
    pub fn delete_unit(&mut self, id: &str) -> StoreResult<()> {
        let position = self.position_of(id)?;
        let removed = self.records.units.remove(position);
        let orphaned = self
            .records
            .events
            .iter()
            .filter(|event| event.unit_id == removed.id)
            .count();
        info!(
            "event=unit_delete module=store status=ok unit_id={} orphaned_events={orphaned}",
            removed.id
        );
        self.commit(Touched::Units, Mutation::UnitDeleted(removed.id));
        Ok(())
    }

    /// Records a rent increase and moves the unit's rent to `new_amount`.
    ///
    /// The event append and the unit update happen together; a rejected
    /// call changes neither collection.
    ///
    /// # Errors
    /// - `Validation(UnknownUnit)` when the unit does not exist.
    /// - `Validation(NoCurrentRent)` when the unit has no rent amount.
    /// - `Validation(NotAnIncrease | InvalidAmount)` for bad amounts.
    pub fn record_rent_increase(
        &mut self,
        unit_id: &str,
        old_amount: f64,
        new_amount: f64,
        justification: Option<String>,
    ) -> StoreResult<RecordId> {
        let now = now_utc();
        let prepared = self.prepare_increase(unit_id, old_amount, new_amount, justification, now);
        let (position, event) = match prepared {
            Ok(prepared) => prepared,
            Err(err) => {
                warn!(
                    "event=rent_increase module=store status=rejected unit_id={unit_id} reason={err}"
                );
                return Err(err.into());
            }
        };

        let event_id = event.id.clone();
        let rate = event.increase_rate_percent;
        let unit = &mut self.records.units[position];
        unit.rent_amount = Some(new_amount);
        unit.last_rent_increase_date = Some(now);
        unit.touch(now);
        self.records.events.push(event);

        info!(
            "event=rent_increase module=store status=ok unit_id={unit_id} event_id={event_id} rate_percent={rate:.2}"
        );
        self.commit(
            Touched::Both,
            Mutation::RentIncreased {
                unit_id: unit_id.to_string(),
                event_id: event_id.clone(),
            },
        );
        Ok(event_id)
    }

    /// Writes a fresh standing snapshot and returns its text for export.
    ///
    /// # Errors
    /// - `Persistence` when encoding or the storage write fails.
    pub fn create_backup(&mut self) -> StoreResult<String> {
        backup::write_backup(
            &mut self.repo,
            &self.records.units,
            &self.records.events,
            now_utc(),
        )
        .map_err(|err| {
            error!("event=backup_create module=store status=error error={err}");
            StoreError::from(err)
        })
    }

    /// Restores a backup, reporting success as a boolean.
    ///
    /// Invalid text leaves the current collections untouched.
    pub fn restore_backup(&mut self, text: &str) -> bool {
        self.try_restore_backup(text).is_ok()
    }

    /// Restores a backup as the new truth, replacing both collections.
    ///
    /// # Errors
    /// - `Decode` when the text is not a valid backup; nothing changes.
    pub fn try_restore_backup(&mut self, text: &str) -> StoreResult<RestoreSummary> {
        let snapshot = match backup::decode_backup(text) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!("event=backup_restore module=store status=rejected reason={err}");
                return Err(err.into());
            }
        };

        self.records = RecordSet {
            units: snapshot.units,
            events: snapshot.events,
        };
        let summary = RestoreSummary {
            units: self.records.units.len(),
            events: self.records.events.len(),
        };
        info!(
            "event=backup_restore module=store status=ok units={} events={} backup_date={}",
            summary.units,
            summary.events,
            snapshot
                .backup_date
                .map(|date| format_timestamp(&date))
                .unwrap_or_else(|| "unknown".to_string())
        );
        self.persist(Touched::Both);
        Ok(summary)
    }

    /// Creation time of the standing snapshot, `None` if no backup ran
    /// or the stored value cannot be read.
    pub fn last_backup_timestamp(&self) -> Option<DateTime<Utc>> {
        match backup::read_last_backup_timestamp(&self.repo) {
            Ok(stamp) => stamp,
            Err(err) => {
                warn!("event=backup_timestamp module=store status=error error={err}");
                None
            }
        }
    }

    fn position_of(&self, id: &str) -> StoreResult<usize> {
        self.records
            .units
            .iter()
            .position(|unit| unit.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn modify_unit(
        &mut self,
        id: &str,
        edit: impl FnOnce(&mut Unit, DateTime<Utc>) -> Result<(), ValidationError>,
    ) -> StoreResult<()> {
        let position = self.position_of(id)?;
        let mut candidate = self.records.units[position].clone();
        let checked = edit(&mut candidate, now_utc()).and_then(|()| candidate.validate());
        if let Err(err) = checked {
            warn!("event=unit_update module=store status=rejected unit_id={id} reason={err}");
            return Err(err.into());
        }

        self.records.units[position] = candidate;
        info!("event=unit_update module=store status=ok unit_id={id}");
        self.commit(Touched::Units, Mutation::UnitUpdated(id.to_string()));
        Ok(())
    }

    fn prepare_increase(
        &self,
        unit_id: &str,
        old_amount: f64,
        new_amount: f64,
        justification: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(usize, RentIncreaseEvent), ValidationError> {
        let position = self
            .records
            .units
            .iter()
            .position(|unit| unit.id == unit_id)
            .ok_or_else(|| ValidationError::UnknownUnit(unit_id.to_string()))?;
        if self.records.units[position].rent_amount.is_none() {
            return Err(ValidationError::NoCurrentRent(unit_id.to_string()));
        }
        let event = RentIncreaseEvent::new(unit_id, old_amount, new_amount, justification, now)?;
        Ok((position, event))
    }

    fn commit(&mut self, touched: Touched, mutation: Mutation) {
        self.persist(touched);
        self.run_hooks(&mutation);
    }

    fn persist(&mut self, touched: Touched) {
        log_save_failure(
            "units",
            record_repo::save_units(&mut self.repo, &self.records.units),
        );
        if matches!(touched, Touched::Both) {
            log_save_failure(
                "events",
                record_repo::save_events(&mut self.repo, &self.records.events),
            );
        }
    }

    fn run_hooks(&mut self, mutation: &Mutation) {
        for hook in &mut self.hooks {
            if let Err(err) = hook.after_mutation(mutation, &self.records, &mut self.repo) {
                error!(
                    "event=mutation_hook module=store status=error hook={} mutation={} error={err}",
                    hook.name(),
                    mutation.kind()
                );
            }
        }
    }
}

fn log_save_failure(collection: &str, result: RepoResult<()>) {
    if let Err(err) = result {
        error!(
            "event=records_save module=store status=error collection={collection} error={err}"
        );
    }
}
