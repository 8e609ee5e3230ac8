//! Session configuration for the record store.
//!
//! # Responsibility
//! - Carry the knobs a host chooses when opening a store session.
//!
//! # Invariants
//! - `StoreConfig::default()` refreshes the backup snapshot after every
//!   mutation.

use std::time::Duration;

/// How often the standing backup snapshot is refreshed after writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AutoBackupPolicy {
    /// Refresh after every successful mutation.
    #[default]
    EveryMutation,
    /// Refresh at most once per interval; mutations inside the window
    /// are covered by the next refresh.
    Throttled(Duration),
    /// Only explicit `create_backup` calls write a snapshot.
    Disabled,
}

/// Options applied by `RecordStore::open`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreConfig {
    pub auto_backup: AutoBackupPolicy,
}

impl StoreConfig {
    /// Config with no post-mutation backup refresh.
    pub fn without_auto_backup() -> Self {
        Self {
            auto_backup: AutoBackupPolicy::Disabled,
        }
    }
}
