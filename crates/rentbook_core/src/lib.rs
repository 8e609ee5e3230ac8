//! Core of the rentbook property record keeper.
//! This crate is the single source of truth for unit, rent and backup rules.

pub mod backup;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod stats;

pub use backup::{decode_backup, encode_backup, AutoBackupHook, BackupSnapshot, DecodeError};
pub use config::{AutoBackupPolicy, StoreConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::rent_increase::RentIncreaseEvent;
pub use model::unit::{DepositStatus, NewUnit, OccupancyStatus, Unit, UnitPatch, ValidationError};
pub use model::RecordId;
pub use repo::kv_repo::{KvRepository, RepoError, RepoResult, SqliteKvRepository};
pub use service::record_store::{
    Mutation, MutationHook, RecordSet, RecordStore, RestoreSummary, StoreError, StoreResult,
};
pub use stats::{IncomeBucket, IncomePeriod, OccupancyStats};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
