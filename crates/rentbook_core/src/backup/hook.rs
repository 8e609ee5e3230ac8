//! Post-mutation hook that keeps the standing backup snapshot fresh.

use crate::backup::write_backup;
use crate::model::timestamp::now_utc;
use crate::repo::kv_repo::KvRepository;
use crate::service::record_store::{Mutation, MutationHook, RecordSet, StoreResult};
use log::debug;
use std::time::{Duration, Instant};

/// Rewrites the `last-backup` snapshot after mutations.
///
/// With a throttle interval, a refresh is skipped while the previous one
/// is younger than the interval.
#[derive(Debug, Default)]
pub struct AutoBackupHook {
    min_interval: Option<Duration>,
    last_run: Option<Instant>,
}

impl AutoBackupHook {
    /// Refreshes after every mutation.
    pub fn every_mutation() -> Self {
        Self::default()
    }

    /// Refreshes at most once per `min_interval`.
    pub fn throttled(min_interval: Duration) -> Self {
        Self {
            min_interval: Some(min_interval),
            last_run: None,
        }
    }

    fn due(&self, now: Instant) -> bool {
        match (self.min_interval, self.last_run) {
            (Some(interval), Some(last_run)) => now.duration_since(last_run) >= interval,
            _ => true,
        }
    }
}

impl<R: KvRepository> MutationHook<R> for AutoBackupHook {
    fn name(&self) -> &'static str {
        "auto_backup"
    }

    fn after_mutation(
        &mut self,
        mutation: &Mutation,
        records: &RecordSet,
        repo: &mut R,
    ) -> StoreResult<()> {
        let started = Instant::now();
        if !self.due(started) {
            debug!(
                "event=auto_backup module=backup status=skipped reason=throttled mutation={}",
                mutation.kind()
            );
            return Ok(());
        }

        write_backup(repo, &records.units, &records.events, now_utc())?;
        self.last_run = Some(started);
        Ok(())
    }
}
