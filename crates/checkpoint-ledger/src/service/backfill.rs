//! # Backfill Coordination
//!
//! Backfill rows live under their own prefix and never touch live
//! checkpoints. A run registered by `start_or_resume` carries its ending
//! version; an unregistered alias falls back to its stored row.

use shared_types::{Timestamp, Version};

use super::{BackfillRun, LedgerService, Table, WriteSet};
use crate::domain::entities::{AdvanceOutcome, BackfillCheckpoint, BackfillPlan, BackfillStatus};
use crate::domain::errors::LedgerError;
use crate::domain::keys::KeyPrefix;
use crate::ports::inbound::BackfillCoordinatorApi;
use crate::ports::outbound::{ChecksumProvider, KeyValueStore, RecordSerializer, TimeSource};

impl<KV, CS, TS, RS> LedgerService<KV, CS, TS, RS>
where
    KV: KeyValueStore,
    CS: ChecksumProvider,
    TS: TimeSource,
    RS: RecordSerializer,
{
    /// Stage a backfill checkpoint advance.
    pub(crate) fn stage_backfill_advance(
        &self,
        alias: &str,
        new_version: Version,
        transaction_timestamp: Option<Timestamp>,
        writes: &mut WriteSet,
    ) -> Result<AdvanceOutcome, LedgerError> {
        let key = KeyPrefix::backfill_key(alias)?;
        let existing = self.read_record::<BackfillCheckpoint>(&key)?;
        let run = self.backfills.get(alias);

        let (initial_version, ending_version, overwrite_checkpoint) = match (run, &existing) {
            (Some(run), _) => (
                run.initial_version,
                run.ending_version,
                run.overwrite_checkpoint,
            ),
            (None, Some(row)) => (
                row.backfill_start_version,
                row.ending_version,
                row.overwrite_checkpoint,
            ),
            (None, None) => {
                return Err(LedgerError::BackfillNotStarted {
                    alias: alias.to_string(),
                })
            }
        };

        if let Some(end) = ending_version {
            if new_version > end {
                tracing::info!(
                    alias,
                    version = new_version,
                    ending_version = end,
                    "[ledger] Backfill reached its ending version"
                );
                return Err(LedgerError::PastEndingVersion {
                    alias: alias.to_string(),
                    version: new_version,
                    ending_version: end,
                });
            }
        }

        let last_success = existing.as_ref().and_then(|row| row.last_success_version);
        if let Some(last) = last_success {
            if new_version <= last {
                tracing::debug!(
                    alias,
                    version = new_version,
                    stored = last,
                    "[ledger] Ignoring stale backfill advance"
                );
                writes.stale(Table::BackfillCheckpoint);
                return Ok(AdvanceOutcome::Stale);
            }
        }

        let complete = ending_version.map_or(false, |end| new_version >= end);
        let row = BackfillCheckpoint {
            backfill_alias: alias.to_string(),
            backfill_status: if complete {
                BackfillStatus::Complete
            } else {
                BackfillStatus::InProgress
            },
            last_success_version: Some(new_version),
            last_updated_at: self.time_source.now(),
            last_transaction_timestamp: transaction_timestamp,
            backfill_start_version: initial_version,
            ending_version,
            overwrite_checkpoint,
        };

        writes.put(key, self.encode_record(&row)?);
        writes.checkpoint_advanced("backfill");
        if complete && !existing.as_ref().map_or(false, BackfillCheckpoint::is_complete) {
            writes.backfill_completed(alias);
        }
        Ok(AdvanceOutcome::Advanced)
    }
}

impl<KV, CS, TS, RS> BackfillCoordinatorApi for LedgerService<KV, CS, TS, RS>
where
    KV: KeyValueStore,
    CS: ChecksumProvider,
    TS: TimeSource,
    RS: RecordSerializer,
{
    fn start_or_resume(
        &mut self,
        backfill_alias: &str,
        initial_starting_version: Version,
        ending_version: Option<Version>,
        overwrite_checkpoint: bool,
    ) -> Result<BackfillPlan, LedgerError> {
        let key = KeyPrefix::backfill_key(backfill_alias)?;
        let existing = self.read_record::<BackfillCheckpoint>(&key)?;

        let (start_version, resumed) = if overwrite_checkpoint {
            self.ensure_chain_verified()?;

            if let Some(last) = existing.as_ref().and_then(|row| row.last_success_version) {
                tracing::warn!(
                    alias = backfill_alias,
                    discarded = last,
                    start = initial_starting_version,
                    "[ledger] Overwriting backfill checkpoint"
                );
            }

            let row = BackfillCheckpoint {
                backfill_alias: backfill_alias.to_string(),
                backfill_status: BackfillStatus::InProgress,
                last_success_version: None,
                last_updated_at: self.time_source.now(),
                last_transaction_timestamp: None,
                backfill_start_version: initial_starting_version,
                ending_version,
                overwrite_checkpoint,
            };
            let mut writes = WriteSet::new();
            writes.put(key, self.encode_record(&row)?);
            self.commit(writes)?;
            (initial_starting_version, false)
        } else {
            match existing.as_ref().and_then(BackfillCheckpoint::next_version) {
                Some(next) if next > initial_starting_version => {
                    tracing::warn!(
                        alias = backfill_alias,
                        configured = initial_starting_version,
                        resume = next,
                        "[ledger] ⚠️ Resuming backfill from stored progress; configured starting \
                         version is NOT respected. Set overwrite_checkpoint to start over."
                    );
                    (next, true)
                }
                _ => (initial_starting_version, false),
            }
        };

        self.backfills.insert(
            backfill_alias.to_string(),
            BackfillRun {
                initial_version: initial_starting_version,
                ending_version,
                overwrite_checkpoint,
            },
        );

        let plan = BackfillPlan {
            alias: backfill_alias.to_string(),
            start_version,
            end_version: ending_version,
            resumed,
        };

        if plan.is_finished() {
            tracing::info!(
                alias = backfill_alias,
                start = start_version,
                "[ledger] Backfill already complete, nothing to process"
            );
        } else {
            tracing::info!(
                alias = backfill_alias,
                start = start_version,
                end = ?ending_version,
                "[ledger] Backfill started"
            );
        }
        Ok(plan)
    }

    fn advance_backfill(
        &mut self,
        backfill_alias: &str,
        new_version: Version,
        transaction_timestamp: Option<Timestamp>,
    ) -> Result<AdvanceOutcome, LedgerError> {
        self.ensure_chain_verified()?;

        let mut writes = WriteSet::new();
        let outcome = self.stage_backfill_advance(
            backfill_alias,
            new_version,
            transaction_timestamp,
            &mut writes,
        )?;
        self.commit(writes)?;
        Ok(outcome)
    }

    fn backfill(&self, backfill_alias: &str) -> Result<Option<BackfillCheckpoint>, LedgerError> {
        self.read_record(&KeyPrefix::backfill_key(backfill_alias)?)
    }
}
