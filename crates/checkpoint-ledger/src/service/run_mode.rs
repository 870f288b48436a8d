//! # Run Modes and Batch Commit
//!
//! A processed batch lands as one atomic write: the checkpoint of the
//! processor's run mode plus the batch's identity rows. Testing mode never
//! touches checkpoints.

use shared_types::{BatchMetadata, RunMode, VersionRange};

use super::{LedgerService, WriteSet};
use crate::domain::entities::{backfill_alias, ApplyOutcome, BatchOutcome, CheckpointOutcome};
use crate::domain::errors::LedgerError;
use crate::domain::identity::IdentityBatch;
use crate::ports::inbound::{BackfillCoordinatorApi, CheckpointStoreApi, RunModeApi};
use crate::ports::outbound::{ChecksumProvider, KeyValueStore, RecordSerializer, TimeSource};

impl<KV, CS, TS, RS> RunModeApi for LedgerService<KV, CS, TS, RS>
where
    KV: KeyValueStore,
    CS: ChecksumProvider,
    TS: TimeSource,
    RS: RecordSerializer,
{
    fn resolve_range(
        &mut self,
        processor_name: &str,
        mode: &RunMode,
    ) -> Result<VersionRange, LedgerError> {
        let range = match mode {
            RunMode::Default(config) => VersionRange::unbounded(
                self.get_resume_version(processor_name, config.initial_starting_version)?,
            ),
            RunMode::Backfill(config) => self
                .start_or_resume(
                    &backfill_alias(processor_name, &config.backfill_id),
                    config.initial_starting_version,
                    config.ending_version,
                    config.overwrite_checkpoint,
                )?
                .range(),
            RunMode::Testing(config) => VersionRange::bounded(
                config.override_starting_version,
                config
                    .ending_version
                    .unwrap_or(config.override_starting_version),
            ),
        };

        tracing::info!(
            processor = processor_name,
            mode = mode.label(),
            start = range.start,
            end = ?range.end,
            "[ledger] Resolved processing range"
        );
        Ok(range)
    }

    fn commit_batch(
        &mut self,
        processor_name: &str,
        mode: &RunMode,
        batch: BatchMetadata,
        identity: &IdentityBatch,
    ) -> Result<BatchOutcome, LedgerError> {
        self.ensure_chain_verified()?;

        let mut writes = WriteSet::new();
        let checkpoint: CheckpointOutcome = match mode {
            RunMode::Default(_) => self
                .stage_processor_advance(
                    processor_name,
                    batch.end_version,
                    batch.end_transaction_timestamp,
                    &mut writes,
                )?
                .into(),
            RunMode::Backfill(config) => self
                .stage_backfill_advance(
                    &backfill_alias(processor_name, &config.backfill_id),
                    batch.end_version,
                    batch.end_transaction_timestamp,
                    &mut writes,
                )?
                .into(),
            RunMode::Testing(_) => CheckpointOutcome::Skipped,
        };

        let mut identity_applied = 0;
        let mut identity_stale = 0;
        for event in identity.coalesced() {
            match self.stage_identity_event(&event, &mut writes)? {
                ApplyOutcome::Applied => identity_applied += 1,
                ApplyOutcome::Stale => identity_stale += 1,
            }
        }

        let operations = writes.len();
        self.commit(writes)?;

        tracing::debug!(
            processor = processor_name,
            mode = mode.label(),
            start = batch.start_version,
            end = batch.end_version,
            operations,
            identity_applied,
            identity_stale,
            "[ledger] Batch committed"
        );

        Ok(BatchOutcome {
            checkpoint,
            identity_applied,
            identity_stale,
        })
    }
}
