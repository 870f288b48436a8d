//! # Live Checkpoints
//!
//! One row per processor name, advanced monotonically.

use shared_types::{Timestamp, Version};

use super::{LedgerService, Table, WriteSet};
use crate::domain::entities::{AdvanceOutcome, ProcessorCheckpoint};
use crate::domain::errors::LedgerError;
use crate::domain::keys::KeyPrefix;
use crate::ports::inbound::CheckpointStoreApi;
use crate::ports::outbound::{ChecksumProvider, KeyValueStore, RecordSerializer, TimeSource};

impl<KV, CS, TS, RS> LedgerService<KV, CS, TS, RS>
where
    KV: KeyValueStore,
    CS: ChecksumProvider,
    TS: TimeSource,
    RS: RecordSerializer,
{
    /// Stage a live checkpoint advance.
    pub(crate) fn stage_processor_advance(
        &self,
        processor_name: &str,
        new_version: Version,
        transaction_timestamp: Option<Timestamp>,
        writes: &mut WriteSet,
    ) -> Result<AdvanceOutcome, LedgerError> {
        let key = KeyPrefix::processor_key(processor_name)?;

        if let Some(existing) = self.read_record::<ProcessorCheckpoint>(&key)? {
            if new_version <= existing.last_success_version {
                tracing::debug!(
                    processor = processor_name,
                    version = new_version,
                    stored = existing.last_success_version,
                    "[ledger] Ignoring stale checkpoint advance"
                );
                writes.stale(Table::ProcessorCheckpoint);
                return Ok(AdvanceOutcome::Stale);
            }
        }

        let row = ProcessorCheckpoint {
            processor_name: processor_name.to_string(),
            last_success_version: new_version,
            last_updated_at: self.time_source.now(),
            last_transaction_timestamp: transaction_timestamp,
        };
        writes.put(key, self.encode_record(&row)?);
        writes.checkpoint_advanced("default");
        Ok(AdvanceOutcome::Advanced)
    }
}

impl<KV, CS, TS, RS> CheckpointStoreApi for LedgerService<KV, CS, TS, RS>
where
    KV: KeyValueStore,
    CS: ChecksumProvider,
    TS: TimeSource,
    RS: RecordSerializer,
{
    fn get_resume_version(
        &self,
        processor_name: &str,
        configured_initial_version: Version,
    ) -> Result<Version, LedgerError> {
        Ok(match self.checkpoint(processor_name)? {
            Some(row) => row.last_success_version.saturating_add(1),
            None => configured_initial_version,
        })
    }

    fn advance(
        &mut self,
        processor_name: &str,
        new_version: Version,
        transaction_timestamp: Option<Timestamp>,
    ) -> Result<AdvanceOutcome, LedgerError> {
        self.ensure_chain_verified()?;

        let mut writes = WriteSet::new();
        let outcome =
            self.stage_processor_advance(processor_name, new_version, transaction_timestamp, &mut writes)?;
        self.commit(writes)?;

        if outcome == AdvanceOutcome::Advanced {
            tracing::debug!(
                processor = processor_name,
                version = new_version,
                "[ledger] Checkpoint advanced"
            );
        }
        Ok(outcome)
    }

    fn checkpoint(&self, processor_name: &str) -> Result<Option<ProcessorCheckpoint>, LedgerError> {
        self.read_record(&KeyPrefix::processor_key(processor_name)?)
    }
}
