//! # Chain Id Guard

use ledger_telemetry::{metric_inc, CHAIN_VERIFICATIONS};
use shared_types::ChainId;

use super::{LedgerService, WriteSet};
use crate::domain::entities::ChainLedgerInfo;
use crate::domain::errors::LedgerError;
use crate::domain::keys::KeyPrefix;
use crate::ports::inbound::ChainLedgerApi;
use crate::ports::outbound::{ChecksumProvider, KeyValueStore, RecordSerializer, TimeSource};

impl<KV, CS, TS, RS> ChainLedgerApi for LedgerService<KV, CS, TS, RS>
where
    KV: KeyValueStore,
    CS: ChecksumProvider,
    TS: TimeSource,
    RS: RecordSerializer,
{
    fn initialize_or_verify(&mut self, chain_id: ChainId) -> Result<(), LedgerError> {
        let key = KeyPrefix::chain_key();

        match self.read_record::<ChainLedgerInfo>(&key)? {
            None => {
                let mut writes = WriteSet::new();
                writes.put(key, self.encode_record(&ChainLedgerInfo { chain_id })?);
                self.commit(writes)?;
                metric_inc!(CHAIN_VERIFICATIONS, &["initialized"]);
                tracing::info!(chain_id, "[ledger] 🔗 Chain id recorded");
            }
            Some(stored) if stored.chain_id == chain_id => {
                metric_inc!(CHAIN_VERIFICATIONS, &["verified"]);
                tracing::info!(chain_id, "[ledger] 🔗 Chain id verified");
            }
            Some(stored) => {
                metric_inc!(CHAIN_VERIFICATIONS, &["mismatch"]);
                tracing::error!(
                    stored = stored.chain_id,
                    attempted = chain_id,
                    "[ledger] Chain id mismatch, refusing to ingest"
                );
                return Err(LedgerError::ChainMismatch {
                    stored: stored.chain_id,
                    attempted: chain_id,
                });
            }
        }

        self.verified_chain = Some(chain_id);
        Ok(())
    }

    fn chain_id(&self) -> Result<Option<ChainId>, LedgerError> {
        Ok(self
            .read_record::<ChainLedgerInfo>(&KeyPrefix::chain_key())?
            .map(|info| info.chain_id))
    }
}
