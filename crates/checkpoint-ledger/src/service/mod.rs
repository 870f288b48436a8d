//! # Ledger Service
//!
//! The main service implementing the ledger API.
//!
//! ## Architecture
//!
//! This service:
//! 1. Implements `ChainLedgerApi`, `CheckpointStoreApi`, `BackfillCoordinatorApi`
//!    and `IdentityRotationApi` over one key-value store
//! 2. Implements `RunModeApi`, committing a batch's checkpoint advance and
//!    identity rows in a single atomic write
//! 3. Uses dependency injection for all external dependencies
//!
//! Every mutation is staged into a `WriteSet` first; single operations and
//! whole batches commit the same way.

mod backfill;
mod chain;
mod checkpoint;
mod identity;
mod records;
mod run_mode;
mod shared;

pub use shared::SharedLedger;

use std::collections::HashMap;

use shared_types::{ChainId, Version};

use crate::adapters::{
    BincodeRecordSerializer, DefaultChecksumProvider, InMemoryKVStore, SystemTimeSource,
};
use crate::domain::entities::{LayoutMarker, LAYOUT_VERSION};
use crate::domain::errors::LedgerError;
use crate::domain::keys::KeyPrefix;
use crate::ports::outbound::{ChecksumProvider, KeyValueStore, RecordSerializer, TimeSource};

pub(crate) use records::{Table, WriteSet};

/// A backfill run registered by `start_or_resume` in this process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BackfillRun {
    pub initial_version: Version,
    pub ending_version: Option<Version>,
    pub overwrite_checkpoint: bool,
}

/// The checkpoint ledger service.
pub struct LedgerService<KV, CS, TS, RS>
where
    KV: KeyValueStore,
    CS: ChecksumProvider,
    TS: TimeSource,
    RS: RecordSerializer,
{
    /// Key-value store for persistence.
    pub(crate) kv_store: KV,
    /// Checksum appended to every record.
    pub(crate) checksum: CS,
    /// Clock for `last_updated_at`.
    pub(crate) time_source: TS,
    /// Record encoding.
    pub(crate) serializer: RS,
    /// Chain id confirmed by `initialize_or_verify` in this process.
    pub(crate) verified_chain: Option<ChainId>,
    /// Backfill runs started in this process, by alias.
    pub(crate) backfills: HashMap<String, BackfillRun>,
}

/// Dependencies for LedgerService
pub struct LedgerDependencies<KV, CS, TS, RS> {
    pub kv_store: KV,
    pub checksum: CS,
    pub time_source: TS,
    pub serializer: RS,
}

/// Service over the in-memory store with default adapters.
pub type InMemoryLedger =
    LedgerService<InMemoryKVStore, DefaultChecksumProvider, SystemTimeSource, BincodeRecordSerializer>;

impl<KV, CS, TS, RS> LedgerService<KV, CS, TS, RS>
where
    KV: KeyValueStore,
    CS: ChecksumProvider,
    TS: TimeSource,
    RS: RecordSerializer,
{
    /// Create a ledger service over the given dependencies.
    ///
    /// Writes the layout marker into an empty store and refuses a store
    /// created with a different layout.
    pub fn new(deps: LedgerDependencies<KV, CS, TS, RS>) -> Result<Self, LedgerError> {
        let mut service = Self {
            kv_store: deps.kv_store,
            checksum: deps.checksum,
            time_source: deps.time_source,
            serializer: deps.serializer,
            verified_chain: None,
            backfills: HashMap::new(),
        };
        service.ensure_layout()?;
        Ok(service)
    }

    fn ensure_layout(&mut self) -> Result<(), LedgerError> {
        let key = KeyPrefix::layout_key();
        match self.read_record::<LayoutMarker>(&key)? {
            Some(marker) if marker.layout_version == LAYOUT_VERSION => Ok(()),
            Some(marker) => {
                tracing::error!(
                    stored = marker.layout_version,
                    expected = LAYOUT_VERSION,
                    "[ledger] Store layout mismatch"
                );
                Err(LedgerError::LayoutMismatch {
                    stored: marker.layout_version,
                    expected: LAYOUT_VERSION,
                })
            }
            None => {
                let mut writes = WriteSet::new();
                writes.put(
                    key,
                    self.encode_record(&LayoutMarker {
                        layout_version: LAYOUT_VERSION,
                    })?,
                );
                self.commit(writes)?;
                tracing::info!(layout = LAYOUT_VERSION, "[ledger] 📁 Initialized empty store");
                Ok(())
            }
        }
    }

    /// Fails with `ChainNotVerified` until `initialize_or_verify` succeeded.
    pub(crate) fn ensure_chain_verified(&self) -> Result<ChainId, LedgerError> {
        self.verified_chain.ok_or(LedgerError::ChainNotVerified)
    }

    /// Borrow the underlying store.
    pub fn kv_store(&self) -> &KV {
        &self.kv_store
    }

    /// Chain id confirmed in this process, if any.
    pub fn verified_chain_id(&self) -> Option<ChainId> {
        self.verified_chain
    }
}

impl InMemoryLedger {
    /// In-memory ledger for tests and testing-mode replays.
    pub fn new_in_memory() -> Result<Self, LedgerError> {
        Self::new(LedgerDependencies {
            kv_store: InMemoryKVStore::new(),
            checksum: DefaultChecksumProvider,
            time_source: SystemTimeSource,
            serializer: BincodeRecordSerializer,
        })
    }
}
