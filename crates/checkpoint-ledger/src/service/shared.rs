//! # Shared Ledger Handle
//!
//! Live and backfill workers run on separate threads against one store.
//! Each call holds the lock for its own read-compare-write section only.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use shared_types::{BatchMetadata, ChainId, RunMode, VersionRange};

use super::LedgerService;
use crate::domain::entities::BatchOutcome;
use crate::domain::errors::LedgerError;
use crate::domain::identity::IdentityBatch;
use crate::ports::inbound::{ChainLedgerApi, RunModeApi};
use crate::ports::outbound::{ChecksumProvider, KeyValueStore, RecordSerializer, TimeSource};

/// Cloneable, thread-safe handle to a `LedgerService`.
pub struct SharedLedger<KV, CS, TS, RS>
where
    KV: KeyValueStore,
    CS: ChecksumProvider,
    TS: TimeSource,
    RS: RecordSerializer,
{
    inner: Arc<Mutex<LedgerService<KV, CS, TS, RS>>>,
}

impl<KV, CS, TS, RS> Clone for SharedLedger<KV, CS, TS, RS>
where
    KV: KeyValueStore,
    CS: ChecksumProvider,
    TS: TimeSource,
    RS: RecordSerializer,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<KV, CS, TS, RS> SharedLedger<KV, CS, TS, RS>
where
    KV: KeyValueStore,
    CS: ChecksumProvider,
    TS: TimeSource,
    RS: RecordSerializer,
{
    pub fn new(service: LedgerService<KV, CS, TS, RS>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }

    /// Exclusive access for calls not delegated below.
    pub fn lock(&self) -> MutexGuard<'_, LedgerService<KV, CS, TS, RS>> {
        self.inner.lock()
    }

    pub fn initialize_or_verify(&self, chain_id: ChainId) -> Result<(), LedgerError> {
        self.inner.lock().initialize_or_verify(chain_id)
    }

    pub fn resolve_range(
        &self,
        processor_name: &str,
        mode: &RunMode,
    ) -> Result<VersionRange, LedgerError> {
        self.inner.lock().resolve_range(processor_name, mode)
    }

    pub fn commit_batch(
        &self,
        processor_name: &str,
        mode: &RunMode,
        batch: BatchMetadata,
        identity: &IdentityBatch,
    ) -> Result<BatchOutcome, LedgerError> {
        self.inner
            .lock()
            .commit_batch(processor_name, mode, batch, identity)
    }
}
