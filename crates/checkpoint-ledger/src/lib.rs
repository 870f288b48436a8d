//! # Checkpoint Ledger
//!
//! Durable progress tracking for a blockchain indexer. Each processor
//! records the last transaction version it fully committed and resumes
//! from the next one. Bounded backfill runs keep their own checkpoints,
//! and the ledger maintains the account to auth key to public key
//! associations that key rotations produce.
//!
//! ## Architecture
//!
//! ```text
//! ingestion loop ──resolve_range──→ ┐
//!                                    ├──→ LedgerService ──atomic batch──→ KeyValueStore
//! ingestion loop ──commit_batch───→ ┘        │
//!                                     chain id guard
//! ```
//!
//! ## Invariants
//!
//! | Invariant | Description |
//! |-----------|-------------|
//! | Monotonic checkpoints | A stored version never decreases; older writes are no-ops |
//! | Chain guard | No write before the stored chain id is verified |
//! | Atomic batches | Checkpoint advance and identity rows land together or not at all |
//! | Backfill isolation | Backfills never read or write live checkpoints |
//! | Newest identity fact wins | Identity rows only move to a strictly newer version |
//! | Integrity | Every stored record is checksummed and verified on read |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Rows, outcomes, identity events, key layout, errors
//! - `ports/` - Inbound API traits, outbound storage and infra traits
//! - `adapters/` - Stores, serializer, checksum, clock, process lock
//! - `service/` - `LedgerService` and the thread-safe `SharedLedger`
//! - `config` / `wiring` - `LedgerConfig` and `open_ledger`
//!
//! ## Usage
//!
//! ```ignore
//! use checkpoint_ledger::{open_ledger, LedgerConfig};
//!
//! let opened = open_ledger(&LedgerConfig::from_env())?;
//! opened.ledger.initialize_or_verify(chain_id)?;
//!
//! let range = opened.ledger.resolve_range("user_txn", &mode)?;
//! // ... process a batch ...
//! opened.ledger.commit_batch("user_txn", &mode, batch, &identity)?;
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;
pub mod wiring;

// Re-export key types for convenience
pub use config::{LedgerConfig, StoreBackend};
pub use domain::entities::{
    backfill_alias, AccountAuthKeyLink, AdvanceOutcome, ApplyOutcome, AuthKeyPublicKeyLink,
    BackfillCheckpoint, BackfillPlan, BackfillStatus, BatchOutcome, ChainLedgerInfo,
    CheckpointOutcome, ProcessorCheckpoint,
};
pub use domain::errors::{EventDecodeError, KVStoreError, LedgerError};
pub use domain::identity::{AuthKeyEvent, IdentityBatch, IdentityEvent, PublicKeyMembership};
pub use domain::keys::KeyPrefix;
pub use domain::multi_key::{AnyPublicKey, MultiKey};
pub use domain::rotation::{KeyRotationEvent, PublicKeyScheme};
pub use ports::inbound::{
    BackfillCoordinatorApi, ChainLedgerApi, CheckpointStoreApi, IdentityRotationApi, RunModeApi,
};
pub use ports::outbound::{
    BatchOperation, ChecksumProvider, KeyValueStore, RecordSerializer, TimeSource,
};
pub use service::{InMemoryLedger, LedgerDependencies, LedgerService, SharedLedger};
pub use wiring::{open_ledger, ConfiguredLedger, OpenedLedger};

pub use shared_types::{BatchMetadata, ChainId, RunMode, Timestamp, Version, VersionRange};
