//! # Outbound Ports (Driven Ports)
//!
//! Dependencies required by the ledger service. Adapters live in
//! `crate::adapters`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::Timestamp;

use crate::domain::errors::{KVStoreError, SerializationError};

/// Result of a prefix scan: `(key, value)` pairs.
pub type ScanResult = Vec<(Vec<u8>, Vec<u8>)>;

/// Abstract interface for key-value database operations.
///
/// Production: `RocksDbStore` (feature `rocksdb`) or `FileBackedKVStore`
/// Testing: `InMemoryKVStore`
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError>;

    /// Execute an atomic batch write.
    ///
    /// Either ALL operations in the batch succeed, or NONE are applied.
    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError>;

    /// All entries whose key starts with `prefix`, in ascending key order.
    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError>;
}

/// Batch operation for atomic writes. Ledger rows are only ever upserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOperation {
    /// Put a key-value pair.
    Put { key: Vec<u8>, value: Vec<u8> },
}

impl BatchOperation {
    /// Create a Put operation.
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Put {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Checksum over encoded records.
pub trait ChecksumProvider: Send + Sync {
    fn compute_crc32(&self, data: &[u8]) -> u32;

    fn verify_crc32(&self, data: &[u8], expected: u32) -> bool {
        self.compute_crc32(data) == expected
    }
}

/// Abstract interface for time operations (for testability).
pub trait TimeSource: Send + Sync {
    /// Get current timestamp in seconds since epoch.
    fn now(&self) -> Timestamp;
}

/// Encoding of persisted records.
pub trait RecordSerializer: Send + Sync {
    fn serialize<T: Serialize>(&self, record: &T) -> Result<Vec<u8>, SerializationError>;

    fn deserialize<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, SerializationError>;
}
