//! # Adapters Module
//!
//! - `storage`: in-memory, file-backed and RocksDB key-value stores
//! - `infra`: checksum and clock
//! - `serializer`: bincode record encoding
//! - `lock`: data directory process lock

pub mod infra;
pub mod lock;
pub mod serializer;
pub mod storage;

pub use infra::{DefaultChecksumProvider, ManualTimeSource, SystemTimeSource};
pub use lock::{DatabaseLock, LockError};
pub use serializer::BincodeRecordSerializer;
pub use storage::{ConfiguredStore, FileBackedKVStore, InMemoryKVStore};
#[cfg(feature = "rocksdb")]
pub use storage::{RocksDbConfig, RocksDbStore};
