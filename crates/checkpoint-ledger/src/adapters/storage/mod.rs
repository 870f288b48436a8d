//! Storage Adapters
//!
//! Implementations of the `KeyValueStore` trait.

mod configured;
mod file;
mod memory;
#[cfg(feature = "rocksdb")]
mod rocksdb;

pub use configured::ConfiguredStore;
pub use file::FileBackedKVStore;
pub use memory::InMemoryKVStore;
#[cfg(feature = "rocksdb")]
pub use self::rocksdb::{RocksDbConfig, RocksDbStore};
