use crate::domain::errors::KVStoreError;
use crate::ports::outbound::{BatchOperation, KeyValueStore, ScanResult};

use super::{FileBackedKVStore, InMemoryKVStore};
#[cfg(feature = "rocksdb")]
use super::RocksDbStore;

/// Store chosen at runtime from `LedgerConfig::backend`.
pub enum ConfiguredStore {
    Memory(InMemoryKVStore),
    File(FileBackedKVStore),
    #[cfg(feature = "rocksdb")]
    RocksDb(RocksDbStore),
}

macro_rules! dispatch {
    ($self:expr, $store:ident => $body:expr) => {
        match $self {
            ConfiguredStore::Memory($store) => $body,
            ConfiguredStore::File($store) => $body,
            #[cfg(feature = "rocksdb")]
            ConfiguredStore::RocksDb($store) => $body,
        }
    };
}

impl ConfiguredStore {
    pub fn backend_name(&self) -> &'static str {
        match self {
            ConfiguredStore::Memory(_) => "memory",
            ConfiguredStore::File(_) => "file",
            #[cfg(feature = "rocksdb")]
            ConfiguredStore::RocksDb(_) => "rocksdb",
        }
    }
}

impl KeyValueStore for ConfiguredStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        dispatch!(self, store => store.get(key))
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        dispatch!(self, store => store.atomic_batch_write(operations))
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError> {
        dispatch!(self, store => store.prefix_scan(prefix))
    }
}
