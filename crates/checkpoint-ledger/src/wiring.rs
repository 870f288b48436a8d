//! # Ledger Wiring
//!
//! Builds a ready-to-use ledger from `LedgerConfig`: creates the data
//! directory, takes its process lock and opens the configured store.

use crate::adapters::{
    BincodeRecordSerializer, ConfiguredStore, DatabaseLock, DefaultChecksumProvider,
    FileBackedKVStore, InMemoryKVStore, SystemTimeSource,
};
use crate::config::{LedgerConfig, StoreBackend};
use crate::domain::errors::LedgerError;
use crate::service::{LedgerDependencies, LedgerService, SharedLedger};

/// File name of the file-backed store inside the data directory.
pub const FILE_STORE_NAME: &str = "ledger.db";

/// Directory of the RocksDB store inside the data directory.
pub const ROCKSDB_DIR_NAME: &str = "rocksdb";

/// Shared ledger over the store chosen by configuration.
pub type ConfiguredLedger = SharedLedger<
    ConfiguredStore,
    DefaultChecksumProvider,
    SystemTimeSource,
    BincodeRecordSerializer,
>;

/// An opened ledger and the lock guarding its data directory.
///
/// The lock is released when this value is dropped.
pub struct OpenedLedger {
    pub ledger: ConfiguredLedger,
    pub lock: Option<DatabaseLock>,
}

/// Open the ledger described by `config`.
///
/// # Errors
///
/// - `DatabaseLocked` if another process holds the data directory
/// - `Database` if the directory or store cannot be opened
/// - `LayoutMismatch` / `DataCorruption` for an incompatible or damaged store
pub fn open_ledger(config: &LedgerConfig) -> Result<OpenedLedger, LedgerError> {
    let lock = if config.backend.is_persistent() {
        std::fs::create_dir_all(&config.data_dir).map_err(|e| LedgerError::Database {
            message: format!(
                "Failed to create data directory {}: {}",
                config.data_dir.display(),
                e
            ),
        })?;
        Some(DatabaseLock::acquire_with_timeout(
            &config.data_dir,
            config.lock_timeout,
        )?)
    } else {
        None
    };

    if let Err(e) = ledger_telemetry::register_metrics() {
        tracing::warn!(error = %e, "[ledger] Metrics registration failed");
    }

    let store = open_store(config)?;
    tracing::info!(
        backend = store.backend_name(),
        data_dir = %config.data_dir.display(),
        "[ledger] Opening checkpoint ledger"
    );

    let service = LedgerService::new(LedgerDependencies {
        kv_store: store,
        checksum: DefaultChecksumProvider,
        time_source: SystemTimeSource,
        serializer: BincodeRecordSerializer,
    })?;

    Ok(OpenedLedger {
        ledger: SharedLedger::new(service),
        lock,
    })
}

fn open_store(config: &LedgerConfig) -> Result<ConfiguredStore, LedgerError> {
    match config.backend {
        StoreBackend::Memory => Ok(ConfiguredStore::Memory(InMemoryKVStore::new())),
        StoreBackend::File => {
            let store = FileBackedKVStore::open(config.data_dir.join(FILE_STORE_NAME))?
                .with_sync_writes(config.sync_writes);
            Ok(ConfiguredStore::File(store))
        }
        #[cfg(feature = "rocksdb")]
        StoreBackend::RocksDb => {
            use crate::adapters::{RocksDbConfig, RocksDbStore};

            let store = RocksDbStore::open(RocksDbConfig {
                path: config.data_dir.join(ROCKSDB_DIR_NAME),
                sync_writes: config.sync_writes,
                ..RocksDbConfig::default()
            })?;
            Ok(ConfiguredStore::RocksDb(store))
        }
        #[cfg(not(feature = "rocksdb"))]
        StoreBackend::RocksDb => Err(LedgerError::Database {
            message: "RocksDB backend requested but the `rocksdb` feature is disabled"
                .to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::inbound::{ChainLedgerApi, CheckpointStoreApi, IdentityRotationApi};
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn test_memory_backend_takes_no_lock() {
        let opened = open_ledger(&LedgerConfig::in_memory()).unwrap();
        assert!(opened.lock.is_none());
        assert_eq!(opened.ledger.lock().kv_store().backend_name(), "memory");
    }

    #[test]
    fn test_file_backend_creates_data_dir() {
        let temp = tempdir().unwrap();
        let data_dir = temp.path().join("nested").join("ledger");
        let config = LedgerConfig::default()
            .with_data_dir(&data_dir)
            .with_sync_writes(false);

        let opened = open_ledger(&config).unwrap();

        assert!(opened.lock.is_some());
        assert!(data_dir.join("LOCK").exists());
        assert_eq!(opened.ledger.lock().get_resume_version("proc", 3).unwrap(), 3);
    }

    #[test]
    fn test_opened_ledger_exports_identity_metrics() {
        let opened = open_ledger(&LedgerConfig::in_memory()).unwrap();
        {
            let mut ledger = opened.ledger.lock();
            ledger.initialize_or_verify(1).unwrap();
            ledger.apply_auth_key_event("0x1", "0xa", true, 1).unwrap();
        }

        let text = ledger_telemetry::encode_metrics().unwrap();
        assert!(text.contains("ledger_identity_rows_written_total"));
        assert!(text.contains("account_auth_key_link"));
    }

    #[test]
    fn test_second_open_is_locked_out() {
        let temp = tempdir().unwrap();
        let config = LedgerConfig::default()
            .with_data_dir(temp.path())
            .with_sync_writes(false)
            .with_lock_timeout(Duration::from_millis(100));

        let _first = open_ledger(&config).unwrap();
        let second = open_ledger(&config);

        assert!(matches!(second, Err(LedgerError::DatabaseLocked { .. })));
    }

    #[cfg(not(feature = "rocksdb"))]
    #[test]
    fn test_rocksdb_backend_requires_feature() {
        let temp = tempdir().unwrap();
        let config = LedgerConfig::default()
            .with_data_dir(temp.path())
            .with_backend(StoreBackend::RocksDb)
            .with_lock_timeout(Duration::from_millis(100));

        assert!(matches!(
            open_ledger(&config),
            Err(LedgerError::Database { .. })
        ));
    }
}
