//! # Ledger Configuration
//!
//! Where the ledger keeps its data and which store backs it.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::adapters::lock::DEFAULT_LOCK_TIMEOUT;

/// Key-value store behind the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// Nothing survives the process. Testing-mode replays only.
    Memory,
    /// Single file under the data directory.
    #[default]
    File,
    /// RocksDB under the data directory (feature `rocksdb`).
    RocksDb,
}

impl StoreBackend {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "memory" | "mem" => Some(StoreBackend::Memory),
            "file" => Some(StoreBackend::File),
            "rocksdb" | "rocks" => Some(StoreBackend::RocksDb),
            _ => None,
        }
    }

    /// Whether the backend persists into `data_dir`.
    pub fn is_persistent(&self) -> bool {
        !matches!(self, StoreBackend::Memory)
    }
}

/// Ledger storage configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Data directory; holds the store and its `LOCK` file.
    pub data_dir: PathBuf,
    /// Fsync every committed write.
    pub sync_writes: bool,
    /// How long to wait for another process to release the data directory.
    pub lock_timeout: Duration,
    /// Store implementation.
    pub backend: StoreBackend,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/ledger"),
            sync_writes: true,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            backend: StoreBackend::File,
        }
    }
}

impl LedgerConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `LEDGER_DATA_DIR`: Data directory (default: ./data/ledger)
    /// - `LEDGER_BACKEND`: memory, file or rocksdb (default: file)
    /// - `LEDGER_SYNC_WRITES`: Fsync every write (default: true)
    /// - `LEDGER_LOCK_TIMEOUT_SECS`: Lock wait in seconds (default: 30)
    ///
    /// Unparseable values fall back to the default with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let backend = match lookup("LEDGER_BACKEND") {
            Some(value) => StoreBackend::parse(&value).unwrap_or_else(|| {
                tracing::warn!(value = %value, "[ledger] Unknown LEDGER_BACKEND, using default");
                defaults.backend
            }),
            None => defaults.backend,
        };

        let sync_writes = match lookup("LEDGER_SYNC_WRITES") {
            Some(value) => parse_flag(&value).unwrap_or_else(|| {
                tracing::warn!(value = %value, "[ledger] Invalid LEDGER_SYNC_WRITES, using default");
                defaults.sync_writes
            }),
            None => defaults.sync_writes,
        };

        let lock_timeout = match lookup("LEDGER_LOCK_TIMEOUT_SECS") {
            Some(value) => match value.trim().parse::<u64>() {
                Ok(secs) => Duration::from_secs(secs),
                Err(_) => {
                    tracing::warn!(
                        value = %value,
                        "[ledger] Invalid LEDGER_LOCK_TIMEOUT_SECS, using default"
                    );
                    defaults.lock_timeout
                }
            },
            None => defaults.lock_timeout,
        };

        Self {
            data_dir: lookup("LEDGER_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            sync_writes,
            lock_timeout,
            backend,
        }
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn with_backend(mut self, backend: StoreBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_sync_writes(mut self, sync_writes: bool) -> Self {
        self.sync_writes = sync_writes;
        self
    }

    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    /// In-memory configuration.
    pub fn in_memory() -> Self {
        Self::default().with_backend(StoreBackend::Memory)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
