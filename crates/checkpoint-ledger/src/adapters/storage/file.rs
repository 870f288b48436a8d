use std::collections::BTreeMap;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::memory::{apply_operations, scan_range};
use crate::domain::errors::KVStoreError;
use crate::ports::outbound::{BatchOperation, KeyValueStore, ScanResult};

fn io_error(e: std::io::Error) -> KVStoreError {
    KVStoreError::IOError {
        message: e.to_string(),
    }
}

/// File-backed key-value store for deployments without RocksDB.
///
/// The whole map is rewritten through a temp file and renamed into place
/// on every write, so a crash leaves either the old or the new file.
///
/// File format: `[key_len:u32][key][value_len:u32][value]...` (little endian)
pub struct FileBackedKVStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
    path: PathBuf,
    sync_writes: bool,
}

impl FileBackedKVStore {
    /// Open the store at `path`, loading existing contents.
    ///
    /// A missing file is an empty store; a truncated file is corruption.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, KVStoreError> {
        let path = path.as_ref().to_path_buf();

        let data = match std::fs::read(&path) {
            Ok(bytes) => {
                let data = Self::decode(&bytes)?;
                tracing::info!(
                    "[ledger] 💾 Loaded {} keys from {} ({} bytes)",
                    data.len(),
                    path.display(),
                    bytes.len()
                );
                data
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!("[ledger] 📁 No existing storage file at {}", path.display());
                BTreeMap::new()
            }
            Err(e) => return Err(io_error(e)),
        };

        Ok(Self {
            data,
            path,
            sync_writes: true,
        })
    }

    /// Toggle fsync before the rename.
    pub fn with_sync_writes(mut self, sync_writes: bool) -> Self {
        self.sync_writes = sync_writes;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn decode(bytes: &[u8]) -> Result<BTreeMap<Vec<u8>, Vec<u8>>, KVStoreError> {
        let mut data = BTreeMap::new();
        let mut cursor = 0;

        let take = |cursor: &mut usize| -> Result<Vec<u8>, KVStoreError> {
            let truncated = || KVStoreError::CorruptionError {
                message: format!("storage file truncated at byte {}", cursor),
            };
            let len_bytes: [u8; 4] = bytes
                .get(*cursor..*cursor + 4)
                .and_then(|b| b.try_into().ok())
                .ok_or_else(truncated)?;
            let len = u32::from_le_bytes(len_bytes) as usize;
            let start = *cursor + 4;
            let chunk = bytes.get(start..start + len).ok_or_else(truncated)?;
            *cursor = start + len;
            Ok(chunk.to_vec())
        };

        while cursor < bytes.len() {
            let key = take(&mut cursor)?;
            let value = take(&mut cursor)?;
            data.insert(key, value);
        }

        Ok(data)
    }

    fn save_to_file(&self) -> Result<(), KVStoreError> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }

        let mut bytes = Vec::new();
        for (key, value) in &self.data {
            bytes.extend_from_slice(&(key.len() as u32).to_le_bytes());
            bytes.extend_from_slice(key);
            bytes.extend_from_slice(&(value.len() as u32).to_le_bytes());
            bytes.extend_from_slice(value);
        }

        // Write atomically via temp file
        let temp_path = self.path.with_extension("tmp");
        let mut file = std::fs::File::create(&temp_path).map_err(io_error)?;
        file.write_all(&bytes).map_err(io_error)?;
        if self.sync_writes {
            file.sync_all().map_err(io_error)?;
        }

        std::fs::rename(&temp_path, &self.path).map_err(io_error)?;
        Ok(())
    }

    /// Apply a mutation, rolling the map back if the file write fails.
    fn mutate(&mut self, f: impl FnOnce(&mut BTreeMap<Vec<u8>, Vec<u8>>)) -> Result<(), KVStoreError> {
        let previous = self.data.clone();
        f(&mut self.data);
        if let Err(e) = self.save_to_file() {
            self.data = previous;
            return Err(e);
        }
        Ok(())
    }
}

impl KeyValueStore for FileBackedKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        self.mutate(|data| apply_operations(data, operations))
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError> {
        Ok(scan_range(&self.data, prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");

        {
            let mut store = FileBackedKVStore::open(&path).unwrap();
            store
                .atomic_batch_write(vec![
                    BatchOperation::put(b"p:a", b"1"),
                    BatchOperation::put(b"p:b", b""),
                ])
                .unwrap();
        }

        let store = FileBackedKVStore::open(&path).unwrap();
        assert_eq!(store.get(b"p:a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.get(b"p:b").unwrap(), Some(Vec::new()));
        assert_eq!(store.prefix_scan(b"p:").unwrap().len(), 2);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBackedKVStore::open(dir.path().join("absent.db")).unwrap();
        assert!(store.prefix_scan(b"").unwrap().is_empty());
    }

    #[test]
    fn test_truncated_file_is_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");
        {
            let mut store = FileBackedKVStore::open(&path).unwrap();
            store
                .atomic_batch_write(vec![BatchOperation::put(b"key", b"value")])
                .unwrap();
        }

        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 2]).unwrap();

        let result = FileBackedKVStore::open(&path);
        assert!(matches!(result, Err(KVStoreError::CorruptionError { .. })));
    }

    #[test]
    fn test_failed_save_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        let mut store = FileBackedKVStore::open(sub.join("ledger.db")).unwrap();

        // Replace the parent directory with a regular file so the save fails.
        std::fs::remove_dir(&sub).unwrap();
        std::fs::write(&sub, b"not a directory").unwrap();

        assert!(store
            .atomic_batch_write(vec![BatchOperation::put(b"k", b"v")])
            .is_err());
        assert_eq!(store.get(b"k").unwrap(), None);
    }
}
