use std::collections::BTreeMap;
use std::ops::Bound;

use crate::domain::errors::KVStoreError;
use crate::ports::outbound::{BatchOperation, KeyValueStore, ScanResult};

/// In-memory key-value store for unit tests and testing-mode runs.
///
/// Batch writes are atomic because nothing can fail mid-batch.
#[derive(Debug, Default, Clone)]
pub struct InMemoryKVStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl InMemoryKVStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

pub(crate) fn scan_range(data: &BTreeMap<Vec<u8>, Vec<u8>>, prefix: &[u8]) -> ScanResult {
    data.range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded))
        .take_while(|(k, _)| k.starts_with(prefix))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

pub(crate) fn apply_operations(
    data: &mut BTreeMap<Vec<u8>, Vec<u8>>,
    operations: Vec<BatchOperation>,
) {
    for op in operations {
        match op {
            BatchOperation::Put { key, value } => {
                data.insert(key, value);
            }
        }
    }
}

impl KeyValueStore for InMemoryKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        apply_operations(&mut self.data, operations);
        Ok(())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError> {
        Ok(scan_range(&self.data, prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_kv_store() {
        let mut store = InMemoryKVStore::new();

        store
            .atomic_batch_write(vec![
                BatchOperation::put(b"key1", b"value1"),
                BatchOperation::put(b"key2", b"value2"),
            ])
            .unwrap();

        assert_eq!(store.get(b"key1").unwrap(), Some(b"value1".to_vec()));
        assert_eq!(store.get(b"key2").unwrap(), Some(b"value2".to_vec()));
        assert_eq!(store.get(b"key3").unwrap(), None);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_in_memory_kv_batch_overwrites() {
        let mut store = InMemoryKVStore::new();
        store
            .atomic_batch_write(vec![BatchOperation::put(b"c", b"old")])
            .unwrap();

        let ops = vec![
            BatchOperation::put(b"a", b"1"),
            BatchOperation::put(b"c", b"new"),
            BatchOperation::put(b"a", b"2"),
        ];

        store.atomic_batch_write(ops).unwrap();

        assert_eq!(store.get(b"a").unwrap(), Some(b"2".to_vec()));
        assert_eq!(store.get(b"c").unwrap(), Some(b"new".to_vec()));
    }

    #[test]
    fn test_prefix_scan_sorted() {
        let mut store = InMemoryKVStore::new();

        store
            .atomic_batch_write(vec![
                BatchOperation::put(b"p:b", b"2"),
                BatchOperation::put(b"p:a", b"1"),
                BatchOperation::put(b"q:a", b"x"),
                BatchOperation::put(b"o:z", b"y"),
            ])
            .unwrap();

        let rows = store.prefix_scan(b"p:").unwrap();
        let keys: Vec<_> = rows.into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![b"p:a".to_vec(), b"p:b".to_vec()]);
    }
}
