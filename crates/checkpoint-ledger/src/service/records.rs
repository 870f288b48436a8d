//! # Record Encoding and Staged Writes
//!
//! Stored values are the serialized record followed by a little-endian
//! CRC32 of the serialized bytes. Index keys carry an empty value.

use std::collections::BTreeMap;

use ledger_telemetry::{
    metric_add, metric_inc, BACKFILLS_COMPLETED, CHECKPOINT_ADVANCES, IDENTITY_ROWS_WRITTEN,
    STALE_WRITES_IGNORED,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::LedgerService;
use crate::domain::errors::LedgerError;
use crate::domain::keys::display_key;
use crate::ports::outbound::{
    BatchOperation, ChecksumProvider, KeyValueStore, RecordSerializer, TimeSource,
};

const CHECKSUM_LEN: usize = 4;

/// Logical tables, as labelled in metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Table {
    ProcessorCheckpoint,
    BackfillCheckpoint,
    AccountAuthKeyLink,
    AuthKeyPublicKeyLink,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::ProcessorCheckpoint => "processor_checkpoint",
            Table::BackfillCheckpoint => "backfill_checkpoint",
            Table::AccountAuthKeyLink => "account_auth_key_link",
            Table::AuthKeyPublicKeyLink => "auth_key_public_key_link",
        }
    }
}

/// Operations staged for one atomic write, plus what to report once it lands.
#[derive(Debug, Default)]
pub(crate) struct WriteSet {
    ops: Vec<BatchOperation>,
    identity_written: Vec<Table>,
    stale: Vec<Table>,
    advanced_mode: Option<&'static str>,
    backfill_completed: Option<String>,
}

impl WriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.ops.push(BatchOperation::put(key, value));
    }

    pub fn put_index(&mut self, key: Vec<u8>) {
        self.ops.push(BatchOperation::put(key, Vec::new()));
    }

    pub fn identity_written(&mut self, table: Table) {
        self.identity_written.push(table);
    }

    pub fn stale(&mut self, table: Table) {
        self.stale.push(table);
    }

    pub fn checkpoint_advanced(&mut self, mode: &'static str) {
        self.advanced_mode = Some(mode);
    }

    pub fn backfill_completed(&mut self, alias: &str) {
        self.backfill_completed = Some(alias.to_string());
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }
}

/// Rows per table label.
fn tally(tables: &[Table]) -> BTreeMap<&'static str, f64> {
    let mut counts = BTreeMap::new();
    for table in tables {
        *counts.entry(table.as_str()).or_insert(0.0) += 1.0;
    }
    counts
}

impl<KV, CS, TS, RS> LedgerService<KV, CS, TS, RS>
where
    KV: KeyValueStore,
    CS: ChecksumProvider,
    TS: TimeSource,
    RS: RecordSerializer,
{
    /// Serialize a record and append its checksum.
    pub(crate) fn encode_record<T: Serialize>(&self, record: &T) -> Result<Vec<u8>, LedgerError> {
        let mut bytes = self.serializer.serialize(record)?;
        let checksum = self.checksum.compute_crc32(&bytes);
        bytes.extend_from_slice(&checksum.to_le_bytes());
        Ok(bytes)
    }

    /// Verify the checksum of a stored value and deserialize it.
    pub(crate) fn decode_record<T: DeserializeOwned>(
        &self,
        key: &[u8],
        value: &[u8],
    ) -> Result<T, LedgerError> {
        if value.len() < CHECKSUM_LEN {
            return Err(LedgerError::Serialization {
                message: format!(
                    "record at {} is {} bytes, shorter than its checksum",
                    display_key(key),
                    value.len()
                ),
            });
        }

        let (payload, tail) = value.split_at(value.len() - CHECKSUM_LEN);
        let mut stored = [0u8; CHECKSUM_LEN];
        stored.copy_from_slice(tail);
        let expected = u32::from_le_bytes(stored);

        if !self.checksum.verify_crc32(payload, expected) {
            let actual = self.checksum.compute_crc32(payload);
            tracing::error!(
                key = %display_key(key),
                expected,
                actual,
                "[ledger] Checksum mismatch"
            );
            return Err(LedgerError::DataCorruption {
                key: display_key(key),
                expected,
                actual,
            });
        }

        Ok(self.serializer.deserialize(payload)?)
    }

    pub(crate) fn read_record<T: DeserializeOwned>(
        &self,
        key: &[u8],
    ) -> Result<Option<T>, LedgerError> {
        match self.kv_store.get(key)? {
            Some(value) => self.decode_record(key, &value).map(Some),
            None => Ok(None),
        }
    }

    /// Decode every record stored under `prefix`, in key order.
    pub(crate) fn scan_records<T: DeserializeOwned>(
        &self,
        prefix: &[u8],
    ) -> Result<Vec<T>, LedgerError> {
        self.kv_store
            .prefix_scan(prefix)?
            .into_iter()
            .map(|(key, value)| self.decode_record(&key, &value))
            .collect()
    }

    /// Apply staged writes atomically, then report them.
    pub(crate) fn commit(&mut self, writes: WriteSet) -> Result<(), LedgerError> {
        let WriteSet {
            ops,
            identity_written,
            stale,
            advanced_mode,
            backfill_completed,
        } = writes;

        if !ops.is_empty() {
            self.kv_store.atomic_batch_write(ops)?;
        }

        for (table, rows) in tally(&identity_written) {
            metric_add!(IDENTITY_ROWS_WRITTEN, &[table], rows);
        }
        for (table, rows) in tally(&stale) {
            metric_add!(STALE_WRITES_IGNORED, &[table], rows);
        }
        if let Some(mode) = advanced_mode {
            metric_inc!(CHECKPOINT_ADVANCES, &[mode]);
        }
        if let Some(alias) = backfill_completed {
            metric_inc!(BACKFILLS_COMPLETED);
            tracing::info!(alias = %alias, "[ledger] ✅ Backfill complete");
        }
        Ok(())
    }
}
