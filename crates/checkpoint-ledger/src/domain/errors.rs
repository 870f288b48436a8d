//! # Domain Errors
//!
//! Error types for the checkpoint ledger.
//!
//! ## Classes
//!
//! - **Fatal**: the process must halt (`is_fatal()`).
//! - **Stop signal**: `PastEndingVersion` ends a backfill run normally.
//! - **Storage**: propagated to the ingestion loop for retry-with-backoff.
//!
//! Stale writes are not errors. They surface as `Stale` outcomes.

use shared_types::{ChainId, Version};
use thiserror::Error;

/// Errors returned by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Stored chain id differs from the one this process ingests.
    #[error("Chain id mismatch: store belongs to chain {stored}, attempted {attempted}")]
    ChainMismatch { stored: ChainId, attempted: ChainId },

    /// A write was attempted before `initialize_or_verify` succeeded.
    #[error("Chain id not verified: call initialize_or_verify before writing")]
    ChainNotVerified,

    /// The store was created with a different key layout.
    #[error("Store layout version {stored} does not match expected {expected}")]
    LayoutMismatch { stored: u32, expected: u32 },

    /// Stored value failed its checksum.
    #[error("Data corruption at key {key}: expected checksum {expected:#010x}, got {actual:#010x}")]
    DataCorruption {
        key: String,
        expected: u32,
        actual: u32,
    },

    /// Backfill reached its configured end; the caller must stop.
    #[error("Backfill {alias} cannot advance to {version}: ending version is {ending_version}")]
    PastEndingVersion {
        alias: String,
        version: Version,
        ending_version: Version,
    },

    /// Backfill advanced without being started and without a stored row.
    #[error("Backfill {alias} was never started")]
    BackfillNotStarted { alias: String },

    /// A key component is empty or contains a NUL byte.
    #[error("Invalid key: {reason}")]
    InvalidKey { reason: String },

    /// The data directory is held by another process.
    #[error("Database locked: {message}")]
    DatabaseLocked { message: String },

    /// Underlying store failure.
    #[error("Database error: {message}")]
    Database { message: String },

    /// Record encoding or decoding failure.
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl LedgerError {
    /// Whether continuing would risk corrupting the ledger.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LedgerError::ChainMismatch { .. }
                | LedgerError::ChainNotVerified
                | LedgerError::LayoutMismatch { .. }
                | LedgerError::DataCorruption { .. }
        )
    }

    /// Whether the caller may retry the same operation later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LedgerError::Database { .. } | LedgerError::DatabaseLocked { .. }
        )
    }

    pub(crate) fn invalid_key(reason: impl Into<String>) -> Self {
        LedgerError::InvalidKey {
            reason: reason.into(),
        }
    }
}

/// Key-value store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KVStoreError {
    /// I/O error during read/write.
    #[error("KV store I/O error: {message}")]
    IOError { message: String },
    /// Data corruption in the store.
    #[error("KV store corruption: {message}")]
    CorruptionError { message: String },
    /// Key not found.
    #[error("Key not found in KV store")]
    NotFound,
}

impl From<KVStoreError> for LedgerError {
    fn from(err: KVStoreError) -> Self {
        LedgerError::Database {
            message: err.to_string(),
        }
    }
}

/// Serialization errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Serialization error: {message}")]
pub struct SerializationError {
    pub message: String,
}

impl From<SerializationError> for LedgerError {
    fn from(err: SerializationError) -> Self {
        LedgerError::Serialization {
            message: err.message,
        }
    }
}

/// Errors decoding a key-rotation event payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventDecodeError {
    /// Payload is not valid JSON of the expected shape.
    #[error("Malformed key rotation payload: {0}")]
    Malformed(String),

    /// Multi-ed25519 key is not a whole number of 32-byte keys plus a threshold byte.
    #[error("Invalid multi-ed25519 public key length: {length} bytes")]
    InvalidMultiEd25519Key { length: usize },

    /// Multi-key public key is not a BCS `MultiKey`.
    #[error("Invalid multi-key public key: {0}")]
    InvalidMultiKey(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LedgerError::ChainMismatch {
            stored: 1,
            attempted: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("chain 1"));
        assert!(msg.contains("attempted 2"));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(LedgerError::ChainNotVerified.is_fatal());
        assert!(LedgerError::LayoutMismatch {
            stored: 2,
            expected: 1
        }
        .is_fatal());
        assert!(!LedgerError::PastEndingVersion {
            alias: "p_b".into(),
            version: 11,
            ending_version: 10,
        }
        .is_fatal());
        assert!(!LedgerError::Database {
            message: "io".into()
        }
        .is_fatal());
    }

    #[test]
    fn test_kv_error_conversion() {
        let kv_err = KVStoreError::IOError {
            message: "disk failure".to_string(),
        };
        let err: LedgerError = kv_err.into();

        match err {
            LedgerError::Database { ref message } => {
                assert!(message.contains("disk failure"));
            }
            _ => panic!("Expected Database"),
        }
        assert!(err.is_retryable());
    }
}
