//! # Core Entities
//!
//! Primitive identifiers and the metadata that accompanies every batch the
//! ingestion loop delivers.

use serde::{Deserialize, Serialize};

/// Transaction version in the ordered stream.
pub type Version = u64;

/// Identifier of the blockchain network being ingested.
pub type ChainId = u64;

/// Unix timestamp in seconds since epoch.
pub type Timestamp = u64;

/// Metadata describing one batch of processed transactions.
///
/// The ingestion loop (external) builds one of these per batch; the ledger
/// uses `end_version` as the checkpoint to advance to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchMetadata {
    /// First transaction version in the batch (inclusive).
    pub start_version: Version,
    /// Last transaction version in the batch (inclusive).
    pub end_version: Version,
    /// On-chain timestamp of the last transaction, when known.
    pub end_transaction_timestamp: Option<Timestamp>,
}

impl BatchMetadata {
    /// Create metadata for the inclusive range `start..=end`.
    pub fn new(start_version: Version, end_version: Version) -> Self {
        Self {
            start_version,
            end_version,
            end_transaction_timestamp: None,
        }
    }

    /// Attach the timestamp of the last transaction.
    pub fn with_end_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.end_transaction_timestamp = Some(timestamp);
        self
    }

    /// Number of versions covered by the batch.
    pub fn len(&self) -> u64 {
        self.end_version.saturating_sub(self.start_version) + 1
    }

    /// A batch always covers at least one version.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Inclusive version range a processor should run over.
///
/// `end == None` means "until externally stopped".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRange {
    /// First version to process.
    pub start: Version,
    /// Last version to process (inclusive), if bounded.
    pub end: Option<Version>,
}

impl VersionRange {
    /// Range starting at `start` with no upper bound.
    pub fn unbounded(start: Version) -> Self {
        Self { start, end: None }
    }

    /// Range `start..=end`.
    pub fn bounded(start: Version, end: Version) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    /// Whether the range contains nothing left to process.
    pub fn is_exhausted(&self) -> bool {
        matches!(self.end, Some(end) if self.start > end)
    }

    /// Whether `version` lies inside the range.
    pub fn contains(&self, version: Version) -> bool {
        version >= self.start && self.end.map_or(true, |end| version <= end)
    }
}
