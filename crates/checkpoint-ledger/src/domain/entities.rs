//! # Ledger Entities
//!
//! Persisted rows and the outcomes returned by write operations.

use serde::{Deserialize, Serialize};
use shared_types::{ChainId, Timestamp, Version, VersionRange};

/// On-disk key layout version written on first open.
pub const LAYOUT_VERSION: u32 = 1;

/// The single chain-id row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainLedgerInfo {
    pub chain_id: ChainId,
}

/// Layout version the store was created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutMarker {
    pub layout_version: u32,
}

/// Live-mode progress of one processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorCheckpoint {
    pub processor_name: String,
    pub last_success_version: Version,
    pub last_updated_at: Timestamp,
    pub last_transaction_timestamp: Option<Timestamp>,
}

/// Lifecycle state of a backfill run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackfillStatus {
    InProgress,
    Complete,
}

/// Progress of one named backfill run.
///
/// `last_success_version` is `None` until the run commits its first batch
/// (or after an overwrite recreated the row).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackfillCheckpoint {
    pub backfill_alias: String,
    pub backfill_status: BackfillStatus,
    pub last_success_version: Option<Version>,
    pub last_updated_at: Timestamp,
    pub last_transaction_timestamp: Option<Timestamp>,
    pub backfill_start_version: Version,
    pub ending_version: Option<Version>,
    pub overwrite_checkpoint: bool,
}

impl BackfillCheckpoint {
    /// Version the run would resume from, ignoring the configured start.
    pub fn next_version(&self) -> Option<Version> {
        self.last_success_version.map(|v| v.saturating_add(1))
    }

    pub fn is_complete(&self) -> bool {
        self.backfill_status == BackfillStatus::Complete
    }
}

/// `(account_address, auth_key)` association.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountAuthKeyLink {
    pub account_address: String,
    pub auth_key: String,
    pub is_auth_key_used: bool,
    pub last_transaction_version: Version,
}

/// Membership of a public key in the key set behind an auth key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthKeyPublicKeyLink {
    pub auth_key: String,
    pub public_key: String,
    pub public_key_type: String,
    pub account_public_key: Option<String>,
    pub is_public_key_used: bool,
    pub signature_type: String,
    pub last_transaction_version: Version,
}

/// Alias under which a processor's backfill is tracked.
pub fn backfill_alias(processor_name: &str, backfill_id: &str) -> String {
    format!("{}_{}", processor_name, backfill_id)
}

/// Range a backfill run should cover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillPlan {
    pub alias: String,
    pub start_version: Version,
    pub end_version: Option<Version>,
    /// Whether prior progress moved the start past the configured version.
    pub resumed: bool,
}

impl BackfillPlan {
    /// A previously completed run: nothing left to process.
    pub fn is_finished(&self) -> bool {
        matches!(self.end_version, Some(end) if self.start_version > end)
    }

    pub fn range(&self) -> VersionRange {
        VersionRange {
            start: self.start_version,
            end: self.end_version,
        }
    }
}

/// Result of a checkpoint advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The row now records the new version.
    Advanced,
    /// The row was already at or past the version; nothing was written.
    Stale,
}

/// Result of an identity upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    Stale,
}

/// What a committed batch did to the mode's checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointOutcome {
    Advanced,
    Stale,
    /// Testing mode: no checkpoint is kept.
    Skipped,
}

impl From<AdvanceOutcome> for CheckpointOutcome {
    fn from(outcome: AdvanceOutcome) -> Self {
        match outcome {
            AdvanceOutcome::Advanced => CheckpointOutcome::Advanced,
            AdvanceOutcome::Stale => CheckpointOutcome::Stale,
        }
    }
}

/// Summary of one committed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOutcome {
    pub checkpoint: CheckpointOutcome,
    pub identity_applied: usize,
    pub identity_stale: usize,
}
