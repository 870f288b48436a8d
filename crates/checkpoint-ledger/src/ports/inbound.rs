//! # Inbound Ports (Driving Ports)
//!
//! The API the ingestion loop drives. `LedgerService` implements every
//! trait here.
//!
//! Write paths return `ChainNotVerified` until
//! `ChainLedgerApi::initialize_or_verify` has succeeded in this process.

use std::collections::BTreeSet;

use shared_types::{BatchMetadata, ChainId, RunMode, Timestamp, Version, VersionRange};

use crate::domain::entities::{
    AccountAuthKeyLink, AdvanceOutcome, ApplyOutcome, AuthKeyPublicKeyLink, BackfillCheckpoint,
    BackfillPlan, BatchOutcome, ProcessorCheckpoint,
};
use crate::domain::errors::LedgerError;
use crate::domain::identity::{IdentityBatch, PublicKeyMembership};

/// Guards that every ingested version belongs to one chain.
pub trait ChainLedgerApi {
    /// Record the chain id on first run, or check it against the stored one.
    ///
    /// ## Errors
    ///
    /// - `ChainMismatch`: a different chain id is stored (fatal)
    fn initialize_or_verify(&mut self, chain_id: ChainId) -> Result<(), LedgerError>;

    /// The stored chain id, if any.
    fn chain_id(&self) -> Result<Option<ChainId>, LedgerError>;
}

/// Live-mode checkpoints, one row per processor name.
pub trait CheckpointStoreApi {
    /// `last_success_version + 1` if a row exists, else `configured_initial_version`.
    fn get_resume_version(
        &self,
        processor_name: &str,
        configured_initial_version: Version,
    ) -> Result<Version, LedgerError>;

    /// Move the checkpoint forward.
    ///
    /// A version at or below the stored one is a no-op returning `Stale`.
    fn advance(
        &mut self,
        processor_name: &str,
        new_version: Version,
        transaction_timestamp: Option<Timestamp>,
    ) -> Result<AdvanceOutcome, LedgerError>;

    fn checkpoint(&self, processor_name: &str) -> Result<Option<ProcessorCheckpoint>, LedgerError>;
}

/// Named, bounded backfill runs, isolated from live checkpoints.
pub trait BackfillCoordinatorApi {
    /// Decide where a backfill run starts and register it.
    ///
    /// With `overwrite_checkpoint` the row is recreated and the run starts at
    /// `initial_starting_version`; otherwise it resumes after stored progress.
    fn start_or_resume(
        &mut self,
        backfill_alias: &str,
        initial_starting_version: Version,
        ending_version: Option<Version>,
        overwrite_checkpoint: bool,
    ) -> Result<BackfillPlan, LedgerError>;

    /// Move a backfill checkpoint forward.
    ///
    /// ## Errors
    ///
    /// - `PastEndingVersion`: `new_version` exceeds the ending version (stop)
    /// - `BackfillNotStarted`: unknown alias with no stored row
    fn advance_backfill(
        &mut self,
        backfill_alias: &str,
        new_version: Version,
        transaction_timestamp: Option<Timestamp>,
    ) -> Result<AdvanceOutcome, LedgerError>;

    fn backfill(&self, backfill_alias: &str) -> Result<Option<BackfillCheckpoint>, LedgerError>;
}

/// Account, auth key and public key associations.
pub trait IdentityRotationApi {
    /// Upsert an account/auth-key link unless the stored row is at or past `version`.
    fn apply_auth_key_event(
        &mut self,
        account_address: &str,
        auth_key: &str,
        now_used: bool,
        version: Version,
    ) -> Result<ApplyOutcome, LedgerError>;

    /// Upsert a key-set member unless the stored row is at or past its version.
    fn apply_public_key_membership(
        &mut self,
        membership: PublicKeyMembership,
    ) -> Result<ApplyOutcome, LedgerError>;

    /// Used auth key with the greatest version (greatest key breaks ties).
    fn current_auth_key(&self, account_address: &str) -> Result<Option<String>, LedgerError>;

    /// Public keys currently used in the key set behind `auth_key`.
    fn current_signers(&self, auth_key: &str) -> Result<BTreeSet<String>, LedgerError>;

    /// Every member ever recorded for `auth_key`, revoked ones included.
    fn key_set(&self, auth_key: &str) -> Result<Vec<AuthKeyPublicKeyLink>, LedgerError>;

    /// Every auth key link recorded for an account.
    fn auth_key_links(&self, account_address: &str)
        -> Result<Vec<AccountAuthKeyLink>, LedgerError>;

    /// Accounts whose link to `auth_key` is currently used.
    fn accounts_for_auth_key(&self, auth_key: &str) -> Result<BTreeSet<String>, LedgerError>;

    /// Auth keys in which `public_key` is a currently used member.
    fn auth_keys_for_public_key(&self, public_key: &str) -> Result<BTreeSet<String>, LedgerError>;
}

/// Run-mode routing of ranges and batch commits.
pub trait RunModeApi {
    /// Version range the processor should run over in `mode`.
    ///
    /// Backfill mode registers the run; testing mode touches nothing.
    fn resolve_range(
        &mut self,
        processor_name: &str,
        mode: &RunMode,
    ) -> Result<VersionRange, LedgerError>;

    /// Fold a batch's identity events and advance the mode's checkpoint in
    /// one atomic write.
    fn commit_batch(
        &mut self,
        processor_name: &str,
        mode: &RunMode,
        batch: BatchMetadata,
        identity: &IdentityBatch,
    ) -> Result<BatchOutcome, LedgerError>;
}
