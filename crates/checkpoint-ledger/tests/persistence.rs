//! # Persistence Tests
//!
//! The file-backed ledger across process restarts: progress, chain id and
//! identity rows survive a reopen, damaged values are refused and a second
//! opener is locked out.

use std::time::Duration;

use checkpoint_ledger::wiring::FILE_STORE_NAME;
use checkpoint_ledger::{
    open_ledger, BatchMetadata, CheckpointStoreApi, IdentityBatch, IdentityRotationApi,
    LedgerConfig, LedgerError, PublicKeyMembership, RunMode,
};
use tempfile::tempdir;

const CHAIN_ID: u64 = 2;

fn config_for(dir: &std::path::Path) -> LedgerConfig {
    LedgerConfig::default()
        .with_data_dir(dir)
        .with_sync_writes(false)
        .with_lock_timeout(Duration::from_millis(100))
}

fn membership(auth_key: &str, public_key: &str, used: bool, version: u64) -> PublicKeyMembership {
    PublicKeyMembership {
        auth_key: auth_key.to_string(),
        public_key: public_key.to_string(),
        public_key_type: "ed25519".to_string(),
        account_public_key: None,
        is_public_key_used: used,
        signature_type: "multi_ed25519_signature".to_string(),
        version,
    }
}

#[test]
fn test_progress_survives_reopen() {
    let dir = tempdir().unwrap();
    let config = config_for(dir.path());

    {
        let opened = open_ledger(&config).unwrap();
        opened.ledger.initialize_or_verify(CHAIN_ID).unwrap();

        let mut identity = IdentityBatch::new();
        identity.push(membership("0xa", "0xb", true, 90));
        identity.push(membership("0xa", "0xc", false, 95));
        opened
            .ledger
            .commit_batch(
                "proc",
                &RunMode::default(),
                BatchMetadata::new(0, 100),
                &identity,
            )
            .unwrap();
    }

    let opened = open_ledger(&config).unwrap();
    opened.ledger.initialize_or_verify(CHAIN_ID).unwrap();

    let service = opened.ledger.lock();
    assert_eq!(service.get_resume_version("proc", 0).unwrap(), 101);
    assert_eq!(
        service.current_signers("0xa").unwrap().into_iter().collect::<Vec<_>>(),
        vec!["0xb".to_string()]
    );
}

#[test]
fn test_reopen_with_other_chain_is_refused() {
    let dir = tempdir().unwrap();
    let config = config_for(dir.path());

    {
        let opened = open_ledger(&config).unwrap();
        opened.ledger.initialize_or_verify(1).unwrap();
    }

    let opened = open_ledger(&config).unwrap();
    let result = opened.ledger.initialize_or_verify(2);

    assert_eq!(
        result,
        Err(LedgerError::ChainMismatch {
            stored: 1,
            attempted: 2
        })
    );
    assert!(result.unwrap_err().is_fatal());
}

#[test]
fn test_damaged_value_detected_after_reopen() {
    let dir = tempdir().unwrap();
    let config = config_for(dir.path());

    {
        let opened = open_ledger(&config).unwrap();
        opened.ledger.initialize_or_verify(CHAIN_ID).unwrap();
        opened.ledger.lock().advance("proc", 10, None).unwrap();
    }

    // `p:proc` sorts last, so the final byte belongs to its checksum.
    let path = dir.path().join(FILE_STORE_NAME);
    let mut bytes = std::fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    std::fs::write(&path, bytes).unwrap();

    let opened = open_ledger(&config).unwrap();
    let result = opened.ledger.lock().checkpoint("proc");

    assert!(matches!(result, Err(LedgerError::DataCorruption { .. })));
}

#[test]
fn test_second_process_is_locked_out() {
    let dir = tempdir().unwrap();
    let config = config_for(dir.path());

    let first = open_ledger(&config).unwrap();
    assert!(matches!(
        open_ledger(&config),
        Err(LedgerError::DatabaseLocked { .. })
    ));

    drop(first);
    assert!(open_ledger(&config).is_ok());
}
