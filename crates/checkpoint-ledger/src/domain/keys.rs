//! # Key Layout
//!
//! Logical tables map onto prefixed keys in a flat key-value store.
//! Composite keys join their components with a NUL byte, so components
//! must be non-empty and NUL-free.
//!
//! | Prefix | Key | Value |
//! |--------|-----|-------|
//! | `l:` | `l:chain` | `ChainLedgerInfo` |
//! | `p:` | `p:{processor}` | `ProcessorCheckpoint` |
//! | `f:` | `f:{alias}` | `BackfillCheckpoint` |
//! | `a:` | `a:{account}\0{auth_key}` | `AccountAuthKeyLink` |
//! | `r:` | `r:{auth_key}\0{account}` | empty |
//! | `k:` | `k:{auth_key}\0{type}\0{public_key}` | `AuthKeyPublicKeyLink` |
//! | `u:` | `u:{public_key}\0{type}\0{auth_key}` | empty |
//! | `m:` | `m:layout` | `LayoutMarker` |

use crate::domain::errors::LedgerError;

const SEPARATOR: u8 = 0;

/// Key prefixes for each logical table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPrefix {
    /// Chain id row: `l:chain`
    ChainLedger,
    /// Live checkpoints: `p:{processor}`
    ProcessorCheckpoint,
    /// Backfill checkpoints: `f:{alias}`
    BackfillCheckpoint,
    /// Account to auth key links: `a:{account}\0{auth_key}`
    AccountAuthKey,
    /// Auth key to accounts index: `r:{auth_key}\0{account}`
    AuthKeyAccounts,
    /// Auth key members: `k:{auth_key}\0{type}\0{public_key}`
    AuthKeyPublicKey,
    /// Public key to auth keys index: `u:{public_key}\0{type}\0{auth_key}`
    PublicKeyAuthKeys,
    /// Store metadata: `m:layout`
    Metadata,
}

impl KeyPrefix {
    /// Get the byte prefix for this key type.
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            KeyPrefix::ChainLedger => b"l:",
            KeyPrefix::ProcessorCheckpoint => b"p:",
            KeyPrefix::BackfillCheckpoint => b"f:",
            KeyPrefix::AccountAuthKey => b"a:",
            KeyPrefix::AuthKeyAccounts => b"r:",
            KeyPrefix::AuthKeyPublicKey => b"k:",
            KeyPrefix::PublicKeyAuthKeys => b"u:",
            KeyPrefix::Metadata => b"m:",
        }
    }

    /// Build a key from validated components.
    fn compose(&self, parts: &[(&str, &str)]) -> Result<Vec<u8>, LedgerError> {
        let mut key = self.as_bytes().to_vec();
        for (i, (label, part)) in parts.iter().enumerate() {
            validate_component(label, part)?;
            if i > 0 {
                key.push(SEPARATOR);
            }
            key.extend_from_slice(part.as_bytes());
        }
        Ok(key)
    }

    /// Build a scan prefix: components followed by a trailing separator.
    fn scan(&self, parts: &[(&str, &str)]) -> Result<Vec<u8>, LedgerError> {
        let mut key = self.compose(parts)?;
        key.push(SEPARATOR);
        Ok(key)
    }

    pub fn chain_key() -> Vec<u8> {
        let mut key = KeyPrefix::ChainLedger.as_bytes().to_vec();
        key.extend_from_slice(b"chain");
        key
    }

    pub fn layout_key() -> Vec<u8> {
        let mut key = KeyPrefix::Metadata.as_bytes().to_vec();
        key.extend_from_slice(b"layout");
        key
    }

    pub fn processor_key(processor_name: &str) -> Result<Vec<u8>, LedgerError> {
        KeyPrefix::ProcessorCheckpoint.compose(&[("processor name", processor_name)])
    }

    pub fn backfill_key(alias: &str) -> Result<Vec<u8>, LedgerError> {
        KeyPrefix::BackfillCheckpoint.compose(&[("backfill alias", alias)])
    }

    pub fn account_auth_key(account_address: &str, auth_key: &str) -> Result<Vec<u8>, LedgerError> {
        KeyPrefix::AccountAuthKey.compose(&[
            ("account address", account_address),
            ("auth key", auth_key),
        ])
    }

    /// Prefix covering every auth key link of an account.
    pub fn account_links_prefix(account_address: &str) -> Result<Vec<u8>, LedgerError> {
        KeyPrefix::AccountAuthKey.scan(&[("account address", account_address)])
    }

    pub fn auth_key_account_index(
        auth_key: &str,
        account_address: &str,
    ) -> Result<Vec<u8>, LedgerError> {
        KeyPrefix::AuthKeyAccounts.compose(&[
            ("auth key", auth_key),
            ("account address", account_address),
        ])
    }

    pub fn auth_key_accounts_prefix(auth_key: &str) -> Result<Vec<u8>, LedgerError> {
        KeyPrefix::AuthKeyAccounts.scan(&[("auth key", auth_key)])
    }

    pub fn auth_key_public_key(
        auth_key: &str,
        public_key_type: &str,
        public_key: &str,
    ) -> Result<Vec<u8>, LedgerError> {
        KeyPrefix::AuthKeyPublicKey.compose(&[
            ("auth key", auth_key),
            ("public key type", public_key_type),
            ("public key", public_key),
        ])
    }

    /// Prefix covering every member of an auth key's key set.
    pub fn auth_key_members_prefix(auth_key: &str) -> Result<Vec<u8>, LedgerError> {
        KeyPrefix::AuthKeyPublicKey.scan(&[("auth key", auth_key)])
    }

    pub fn public_key_index(
        public_key: &str,
        public_key_type: &str,
        auth_key: &str,
    ) -> Result<Vec<u8>, LedgerError> {
        KeyPrefix::PublicKeyAuthKeys.compose(&[
            ("public key", public_key),
            ("public key type", public_key_type),
            ("auth key", auth_key),
        ])
    }

    pub fn public_key_index_prefix(public_key: &str) -> Result<Vec<u8>, LedgerError> {
        KeyPrefix::PublicKeyAuthKeys.scan(&[("public key", public_key)])
    }
}

fn validate_component(label: &str, part: &str) -> Result<(), LedgerError> {
    if part.is_empty() {
        return Err(LedgerError::invalid_key(format!("{} is empty", label)));
    }
    if part.as_bytes().contains(&SEPARATOR) {
        return Err(LedgerError::invalid_key(format!(
            "{} contains a NUL byte",
            label
        )));
    }
    Ok(())
}

/// Split the components of an index key scanned under `prefix`.
///
/// Returns `None` for keys that do not belong to the prefix.
pub fn index_components(prefix: &[u8], key: &[u8]) -> Option<Vec<String>> {
    let rest = key.strip_prefix(prefix)?;
    rest.split(|b| *b == SEPARATOR)
        .map(|part| String::from_utf8(part.to_vec()).ok())
        .collect()
}

/// Render a key for error messages.
pub fn display_key(key: &[u8]) -> String {
    String::from_utf8_lossy(key).replace('\0', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_key_layout() {
        let key = KeyPrefix::account_auth_key("0x1", "0xab").unwrap();
        assert_eq!(key, b"a:0x1\00xab".to_vec());

        let key = KeyPrefix::auth_key_public_key("0xab", "ed25519", "0xcd").unwrap();
        assert_eq!(key, b"k:0xab\0ed25519\00xcd".to_vec());
    }

    #[test]
    fn test_scan_prefix_does_not_match_longer_component() {
        let prefix = KeyPrefix::account_links_prefix("0x1").unwrap();
        let other = KeyPrefix::account_auth_key("0x10", "0xab").unwrap();
        let own = KeyPrefix::account_auth_key("0x1", "0xab").unwrap();

        assert!(!other.starts_with(&prefix));
        assert!(own.starts_with(&prefix));
    }

    #[test]
    fn test_empty_component_rejected() {
        let result = KeyPrefix::processor_key("");
        assert!(matches!(result, Err(LedgerError::InvalidKey { .. })));
    }

    #[test]
    fn test_nul_component_rejected() {
        let result = KeyPrefix::account_auth_key("0x1\0", "0xab");
        match result {
            Err(LedgerError::InvalidKey { reason }) => assert!(reason.contains("account address")),
            other => panic!("Expected InvalidKey, got {:?}", other),
        }
    }

    #[test]
    fn test_index_components() {
        let prefix = KeyPrefix::public_key_index_prefix("0xcd").unwrap();
        let key = KeyPrefix::public_key_index("0xcd", "ed25519", "0xab").unwrap();

        assert_eq!(
            index_components(&prefix, &key),
            Some(vec!["ed25519".to_string(), "0xab".to_string()])
        );
        assert_eq!(index_components(b"zz", &key), None);
    }

    #[test]
    fn test_fixed_keys() {
        assert_eq!(KeyPrefix::chain_key(), b"l:chain".to_vec());
        assert_eq!(KeyPrefix::layout_key(), b"m:layout".to_vec());
        assert_eq!(display_key(b"a:x\0y"), "a:x/y");
    }
}
