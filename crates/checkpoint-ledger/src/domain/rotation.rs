//! # Key Rotation Events
//!
//! Decoding of the `0x1::account::KeyRotationToPublicKey` event payload and
//! its translation into identity events.
//!
//! Byte fields are `0x`-prefixed hex strings:
//!
//! ```json
//! {
//!   "new_auth_key": "0x...",
//!   "old_auth_key": "0x...",
//!   "public_key": "0x...",
//!   "public_key_scheme": 1,
//!   "verified_public_key_bit_map": "0xc0000000"
//! }
//! ```
//!
//! A multi-key `public_key` is BCS-encoded, see [`crate::domain::multi_key`].

use serde::{Deserialize, Deserializer};
use shared_types::Version;

use crate::domain::errors::EventDecodeError;
use crate::domain::identity::{AuthKeyEvent, IdentityEvent, PublicKeyMembership};
use crate::domain::multi_key::MultiKey;

/// Length of one ed25519 public key inside a multi-ed25519 key.
pub const ED25519_PUBLIC_KEY_LENGTH: usize = 32;

/// Longest hex account public key (with `0x`) whose members are recorded.
pub const MAX_ACCOUNT_PUBLIC_KEY_LENGTH: usize = 13_000;

const MULTI_ED25519_SIGNATURE_TYPE: &str = "multi_ed25519_signature";
const MULTI_KEY_SIGNATURE_TYPE: &str = "multi_key_signature";
const ED25519_KEY_TYPE: &str = "ed25519";

/// One key-set member before it is bound to an auth key.
struct Member {
    public_key: String,
    public_key_type: &'static str,
}

/// Authentication scheme of the rotated-to key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "u8")]
pub enum PublicKeyScheme {
    Ed25519,
    MultiEd25519,
    SingleKey,
    MultiKey,
}

impl TryFrom<u8> for PublicKeyScheme {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PublicKeyScheme::Ed25519),
            1 => Ok(PublicKeyScheme::MultiEd25519),
            2 => Ok(PublicKeyScheme::SingleKey),
            3 => Ok(PublicKeyScheme::MultiKey),
            other => Err(format!("unknown public key scheme {}", other)),
        }
    }
}

/// Decoded key-rotation payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeyRotationEvent {
    #[serde(deserialize_with = "prefixed_hex")]
    pub new_auth_key: Vec<u8>,
    #[serde(deserialize_with = "prefixed_hex")]
    pub old_auth_key: Vec<u8>,
    #[serde(deserialize_with = "prefixed_hex")]
    pub public_key: Vec<u8>,
    pub public_key_scheme: PublicKeyScheme,
    #[serde(deserialize_with = "prefixed_hex")]
    pub verified_public_key_bit_map: Vec<u8>,
}

fn prefixed_hex<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| serde::de::Error::custom(format!("expected 0x-prefixed hex, got {:?}", s)))?;
    hex::decode(digits).map_err(serde::de::Error::custom)
}

fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

impl KeyRotationEvent {
    /// Parse and validate a JSON payload.
    pub fn from_json(data: &str) -> Result<Self, EventDecodeError> {
        let event: KeyRotationEvent =
            serde_json::from_str(data).map_err(|e| EventDecodeError::Malformed(e.to_string()))?;

        match event.public_key_scheme {
            PublicKeyScheme::MultiEd25519 => {
                let length = event.public_key.len();
                if length <= ED25519_PUBLIC_KEY_LENGTH
                    || (length - 1) % ED25519_PUBLIC_KEY_LENGTH != 0
                {
                    return Err(EventDecodeError::InvalidMultiEd25519Key { length });
                }
            }
            PublicKeyScheme::MultiKey if !event.account_public_key_too_long() => {
                MultiKey::from_bcs(&event.public_key)?;
            }
            _ => {}
        }
        Ok(event)
    }

    fn account_public_key_too_long(&self) -> bool {
        2 + 2 * self.public_key.len() > MAX_ACCOUNT_PUBLIC_KEY_LENGTH
    }

    pub fn new_auth_key_hex(&self) -> String {
        to_hex(&self.new_auth_key)
    }

    pub fn old_auth_key_hex(&self) -> String {
        to_hex(&self.old_auth_key)
    }

    /// Bit positions set in the verification bitmap, most significant bit first.
    pub fn verified_public_key_indices(&self) -> Vec<usize> {
        let mut indices = Vec::new();
        for (byte_idx, byte) in self.verified_public_key_bit_map.iter().enumerate() {
            for bit_idx in 0..8 {
                if byte & (0x80 >> bit_idx) != 0 {
                    indices.push(byte_idx * 8 + bit_idx);
                }
            }
        }
        indices
    }

    /// Member keys of a multi-ed25519 key, without the threshold byte.
    fn multi_ed25519_members(&self) -> Vec<Member> {
        let keys_end = self.public_key.len().saturating_sub(1);
        self.public_key[..keys_end]
            .chunks_exact(ED25519_PUBLIC_KEY_LENGTH)
            .map(|key| Member {
                public_key: to_hex(key),
                public_key_type: ED25519_KEY_TYPE,
            })
            .collect()
    }

    fn multi_key_members(&self) -> Result<Vec<Member>, EventDecodeError> {
        MultiKey::from_bcs(&self.public_key)?
            .public_keys
            .iter()
            .map(|key| {
                Ok(Member {
                    public_key: to_hex(&key.key_bytes()?),
                    public_key_type: key.key_type(),
                })
            })
            .collect()
    }

    /// Key-set members and their signature type, if the scheme has any.
    fn key_set_members(&self, version: Version) -> Option<(Vec<Member>, &'static str)> {
        match self.public_key_scheme {
            PublicKeyScheme::MultiEd25519 => {
                Some((self.multi_ed25519_members(), MULTI_ED25519_SIGNATURE_TYPE))
            }
            PublicKeyScheme::MultiKey => {
                if self.account_public_key_too_long() {
                    tracing::warn!(
                        version,
                        length = self.public_key.len(),
                        "[ledger] Multi-key public key too long, skipping key-set members"
                    );
                    return None;
                }
                match self.multi_key_members() {
                    Ok(members) => Some((members, MULTI_KEY_SIGNATURE_TYPE)),
                    Err(e) => {
                        tracing::warn!(version, error = %e, "[ledger] Skipping undecodable multi-key");
                        None
                    }
                }
            }
            PublicKeyScheme::Ed25519 | PublicKeyScheme::SingleKey => None,
        }
    }

    /// Identity facts implied by this rotation at `version`.
    ///
    /// The old auth key is revoked explicitly; the store itself never
    /// flips sibling rows.
    pub fn to_identity_events(&self, account_address: &str, version: Version) -> Vec<IdentityEvent> {
        let new_auth_key = self.new_auth_key_hex();
        let mut events = Vec::new();

        if self.old_auth_key != self.new_auth_key {
            events.push(
                AuthKeyEvent {
                    account_address: account_address.to_string(),
                    auth_key: self.old_auth_key_hex(),
                    is_auth_key_used: false,
                    version,
                }
                .into(),
            );
        }

        events.push(
            AuthKeyEvent {
                account_address: account_address.to_string(),
                auth_key: new_auth_key.clone(),
                is_auth_key_used: true,
                version,
            }
            .into(),
        );

        if let Some((members, signature_type)) = self.key_set_members(version) {
            let verified = self.verified_public_key_indices();
            let account_public_key = to_hex(&self.public_key);

            for (idx, member) in members.into_iter().enumerate() {
                events.push(
                    PublicKeyMembership {
                        auth_key: new_auth_key.clone(),
                        public_key: member.public_key,
                        public_key_type: member.public_key_type.to_string(),
                        account_public_key: Some(account_public_key.clone()),
                        is_public_key_used: verified.contains(&idx),
                        signature_type: signature_type.to_string(),
                        version,
                    }
                    .into(),
                );
            }
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::multi_key::AnyPublicKey;

    fn multi_ed25519_payload(members: usize, bitmap: &str) -> String {
        let mut key = String::new();
        for i in 0..members {
            key.push_str(&format!("{:02x}", i + 1).repeat(32));
        }
        key.push_str("02"); // threshold
        format!(
            r#"{{"new_auth_key":"0xaa","old_auth_key":"0xbb","public_key":"0x{}","public_key_scheme":1,"verified_public_key_bit_map":"{}"}}"#,
            key, bitmap
        )
    }

    #[test]
    fn test_bitmap_msb_first() {
        let event = KeyRotationEvent::from_json(&multi_ed25519_payload(3, "0xc0000000")).unwrap();
        assert_eq!(event.verified_public_key_indices(), vec![0, 1]);
    }

    #[test]
    fn test_bitmap_across_bytes() {
        let event = KeyRotationEvent::from_json(&multi_ed25519_payload(3, "0x0180")).unwrap();
        assert_eq!(event.verified_public_key_indices(), vec![7, 8]);
    }

    #[test]
    fn test_multi_ed25519_events() {
        let event = KeyRotationEvent::from_json(&multi_ed25519_payload(3, "0xa0000000")).unwrap();
        let events = event.to_identity_events("0x1", 42);

        assert_eq!(events.len(), 5);
        match &events[0] {
            IdentityEvent::AuthKey(e) => {
                assert_eq!(e.auth_key, "0xbb");
                assert!(!e.is_auth_key_used);
            }
            other => panic!("Expected revoke, got {:?}", other),
        }
        match &events[1] {
            IdentityEvent::AuthKey(e) => {
                assert_eq!(e.auth_key, "0xaa");
                assert!(e.is_auth_key_used);
                assert_eq!(e.version, 42);
            }
            other => panic!("Expected new auth key, got {:?}", other),
        }

        let used: Vec<bool> = events[2..]
            .iter()
            .map(|e| match e {
                IdentityEvent::PublicKeyMembership(m) => {
                    assert_eq!(m.public_key_type, "ed25519");
                    assert_eq!(m.signature_type, "multi_ed25519_signature");
                    assert_eq!(m.public_key.len(), 2 + 64);
                    assert_eq!(m.account_public_key.as_ref().map(|k| k.len()), Some(2 + 194));
                    m.is_public_key_used
                }
                other => panic!("Expected membership, got {:?}", other),
            })
            .collect();
        assert_eq!(used, vec![true, false, true]);
    }

    #[test]
    fn test_same_auth_key_emits_no_revoke() {
        let event = KeyRotationEvent::from_json(
            r#"{"new_auth_key":"0xaa","old_auth_key":"0xaa","public_key":"0x11","public_key_scheme":0,"verified_public_key_bit_map":"0x80000000"}"#,
        )
        .unwrap();
        let events = event.to_identity_events("0x1", 7);
        assert_eq!(events.len(), 1);
    }

    fn multi_key_payload(multi_key: &MultiKey, bitmap: &str) -> String {
        format!(
            r#"{{"new_auth_key":"0xaa","old_auth_key":"0xbb","public_key":"0x{}","public_key_scheme":3,"verified_public_key_bit_map":"{}"}}"#,
            hex::encode(bcs::to_bytes(multi_key).unwrap()),
            bitmap
        )
    }

    #[test]
    fn test_multi_key_events() {
        let multi_key = MultiKey {
            public_keys: vec![
                AnyPublicKey::Ed25519 {
                    public_key: vec![0x11; 32],
                },
                AnyPublicKey::Secp256k1Ecdsa {
                    public_key: vec![0x22; 65],
                },
                AnyPublicKey::Secp256r1Ecdsa {
                    public_key: vec![0x33; 65],
                },
            ],
            signatures_required: 2,
        };
        let event = KeyRotationEvent::from_json(&multi_key_payload(&multi_key, "0xa0000000")).unwrap();
        let events = event.to_identity_events("0x1", 9);

        assert_eq!(events.len(), 5);
        let account_public_key = format!("0x{}", hex::encode(bcs::to_bytes(&multi_key).unwrap()));
        let members: Vec<(String, String, bool)> = events[2..]
            .iter()
            .map(|e| match e {
                IdentityEvent::PublicKeyMembership(m) => {
                    assert_eq!(m.auth_key, "0xaa");
                    assert_eq!(m.signature_type, "multi_key_signature");
                    assert_eq!(m.account_public_key.as_ref(), Some(&account_public_key));
                    assert_eq!(m.version, 9);
                    (m.public_key.clone(), m.public_key_type.clone(), m.is_public_key_used)
                }
                other => panic!("Expected membership, got {:?}", other),
            })
            .collect();
        assert_eq!(
            members,
            vec![
                (format!("0x{}", "11".repeat(32)), "ed25519".to_string(), true),
                (format!("0x{}", "22".repeat(65)), "secp256k1_ecdsa".to_string(), false),
                (format!("0x{}", "33".repeat(65)), "secp256r1_ecdsa".to_string(), true),
            ]
        );
    }

    #[test]
    fn test_oversized_multi_key_emits_auth_links_only() {
        let multi_key = MultiKey {
            public_keys: (0..100)
                .map(|i| AnyPublicKey::Secp256r1Ecdsa {
                    public_key: vec![i as u8; 65],
                })
                .collect(),
            signatures_required: 1,
        };
        let event = KeyRotationEvent::from_json(&multi_key_payload(&multi_key, "0x80")).unwrap();
        assert!(to_hex(&event.public_key).len() > MAX_ACCOUNT_PUBLIC_KEY_LENGTH);

        let events = event.to_identity_events("0x1", 7);
        assert_eq!(events.len(), 2);
        assert!(events
            .iter()
            .all(|e| matches!(e, IdentityEvent::AuthKey(_))));
    }

    #[test]
    fn test_undecodable_multi_key_rejected() {
        let result = KeyRotationEvent::from_json(
            r#"{"new_auth_key":"0xaa","old_auth_key":"0xbb","public_key":"0x020011","public_key_scheme":3,"verified_public_key_bit_map":"0xc0000000"}"#,
        );
        assert!(matches!(result, Err(EventDecodeError::InvalidMultiKey(_))));
    }

    #[test]
    fn test_missing_prefix_rejected() {
        let result = KeyRotationEvent::from_json(
            r#"{"new_auth_key":"aa","old_auth_key":"0xbb","public_key":"0x11","public_key_scheme":0,"verified_public_key_bit_map":"0x00"}"#,
        );
        match result {
            Err(EventDecodeError::Malformed(msg)) => assert!(msg.contains("0x")),
            other => panic!("Expected Malformed, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_scheme_rejected() {
        let result = KeyRotationEvent::from_json(
            r#"{"new_auth_key":"0xaa","old_auth_key":"0xbb","public_key":"0x11","public_key_scheme":9,"verified_public_key_bit_map":"0x00"}"#,
        );
        assert!(matches!(result, Err(EventDecodeError::Malformed(_))));
    }

    #[test]
    fn test_truncated_multi_ed25519_rejected() {
        let result = KeyRotationEvent::from_json(
            r#"{"new_auth_key":"0xaa","old_auth_key":"0xbb","public_key":"0x1102","public_key_scheme":1,"verified_public_key_bit_map":"0x80"}"#,
        );
        assert_eq!(
            result,
            Err(EventDecodeError::InvalidMultiEd25519Key { length: 2 })
        );
    }
}
