//! # Identity Events
//!
//! Key-association facts extracted from transactions, folded into the
//! identity tables by `IdentityRotationApi`.

use std::collections::HashMap;

use shared_types::Version;

/// An account is (or is no longer) authenticated through an auth key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthKeyEvent {
    pub account_address: String,
    pub auth_key: String,
    pub is_auth_key_used: bool,
    pub version: Version,
}

/// A public key is (or is no longer) a member of an auth key's key set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyMembership {
    pub auth_key: String,
    pub public_key: String,
    pub public_key_type: String,
    /// Full serialized account key the member was extracted from.
    pub account_public_key: Option<String>,
    pub is_public_key_used: bool,
    pub signature_type: String,
    pub version: Version,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityEvent {
    AuthKey(AuthKeyEvent),
    PublicKeyMembership(PublicKeyMembership),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum RowKey {
    AuthKey(String, String),
    Membership(String, String, String),
}

impl IdentityEvent {
    pub fn version(&self) -> Version {
        match self {
            IdentityEvent::AuthKey(e) => e.version,
            IdentityEvent::PublicKeyMembership(e) => e.version,
        }
    }

    fn row_key(&self) -> RowKey {
        match self {
            IdentityEvent::AuthKey(e) => {
                RowKey::AuthKey(e.account_address.clone(), e.auth_key.clone())
            }
            IdentityEvent::PublicKeyMembership(e) => RowKey::Membership(
                e.auth_key.clone(),
                e.public_key.clone(),
                e.public_key_type.clone(),
            ),
        }
    }
}

impl From<AuthKeyEvent> for IdentityEvent {
    fn from(event: AuthKeyEvent) -> Self {
        IdentityEvent::AuthKey(event)
    }
}

impl From<PublicKeyMembership> for IdentityEvent {
    fn from(event: PublicKeyMembership) -> Self {
        IdentityEvent::PublicKeyMembership(event)
    }
}

/// Ordered identity events of one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityBatch {
    events: Vec<IdentityEvent>,
}

impl IdentityBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: impl Into<IdentityEvent>) {
        self.events.push(event.into());
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[IdentityEvent] {
        &self.events
    }

    /// One event per row key: the highest version wins, and on equal
    /// versions the later event replaces the earlier one in place.
    pub fn coalesced(&self) -> Vec<IdentityEvent> {
        let mut slots: HashMap<RowKey, usize> = HashMap::new();
        let mut out: Vec<IdentityEvent> = Vec::with_capacity(self.events.len());

        for event in &self.events {
            match slots.get(&event.row_key()) {
                Some(&idx) => {
                    if event.version() >= out[idx].version() {
                        out[idx] = event.clone();
                    }
                }
                None => {
                    slots.insert(event.row_key(), out.len());
                    out.push(event.clone());
                }
            }
        }
        out
    }
}

impl From<Vec<IdentityEvent>> for IdentityBatch {
    fn from(events: Vec<IdentityEvent>) -> Self {
        Self { events }
    }
}

impl FromIterator<IdentityEvent> for IdentityBatch {
    fn from_iter<I: IntoIterator<Item = IdentityEvent>>(iter: I) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}

impl Extend<IdentityEvent> for IdentityBatch {
    fn extend<I: IntoIterator<Item = IdentityEvent>>(&mut self, iter: I) {
        self.events.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth(account: &str, key: &str, used: bool, version: Version) -> IdentityEvent {
        AuthKeyEvent {
            account_address: account.into(),
            auth_key: key.into(),
            is_auth_key_used: used,
            version,
        }
        .into()
    }

    #[test]
    fn test_coalesce_keeps_last_per_key() {
        let batch: IdentityBatch = vec![
            auth("0x1", "0xa", true, 10),
            auth("0x2", "0xb", true, 10),
            auth("0x1", "0xa", false, 11),
        ]
        .into();

        let events = batch.coalesced();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], auth("0x1", "0xa", false, 11));
        assert_eq!(events[1], auth("0x2", "0xb", true, 10));
    }

    #[test]
    fn test_coalesce_ignores_older_event_later_in_batch() {
        let batch: IdentityBatch = vec![
            auth("0x1", "0xa", false, 12),
            auth("0x1", "0xa", true, 11),
            auth("0x1", "0xa", true, 12),
        ]
        .into();

        let events = batch.coalesced();
        assert_eq!(events, vec![auth("0x1", "0xa", true, 12)]);

        let batch: IdentityBatch =
            vec![auth("0x1", "0xa", false, 12), auth("0x1", "0xa", true, 11)].into();
        assert_eq!(batch.coalesced(), vec![auth("0x1", "0xa", false, 12)]);
    }

    #[test]
    fn test_membership_key_includes_type() {
        let member = |ty: &str| -> IdentityEvent {
            PublicKeyMembership {
                auth_key: "0xa".into(),
                public_key: "0xpk".into(),
                public_key_type: ty.into(),
                account_public_key: None,
                is_public_key_used: true,
                signature_type: "ed25519_signature".into(),
                version: 1,
            }
            .into()
        };

        let batch: IdentityBatch = vec![member("ed25519"), member("secp256k1_ecdsa")].into();
        assert_eq!(batch.coalesced().len(), 2);
    }
}
