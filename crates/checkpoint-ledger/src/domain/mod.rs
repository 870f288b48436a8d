//! # Domain Layer
//!
//! Pure types of the checkpoint ledger: persisted rows, outcomes, errors,
//! identity events and the key layout. No I/O happens here.

pub mod entities;
pub mod errors;
pub mod identity;
pub mod keys;
pub mod multi_key;
pub mod rotation;

pub use entities::*;
pub use errors::{EventDecodeError, KVStoreError, LedgerError, SerializationError};
pub use identity::{AuthKeyEvent, IdentityBatch, IdentityEvent, PublicKeyMembership};
pub use keys::KeyPrefix;
pub use multi_key::{AnyPublicKey, MultiKey};
pub use rotation::{KeyRotationEvent, PublicKeyScheme};
