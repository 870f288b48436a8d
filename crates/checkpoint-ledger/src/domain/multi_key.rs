//! # Multi-Key Public Keys
//!
//! BCS layout of a scheme-3 account key: a vector of tagged public keys
//! followed by the number of signatures required.

use serde::{Deserialize, Serialize};

use crate::domain::errors::EventDecodeError;

/// A multi-key account public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiKey {
    pub public_keys: Vec<AnyPublicKey>,
    pub signatures_required: u8,
}

/// One member of a multi-key, tagged by its scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnyPublicKey {
    Ed25519 { public_key: Vec<u8> },
    Secp256k1Ecdsa { public_key: Vec<u8> },
    Secp256r1Ecdsa { public_key: Vec<u8> },
    Keyless { public_key: KeylessPublicKey },
    FederatedKeyless { public_key: FederatedKeylessPublicKey },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeylessPublicKey {
    pub iss_val: String,
    pub idc: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederatedKeylessPublicKey {
    pub jwk_addr: [u8; 32],
    pub pk: KeylessPublicKey,
}

impl MultiKey {
    pub fn from_bcs(bytes: &[u8]) -> Result<Self, EventDecodeError> {
        bcs::from_bytes(bytes).map_err(|e| EventDecodeError::InvalidMultiKey(e.to_string()))
    }
}

impl AnyPublicKey {
    pub fn key_type(&self) -> &'static str {
        match self {
            AnyPublicKey::Ed25519 { .. } => "ed25519",
            AnyPublicKey::Secp256k1Ecdsa { .. } => "secp256k1_ecdsa",
            AnyPublicKey::Secp256r1Ecdsa { .. } => "secp256r1_ecdsa",
            AnyPublicKey::Keyless { .. } => "keyless",
            AnyPublicKey::FederatedKeyless { .. } => "federated_keyless",
        }
    }

    /// Key bytes without the scheme tag. Keyless keys are their BCS encoding.
    pub fn key_bytes(&self) -> Result<Vec<u8>, EventDecodeError> {
        let encoded = match self {
            AnyPublicKey::Ed25519 { public_key }
            | AnyPublicKey::Secp256k1Ecdsa { public_key }
            | AnyPublicKey::Secp256r1Ecdsa { public_key } => return Ok(public_key.clone()),
            AnyPublicKey::Keyless { public_key } => bcs::to_bytes(public_key),
            AnyPublicKey::FederatedKeyless { public_key } => bcs::to_bytes(public_key),
        };
        encoded.map_err(|e| EventDecodeError::InvalidMultiKey(e.to_string()))
    }
}
