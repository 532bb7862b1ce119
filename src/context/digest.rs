//! Digest hashers used for order and ring identity hashes.
//!
//! - [`Keccak256Hasher`]: Ethereum convention, the default
//! - [`Sha256Hasher`]: SHA-256, matching state-root style hashing

use std::sync::Arc;

use alloy_primitives::{keccak256, B256};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::context::DigestHasher;

/// Selectable hash function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// Keccak-256
    #[default]
    Keccak256,
    /// SHA-256
    Sha256,
}

impl HashAlgorithm {
    /// Build the hasher for this algorithm
    pub fn hasher(self) -> Arc<dyn DigestHasher> {
        match self {
            HashAlgorithm::Keccak256 => Arc::new(Keccak256Hasher),
            HashAlgorithm::Sha256 => Arc::new(Sha256Hasher),
        }
    }
}

impl std::str::FromStr for HashAlgorithm {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "keccak256" | "keccak" => Ok(HashAlgorithm::Keccak256),
            "sha256" => Ok(HashAlgorithm::Sha256),
            other => Err(crate::Error::Configuration(format!("unknown hash algorithm '{other}'"))),
        }
    }
}

/// Keccak-256 hasher
#[derive(Debug, Clone, Copy, Default)]
pub struct Keccak256Hasher;

impl DigestHasher for Keccak256Hasher {
    fn digest(&self, data: &[u8]) -> B256 {
        keccak256(data)
    }
}

/// SHA-256 hasher
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl DigestHasher for Sha256Hasher {
    fn digest(&self, data: &[u8]) -> B256 {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let out: [u8; 32] = hasher.finalize().into();
        B256::from(out)
    }
}
