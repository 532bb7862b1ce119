//! Collaborators consumed by ring settlement.
//!
//! ## Seams
//!
//! The crate never reads chain state itself. Three traits stand in for the
//! outside world:
//!
//! - [`SpendableAmountScaler`]: caps an order by live balance and allowance
//! - [`TokenRegistry`]: batched check that every sell token is recognised
//! - [`DigestHasher`]: the cryptographic hash used for identity hashes
//!
//! Scaler and registry calls are async suspension points. Each is bounded
//! by [`CollaboratorPolicy::timeout`] and never retried here: a failure or
//! timeout invalidates the ring and the caller decides whether to try again.
//!
//! [`RingContext`] bundles the collaborators with the fee token and policy
//! and is shared by every ring built from it.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, B256};
use async_trait::async_trait;

use crate::config::Config;
use crate::types::OrderRecord;
use crate::Result;

pub mod digest;
pub mod memory;

pub use digest::{HashAlgorithm, Keccak256Hasher, Sha256Hasher};
pub use memory::{BalanceLedger, StaticTokenRegistry};

/// Caps an order's usable sell amount by the owner's live balance/allowance
#[async_trait]
pub trait SpendableAmountScaler: Send + Sync {
    /// Lower `order.fill_amount_sell` to what the owner can actually spend
    async fn scale(&self, order: &mut OrderRecord) -> Result<()>;
}

/// Batched token registry lookup
#[async_trait]
pub trait TokenRegistry: Send + Sync {
    /// `true` only if every token in `tokens` is registered
    async fn are_all_tokens_registered(&self, tokens: &[Address]) -> Result<bool>;
}

/// Cryptographic hash function
pub trait DigestHasher: Send + Sync {
    /// Hash `data` to a 32-byte digest
    fn digest(&self, data: &[u8]) -> B256;
}

/// How collaborator calls are bounded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollaboratorPolicy {
    /// Upper bound on each scaler or registry call
    pub timeout: Duration,

    /// Maximum scaler calls in flight for one ring
    pub scale_concurrency: usize,
}

impl Default for CollaboratorPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(5_000),
            scale_concurrency: 8,
        }
    }
}

/// Shared collaborators and settings for building rings
#[derive(Clone)]
pub struct RingContext {
    /// Spendable-amount scaler
    pub scaler: Arc<dyn SpendableAmountScaler>,

    /// Token registry
    pub registry: Arc<dyn TokenRegistry>,

    /// Identity hash function
    pub hasher: Arc<dyn DigestHasher>,

    /// Token fees are paid in
    pub fee_token: Address,

    /// Collaborator call bounds
    pub policy: CollaboratorPolicy,
}

impl std::fmt::Debug for RingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingContext")
            .field("fee_token", &self.fee_token)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl RingContext {
    /// Create a context with the default policy and Keccak-256 hashing
    pub fn new(
        scaler: Arc<dyn SpendableAmountScaler>,
        registry: Arc<dyn TokenRegistry>,
        fee_token: Address,
    ) -> Self {
        Self {
            scaler,
            registry,
            hasher: Arc::new(Keccak256Hasher),
            fee_token,
            policy: CollaboratorPolicy::default(),
        }
    }

    /// Create a context whose fee token, hasher and policy come from `config`
    pub fn from_config(
        config: &Config,
        scaler: Arc<dyn SpendableAmountScaler>,
        registry: Arc<dyn TokenRegistry>,
    ) -> Self {
        Self {
            scaler,
            registry,
            hasher: config.hash_algorithm.hasher(),
            fee_token: config.fee_token,
            policy: config.collaborator.policy(),
        }
    }

    /// Replace the hasher
    pub fn with_hasher(mut self, hasher: Arc<dyn DigestHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    /// Replace the collaborator policy
    pub fn with_policy(mut self, policy: CollaboratorPolicy) -> Self {
        self.policy = policy;
        self
    }
}
