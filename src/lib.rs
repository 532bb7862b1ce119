//! # Ring Settlement
//!
//! Settlement of order rings for a peer-to-peer token exchange.
//!
//! A ring is a cyclic set of orders where each order's buy token is the next
//! order's sell token. Settling a ring decides how much every order actually
//! sells, how the surplus between limit rates is shared, what fee each
//! owner pays, and the exact list of token transfers that carries it out.
//!
//! ## Architecture
//!
//! - **Types**: `OrderRecord`, `TransferItem`, `SettlementPlan`, base-unit math
//! - **Context**: collaborator traits (scaler, registry, hasher) and
//!   in-memory implementations
//! - **Ring**: identity hashing, fill resolution, transfer building
//! - **Engine**: one-call `RingSettler`
//!
//! ## Design Principles
//!
//! 1. **Determinism**: identical inputs give identical hashes and transfers
//! 2. **Integer Math**: 256-bit unsigned amounts, multiply before divide,
//!    every overflow is an error
//! 3. **Fail Closed**: collaborator failures and timeouts invalidate the ring
//! 4. **All or Nothing**: a failed stage never leaves partial fills behind

// ============================================================================
// Module declarations
// ============================================================================

/// Core data types: OrderRecord, TransferItem, SettlementPlan
pub mod types;

/// Collaborators: scaler, token registry, digest hasher
pub mod context;

/// Ring pipeline: hashing, resolution, transfers
pub mod ring;

/// One-call settlement
pub mod engine;

/// Configuration loading
pub mod config;

/// Error type
pub mod error;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use config::Config;
pub use context::{RingContext, SpendableAmountScaler, TokenRegistry};
pub use engine::RingSettler;
pub use error::{Error, Result};
pub use ring::Ring;
pub use types::{OrderRecord, SettlementPlan, TransferItem};
