//! Core data types for ring settlement
//!
//! ## Types
//!
//! - [`OrderRecord`]: One order's terms and computed fill state
//! - [`TransferItem`]: One atomic value movement
//! - [`SettlementPlan`]: Ring hash, fills and transfers of a settled ring
//!
//! ## Amounts
//!
//! All amounts are `U256` in token base units. See [`units`] for the
//! checked multiply-then-divide helpers and decimal conversion.

mod order;
mod transfer;
mod plan;
pub mod units;

// Re-export all types at module level
pub use order::{OrderRecord, CANONICAL_ORDER_LEN};
pub use transfer::TransferItem;
pub use plan::{OrderFill, SettlementPlan};
