//! Transfer item: one atomic value movement emitted for a settled ring.
//!
//! Transfer items are produced, never stored. The settlement executor
//! consumes the list in order.

use std::fmt;

use alloy_primitives::{Address, U256};

/// A single token transfer.
///
/// ## Example
///
/// ```
/// use alloy_primitives::{Address, U256};
/// use ring_settlement::types::TransferItem;
///
/// let item = TransferItem::new(
///     Address::repeat_byte(0x11),   // token
///     Address::repeat_byte(0xaa),   // from
///     Address::repeat_byte(0xbb),   // to
///     U256::from(20u64),            // amount
/// );
/// assert!(!item.is_zero());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransferItem {
    /// Token being moved
    pub token: Address,

    /// Paying account
    pub from: Address,

    /// Receiving account
    pub to: Address,

    /// Amount in the token's base units
    pub amount: U256,
}

impl TransferItem {
    /// Create a new transfer item
    pub fn new(token: Address, from: Address, to: Address, amount: U256) -> Self {
        Self { token, from, to, amount }
    }

    /// Zero-amount items are never emitted
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }
}

impl fmt::Display for TransferItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} -> {} (token {})", self.amount, self.from, self.to, self.token)
    }
}
