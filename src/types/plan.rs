//! Settlement plan: the full outcome of settling one ring.
//!
//! A plan bundles the ring identity hash, each order's resolved fill state
//! and the ordered transfer list handed to the settlement executor.

use std::collections::BTreeMap;

use alloy_primitives::{Address, B256, U256};

use crate::types::{OrderRecord, TransferItem};
use crate::types::units::checked_add;
use crate::Result;

/// Resolved fill state of one order, as reported in a plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderFill {
    /// Order hash
    pub order_hash: B256,
    /// Order owner
    pub owner: Address,
    /// Token sold
    pub token_sell: Address,
    /// Sell quantity transferred to the previous order's owner
    pub fill_amount_sell: U256,
    /// Captured surplus, in sell-token units
    pub split_sell: U256,
    /// Fee charged, in the fee token
    pub fill_fee_amount: U256,
}

impl From<&OrderRecord> for OrderFill {
    fn from(order: &OrderRecord) -> Self {
        Self {
            order_hash: order.hash,
            owner: order.owner,
            token_sell: order.token_sell,
            fill_amount_sell: order.fill_amount_sell,
            split_sell: order.split_sell,
            fill_fee_amount: order.fill_fee_amount,
        }
    }
}

/// Settlement plan for a single ring.
///
/// ## Example
///
/// ```
/// use alloy_primitives::B256;
/// use ring_settlement::types::SettlementPlan;
///
/// let plan = SettlementPlan::new(B256::repeat_byte(0xab), vec![], vec![]);
/// assert!(plan.is_empty());
/// assert_eq!(plan.ring_hash_hex().len(), 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementPlan {
    /// Ring identity hash
    pub ring_hash: B256,

    /// Per-order fill state, in ring order
    pub fills: Vec<OrderFill>,

    /// Transfers to execute, in order
    pub transfers: Vec<TransferItem>,
}

impl SettlementPlan {
    /// Create a new plan
    pub fn new(ring_hash: B256, fills: Vec<OrderFill>, transfers: Vec<TransferItem>) -> Self {
        Self { ring_hash, fills, transfers }
    }

    /// Ring hash as a hex string
    pub fn ring_hash_hex(&self) -> String {
        hex::encode(self.ring_hash)
    }

    /// Number of transfers in the plan
    pub fn transfer_count(&self) -> usize {
        self.transfers.len()
    }

    /// Check if the plan moves nothing
    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }

    /// Sum of transferred amounts per token
    pub fn totals_by_token(&self) -> Result<BTreeMap<Address, U256>> {
        let mut totals: BTreeMap<Address, U256> = BTreeMap::new();
        for item in &self.transfers {
            let entry = totals.entry(item.token).or_insert(U256::ZERO);
            *entry = checked_add(*entry, item.amount, "token total")?;
        }
        Ok(totals)
    }

    /// Sum of `token` received by `account`
    pub fn received_by(&self, account: Address, token: Address) -> Result<U256> {
        self.transfers
            .iter()
            .filter(|t| t.to == account && t.token == token)
            .try_fold(U256::ZERO, |acc, t| checked_add(acc, t.amount, "received"))
    }

    /// Sum of `token` paid by `account`
    pub fn paid_by(&self, account: Address, token: Address) -> Result<U256> {
        self.transfers
            .iter()
            .filter(|t| t.from == account && t.token == token)
            .try_fold(U256::ZERO, |acc, t| checked_add(acc, t.amount, "paid"))
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::repeat_byte(b)
    }

    fn sample_plan() -> SettlementPlan {
        SettlementPlan::new(
            B256::repeat_byte(1),
            vec![],
            vec![
                TransferItem::new(addr(0x11), addr(0xaa), addr(0xbb), U256::from(20u64)),
                TransferItem::new(addr(0x22), addr(0xbb), addr(0xaa), U256::from(40u64)),
                TransferItem::new(addr(0x11), addr(0xaa), addr(0xee), U256::from(60u64)),
            ],
        )
    }

    #[test]
    fn test_plan_counts() {
        let plan = sample_plan();
        assert_eq!(plan.transfer_count(), 3);
        assert!(!plan.is_empty());
    }

    #[test]
    fn test_totals_by_token() {
        let totals = sample_plan().totals_by_token().unwrap();
        assert_eq!(totals[&addr(0x11)], U256::from(80u64));
        assert_eq!(totals[&addr(0x22)], U256::from(40u64));
    }

    #[test]
    fn test_paid_and_received() {
        let plan = sample_plan();
        assert_eq!(plan.paid_by(addr(0xaa), addr(0x11)).unwrap(), U256::from(80u64));
        assert_eq!(plan.received_by(addr(0xaa), addr(0x22)).unwrap(), U256::from(40u64));
        assert_eq!(plan.received_by(addr(0xcc), addr(0x22)).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_ring_hash_hex() {
        let plan = SettlementPlan::new(B256::repeat_byte(0xab), vec![], vec![]);
        let hex = plan.ring_hash_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_order_fill_from_record() {
        let mut order = OrderRecord::new(addr(0xaa), addr(0x11), U256::from(100u64), U256::from(50u64), U256::ZERO);
        order.split_sell = U256::from(7u64);
        let fill = OrderFill::from(&order);
        assert_eq!(fill.owner, addr(0xaa));
        assert_eq!(fill.split_sell, U256::from(7u64));
    }
}
