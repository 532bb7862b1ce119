//! In-memory collaborators.
//!
//! [`BalanceLedger`] answers spendable-amount queries from balances,
//! allowances and per-order filled/cancelled amounts held in memory.
//! [`StaticTokenRegistry`] is a fixed token whitelist. Both are used by the
//! demo binary and the tests; production deployments plug chain-backed
//! implementations into the same traits.

use std::collections::{HashMap, HashSet};

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::context::{SpendableAmountScaler, TokenRegistry};
use crate::types::OrderRecord;
use crate::Result;

#[derive(Debug, Default)]
struct LedgerState {
    /// (token, owner) -> balance
    balances: HashMap<(Address, Address), U256>,
    /// (token, owner) -> allowance granted to the settlement contract
    allowances: HashMap<(Address, Address), U256>,
    /// order hash -> sell amount already settled
    filled: HashMap<B256, U256>,
    /// order hash -> sell amount cancelled by the owner
    cancelled: HashMap<B256, U256>,
}

/// Balance/allowance book implementing [`SpendableAmountScaler`].
///
/// An order's usable sell amount is
/// `min(amount_sell - filled - cancelled, balance, allowance)`.
#[derive(Debug, Default)]
pub struct BalanceLedger {
    state: RwLock<LedgerState>,
}

impl BalanceLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `owner`'s balance of `token`
    pub async fn set_balance(&self, token: Address, owner: Address, amount: U256) {
        self.state.write().await.balances.insert((token, owner), amount);
    }

    /// Set `owner`'s allowance of `token`
    pub async fn set_allowance(&self, token: Address, owner: Address, amount: U256) {
        self.state.write().await.allowances.insert((token, owner), amount);
    }

    /// Set both balance and allowance to `amount`
    pub async fn fund(&self, token: Address, owner: Address, amount: U256) {
        let mut state = self.state.write().await;
        state.balances.insert((token, owner), amount);
        state.allowances.insert((token, owner), amount);
    }

    /// `min(balance, allowance)` for `owner` in `token`
    pub async fn spendable(&self, token: Address, owner: Address) -> U256 {
        let state = self.state.read().await;
        let balance = state.balances.get(&(token, owner)).copied().unwrap_or_default();
        let allowance = state.allowances.get(&(token, owner)).copied().unwrap_or_default();
        balance.min(allowance)
    }

    /// Book the sell amounts (fill plus split) consumed by a settled ring
    pub async fn record_fills(&self, orders: &[OrderRecord]) {
        let mut state = self.state.write().await;
        for order in orders {
            let consumed = order.fill_amount_sell.saturating_add(order.split_sell);
            let entry = state.filled.entry(order.hash).or_default();
            *entry = entry.saturating_add(consumed);
        }
    }

    /// Cancel `amount` of the order identified by `order_hash`
    pub async fn cancel(&self, order_hash: B256, amount: U256) {
        let mut state = self.state.write().await;
        let entry = state.cancelled.entry(order_hash).or_default();
        *entry = entry.saturating_add(amount);
    }

    /// Sell amount already settled for an order
    pub async fn filled(&self, order_hash: B256) -> U256 {
        self.state.read().await.filled.get(&order_hash).copied().unwrap_or_default()
    }
}

#[async_trait]
impl SpendableAmountScaler for BalanceLedger {
    async fn scale(&self, order: &mut OrderRecord) -> Result<()> {
        let state = self.state.read().await;
        let key = (order.token_sell, order.owner);

        let balance = state.balances.get(&key).copied().unwrap_or_default();
        let allowance = state.allowances.get(&key).copied().unwrap_or_default();
        let filled = state.filled.get(&order.hash).copied().unwrap_or_default();
        let cancelled = state.cancelled.get(&order.hash).copied().unwrap_or_default();

        let remaining = order.amount_sell.saturating_sub(filled.saturating_add(cancelled));
        order.fill_amount_sell = remaining.min(balance).min(allowance);

        debug!(
            owner = %order.owner,
            token = %order.token_sell,
            %remaining,
            %balance,
            %allowance,
            fill_amount_sell = %order.fill_amount_sell,
            "scaled order by spendable amount"
        );
        Ok(())
    }
}

/// Fixed whitelist implementing [`TokenRegistry`]
#[derive(Debug, Default, Clone)]
pub struct StaticTokenRegistry {
    tokens: HashSet<Address>,
}

impl StaticTokenRegistry {
    /// Create a registry recognising `tokens`
    pub fn new(tokens: impl IntoIterator<Item = Address>) -> Self {
        Self { tokens: tokens.into_iter().collect() }
    }

    /// Add a token
    pub fn register(&mut self, token: Address) {
        self.tokens.insert(token);
    }

    /// Check a single token
    pub fn contains(&self, token: &Address) -> bool {
        self.tokens.contains(token)
    }
}

#[async_trait]
impl TokenRegistry for StaticTokenRegistry {
    async fn are_all_tokens_registered(&self, tokens: &[Address]) -> Result<bool> {
        Ok(tokens.iter().all(|t| self.tokens.contains(t)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::repeat_byte(b)
    }

    fn order(sell: u64) -> OrderRecord {
        let mut o = OrderRecord::new(addr(0xaa), addr(0x11), U256::from(sell), U256::from(50u64), U256::ZERO);
        o.hash = B256::repeat_byte(0x01);
        o
    }

    #[tokio::test]
    async fn test_scale_capped_by_balance() {
        let ledger = BalanceLedger::new();
        ledger.set_balance(addr(0x11), addr(0xaa), U256::from(30u64)).await;
        ledger.set_allowance(addr(0x11), addr(0xaa), U256::from(1_000u64)).await;

        let mut o = order(100);
        ledger.scale(&mut o).await.unwrap();
        assert_eq!(o.fill_amount_sell, U256::from(30u64));
    }

    #[tokio::test]
    async fn test_scale_capped_by_allowance() {
        let ledger = BalanceLedger::new();
        ledger.set_balance(addr(0x11), addr(0xaa), U256::from(1_000u64)).await;
        ledger.set_allowance(addr(0x11), addr(0xaa), U256::from(25u64)).await;

        let mut o = order(100);
        ledger.scale(&mut o).await.unwrap();
        assert_eq!(o.fill_amount_sell, U256::from(25u64));
    }

    #[tokio::test]
    async fn test_scale_unfunded_owner() {
        let ledger = BalanceLedger::new();
        let mut o = order(100);
        ledger.scale(&mut o).await.unwrap();
        assert_eq!(o.fill_amount_sell, U256::ZERO);
    }

    #[tokio::test]
    async fn test_scale_subtracts_filled_and_cancelled() {
        let ledger = BalanceLedger::new();
        ledger.fund(addr(0x11), addr(0xaa), U256::from(1_000u64)).await;

        let mut settled = order(100);
        settled.fill_amount_sell = U256::from(20u64);
        settled.split_sell = U256::from(10u64);
        ledger.record_fills(std::slice::from_ref(&settled)).await;
        ledger.cancel(settled.hash, U256::from(40u64)).await;
        assert_eq!(ledger.filled(settled.hash).await, U256::from(30u64));

        let mut o = order(100);
        ledger.scale(&mut o).await.unwrap();
        assert_eq!(o.fill_amount_sell, U256::from(30u64));
    }

    #[tokio::test]
    async fn test_spendable() {
        let ledger = BalanceLedger::new();
        ledger.set_balance(addr(0x11), addr(0xaa), U256::from(7u64)).await;
        ledger.set_allowance(addr(0x11), addr(0xaa), U256::from(9u64)).await;
        assert_eq!(ledger.spendable(addr(0x11), addr(0xaa)).await, U256::from(7u64));
        assert_eq!(ledger.spendable(addr(0x22), addr(0xaa)).await, U256::ZERO);
    }

    #[tokio::test]
    async fn test_registry() {
        let mut registry = StaticTokenRegistry::new([addr(0x11), addr(0x22)]);
        assert!(registry.are_all_tokens_registered(&[addr(0x11), addr(0x22), addr(0x11)]).await.unwrap());
        assert!(!registry.are_all_tokens_registered(&[addr(0x11), addr(0x33)]).await.unwrap());

        registry.register(addr(0x33));
        assert!(registry.contains(&addr(0x33)));
        assert!(registry.are_all_tokens_registered(&[addr(0x33)]).await.unwrap());
    }
}
