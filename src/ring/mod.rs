//! Ring of orders and its settlement pipeline.
//!
//! ## Pipeline
//!
//! ```text
//! Ring::new -> update_hash -> check_orders_valid -> check_tokens_registered
//!           -> calculate_fill_amount_and_fee -> get_ring_transfer_items
//! ```
//!
//! The ring owns its orders as a flat `Vec`; order `i`'s neighbour is
//! `(i + 1) % n`. Each stage takes the ring by `&mut` so no two stages can
//! touch the buffer at once.
//!
//! ## Validity
//!
//! `valid` starts `true` and only ever goes down: an invalid order, a
//! registry miss, a collaborator failure or a fatal arithmetic error all
//! clear it. Resolution and transfer building refuse an invalid ring.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use alloy_primitives::{Address, U256};
//! use ring_settlement::context::{BalanceLedger, RingContext, StaticTokenRegistry};
//! use ring_settlement::ring::Ring;
//! use ring_settlement::types::OrderRecord;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> ring_settlement::Result<()> {
//! let (t1, t2) = (Address::repeat_byte(0x01), Address::repeat_byte(0x02));
//! let (alice, bob) = (Address::repeat_byte(0xaa), Address::repeat_byte(0xbb));
//!
//! let ledger = Arc::new(BalanceLedger::new());
//! ledger.fund(t1, alice, U256::from(1_000u64)).await;
//! ledger.fund(t2, bob, U256::from(1_000u64)).await;
//! let registry = Arc::new(StaticTokenRegistry::new([t1, t2]));
//! let context = Arc::new(RingContext::new(ledger, registry, Address::repeat_byte(0xfe)));
//!
//! let orders = vec![
//!     OrderRecord::new(alice, t1, U256::from(100u64), U256::from(50u64), U256::ZERO),
//!     OrderRecord::new(bob, t2, U256::from(50u64), U256::from(100u64), U256::ZERO),
//! ];
//! let mut ring = Ring::new(context, orders, alice, Address::repeat_byte(0xee))?;
//! ring.update_hash();
//! ring.check_orders_valid();
//! ring.check_tokens_registered().await?;
//! ring.calculate_fill_amount_and_fee().await?;
//!
//! let items = ring.get_ring_transfer_items(20)?;
//! assert_eq!(items.len(), 2);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use alloy_primitives::{Address, B256};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::context::RingContext;
use crate::types::{OrderRecord, TransferItem};
use crate::{Error, Result};

pub mod hasher;
pub mod resolver;
pub mod transfers;

/// A cyclic sequence of orders settled together
#[derive(Debug, Clone)]
pub struct Ring {
    context: Arc<RingContext>,

    orders: Vec<OrderRecord>,

    /// Submitter of the ring
    pub owner: Address,

    /// Receiver of fees and margin not shared with wallets
    pub fee_recipient: Address,

    /// Ring identity hash, set by [`Ring::update_hash`]
    pub hash: B256,

    /// Aggregate validity
    pub valid: bool,

    resolved: bool,
}

impl Ring {
    /// Construct a ring.
    ///
    /// Sets every order's buy token from the next order's sell token and
    /// computes each order's hash with the context's hasher.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidRing`] if fewer than two orders are given.
    pub fn new(
        context: Arc<RingContext>,
        mut orders: Vec<OrderRecord>,
        owner: Address,
        fee_recipient: Address,
    ) -> Result<Self> {
        let n = orders.len();
        if n < 2 {
            return Err(Error::InvalidRing(format!("ring needs at least 2 orders, got {n}")));
        }

        for i in 0..n {
            orders[i].token_buy = orders[(i + 1) % n].token_sell;
        }
        hasher::hash_orders(&mut orders, context.hasher.as_ref());

        Ok(Self {
            context,
            orders,
            owner,
            fee_recipient,
            hash: B256::ZERO,
            valid: true,
            resolved: false,
        })
    }

    /// Number of orders
    #[inline]
    pub fn size(&self) -> usize {
        self.orders.len()
    }

    /// Orders in ring order
    #[inline]
    pub fn orders(&self) -> &[OrderRecord] {
        &self.orders
    }

    /// Whether fills have been resolved
    #[inline]
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Recompute the ring hash from the current order hashes
    pub fn update_hash(&mut self) {
        self.hash = hasher::ring_hash(&self.orders, self.context.hasher.as_ref());
        debug!(ring_hash = %self.hash, "ring hash updated");
    }

    /// Fold every order's validity flag into the ring's
    pub fn check_orders_valid(&mut self) {
        if let Some(i) = self.orders.iter().position(|o| !o.valid) {
            warn!(ring_hash = %self.hash, order = i, "ring contains an invalid order");
            self.valid = false;
        }
    }

    /// Ask the registry whether every sell token is registered.
    ///
    /// A `false` answer clears `valid` and returns `Ok`. A registry error or
    /// timeout clears `valid` and returns [`Error::CollaboratorFailure`].
    pub async fn check_tokens_registered(&mut self) -> Result<()> {
        let tokens: Vec<Address> = self.orders.iter().map(|o| o.token_sell).collect();
        let registry = Arc::clone(&self.context.registry);
        let timeout = self.context.policy.timeout;

        let outcome = tokio::time::timeout(timeout, registry.are_all_tokens_registered(&tokens)).await;
        match outcome {
            Ok(Ok(true)) => Ok(()),
            Ok(Ok(false)) => {
                warn!(ring_hash = %self.hash, "ring contains an unregistered token");
                self.valid = false;
                Ok(())
            }
            Ok(Err(e)) => Err(self.invalidate(Error::CollaboratorFailure(format!(
                "token registry: {e}"
            )))),
            Err(_) => Err(self.invalidate(Error::CollaboratorFailure(format!(
                "token registry timed out after {:?}",
                timeout
            )))),
        }
    }

    /// Scale every order by its spendable amount, then resolve fills,
    /// splits and fees.
    ///
    /// Scaling runs concurrently (bounded by the context policy) and is
    /// joined before resolution. Resolution works on a copy of the orders
    /// and is committed only if it succeeds.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidRing`] - ring already invalid, or an order has no
    ///   spendable amount
    /// * [`Error::CollaboratorFailure`] - a scaler call failed or timed out
    /// * [`Error::InvariantViolation`] - negative margin during resolution
    /// * [`Error::ArithmeticOverflow`] / [`Error::DivisionByZero`]
    pub async fn calculate_fill_amount_and_fee(&mut self) -> Result<()> {
        if !self.valid {
            return Err(Error::InvalidRing("ring is not valid".into()));
        }
        self.resolved = false;

        self.scale_orders().await?;

        let mut scratch = self.orders.clone();
        match resolver::resolve(&mut scratch) {
            Ok(anchor) => {
                self.orders = scratch;
                self.resolved = true;
                info!(ring_hash = %self.hash, size = self.size(), anchor, "ring fills resolved");
                Ok(())
            }
            Err(e) if e.invalidates_ring() => Err(self.invalidate(e)),
            Err(e) => Err(e),
        }
    }

    /// Build the transfer list for the resolved ring.
    ///
    /// # Arguments
    ///
    /// * `wallet_split_percentage` - Share for referring wallets, 0..=100
    ///
    /// # Errors
    ///
    /// * [`Error::Configuration`] - percentage below 0 or above 100
    /// * [`Error::InvalidRing`] - ring invalid or not yet resolved
    /// * [`Error::InvariantViolation`] - an order failed its bound checks
    pub fn get_ring_transfer_items(&self, wallet_split_percentage: i64) -> Result<Vec<TransferItem>> {
        let pct = u8::try_from(wallet_split_percentage)
            .ok()
            .filter(|p| *p <= 100)
            .ok_or_else(|| {
                Error::Configuration(format!(
                    "wallet_split_percentage {wallet_split_percentage} outside 0..=100"
                ))
            })?;

        if !self.valid {
            return Err(Error::InvalidRing("ring is not valid".into()));
        }
        if !self.resolved {
            return Err(Error::InvalidRing("fill amounts have not been resolved".into()));
        }

        let items = transfers::build_transfer_items(
            &self.orders,
            self.fee_recipient,
            self.context.fee_token,
            pct,
        )?;
        debug!(ring_hash = %self.hash, items = items.len(), "transfer items built");
        Ok(items)
    }

    async fn scale_orders(&mut self) -> Result<()> {
        let scaler = Arc::clone(&self.context.scaler);
        let policy = self.context.policy;

        for order in &mut self.orders {
            order.reset_fills();
        }

        let failures: Vec<(usize, Error)> = stream::iter(self.orders.iter_mut().enumerate())
            .map(|(i, order)| {
                let scaler = &scaler;
                async move {
                    let outcome = match tokio::time::timeout(policy.timeout, scaler.scale(order)).await {
                        Ok(result) => result,
                        Err(_) => Err(Error::CollaboratorFailure(format!(
                            "scaler timed out after {:?}",
                            policy.timeout
                        ))),
                    };
                    if outcome.is_err() {
                        order.valid = false;
                    }
                    (i, outcome)
                }
            })
            .buffer_unordered(policy.scale_concurrency.max(1))
            .filter_map(|(i, outcome)| async move { outcome.err().map(|e| (i, e)) })
            .collect()
            .await;

        if let Some((i, e)) = failures.into_iter().min_by_key(|(i, _)| *i) {
            return Err(self.invalidate(match e {
                Error::CollaboratorFailure(msg) => {
                    Error::CollaboratorFailure(format!("scaling order {i}: {msg}"))
                }
                other => Error::CollaboratorFailure(format!("scaling order {i}: {other}")),
            }));
        }

        if let Some(i) = self.orders.iter().position(|o| o.fill_amount_sell.is_zero()) {
            self.orders[i].valid = false;
            return Err(self.invalidate(Error::InvalidRing(format!(
                "order {i} has no spendable amount"
            ))));
        }

        Ok(())
    }

    fn invalidate(&mut self, error: Error) -> Error {
        warn!(ring_hash = %self.hash, %error, "ring invalidated");
        self.valid = false;
        error
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{
        BalanceLedger, CollaboratorPolicy, SpendableAmountScaler, StaticTokenRegistry, TokenRegistry,
    };
    use alloy_primitives::U256;
    use async_trait::async_trait;
    use std::time::Duration;

    fn addr(b: u8) -> Address {
        Address::repeat_byte(b)
    }

    fn u(v: u64) -> U256 {
        U256::from(v)
    }

    struct FailingScaler;

    #[async_trait]
    impl SpendableAmountScaler for FailingScaler {
        async fn scale(&self, order: &mut OrderRecord) -> Result<()> {
            if order.owner == addr(0xbb) {
                Err(Error::CollaboratorFailure("balance lookup failed".into()))
            } else {
                Ok(())
            }
        }
    }

    struct SlowScaler;

    #[async_trait]
    impl SpendableAmountScaler for SlowScaler {
        async fn scale(&self, _order: &mut OrderRecord) -> Result<()> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }

    struct BrokenRegistry;

    #[async_trait]
    impl TokenRegistry for BrokenRegistry {
        async fn are_all_tokens_registered(&self, _tokens: &[Address]) -> Result<bool> {
            Err(Error::CollaboratorFailure("registry unreachable".into()))
        }
    }

    async fn funded_context() -> Arc<RingContext> {
        let ledger = Arc::new(BalanceLedger::new());
        ledger.fund(addr(0x01), addr(0xaa), U256::MAX).await;
        ledger.fund(addr(0x02), addr(0xbb), U256::MAX).await;
        let registry = Arc::new(StaticTokenRegistry::new([addr(0x01), addr(0x02)]));
        Arc::new(RingContext::new(ledger, registry, addr(0xfe)))
    }

    fn example_orders() -> Vec<OrderRecord> {
        vec![
            OrderRecord::new(addr(0xaa), addr(0x01), u(100), u(50), u(10)).with_wallet(addr(0xdd)),
            OrderRecord::new(addr(0xbb), addr(0x02), u(40), u(20), u(4)),
        ]
    }

    async fn resolved_ring() -> Ring {
        let mut ring = Ring::new(funded_context().await, example_orders(), addr(0xaa), addr(0xee)).unwrap();
        ring.update_hash();
        ring.check_orders_valid();
        ring.check_tokens_registered().await.unwrap();
        ring.calculate_fill_amount_and_fee().await.unwrap();
        ring
    }

    #[tokio::test]
    async fn test_new_links_tokens_and_hashes() {
        let ring = Ring::new(funded_context().await, example_orders(), addr(0xaa), addr(0xee)).unwrap();
        assert_eq!(ring.size(), 2);
        assert_eq!(ring.orders()[0].token_buy, addr(0x02));
        assert_eq!(ring.orders()[1].token_buy, addr(0x01));
        assert!(ring.orders().iter().all(|o| o.hash != B256::ZERO));
        assert!(ring.valid);
        assert!(!ring.is_resolved());
    }

    #[tokio::test]
    async fn test_new_rejects_single_order() {
        let orders = vec![example_orders().remove(0)];
        let err = Ring::new(funded_context().await, orders, addr(0xaa), addr(0xee)).unwrap_err();
        assert!(matches!(err, Error::InvalidRing(_)));
    }

    #[tokio::test]
    async fn test_update_hash_order_sensitive() {
        let context = funded_context().await;
        let mut forward = Ring::new(context.clone(), example_orders(), addr(0xaa), addr(0xee)).unwrap();
        let mut again = Ring::new(context.clone(), example_orders(), addr(0xaa), addr(0xee)).unwrap();
        let mut reversed_orders = example_orders();
        reversed_orders.reverse();
        let mut reversed = Ring::new(context, reversed_orders, addr(0xaa), addr(0xee)).unwrap();

        forward.update_hash();
        again.update_hash();
        reversed.update_hash();
        assert_ne!(forward.hash, B256::ZERO);
        assert_eq!(forward.hash, again.hash);
        assert_ne!(forward.hash, reversed.hash);
    }

    #[tokio::test]
    async fn test_hasher_choice_changes_hash() {
        let keccak = funded_context().await;
        let sha = Arc::new((*keccak).clone().with_hasher(Arc::new(crate::context::Sha256Hasher)));

        let mut a = Ring::new(keccak, example_orders(), addr(0xaa), addr(0xee)).unwrap();
        let mut b = Ring::new(sha, example_orders(), addr(0xaa), addr(0xee)).unwrap();
        a.update_hash();
        b.update_hash();
        assert_ne!(a.hash, b.hash);
        assert_ne!(a.orders()[0].hash, b.orders()[0].hash);
    }

    #[tokio::test]
    async fn test_check_orders_valid() {
        let mut orders = example_orders();
        orders[1].valid = false;
        let mut ring = Ring::new(funded_context().await, orders, addr(0xaa), addr(0xee)).unwrap();
        ring.check_orders_valid();
        assert!(!ring.valid);

        let err = ring.calculate_fill_amount_and_fee().await.unwrap_err();
        assert!(matches!(err, Error::InvalidRing(_)));
    }

    #[tokio::test]
    async fn test_unregistered_token_invalidates() {
        let ledger = Arc::new(BalanceLedger::new());
        let registry = Arc::new(StaticTokenRegistry::new([addr(0x01)]));
        let context = Arc::new(RingContext::new(ledger, registry, addr(0xfe)));

        let mut ring = Ring::new(context, example_orders(), addr(0xaa), addr(0xee)).unwrap();
        ring.check_tokens_registered().await.unwrap();
        assert!(!ring.valid);
    }

    #[tokio::test]
    async fn test_registry_error_fails_closed() {
        let ledger = Arc::new(BalanceLedger::new());
        let context = Arc::new(RingContext::new(ledger, Arc::new(BrokenRegistry), addr(0xfe)));

        let mut ring = Ring::new(context, example_orders(), addr(0xaa), addr(0xee)).unwrap();
        let err = ring.check_tokens_registered().await.unwrap_err();
        assert!(matches!(err, Error::CollaboratorFailure(_)));
        assert!(!ring.valid);
    }

    #[tokio::test]
    async fn test_scaler_failure_marks_order_and_ring_invalid() {
        let registry = Arc::new(StaticTokenRegistry::new([addr(0x01), addr(0x02)]));
        let context = Arc::new(RingContext::new(Arc::new(FailingScaler), registry, addr(0xfe)));

        let mut ring = Ring::new(context, example_orders(), addr(0xaa), addr(0xee)).unwrap();
        let err = ring.calculate_fill_amount_and_fee().await.unwrap_err();
        assert!(matches!(err, Error::CollaboratorFailure(ref msg) if msg.contains("order 1")));
        assert!(!ring.valid);
        assert!(!ring.orders()[1].valid);
        assert!(ring.orders()[0].valid);
        assert!(ring.get_ring_transfer_items(20).is_err());
    }

    #[tokio::test]
    async fn test_scaler_timeout() {
        let registry = Arc::new(StaticTokenRegistry::new([addr(0x01), addr(0x02)]));
        let context = RingContext::new(Arc::new(SlowScaler), registry, addr(0xfe)).with_policy(
            CollaboratorPolicy { timeout: Duration::from_millis(100), scale_concurrency: 2 },
        );

        let mut ring = Ring::new(Arc::new(context), example_orders(), addr(0xaa), addr(0xee)).unwrap();
        let err = ring.calculate_fill_amount_and_fee().await.unwrap_err();
        assert!(matches!(err, Error::CollaboratorFailure(ref msg) if msg.contains("timed out")));
        assert!(!ring.valid);
    }

    #[tokio::test]
    async fn test_unfunded_order_invalidates() {
        let ledger = Arc::new(BalanceLedger::new());
        ledger.fund(addr(0x01), addr(0xaa), U256::MAX).await;
        let registry = Arc::new(StaticTokenRegistry::new([addr(0x01), addr(0x02)]));
        let context = Arc::new(RingContext::new(ledger, registry, addr(0xfe)));

        let mut ring = Ring::new(context, example_orders(), addr(0xaa), addr(0xee)).unwrap();
        let err = ring.calculate_fill_amount_and_fee().await.unwrap_err();
        assert!(matches!(err, Error::InvalidRing(_)));
        assert!(!ring.orders()[1].valid);
    }

    #[tokio::test]
    async fn test_resolution_and_transfers() {
        let ring = resolved_ring().await;
        assert!(ring.is_resolved());

        let items = ring.get_ring_transfer_items(20).unwrap();
        assert_eq!(items.len(), 7);
        assert_eq!(items[0], TransferItem::new(addr(0x01), addr(0xaa), addr(0xbb), u(20)));
        assert_eq!(items[5], TransferItem::new(addr(0x02), addr(0xbb), addr(0xaa), u(40)));

        for o in ring.orders() {
            assert!(o.total_sell_moved().unwrap() <= o.amount_sell);
            assert!(o.fill_fee_amount <= o.lrc_fee);
        }
    }

    #[tokio::test]
    async fn test_transfer_items_idempotent() {
        let ring = resolved_ring().await;
        assert_eq!(ring.get_ring_transfer_items(35).unwrap(), ring.get_ring_transfer_items(35).unwrap());
    }

    #[tokio::test]
    async fn test_percentage_out_of_range() {
        let ring = resolved_ring().await;
        assert!(matches!(ring.get_ring_transfer_items(150), Err(Error::Configuration(_))));
        assert!(matches!(ring.get_ring_transfer_items(-5), Err(Error::Configuration(_))));
        assert!(matches!(ring.get_ring_transfer_items(101), Err(Error::Configuration(_))));
        assert!(ring.get_ring_transfer_items(100).is_ok());
        assert!(ring.get_ring_transfer_items(0).is_ok());
    }

    #[tokio::test]
    async fn test_transfers_require_resolution() {
        let ring = Ring::new(funded_context().await, example_orders(), addr(0xaa), addr(0xee)).unwrap();
        assert!(matches!(ring.get_ring_transfer_items(20), Err(Error::InvalidRing(_))));
    }

    #[tokio::test]
    async fn test_negative_margin_invalidates() {
        let orders = vec![
            OrderRecord::new(addr(0xaa), addr(0x01), u(10), u(2), u(0)),
            OrderRecord::new(addr(0xbb), addr(0x02), u(7), u(2), u(0)),
        ];
        let mut ring = Ring::new(funded_context().await, orders, addr(0xaa), addr(0xee)).unwrap();
        let err = ring.calculate_fill_amount_and_fee().await.unwrap_err();
        assert!(matches!(err, Error::InvariantViolation { index: 1, .. }));
        assert!(!ring.valid);
        assert!(!ring.is_resolved());
    }

    #[tokio::test]
    async fn test_overflow_invalidates_and_keeps_orders() {
        let ledger = Arc::new(BalanceLedger::new());
        ledger.fund(addr(0x01), addr(0xaa), U256::MAX).await;
        ledger.fund(addr(0x02), addr(0xbb), U256::MAX).await;
        let registry = Arc::new(StaticTokenRegistry::new([addr(0x01), addr(0x02)]));
        let context = Arc::new(RingContext::new(ledger, registry, addr(0xfe)));

        let orders = vec![
            OrderRecord::new(addr(0xaa), addr(0x01), U256::MAX, u(2), u(0)),
            OrderRecord::new(addr(0xbb), addr(0x02), u(40), u(20), u(0)),
        ];
        let mut ring = Ring::new(context, orders, addr(0xaa), addr(0xee)).unwrap();
        let err = ring.calculate_fill_amount_and_fee().await.unwrap_err();
        assert!(matches!(err, Error::ArithmeticOverflow(_)));
        assert!(!ring.valid);
        assert!(!ring.is_resolved());
        assert!(ring.orders()[0].split_sell.is_zero());
    }
}
