//! One-call ring settlement

use std::sync::Arc;

use alloy_primitives::Address;
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::context::{RingContext, SpendableAmountScaler, TokenRegistry};
use crate::ring::Ring;
use crate::types::{OrderFill, OrderRecord, SettlementPlan};
use crate::{Error, Result};

/// Settles rings against a shared [`RingContext`]
#[derive(Debug, Clone)]
pub struct RingSettler {
    context: Arc<RingContext>,
    wallet_split_percentage: i64,
}

impl RingSettler {
    /// Create a settler.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] if `wallet_split_percentage` is outside 0..=100
    pub fn new(context: Arc<RingContext>, wallet_split_percentage: i64) -> Result<Self> {
        if !(0..=100).contains(&wallet_split_percentage) {
            return Err(Error::Configuration(format!(
                "wallet_split_percentage {wallet_split_percentage} outside 0..=100"
            )));
        }
        Ok(Self { context, wallet_split_percentage })
    }

    /// Create a settler whose context and percentage come from `config`
    pub fn from_config(
        config: &Config,
        scaler: Arc<dyn SpendableAmountScaler>,
        registry: Arc<dyn TokenRegistry>,
    ) -> Result<Self> {
        config.validate()?;
        let context = RingContext::from_config(config, scaler, registry);
        Self::new(Arc::new(context), config.wallet_split_percentage)
    }

    /// Shared context
    pub fn context(&self) -> &Arc<RingContext> {
        &self.context
    }

    /// Wallet split percentage applied to every ring
    pub fn wallet_split_percentage(&self) -> i64 {
        self.wallet_split_percentage
    }

    /// Run the full pipeline for one ring.
    ///
    /// # Arguments
    ///
    /// * `orders` - Orders in ring order; `token_buy` is derived
    /// * `owner` - Ring submitter
    /// * `fee_recipient` - Receiver of fees and unshared margin
    ///
    /// # Returns
    ///
    /// The settlement plan: ring hash, per-order fills and the transfer list
    ///
    /// # Errors
    ///
    /// Any error from the ring stages. An invalid ring that raised no
    /// error of its own (invalid order, unregistered token) is reported as
    /// [`Error::InvalidRing`].
    #[instrument(skip_all, fields(orders = orders.len()))]
    pub async fn settle(
        &self,
        orders: Vec<OrderRecord>,
        owner: Address,
        fee_recipient: Address,
    ) -> Result<SettlementPlan> {
        let mut ring = Ring::new(Arc::clone(&self.context), orders, owner, fee_recipient)?;
        ring.update_hash();
        ring.check_orders_valid();
        ring.check_tokens_registered().await?;

        if !ring.valid {
            warn!(ring_hash = %ring.hash, "rejecting invalid ring");
            return Err(Error::InvalidRing(format!("ring {} failed validation", ring.hash)));
        }

        ring.calculate_fill_amount_and_fee().await?;
        let transfers = ring.get_ring_transfer_items(self.wallet_split_percentage)?;
        let fills = ring.orders().iter().map(OrderFill::from).collect();
        let plan = SettlementPlan::new(ring.hash, fills, transfers);

        info!(
            ring_hash = %plan.ring_hash_hex(),
            transfers = plan.transfer_count(),
            "ring settled"
        );
        Ok(plan)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
