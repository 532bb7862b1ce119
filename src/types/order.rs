//! Order record for ring settlement.
//!
//! ## Declared Terms vs Computed State
//!
//! An [`OrderRecord`] carries the order's declared terms (`amount_sell`,
//! `amount_buy`, `lrc_fee`) and the state computed while its ring is being
//! resolved (`fill_amount_sell`, `fill_amount_buy`, `split_sell`,
//! `fill_fee_amount`, `valid`).
//!
//! The limit rate is the pair `amount_sell / amount_buy`; it is never
//! reduced to a single number.
//!
//! ## Canonical Bytes
//!
//! The order hash is computed over a fixed-size packed layout:
//!
//! | Field        | Bytes |
//! |--------------|-------|
//! | owner        | 20    |
//! | token_sell   | 20    |
//! | token_buy    | 20    |
//! | wallet       | 20    |
//! | amount_sell  | 32    |
//! | amount_buy   | 32    |
//! | lrc_fee      | 32    |
//! | salt         | 8     |

use alloy_primitives::{Address, B256, U256};

use crate::types::units::checked_mul;
use crate::{Error, Result};

/// Size of [`OrderRecord::canonical_bytes`] output
pub const CANONICAL_ORDER_LEN: usize = 20 * 4 + 32 * 3 + 8;

/// One order taking part in a ring.
///
/// ## Example
///
/// ```
/// use alloy_primitives::{Address, U256};
/// use ring_settlement::types::OrderRecord;
///
/// // Sell 100 of token 0x11.. for at least 50 of whatever the next order sells
/// let order = OrderRecord::new(
///     Address::repeat_byte(0xaa),   // owner
///     Address::repeat_byte(0x11),   // token_sell
///     U256::from(100u64),           // amount_sell
///     U256::from(50u64),            // amount_buy
///     U256::from(10u64),            // lrc_fee
/// );
/// assert!(order.valid);
/// assert_eq!(order.fill_amount_sell, U256::from(100u64));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    /// Account that signed the order and pays its sell token and fee
    pub owner: Address,

    /// Token this order sells
    pub token_sell: Address,

    /// Token this order buys; set from the next order's sell token when the
    /// ring is constructed
    pub token_buy: Address,

    /// Referring wallet that shares in fees and margin
    pub wallet: Option<Address>,

    /// Maximum quantity of `token_sell` this order will give
    pub amount_sell: U256,

    /// Quantity of `token_buy` wanted for `amount_sell`
    pub amount_buy: U256,

    /// Maximum fee budget, in the fee token
    pub lrc_fee: U256,

    /// Caller-chosen nonce distinguishing otherwise identical orders
    pub salt: u64,

    /// Order identity hash (set at ring construction)
    pub hash: B256,

    /// Sell quantity actually transferred
    pub fill_amount_sell: U256,

    /// Buy quantity implied by `fill_amount_sell` at the limit rate
    pub fill_amount_buy: U256,

    /// Captured price-improvement surplus, in `token_sell` units
    pub split_sell: U256,

    /// Fee owed, in the fee token
    pub fill_fee_amount: U256,

    /// Per-order validity flag
    pub valid: bool,
}

impl OrderRecord {
    /// Create a new order record.
    ///
    /// `fill_amount_sell` starts at `amount_sell`; the spendable-amount
    /// scaler lowers it before resolution. An order with a zero sell or buy
    /// amount has no usable rate and starts out invalid.
    pub fn new(
        owner: Address,
        token_sell: Address,
        amount_sell: U256,
        amount_buy: U256,
        lrc_fee: U256,
    ) -> Self {
        Self {
            owner,
            token_sell,
            token_buy: Address::ZERO,
            wallet: None,
            amount_sell,
            amount_buy,
            lrc_fee,
            salt: 0,
            hash: B256::ZERO,
            fill_amount_sell: amount_sell,
            fill_amount_buy: U256::ZERO,
            split_sell: U256::ZERO,
            fill_fee_amount: U256::ZERO,
            valid: !amount_sell.is_zero() && !amount_buy.is_zero(),
        }
    }

    /// Attach a referring wallet
    pub fn with_wallet(mut self, wallet: Address) -> Self {
        self.wallet = Some(wallet);
        self
    }

    /// Set the salt
    pub fn with_salt(mut self, salt: u64) -> Self {
        self.salt = salt;
        self
    }

    /// Packed bytes the order hash is computed over
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(CANONICAL_ORDER_LEN);
        buf.extend_from_slice(self.owner.as_slice());
        buf.extend_from_slice(self.token_sell.as_slice());
        buf.extend_from_slice(self.token_buy.as_slice());
        buf.extend_from_slice(self.wallet.unwrap_or(Address::ZERO).as_slice());
        buf.extend_from_slice(&self.amount_sell.to_be_bytes::<32>());
        buf.extend_from_slice(&self.amount_buy.to_be_bytes::<32>());
        buf.extend_from_slice(&self.lrc_fee.to_be_bytes::<32>());
        buf.extend_from_slice(&self.salt.to_be_bytes());
        buf
    }

    /// Clear all computed fill state back to the pre-resolution defaults
    pub fn reset_fills(&mut self) {
        self.fill_amount_sell = self.amount_sell;
        self.fill_amount_buy = U256::ZERO;
        self.split_sell = U256::ZERO;
        self.fill_fee_amount = U256::ZERO;
    }

    /// Total sell-token value moved through this order (fill plus split)
    pub fn total_sell_moved(&self) -> Result<U256> {
        self.fill_amount_sell
            .checked_add(self.split_sell)
            .ok_or_else(|| Error::ArithmeticOverflow("fill_amount_sell + split_sell".into()))
    }

    /// Check the post-resolution bounds.
    ///
    /// # Arguments
    ///
    /// * `index` - Position in the ring, reported in the error
    ///
    /// # Errors
    ///
    /// [`Error::InvariantViolation`] naming the first bound that fails, or
    /// [`Error::ArithmeticOverflow`] if a bound cannot be evaluated.
    pub fn check_bounds(&self, index: usize) -> Result<()> {
        let violation = |detail: String| Error::InvariantViolation { index, detail };

        if self.fill_amount_sell > self.amount_sell {
            return Err(violation(format!(
                "fill_amount_sell {} exceeds amount_sell {}",
                self.fill_amount_sell, self.amount_sell
            )));
        }

        let moved = self.total_sell_moved()?;
        if moved > self.amount_sell {
            return Err(violation(format!(
                "fill_amount_sell + split_sell = {} exceeds amount_sell {}",
                moved, self.amount_sell
            )));
        }

        if self.fill_fee_amount > self.lrc_fee {
            return Err(violation(format!(
                "fill_fee_amount {} exceeds lrc_fee {}",
                self.fill_fee_amount, self.lrc_fee
            )));
        }

        // fill_sell / fill_buy <= amount_sell / amount_buy, cross-multiplied
        let realized = checked_mul(self.fill_amount_sell, self.amount_buy, "realized rate")?;
        let limit = checked_mul(self.fill_amount_buy, self.amount_sell, "limit rate")?;
        if realized > limit {
            return Err(violation(format!(
                "realized rate {}/{} worse than limit {}/{}",
                self.fill_amount_sell, self.fill_amount_buy, self.amount_sell, self.amount_buy
            )));
        }

        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
