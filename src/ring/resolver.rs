//! Fill-amount resolution for a ring of orders.
//!
//! ## Problem
//!
//! Order `i` offers up to `amount_sell_i` of its sell token for
//! `amount_buy_i` of its buy token, and its buy token is order `i+1`'s sell
//! token. Resolution picks `fill_amount_sell`/`fill_amount_buy` for every
//! order so that no order exceeds its sell cap or fills worse than its own
//! limit rate, then assigns the captured surplus (`split_sell`) and fee.
//!
//! ## Passes
//!
//! ```text
//! A: i = 0..n        clamp next order to what order i buys; record anchor
//! B: i = 0..anchor   re-run the clamp over the segment before the anchor
//! C: i = 0..n        margin -> split_sell, finalize next fill, fee
//! ```
//!
//! The anchor is the last index `j` whose fill was *not* reduced by its
//! predecessor during pass A.
//!
//! ## Limitation
//!
//! The procedure is not proven optimal, or even consistent, for rings with
//! more than three orders and compound margins. It is applied exactly as
//! written; the transfer builder's bound checks catch rings it mis-resolves.
//!
//! ## Arithmetic
//!
//! All steps use [`mul_div`] (multiply first, floor once). Overflow or a
//! zero denominator aborts resolution. So does a negative margin, which
//! floor rounding produces whenever an order's rate conversion is not
//! exact; it is reported as [`Error::InvariantViolation`] on the order whose
//! target fell short.

use tracing::debug;

use crate::types::units::{checked_add, checked_sub, mul_div};
use crate::types::OrderRecord;
use crate::{Error, Result};

/// Resolve fills, splits and fees in place.
///
/// # Arguments
///
/// * `orders` - The ring's orders with `fill_amount_sell` already scaled
///
/// # Returns
///
/// The anchor index chosen during pass A
///
/// # Errors
///
/// * [`Error::InvalidRing`] - fewer than two orders
/// * [`Error::InvariantViolation`] - negative margin in pass C
/// * [`Error::ArithmeticOverflow`] / [`Error::DivisionByZero`]
///
/// On any error `orders` may be partially updated and must be discarded.
pub fn resolve(orders: &mut [OrderRecord]) -> Result<usize> {
    let n = orders.len();
    if n < 2 {
        return Err(Error::InvalidRing(format!("ring needs at least 2 orders, got {n}")));
    }

    let mut anchor = 0;
    for i in 0..n {
        anchor = clamp_next(orders, i, anchor)?;
    }
    debug!(anchor, "anchor selected");

    for i in 0..anchor {
        clamp_next(orders, i, anchor)?;
    }

    for i in 0..n {
        settle_margin_and_fee(orders, i)?;
    }

    Ok(anchor)
}

/// Compute order `i`'s buy amount at its limit rate and clamp order `i+1`.
///
/// Returns `i+1` as the new anchor when order `i+1` was not reduced,
/// otherwise the `anchor` passed in.
fn clamp_next(orders: &mut [OrderRecord], i: usize, anchor: usize) -> Result<usize> {
    let j = (i + 1) % orders.len();

    let order = &orders[i];
    let fill_amount_buy = mul_div(
        order.fill_amount_sell,
        order.amount_buy,
        order.amount_sell,
        "fill_amount_buy",
    )?;
    orders[i].fill_amount_buy = fill_amount_buy;

    if fill_amount_buy < orders[j].fill_amount_sell {
        debug!(i, j, from = %orders[j].fill_amount_sell, to = %fill_amount_buy, "clamped next order");
        orders[j].fill_amount_sell = fill_amount_buy;
        Ok(anchor)
    } else {
        Ok(j)
    }
}

/// Pass C for order `i`: split from the next order's margin, finalize the
/// next order's fill, then charge order `i`'s fee.
fn settle_margin_and_fee(orders: &mut [OrderRecord], i: usize) -> Result<()> {
    let j = (i + 1) % orders.len();

    let next = &orders[j];
    let next_target = mul_div(
        next.fill_amount_buy,
        next.amount_sell,
        next.amount_buy,
        "next target sell",
    )?;
    if next_target < next.fill_amount_sell {
        return Err(Error::InvariantViolation {
            index: j,
            detail: format!(
                "negative margin: target sell {} below fill {}",
                next_target, next.fill_amount_sell
            ),
        });
    }
    let margin = checked_sub(next_target, next.fill_amount_sell, "margin")?;

    let order = &orders[i];
    let split_sell = mul_div(margin, order.amount_sell, order.amount_buy, "split_sell")?;
    orders[i].split_sell = split_sell;
    orders[j].fill_amount_sell = next_target;

    let order = &orders[i];
    let moved = checked_add(order.fill_amount_sell, split_sell, "fee base")?;
    let fee = mul_div(order.lrc_fee, moved, order.amount_sell, "fill_fee_amount")?;
    orders[i].fill_fee_amount = fee;

    debug!(
        i,
        %margin,
        split_sell = %split_sell,
        fill_fee_amount = %fee,
        "settled margin and fee"
    );
    Ok(())
}

// ============================================================================
// Unit Tests
// ============================================================================
