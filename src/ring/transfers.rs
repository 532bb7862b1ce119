//! Transfer list construction for a resolved ring.
//!
//! For every order `i` (predecessor `p = i - 1 mod n`):
//!
//! 1. Bound checks on the order; any failure aborts the whole list
//! 2. Trade leg: `fill_amount_sell_i` of `token_sell_i`, owner_i -> owner_p
//! 3. Fee and margin legs, paid by owner_i:
//!
//! | Condition                      | Fee (fee token)             | Split (sell token)           |
//! |--------------------------------|-----------------------------|------------------------------|
//! | pct > 0 and order has a wallet | pct% -> wallet, rest -> recipient | pct% -> recipient, rest -> wallet |
//! | otherwise                      | all -> recipient            | all -> recipient             |
//!
//! Zero-amount legs are dropped. The list holds at most `5n` items.

use alloy_primitives::{Address, U256};

use crate::types::units::{checked_sub, percent_of};
use crate::types::{OrderRecord, TransferItem};
use crate::Result;

/// Build the ordered transfer list for resolved `orders`.
///
/// # Arguments
///
/// * `orders` - Resolved orders in ring order
/// * `fee_recipient` - Default receiver of fees and margin
/// * `fee_token` - Token fees are charged in
/// * `wallet_split_percentage` - Already validated to 0..=100
///
/// # Errors
///
/// [`crate::Error::InvariantViolation`] if any order fails its bound checks;
/// no items are returned in that case.
pub fn build_transfer_items(
    orders: &[OrderRecord],
    fee_recipient: Address,
    fee_token: Address,
    wallet_split_percentage: u8,
) -> Result<Vec<TransferItem>> {
    let n = orders.len();
    let mut items = Vec::with_capacity(n * 5);

    for (i, order) in orders.iter().enumerate() {
        order.check_bounds(i)?;

        let prev = &orders[(i + n - 1) % n];
        push(&mut items, order.token_sell, order.owner, prev.owner, order.fill_amount_sell);

        match order.wallet {
            Some(wallet) if wallet_split_percentage > 0 => {
                if !order.fill_fee_amount.is_zero() {
                    let to_wallet =
                        percent_of(order.fill_fee_amount, wallet_split_percentage, "wallet fee share")?;
                    let to_recipient = checked_sub(order.fill_fee_amount, to_wallet, "recipient fee share")?;
                    push(&mut items, fee_token, order.owner, wallet, to_wallet);
                    push(&mut items, fee_token, order.owner, fee_recipient, to_recipient);
                }
                if !order.split_sell.is_zero() {
                    let to_recipient =
                        percent_of(order.split_sell, wallet_split_percentage, "recipient split share")?;
                    let to_wallet = checked_sub(order.split_sell, to_recipient, "wallet split share")?;
                    push(&mut items, order.token_sell, order.owner, fee_recipient, to_recipient);
                    push(&mut items, order.token_sell, order.owner, wallet, to_wallet);
                }
            }
            _ => {
                push(&mut items, fee_token, order.owner, fee_recipient, order.fill_fee_amount);
                push(&mut items, order.token_sell, order.owner, fee_recipient, order.split_sell);
            }
        }
    }

    Ok(items)
}

fn push(items: &mut Vec<TransferItem>, token: Address, from: Address, to: Address, amount: U256) {
    if !amount.is_zero() {
        items.push(TransferItem::new(token, from, to, amount));
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
