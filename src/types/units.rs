//! Fixed-point amount utilities.
//!
//! ## Overview
//!
//! Token amounts are 256-bit unsigned integers in the token's base units.
//! No floating point is used anywhere: rates are kept as the pair
//! `(amount_sell, amount_buy)` and applied with [`mul_div`].
//!
//! ## Multiply Before Divide
//!
//! Every scaled value is computed as `a * b / denominator`, multiplying first
//! and flooring once at the end. The intermediate product is checked: an
//! overflow is reported as [`Error::ArithmeticOverflow`], never wrapped.
//!
//! ## Examples
//!
//! ```
//! use alloy_primitives::U256;
//! use ring_settlement::types::units::{mul_div, to_base_units, from_base_units};
//!
//! // 100 * 50 / 100 = 50
//! let v = mul_div(U256::from(100u64), U256::from(50u64), U256::from(100u64), "rate").unwrap();
//! assert_eq!(v, U256::from(50u64));
//!
//! let raw = to_base_units("1.5", 18).unwrap();
//! assert_eq!(from_base_units(raw, 18), "1.5");
//! ```

use std::str::FromStr;

use alloy_primitives::U256;
use rust_decimal::Decimal;

use crate::{Error, Result};

/// Largest supported token decimals (ERC-20 tokens use at most 18 in practice)
pub const MAX_DECIMALS: u8 = 36;

// ============================================================================
// Checked Arithmetic
// ============================================================================

/// Compute `floor(a * b / denominator)` in 256-bit arithmetic.
///
/// # Arguments
///
/// * `a`, `b` - Factors, multiplied first
/// * `denominator` - Divisor, applied last
/// * `what` - Label used in the error message
///
/// # Errors
///
/// * [`Error::ArithmeticOverflow`] - `a * b` does not fit in 256 bits
/// * [`Error::DivisionByZero`] - `denominator` is zero
pub fn mul_div(a: U256, b: U256, denominator: U256, what: &str) -> Result<U256> {
    if denominator.is_zero() {
        return Err(Error::DivisionByZero(what.to_string()));
    }
    let product = checked_mul(a, b, what)?;
    Ok(product / denominator)
}

/// Checked 256-bit multiplication
pub fn checked_mul(a: U256, b: U256, what: &str) -> Result<U256> {
    a.checked_mul(b)
        .ok_or_else(|| Error::ArithmeticOverflow(format!("{what}: {a} * {b}")))
}

/// Checked 256-bit addition
pub fn checked_add(a: U256, b: U256, what: &str) -> Result<U256> {
    a.checked_add(b)
        .ok_or_else(|| Error::ArithmeticOverflow(format!("{what}: {a} + {b}")))
}

/// Checked 256-bit subtraction; going below zero counts as overflow
pub fn checked_sub(a: U256, b: U256, what: &str) -> Result<U256> {
    a.checked_sub(b)
        .ok_or_else(|| Error::ArithmeticOverflow(format!("{what}: {a} - {b}")))
}

/// Take `percentage` percent of `amount`, floored
pub fn percent_of(amount: U256, percentage: u8, what: &str) -> Result<U256> {
    mul_div(amount, U256::from(percentage), U256::from(100u64), what)
}

// ============================================================================
// Conversion Functions
// ============================================================================

fn pow10(exp: u32) -> Result<U256> {
    U256::from(10u64)
        .checked_pow(U256::from(exp))
        .ok_or_else(|| Error::ArithmeticOverflow(format!("10^{exp}")))
}

/// Convert a decimal string to base units of a token with `decimals` decimals
///
/// # Errors
///
/// * [`Error::Configuration`] - not a number, negative, or more fractional
///   digits than the token supports
/// * [`Error::ArithmeticOverflow`] - result does not fit in 256 bits
///
/// # Example
///
/// ```
/// use alloy_primitives::U256;
/// use ring_settlement::types::units::to_base_units;
///
/// assert_eq!(to_base_units("1", 6).unwrap(), U256::from(1_000_000u64));
/// assert_eq!(to_base_units("0.000001", 6).unwrap(), U256::from(1u64));
/// assert!(to_base_units("0.0000001", 6).is_err());
/// ```
pub fn to_base_units(s: &str, decimals: u8) -> Result<U256> {
    if decimals > MAX_DECIMALS {
        return Err(Error::Configuration(format!(
            "token decimals {decimals} above maximum {MAX_DECIMALS}"
        )));
    }

    let decimal = Decimal::from_str(s.trim())
        .map_err(|e| Error::Configuration(format!("invalid amount '{s}': {e}")))?
        .normalize();

    if decimal.is_sign_negative() && !decimal.is_zero() {
        return Err(Error::Configuration(format!("negative amount '{s}'")));
    }

    let scale = decimal.scale();
    if scale > u32::from(decimals) {
        return Err(Error::Configuration(format!(
            "amount '{s}' has {scale} fractional digits, token supports {decimals}"
        )));
    }

    let mantissa = U256::from(decimal.mantissa().unsigned_abs());
    checked_mul(mantissa, pow10(u32::from(decimals) - scale)?, "base units")
}

/// Render base units as a decimal string with trailing zeros trimmed
///
/// # Example
///
/// ```
/// use alloy_primitives::U256;
/// use ring_settlement::types::units::from_base_units;
///
/// assert_eq!(from_base_units(U256::from(1_500_000u64), 6), "1.5");
/// assert_eq!(from_base_units(U256::from(42u64), 0), "42");
/// ```
pub fn from_base_units(value: U256, decimals: u8) -> String {
    let digits = value.to_string();
    let decimals = usize::from(decimals);
    if decimals == 0 {
        return digits;
    }

    let padded = format!("{digits:0>width$}", width = decimals + 1);
    let (whole, frac) = padded.split_at(padded.len() - decimals);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{frac}")
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
