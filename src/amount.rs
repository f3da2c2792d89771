//! Amount scaling between human units and ledger minor units
//!
//! Every call site converts through this module, always driven by the
//! resource's declared decimals (9 for lamports, the mint's decimals for
//! tokens). There is no fixed multiplier anywhere else in the crate.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use thiserror::Error;

/// Decimals of the native currency (1 SOL = 10^9 lamports)
pub const LAMPORTS_DECIMALS: u8 = 9;

/// Largest supported precision; 10^18 still fits in a u64
pub const MAX_DECIMALS: u8 = 18;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("unsupported precision: {0} decimals (max 18)")]
    UnsupportedDecimals(u8),

    #[error("amount {amount} with {decimals} decimals overflows u64")]
    Overflow { amount: String, decimals: u8 },

    #[error("amount must not be negative: {0}")]
    Negative(String),

    #[error("amount {amount} has more than {decimals} fractional digits")]
    TooPrecise { amount: String, decimals: u8 },

    #[error("invalid amount '{0}'")]
    Invalid(String),
}

fn unit(decimals: u8) -> Result<u64, AmountError> {
    if decimals > MAX_DECIMALS {
        return Err(AmountError::UnsupportedDecimals(decimals));
    }
    Ok(10u64.pow(u32::from(decimals)))
}

/// `amount * 10^decimals`, checked
pub fn scale_amount(amount: u64, decimals: u8) -> Result<u64, AmountError> {
    amount
        .checked_mul(unit(decimals)?)
        .ok_or_else(|| AmountError::Overflow {
            amount: amount.to_string(),
            decimals,
        })
}

/// Whole human units contained in `minor` (integer quotient)
pub fn descale_amount(minor: u64, decimals: u8) -> Result<u64, AmountError> {
    Ok(minor / unit(decimals)?)
}

/// Convert a possibly fractional human amount to minor units
///
/// # Errors
///
/// Negative amounts, amounts finer than `decimals` allows, and amounts that
/// do not fit a u64 once scaled.
pub fn to_minor_units(amount: Decimal, decimals: u8) -> Result<u64, AmountError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AmountError::Negative(amount.to_string()));
    }

    let overflow = || AmountError::Overflow {
        amount: amount.to_string(),
        decimals,
    };
    let scaled = amount
        .checked_mul(Decimal::from(unit(decimals)?))
        .ok_or_else(overflow)?;

    if !scaled.fract().is_zero() {
        return Err(AmountError::TooPrecise {
            amount: amount.to_string(),
            decimals,
        });
    }
    scaled.to_u64().ok_or_else(overflow)
}

/// Parse a human amount such as `"1.2"` and convert it to minor units
pub fn parse_minor_units(amount: &str, decimals: u8) -> Result<u64, AmountError> {
    let value =
        Decimal::from_str(amount.trim()).map_err(|_| AmountError::Invalid(amount.to_string()))?;
    to_minor_units(value, decimals)
}

/// Minor units as an exact human amount, for display
pub fn to_ui_amount(minor: u64, decimals: u8) -> Result<Decimal, AmountError> {
    unit(decimals)?;
    Ok(Decimal::from_i128_with_scale(i128::from(minor), u32::from(decimals)).normalize())
}

/// Lamports shown as SOL
pub fn lamports_to_sol(lamports: u64) -> Decimal {
    Decimal::from_i128_with_scale(i128::from(lamports), u32::from(LAMPORTS_DECIMALS)).normalize()
}
