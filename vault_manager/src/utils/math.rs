//! Fixed point helpers shared by the share ledger and the allocation routing.

use crate::constants::MAX_BPS;

use super::error::{arithmetic_err, VaultResult};

/// Rounding direction of an integer division
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rounding {
    Down,
    Up,
}

/// Returns `x * y / denominator` rounded in the given direction.
pub fn mul_div(x: u128, y: u128, denominator: u128, rounding: Rounding) -> VaultResult<u128> {
    if denominator == 0 {
        return Err(arithmetic_err("Division by zero."));
    }
    let product = x
        .checked_mul(y)
        .ok_or_else(|| arithmetic_err("Multiplication overflowed."))?;
    let quotient = product / denominator;
    match rounding {
        Rounding::Up if product % denominator != 0 => Ok(quotient + 1),
        _ => Ok(quotient),
    }
}

/// Returns `floor(amount * bps / MAX_BPS)`.
pub fn bps_of(amount: u128, bps: u16) -> VaultResult<u128> {
    mul_div(amount, u128::from(bps), u128::from(MAX_BPS), Rounding::Down)
}
