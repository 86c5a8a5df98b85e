//! constant-product pricing
//!
//! all products are taken in arbitrary precision; results are floored
//! except [`get_amount_in`], which rounds up so the pair is never short.

use num_bigint::BigUint;
use num_traits::ToPrimitive;

use crate::error::ExchangeError;
use crate::types::Amount;

/// input fee numerator, 0.3% fee
pub const FEE_NUMERATOR: u32 = 997;
pub const FEE_DENOMINATOR: u32 = 1000;

pub(crate) fn big(value: Amount) -> BigUint {
    BigUint::from(value)
}

pub(crate) fn to_amount(value: BigUint) -> Result<Amount, ExchangeError> {
    value.to_u128().ok_or(ExchangeError::Overflow)
}

/// output for an exact input:
/// `floor(amount_in * 997 * reserve_out / (reserve_in * 1000 + amount_in * 997))`
pub fn get_amount_out(
    amount_in: Amount,
    reserve_in: Amount,
    reserve_out: Amount,
) -> Result<Amount, ExchangeError> {
    if amount_in == 0 {
        return Err(ExchangeError::InsufficientInput);
    }
    if reserve_in == 0 || reserve_out == 0 {
        return Err(ExchangeError::InsufficientLiquidity);
    }

    let amount_in_with_fee = big(amount_in) * FEE_NUMERATOR;
    let numerator = &amount_in_with_fee * big(reserve_out);
    let denominator = big(reserve_in) * FEE_DENOMINATOR + amount_in_with_fee;
    to_amount(numerator / denominator)
}

/// input required for an exact output, rounded up
pub fn get_amount_in(
    amount_out: Amount,
    reserve_in: Amount,
    reserve_out: Amount,
) -> Result<Amount, ExchangeError> {
    if amount_out == 0 {
        return Err(ExchangeError::InsufficientOutput);
    }
    if reserve_in == 0 || amount_out >= reserve_out {
        return Err(ExchangeError::InsufficientLiquidity);
    }

    let numerator = big(reserve_in) * big(amount_out) * FEE_DENOMINATOR;
    let denominator = big(reserve_out - amount_out) * FEE_NUMERATOR;
    to_amount(numerator / denominator + 1u32)
}

/// amount of the other asset with the same value at the current ratio
pub fn quote(amount_a: Amount, reserve_a: Amount, reserve_b: Amount) -> Result<Amount, ExchangeError> {
    if amount_a == 0 {
        return Err(ExchangeError::InsufficientAmount);
    }
    if reserve_a == 0 || reserve_b == 0 {
        return Err(ExchangeError::InsufficientLiquidity);
    }
    to_amount(big(amount_a) * big(reserve_b) / big(reserve_a))
}

/// floor(sqrt(a * b))
pub fn sqrt_product(a: Amount, b: Amount) -> Result<Amount, ExchangeError> {
    to_amount((big(a) * big(b)).sqrt())
}
