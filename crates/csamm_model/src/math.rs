//! Constant sum AMM math (x + r·y = k)

use crate::{ModelError, RATE_SCALE};

/// Trade direction through the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// token0 in, token1 out
    ZeroForOne,
    /// token1 in, token0 out
    OneForZero,
}

/// Smaller of two amounts
#[inline]
pub fn min(a: u128, b: u128) -> u128 {
    if a < b {
        a
    } else {
        b
    }
}

/// Greatest common divisor by Euclidean reduction. `gcd(x, 0) == x`.
pub fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

/// Largest pair in exact `ratio0 : ratio1` proportion bounded by the limits
///
/// The ratio is reduced by its gcd first, so the result is always an integer
/// multiple of the reduced ratio:
/// - g = gcd(ratio0, ratio1)
/// - k = min(limit0 / (ratio0 / g), limit1 / (ratio1 / g))
/// - result = (k · ratio0 / g, k · ratio1 / g)
///
/// # Arguments
/// * `ratio0`, `ratio1` - Proportion to preserve (the pool reserves)
/// * `limit0`, `limit1` - Upper bounds per side (the caller's desired amounts)
///
/// # Returns
/// * `(cap0, cap1)` with `cap0 <= limit0` and `cap1 <= limit1`; `(0, 0)` for a
///   zero ratio
pub fn cap_with_fixed_ratio(
    ratio0: u128,
    ratio1: u128,
    limit0: u128,
    limit1: u128,
) -> (u128, u128) {
    let g = gcd(ratio0, ratio1);
    if g == 0 {
        return (0, 0);
    }

    let step0 = ratio0 / g;
    let step1 = ratio1 / g;

    // One step is always non-zero here since g != 0
    let k = match (step0, step1) {
        (0, s1) => limit1 / s1,
        (s0, 0) => limit0 / s0,
        (s0, s1) => min(limit0 / s0, limit1 / s1),
    };

    // k·step never exceeds its limit, so these cannot overflow
    (k * step0, k * step1)
}

/// Value of a two-token amount in token0 units
///
/// value = amount0 + amount1 · rate / RATE_SCALE (floor)
pub fn normalize_amount(amount0: u128, amount1: u128, rate: u64) -> Result<u128, ModelError> {
    let converted = amount1
        .checked_mul(rate as u128)
        .ok_or(ModelError::Overflow)?
        / RATE_SCALE;
    amount0.checked_add(converted).ok_or(ModelError::Overflow)
}

/// Output of a fixed-rate trade
///
/// - token0 → token1: out = amount_in · RATE_SCALE / rate
/// - token1 → token0: out = amount_in · rate / RATE_SCALE
///
/// Both round down. An output equal to `reserve_out` is allowed and drains
/// that side; anything above it is rejected.
///
/// # Arguments
/// * `direction` - Which side is paid in
/// * `amount_in` - Amount paid in
/// * `rate` - Conversion rate in parts per RATE_SCALE
/// * `reserve_out` - Pool reserve of the output token
pub fn quote_trade(
    direction: Direction,
    amount_in: u128,
    rate: u64,
    reserve_out: u128,
) -> Result<u128, ModelError> {
    if rate == 0 {
        return Err(ModelError::InvalidRate);
    }

    let amount_out = match direction {
        Direction::ZeroForOne => {
            amount_in
                .checked_mul(RATE_SCALE)
                .ok_or(ModelError::Overflow)?
                / rate as u128
        }
        Direction::OneForZero => {
            amount_in
                .checked_mul(rate as u128)
                .ok_or(ModelError::Overflow)?
                / RATE_SCALE
        }
    };

    if amount_out > reserve_out {
        return Err(ModelError::InvalidAmount);
    }

    Ok(amount_out)
}

/// `amount · share / total`, rounded down
pub fn pro_rata(amount: u128, share: u128, total: u128) -> Result<u128, ModelError> {
    if total == 0 {
        return Err(ModelError::NoLiquidity);
    }
    if share > total {
        return Err(ModelError::InvalidAmount);
    }
    if share == total {
        return Ok(amount);
    }

    let scaled = amount.checked_mul(share).ok_or(ModelError::Overflow)?;
    Ok(scaled / total)
}
