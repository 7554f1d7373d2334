//! CSAMM Model - Pure constant sum math for the pool engine
//!
//! This crate contains the integer formulas behind the constant-sum AMM:
//! ratio capping for liquidity provision, normalization of a two-token
//! amount into a single value, fixed-rate trade quotes and pro-rata shares.
//!
//! The stateful engine in `programs/csamm` imports these functions directly
//! and never re-derives them.

#![no_std]

#[cfg(test)]
extern crate std;

pub mod math;

pub use math::{
    cap_with_fixed_ratio, gcd, min, normalize_amount, pro_rata, quote_trade, Direction,
};

/// Conversion rate scale (10,000 = 1:1)
pub const RATE_SCALE: u128 = 10_000;

/// Error types for CSAMM math
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelError {
    /// Conversion rate is zero
    InvalidRate,
    /// Requested output exceeds the available reserve
    InvalidAmount,
    /// Share requested against an empty liquidity total
    NoLiquidity,
    /// Arithmetic overflow
    Overflow,
}

impl core::fmt::Display for ModelError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            ModelError::InvalidRate => "conversion rate must be non-zero",
            ModelError::InvalidAmount => "amount exceeds available reserve",
            ModelError::NoLiquidity => "no liquidity",
            ModelError::Overflow => "arithmetic overflow",
        };
        f.write_str(msg)
    }
}
