//! Stateless pricing commands

use anyhow::Result;
use colored::Colorize;
use csamm::math::{cap_with_fixed_ratio, normalize_amount, quote_trade, RATE_SCALE};
use csamm::{CsammError, Token};

/// Output of a trade at `rate`; `reserve` bounds what the pool can pay
pub fn quote_output(
    rate: u64,
    token_in: Token,
    amount: u128,
    reserve: Option<u128>,
) -> Result<u128> {
    if rate == 0 {
        anyhow::bail!("conversion rate must be greater than zero");
    }
    let out = quote_trade(
        token_in.direction_in(),
        amount,
        rate,
        reserve.unwrap_or(u128::MAX),
    )
    .map_err(CsammError::from)?;
    Ok(out)
}

pub fn quote(rate: u64, token_in: Token, amount: u128, reserve: Option<u128>) -> Result<()> {
    println!("{}", "=== Trade Quote ===".bright_green().bold());
    println!(
        "{} {} ({}/{})",
        "Rate:".bright_cyan(),
        rate,
        rate,
        RATE_SCALE
    );
    println!("{} {} {}", "Input:".bright_cyan(), amount, token_in);
    if let Some(r) = reserve {
        println!("{} {} {}", "Reserve:".bright_cyan(), r, token_in.opposite());
    }

    let out = quote_output(rate, token_in, amount, reserve)?;
    println!("{} {} {}", "Output:".bright_cyan(), out, token_in.opposite());
    Ok(())
}

pub fn cap(ratio0: u128, ratio1: u128, limit0: u128, limit1: u128) -> Result<()> {
    let (a0, a1) = cap_with_fixed_ratio(ratio0, ratio1, limit0, limit1);

    println!("{}", "=== Fixed-Ratio Cap ===".bright_green().bold());
    println!("{} {}:{}", "Ratio:".bright_cyan(), ratio0, ratio1);
    println!("{} ({}, {})", "Limits:".bright_cyan(), limit0, limit1);
    println!("{} ({}, {})", "Capped:".bright_cyan(), a0, a1);
    Ok(())
}

pub fn normalize(amount0: u128, amount1: u128, rate: u64) -> Result<()> {
    if rate == 0 {
        anyhow::bail!("conversion rate must be greater than zero");
    }
    let value = normalize_amount(amount0, amount1, rate).map_err(CsammError::from)?;

    println!("{}", "=== Normalized Value ===".bright_green().bold());
    println!("{} ({}, {})", "Amounts:".bright_cyan(), amount0, amount1);
    println!("{} {}", "Rate:".bright_cyan(), rate);
    println!("{} {} token0", "Value:".bright_cyan(), value);
    Ok(())
}
