//! CSAMM CLI - scenario replay and pricing tool
//!
//! Replays TOML scenarios against an in-memory constant sum pool and
//! exposes the pricing helpers for quick what-if checks.

use clap::{Parser, Subcommand};
use csamm::Token;
use std::path::PathBuf;

mod config;
mod error;
mod quote;
mod simulate;

#[derive(Parser)]
#[command(name = "csamm")]
#[command(about = "Constant sum AMM simulator", long_about = None)]
#[command(version)]
struct Cli {
    /// Verbose output (debug logging unless RUST_LOG is set)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scenario file against a fresh pool
    Simulate {
        /// Path to the scenario TOML
        path: PathBuf,

        /// Print the final report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Price a single trade
    Quote {
        /// Conversion rate in parts per 10,000
        #[arg(short, long)]
        rate: u64,

        /// Token paid in (token0 or token1)
        #[arg(short, long)]
        token: Token,

        /// Amount paid in
        #[arg(short, long)]
        amount: u128,

        /// Reserve of the output token, if bounded
        #[arg(long)]
        reserve: Option<u128>,
    },

    /// Largest amounts within limits that keep a fixed ratio
    Cap {
        ratio0: u128,
        ratio1: u128,
        limit0: u128,
        limit1: u128,
    },

    /// Value a pair of amounts in token0 units
    Normalize {
        amount0: u128,
        amount1: u128,
        rate: u64,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match cli.command {
        Commands::Simulate { path, json } => simulate::simulate(&path, json),
        Commands::Quote {
            rate,
            token,
            amount,
            reserve,
        } => quote::quote(rate, token, amount, reserve),
        Commands::Cap {
            ratio0,
            ratio1,
            limit0,
            limit1,
        } => quote::cap(ratio0, ratio1, limit0, limit1),
        Commands::Normalize {
            amount0,
            amount1,
            rate,
        } => quote::normalize(amount0, amount1, rate),
    }
}
