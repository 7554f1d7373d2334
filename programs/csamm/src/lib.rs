//! Constant Sum AMM (CSAMM) pool engine
//!
//! A two-token pool that trades at a fixed conversion rate, credits liquidity
//! providers in normalized (token0-equivalent) units and pays withdrawals as a
//! pro-rata slice of the reserves at withdrawal time.
//!
//! Token movements go through an injected [`TokenLedger`] per token, grouped
//! in a [`TokenPair`]; the engine itself owns no balances. All integer math
//! lives in `csamm_model` and is re-exported through [`math`].

pub mod error;
mod journal;
pub mod ledger;
pub mod math;
pub mod pool;
pub mod token;

pub use error::{CsammError, LedgerError, Result};
pub use ledger::{MemoryLedger, TokenLedger};
pub use pool::{Contribution, Pool, PoolSnapshot, TradeReceipt, Withdrawal};
pub use token::{Address, Token, TokenPair};
