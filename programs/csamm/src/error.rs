//! Error types for the pool engine and token ledgers

use csamm_model::ModelError;
use thiserror::Error;

use crate::token::Address;

/// Failures raised by a token ledger
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("insufficient balance: {holder} has {available}, needs {needed}")]
    InsufficientBalance {
        holder: Address,
        needed: u128,
        available: u128,
    },

    #[error(
        "insufficient allowance: {spender} may move {available} of {owner}'s tokens, needs {needed}"
    )]
    InsufficientAllowance {
        owner: Address,
        spender: Address,
        needed: u128,
        available: u128,
    },

    #[error("balance overflow for {0}")]
    Overflow(Address),
}

/// Failures raised by pool operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CsammError {
    /// Token address is neither token0 nor token1
    #[error("token address not valid: {0}")]
    InvalidTokenAddress(Address),

    /// Output would exceed the pool's reserve
    #[error("invalid amount")]
    InvalidAmount,

    /// Caller lacks balance or allowance at a token ledger
    #[error(transparent)]
    InsufficientBalance(#[from] LedgerError),

    /// Caller has no liquidity credit to withdraw
    #[error("have no liquidity to be withdrawn")]
    NoLiquidity,

    /// The pool itself was passed as the caller
    #[error("pool {0} cannot act as its own caller")]
    InvalidCaller(Address),

    /// token0 and token1 share one ledger address
    #[error("token0 and token1 must differ, both are {0}")]
    IdenticalTokens(Address),

    /// Conversion rate of zero at construction
    #[error("conversion rate must be greater than zero")]
    InvalidConversionRate,

    /// Arithmetic overflow
    #[error("arithmetic overflow")]
    Overflow,
}

impl From<ModelError> for CsammError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::InvalidRate => CsammError::InvalidConversionRate,
            ModelError::InvalidAmount => CsammError::InvalidAmount,
            ModelError::NoLiquidity => CsammError::NoLiquidity,
            ModelError::Overflow => CsammError::Overflow,
        }
    }
}

pub type Result<T> = core::result::Result<T, CsammError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_error_mapping() {
        assert_eq!(CsammError::from(ModelError::InvalidAmount), CsammError::InvalidAmount);
        assert_eq!(CsammError::from(ModelError::NoLiquidity), CsammError::NoLiquidity);
        assert_eq!(CsammError::from(ModelError::Overflow), CsammError::Overflow);
        assert_eq!(
            CsammError::from(ModelError::InvalidRate),
            CsammError::InvalidConversionRate
        );
    }

    #[test]
    fn test_ledger_error_is_insufficient_balance() {
        let err: CsammError = LedgerError::InsufficientAllowance {
            owner: Address::from("alice"),
            spender: Address::from("pool"),
            needed: 10,
            available: 0,
        }
        .into();
        assert!(matches!(err, CsammError::InsufficientBalance(_)));
        assert!(err.to_string().contains("insufficient allowance"));
    }
}
