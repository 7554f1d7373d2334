//! Scenario replay errors

use thiserror::Error;

use crate::config::Expect;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("conversion rate must be greater than zero")]
    ZeroRate,

    #[error("address '{address}' is used as both {first} and {second}")]
    AddressCollision {
        address: String,
        first: &'static str,
        second: &'static str,
    },

    #[error("step {step}: account '{account}' is not listed in `accounts`")]
    UnknownAccount { step: usize, account: String },

    #[error("step {step} ({action}): expected {expected}, got {actual}")]
    UnexpectedOutcome {
        step: usize,
        action: &'static str,
        expected: Expect,
        actual: String,
    },
}
