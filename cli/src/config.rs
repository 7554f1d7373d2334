//! Scenario configuration loaded from TOML

use anyhow::{Context, Result};
use csamm::Token;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::ScenarioError;

fn default_mint() -> u64 {
    100_000
}

fn default_pool_address() -> String {
    "csamm".to_string()
}

fn default_token0_address() -> String {
    "token0".to_string()
}

fn default_token1_address() -> String {
    "token1".to_string()
}

fn yes() -> bool {
    true
}

/// A pool, its accounts, and the steps to replay against it
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Parts per 10,000 (10000 = 1:1, 5000 = one token0 for two token1)
    pub conversion_rate: u64,

    /// Minted to every listed account on both tokens before step 1
    #[serde(default = "default_mint")]
    pub initial_mint: u64,

    #[serde(default)]
    pub accounts: Vec<String>,

    #[serde(default = "default_pool_address")]
    pub pool_address: String,

    #[serde(default = "default_token0_address")]
    pub token0_address: String,

    #[serde(default = "default_token1_address")]
    pub token1_address: String,

    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    #[serde(flatten)]
    pub action: Action,

    #[serde(default)]
    pub expect: Expect,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Action {
    Provide {
        account: String,
        amount0: u64,
        amount1: u64,
        #[serde(default = "yes")]
        auto_approve: bool,
    },
    Withdraw {
        account: String,
    },
    Trade {
        account: String,
        /// Token address; anything but the pool's two tokens is rejected
        token: String,
        amount: u64,
        #[serde(default = "yes")]
        auto_approve: bool,
    },
    Mint {
        account: String,
        token: Token,
        amount: u64,
    },
    Approve {
        account: String,
        token: Token,
        amount: u64,
    },
}

impl Action {
    pub fn account(&self) -> &str {
        match self {
            Action::Provide { account, .. }
            | Action::Withdraw { account }
            | Action::Trade { account, .. }
            | Action::Mint { account, .. }
            | Action::Approve { account, .. } => account,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::Provide { .. } => "provide",
            Action::Withdraw { .. } => "withdraw",
            Action::Trade { .. } => "trade",
            Action::Mint { .. } => "mint",
            Action::Approve { .. } => "approve",
        }
    }
}

/// Expected outcome of a step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, serde::Serialize)]
pub enum Expect {
    #[default]
    #[serde(rename = "ok")]
    Ok,
    InvalidAmount,
    InvalidTokenAddress,
    InsufficientBalance,
    NoLiquidity,
    InvalidCaller,
    IdenticalTokens,
    InvalidConversionRate,
    Overflow,
}

impl std::fmt::Display for Expect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Expect::Ok => "ok",
            Expect::InvalidAmount => "InvalidAmount",
            Expect::InvalidTokenAddress => "InvalidTokenAddress",
            Expect::InsufficientBalance => "InsufficientBalance",
            Expect::NoLiquidity => "NoLiquidity",
            Expect::InvalidCaller => "InvalidCaller",
            Expect::IdenticalTokens => "IdenticalTokens",
            Expect::InvalidConversionRate => "InvalidConversionRate",
            Expect::Overflow => "Overflow",
        };
        f.write_str(name)
    }
}

impl Scenario {
    /// Parse a scenario from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(text).context("Failed to parse scenario TOML")?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Reject scenarios that reference accounts they never declared or give
    /// two roles the same address
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.conversion_rate == 0 {
            return Err(ScenarioError::ZeroRate);
        }
        if self.token0_address == self.token1_address {
            return Err(ScenarioError::AddressCollision {
                address: self.token0_address.clone(),
                first: "token0",
                second: "token1",
            });
        }
        for (role, token) in [("token0", &self.token0_address), ("token1", &self.token1_address)] {
            if self.pool_address == *token {
                return Err(ScenarioError::AddressCollision {
                    address: token.clone(),
                    first: "pool",
                    second: role,
                });
            }
        }
        if self.accounts.contains(&self.pool_address) {
            return Err(ScenarioError::AddressCollision {
                address: self.pool_address.clone(),
                first: "pool",
                second: "account",
            });
        }
        for (index, step) in self.steps.iter().enumerate() {
            let account = step.action.account();
            if !self.accounts.iter().any(|a| a == account) {
                return Err(ScenarioError::UnknownAccount {
                    step: index + 1,
                    account: account.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Load a scenario from a TOML file
pub fn load_scenario(path: &Path) -> Result<Scenario> {
    if !path.exists() {
        anyhow::bail!("Scenario file not found: {}", path.display());
    }

    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario file: {}", path.display()))?;

    Scenario::from_toml(&text).with_context(|| format!("Invalid scenario: {}", path.display()))
}
