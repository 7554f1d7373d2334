//! Scenario replay against an in-memory pool

use anyhow::{Context, Result};
use colored::Colorize;
use csamm::{
    Address, CsammError, MemoryLedger, Pool, PoolSnapshot, TokenLedger, TokenPair,
};
use log::{debug, info};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::config::{load_scenario, Action, Expect, Scenario};
use crate::error::ScenarioError;

/// Outcome of one replayed step
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: usize,
    pub action: &'static str,
    pub account: String,
    pub outcome: Expect,
    pub detail: String,
}

/// Everything a replay produced
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub steps: Vec<StepReport>,
    pub pool: PoolSnapshot,
    /// Ledger symbols of (token0, token1)
    pub symbols: (String, String),
    /// (token0, token1) per holder, the pool included
    pub balances: BTreeMap<String, (u128, u128)>,
}

/// Classify a pool error the way scenarios spell expectations
fn outcome_of(err: &CsammError) -> Expect {
    match err {
        CsammError::InvalidTokenAddress(_) => Expect::InvalidTokenAddress,
        CsammError::InvalidAmount => Expect::InvalidAmount,
        CsammError::InsufficientBalance(_) => Expect::InsufficientBalance,
        CsammError::NoLiquidity => Expect::NoLiquidity,
        CsammError::InvalidCaller(_) => Expect::InvalidCaller,
        CsammError::IdenticalTokens(_) => Expect::IdenticalTokens,
        CsammError::InvalidConversionRate => Expect::InvalidConversionRate,
        CsammError::Overflow => Expect::Overflow,
    }
}

struct Simulator {
    pool: Pool,
    tokens: TokenPair<MemoryLedger>,
    accounts: Vec<String>,
}

impl Simulator {
    fn new(scenario: &Scenario) -> Result<Self> {
        let mut tokens = TokenPair::new(
            MemoryLedger::new(scenario.token0_address.as_str(), "TK0"),
            MemoryLedger::new(scenario.token1_address.as_str(), "TK1"),
        );

        for account in &scenario.accounts {
            let holder = Address::from(account.as_str());
            let amount = scenario.initial_mint as u128;
            tokens.token0.mint(&holder, amount)?;
            tokens.token1.mint(&holder, amount)?;
        }

        let pool = Pool::new(scenario.pool_address.as_str(), &tokens, scenario.conversion_rate)
            .context("Failed to create pool")?;

        info!(
            "pool {} created at rate {} with {} account(s)",
            pool.address(),
            pool.conversion_rate(),
            scenario.accounts.len()
        );

        Ok(Self {
            pool,
            tokens,
            accounts: scenario.accounts.clone(),
        })
    }

    /// Run one action; Ok(detail) on success, Err(pool error) on rejection
    fn apply(&mut self, action: &Action) -> Result<Result<String, CsammError>> {
        let caller = Address::from(action.account());
        let spender = self.pool.address().clone();

        let outcome = match action {
            Action::Provide {
                amount0,
                amount1,
                auto_approve,
                ..
            } => {
                let (amount0, amount1) = (*amount0 as u128, *amount1 as u128);
                if *auto_approve {
                    self.tokens.token0.approve(&caller, &spender, amount0);
                    self.tokens.token1.approve(&caller, &spender, amount1);
                }
                self.pool
                    .provide_liquidity(&mut self.tokens, &caller, amount0, amount1)
                    .map(|c| {
                        format!(
                            "added ({}, {}) for {} liquidity",
                            c.amount0, c.amount1, c.liquidity
                        )
                    })
            }
            Action::Withdraw { .. } => self
                .pool
                .withdraw_liquidity(&mut self.tokens, &caller)
                .map(|w| {
                    format!(
                        "received ({}, {}) for {} liquidity",
                        w.amount0, w.amount1, w.liquidity
                    )
                }),
            Action::Trade {
                token,
                amount,
                auto_approve,
                ..
            } => {
                let amount = *amount as u128;
                match self.pool.resolve_token(&Address::from(token.as_str())) {
                    Ok(token_in) => {
                        if *auto_approve {
                            self.tokens.get_mut(token_in).approve(&caller, &spender, amount);
                        }
                        self.pool
                            .trade(&mut self.tokens, &caller, token_in, amount)
                            .map(|r| {
                                format!(
                                    "paid {} {} for {} {}",
                                    r.amount_in,
                                    r.token_in,
                                    r.amount_out,
                                    r.token_in.opposite()
                                )
                            })
                    }
                    Err(err) => Err(err),
                }
            }
            Action::Mint { token, amount, .. } => {
                self.tokens.get_mut(*token).mint(&caller, *amount as u128)?;
                Ok(format!("minted {} {}", amount, token))
            }
            Action::Approve { token, amount, .. } => {
                self.tokens
                    .get_mut(*token)
                    .approve(&caller, &spender, *amount as u128);
                Ok(format!("approved {} {}", amount, token))
            }
        };

        Ok(outcome)
    }

    fn balances(&self) -> BTreeMap<String, (u128, u128)> {
        let mut balances: BTreeMap<String, (u128, u128)> = self
            .accounts
            .iter()
            .map(|a| (a.clone(), self.tokens.balances_of(&Address::from(a.as_str()))))
            .collect();
        balances.insert(
            self.pool.address().as_str().to_string(),
            self.tokens.balances_of(self.pool.address()),
        );
        balances
    }
}

/// Replay every step, stopping at the first outcome that differs from `expect`
pub fn run_scenario(scenario: &Scenario) -> Result<SimulationReport> {
    scenario.validate()?;
    let mut sim = Simulator::new(scenario)?;
    let mut steps = Vec::with_capacity(scenario.steps.len());

    for (index, step) in scenario.steps.iter().enumerate() {
        let number = index + 1;
        let (outcome, detail) = match sim.apply(&step.action)? {
            Ok(detail) => (Expect::Ok, detail),
            Err(err) => (outcome_of(&err), err.to_string()),
        };

        debug!(
            "step {} {} {}: {} ({})",
            number,
            step.action.name(),
            step.action.account(),
            outcome,
            detail
        );

        if outcome != step.expect {
            return Err(ScenarioError::UnexpectedOutcome {
                step: number,
                action: step.action.name(),
                expected: step.expect,
                actual: format!("{} ({})", outcome, detail),
            }
            .into());
        }

        steps.push(StepReport {
            step: number,
            action: step.action.name(),
            account: step.action.account().to_string(),
            outcome,
            detail,
        });
    }

    Ok(SimulationReport {
        steps,
        pool: sim.pool.snapshot(),
        symbols: (
            sim.tokens.token0.symbol().to_string(),
            sim.tokens.token1.symbol().to_string(),
        ),
        balances: sim.balances(),
    })
}

/// `csamm simulate` entry point
pub fn simulate(path: &Path, json: bool) -> Result<()> {
    let scenario = load_scenario(path)?;
    let report = run_scenario(&scenario)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", "=== CSAMM Simulation ===".bright_green().bold());
    println!("{} {}", "Scenario:".bright_cyan(), path.display());
    println!("{} {}", "Conversion rate:".bright_cyan(), scenario.conversion_rate);
    println!();

    for step in &report.steps {
        let status = if step.outcome == Expect::Ok {
            "ok".bright_green()
        } else {
            step.outcome.to_string().yellow()
        };
        println!(
            "[{:>3}] {:<8} {:<10} {} {}",
            step.step,
            step.action,
            step.account,
            status,
            step.detail.dimmed()
        );
    }

    print_pool(&report.pool);
    let (symbol0, symbol1) = &report.symbols;
    println!("\n{} ({}, {})", "Balances:".bright_cyan(), symbol0, symbol1);
    for (holder, (b0, b1)) in &report.balances {
        println!("  {:<12} {:>12} {:>12}", holder, b0, b1);
    }

    Ok(())
}

fn print_pool(pool: &PoolSnapshot) {
    println!("\n{}", "=== Pool ===".bright_green().bold());
    println!("{} ({}, {})", "Reserves:".bright_cyan(), pool.amount0, pool.amount1);
    println!("{} {}", "Total liquidity:".bright_cyan(), pool.total_liquidity);
    for (provider, credit) in &pool.liquidity_provided {
        println!("  {:<12} {:>12}", provider.to_string(), credit);
    }
}
