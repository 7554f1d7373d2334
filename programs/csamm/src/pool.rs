//! Pool engine: reserves, liquidity credits and the three pool operations
//!
//! A pool holds two reserves traded at a fixed conversion rate (parts per
//! 10,000 of token0 per token1). Providers are credited in normalized units
//! (token0-equivalent value) and withdraw a pro-rata slice of whatever the
//! reserves hold at that moment.
//!
//! Every operation is all-or-nothing. Pure checks run first, token movements
//! are recorded in a [`Journal`], and pool state is only written once every
//! movement has succeeded. On failure the journal is rolled back and the
//! error is returned unchanged.

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{CsammError, Result};
use crate::journal::Journal;
use crate::ledger::TokenLedger;
use crate::math::{cap_with_fixed_ratio, normalize_amount, pro_rata, quote_trade};
use crate::token::{Address, Token, TokenPair};

/// Amounts pulled into the pool by `provide_liquidity`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    pub amount0: u128,
    pub amount1: u128,
    /// Credit added to the provider, in normalized units
    pub liquidity: u128,
}

/// Amounts paid out by `withdraw_liquidity`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub amount0: u128,
    pub amount1: u128,
    /// Credit removed from the provider
    pub liquidity: u128,
}

/// Result of a completed trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeReceipt {
    pub token_in: Token,
    pub amount_in: u128,
    pub amount_out: u128,
}

/// Point-in-time view of a pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub address: Address,
    pub token0: Address,
    pub token1: Address,
    pub conversion_rate: u64,
    pub amount0: u128,
    pub amount1: u128,
    pub total_liquidity: u128,
    pub liquidity_provided: BTreeMap<Address, u128>,
}

/// Constant sum pool
#[derive(Debug, Clone)]
pub struct Pool {
    /// Holder identity of the pool at both ledgers
    address: Address,
    token0: Address,
    token1: Address,
    /// Parts per RATE_SCALE; immutable after construction
    conversion_rate: u64,
    amount0: u128,
    amount1: u128,
    liquidity_provided: BTreeMap<Address, u128>,
    /// Always equals the sum of `liquidity_provided`
    total_liquidity: u128,
}

impl Pool {
    /// Create an empty pool trading between the two ledgers of `tokens`
    pub fn new<L: TokenLedger>(
        address: impl Into<Address>,
        tokens: &TokenPair<L>,
        conversion_rate: u64,
    ) -> Result<Self> {
        if conversion_rate == 0 {
            return Err(CsammError::InvalidConversionRate);
        }
        if tokens.token0.address() == tokens.token1.address() {
            return Err(CsammError::IdenticalTokens(tokens.token0.address().clone()));
        }

        Ok(Self {
            address: address.into(),
            token0: tokens.token0.address().clone(),
            token1: tokens.token1.address().clone(),
            conversion_rate,
            amount0: 0,
            amount1: 0,
            liquidity_provided: BTreeMap::new(),
            total_liquidity: 0,
        })
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn token0(&self) -> &Address {
        &self.token0
    }

    pub fn token1(&self) -> &Address {
        &self.token1
    }

    pub fn conversion_rate(&self) -> u64 {
        self.conversion_rate
    }

    pub fn amount0(&self) -> u128 {
        self.amount0
    }

    pub fn amount1(&self) -> u128 {
        self.amount1
    }

    pub fn reserve(&self, token: Token) -> u128 {
        match token {
            Token::Token0 => self.amount0,
            Token::Token1 => self.amount1,
        }
    }

    pub fn liquidity_provided(&self, provider: &Address) -> u128 {
        self.liquidity_provided.get(provider).copied().unwrap_or(0)
    }

    pub fn total_liquidity(&self) -> u128 {
        self.total_liquidity
    }

    /// Current reserves valued in token0 units
    pub fn normalized_value(&self) -> Result<u128> {
        Ok(normalize_amount(self.amount0, self.amount1, self.conversion_rate)?)
    }

    /// Map a ledger address onto one side of the pool
    pub fn resolve_token(&self, address: &Address) -> Result<Token> {
        if *address == self.token0 {
            Ok(Token::Token0)
        } else if *address == self.token1 {
            Ok(Token::Token1)
        } else {
            Err(CsammError::InvalidTokenAddress(address.clone()))
        }
    }

    /// Output of trading `amount_in` of `token_in` against current reserves
    pub fn quote(&self, token_in: Token, amount_in: u128) -> Result<u128> {
        let reserve_out = self.reserve(token_in.opposite());
        Ok(quote_trade(
            token_in.direction_in(),
            amount_in,
            self.conversion_rate,
            reserve_out,
        )?)
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            address: self.address.clone(),
            token0: self.token0.clone(),
            token1: self.token1.clone(),
            conversion_rate: self.conversion_rate,
            amount0: self.amount0,
            amount1: self.amount1,
            total_liquidity: self.total_liquidity,
            liquidity_provided: self.liquidity_provided.clone(),
        }
    }

    /// Add liquidity on behalf of `caller`
    ///
    /// While either reserve is empty any ratio is accepted as-is. Otherwise the
    /// contribution is capped to the current reserve ratio, never exceeding
    /// the desired amounts. The caller is credited with the normalized value
    /// of what was actually pulled.
    ///
    /// # Errors
    /// * `InvalidCaller` - caller is the pool itself
    /// * `InsufficientBalance` - caller lacks balance or allowance
    /// * `Overflow` - reserves or credits would overflow
    pub fn provide_liquidity<L: TokenLedger>(
        &mut self,
        tokens: &mut TokenPair<L>,
        caller: &Address,
        desired0: u128,
        desired1: u128,
    ) -> Result<Contribution> {
        self.check_caller(caller)?;

        let (amount0, amount1) = if self.amount0 == 0 || self.amount1 == 0 {
            (desired0, desired1)
        } else {
            cap_with_fixed_ratio(self.amount0, self.amount1, desired0, desired1)
        };

        let liquidity = normalize_amount(amount0, amount1, self.conversion_rate)?;
        let new_amount0 = self.amount0.checked_add(amount0).ok_or(CsammError::Overflow)?;
        let new_amount1 = self.amount1.checked_add(amount1).ok_or(CsammError::Overflow)?;
        let new_credit = self
            .liquidity_provided(caller)
            .checked_add(liquidity)
            .ok_or(CsammError::Overflow)?;
        let new_total = self
            .total_liquidity
            .checked_add(liquidity)
            .ok_or(CsammError::Overflow)?;

        let mut journal = Journal::new();
        let pulled = journal
            .pull(tokens, Token::Token0, &self.address, caller, amount0)
            .and_then(|()| journal.pull(tokens, Token::Token1, &self.address, caller, amount1));
        if let Err(err) = pulled {
            journal.rollback(tokens);
            return Err(err.into());
        }

        self.amount0 = new_amount0;
        self.amount1 = new_amount1;
        if new_credit > 0 {
            self.liquidity_provided.insert(caller.clone(), new_credit);
        }
        self.total_liquidity = new_total;

        debug!(
            "provide: {} added ({}, {}) for {} liquidity, reserves now ({}, {})",
            caller, amount0, amount1, liquidity, self.amount0, self.amount1
        );

        Ok(Contribution {
            amount0,
            amount1,
            liquidity,
        })
    }

    /// Withdraw the caller's entire credit as a pro-rata slice of current reserves
    ///
    /// # Errors
    /// * `InvalidCaller` - caller is the pool itself
    /// * `NoLiquidity` - caller has no credit
    /// * `InsufficientBalance` - a ledger refused to pay out
    pub fn withdraw_liquidity<L: TokenLedger>(
        &mut self,
        tokens: &mut TokenPair<L>,
        caller: &Address,
    ) -> Result<Withdrawal> {
        self.check_caller(caller)?;

        let liquidity = self.liquidity_provided(caller);
        if liquidity == 0 {
            return Err(CsammError::NoLiquidity);
        }

        let amount0 = pro_rata(self.amount0, liquidity, self.total_liquidity)?;
        let amount1 = pro_rata(self.amount1, liquidity, self.total_liquidity)?;

        let mut journal = Journal::new();
        let paid = journal
            .push(tokens, Token::Token0, &self.address, caller, amount0)
            .and_then(|()| journal.push(tokens, Token::Token1, &self.address, caller, amount1));
        if let Err(err) = paid {
            journal.rollback(tokens);
            return Err(err.into());
        }

        // pro_rata never returns more than the reserve it was given
        self.amount0 -= amount0;
        self.amount1 -= amount1;
        self.liquidity_provided.remove(caller);
        self.total_liquidity -= liquidity;

        debug!(
            "withdraw: {} took ({}, {}) for {} liquidity, reserves now ({}, {})",
            caller, amount0, amount1, liquidity, self.amount0, self.amount1
        );

        Ok(Withdrawal {
            amount0,
            amount1,
            liquidity,
        })
    }

    /// Trade `amount_in` of `token_in` for the opposite token at the fixed rate
    ///
    /// The input is pulled before the quote is checked, so a caller who
    /// cannot pay sees `InsufficientBalance` ahead of `InvalidAmount`.
    ///
    /// # Errors
    /// * `InvalidCaller` - caller is the pool itself
    /// * `InsufficientBalance` - caller lacks balance or allowance
    /// * `InvalidAmount` - output would exceed the opposite reserve
    /// * `Overflow` - input reserve would overflow
    pub fn trade<L: TokenLedger>(
        &mut self,
        tokens: &mut TokenPair<L>,
        caller: &Address,
        token_in: Token,
        amount_in: u128,
    ) -> Result<TradeReceipt> {
        self.check_caller(caller)?;
        let token_out = token_in.opposite();

        let mut journal = Journal::new();
        let settled = self.settle_trade(tokens, &mut journal, caller, token_in, amount_in);
        let (amount_out, new_reserve_in) = match settled {
            Ok(settled) => settled,
            Err(err) => {
                journal.rollback(tokens);
                return Err(err);
            }
        };

        let new_reserve_out = self.reserve(token_out) - amount_out;
        match token_in {
            Token::Token0 => {
                self.amount0 = new_reserve_in;
                self.amount1 = new_reserve_out;
            }
            Token::Token1 => {
                self.amount1 = new_reserve_in;
                self.amount0 = new_reserve_out;
            }
        }

        debug!(
            "trade: {} paid {} {} for {} {}, reserves now ({}, {})",
            caller, amount_in, token_in, amount_out, token_out, self.amount0, self.amount1
        );

        Ok(TradeReceipt {
            token_in,
            amount_in,
            amount_out,
        })
    }

    /// Transfers between the pool and itself are no-ops at the ledger, so the
    /// pool would book reserves it never received
    fn check_caller(&self, caller: &Address) -> Result<()> {
        if *caller == self.address {
            return Err(CsammError::InvalidCaller(caller.clone()));
        }
        Ok(())
    }

    /// Pull, quote and push for a trade; returns (amount_out, new input reserve)
    fn settle_trade<L: TokenLedger>(
        &self,
        tokens: &mut TokenPair<L>,
        journal: &mut Journal,
        caller: &Address,
        token_in: Token,
        amount_in: u128,
    ) -> Result<(u128, u128)> {
        journal.pull(tokens, token_in, &self.address, caller, amount_in)?;

        let amount_out = self.quote(token_in, amount_in)?;
        let new_reserve_in = self
            .reserve(token_in)
            .checked_add(amount_in)
            .ok_or(CsammError::Overflow)?;

        journal.push(tokens, token_in.opposite(), &self.address, caller, amount_out)?;

        Ok((amount_out, new_reserve_in))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedger;

    const MINT: u128 = 100_000;

    fn setup(rate: u64, accounts: &[&str]) -> (Pool, TokenPair<MemoryLedger>) {
        let mut tokens = TokenPair::new(
            MemoryLedger::new("token0", "TK0"),
            MemoryLedger::new("token1", "TK1"),
        );
        for account in accounts {
            let account = Address::from(*account);
            tokens.token0.mint(&account, MINT).unwrap();
            tokens.token1.mint(&account, MINT).unwrap();
        }
        let pool = Pool::new("csamm", &tokens, rate).unwrap();
        (pool, tokens)
    }

    fn approve(
        tokens: &mut TokenPair<MemoryLedger>,
        pool: &Pool,
        owner: &Address,
        a0: u128,
        a1: u128,
    ) {
        tokens.token0.approve(owner, pool.address(), a0);
        tokens.token1.approve(owner, pool.address(), a1);
    }

    #[test]
    fn test_new_pool() {
        let (pool, _) = setup(5000, &[]);
        assert_eq!(pool.conversion_rate(), 5000);
        assert_eq!(pool.amount0(), 0);
        assert_eq!(pool.amount1(), 0);
        assert_eq!(pool.token0(), &Address::from("token0"));
        assert_eq!(pool.token1(), &Address::from("token1"));
        assert_eq!(pool.total_liquidity(), 0);
    }

    #[test]
    fn test_new_pool_zero_rate() {
        let tokens = TokenPair::new(
            MemoryLedger::new("token0", "TK0"),
            MemoryLedger::new("token1", "TK1"),
        );
        assert_eq!(
            Pool::new("csamm", &tokens, 0).unwrap_err(),
            CsammError::InvalidConversionRate
        );
    }

    #[test]
    fn test_new_pool_identical_tokens() {
        let tokens = TokenPair::new(
            MemoryLedger::new("usdc", "USDC"),
            MemoryLedger::new("usdc", "USDC"),
        );
        assert_eq!(
            Pool::new("csamm", &tokens, 10_000).unwrap_err(),
            CsammError::IdenticalTokens(Address::from("usdc"))
        );
    }

    #[test]
    fn test_pool_cannot_be_its_own_caller() {
        let (mut pool, mut tokens) = setup(10_000, &["csamm", "bob"]);
        let own = pool.address().clone();
        approve(&mut tokens, &pool, &own, MINT, MINT);

        assert_eq!(
            pool.provide_liquidity(&mut tokens, &own, 1000, 1000),
            Err(CsammError::InvalidCaller(own.clone()))
        );
        assert_eq!(
            pool.trade(&mut tokens, &own, Token::Token0, 500),
            Err(CsammError::InvalidCaller(own.clone()))
        );
        assert_eq!(
            pool.withdraw_liquidity(&mut tokens, &own),
            Err(CsammError::InvalidCaller(own.clone()))
        );

        // nothing was booked, so the ledger and the reserves still agree
        assert_eq!((pool.amount0(), pool.amount1()), (0, 0));
        assert_eq!(tokens.balances_of(&own), (MINT, MINT));
        assert_eq!(pool.total_liquidity(), 0);

        // a regular trader on the empty pool cannot be paid from the pool's funds
        let bob = Address::from("bob");
        approve(&mut tokens, &pool, &bob, 500, 0);
        assert_eq!(
            pool.trade(&mut tokens, &bob, Token::Token0, 500),
            Err(CsammError::InvalidAmount)
        );
        assert_eq!(tokens.balances_of(&own), (MINT, MINT));
    }

    #[test]
    fn test_resolve_token() {
        let (pool, _) = setup(5000, &[]);
        assert_eq!(pool.resolve_token(&Address::from("token0")), Ok(Token::Token0));
        assert_eq!(pool.resolve_token(&Address::from("token1")), Ok(Token::Token1));
        assert_eq!(
            pool.resolve_token(&Address::from("0xdeadbeef")),
            Err(CsammError::InvalidTokenAddress(Address::from("0xdeadbeef")))
        );
    }

    #[test]
    fn test_trade_half_rate() {
        let (mut pool, mut tokens) = setup(5000, &["alice"]);
        let alice = Address::from("alice");

        approve(&mut tokens, &pool, &alice, MINT, MINT);
        pool.provide_liquidity(&mut tokens, &alice, MINT, MINT).unwrap();
        assert_eq!(tokens.balances_of(&alice), (0, 0));

        // 100 token0 -> 200 token1
        tokens.token0.mint(&alice, 100).unwrap();
        tokens.token0.approve(&alice, pool.address(), 100);
        let receipt = pool.trade(&mut tokens, &alice, Token::Token0, 100).unwrap();
        assert_eq!(receipt.amount_out, 200);
        assert_eq!(tokens.balances_of(&alice), (0, 200));
        assert_eq!((pool.amount0(), pool.amount1()), (100_100, 99_800));

        // 100 token1 -> 50 token0
        tokens.token1.approve(&alice, pool.address(), 100);
        let receipt = pool.trade(&mut tokens, &alice, Token::Token1, 100).unwrap();
        assert_eq!(receipt.amount_out, 50);
        assert_eq!(tokens.balances_of(&alice), (50, 100));
        assert_eq!((pool.amount0(), pool.amount1()), (100_050, 99_900));
    }

    #[test]
    fn test_trade_caller_cannot_pay() {
        let (mut pool, mut tokens) = setup(5000, &["alice"]);
        let alice = Address::from("alice");

        approve(&mut tokens, &pool, &alice, 200_000, 200_000);
        let result = pool.trade(&mut tokens, &alice, Token::Token0, 200_000);
        assert!(matches!(
            result,
            Err(CsammError::InsufficientBalance(crate::LedgerError::InsufficientBalance { .. }))
        ));
        let result = pool.trade(&mut tokens, &alice, Token::Token1, 200_000);
        assert!(matches!(result, Err(CsammError::InsufficientBalance(_))));
    }

    #[test]
    fn test_trade_pool_cannot_pay_rolls_back() {
        let (mut pool, mut tokens) = setup(5000, &["alice"]);
        let alice = Address::from("alice");

        approve(&mut tokens, &pool, &alice, MINT, 0);
        let result = pool.trade(&mut tokens, &alice, Token::Token0, MINT);
        assert_eq!(result, Err(CsammError::InvalidAmount));

        assert_eq!(tokens.balances_of(&alice), (MINT, MINT));
        assert_eq!(tokens.balances_of(pool.address()), (0, 0));
        assert_eq!(tokens.token0.allowance(&alice, pool.address()), MINT);
        assert_eq!((pool.amount0(), pool.amount1()), (0, 0));
    }

    #[test]
    fn test_provide_zero_is_noop() {
        let (mut pool, mut tokens) = setup(5000, &["alice", "bob"]);
        let alice = Address::from("alice");
        let bob = Address::from("bob");

        approve(&mut tokens, &pool, &alice, 0, 1000);
        pool.provide_liquidity(&mut tokens, &alice, 0, 1000).unwrap();

        let contribution = pool.provide_liquidity(&mut tokens, &bob, 0, 0).unwrap();
        assert_eq!(contribution.liquidity, 0);
        assert_eq!(pool.liquidity_provided(&bob), 0);
        assert!(!pool.snapshot().liquidity_provided.contains_key(&bob));
        assert_eq!((pool.amount0(), pool.amount1()), (0, 1000));
    }

    #[test]
    fn test_provide_second_pull_fails_rolls_back_first() {
        let (mut pool, mut tokens) = setup(5000, &["alice"]);
        let alice = Address::from("alice");

        // token1 allowance missing
        approve(&mut tokens, &pool, &alice, 1000, 0);
        let result = pool.provide_liquidity(&mut tokens, &alice, 1000, 1000);
        assert!(matches!(
            result,
            Err(CsammError::InsufficientBalance(crate::LedgerError::InsufficientAllowance { .. }))
        ));

        assert_eq!(tokens.balances_of(&alice), (MINT, MINT));
        assert_eq!(tokens.token0.allowance(&alice, pool.address()), 1000);
        assert_eq!(pool.snapshot().amount0, 0);
        assert_eq!(pool.liquidity_provided(&alice), 0);
        assert_eq!(pool.total_liquidity(), 0);
    }

    #[test]
    fn test_withdraw_without_liquidity() {
        let (mut pool, mut tokens) = setup(5000, &["alice"]);
        let alice = Address::from("alice");
        assert_eq!(
            pool.withdraw_liquidity(&mut tokens, &alice),
            Err(CsammError::NoLiquidity)
        );
    }

    #[test]
    fn test_total_liquidity_tracks_credits() {
        let (mut pool, mut tokens) = setup(5000, &["alice", "bob"]);
        let alice = Address::from("alice");
        let bob = Address::from("bob");

        approve(&mut tokens, &pool, &alice, 1000, 2000);
        pool.provide_liquidity(&mut tokens, &alice, 1000, 2000).unwrap();
        approve(&mut tokens, &pool, &bob, 500, 1000);
        pool.provide_liquidity(&mut tokens, &bob, 500, 1000).unwrap();

        let snapshot = pool.snapshot();
        let sum: u128 = snapshot.liquidity_provided.values().sum();
        assert_eq!(sum, snapshot.total_liquidity);
        assert_eq!(pool.total_liquidity(), 3000);
        assert_eq!(pool.normalized_value(), Ok(3000));

        pool.withdraw_liquidity(&mut tokens, &bob).unwrap();
        assert_eq!(pool.total_liquidity(), 2000);
    }

    #[test]
    fn test_quote_does_not_mutate() {
        let (mut pool, mut tokens) = setup(5000, &["alice"]);
        let alice = Address::from("alice");
        approve(&mut tokens, &pool, &alice, 1000, 1000);
        pool.provide_liquidity(&mut tokens, &alice, 1000, 1000).unwrap();

        let before = pool.snapshot();
        assert_eq!(pool.quote(Token::Token1, 100), Ok(50));
        assert_eq!(pool.quote(Token::Token0, 501), Err(CsammError::InvalidAmount));
        assert_eq!(pool.snapshot(), before);
    }
}
