//! Token ledger capability and an in-memory reference ledger
//!
//! The pool never touches balances directly: every pull and push goes
//! through a [`TokenLedger`] handed to the operation by the caller. Any
//! fungible-token bookkeeping with balance/allowance semantics can sit
//! behind the trait; [`MemoryLedger`] is the one used by the tests and the
//! CLI simulator.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::LedgerError;
use crate::token::Address;

/// Fungible token ledger as seen by the pool engine
///
/// A failed pool operation undoes its earlier movements with plain
/// `transfer` calls back to the original owner and `approve` calls that
/// restore spent allowances. Implementations must accept those reverse
/// transfers whenever the forward movement succeeded; a ledger that refuses
/// one (fees on transfer, freezes, hooks) leaves the ledgers and the pool
/// out of step, and the engine can only log the failure.
pub trait TokenLedger {
    /// Address of the token itself
    fn address(&self) -> &Address;

    fn balance_of(&self, holder: &Address) -> u128;

    fn allowance(&self, owner: &Address, spender: &Address) -> u128;

    /// Set `spender`'s allowance over `owner`'s tokens to `amount`
    fn approve(&mut self, owner: &Address, spender: &Address, amount: u128);

    /// Move `amount` owned by `from` to `to`, authorized by `from`
    fn transfer(&mut self, from: &Address, to: &Address, amount: u128) -> Result<(), LedgerError>;

    /// Move `amount` from `from` to `to` on `spender`'s allowance
    fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), LedgerError>;
}

/// In-memory ERC-20 style ledger
#[derive(Debug, Clone, Serialize)]
pub struct MemoryLedger {
    address: Address,
    symbol: String,
    total_supply: u128,
    balances: BTreeMap<Address, u128>,
    #[serde(skip)]
    allowances: BTreeMap<(Address, Address), u128>,
}

impl MemoryLedger {
    pub fn new(address: impl Into<Address>, symbol: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            symbol: symbol.into(),
            total_supply: 0,
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    /// Create `amount` new tokens for `to`
    pub fn mint(&mut self, to: &Address, amount: u128) -> Result<(), LedgerError> {
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Overflow(self.address.clone()))?;
        let balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Overflow(to.clone()))?;

        self.total_supply = supply;
        self.balances.insert(to.clone(), balance);
        Ok(())
    }

    fn check_balance(&self, holder: &Address, amount: u128) -> Result<(), LedgerError> {
        let available = self.balance_of(holder);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                holder: holder.clone(),
                needed: amount,
                available,
            });
        }
        Ok(())
    }

    fn move_balance(
        &mut self,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), LedgerError> {
        self.check_balance(from, amount)?;
        if from == to || amount == 0 {
            return Ok(());
        }

        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Overflow(to.clone()))?;
        let debited = self.balance_of(from) - amount;

        self.balances.insert(from.clone(), debited);
        self.balances.insert(to.clone(), credited);
        Ok(())
    }
}

impl TokenLedger for MemoryLedger {
    fn address(&self) -> &Address {
        &self.address
    }

    fn balance_of(&self, holder: &Address) -> u128 {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.allowances
            .get(&(owner.clone(), spender.clone()))
            .copied()
            .unwrap_or(0)
    }

    fn approve(&mut self, owner: &Address, spender: &Address, amount: u128) {
        self.allowances.insert((owner.clone(), spender.clone()), amount);
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: u128) -> Result<(), LedgerError> {
        self.move_balance(from, to, amount)
    }

    fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), LedgerError> {
        let allowed = self.allowance(from, spender);
        if allowed < amount {
            return Err(LedgerError::InsufficientAllowance {
                owner: from.clone(),
                spender: spender.clone(),
                needed: amount,
                available: allowed,
            });
        }

        self.move_balance(from, to, amount)?;

        if allowed != u128::MAX {
            self.allowances
                .insert((from.clone(), spender.clone()), allowed - amount);
        }
        Ok(())
    }
}
