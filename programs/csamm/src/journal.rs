//! Undo journal for the token movements of a single pool operation
//!
//! Operations record every pull and push they make. If a later step fails,
//! `rollback` replays the inverse movements newest-first and restores spent
//! allowances, so the ledgers end up exactly as they were before the call.

use log::{error, warn};

use crate::error::LedgerError;
use crate::ledger::TokenLedger;
use crate::token::{Address, Token, TokenPair};

#[derive(Debug, Clone)]
enum Entry {
    /// `owner` paid `amount` to `spender` on its allowance
    Pull {
        token: Token,
        spender: Address,
        owner: Address,
        amount: u128,
        allowance_before: u128,
    },
    /// `from` paid `amount` to `to`
    Push {
        token: Token,
        from: Address,
        to: Address,
        amount: u128,
    },
}

#[derive(Debug, Default)]
pub(crate) struct Journal {
    entries: Vec<Entry>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pull `amount` of `token` from `owner` into `spender`
    pub fn pull<L: TokenLedger>(
        &mut self,
        tokens: &mut TokenPair<L>,
        token: Token,
        spender: &Address,
        owner: &Address,
        amount: u128,
    ) -> Result<(), LedgerError> {
        let allowance_before = tokens.get(token).allowance(owner, spender);
        tokens
            .get_mut(token)
            .transfer_from(spender, owner, spender, amount)?;
        self.entries.push(Entry::Pull {
            token,
            spender: spender.clone(),
            owner: owner.clone(),
            amount,
            allowance_before,
        });
        Ok(())
    }

    /// Push `amount` of `token` from `from` to `to`
    pub fn push<L: TokenLedger>(
        &mut self,
        tokens: &mut TokenPair<L>,
        token: Token,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), LedgerError> {
        tokens.get_mut(token).transfer(from, to, amount)?;
        self.entries.push(Entry::Push {
            token,
            from: from.clone(),
            to: to.clone(),
            amount,
        });
        Ok(())
    }

    /// Reverse every recorded movement, newest first
    ///
    /// A compensating transfer the ledger refuses is logged and skipped; the
    /// remaining entries are still reversed.
    pub fn rollback<L: TokenLedger>(self, tokens: &mut TokenPair<L>) {
        if !self.entries.is_empty() {
            warn!("rolling back {} token movement(s)", self.entries.len());
        }

        for entry in self.entries.into_iter().rev() {
            match entry {
                Entry::Pull {
                    token,
                    spender,
                    owner,
                    amount,
                    allowance_before,
                } => {
                    let ledger = tokens.get_mut(token);
                    if let Err(err) = ledger.transfer(&spender, &owner, amount) {
                        error!("failed to return {} {} to {}: {}", amount, token, owner, err);
                    }
                    ledger.approve(&owner, &spender, allowance_before);
                }
                Entry::Push {
                    token,
                    from,
                    to,
                    amount,
                } => {
                    if let Err(err) = tokens.get_mut(token).transfer(&to, &from, amount) {
                        error!("failed to reclaim {} {} from {}: {}", amount, token, to, err);
                    }
                }
            }
        }
    }
}
