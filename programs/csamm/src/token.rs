//! Holder identities and the two pool tokens

use core::fmt;
use core::str::FromStr;

use csamm_model::Direction;
use serde::{Deserialize, Serialize};

use crate::ledger::TokenLedger;

/// Opaque holder identity at a token ledger (an account, a pool, a token)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for Address {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One side of the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Token {
    Token0,
    Token1,
}

impl Token {
    pub fn opposite(self) -> Token {
        match self {
            Token::Token0 => Token::Token1,
            Token::Token1 => Token::Token0,
        }
    }

    /// Trade direction when this token is paid in
    pub fn direction_in(self) -> Direction {
        match self {
            Token::Token0 => Direction::ZeroForOne,
            Token::Token1 => Direction::OneForZero,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Token0 => f.write_str("token0"),
            Token::Token1 => f.write_str("token1"),
        }
    }
}

impl FromStr for Token {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "token0" | "0" => Ok(Token::Token0),
            "token1" | "1" => Ok(Token::Token1),
            other => Err(format!("unknown token: {} (use token0 or token1)", other)),
        }
    }
}

/// The two token ledgers a pool trades between
#[derive(Debug, Clone)]
pub struct TokenPair<L> {
    pub token0: L,
    pub token1: L,
}

impl<L: TokenLedger> TokenPair<L> {
    pub fn new(token0: L, token1: L) -> Self {
        Self { token0, token1 }
    }

    pub fn get(&self, token: Token) -> &L {
        match token {
            Token::Token0 => &self.token0,
            Token::Token1 => &self.token1,
        }
    }

    pub fn get_mut(&mut self, token: Token) -> &mut L {
        match token {
            Token::Token0 => &mut self.token0,
            Token::Token1 => &mut self.token1,
        }
    }

    /// Balance of `holder` on both ledgers
    pub fn balances_of(&self, holder: &Address) -> (u128, u128) {
        (
            self.get(Token::Token0).balance_of(holder),
            self.get(Token::Token1).balance_of(holder),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_opposite() {
        assert_eq!(Token::Token0.opposite(), Token::Token1);
        assert_eq!(Token::Token1.opposite(), Token::Token0);
    }

    #[test]
    fn test_token_from_str() {
        assert_eq!("token0".parse::<Token>(), Ok(Token::Token0));
        assert_eq!("Token1".parse::<Token>(), Ok(Token::Token1));
        assert_eq!("1".parse::<Token>(), Ok(Token::Token1));
        assert!("token2".parse::<Token>().is_err());
    }

    #[test]
    fn test_token_serde_names() {
        let json = serde_json::to_string(&Token::Token1).unwrap();
        assert_eq!(json, "\"token1\"");
        let addr: Address = serde_json::from_str("\"alice\"").unwrap();
        assert_eq!(addr, Address::from("alice"));
    }
}
