//! Constant sum AMM math - re-exported from `csamm_model`
//!
//! The engine uses these functions directly; nothing here is re-derived.

pub use csamm_model::{
    self, cap_with_fixed_ratio, gcd, min, normalize_amount, pro_rata, quote_trade, Direction,
    ModelError, RATE_SCALE,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helpers_reachable_from_engine() {
        assert_eq!(min(3, 9), 3);
        assert_eq!(gcd(1100, 2200), 1100);
        assert_eq!(cap_with_fixed_ratio(1000, 2000, 5000, 5000), (2500, 5000));
        assert_eq!(normalize_amount(10, 1000, 5000), Ok(510));
        assert_eq!(RATE_SCALE, 10_000);
    }

    #[test]
    fn test_round_trip_never_gains() {
        // token0 -> token1 -> token0 at an awkward rate loses at most rounding dust
        let rate = 3333;
        let out1 = quote_trade(Direction::ZeroForOne, 1000, rate, u128::MAX).unwrap();
        let back = quote_trade(Direction::OneForZero, out1, rate, u128::MAX).unwrap();
        assert!(back <= 1000);
        assert!(1000 - back <= 1);
    }
}
