//! Farmer position state

use crate::decimal::{mul_div_ceil, mul_div_floor};
use crate::{Decimal, MarketParams, NoteError};

/// Leveraged position of one farmer in one synthetic asset. The
/// (farmer, asset) key is owned by the harness layer; the model only
/// carries the numbers.
///
/// Created on first deposit, mutated by deposit/withdraw, never
/// deleted: zero loan with zero collateral is a valid terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Outstanding debt in synthetic-asset smallest units
    pub loan: u128,
    /// Deposited collateral in yield-token smallest units
    pub collateral: u128,
    /// Desired collateral-to-loan value ratio, at least the safe
    /// minimum
    pub aim_collateral_ratio: Decimal,
}

impl Position {
    pub fn new(aim_collateral_ratio: Decimal) -> Self {
        Self {
            loan: 0,
            collateral: 0,
            aim_collateral_ratio,
        }
    }

    /// Smallest collateral that keeps the position at or above the safe
    /// ratio. Rounds up so rounding can never understate the floor.
    pub fn min_safe_collateral(&self, params: &MarketParams) -> Result<u128, NoteError> {
        mul_div_ceil(
            self.loan,
            params.safe_collateral_ratio,
            params.synthetic_price,
        )
    }

    /// Collateral available before the safe ratio binds.
    pub fn withdrawable_to_safe(&self, params: &MarketParams) -> Result<u128, NoteError> {
        Ok(self
            .collateral
            .saturating_sub(self.min_safe_collateral(params)?))
    }

    /// A position with no loan is always safe.
    pub fn is_safe(&self, params: &MarketParams) -> Result<bool, NoteError> {
        if self.loan == 0 {
            return Ok(true);
        }
        Ok(self.collateral >= self.min_safe_collateral(params)?)
    }

    /// Current collateral ratio, `None` when there is no loan.
    pub fn collateral_ratio(&self, params: &MarketParams) -> Result<Option<Decimal>, NoteError> {
        if self.loan == 0 {
            return Ok(None);
        }
        let raw = mul_div_floor(self.collateral, params.synthetic_price, Decimal::ONE)?
            .checked_mul(crate::decimal::DECIMAL_FRACTION)
            .ok_or(NoteError::Arithmetic)?
            / self.loan;
        Ok(Some(Decimal::raw(raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swap_model::TaxParams;

    fn params() -> MarketParams {
        MarketParams {
            fee_bps: 30,
            tax: TaxParams::new(1, 1000, 1_000_000),
            safe_collateral_ratio: Decimal::from_ratio(165, 100).unwrap(),
            synthetic_price: Decimal::ONE,
        }
    }

    #[test]
    fn safe_floor_rounds_up() {
        let pos = Position {
            loan: 4_995_004,
            collateral: 14_728_370,
            aim_collateral_ratio: Decimal::from_ratio(2, 1).unwrap(),
        };
        // 4,995,004 * 1.65 = 8,241,756.6
        assert_eq!(pos.min_safe_collateral(&params()).unwrap(), 8_241_757);
        assert_eq!(pos.withdrawable_to_safe(&params()).unwrap(), 6_486_613);
        assert!(pos.is_safe(&params()).unwrap());
    }

    #[test]
    fn zero_loan_is_always_safe() {
        let pos = Position::new(Decimal::from_ratio(2, 1).unwrap());
        assert!(pos.is_safe(&params()).unwrap());
        assert_eq!(pos.collateral_ratio(&params()).unwrap(), None);
    }

    #[test]
    fn collateral_ratio_matches_fixture() {
        let pos = Position {
            loan: 4_995_004,
            collateral: 14_728_370,
            aim_collateral_ratio: Decimal::from_ratio(2, 1).unwrap(),
        };
        let ratio = pos.collateral_ratio(&params()).unwrap().unwrap();
        // 14,728,370 / 4,995,004 = 2.94862...
        assert!(ratio > Decimal::from_ratio(294, 100).unwrap());
        assert!(ratio < Decimal::from_ratio(295, 100).unwrap());
    }
}
