//! Leverage-cycle deposit
//!
//! A deposit runs a fixed number of cycles. Each cycle converts the
//! stable on hand into yield-token collateral, borrows synthetic
//! against it up to the target ratio, and sells the borrowed synthetic
//! back into stable for the next cycle. The proceeds of the final swap
//! are deposited as collateral without further borrowing.

use swap_model::swap_return;

use crate::decimal::mul_div_floor;
use crate::{Decimal, MarketParams, NoteError, PoolSnapshot, Position};

/// Result of a leverage deposit. `pool` is the locally-updated reserve
/// snapshot after all simulated swaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositOutcome {
    pub position: Position,
    pub pool: PoolSnapshot,
    pub cycles: u32,
}

/// Run the deposit loop for exactly `leverage` cycles.
///
/// The farmer's raw coins are taxed on the way in; swap proceeds arrive
/// already net of the transfer tax on the pair's stable leg, so they
/// re-enter the next cycle untaxed. All cycles are one atomic
/// operation: any failure leaves the caller's position untouched.
pub fn compute_deposit(
    mut position: Position,
    params: &MarketParams,
    mut pool: PoolSnapshot,
    rate: Decimal,
    deposit_amount: u128,
    leverage: u32,
    aim_collateral_ratio: Decimal,
) -> Result<DepositOutcome, NoteError> {
    params.validate()?;
    if deposit_amount == 0 || leverage == 0 || rate.is_zero() {
        return Err(NoteError::Precondition);
    }
    if aim_collateral_ratio < params.safe_collateral_ratio {
        return Err(NoteError::Precondition);
    }
    position.aim_collateral_ratio = aim_collateral_ratio;

    let mut stable_in = deposit_amount;
    let mut entry_taxed = false;
    for _ in 0..leverage {
        let net_stable = if entry_taxed {
            stable_in
        } else {
            entry_taxed = true;
            params.tax.deduct_tax(stable_in)?
        };
        let collateral_delta = rate.mul_floor(net_stable)?;
        let loan_delta = mul_div_floor(
            collateral_delta,
            params.synthetic_price,
            aim_collateral_ratio,
        )?;
        let stable_out = swap_return(
            params.fee_bps,
            pool.synthetic_reserve,
            pool.stable_reserve,
            loan_delta,
            Some(&params.tax),
        )?;

        position.collateral = position
            .collateral
            .checked_add(collateral_delta)
            .ok_or(NoteError::Arithmetic)?;
        position.loan = position
            .loan
            .checked_add(loan_delta)
            .ok_or(NoteError::Arithmetic)?;
        pool.sell_synthetic(loan_delta, stable_out, &params.tax)?;
        stable_in = stable_out;
    }

    // Trailing redeposit of the last swap's proceeds
    position.collateral = position
        .collateral
        .checked_add(rate.mul_floor(stable_in)?)
        .ok_or(NoteError::Arithmetic)?;

    Ok(DepositOutcome {
        position,
        pool,
        cycles: leverage,
    })
}

/// Add stable directly to collateral: one conversion, no borrowing, no
/// leverage cycling.
pub fn raw_deposit(
    mut position: Position,
    params: &MarketParams,
    rate: Decimal,
    amount: u128,
) -> Result<Position, NoteError> {
    params.validate()?;
    if amount == 0 || rate.is_zero() {
        return Err(NoteError::Precondition);
    }
    let net = params.tax.deduct_tax(amount)?;
    position.collateral = position
        .collateral
        .checked_add(rate.mul_floor(net)?)
        .ok_or(NoteError::Arithmetic)?;
    Ok(position)
}
