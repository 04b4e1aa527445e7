//! Deleverage withdraw
//!
//! Withdrawing below the safe ratio requires shrinking the loan first,
//! and repaying the loan requires stable raised by withdrawing
//! collateral. The loop alternates the two steps, each iteration
//! withdrawing as much as the safe ratio currently allows and buying
//! back synthetic with the stable raised so far, until the position
//! lands on the target or no further progress is possible.

use swap_model::{offer_for_ask, swap_return};

use crate::decimal::mul_div_floor;
use crate::{Decimal, MarketParams, NoteError, PoolSnapshot, Position};

/// Iteration cap for the deleverage loop. Convergence is geometric, so
/// real inputs finish in a handful of iterations; the cap only bounds
/// pathological parameterizations.
pub const MAX_ITERATIONS: u32 = 64;

/// Result of a deleverage withdraw. `return_amount` is what actually
/// reaches the farmer, net of the final transfer tax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawOutcome {
    pub position: Position,
    pub pool: PoolSnapshot,
    pub return_amount: u128,
    pub iterations: u32,
}

/// Result of a direct collateral withdraw, no loan repayment involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawWithdrawOutcome {
    pub position: Position,
    pub return_amount: u128,
}

/// Unwind the position down to `aim_collateral` at `aim_collateral_ratio`.
///
/// Each iteration:
/// 1. withdraws `min(excess over target, excess over safe floor)`
///    collateral and redeems it into the stable accumulator, and
/// 2. if the loan still exceeds its target, buys synthetic with the
///    accumulator and repays. When the accumulator can buy more than
///    the remaining excess, the purchase is sized by an inverse quote
///    so the loan lands exactly on its target; otherwise the whole
///    accumulator is spent.
///
/// Whatever remains in the accumulator is returned to the farmer, taxed
/// once on the way out.
pub fn compute_withdraw(
    mut position: Position,
    params: &MarketParams,
    mut pool: PoolSnapshot,
    rate: Decimal,
    aim_collateral: u128,
    aim_collateral_ratio: Decimal,
) -> Result<WithdrawOutcome, NoteError> {
    params.validate()?;
    if rate.is_zero() || aim_collateral_ratio < params.safe_collateral_ratio {
        return Err(NoteError::Precondition);
    }
    if aim_collateral > position.collateral {
        return Err(NoteError::Precondition);
    }
    position.aim_collateral_ratio = aim_collateral_ratio;

    let aim_loan = mul_div_floor(aim_collateral, params.synthetic_price, aim_collateral_ratio)?;

    let mut stable_acc: u128 = 0;
    let mut iterations: u32 = 0;
    for _ in 0..MAX_ITERATIONS {
        if position.collateral <= aim_collateral && position.loan <= aim_loan {
            break;
        }
        iterations += 1;
        let mut progressed = false;

        // Step 1: free up collateral, bounded by the safe floor
        let to_target = position.collateral.saturating_sub(aim_collateral);
        let to_safe = position.withdrawable_to_safe(params)?;
        let withdraw_delta = to_target.min(to_safe);
        if withdraw_delta > 0 {
            position.collateral -= withdraw_delta;
            let redeemed = params.tax.deduct_tax(rate.mul_floor(withdraw_delta)?)?;
            stable_acc = stable_acc
                .checked_add(redeemed)
                .ok_or(NoteError::Arithmetic)?;
            progressed = true;
        }

        // Step 2: buy back synthetic and repay
        if position.loan > aim_loan && stable_acc > 0 {
            let excess_loan = position.loan - aim_loan;
            let net_all = params.tax.deduct_tax(stable_acc)?;
            let obtainable = swap_return(
                params.fee_bps,
                pool.stable_reserve,
                pool.synthetic_reserve,
                net_all,
                None,
            )?;
            if obtainable > 0 {
                let (net_offer, spent, repaid) = if obtainable <= excess_loan {
                    (net_all, stable_acc, obtainable)
                } else {
                    let offer = offer_for_ask(
                        params.fee_bps,
                        pool.stable_reserve,
                        pool.synthetic_reserve,
                        excess_loan,
                    )?;
                    let gross = params.tax.add_tax(offer)?;
                    if gross > stable_acc {
                        // Tax rounding pushed the sized purchase past the
                        // accumulator; fall back to spending all of it.
                        (net_all, stable_acc, obtainable)
                    } else {
                        let got = swap_return(
                            params.fee_bps,
                            pool.stable_reserve,
                            pool.synthetic_reserve,
                            offer,
                            None,
                        )?;
                        (offer, gross, got)
                    }
                };
                pool.buy_synthetic(net_offer, repaid)?;
                position.loan = position.loan.saturating_sub(repaid);
                stable_acc -= spent;
                progressed = true;
            }
        }

        if !progressed {
            // Pinned against the safe floor with nothing left to repay
            // with; stop rather than spin.
            break;
        }
    }

    if !position.is_safe(params)? {
        return Err(NoteError::InvariantViolation);
    }
    let return_amount = params.tax.deduct_tax(stable_acc)?;
    Ok(WithdrawOutcome {
        position,
        pool,
        return_amount,
        iterations,
    })
}

/// Withdraw collateral directly, without touching the loan. Rejected
/// outright if it would leave the position below the safe ratio.
pub fn raw_withdraw(
    mut position: Position,
    params: &MarketParams,
    rate: Decimal,
    amount: u128,
) -> Result<RawWithdrawOutcome, NoteError> {
    params.validate()?;
    if amount == 0 || rate.is_zero() {
        return Err(NoteError::Precondition);
    }
    if amount > position.withdrawable_to_safe(params)? {
        return Err(NoteError::Precondition);
    }
    position.collateral -= amount;
    let redeemed = params.tax.deduct_tax(rate.mul_floor(amount)?)?;
    let return_amount = params.tax.deduct_tax(redeemed)?;
    Ok(RawWithdrawOutcome {
        position,
        return_amount,
    })
}
