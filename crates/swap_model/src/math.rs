//! Constant product swap quotes, net of pool commission and transfer tax

use crate::{SwapError, TaxParams, BPS_SCALE};

/// Quote the output of a constant-product swap.
///
/// With `k = offer_reserve · ask_reserve`:
/// - `gross = ask_reserve - k / (offer_reserve + offer_amount)`
/// - `out   = floor(gross - gross · fee)`
///
/// which is computed as the single exact rational
/// `ask · x · (BPS - fee) / ((offer + x) · BPS)` floored once.
///
/// When the ask asset is the stable denomination the chain taxes the
/// transfer out of the pair; pass the tax rule as `stable_tax` in that
/// case. Token-side outputs are untaxed (`None`).
///
/// Reserves are a snapshot: the caller updates its local view when
/// chaining swaps.
pub fn swap_return(
    fee_bps: u64,
    offer_reserve: u128,
    ask_reserve: u128,
    offer_amount: u128,
    stable_tax: Option<&TaxParams>,
) -> Result<u128, SwapError> {
    if offer_reserve == 0 || ask_reserve == 0 {
        return Err(SwapError::InvalidReserves);
    }
    if fee_bps >= BPS_SCALE {
        return Err(SwapError::InvalidFee);
    }
    if offer_amount == 0 {
        return Ok(0);
    }

    let fee_factor = (BPS_SCALE - fee_bps) as u128;
    let num = ask_reserve
        .checked_mul(offer_amount)
        .and_then(|v| v.checked_mul(fee_factor))
        .ok_or(SwapError::Overflow)?;
    let den = offer_reserve
        .checked_add(offer_amount)
        .and_then(|v| v.checked_mul(BPS_SCALE as u128))
        .ok_or(SwapError::Overflow)?;

    let out = num / den;

    match stable_tax {
        Some(tax) => tax.deduct_tax(out),
        None => Ok(out),
    }
}

/// Inverse quote: the minimal offer amount whose pre-tax `swap_return`
/// reaches `ask_amount`.
///
/// Used when repaying debt through the pool: the algorithm wants an
/// exact synthetic output and must size the stable input for it.
pub fn offer_for_ask(
    fee_bps: u64,
    offer_reserve: u128,
    ask_reserve: u128,
    ask_amount: u128,
) -> Result<u128, SwapError> {
    if offer_reserve == 0 || ask_reserve == 0 {
        return Err(SwapError::InvalidReserves);
    }
    if fee_bps >= BPS_SCALE {
        return Err(SwapError::InvalidFee);
    }
    if ask_amount == 0 {
        return Ok(0);
    }

    // Gross output needed before commission: ceil(ask · BPS / (BPS - fee))
    let fee_factor = (BPS_SCALE - fee_bps) as u128;
    let gross = ask_amount
        .checked_mul(BPS_SCALE as u128)
        .ok_or(SwapError::Overflow)?
        .div_ceil(fee_factor);
    if gross >= ask_reserve {
        return Err(SwapError::InsufficientLiquidity);
    }

    // First-order estimate from gross = ask · n / (offer + n), then
    // settle the rounding by stepping to the exact minimum.
    let mut offer = gross
        .checked_mul(offer_reserve)
        .ok_or(SwapError::Overflow)?
        .div_ceil(ask_reserve - gross);

    while swap_return(fee_bps, offer_reserve, ask_reserve, offer, None)? < ask_amount {
        offer = offer.checked_add(1).ok_or(SwapError::Overflow)?;
    }
    while offer > 0 && swap_return(fee_bps, offer_reserve, ask_reserve, offer - 1, None)? >= ask_amount {
        offer -= 1;
    }

    Ok(offer)
}
