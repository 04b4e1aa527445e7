//! Market parameters and the local pool snapshot

use swap_model::{TaxParams, BPS_SCALE};

use crate::{Decimal, NoteError};

/// Deployed-market parameterization, passed explicitly to every
/// operation so the model matches whatever the chain is running.
#[derive(Debug, Clone, Copy)]
pub struct MarketParams {
    /// Pool commission in basis points (reference deployment: 30)
    pub fee_bps: u64,
    /// Stable-denomination transfer tax rule
    pub tax: TaxParams,
    /// Floor collateral ratio below which withdrawal stops
    pub safe_collateral_ratio: Decimal,
    /// Synthetic-asset price in stable units. Reference fixtures only
    /// exercise 1.0; non-unit prices follow the documented formulas but
    /// are unverified against the on-chain mint.
    pub synthetic_price: Decimal,
}

impl MarketParams {
    pub fn validate(&self) -> Result<(), NoteError> {
        if self.fee_bps >= BPS_SCALE
            || self.tax.rate_denom == 0
            || self.tax.rate_num > self.tax.rate_denom
            || self.safe_collateral_ratio < Decimal::ONE
            || self.synthetic_price.is_zero()
        {
            return Err(NoteError::Precondition);
        }
        Ok(())
    }
}

/// Local view of the AMM pair reserves for one synthetic-stable pair.
///
/// Read once at the start of an operation and updated locally after
/// each simulated swap; a multi-cycle operation never re-reads the
/// chain mid-flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub synthetic_reserve: u128,
    pub stable_reserve: u128,
}

impl PoolSnapshot {
    /// Apply a synthetic -> stable swap: the pool gains the synthetic
    /// offered and loses the gross stable sent out (net output plus the
    /// transfer tax the pair pays on top).
    pub fn sell_synthetic(
        &mut self,
        offer_synthetic: u128,
        net_stable_out: u128,
        tax: &TaxParams,
    ) -> Result<(), NoteError> {
        let gross_out = tax.add_tax(net_stable_out)?;
        self.synthetic_reserve = self
            .synthetic_reserve
            .checked_add(offer_synthetic)
            .ok_or(NoteError::Arithmetic)?;
        self.stable_reserve = self
            .stable_reserve
            .checked_sub(gross_out)
            .ok_or(NoteError::Arithmetic)?;
        Ok(())
    }

    /// Apply a stable -> synthetic swap: the pool receives the net
    /// stable (after transfer tax on the way in) and loses the
    /// synthetic output.
    pub fn buy_synthetic(
        &mut self,
        net_stable_in: u128,
        synthetic_out: u128,
    ) -> Result<(), NoteError> {
        self.stable_reserve = self
            .stable_reserve
            .checked_add(net_stable_in)
            .ok_or(NoteError::Arithmetic)?;
        self.synthetic_reserve = self
            .synthetic_reserve
            .checked_sub(synthetic_out)
            .ok_or(NoteError::Arithmetic)?;
        Ok(())
    }
}
