//! Structured-note position model
//!
//! Off-chain reproduction of the structured-note contract's economics:
//! the leverage-cycle deposit loop and the deleverage withdraw loop over
//! a farmer position, computed against a snapshot of the AMM pool and
//! the yield-token exchange rate. The scenario harness uses these
//! functions to predict the exact on-chain result of a transaction
//! before submitting it.
//!
//! All functions take state by value and return new state: a failed
//! operation mutates nothing, so a multi-cycle deposit or withdraw is
//! atomic from the caller's point of view.

#![no_std]

pub mod decimal;
pub mod leverage;
pub mod market;
pub mod position;
pub mod withdraw;

pub use decimal::Decimal;
pub use leverage::{compute_deposit, raw_deposit, DepositOutcome};
pub use market::{MarketParams, PoolSnapshot};
pub use position::Position;
pub use withdraw::{compute_withdraw, raw_withdraw, RawWithdrawOutcome, WithdrawOutcome};

use swap_model::SwapError;

/// Error types for position operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteError {
    /// Overflow or a degenerate pool made a quote impossible. Fatal to
    /// the current operation; no partial state is applied.
    Arithmetic,
    /// A computed state breached the safe collateral ratio. Unreachable
    /// given correct clamping; surfacing it means a defect, not a
    /// recoverable condition.
    InvariantViolation,
    /// Inputs rejected before any computation: zero amounts, zero
    /// leverage, a target ratio below the safe minimum, or an unsafe
    /// raw withdraw.
    Precondition,
}

impl From<SwapError> for NoteError {
    fn from(_: SwapError) -> Self {
        NoteError::Arithmetic
    }
}
