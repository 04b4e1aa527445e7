//! Swap Model - Pure constant product math (x·y=k) with transfer tax
//!
//! This crate reproduces, off-chain, the amounts quoted by the AMM pair
//! contract and the native-coin transfer tax charged by the chain. The
//! scenario harness uses it to predict on-chain results to the unit.
//!
//! Every formula is one exact rational computation over `u128` followed
//! by a single floor (or ceil), matching the on-chain fixed-point
//! results without a big-decimal dependency.

#![no_std]

pub mod math;
pub mod tax;

pub use math::{offer_for_ask, swap_return};
pub use tax::TaxParams;

/// Basis points scale (10,000 bps = 100%)
pub const BPS_SCALE: u64 = 10_000;

/// Error types for swap and tax computations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapError {
    /// Invalid reserves (zero on either side)
    InvalidReserves,
    /// Commission at or above 100%
    InvalidFee,
    /// Tax rule with a zero denominator
    InvalidTax,
    /// Requested output cannot be served by the pool
    InsufficientLiquidity,
    /// Arithmetic overflow
    Overflow,
}
