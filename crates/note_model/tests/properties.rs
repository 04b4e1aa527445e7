//! Property tests over the position model
//!
//! Randomized checks of the invariants the fixed scenarios rely on:
//! tax round-trip drift, swap quote consistency, and safety of every
//! state a deposit or withdraw can produce.

use note_model::{
    compute_deposit, compute_withdraw, raw_withdraw, Decimal, MarketParams, NoteError,
    PoolSnapshot, Position,
};
use proptest::prelude::*;
use swap_model::{offer_for_ask, swap_return, TaxParams};

fn reference_market() -> MarketParams {
    MarketParams {
        fee_bps: 30,
        tax: TaxParams::new(1, 1000, 1_000_000),
        safe_collateral_ratio: Decimal::parse("1.65").unwrap(),
        synthetic_price: Decimal::ONE,
    }
}

fn fresh_pool() -> PoolSnapshot {
    PoolSnapshot {
        synthetic_reserve: 100_000_000,
        stable_reserve: 100_000_000,
    }
}

proptest! {
    /// Below the cap, add then deduct loses at most one unit to
    /// rounding and never gains.
    #[test]
    fn tax_round_trip_drift(amount in 1u128..900_000_000u128) {
        let tax = TaxParams::new(1, 1000, 1_000_000);
        let gross = tax.add_tax(amount).unwrap();
        let back = tax.deduct_tax(gross).unwrap();
        prop_assert!(back <= amount);
        prop_assert!(amount - back <= 1);
    }

    /// Swap output grows with input and never exceeds the ask reserve.
    #[test]
    fn swap_is_monotone_and_bounded(
        a in 1u128..10_000_000u128,
        b in 1u128..10_000_000u128,
    ) {
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let pool = fresh_pool();
        let out_lo = swap_return(30, pool.synthetic_reserve, pool.stable_reserve, lo, None).unwrap();
        let out_hi = swap_return(30, pool.synthetic_reserve, pool.stable_reserve, hi, None).unwrap();
        prop_assert!(out_lo <= out_hi);
        prop_assert!(out_hi < pool.stable_reserve);
    }

    /// The inverse quote is exact and minimal: its output covers the
    /// ask, and one unit less does not.
    #[test]
    fn inverse_quote_is_minimal(ask in 1u128..5_000_000u128) {
        let pool = fresh_pool();
        let offer = offer_for_ask(30, pool.stable_reserve, pool.synthetic_reserve, ask).unwrap();
        let got = swap_return(30, pool.stable_reserve, pool.synthetic_reserve, offer, None).unwrap();
        prop_assert!(got >= ask);
        if offer > 1 {
            let less = swap_return(30, pool.stable_reserve, pool.synthetic_reserve, offer - 1, None).unwrap();
            prop_assert!(less < ask);
        }
    }

    /// Every successful deposit ends at or above the safe ratio, with
    /// the pool's synthetic side grown by exactly the loan taken.
    #[test]
    fn deposit_always_ends_safe(
        amount in 100_000u128..50_000_000u128,
        leverage in 1u32..6u32,
    ) {
        let market = reference_market();
        let out = compute_deposit(
            Position::new(Decimal::parse("2").unwrap()),
            &market,
            fresh_pool(),
            Decimal::ONE,
            amount,
            leverage,
            Decimal::parse("2").unwrap(),
        ).unwrap();
        prop_assert!(out.position.is_safe(&market).unwrap());
        prop_assert_eq!(
            out.pool.synthetic_reserve,
            fresh_pool().synthetic_reserve + out.position.loan
        );
    }

    /// A withdraw from a fresh leveraged position never ends unsafe,
    /// never overshoots the collateral target, and the payout is
    /// bounded by the collateral given up.
    #[test]
    fn withdraw_respects_targets(
        amount in 1_000_000u128..30_000_000u128,
        leverage in 1u32..4u32,
        aim_pct in 0u128..100u128,
    ) {
        let market = reference_market();
        let deposited = compute_deposit(
            Position::new(Decimal::parse("2").unwrap()),
            &market,
            fresh_pool(),
            Decimal::ONE,
            amount,
            leverage,
            Decimal::parse("2").unwrap(),
        ).unwrap();

        let aim_collateral = deposited.position.collateral * aim_pct / 100;
        let out = compute_withdraw(
            deposited.position,
            &market,
            deposited.pool,
            Decimal::ONE,
            aim_collateral,
            Decimal::parse("2").unwrap(),
        ).unwrap();

        prop_assert!(out.position.is_safe(&market).unwrap());
        prop_assert!(out.position.collateral >= aim_collateral);
        let given_up = deposited.position.collateral - out.position.collateral;
        prop_assert!(out.return_amount <= given_up);
    }

    /// Raw withdraw succeeds exactly up to the safe bound and is
    /// rejected past it, without mutating anything.
    #[test]
    fn raw_withdraw_honors_safe_bound(
        amount in 1_000_000u128..30_000_000u128,
        extra in 1u128..1_000_000u128,
    ) {
        let market = reference_market();
        let deposited = compute_deposit(
            Position::new(Decimal::parse("2").unwrap()),
            &market,
            fresh_pool(),
            Decimal::ONE,
            amount,
            2,
            Decimal::parse("2").unwrap(),
        ).unwrap();

        let bound = deposited.position.withdrawable_to_safe(&market).unwrap();
        if bound > 0 {
            let ok = raw_withdraw(deposited.position, &market, Decimal::ONE, bound).unwrap();
            prop_assert!(ok.position.is_safe(&market).unwrap());
        }
        prop_assert_eq!(
            raw_withdraw(deposited.position, &market, Decimal::ONE, bound + extra),
            Err(NoteError::Precondition)
        );
    }
}
