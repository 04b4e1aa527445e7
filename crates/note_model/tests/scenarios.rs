//! End-to-end position scenarios
//!
//! Data-driven runs of the deposit and withdraw loops against the
//! reference market deployment (1e8/1e8 pool, 30 bps commission, 0.1%
//! tax capped at 1e6, safe ratio 1.65, price 1). Expected values are
//! pinned to the on-chain results of the same transactions.

use note_model::{
    compute_deposit, compute_withdraw, Decimal, MarketParams, PoolSnapshot, Position,
};
use swap_model::TaxParams;

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

struct DepositCase {
    name: &'static str,
    amount: u128,
    leverage: u32,
    aim_ratio: &'static str,
    expect_loan: u128,
    expect_collateral: u128,
    expect_pool: PoolSnapshot,
}

#[test]
fn deposit_ladder_matches_chain() {
    let cases = [
        DepositCase {
            name: "leverage 1",
            amount: 10_000_000,
            leverage: 1,
            aim_ratio: "2",
            expect_loan: 4_995_004,
            expect_collateral: 14_728_370,
            expect_pool: PoolSnapshot {
                synthetic_reserve: 104_995_004,
                stable_reserve: 95_256_901,
            },
        },
        DepositCase {
            name: "leverage 2",
            amount: 10_000_000,
            leverage: 2,
            aim_ratio: "2",
            expect_loan: 7_364_184,
            expect_collateral: 16_821_981,
            expect_pool: PoolSnapshot {
                synthetic_reserve: 107_364_184,
                stable_reserve: 93_161_197,
            },
        },
        DepositCase {
            name: "leverage 3",
            amount: 10_000_000,
            leverage: 3,
            aim_ratio: "2",
            expect_loan: 8_410_989,
            expect_collateral: 17_717_940,
            expect_pool: PoolSnapshot {
                synthetic_reserve: 108_410_989,
                stable_reserve: 92_264_343,
            },
        },
    ];

    for case in cases {
        let out = compute_deposit(
            Position::new(Decimal::parse(case.aim_ratio).unwrap()),
            &reference_market(),
            fresh_pool(),
            Decimal::ONE,
            case.amount,
            case.leverage,
            Decimal::parse(case.aim_ratio).unwrap(),
        )
        .unwrap_or_else(|e| panic!("{}: {:?}", case.name, e));

        assert_eq!(out.position.loan, case.expect_loan, "{}: loan", case.name);
        assert_eq!(
            out.position.collateral, case.expect_collateral,
            "{}: collateral",
            case.name
        );
        assert_eq!(out.pool, case.expect_pool, "{}: pool", case.name);
        assert_eq!(out.cycles, case.leverage, "{}: cycles", case.name);
        assert!(
            out.position.is_safe(&reference_market()).unwrap(),
            "{}: safety",
            case.name
        );
    }
}

#[test]
fn deposit_then_partial_withdraw_round_trip() {
    let market = reference_market();
    let deposited = compute_deposit(
        Position::new(Decimal::parse("2").unwrap()),
        &market,
        fresh_pool(),
        Decimal::ONE,
        10_000_000,
        1,
        Decimal::parse("2").unwrap(),
    )
    .unwrap();

    let out = compute_withdraw(
        deposited.position,
        &market,
        deposited.pool,
        Decimal::ONE,
        12_487_510,
        Decimal::parse("2.5").unwrap(),
    )
    .unwrap();

    assert_eq!(out.iterations, 1);
    assert_eq!(out.position.collateral, 12_487_510);
    assert_eq!(out.position.loan, 4_995_004);
    assert_eq!(out.return_amount, 2_236_384);
}

#[test]
fn deep_deleverage_tracks_intermediate_states() {
    // Unwinding a leverage-3 position to half size forces three
    // withdraw-repay rounds; the iteration count and the final numbers
    // must both match the chain run.
    let market = reference_market();
    let deposited = compute_deposit(
        Position::new(Decimal::parse("2").unwrap()),
        &market,
        fresh_pool(),
        Decimal::ONE,
        10_000_000,
        3,
        Decimal::parse("2").unwrap(),
    )
    .unwrap();

    let out = compute_withdraw(
        deposited.position,
        &market,
        deposited.pool,
        Decimal::ONE,
        5_000_000,
        Decimal::parse("2").unwrap(),
    )
    .unwrap();

    assert_eq!(out.iterations, 3);
    assert_eq!(out.position.collateral, 5_000_000);
    assert_eq!(out.position.loan, 2_500_000);
    assert_eq!(out.return_amount, 7_355_076);
}

#[test]
fn close_out_leaves_empty_position() {
    let market = reference_market();
    let deposited = compute_deposit(
        Position::new(Decimal::parse("2").unwrap()),
        &market,
        fresh_pool(),
        Decimal::ONE,
        10_000_000,
        2,
        Decimal::parse("2").unwrap(),
    )
    .unwrap();

    let out = compute_withdraw(
        deposited.position,
        &market,
        deposited.pool,
        Decimal::ONE,
        0,
        Decimal::parse("2").unwrap(),
    )
    .unwrap();

    assert_eq!(out.position.collateral, 0);
    assert_eq!(out.position.loan, 0);
    assert!(out.return_amount > 0);
    // Round-trip costs: taxes, commission, and slippage eat into the
    // original 10,000,000.
    assert!(out.return_amount < 10_000_000);
}
