//! Data-driven scenario suite
//!
//! Each scenario sets up a fresh synthetic asset with seeded liquidity,
//! runs one position operation against the chain, and checks the
//! queried end state against the model crates' prediction. Expected
//! values are computed from pre-state queries, never hard-coded, so the
//! suite holds under any yield rate the market reports.

use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::{json, Value};

use note_model::{
    compute_deposit, compute_withdraw, raw_deposit, raw_withdraw, Position,
};

use crate::client::{extract_event_attr, ChainClient};
use crate::config::{Artifacts, NetworkConfig, STABLE_DENOM};
use crate::deploy;
use crate::market::MarketView;

#[derive(Debug, Clone, Copy)]
pub enum FollowUp {
    /// Leave the leveraged position as deposited
    None,
    /// Deleverage down to a collateral target at a new ratio
    Withdraw {
        aim_collateral: u128,
        aim_collateral_ratio: &'static str,
    },
    /// Add collateral directly, no borrowing
    RawDeposit { amount: u128 },
    /// Remove collateral directly, loan untouched
    RawWithdraw { amount: u128 },
}

pub struct Scenario {
    pub name: &'static str,
    pub deposit_amount: u128,
    pub leverage: u32,
    pub aim_collateral_ratio: &'static str,
    pub follow_up: FollowUp,
}

/// The reference scenario table: every operation the note contract
/// exposes, at the leverage depths that exercise one, two, and many
/// deleverage iterations.
pub fn scenario_table() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "open position, leverage 1",
            deposit_amount: 10_000_000,
            leverage: 1,
            aim_collateral_ratio: "2",
            follow_up: FollowUp::None,
        },
        Scenario {
            name: "open position, leverage 2",
            deposit_amount: 10_000_000,
            leverage: 2,
            aim_collateral_ratio: "2",
            follow_up: FollowUp::None,
        },
        Scenario {
            name: "raw deposit",
            deposit_amount: 10_000_000,
            leverage: 1,
            aim_collateral_ratio: "2",
            follow_up: FollowUp::RawDeposit { amount: 5_000_000 },
        },
        Scenario {
            name: "raw withdraw",
            deposit_amount: 10_000_000,
            leverage: 1,
            aim_collateral_ratio: "2",
            follow_up: FollowUp::RawWithdraw { amount: 6_000_000 },
        },
        Scenario {
            name: "withdraw without loan repayment",
            deposit_amount: 10_000_000,
            leverage: 1,
            aim_collateral_ratio: "2",
            follow_up: FollowUp::Withdraw {
                aim_collateral: 12_487_510,
                aim_collateral_ratio: "2.5",
            },
        },
        Scenario {
            name: "withdraw with single loan repayment",
            deposit_amount: 10_000_000,
            leverage: 1,
            aim_collateral_ratio: "2",
            follow_up: FollowUp::Withdraw {
                aim_collateral: 12_487_510,
                aim_collateral_ratio: "2.6",
            },
        },
        Scenario {
            name: "withdraw with multiple loan repayments",
            deposit_amount: 10_000_000,
            leverage: 3,
            aim_collateral_ratio: "2",
            follow_up: FollowUp::Withdraw {
                aim_collateral: 5_000_000,
                aim_collateral_ratio: "2",
            },
        },
    ]
}

pub fn list_scenarios() {
    println!("{}", "Available scenarios:".bright_green().bold());
    for scenario in scenario_table() {
        println!("  {}", scenario.name);
    }
}

pub fn run_scenarios(
    config: &NetworkConfig,
    client: &dyn ChainClient,
    artifacts: &mut Artifacts,
    farmer: &str,
    filter: Option<&str>,
) -> Result<()> {
    println!("{}", "=== Running Scenario Suite ===".bright_yellow().bold());
    println!("{}", "Model predictions vs on-chain state\n".dimmed());

    let mut passed = 0;
    let mut failed = 0;

    for (index, scenario) in scenario_table().into_iter().enumerate() {
        if let Some(name) = filter {
            if !scenario.name.contains(name) {
                continue;
            }
        }
        match run_scenario(config, client, artifacts, farmer, &scenario, index) {
            Ok(_) => {
                println!("{} {}", "✓".bright_green(), scenario.name);
                passed += 1;
            }
            Err(e) => {
                println!("{} {}: {:#}", "✗".bright_red(), scenario.name, e);
                failed += 1;
            }
        }
    }

    println!(
        "\n{} {} passed, {} failed",
        "Results:".bright_cyan(),
        passed.to_string().bright_green(),
        failed.to_string().bright_red()
    );
    if failed > 0 {
        anyhow::bail!("{} scenarios failed", failed);
    }
    Ok(())
}

fn run_scenario(
    config: &NetworkConfig,
    client: &dyn ChainClient,
    artifacts: &mut Artifacts,
    farmer: &str,
    scenario: &Scenario,
    index: usize,
) -> Result<()> {
    // Fresh synthetic per scenario so pool state never leaks between runs
    let symbol = format!("SCN{}", index);
    deploy::whitelist_synthetic(config, client, artifacts, &symbol, "1", "1.5")
        .context("Scenario setup failed")?;
    let entry = artifacts.synthetic(&symbol)?.clone();
    let params = artifacts.profile().to_params()?;

    let view = MarketView::new(client, artifacts);
    let rate = view.yield_rate()?;
    let pool = view.pool_reserves(&symbol)?;
    let aim_ratio = parse_ratio(scenario.aim_collateral_ratio)?;

    // Predict, then execute the leveraged deposit
    let expected = compute_deposit(
        Position::new(aim_ratio),
        &params,
        pool,
        rate,
        scenario.deposit_amount,
        scenario.leverage,
        aim_ratio,
    )
    .map_err(|e| anyhow::anyhow!("deposit model error: {:?}", e))?;

    client
        .execute(
            &artifacts.structured_note,
            &json!({
                "deposit": {
                    "masset_token": entry.token,
                    "leverage": scenario.leverage,
                    "aim_collateral_ratio": scenario.aim_collateral_ratio,
                }
            }),
            Some(&format!("{}{}", scenario.deposit_amount, STABLE_DENOM)),
        )
        .context("Deposit transaction failed")?;

    let actual = view
        .position(farmer, &symbol)?
        .context("No position after deposit")?;
    check_position("after deposit", &expected.position, &actual)?;

    let position = actual;
    let follow_up_expected = match scenario.follow_up {
        FollowUp::None => None,
        FollowUp::Withdraw {
            aim_collateral,
            aim_collateral_ratio,
        } => {
            let pool = view.pool_reserves(&symbol)?;
            let rate = view.yield_rate()?;
            let outcome = compute_withdraw(
                position,
                &params,
                pool,
                rate,
                aim_collateral,
                parse_ratio(aim_collateral_ratio)?,
            )
            .map_err(|e| anyhow::anyhow!("withdraw model error: {:?}", e))?;
            let result = client
                .execute(
                    &artifacts.structured_note,
                    &json!({
                        "withdraw": {
                            "masset_token": entry.token,
                            "aim_collateral": aim_collateral.to_string(),
                            "aim_collateral_ratio": aim_collateral_ratio,
                        }
                    }),
                    None,
                )
                .context("Withdraw transaction failed")?;
            check_return_amount("withdraw", &result, outcome.return_amount)?;
            Some(outcome.position)
        }
        FollowUp::RawDeposit { amount } => {
            let rate = view.yield_rate()?;
            let outcome = raw_deposit(position, &params, rate, amount)
                .map_err(|e| anyhow::anyhow!("raw deposit model error: {:?}", e))?;
            client
                .execute(
                    &artifacts.structured_note,
                    &json!({ "raw_deposit": { "masset_token": entry.token } }),
                    Some(&format!("{}{}", amount, STABLE_DENOM)),
                )
                .context("Raw deposit transaction failed")?;
            Some(outcome)
        }
        FollowUp::RawWithdraw { amount } => {
            let rate = view.yield_rate()?;
            let outcome = raw_withdraw(position, &params, rate, amount)
                .map_err(|e| anyhow::anyhow!("raw withdraw model error: {:?}", e))?;
            let result = client
                .execute(
                    &artifacts.structured_note,
                    &json!({
                        "raw_withdraw": {
                            "masset_token": entry.token,
                            "amount": amount.to_string(),
                        }
                    }),
                    None,
                )
                .context("Raw withdraw transaction failed")?;
            check_return_amount("raw withdraw", &result, outcome.return_amount)?;
            Some(outcome.position)
        }
    };

    if let Some(expected) = follow_up_expected {
        let settled = view
            .position(farmer, &symbol)?
            .context("No position after follow-up operation")?;
        check_position("after follow-up", &expected, &settled)?;
    }
    Ok(())
}

/// Withdraws also report what was paid back to the farmer; the event
/// attribute must match the model's prediction to the unit.
fn check_return_amount(stage: &str, tx: &Value, expected: u128) -> Result<()> {
    let reported = extract_event_attr(tx, "wasm", "return_amount")
        .with_context(|| format!("{}: transaction events carry no return_amount", stage))?;
    let actual: u128 = reported
        .parse()
        .with_context(|| format!("{}: bad return_amount {}", stage, reported))?;
    if actual != expected {
        anyhow::bail!(
            "{}: return_amount mismatch, expected {} got {}",
            stage,
            expected,
            actual
        );
    }
    Ok(())
}

fn check_position(stage: &str, expected: &Position, actual: &Position) -> Result<()> {
    if expected.loan != actual.loan {
        anyhow::bail!(
            "{}: loan mismatch, expected {} got {}",
            stage,
            expected.loan,
            actual.loan
        );
    }
    if expected.collateral != actual.collateral {
        anyhow::bail!(
            "{}: collateral mismatch, expected {} got {}",
            stage,
            expected.collateral,
            actual.collateral
        );
    }
    Ok(())
}

fn parse_ratio(s: &str) -> Result<note_model::Decimal> {
    note_model::Decimal::parse(s).map_err(|e| anyhow::anyhow!("bad ratio {}: {:?}", s, e))
}
