//! Contract graph deployment
//!
//! Uploads and instantiates the full stack in dependency order: token
//! code, AMM factory and pair codes, the lending market with its yield
//! token, the oracle hub and collateral oracle, the synthetic mint, and
//! finally the structured note wired to all of them. Addresses are
//! persisted to the artifacts file for the other commands.

use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::{json, Value};
use std::path::Path;

use crate::client::{extract_event_attr, format_addr, ChainClient};
use crate::config::{Artifacts, MarketProfile, NetworkConfig, SyntheticEntry, STABLE_DENOM};

const TOKEN_WASM: &str = "artifacts/cw20_base.wasm";
const FACTORY_WASM: &str = "artifacts/amm_factory.wasm";
const PAIR_WASM: &str = "artifacts/amm_pair.wasm";
const MARKET_WASM: &str = "artifacts/lending_market.wasm";
const ORACLE_HUB_WASM: &str = "artifacts/oracle_hub.wasm";
const ORACLE_PROXY_WASM: &str = "artifacts/oracle_proxy.wasm";
const COLLATERAL_ORACLE_WASM: &str = "artifacts/collateral_oracle.wasm";
const MINT_WASM: &str = "artifacts/synthetic_mint.wasm";
const NOTE_WASM: &str = "artifacts/structured_note.wasm";

/// Liquidity seeded into every fresh pair: 1e8 on each side.
pub const POOL_SIDE: u128 = 100_000_000;

pub fn deploy_all(config: &NetworkConfig, client: &dyn ChainClient) -> Result<Artifacts> {
    println!("{}", "=== Contract Deployment ===".bright_green().bold());
    println!("{} {}", "Network:".bright_cyan(), config.network);
    println!("{} {}\n", "Node:".bright_cyan(), config.node_url);

    println!("{}", "Uploading token and AMM codes...".bright_yellow());
    let token_code_id = store(client, TOKEN_WASM)?;
    let pair_code_id = store(client, PAIR_WASM)?;
    let factory_code_id = store(client, FACTORY_WASM)?;

    let factory = client
        .instantiate(
            factory_code_id,
            "amm_factory",
            &json!({
                "pair_code_id": pair_code_id,
                "token_code_id": token_code_id,
            }),
            None,
        )
        .context("Failed to instantiate AMM factory")?;
    println!("{} factory {}", "  └─".dimmed(), format_addr(&factory));

    println!("\n{}", "Deploying lending market...".bright_yellow());
    let market_code_id = store(client, MARKET_WASM)?;
    let market = client
        .instantiate(
            market_code_id,
            "lending_market",
            &json!({
                "stable_denom": STABLE_DENOM,
                "yield_token_code_id": token_code_id,
            }),
            // The market seeds its yield token with an initial deposit
            Some(&format!("1000000{}", STABLE_DENOM)),
        )
        .context("Failed to instantiate lending market")?;
    let market_config = client
        .query(&market, &json!({ "config": {} }))
        .context("Failed to query lending market config")?;
    let yield_token = string_field(&market_config, "/yield_token")
        .context("Lending market config has no yield_token")?;
    println!("{} market {}", "  ├─".dimmed(), format_addr(&market));
    println!("{} yield token {}", "  └─".dimmed(), format_addr(&yield_token));

    println!("\n{}", "Deploying oracle stack and mint...".bright_yellow());
    let oracle_hub_code_id = store(client, ORACLE_HUB_WASM)?;
    let oracle_hub = client
        .instantiate(oracle_hub_code_id, "oracle_hub", &json!({}), None)
        .context("Failed to instantiate oracle hub")?;

    let collateral_oracle_code_id = store(client, COLLATERAL_ORACLE_WASM)?;
    let collateral_oracle = client
        .instantiate(
            collateral_oracle_code_id,
            "collateral_oracle",
            &json!({ "oracle_hub": oracle_hub }),
            None,
        )
        .context("Failed to instantiate collateral oracle")?;

    let mint_code_id = store(client, MINT_WASM)?;
    let mint = client
        .instantiate(
            mint_code_id,
            "synthetic_mint",
            &json!({
                "oracle_hub": oracle_hub,
                "collateral_oracle": collateral_oracle,
                "token_code_id": token_code_id,
                "stable_denom": STABLE_DENOM,
            }),
            None,
        )
        .context("Failed to instantiate synthetic mint")?;

    // The yield token earns interest while posted as mint collateral
    client
        .execute(
            &collateral_oracle,
            &json!({
                "register_collateral": {
                    "collateral": yield_token,
                    "source": { "lending_market": { "market": market } },
                }
            }),
            None,
        )
        .context("Failed to register yield token as collateral")?;

    println!("{} oracle hub {}", "  ├─".dimmed(), format_addr(&oracle_hub));
    println!(
        "{} collateral oracle {}",
        "  ├─".dimmed(),
        format_addr(&collateral_oracle)
    );
    println!("{} mint {}", "  └─".dimmed(), format_addr(&mint));

    println!("\n{}", "Deploying structured note...".bright_yellow());
    let note_code_id = store(client, NOTE_WASM)?;
    let structured_note = client
        .instantiate(
            note_code_id,
            "structured_note",
            &json!({
                "mint": mint,
                "market": market,
                "yield_token": yield_token,
                "factory": factory,
                "stable_denom": STABLE_DENOM,
            }),
            None,
        )
        .context("Failed to instantiate structured note")?;
    println!("{} note {}", "  └─".dimmed(), format_addr(&structured_note));

    let artifacts = Artifacts {
        token_code_id,
        pair_code_id,
        factory,
        market,
        yield_token,
        oracle_hub,
        collateral_oracle,
        mint,
        structured_note,
        market_profile: Some(MarketProfile::default()),
        synthetics: Default::default(),
    };
    artifacts.save(&config.artifacts_path)?;
    println!(
        "\n{} {}",
        "Artifacts written to".bright_green(),
        config.artifacts_path.display()
    );
    println!("{}", "=== Deployment Complete ===".bright_green().bold());

    Ok(artifacts)
}

/// Whitelist one synthetic asset: its own oracle proxy with a fed
/// price, registration on the mint, a fresh AMM pair, and seeded
/// liquidity minted against stable collateral.
pub fn whitelist_synthetic(
    config: &NetworkConfig,
    client: &dyn ChainClient,
    artifacts: &mut Artifacts,
    symbol: &str,
    price: &str,
    min_collateral_ratio: &str,
) -> Result<SyntheticEntry> {
    println!(
        "{}",
        format!("=== Whitelisting synthetic {} ===", symbol)
            .bright_green()
            .bold()
    );

    let proxy_code_id = store(client, ORACLE_PROXY_WASM)?;
    let oracle_proxy = client
        .instantiate(
            proxy_code_id,
            &format!("oracle_proxy_{}", symbol),
            &json!({}),
            None,
        )
        .context("Failed to instantiate oracle proxy")?;
    client
        .execute(
            &artifacts.oracle_hub,
            &json!({ "register_proxy": { "proxy": oracle_proxy } }),
            None,
        )
        .context("Failed to register oracle proxy")?;
    client
        .execute(
            &oracle_proxy,
            &json!({ "feed_price": { "symbol": symbol, "rate": price } }),
            None,
        )
        .context("Failed to feed initial price")?;

    let whitelist_result = client
        .execute(
            &artifacts.mint,
            &json!({
                "whitelist": {
                    "symbol": symbol,
                    "oracle_proxy": oracle_proxy,
                    "min_collateral_ratio": min_collateral_ratio,
                }
            }),
            None,
        )
        .context("Failed to whitelist synthetic on mint")?;
    let token = extract_event_attr(&whitelist_result, "wasm", "asset_token")
        .context("Whitelist produced no asset_token")?;

    let pair_result = client
        .execute(
            &artifacts.factory,
            &json!({
                "create_pair": {
                    "asset_infos": [
                        { "token": { "contract_addr": token } },
                        { "native_token": { "denom": STABLE_DENOM } },
                    ]
                }
            }),
            None,
        )
        .context("Failed to create AMM pair")?;
    let pair = extract_event_attr(&pair_result, "wasm", "pair_contract_addr")
        .context("Pair creation produced no address")?;

    seed_liquidity(client, artifacts, &token, &pair)?;

    let entry = SyntheticEntry {
        token,
        pair,
        oracle_proxy,
    };
    println!(
        "{} token {} pair {}",
        "  └─".dimmed(),
        format_addr(&entry.token),
        format_addr(&entry.pair)
    );
    artifacts.synthetics.insert(symbol.to_string(), entry.clone());
    artifacts.save(&config.artifacts_path)?;
    Ok(entry)
}

/// Mint enough synthetic against stable collateral at ratio 2 to seed
/// the pair with `POOL_SIDE` on each side.
fn seed_liquidity(
    client: &dyn ChainClient,
    artifacts: &Artifacts,
    token: &str,
    pair: &str,
) -> Result<()> {
    let stable_collateral = POOL_SIDE * 2;
    client
        .execute(
            &artifacts.mint,
            &json!({
                "open_position": {
                    "asset_token": token,
                    "collateral_ratio": "2",
                }
            }),
            Some(&format!("{}{}", stable_collateral, STABLE_DENOM)),
        )
        .context("Failed to mint synthetic for liquidity")?;

    client
        .execute(
            token,
            &json!({
                "increase_allowance": {
                    "spender": pair,
                    "amount": POOL_SIDE.to_string(),
                }
            }),
            None,
        )
        .context("Failed to set pair allowance")?;

    client
        .execute(
            pair,
            &json!({
                "provide_liquidity": {
                    "assets": [
                        {
                            "info": { "token": { "contract_addr": token } },
                            "amount": POOL_SIDE.to_string(),
                        },
                        {
                            "info": { "native_token": { "denom": STABLE_DENOM } },
                            "amount": POOL_SIDE.to_string(),
                        },
                    ]
                }
            }),
            Some(&format!("{}{}", POOL_SIDE, STABLE_DENOM)),
        )
        .context("Failed to provide liquidity")?;
    Ok(())
}

fn store(client: &dyn ChainClient, wasm: &str) -> Result<u64> {
    let path = Path::new(wasm);
    if !path.exists() {
        anyhow::bail!("Wasm artifact not found: {}", wasm);
    }
    let code_id = client
        .store_code(path)
        .with_context(|| format!("Failed to store {}", wasm))?;
    println!("{} {} code_id {}", "  ├─".dimmed(), wasm, code_id);
    Ok(code_id)
}

fn string_field(value: &Value, pointer: &str) -> Option<String> {
    value.pointer(pointer)?.as_str().map(str::to_string)
}
