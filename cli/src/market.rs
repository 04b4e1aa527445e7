//! Typed views over the deployed contracts
//!
//! Thin query layer translating the contracts' JSON responses into the
//! model crate's types: pool reserves, the yield-token exchange rate,
//! and farmer positions.

use anyhow::{Context, Result};
use serde_json::{json, Value};

use note_model::{Decimal, PoolSnapshot, Position};

use crate::client::ChainClient;
use crate::config::Artifacts;

pub struct MarketView<'a> {
    client: &'a dyn ChainClient,
    artifacts: &'a Artifacts,
}

impl<'a> MarketView<'a> {
    pub fn new(client: &'a dyn ChainClient, artifacts: &'a Artifacts) -> Self {
        Self { client, artifacts }
    }

    /// Current reserves of the synthetic-stable pair.
    pub fn pool_reserves(&self, symbol: &str) -> Result<PoolSnapshot> {
        let entry = self.artifacts.synthetic(symbol)?;
        let response = self
            .client
            .query(&entry.pair, &json!({ "pool": {} }))
            .with_context(|| format!("Failed to query pool for {}", symbol))?;
        parse_pool(&response, &entry.token)
    }

    /// Current yield-token exchange rate from the lending market.
    pub fn yield_rate(&self) -> Result<Decimal> {
        let response = self
            .client
            .query(&self.artifacts.market, &json!({ "epoch_state": {} }))
            .context("Failed to query lending market epoch state")?;
        let rate = response
            .pointer("/exchange_rate")
            .and_then(Value::as_str)
            .context("Epoch state has no exchange_rate")?;
        Decimal::parse(rate).map_err(|e| anyhow::anyhow!("bad exchange_rate {}: {:?}", rate, e))
    }

    /// A farmer's position in one synthetic asset, if any.
    pub fn position(&self, farmer: &str, symbol: &str) -> Result<Option<Position>> {
        let entry = self.artifacts.synthetic(symbol)?;
        let response = self
            .client
            .query(
                &self.artifacts.structured_note,
                &json!({ "farmers_positions": { "farmer_addr": farmer } }),
            )
            .with_context(|| format!("Failed to query positions of {}", farmer))?;
        let positions = response
            .as_array()
            .context("farmers_positions response is not a list")?;
        for raw in positions {
            let token = raw
                .pointer("/masset_token")
                .and_then(Value::as_str)
                .unwrap_or_default();
            if token == entry.token {
                return Ok(Some(parse_position(raw)?));
            }
        }
        Ok(None)
    }
}

fn parse_pool(response: &Value, synthetic_token: &str) -> Result<PoolSnapshot> {
    let assets = response
        .pointer("/assets")
        .and_then(Value::as_array)
        .context("Pool response has no assets")?;
    let mut synthetic_reserve = None;
    let mut stable_reserve = None;
    for asset in assets {
        let amount = parse_uint(asset.pointer("/amount"))?;
        if asset.pointer("/info/token/contract_addr").and_then(Value::as_str)
            == Some(synthetic_token)
        {
            synthetic_reserve = Some(amount);
        } else if asset.pointer("/info/native_token/denom").is_some() {
            stable_reserve = Some(amount);
        }
    }
    Ok(PoolSnapshot {
        synthetic_reserve: synthetic_reserve.context("Pool has no synthetic side")?,
        stable_reserve: stable_reserve.context("Pool has no stable side")?,
    })
}

fn parse_position(raw: &Value) -> Result<Position> {
    let aim = raw
        .pointer("/aim_collateral_ratio")
        .and_then(Value::as_str)
        .context("Position has no aim_collateral_ratio")?;
    Ok(Position {
        loan: parse_uint(raw.pointer("/loan"))?,
        collateral: parse_uint(raw.pointer("/collateral"))?,
        aim_collateral_ratio: Decimal::parse(aim)
            .map_err(|e| anyhow::anyhow!("bad aim_collateral_ratio {}: {:?}", aim, e))?,
    })
}

/// Uint128 values arrive as JSON strings.
fn parse_uint(value: Option<&Value>) -> Result<u128> {
    let s = value
        .and_then(Value::as_str)
        .context("Expected a string-encoded integer")?;
    s.parse()
        .with_context(|| format!("Bad integer amount: {}", s))
}
