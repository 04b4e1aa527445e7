//! Network configuration and deployment artifacts

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use note_model::{Decimal, MarketParams};
use swap_model::TaxParams;

/// Stable denomination used for deposits, liquidity, and payouts.
pub const STABLE_DENOM: &str = "uusd";

pub struct NetworkConfig {
    pub network: String,
    pub node_url: String,
    pub chain_id: String,
    /// Chain CLI binary the harness shells out to
    pub chain_binary: String,
    /// Key name in the chain CLI's keyring
    pub key_name: String,
    pub artifacts_path: PathBuf,
}

impl NetworkConfig {
    pub fn new(
        network: &str,
        node_url: Option<String>,
        key_name: Option<String>,
        artifacts_path: Option<PathBuf>,
    ) -> Result<Self> {
        let (default_node, chain_id) = match network {
            "localnet" | "local" => ("http://127.0.0.1:26657".to_string(), "localterra".to_string()),
            "testnet" => (
                "https://rpc.testnet.terra.money:443".to_string(),
                "bombay-12".to_string(),
            ),
            "mainnet" => (
                "https://rpc.terra.money:443".to_string(),
                "columbus-5".to_string(),
            ),
            _ => anyhow::bail!(
                "Unknown network: {}. Use localnet, testnet, or mainnet",
                network
            ),
        };

        Ok(Self {
            network: network.to_string(),
            node_url: node_url.unwrap_or(default_node),
            chain_id,
            chain_binary: std::env::var("CHAIN_BINARY").unwrap_or_else(|_| "terrad".to_string()),
            key_name: key_name.unwrap_or_else(|| "validator".to_string()),
            artifacts_path: artifacts_path
                .unwrap_or_else(|| PathBuf::from(format!("artifacts/{}.toml", network))),
        })
    }
}

/// A whitelisted synthetic asset and its AMM pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntheticEntry {
    pub token: String,
    pub pair: String,
    pub oracle_proxy: String,
}

/// Market-wide economic parameters mirrored off-chain. Persisted next
/// to the addresses so the model always matches the deployed graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketProfile {
    pub fee_bps: u64,
    pub tax_rate_num: u128,
    pub tax_rate_denom: u128,
    pub tax_cap: u128,
    pub safe_collateral_ratio: String,
    pub synthetic_price: String,
}

impl Default for MarketProfile {
    fn default() -> Self {
        // Reference deployment: 0.3% commission, 0.1% tax capped at
        // 1,000,000, min ratio 1.5 with a 1.1 safety multiplier.
        Self {
            fee_bps: 30,
            tax_rate_num: 1,
            tax_rate_denom: 1000,
            tax_cap: 1_000_000,
            safe_collateral_ratio: "1.65".to_string(),
            synthetic_price: "1".to_string(),
        }
    }
}

impl MarketProfile {
    pub fn to_params(&self) -> Result<MarketParams> {
        let params = MarketParams {
            fee_bps: self.fee_bps,
            tax: TaxParams::new(self.tax_rate_num, self.tax_rate_denom, self.tax_cap),
            safe_collateral_ratio: Decimal::parse(&self.safe_collateral_ratio)
                .map_err(|e| anyhow::anyhow!("bad safe_collateral_ratio: {:?}", e))?,
            synthetic_price: Decimal::parse(&self.synthetic_price)
                .map_err(|e| anyhow::anyhow!("bad synthetic_price: {:?}", e))?,
        };
        params
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid market profile: {:?}", e))?;
        Ok(params)
    }
}

/// Addresses and code ids of the deployed contract graph, written by
/// `deploy` and read by every other command.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Artifacts {
    pub token_code_id: u64,
    pub pair_code_id: u64,
    pub factory: String,
    pub market: String,
    pub yield_token: String,
    pub oracle_hub: String,
    pub collateral_oracle: String,
    pub mint: String,
    pub structured_note: String,
    #[serde(default)]
    pub market_profile: Option<MarketProfile>,
    #[serde(default)]
    pub synthetics: BTreeMap<String, SyntheticEntry>,
}

impl Artifacts {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read artifacts file: {}", path.display()))?;
        toml::from_str(&data)
            .with_context(|| format!("Failed to parse artifacts file: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        let data = toml::to_string_pretty(self).context("Failed to serialize artifacts")?;
        fs::write(path, data)
            .with_context(|| format!("Failed to write artifacts file: {}", path.display()))
    }

    pub fn profile(&self) -> MarketProfile {
        self.market_profile.clone().unwrap_or_default()
    }

    pub fn synthetic(&self, symbol: &str) -> Result<&SyntheticEntry> {
        self.synthetics.get(symbol).with_context(|| {
            format!(
                "Synthetic {} not found in artifacts; run deploy --synthetic {}",
                symbol, symbol
            )
        })
    }
}
