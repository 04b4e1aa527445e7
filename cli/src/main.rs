//! Structured-note harness CLI
//!
//! Deploys the structured-note contract graph (lending market,
//! synthetic mint, oracle stack, AMM, note) and replays economic
//! scenarios against it, checking on-chain results against the
//! off-chain position model.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

mod client;
mod config;
mod deploy;
mod market;
mod scenario;

use client::CliChain;
use config::{Artifacts, NetworkConfig};
use market::MarketView;

#[derive(Parser)]
#[command(name = "structured-note")]
#[command(about = "Structured-note harness - deploy contracts and replay scenarios", long_about = None)]
#[command(version)]
struct Cli {
    /// Network to connect to (localnet, testnet, mainnet)
    #[arg(short, long, default_value = "localnet")]
    network: String,

    /// Node RPC URL (overrides network default)
    #[arg(short, long)]
    url: Option<String>,

    /// Key name in the chain CLI keyring
    #[arg(short, long)]
    key: Option<String>,

    /// Artifacts file with deployed addresses
    #[arg(short, long)]
    artifacts: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy the contract graph
    Deploy {
        /// Also whitelist a synthetic asset with this symbol
        #[arg(long)]
        synthetic: Option<String>,

        /// Oracle price for the whitelisted synthetic
        #[arg(long, default_value = "1")]
        price: String,

        /// Minimum collateral ratio for the whitelisted synthetic
        #[arg(long, default_value = "1.5")]
        min_collateral_ratio: String,
    },

    /// Run the scenario suite against a deployed graph
    Scenario {
        /// Run only scenarios whose name contains this string
        name: Option<String>,

        /// Farmer address whose positions the suite checks
        #[arg(short, long)]
        farmer: Option<String>,

        /// List available scenarios and exit
        #[arg(long)]
        list: bool,
    },

    /// Show a farmer's position in a synthetic asset
    Position {
        /// Farmer address
        farmer: String,

        /// Synthetic symbol
        symbol: String,
    },

    /// Show pool reserves for a synthetic pair
    Pool {
        /// Synthetic symbol
        symbol: String,
    },

    /// Show the yield-token exchange rate
    Rate,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let config = NetworkConfig::new(
        &cli.network,
        cli.url.clone(),
        cli.key.clone(),
        cli.artifacts.clone(),
    )?;

    if cli.verbose {
        println!("{} {}", "Network:".bright_cyan(), config.network);
        println!("{} {}", "Node:".bright_cyan(), config.node_url);
        println!("{} {}", "Chain id:".bright_cyan(), config.chain_id);
        println!(
            "{} {}",
            "Artifacts:".bright_cyan(),
            config.artifacts_path.display()
        );
    }

    let chain = CliChain::new(&config);

    match cli.command {
        Commands::Deploy {
            synthetic,
            price,
            min_collateral_ratio,
        } => {
            let mut artifacts = deploy::deploy_all(&config, &chain)?;
            if let Some(symbol) = synthetic {
                deploy::whitelist_synthetic(
                    &config,
                    &chain,
                    &mut artifacts,
                    &symbol,
                    &price,
                    &min_collateral_ratio,
                )?;
            }
        }
        Commands::Scenario { name, farmer, list } => {
            if list {
                scenario::list_scenarios();
                return Ok(());
            }
            let farmer = farmer
                .ok_or_else(|| anyhow::anyhow!("--farmer is required to run scenarios"))?;
            let mut artifacts = Artifacts::load(&config.artifacts_path)?;
            scenario::run_scenarios(&config, &chain, &mut artifacts, &farmer, name.as_deref())?;
        }
        Commands::Position { farmer, symbol } => {
            let artifacts = Artifacts::load(&config.artifacts_path)?;
            let view = MarketView::new(&chain, &artifacts);
            match view.position(&farmer, &symbol)? {
                Some(position) => {
                    let params = artifacts.profile().to_params()?;
                    println!("{} {}", "Loan:".bright_cyan(), position.loan);
                    println!("{} {}", "Collateral:".bright_cyan(), position.collateral);
                    println!(
                        "{} {}",
                        "Aim ratio:".bright_cyan(),
                        position.aim_collateral_ratio
                    );
                    match position.collateral_ratio(&params) {
                        Ok(Some(ratio)) => {
                            println!("{} {}", "Current ratio:".bright_cyan(), ratio)
                        }
                        Ok(None) => println!("{} no loan", "Current ratio:".bright_cyan()),
                        Err(e) => println!("{} {:?}", "Current ratio:".bright_red(), e),
                    }
                }
                None => println!("No position for {} in {}", farmer, symbol),
            }
        }
        Commands::Pool { symbol } => {
            let artifacts = Artifacts::load(&config.artifacts_path)?;
            let view = MarketView::new(&chain, &artifacts);
            let pool = view.pool_reserves(&symbol)?;
            println!(
                "{} {}",
                "Synthetic reserve:".bright_cyan(),
                pool.synthetic_reserve
            );
            println!("{} {}", "Stable reserve:".bright_cyan(), pool.stable_reserve);
        }
        Commands::Rate => {
            let artifacts = Artifacts::load(&config.artifacts_path)?;
            let view = MarketView::new(&chain, &artifacts);
            println!("{} {}", "Yield rate:".bright_cyan(), view.yield_rate()?);
        }
    }

    Ok(())
}
