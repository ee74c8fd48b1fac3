//! Harvest Keeper
//!
//! Reads a vault snapshot and reports whether a performance-fee settlement
//! (`harvest()`) is due, or validates a price-feed round for display.
//! Submitting the transaction is left to the executor that consumes the
//! JSON report; this binary never holds a key.
//!
//! Usage:
//!   harvest-keeper settle [--vault 0x..] [--vault-id usdt-euler] [--min-fee-bps 5]
//!   harvest-keeper price [--feed 0x..] [--stale-after 3600] [--amount 1500000 --decimals 6]
//!
//! Environment Variables:
//!   RPC_URL, KEEPER_ADDRESS, VAULT_ADDRESS, MIN_FEE_BPS, NETWORK, VAULT_REGISTRY_PATH
//!   PRICE_FEED_ADDRESS, STALE_AFTER_SECONDS, ORACLE_CHECK_ANSWERED_IN_ROUND, ORACLE_CHECK_STARTED_AT
//!   RUST_LOG (default: harvest_keeper=info)

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use harvest_keeper::{
    config::{parse_stale_after, KeeperConfig, OracleConfig},
    fixed_point::{format_units, U256},
    models::{Address, Price},
    registry::VaultRegistry,
    rpc::EthRpcClient,
    vault::{
        usd_valuation, SettlementDecision, SettlementError, SettlementEvaluator, SettlementReport,
    },
};

/// Exit code when the price round is rejected and the valuation is unavailable.
const EXIT_VALUATION_UNAVAILABLE: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "harvest-keeper")]
#[command(about = "Performance-fee settlement keeper for yield vaults")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decide whether the vault's performance fee should be settled now
    Settle {
        /// Vault address (overrides VAULT_ADDRESS)
        #[arg(long)]
        vault: Option<Address>,

        /// Resolve the vault address from the registry by id
        #[arg(long)]
        vault_id: Option<String>,

        /// Vault registry TOML (overrides VAULT_REGISTRY_PATH)
        #[arg(long)]
        registry: Option<String>,

        /// Minimum fee/profit ratio in bps (overrides MIN_FEE_BPS)
        #[arg(long)]
        min_fee_bps: Option<u64>,
    },
    /// Validate the latest price-feed round
    Price {
        /// Feed address (overrides PRICE_FEED_ADDRESS)
        #[arg(long)]
        feed: Option<Address>,

        /// Staleness window in seconds; off/none disables it
        #[arg(long)]
        stale_after: Option<String>,

        /// Raw asset amount to value at the validated price
        #[arg(long, requires = "decimals")]
        amount: Option<U256>,

        /// Decimals of --amount
        #[arg(long)]
        decimals: Option<u8>,
    },
}

#[derive(Debug, Serialize)]
struct PriceReport {
    feed: Address,
    #[serde(flatten)]
    price: Price,
    #[serde(skip_serializing_if = "Option::is_none")]
    usd_valuation: Option<f64>,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "harvest_keeper=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_tracing();

    match args.command {
        Command::Settle {
            vault,
            vault_id,
            registry,
            min_fee_bps,
        } => settle(vault, vault_id, registry, min_fee_bps).await,
        Command::Price {
            feed,
            stale_after,
            amount,
            decimals,
        } => price(feed, stale_after, amount, decimals).await,
    }
}

async fn settle(
    vault: Option<Address>,
    vault_id: Option<String>,
    registry: Option<String>,
    min_fee_bps: Option<u64>,
) -> Result<ExitCode> {
    let config = KeeperConfig::from_env()?;

    let vault = match (vault, vault_id) {
        (Some(address), _) => address,
        (None, Some(id)) => {
            let path = registry
                .or_else(|| config.registry_path.clone())
                .ok_or_else(|| anyhow!("--vault-id needs --registry or VAULT_REGISTRY_PATH"))?;
            VaultRegistry::load(&path)?.resolve(&id, config.network)?
        }
        (None, None) => config
            .vault_address
            .ok_or_else(|| anyhow!("no vault given: use --vault, --vault-id or VAULT_ADDRESS"))?,
    };
    let evaluator = SettlementEvaluator::new(min_fee_bps.unwrap_or(config.min_fee_bps));

    info!(
        vault = %vault,
        network = %config.network,
        caller = %config.keeper_address,
        min_fee_bps = evaluator.min_fee_bps,
        "Reading vault snapshot"
    );

    let client = EthRpcClient::new(&config.rpc_url)?;
    let snapshot = client
        .fetch_vault_snapshot(&vault, config.keeper_address)
        .await
        .with_context(|| format!("failed to read vault {}", vault))?;

    let decision = match evaluator.evaluate(&snapshot) {
        Ok(decision) => decision,
        Err(e @ SettlementError::Unauthorized { .. }) => {
            error!(
                vault = %vault,
                error = %e,
                "Keeper account is not authorized; call setHarvester() or harvest from the owner account"
            );
            return Err(e.into());
        }
        Err(e) => {
            error!(vault = %vault, error = %e, "Settlement evaluation aborted");
            return Err(e.into());
        }
    };

    match &decision {
        SettlementDecision::Skip { reason } => {
            info!(vault = %vault, reason = %reason, "Skipping harvest");
        }
        SettlementDecision::Execute {
            fee_assets,
            profit_assets,
        } => {
            info!(
                vault = %vault,
                fee_assets = %format_units(fee_assets, snapshot.asset_decimals),
                profit_assets = %format_units(profit_assets, snapshot.asset_decimals),
                "Harvest due"
            );
        }
    }

    let report = SettlementReport::new(vault, config.network, &snapshot, decision);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::SUCCESS)
}

async fn price(
    feed: Option<Address>,
    stale_after: Option<String>,
    amount: Option<U256>,
    decimals: Option<u8>,
) -> Result<ExitCode> {
    let mut config = OracleConfig::from_env()?;
    if let Some(feed) = feed {
        config.feed_address = feed;
    }
    if let Some(window) = stale_after {
        config.filter.stale_after_seconds = parse_stale_after(&window)?;
    }

    let client = EthRpcClient::new(&config.rpc_url)?;
    let round = client
        .fetch_price_round(&config.feed_address, config.expose_started_at)
        .await
        .with_context(|| format!("failed to read feed {}", config.feed_address))?;

    let now_seconds = Utc::now().timestamp().max(0) as u64;
    match config.filter.validate(&round, now_seconds) {
        Ok(price) => {
            info!(
                feed = %config.feed_address,
                round_id = price.round_id,
                price = price.value,
                "Price accepted"
            );
            let usd_valuation = match (amount, decimals) {
                (Some(amount), Some(decimals)) => Some(usd_valuation(&amount, decimals, &price)),
                _ => None,
            };
            let report = PriceReport {
                feed: config.feed_address,
                price,
                usd_valuation,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(rejection) => {
            warn!(
                feed = %config.feed_address,
                round_id = round.round_id,
                rejection = %rejection,
                "Price unavailable"
            );
            Ok(ExitCode::from(EXIT_VALUATION_UNAVAILABLE))
        }
    }
}
