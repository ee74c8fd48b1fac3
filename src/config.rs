//! Keeper configuration from environment (`.env` supported).

use anyhow::{anyhow, Context, Result};
use std::env;

use crate::models::Address;
use crate::oracle::{OracleFilter, RoundChecks, DEFAULT_STALE_AFTER_SECONDS};
use crate::registry::Network;
use crate::vault::DEFAULT_MIN_FEE_BPS;

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "on" | "ON"))
        .unwrap_or(default)
}

fn env_address(name: &str) -> Result<Option<Address>> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => v
            .parse()
            .map(Some)
            .with_context(|| format!("{} is not a valid address", name)),
        _ => Ok(None),
    }
}

/// Parse a staleness window in seconds; `off` and `none` disable it.
///
/// `0` is a real window: only a round updated this second passes.
pub fn parse_stale_after(value: &str) -> Result<Option<u64>> {
    match value.trim().to_ascii_lowercase().as_str() {
        "off" | "none" => Ok(None),
        v => v
            .parse::<u64>()
            .map(Some)
            .map_err(|_| anyhow!("invalid staleness window '{}'", value)),
    }
}

/// Settlement keeper configuration.
#[derive(Debug, Clone)]
pub struct KeeperConfig {
    pub rpc_url: String,
    /// May instead be resolved from the vault registry.
    pub vault_address: Option<Address>,
    /// Account the keeper would submit from. Only the address is read.
    pub keeper_address: Address,
    pub min_fee_bps: u64,
    pub network: Network,
    pub registry_path: Option<String>,
}

impl KeeperConfig {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let rpc_url = env::var("RPC_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow!("RPC_URL must be set"))?;

        let vault_address = env_address("VAULT_ADDRESS")?;
        let keeper_address =
            env_address("KEEPER_ADDRESS")?.ok_or_else(|| anyhow!("KEEPER_ADDRESS must be set"))?;

        let min_fee_bps = match env::var("MIN_FEE_BPS") {
            Ok(v) => v
                .trim()
                .parse()
                .with_context(|| format!("MIN_FEE_BPS '{}' is not an integer", v))?,
            Err(_) => DEFAULT_MIN_FEE_BPS,
        };

        let network = env::var("NETWORK")
            .ok()
            .map(|v| v.parse::<Network>())
            .transpose()?
            .unwrap_or_default();

        let registry_path = env::var("VAULT_REGISTRY_PATH").ok();

        Ok(Self {
            rpc_url,
            vault_address,
            keeper_address,
            min_fee_bps,
            network,
            registry_path,
        })
    }
}

/// Price-feed configuration for the valuation display.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub rpc_url: String,
    pub feed_address: Address,
    pub filter: OracleFilter,
    /// Whether the feed's `startedAt` is carried into the round.
    pub expose_started_at: bool,
}

impl OracleConfig {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let rpc_url = env::var("RPC_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow!("RPC_URL must be set"))?;
        let feed_address = env_address("PRICE_FEED_ADDRESS")?
            .ok_or_else(|| anyhow!("PRICE_FEED_ADDRESS must be set"))?;

        let stale_after_seconds = match env::var("STALE_AFTER_SECONDS") {
            Ok(v) => parse_stale_after(&v)?,
            Err(_) => Some(DEFAULT_STALE_AFTER_SECONDS),
        };

        let started_at = env_flag("ORACLE_CHECK_STARTED_AT", true);
        let checks = RoundChecks {
            answered_in_round: env_flag("ORACLE_CHECK_ANSWERED_IN_ROUND", true),
            started_at,
        };

        Ok(Self {
            rpc_url,
            feed_address,
            filter: OracleFilter {
                stale_after_seconds,
                checks,
            },
            expose_started_at: started_at,
        })
    }
}
