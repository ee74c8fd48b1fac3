//! JSON-RPC Snapshot Reader
//!
//! Reads vault and price-feed state with `eth_call` so the evaluators can run
//! on a consistent snapshot. Calls for one snapshot are issued concurrently.
//! There is no retry: a failed read fails the whole snapshot.

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::abi;
use crate::fixed_point::U256;
use crate::models::{Address, PriceRound, VaultSnapshot};
use crate::oracle::{decode_latest_round_data, DECIMALS_SELECTOR, LATEST_ROUND_DATA_SELECTOR};

/// Vault view-function selectors.
pub mod vault_selectors {
    pub const TOTAL_ASSETS: &str = "0x01e1d114";
    pub const TOTAL_SUPPLY: &str = "0x18160ddd";
    pub const DECIMALS: &str = "0x313ce567";
    pub const HIGH_WATER_MARK: &str = "0x1e8410da";
    pub const PERFORMANCE_FEE_BPS: &str = "0xb9d4e879";
    pub const HARVESTER: &str = "0x4bdaeac1";
    pub const OWNER: &str = "0x8da5cb5b";
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: Option<i64>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    result: Option<String>,
    error: Option<RpcErrorObject>,
}

pub struct EthRpcClient {
    client: Client,
    rpc_url: String,
}

impl EthRpcClient {
    pub fn new(rpc_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            rpc_url: rpc_url.into(),
        })
    }

    /// `eth_call` against the latest block, returning raw return data.
    pub async fn eth_call(&self, to: &Address, data: &str) -> Result<Vec<u8>> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "method": "eth_call",
            "params": [{
                "to": to.to_string(),
                "data": data
            }, "latest"],
            "id": 1
        });

        debug!(to = %to, data, "eth_call");

        let response: JsonRpcResponse = self
            .client
            .post(&self.rpc_url)
            .json(&payload)
            .send()
            .await
            .context("RPC request failed")?
            .error_for_status()
            .context("RPC endpoint returned an error status")?
            .json()
            .await
            .context("failed to parse RPC response")?;

        if let Some(err) = response.error {
            return Err(anyhow!(
                "RPC error {}: {}",
                err.code.unwrap_or_default(),
                err.message.unwrap_or_default()
            ));
        }

        let result = response
            .result
            .ok_or_else(|| anyhow!("no result in RPC response"))?;
        Ok(abi::decode_hex_result(&result)?)
    }

    async fn call_u256(&self, to: &Address, selector: &str) -> Result<U256> {
        let data = self.eth_call(to, selector).await?;
        abi::decode_u256(&data, 0).with_context(|| format!("decoding {} from {}", selector, to))
    }

    async fn call_u16(&self, to: &Address, selector: &str) -> Result<u16> {
        let data = self.eth_call(to, selector).await?;
        abi::decode_u16(&data, 0).with_context(|| format!("decoding {} from {}", selector, to))
    }

    async fn call_u8(&self, to: &Address, selector: &str) -> Result<u8> {
        let data = self.eth_call(to, selector).await?;
        abi::decode_u8(&data, 0).with_context(|| format!("decoding {} from {}", selector, to))
    }

    async fn call_address(&self, to: &Address, selector: &str) -> Result<Address> {
        let data = self.eth_call(to, selector).await?;
        abi::decode_address(&data, 0).with_context(|| format!("decoding {} from {}", selector, to))
    }

    /// Read every field the settlement evaluator needs from `vault`.
    pub async fn fetch_vault_snapshot(&self, vault: &Address, caller: Address) -> Result<VaultSnapshot> {
        use self::vault_selectors::*;

        let (
            total_assets,
            total_supply,
            asset_decimals,
            high_water_mark,
            performance_fee_bps,
            harvester,
            owner,
        ) = tokio::try_join!(
            self.call_u256(vault, TOTAL_ASSETS),
            self.call_u256(vault, TOTAL_SUPPLY),
            self.call_u8(vault, DECIMALS),
            self.call_u256(vault, HIGH_WATER_MARK),
            self.call_u16(vault, PERFORMANCE_FEE_BPS),
            self.call_address(vault, HARVESTER),
            self.call_address(vault, OWNER),
        )?;

        Ok(VaultSnapshot {
            total_assets,
            total_supply,
            asset_decimals,
            high_water_mark,
            performance_fee_bps,
            owner,
            harvester,
            caller,
        })
    }

    /// Read the latest round and decimals from an AggregatorV3 feed.
    pub async fn fetch_price_round(&self, feed: &Address, expose_started_at: bool) -> Result<PriceRound> {
        let (round_data, decimals) = tokio::try_join!(
            self.eth_call(feed, LATEST_ROUND_DATA_SELECTOR),
            self.call_u8(feed, DECIMALS_SELECTOR),
        )?;
        decode_latest_round_data(&round_data, decimals, expose_started_at)
            .with_context(|| format!("decoding latestRoundData from {}", feed))
    }
}
