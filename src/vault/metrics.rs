//! Display metrics for a vault snapshot (share price, TVL, fee rate).
//!
//! Strings are exact renderings of the on-chain integers; the only float is the
//! USD valuation, which needs a validated oracle [`Price`].

use serde::{Deserialize, Serialize};

use crate::fixed_point::{format_units, FixedPointError, U256};
use crate::models::{Price, VaultSnapshot};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultMetrics {
    /// Assets per share in asset units, `"0"` when there is no supply.
    pub price_per_share: String,
    pub tvl: String,
    pub performance_fee_percent: f64,
    /// High-water mark as a plain ratio (1e18 scale removed).
    pub high_water_mark: String,
}

impl VaultMetrics {
    pub fn from_snapshot(snapshot: &VaultSnapshot) -> Result<Self, FixedPointError> {
        let decimals = snapshot.asset_decimals;
        let price_per_share = if snapshot.total_supply.is_zero() {
            "0".to_string()
        } else {
            let unit = U256::pow10(decimals as u32)?;
            let pps = snapshot
                .total_assets
                .mul_div(&unit, &snapshot.total_supply)?;
            format_units(&pps, decimals)
        };

        Ok(Self {
            price_per_share,
            tvl: format_units(&snapshot.total_assets, decimals),
            performance_fee_percent: snapshot.performance_fee_bps as f64 / 100.0,
            high_water_mark: format_units(&snapshot.high_water_mark, 18),
        })
    }
}

/// USD value of `total_assets` at a validated oracle price.
pub fn usd_valuation(total_assets: &U256, asset_decimals: u8, price: &Price) -> f64 {
    let amount: f64 = format_units(total_assets, asset_decimals)
        .parse()
        .unwrap_or(f64::NAN);
    amount * price.value
}
