//! Vault Registry
//!
//! Known vault deployments per network, loaded from TOML:
//!
//! ```toml
//! [[vaults]]
//! id = "usdt-euler"
//! name = "USDT Euler Earn Vault"
//! symbol = "tvUSDT"
//! asset_symbol = "USDT"
//! asset_decimals = 6
//! performance_fee_bps = 1000
//!
//! [[vaults.networks]]
//! chain_id = 8453
//! chain_name = "Base"
//! address = "0x..."
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::models::Address;

/// Supported keeper networks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Network {
    #[default]
    Base,
    BaseSepolia,
}

impl Network {
    pub fn chain_id(&self) -> u64 {
        match self {
            Self::Base => 8453,
            Self::BaseSepolia => 84532,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::BaseSepolia => "base-sepolia",
        }
    }
}

impl FromStr for Network {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "base" => Ok(Self::Base),
            "base-sepolia" => Ok(Self::BaseSepolia),
            other => Err(RegistryError::UnknownNetwork(other.to_string())),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    UnknownNetwork(String),
    UnknownVault(String),
    NotDeployed { vault_id: String, chain_id: u64 },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownNetwork(n) => write!(f, "unknown network '{}'", n),
            Self::UnknownVault(id) => write!(f, "vault '{}' is not in the registry", id),
            Self::NotDeployed { vault_id, chain_id } => {
                write!(f, "vault '{}' has no deployment on chain {}", vault_id, chain_id)
            }
        }
    }
}

impl std::error::Error for RegistryError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultNetwork {
    pub chain_id: u64,
    pub chain_name: String,
    /// Missing until the vault is deployed on this chain.
    #[serde(default)]
    pub address: Option<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultEntry {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub asset_symbol: String,
    pub asset_decimals: u8,
    pub performance_fee_bps: u16,
    #[serde(default)]
    pub networks: Vec<VaultNetwork>,
}

impl VaultEntry {
    /// Deployed address on `chain_id`.
    pub fn address_on(&self, chain_id: u64) -> Option<Address> {
        self.networks
            .iter()
            .find(|n| n.chain_id == chain_id)
            .and_then(|n| n.address)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultRegistry {
    #[serde(default)]
    pub vaults: Vec<VaultEntry>,
}

impl VaultRegistry {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("failed to parse vault registry")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read vault registry {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn get(&self, id: &str) -> Option<&VaultEntry> {
        self.vaults.iter().find(|v| v.id == id)
    }

    /// Vaults deployed on `chain_id`, each with only that chain's network entry.
    pub fn by_chain(&self, chain_id: u64) -> Vec<VaultEntry> {
        self.vaults
            .iter()
            .filter_map(|vault| {
                let networks: Vec<VaultNetwork> = vault
                    .networks
                    .iter()
                    .filter(|n| n.chain_id == chain_id && n.address.is_some())
                    .cloned()
                    .collect();
                if networks.is_empty() {
                    None
                } else {
                    Some(VaultEntry {
                        networks,
                        ..vault.clone()
                    })
                }
            })
            .collect()
    }

    pub fn find_by_address(&self, address: &Address) -> Option<(&VaultEntry, &VaultNetwork)> {
        self.vaults.iter().find_map(|vault| {
            vault
                .networks
                .iter()
                .find(|n| n.address.as_ref() == Some(address))
                .map(|n| (vault, n))
        })
    }

    /// Deployed address of vault `id` on `network`.
    pub fn resolve(&self, id: &str, network: Network) -> Result<Address, RegistryError> {
        let vault = self
            .get(id)
            .ok_or_else(|| RegistryError::UnknownVault(id.to_string()))?;
        vault
            .address_on(network.chain_id())
            .ok_or_else(|| RegistryError::NotDeployed {
                vault_id: id.to_string(),
                chain_id: network.chain_id(),
            })
    }
}
