//! Snapshot types read from chain at decision time.
//!
//! All values are immutable for the duration of one evaluation and carry no
//! identity beyond their contents.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::fixed_point::{I256, MAX_FEE_BPS, U256};

/// 20-byte account / contract address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressParseError {
    MissingPrefix,
    InvalidLength(usize),
    InvalidHex,
}

impl fmt::Display for AddressParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPrefix => write!(f, "address must start with 0x"),
            Self::InvalidLength(n) => write!(f, "address has {} hex digits (expected 40)", n),
            Self::InvalidHex => write!(f, "address contains non-hex characters"),
        }
    }
}

impl std::error::Error for AddressParseError {}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let hex_part = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or(AddressParseError::MissingPrefix)?;
        if hex_part.len() != 40 {
            return Err(AddressParseError::InvalidLength(hex_part.len()));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(hex_part, &mut bytes).map_err(|_| AddressParseError::InvalidHex)?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Vault
// =============================================================================

/// Vault accounting state plus the parties involved in a settlement attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultSnapshot {
    /// Value of vault-held assets, asset-native units.
    pub total_assets: U256,
    /// Outstanding share count.
    pub total_supply: U256,
    pub asset_decimals: u8,
    /// Last settled peak price-per-share, scaled by 1e18.
    pub high_water_mark: U256,
    /// Performance fee in basis points (0..=10_000).
    pub performance_fee_bps: u16,
    pub owner: Address,
    /// Zero when no dedicated harvester is assigned.
    pub harvester: Address,
    /// Account that would submit the settlement.
    pub caller: Address,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    FeeOutOfRange(u16),
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FeeOutOfRange(bps) => {
                write!(f, "performance fee {} bps exceeds {} bps", bps, MAX_FEE_BPS)
            }
        }
    }
}

impl std::error::Error for SnapshotError {}

impl VaultSnapshot {
    /// Check the invariants the vault contract is expected to uphold.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.performance_fee_bps > MAX_FEE_BPS {
            return Err(SnapshotError::FeeOutOfRange(self.performance_fee_bps));
        }
        Ok(())
    }
}

// =============================================================================
// Oracle
// =============================================================================

/// One aggregator round as returned by `latestRoundData()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRound {
    /// uint80
    pub round_id: u128,
    /// uint80
    pub answered_in_round: u128,
    pub answer: I256,
    /// `None` when the upstream feed does not expose the field.
    pub started_at: Option<U256>,
    pub updated_at: U256,
    pub feed_decimals: u8,
}

/// A price that passed every validity check. Display use only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub value: f64,
    pub round_id: u128,
    /// Oracle source time, for callers judging freshness themselves.
    pub updated_at: U256,
    pub decimals: u8,
}
