//! Harvest Keeper Library
//!
//! Settlement evaluation for high-water-mark performance fees and the oracle
//! validity filter used for valuation display. The evaluators are pure; RPC
//! reads live in [`rpc`] and are only used by the binary.

pub mod abi;
pub mod config;
pub mod fixed_point;
pub mod models;
pub mod oracle;
pub mod registry;
pub mod rpc;
pub mod vault;

pub use fixed_point::{I256, U256};
pub use models::{Address, Price, PriceRound, VaultSnapshot};
pub use oracle::{OracleFilter, OracleRejection};
pub use vault::{SettlementDecision, SettlementError, SettlementEvaluator, SkipReason};
