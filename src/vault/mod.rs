//! Vault Module
//! Settlement decisions for performance-fee harvesting, plus display metrics.

pub mod metrics;
pub mod report;
pub mod settlement;

pub use metrics::{usd_valuation, VaultMetrics};
pub use report::SettlementReport;
pub use settlement::{
    evaluate, HarvesterPolicy, SettlementDecision, SettlementError, SettlementEvaluator,
    SkipReason, DEFAULT_MIN_FEE_BPS,
};
