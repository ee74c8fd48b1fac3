//! Oracle Module
//!
//! Price-feed rounds are only shown as a valuation after passing the validity
//! filter. A rejected round degrades the valuation to "unavailable"; it never
//! feeds any amount calculation.

pub mod chainlink;
pub mod validity;

pub use chainlink::{decode_latest_round_data, DECIMALS_SELECTOR, LATEST_ROUND_DATA_SELECTOR};
pub use validity::{validate, OracleFilter, OracleRejection, RoundChecks, DEFAULT_STALE_AFTER_SECONDS};
