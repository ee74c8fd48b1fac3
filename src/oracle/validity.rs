//! Oracle Validity Filter
//!
//! Turns a raw aggregator round into either a display price or a rejection.
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. non-positive answer
//! 2. round never updated
//! 3. answer carried over from an earlier round (`answeredInRound < roundId`)
//! 4. round without a start time
//! 5. answer older than the staleness window
//!
//! Checks 3 and 4 can be switched off per feed. The filter is total: every
//! round maps to exactly one verdict.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{Price, PriceRound};

/// Staleness window used when none is configured explicitly.
pub const DEFAULT_STALE_AFTER_SECONDS: u64 = 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OracleRejection {
    NonPositiveAnswer,
    NeverUpdated,
    StaleRound,
    MalformedRound,
    Stale,
}

impl fmt::Display for OracleRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveAnswer => write!(f, "oracle answer is not positive"),
            Self::NeverUpdated => write!(f, "oracle round was never updated"),
            Self::StaleRound => write!(f, "oracle answer carried over from an earlier round"),
            Self::MalformedRound => write!(f, "oracle round has no start time"),
            Self::Stale => write!(f, "oracle answer is older than the staleness window"),
        }
    }
}

impl std::error::Error for OracleRejection {}

/// Round-consistency checks that differ between feed deployments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundChecks {
    pub answered_in_round: bool,
    pub started_at: bool,
}

impl Default for RoundChecks {
    fn default() -> Self {
        Self {
            answered_in_round: true,
            started_at: true,
        }
    }
}

/// Validate with every round check enabled.
///
/// `stale_after_seconds = None` disables the freshness window; the caller then
/// judges freshness from [`Price::updated_at`].
pub fn validate(
    round: &PriceRound,
    stale_after_seconds: Option<u64>,
    now_seconds: u64,
) -> Result<Price, OracleRejection> {
    OracleFilter {
        stale_after_seconds,
        checks: RoundChecks::default(),
    }
    .validate(round, now_seconds)
}

/// Per-feed filter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleFilter {
    pub stale_after_seconds: Option<u64>,
    pub checks: RoundChecks,
}

impl Default for OracleFilter {
    fn default() -> Self {
        Self {
            stale_after_seconds: Some(DEFAULT_STALE_AFTER_SECONDS),
            checks: RoundChecks::default(),
        }
    }
}

impl OracleFilter {
    pub fn validate(&self, round: &PriceRound, now_seconds: u64) -> Result<Price, OracleRejection> {
        if !round.answer.is_positive() {
            return Err(OracleRejection::NonPositiveAnswer);
        }
        if round.updated_at.is_zero() {
            return Err(OracleRejection::NeverUpdated);
        }
        if self.checks.answered_in_round && round.answered_in_round < round.round_id {
            return Err(OracleRejection::StaleRound);
        }
        if self.checks.started_at {
            if let Some(started_at) = &round.started_at {
                if started_at.is_zero() {
                    return Err(OracleRejection::MalformedRound);
                }
            }
        }
        if let Some(window) = self.stale_after_seconds {
            // updated_at in the future (clock skew) or past u64 counts as age 0
            let age = round
                .updated_at
                .to_u64()
                .map(|updated_at| now_seconds.saturating_sub(updated_at))
                .unwrap_or(0);
            if age > window {
                return Err(OracleRejection::Stale);
            }
        }

        let divisor = 10f64.powi(round.feed_decimals as i32);
        Ok(Price {
            value: round.answer.to_f64_lossy() / divisor,
            round_id: round.round_id,
            updated_at: round.updated_at.clone(),
            decimals: round.feed_decimals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed_point::{I256, U256};

    const NOW: u64 = 1_700_000_000;

    fn round() -> PriceRound {
        PriceRound {
            round_id: 3,
            answered_in_round: 3,
            answer: I256::from(200_000_000i64),
            started_at: Some(U256::from(NOW - 30)),
            updated_at: U256::from(NOW - 30),
            feed_decimals: 8,
        }
    }

    #[test]
    fn test_accepts_fresh_round() {
        let price = validate(&round(), Some(3600), NOW).unwrap();
        assert_eq!(price.value, 2.0);
        assert_eq!(price.round_id, 3);
        assert_eq!(price.updated_at, U256::from(NOW - 30));
    }

    #[test]
    fn test_negative_answer_rejected_before_anything_else() {
        let r = PriceRound {
            answer: I256::from(-5i64),
            updated_at: U256::from(100u64),
            started_at: Some(U256::zero()),
            ..round()
        };
        assert_eq!(validate(&r, Some(1), NOW), Err(OracleRejection::NonPositiveAnswer));
        assert_eq!(validate(&r, None, NOW), Err(OracleRejection::NonPositiveAnswer));
    }

    #[test]
    fn test_zero_answer_rejected() {
        let r = PriceRound {
            answer: I256::from(0i64),
            ..round()
        };
        assert_eq!(validate(&r, None, NOW), Err(OracleRejection::NonPositiveAnswer));
    }

    #[test]
    fn test_never_updated_precedes_stale_round() {
        let r = PriceRound {
            updated_at: U256::zero(),
            answered_in_round: 1,
            ..round()
        };
        assert_eq!(validate(&r, None, NOW), Err(OracleRejection::NeverUpdated));
    }

    #[test]
    fn test_stale_round() {
        let r = PriceRound {
            answered_in_round: 2,
            ..round()
        };
        assert_eq!(validate(&r, None, NOW), Err(OracleRejection::StaleRound));
    }

    #[test]
    fn test_malformed_round_only_when_started_at_present() {
        let zero_start = PriceRound {
            started_at: Some(U256::zero()),
            ..round()
        };
        assert_eq!(
            validate(&zero_start, None, NOW),
            Err(OracleRejection::MalformedRound)
        );

        let not_exposed = PriceRound {
            started_at: None,
            ..round()
        };
        assert!(validate(&not_exposed, None, NOW).is_ok());
    }

    #[test]
    fn test_staleness_window() {
        let r = round();
        assert!(validate(&r, Some(30), NOW).is_ok());
        assert_eq!(validate(&r, Some(29), NOW), Err(OracleRejection::Stale));
        assert!(validate(&r, None, NOW).is_ok());
    }

    #[test]
    fn test_future_update_is_not_stale() {
        let r = PriceRound {
            updated_at: U256::from(NOW + 600),
            ..round()
        };
        assert!(validate(&r, Some(0), NOW).is_ok());
    }

    #[test]
    fn test_disabled_checks_are_skipped() {
        let filter = OracleFilter {
            stale_after_seconds: None,
            checks: RoundChecks {
                answered_in_round: false,
                started_at: false,
            },
        };
        let r = PriceRound {
            answered_in_round: 1,
            started_at: Some(U256::zero()),
            ..round()
        };
        assert!(filter.validate(&r, NOW).is_ok());

        let r = PriceRound {
            answer: I256::from(0i64),
            ..r
        };
        assert_eq!(filter.validate(&r, NOW), Err(OracleRejection::NonPositiveAnswer));
    }

    #[test]
    fn test_default_filter_window() {
        let filter = OracleFilter::default();
        assert_eq!(filter.stale_after_seconds, Some(DEFAULT_STALE_AFTER_SECONDS));
        let r = PriceRound {
            updated_at: U256::from(NOW - DEFAULT_STALE_AFTER_SECONDS - 1),
            ..round()
        };
        assert_eq!(filter.validate(&r, NOW), Err(OracleRejection::Stale));
    }
}
