//! Performance-Fee Settlement Evaluator
//!
//! Decides whether the keeper should call `harvest()` on a vault. The decision
//! is a pure function of a [`VaultSnapshot`]: authorization first (fail closed),
//! then the high-water-mark profit computation with every result held to uint256,
//! then the economic threshold.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::fixed_point::{FixedPointError, BPS_SCALE, HWM_SCALE, U256};
use crate::models::{Address, SnapshotError, VaultSnapshot};

/// Keeper default for the minimum fee/profit ratio, in basis points.
pub const DEFAULT_MIN_FEE_BPS: u64 = 5;

// =============================================================================
// AUTHORIZATION
// =============================================================================

/// Who may trigger a settlement.
///
/// An assigned harvester is exclusive: once set, the owner is no longer
/// accepted as caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvesterPolicy {
    /// No harvester assigned; only the owner may settle.
    Unset { owner: Address },
    Set { harvester: Address },
}

impl HarvesterPolicy {
    pub fn from_snapshot(snapshot: &VaultSnapshot) -> Self {
        if snapshot.harvester.is_zero() {
            Self::Unset {
                owner: snapshot.owner,
            }
        } else {
            Self::Set {
                harvester: snapshot.harvester,
            }
        }
    }

    pub fn required_caller(&self) -> Address {
        match self {
            Self::Unset { owner } => *owner,
            Self::Set { harvester } => *harvester,
        }
    }

    pub fn authorize(&self, caller: Address) -> Result<(), SettlementError> {
        if caller == self.required_caller() {
            Ok(())
        } else {
            Err(SettlementError::Unauthorized {
                caller,
                required: self.required_caller(),
            })
        }
    }
}

// =============================================================================
// DECISION
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoSupply,
    NoProfit,
    FeeBelowThreshold,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoSupply => "no supply",
            Self::NoProfit => "no profit above high-water mark",
            Self::FeeBelowThreshold => "fee below threshold",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome handed to the transaction executor, which only acts on `Execute`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum SettlementDecision {
    Skip {
        reason: SkipReason,
    },
    Execute {
        fee_assets: U256,
        profit_assets: U256,
    },
}

impl SettlementDecision {
    pub fn skip(reason: SkipReason) -> Self {
        Self::Skip { reason }
    }

    pub fn is_execute(&self) -> bool {
        matches!(self, Self::Execute { .. })
    }

    /// Skip reason, `None` for `Execute`.
    pub fn reason(&self) -> Option<SkipReason> {
        match self {
            Self::Skip { reason } => Some(*reason),
            Self::Execute { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementError {
    /// Caller does not match the harvester policy. Not retryable without
    /// reconfiguring the vault or the keeper account.
    Unauthorized { caller: Address, required: Address },
    InvalidSnapshot(SnapshotError),
    /// Snapshot values pushed a computation past 256 bits.
    Arithmetic(FixedPointError),
}

impl fmt::Display for SettlementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthorized { caller, required } => write!(
                f,
                "caller {} is not authorized to settle (expected {})",
                caller, required
            ),
            Self::InvalidSnapshot(e) => write!(f, "invalid vault snapshot: {}", e),
            Self::Arithmetic(e) => write!(f, "settlement arithmetic failed: {}", e),
        }
    }
}

impl std::error::Error for SettlementError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidSnapshot(e) => Some(e),
            Self::Arithmetic(e) => Some(e),
            Self::Unauthorized { .. } => None,
        }
    }
}

impl From<FixedPointError> for SettlementError {
    fn from(e: FixedPointError) -> Self {
        Self::Arithmetic(e)
    }
}

impl From<SnapshotError> for SettlementError {
    fn from(e: SnapshotError) -> Self {
        Self::InvalidSnapshot(e)
    }
}

// =============================================================================
// EVALUATION
// =============================================================================

/// Evaluate one snapshot.
///
/// `min_fee_bps` is the smallest acceptable `fee / profit` ratio; a settlement
/// whose fee falls under it is skipped as uneconomical.
///
/// Products are formed at full width and only their quotients must fit in
/// 256 bits. The fee rate is validated once there is profit to charge it on,
/// so zero supply and no profit skip for any snapshot.
pub fn evaluate(
    snapshot: &VaultSnapshot,
    min_fee_bps: u64,
) -> Result<SettlementDecision, SettlementError> {
    HarvesterPolicy::from_snapshot(snapshot).authorize(snapshot.caller)?;

    if snapshot.total_supply.is_zero() {
        return Ok(SettlementDecision::skip(SkipReason::NoSupply));
    }

    let scale = U256::from(HWM_SCALE);
    let bps_scale = U256::from(BPS_SCALE);

    let pps = snapshot
        .total_assets
        .mul_div(&scale, &snapshot.total_supply)?;
    if pps <= snapshot.high_water_mark {
        return Ok(SettlementDecision::skip(SkipReason::NoProfit));
    }

    snapshot.validate()?;

    let profit_assets = pps
        .checked_sub(&snapshot.high_water_mark)?
        .mul_div(&snapshot.total_supply, &scale)?;
    let fee_assets =
        profit_assets.mul_div(&U256::from(snapshot.performance_fee_bps), &bps_scale)?;

    // fee / profit < min_fee_bps / 1e4, cross-multiplied
    let fee_side = fee_assets.widening_mul(&bps_scale);
    let threshold_side = profit_assets.widening_mul(&U256::from(min_fee_bps));
    if fee_side < threshold_side {
        return Ok(SettlementDecision::skip(SkipReason::FeeBelowThreshold));
    }

    Ok(SettlementDecision::Execute {
        fee_assets,
        profit_assets,
    })
}

/// Evaluator bound to a keeper's threshold configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementEvaluator {
    pub min_fee_bps: u64,
}

impl Default for SettlementEvaluator {
    fn default() -> Self {
        Self {
            min_fee_bps: DEFAULT_MIN_FEE_BPS,
        }
    }
}

impl SettlementEvaluator {
    pub fn new(min_fee_bps: u64) -> Self {
        Self { min_fee_bps }
    }

    pub fn evaluate(&self, snapshot: &VaultSnapshot) -> Result<SettlementDecision, SettlementError> {
        evaluate(snapshot, self.min_fee_bps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::new([byte; 20])
    }

    fn snapshot() -> VaultSnapshot {
        VaultSnapshot {
            total_assets: U256::from(1_100_000u64),
            total_supply: U256::from(1_000_000u64),
            asset_decimals: 6,
            high_water_mark: U256::from(HWM_SCALE),
            performance_fee_bps: 1_000,
            owner: addr(0x11),
            harvester: Address::ZERO,
            caller: addr(0x11),
        }
    }

    #[test]
    fn test_worked_example_executes() {
        let decision = evaluate(&snapshot(), 5).unwrap();
        assert_eq!(
            decision,
            SettlementDecision::Execute {
                fee_assets: U256::from(10_000u64),
                profit_assets: U256::from(100_000u64),
            }
        );
        assert!(decision.is_execute());
        assert_eq!(decision.reason(), None);
    }

    #[test]
    fn test_zero_fee_is_below_threshold() {
        let mut s = snapshot();
        s.performance_fee_bps = 0;
        let decision = evaluate(&s, 5).unwrap();
        assert_eq!(decision.reason(), Some(SkipReason::FeeBelowThreshold));
    }

    #[test]
    fn test_zero_min_fee_accepts_zero_fee() {
        let mut s = snapshot();
        s.performance_fee_bps = 0;
        let decision = evaluate(&s, 0).unwrap();
        assert_eq!(
            decision,
            SettlementDecision::Execute {
                fee_assets: U256::zero(),
                profit_assets: U256::from(100_000u64),
            }
        );
    }

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        // fee/profit = 1000/10000 exactly; min of 1000 bps must still execute
        assert!(evaluate(&snapshot(), 1_000).unwrap().is_execute());
        assert_eq!(
            evaluate(&snapshot(), 1_001).unwrap().reason(),
            Some(SkipReason::FeeBelowThreshold)
        );
    }

    #[test]
    fn test_no_supply() {
        let mut s = snapshot();
        s.total_supply = U256::zero();
        assert_eq!(
            evaluate(&s, 5).unwrap(),
            SettlementDecision::skip(SkipReason::NoSupply)
        );
    }

    #[test]
    fn test_pps_equal_to_hwm_is_no_profit() {
        let mut s = snapshot();
        s.total_assets = U256::from(1_000_000u64);
        assert_eq!(
            evaluate(&s, 5).unwrap().reason(),
            Some(SkipReason::NoProfit)
        );
    }

    #[test]
    fn test_unauthorized_runs_before_supply_check() {
        let mut s = snapshot();
        s.total_supply = U256::zero();
        s.caller = addr(0x99);
        assert!(matches!(
            evaluate(&s, 5),
            Err(SettlementError::Unauthorized { .. })
        ));
    }

    #[test]
    fn test_assigned_harvester_excludes_owner() {
        let mut s = snapshot();
        s.harvester = addr(0x22);
        assert_eq!(
            evaluate(&s, 5),
            Err(SettlementError::Unauthorized {
                caller: addr(0x11),
                required: addr(0x22),
            })
        );
        s.caller = addr(0x22);
        assert!(evaluate(&s, 5).unwrap().is_execute());
    }

    #[test]
    fn test_harvester_that_is_also_owner() {
        let mut s = snapshot();
        s.harvester = addr(0x11);
        assert!(evaluate(&s, 5).is_ok());
    }

    #[test]
    fn test_overflow_aborts() {
        let mut s = snapshot();
        s.total_assets = U256::from_be_bytes(&[0xff; 32]);
        // pps = (2^256 - 1) * 1e18 / 1e6 does not fit in 256 bits
        assert_eq!(
            evaluate(&s, 5),
            Err(SettlementError::Arithmetic(FixedPointError::Overflow { op: "mul_div" }))
        );
    }

    #[test]
    fn test_wide_intermediates_settle() {
        let two_200 = U256::try_from_biguint(num_bigint::BigUint::from(1u8) << 200usize).unwrap();
        let two_199 = U256::try_from_biguint(num_bigint::BigUint::from(1u8) << 199usize).unwrap();
        let s = VaultSnapshot {
            // 1.5 * 2^200 assets over 2^200 shares: pps = 1.5e18
            total_assets: two_200.checked_add(&two_199).unwrap(),
            total_supply: two_200,
            ..snapshot()
        };
        let fee = two_199.mul_div(&U256::from(1_000u16), &U256::from(BPS_SCALE)).unwrap();
        assert_eq!(
            evaluate(&s, 5).unwrap(),
            SettlementDecision::Execute {
                fee_assets: fee,
                profit_assets: two_199,
            }
        );
    }

    #[test]
    fn test_fee_rate_not_checked_without_profit() {
        let mut s = snapshot();
        s.performance_fee_bps = u16::MAX;
        s.total_supply = U256::zero();
        assert_eq!(
            evaluate(&s, 5).unwrap(),
            SettlementDecision::skip(SkipReason::NoSupply)
        );

        s.total_supply = U256::from(1_000_000u64);
        s.total_assets = U256::from(900_000u64);
        assert_eq!(
            evaluate(&s, 5).unwrap(),
            SettlementDecision::skip(SkipReason::NoProfit)
        );
    }

    #[test]
    fn test_fee_above_max_is_rejected() {
        let mut s = snapshot();
        s.performance_fee_bps = 12_000;
        assert_eq!(
            evaluate(&s, 5),
            Err(SettlementError::InvalidSnapshot(SnapshotError::FeeOutOfRange(12_000)))
        );
    }

    #[test]
    fn test_profit_truncates() {
        // 4 assets over 3 shares: truncated division at every step
        let s = VaultSnapshot {
            total_assets: U256::from(4u64),
            total_supply: U256::from(3u64),
            high_water_mark: U256::from(HWM_SCALE),
            ..snapshot()
        };
        // pps = 1_333_333_333_333_333_333, profit = 999_999_999_999_999_999 / 1e18 = 0
        let decision = evaluate(&s, 0).unwrap();
        assert_eq!(
            decision,
            SettlementDecision::Execute {
                fee_assets: U256::zero(),
                profit_assets: U256::zero(),
            }
        );
    }

    #[test]
    fn test_decision_json_shape() {
        let json = serde_json::to_value(evaluate(&snapshot(), 5).unwrap()).unwrap();
        assert_eq!(json["decision"], "execute");
        assert_eq!(json["fee_assets"], "10000");
        let skip = serde_json::to_value(SettlementDecision::skip(SkipReason::NoSupply)).unwrap();
        assert_eq!(skip["decision"], "skip");
        assert_eq!(skip["reason"], "no_supply");
    }

    #[test]
    fn test_evaluator_default_threshold() {
        let evaluator = SettlementEvaluator::default();
        assert_eq!(evaluator.min_fee_bps, DEFAULT_MIN_FEE_BPS);
        assert_eq!(
            evaluator.evaluate(&snapshot()).unwrap(),
            evaluate(&snapshot(), DEFAULT_MIN_FEE_BPS).unwrap()
        );
    }
}
