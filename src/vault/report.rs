//! JSON report handed to the transaction executor.

use serde::Serialize;
use tracing::warn;

use crate::models::{Address, VaultSnapshot};
use crate::registry::Network;

use super::metrics::VaultMetrics;
use super::settlement::SettlementDecision;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettlementReport {
    pub vault: Address,
    pub network: Network,
    pub caller: Address,
    /// Absent when the snapshot cannot be rendered; the decision still stands.
    pub metrics: Option<VaultMetrics>,
    #[serde(flatten)]
    pub decision: SettlementDecision,
}

impl SettlementReport {
    pub fn new(
        vault: Address,
        network: Network,
        snapshot: &VaultSnapshot,
        decision: SettlementDecision,
    ) -> Self {
        let metrics = match VaultMetrics::from_snapshot(snapshot) {
            Ok(metrics) => Some(metrics),
            Err(e) => {
                warn!(vault = %vault, error = %e, "Vault metrics unavailable");
                None
            }
        };

        Self {
            vault,
            network,
            caller: snapshot.caller,
            metrics,
            decision,
        }
    }
}
