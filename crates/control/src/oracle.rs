use log::{debug, warn};
use mechanics::TwoLinkArm;
use simcore::{ArmState, JointTorques, QueryVector, TorqueOracle};

use crate::dataset::Dataset;

/// Counters kept by the oracles that can fall back to gravity torque.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OracleStats {
    /// Steps answered by the oracle itself
    pub answered: usize,
    /// Steps that used the gravity fallback
    pub fallbacks: usize,
}

impl OracleStats {
    pub fn total(&self) -> usize {
        self.answered + self.fallbacks
    }
}

/// Gravity torque at the query's current angles.
pub(crate) fn gravity_fallback(arm: &TwoLinkArm, query: &QueryVector) -> JointTorques {
    let (theta1, theta2) = query.current_angles();
    arm.gravitational_torques(theta1, theta2)
}

/// Reuses the torques of the closest recorded transition.
#[derive(Debug, Clone)]
pub struct LocalOracle {
    arm: TwoLinkArm,
    dataset: Dataset,
    stats: OracleStats,
}

impl LocalOracle {
    pub fn new(arm: TwoLinkArm, dataset: Dataset) -> Self {
        if dataset.is_empty() {
            warn!("dataset is empty, using gravitational torques only");
        }
        Self {
            arm,
            dataset,
            stats: OracleStats::default(),
        }
    }

    pub fn stats(&self) -> OracleStats {
        self.stats
    }
}

impl TorqueOracle for LocalOracle {
    fn resolve(&mut self, query: &QueryVector, _state: &ArmState) -> JointTorques {
        match self.dataset.find_nearest(query) {
            Some(found) => {
                debug!(
                    "nearest row {} at distance {:.6}",
                    found.index, found.distance
                );
                self.stats.answered += 1;
                found.entry.torques()
            }
            None => {
                self.stats.fallbacks += 1;
                gravity_fallback(&self.arm, query)
            }
        }
    }
}

/// Applies no torque at all. Baseline for free-swing runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroOracle;

impl TorqueOracle for ZeroOracle {
    fn resolve(&mut self, _query: &QueryVector, _state: &ArmState) -> JointTorques {
        JointTorques::ZERO
    }
}
