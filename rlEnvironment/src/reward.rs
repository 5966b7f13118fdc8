// Reward components computed from a solved snapshot
use serde::{Deserialize, Serialize};

use crate::config::constants::LINE_OVERLOAD_PENALTY;
use crate::config::environment_config::RewardWeight;
use crate::models::element::{BranchSide, ConstraintType, ElementStatus};
use crate::observation::element_observation::ElementObservation;
use crate::observation::network_observation::NetworkSnapshotObservation;
use crate::utils::traits::RewardAggregator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RewardKind {
    LineOverload,
    MinimalUsage,
    LoadMatching,
}

impl RewardKind {
    pub fn compute(&self, snapshot: &NetworkSnapshotObservation) -> f64 {
        match self {
            RewardKind::LineOverload => line_overload(snapshot),
            RewardKind::MinimalUsage => minimal_usage(snapshot),
            RewardKind::LoadMatching => load_matching(snapshot),
        }
    }
}

/// Penalises every ON line whose flow exceeds an active-power limit on side TWO.
pub fn line_overload(snapshot: &NetworkSnapshotObservation) -> f64 {
    let mut total = 0.0;
    for observation in snapshot.observations() {
        let ElementObservation::Line(line) = observation else {
            continue;
        };
        if line.status != ElementStatus::On {
            continue;
        }
        for constraint in &line.operational_constraints {
            if constraint.constraint_type == ConstraintType::ActivePower
                && constraint.side == BranchSide::Two
                && (line.p1.abs() > constraint.value || line.p2.abs() > constraint.value)
            {
                total -= LINE_OVERLOAD_PENALTY;
            }
        }
    }
    total
}

/// Squared count of observed elements left unused.
pub fn minimal_usage(snapshot: &NetworkSnapshotObservation) -> f64 {
    let total = snapshot.len();
    let used = snapshot.observations().iter().filter(|o| o.status() == ElementStatus::On).count();
    ((total - used) as f64).powi(2)
}

pub fn load_matching(snapshot: &NetworkSnapshotObservation) -> f64 {
    -snapshot.loads().map(|l| l.uncovered_load()).sum::<f64>()
}

/// Weighted sum of reward components.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearRewardAggregator {
    components: Vec<RewardWeight>,
}

impl LinearRewardAggregator {
    pub fn new(components: Vec<RewardWeight>) -> Self {
        Self { components }
    }
}

impl RewardAggregator for LinearRewardAggregator {
    fn compute_reward(&self, snapshot: &NetworkSnapshotObservation) -> f64 {
        self.components
            .iter()
            .map(|c| c.weight * c.kind.compute(snapshot))
            .sum()
    }
}
