// Seams to the collaborators the environment drives but does not own
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;

use crate::error::GridError;
use crate::lifecycle::LifecycleRegistry;
use crate::models::element::LoadFlowType;
use crate::models::network::Network;
use crate::observation::network_observation::NetworkSnapshotObservation;

/// Solves a single-timestamp network. Blocking; convergence failures are
/// not modelled beyond the returned error.
pub trait LoadFlowSolver {
    fn solve(&self, network: &Network, loadflow_type: LoadFlowType) -> Result<Network, GridError>;
}

/// Source of the full multi-timestamp network, used at setup only.
pub trait NetworkRepository {
    fn get(&self, network_id: &str) -> Result<Network, GridError>;
}

pub trait RewardAggregator {
    fn compute_reward(&self, snapshot: &NetworkSnapshotObservation) -> f64;
}

pub trait ObservationBuilder {
    fn from_network(
        &self,
        network: &Network,
        timestamp: DateTime<Utc>,
        registry: &LifecycleRegistry,
    ) -> Result<NetworkSnapshotObservation, GridError>;
}

/// One stage of a time-series pipeline: maps the series built so far to
/// the next one. Deterministic stages ignore `rng`.
pub trait SeriesGenerator {
    fn generate(&self, base: &[f64], rng: &mut StdRng) -> Result<Vec<f64>, GridError>;
}
