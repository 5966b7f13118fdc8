use chrono::{DateTime, Utc};

use crate::error::GridError;
use crate::lifecycle::LifecycleRegistry;
use crate::models::network::Network;
use crate::observation::element_observation::ElementObservation;
use crate::observation::network_observation::NetworkSnapshotObservation;
use crate::utils::logging::{self, OperationCategory};
use crate::utils::traits::ObservationBuilder;

/// Observes lines, loads and generators at one timestamp. Lines carry their
/// lifecycle outage probability when a handler manages them.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotObservationBuilder;

impl ObservationBuilder for SnapshotObservationBuilder {
    fn from_network(
        &self,
        network: &Network,
        timestamp: DateTime<Utc>,
        registry: &LifecycleRegistry,
    ) -> Result<NetworkSnapshotObservation, GridError> {
        let _timing = logging::start_timing("SnapshotObservationBuilder::from_network", OperationCategory::Observation);

        let mut observations = Vec::new();
        for element in network.elements().iter().filter(|e| e.timestamp == timestamp) {
            let probability = registry.get_handler(&element.id).map(|h| h.outage_probability());
            if let Some(observation) = ElementObservation::from_element(element, probability)? {
                observations.push(observation);
            }
        }
        Ok(NetworkSnapshotObservation::new(timestamp, observations))
    }
}
