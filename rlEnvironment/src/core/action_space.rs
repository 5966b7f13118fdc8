use std::collections::HashSet;
use tracing::{debug, info};

use crate::ai::actions::grid_action::{ActionKind, GridAction};
use crate::error::{GridError, InvalidAction};
use crate::lifecycle::LifecycleRegistry;
use crate::models::network::Network;
use crate::utils::logging::{self, OperationCategory};

/// Candidate moves for one network snapshot, split into valid and invalid.
///
/// The index over `valid_actions` is what a discrete policy acts on. Build it
/// once per episode from a representative snapshot so its width stays fixed.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionSpace {
    valid_actions: Vec<GridAction>,
    invalid_actions: Vec<(GridAction, InvalidAction)>,
}

impl ActionSpace {
    /// One `DoNothing` if requested, plus one action per element for each
    /// requested element-targeting kind.
    pub fn from_action_kinds(
        kinds: &[ActionKind],
        network: &Network,
        registry: &LifecycleRegistry,
    ) -> Result<Self, GridError> {
        let mut candidates = Vec::new();
        if kinds.contains(&ActionKind::DoNothing) {
            candidates.push(GridAction::DoNothing);
        }
        for kind in kinds {
            match kind {
                ActionKind::DoNothing => {},
                ActionKind::Switch => {
                    candidates.extend(network.elements().iter().map(|e| GridAction::Switch(e.id.clone())));
                },
                ActionKind::StartMaintenance => {
                    candidates.extend(network.elements().iter().map(|e| GridAction::StartMaintenance(e.id.clone())));
                },
            }
        }
        Self::from_actions(candidates, network, registry)
    }

    pub fn from_actions(
        actions: Vec<GridAction>,
        network: &Network,
        registry: &LifecycleRegistry,
    ) -> Result<Self, GridError> {
        let _timing = logging::start_timing("ActionSpace::from_actions", OperationCategory::ActionSpace);

        let timestamps = network.list_timestamps().len();
        if timestamps > 1 {
            return Err(GridError::MultiTimestampActionSpace(timestamps));
        }

        let mut seen = HashSet::with_capacity(actions.len());
        for action in &actions {
            if !seen.insert(action) {
                return Err(GridError::DuplicateAction(action.to_string()));
            }
        }

        let mut valid_actions = Vec::new();
        let mut invalid_actions = Vec::new();
        for action in actions {
            match action.validate(network, registry) {
                Ok(()) => valid_actions.push(action),
                Err(reason) => {
                    debug!(action = %action, reason = %reason, "candidate action rejected");
                    invalid_actions.push((action, reason));
                },
            }
        }

        info!(
            network_id = %network.id,
            valid = valid_actions.len(),
            invalid = invalid_actions.len(),
            "action space built"
        );
        Ok(Self { valid_actions, invalid_actions })
    }

    pub fn get(&self, index: usize) -> Option<&GridAction> {
        self.valid_actions.get(index)
    }

    pub fn index_of(&self, action: &GridAction) -> Option<usize> {
        self.valid_actions.iter().position(|a| a == action)
    }

    pub fn contains(&self, action: &GridAction) -> bool {
        self.valid_actions.contains(action)
    }

    /// Number of valid actions.
    pub fn len(&self) -> usize {
        self.valid_actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.valid_actions.is_empty()
    }

    pub fn valid_actions(&self) -> &[GridAction] {
        &self.valid_actions
    }

    pub fn invalid_actions(&self) -> impl Iterator<Item = &GridAction> {
        self.invalid_actions.iter().map(|(action, _)| action)
    }

    /// Invalid candidates with the reason each one was rejected.
    pub fn rejections(&self) -> &[(GridAction, InvalidAction)] {
        &self.invalid_actions
    }
}
