// Grid Action module - contains the GridAction enum and its validity rules
use std::borrow::Cow;
use serde::{Serialize, Deserialize};

use crate::error::InvalidAction;
use crate::lifecycle::LifecycleRegistry;
use crate::models::element::{ElementStatus, ElementType};
use crate::models::network::Network;

/// Tag used to request a family of actions when building an action space.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    DoNothing,
    Switch,
    StartMaintenance,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionKind::DoNothing => write!(f, "DO_NOTHING"),
            ActionKind::Switch => write!(f, "SWITCH"),
            ActionKind::StartMaintenance => write!(f, "START_MAINTENANCE"),
        }
    }
}

/// Equality and hashing are defined by (kind, element id).
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum GridAction {
    DoNothing,
    Switch(String),            // Line ID
    StartMaintenance(String),  // Line ID
}

impl std::fmt::Display for GridAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GridAction::DoNothing => {
                write!(f, "DoNothing")
            },
            GridAction::Switch(id) => {
                write!(f, "Switch({})", id)
            },
            GridAction::StartMaintenance(id) => {
                write!(f, "StartMaintenance({})", id)
            },
        }
    }
}

impl GridAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            GridAction::DoNothing => ActionKind::DoNothing,
            GridAction::Switch(_) => ActionKind::Switch,
            GridAction::StartMaintenance(_) => ActionKind::StartMaintenance,
        }
    }

    pub fn element_id(&self) -> Option<&str> {
        match self {
            GridAction::DoNothing => None,
            GridAction::Switch(id) | GridAction::StartMaintenance(id) => Some(id),
        }
    }

    /// Builds the action of `kind` targeting `element_id`, only if it is valid
    /// on `network`. `element_id` is ignored for `DoNothing`.
    pub fn from_network(
        kind: ActionKind,
        network: &Network,
        element_id: &str,
        registry: &LifecycleRegistry,
    ) -> Result<GridAction, InvalidAction> {
        let action = match kind {
            ActionKind::DoNothing => GridAction::DoNothing,
            ActionKind::Switch => GridAction::Switch(element_id.to_string()),
            ActionKind::StartMaintenance => GridAction::StartMaintenance(element_id.to_string()),
        };
        action.validate(network, registry)?;
        Ok(action)
    }

    pub fn validate(&self, network: &Network, registry: &LifecycleRegistry) -> Result<(), InvalidAction> {
        match self {
            GridAction::DoNothing => Ok(()),
            GridAction::Switch(id) => {
                let status = line_status("Switch", network, id)?;
                if status.is_unavailable() {
                    // Elements without a handler can always be switched back
                    if let Some(handler) = registry.get_handler(id) {
                        let remaining = handler.remaining_duration();
                        if remaining > 0 {
                            let element_id = id.clone();
                            return Err(match status {
                                ElementStatus::Maintenance => InvalidAction::UnderMaintenance { element_id, remaining },
                                _ => InvalidAction::UnderOutage { element_id, remaining },
                            });
                        }
                    }
                }
                Ok(())
            },
            GridAction::StartMaintenance(id) => {
                let status = line_status("StartMaintenance", network, id)?;
                if status.is_unavailable() {
                    return Err(InvalidAction::AlreadyUnavailable { element_id: id.clone(), status });
                }
                Ok(())
            },
        }
    }

    /// Applies the action. The input network is never mutated; `DoNothing`
    /// hands it back borrowed, every other action returns a modified copy.
    pub fn execute<'a>(&self, network: &'a Network) -> Cow<'a, Network> {
        match self {
            GridAction::DoNothing => Cow::Borrowed(network),
            GridAction::Switch(id) => {
                let mut next = network.clone();
                if let Some(element) = next.get_element_mut(id) {
                    let toggled = match element.status() {
                        Some(ElementStatus::On) => ElementStatus::Off,
                        _ => ElementStatus::On,
                    };
                    element.set_status(toggled);
                }
                Cow::Owned(next)
            },
            GridAction::StartMaintenance(id) => {
                let mut next = network.clone();
                if let Some(element) = next.get_element_mut(id) {
                    element.set_status(ElementStatus::Maintenance);
                }
                Cow::Owned(next)
            },
        }
    }
}

// Shared checks for line-targeting actions
fn line_status(action: &'static str, network: &Network, element_id: &str) -> Result<ElementStatus, InvalidAction> {
    let element = network
        .get_element(element_id)
        .ok_or_else(|| InvalidAction::ElementNotFound(element_id.to_string()))?;

    if element.element_type() != ElementType::Line {
        return Err(InvalidAction::UnsupportedElementType {
            action,
            element_id: element_id.to_string(),
            element_type: element.element_type(),
        });
    }

    let timestamps = network.list_timestamps().len();
    if timestamps > 1 {
        return Err(InvalidAction::MultiTimestampNetwork(timestamps));
    }

    element
        .status()
        .ok_or_else(|| InvalidAction::ElementNotFound(element_id.to_string()))
}
