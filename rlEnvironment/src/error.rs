// Error types shared across the environment
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::element::{ElementStatus, ElementType};

/// Reason an action cannot be applied to a network snapshot.
///
/// Validation returns this as a value; the action space buckets the
/// offending candidate as invalid instead of propagating it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidAction {
    #[error("element {0} does not exist in the network state")]
    ElementNotFound(String),
    #[error("{action} only applies to LINE elements, {element_id} is {element_type}")]
    UnsupportedElementType {
        action: &'static str,
        element_id: String,
        element_type: ElementType,
    },
    #[error("action can only apply to a single timestamp network, found {0} timestamps")]
    MultiTimestampNetwork(usize),
    #[error("element {element_id} is still under maintenance ({remaining} steps left)")]
    UnderMaintenance { element_id: String, remaining: u32 },
    #[error("element {element_id} is still under outage ({remaining} steps left)")]
    UnderOutage { element_id: String, remaining: u32 },
    #[error("element {element_id} is already {status}")]
    AlreadyUnavailable { element_id: String, status: ElementStatus },
}

/// Construction-time invariant violations. These are fatal and surface
/// during environment setup, never while stepping.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("duplicate id/timestamp pair found: id={id}, timestamp={timestamp}")]
    DuplicateElement { id: String, timestamp: DateTime<Utc> },
    #[error("some actions in the list are duplicated: {0}")]
    DuplicateAction(String),
    #[error("can't have more than one timestamp for an action space, found {0}")]
    MultiTimestampActionSpace(usize),
    #[error("duplicate lifecycle handler for element {0}")]
    DuplicateHandler(String),
    #[error("lifecycle handler can't cover element {element_id} of type {element_type}")]
    UncoveredElementType {
        element_id: String,
        element_type: ElementType,
    },
    #[error("element {element_id} at {timestamp} is missing from the next timestamp template")]
    MissingTemplateElement {
        element_id: String,
        timestamp: DateTime<Utc>,
    },
    #[error("network {network_id} needs at least two timestamps, found {found}")]
    NotEnoughTimestamps { network_id: String, found: usize },
    #[error("network {0} not found")]
    NetworkNotFound(String),
    #[error("network {0} is empty")]
    EmptyNetwork(String),
    #[error("simulation needs a single-timestamp network, {network_id} has {found} timestamps")]
    MultiTimestampSimulation { network_id: String, found: usize },
    #[error("element {element_id} has no {parameter} to simulate")]
    UnsupportedParameter { element_id: String, parameter: String },
    #[error("category {value} is not part of the {mapping} one-hot universe")]
    UnknownCategory { mapping: &'static str, value: String },
    #[error("element {0} can't be observed before it is solved")]
    UnsolvedElement(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to read network data: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse network data: {0}")]
    Json(#[from] serde_json::Error),
}

/// Contract violations of the reset/step loop.
#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("the environment must be reset before taking actions")]
    NotReset,
    #[error("the episode has terminated, call reset before stepping again")]
    AlreadyTerminated,
    #[error("action {0} is not part of the valid action space")]
    ActionNotInSpace(String),
    #[error("action index {index} out of range for an action space of size {size}")]
    IndexOutOfRange { index: usize, size: usize },
    #[error("action is not applicable to the current state: {0}")]
    InvalidAction(#[from] InvalidAction),
    #[error(transparent)]
    Grid(#[from] GridError),
}
