// Main module declarations for the grid RL environment
#[macro_use]
extern crate lazy_static;

pub mod error;

// Core environment modules
pub mod core {
    pub mod action_space;
    pub mod transition;
    pub mod environment;
    pub mod rollout;
}

// Agent-facing components
pub mod ai;

// Element lifecycle (outages and maintenance)
pub mod lifecycle {
    pub mod handler;
    pub mod registry;

    pub use self::handler::{ElementLifecycleHandler, Granularity, LifecycleEvent, LifecycleState, OutageType};
    pub use self::registry::LifecycleRegistry;
}

// Configuration modules
pub mod config {
    pub mod constants;
    pub mod environment_config;
}

// Model definitions
pub mod models {
    pub mod element;
    pub mod network;
}

// Observation building
pub mod observation {
    pub mod element_observation;
    pub mod network_observation;
    pub mod one_hot_map;
    pub mod builder;
}

pub mod reward;
pub mod solver;

// Data loaders
pub mod data {
    pub mod network_loader;
}

// Synthetic timelines from a static snapshot
pub mod simulation {
    pub mod generators;
    pub mod pipeline;
}

// Utility functions
pub mod utils {
    pub mod logging;
    pub mod csv_export;
    pub mod traits;
}

// CLI interface
pub mod cli {
    pub mod cli;
}

// Re-export commonly used types
pub use crate::ai::actions::grid_action::{ActionKind, GridAction};
pub use crate::core::action_space::ActionSpace;
pub use crate::core::environment::{make_env, NetworkEnvironment, StepResult};
pub use crate::error::{EnvironmentError, GridError, InvalidAction};
pub use crate::models::element::{Element, ElementStatus, ElementType};
pub use crate::models::network::Network;
