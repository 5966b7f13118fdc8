// Agent-facing side of the environment
// Actions the agent can take and the agents choosing them

pub mod actions {
    pub mod grid_action;
}

pub mod agent;

// Re-export common types for convenience
pub use actions::grid_action::{ActionKind, GridAction};
pub use agent::{Agent, DoNothingAgent, RandomAgent};
