use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::ai::actions::grid_action::GridAction;
use crate::core::action_space::ActionSpace;
use crate::observation::network_observation::NetworkObservation;

/// Chooses an action-space index from the latest observation history.
pub trait Agent {
    fn name(&self) -> &str;

    fn choose(&mut self, observation: &NetworkObservation, action_space: &ActionSpace) -> usize;

    fn reset(&mut self) {}
}

/// Always picks `DoNothing`, falling back to index 0 when the space lacks it.
#[derive(Debug, Clone, Default)]
pub struct DoNothingAgent;

impl Agent for DoNothingAgent {
    fn name(&self) -> &str {
        "do-nothing"
    }

    fn choose(&mut self, _observation: &NetworkObservation, action_space: &ActionSpace) -> usize {
        action_space.index_of(&GridAction::DoNothing).unwrap_or(0)
    }
}

/// Uniform choice over the valid actions with its own seeded stream.
#[derive(Debug, Clone)]
pub struct RandomAgent {
    seed: u64,
    rng: StdRng,
}

impl RandomAgent {
    pub fn new(seed: u64) -> Self {
        Self { seed, rng: StdRng::seed_from_u64(seed) }
    }
}

impl Agent for RandomAgent {
    fn name(&self) -> &str {
        "random"
    }

    fn choose(&mut self, _observation: &NetworkObservation, action_space: &ActionSpace) -> usize {
        if action_space.is_empty() {
            return 0;
        }
        self.rng.gen_range(0..action_space.len())
    }

    fn reset(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
    }
}
