use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::ai::actions::grid_action::GridAction;
use crate::config::constants::MIN_EPISODE_TIMESTAMPS;
use crate::config::environment_config::EnvironmentConfig;
use crate::core::action_space::ActionSpace;
use crate::core::transition::build_next_network;
use crate::error::{EnvironmentError, GridError};
use crate::lifecycle::LifecycleRegistry;
use crate::models::element::{ElementStatus, LoadFlowType};
use crate::models::network::Network;
use crate::observation::builder::SnapshotObservationBuilder;
use crate::observation::network_observation::NetworkObservation;
use crate::observation::one_hot_map::OneHotMap;
use crate::reward::LinearRewardAggregator;
use crate::utils::logging::{self, OperationCategory};
use crate::utils::traits::{LoadFlowSolver, NetworkRepository, ObservationBuilder, RewardAggregator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EpisodeState {
    NotReset,
    Ready,
    Terminated,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepInfo {
    pub step: usize,
    pub timestamp: DateTime<Utc>,
    pub action: Option<GridAction>,
    pub cumulative_reward: f64,
    pub elements_in_outage: Vec<String>,
    pub elements_in_maintenance: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepResult {
    pub observation: NetworkObservation,
    pub reward: f64,
    pub terminated: bool,
    pub info: StepInfo,
}

/// Reset/step loop over one multi-timestamp network.
///
/// The environment owns its current network and lifecycle registry. The
/// solved first snapshot and its observation are kept as templates and
/// copied on every reset.
pub struct NetworkEnvironment {
    templates: Vec<Network>,
    timestamps: Vec<DateTime<Utc>>,
    initial_network: Network,
    initial_observation: NetworkObservation,
    current_network: Network,
    current_index: usize,
    observation: NetworkObservation,
    registry: LifecycleRegistry,
    action_space: ActionSpace,
    one_hot_map: OneHotMap,
    loadflow_type: LoadFlowType,
    solver: Box<dyn LoadFlowSolver>,
    observation_builder: Box<dyn ObservationBuilder>,
    reward_aggregator: Box<dyn RewardAggregator>,
    state: EpisodeState,
    step_count: usize,
    cumulative_reward: f64,
}

impl NetworkEnvironment {
    pub fn new(
        network: &Network,
        config: &EnvironmentConfig,
        solver: Box<dyn LoadFlowSolver>,
        observation_builder: Box<dyn ObservationBuilder>,
        reward_aggregator: Box<dyn RewardAggregator>,
    ) -> Result<Self, GridError> {
        config.validate()?;

        let timestamps = network.list_timestamps();
        if timestamps.len() < MIN_EPISODE_TIMESTAMPS {
            return Err(GridError::NotEnoughTimestamps {
                network_id: network.id.clone(),
                found: timestamps.len(),
            });
        }
        let templates: Vec<Network> = timestamps.iter().map(|&ts| network.timestamp_network(ts)).collect();

        let initial_network = {
            let _timing = logging::start_timing("NetworkEnvironment::initial_solve", OperationCategory::LoadFlow);
            solver.solve(&templates[0], config.loadflow_type)?
        };
        let registry = LifecycleRegistry::from_network(&initial_network, &config.lifecycle, config.granularity)?;
        // Built once so the index width is fixed for the whole episode
        let action_space = ActionSpace::from_action_kinds(&config.action_kinds, &initial_network, &registry)?;
        let snapshot = observation_builder.from_network(&initial_network, timestamps[0], &registry)?;
        let one_hot_map = OneHotMap::from_snapshot(&snapshot);
        let initial_observation = NetworkObservation::new(config.observation_history_length, snapshot);

        info!(
            network_id = %network.id,
            timestamps = timestamps.len(),
            actions = action_space.len(),
            managed_elements = registry.len(),
            "environment created"
        );

        Ok(Self {
            templates,
            timestamps,
            current_network: initial_network.clone(),
            initial_network,
            observation: initial_observation.clone(),
            initial_observation,
            current_index: 0,
            registry,
            action_space,
            one_hot_map,
            loadflow_type: config.loadflow_type,
            solver,
            observation_builder,
            reward_aggregator,
            state: EpisodeState::NotReset,
            step_count: 0,
            cumulative_reward: 0.0,
        })
    }

    pub fn reset(&mut self) -> (NetworkObservation, StepInfo) {
        self.current_network = self.initial_network.clone();
        self.observation = self.initial_observation.clone();
        self.current_index = 0;
        self.registry.reset();
        self.step_count = 0;
        self.cumulative_reward = 0.0;
        self.state = EpisodeState::Ready;

        debug!(network_id = %self.initial_network.id, "environment reset");
        (self.observation.clone(), self.info(None))
    }

    pub fn step(&mut self, action: &GridAction) -> Result<StepResult, EnvironmentError> {
        match self.state {
            EpisodeState::NotReset => return Err(EnvironmentError::NotReset),
            EpisodeState::Terminated => return Err(EnvironmentError::AlreadyTerminated),
            EpisodeState::Ready => {},
        }
        if !self.action_space.contains(action) {
            return Err(EnvironmentError::ActionNotInSpace(action.to_string()));
        }
        // The space is built once, lifecycle state moves on every step
        action.validate(&self.current_network, &self.registry)?;

        let _timing = logging::start_timing("NetworkEnvironment::step", OperationCategory::Simulation);

        let next_index = self.current_index + 1;
        let next_timestamp = self.timestamps[next_index];
        let transitioned = build_next_network(
            &self.current_network,
            &self.templates[next_index],
            action,
            &mut self.registry,
        )?;

        let solved = {
            let _timing = logging::start_timing("LoadFlowSolver::solve", OperationCategory::LoadFlow);
            self.solver.solve(&transitioned, self.loadflow_type)?
        };
        let snapshot = self.observation_builder.from_network(&solved, next_timestamp, &self.registry)?;
        let reward = self.reward_aggregator.compute_reward(&snapshot);

        self.observation.push(snapshot);
        self.current_network = solved;
        self.current_index = next_index;
        self.step_count += 1;
        self.cumulative_reward += reward;

        let terminated = next_index == self.timestamps.len() - 1;
        if terminated {
            self.state = EpisodeState::Terminated;
            info!(steps = self.step_count, cumulative_reward = self.cumulative_reward, "episode terminated");
        }
        debug!(step = self.step_count, action = %action, reward, "environment stepped");

        Ok(StepResult {
            observation: self.observation.clone(),
            reward,
            terminated,
            info: self.info(Some(action.clone())),
        })
    }

    /// Steps with the action at `index` in the action space.
    pub fn step_index(&mut self, index: usize) -> Result<StepResult, EnvironmentError> {
        let action = self
            .action_space
            .get(index)
            .cloned()
            .ok_or(EnvironmentError::IndexOutOfRange { index, size: self.action_space.len() })?;
        self.step(&action)
    }

    fn info(&self, action: Option<GridAction>) -> StepInfo {
        let with_status = |status: ElementStatus| -> Vec<String> {
            self.current_network
                .elements()
                .iter()
                .filter(|e| e.status() == Some(status))
                .map(|e| e.id.clone())
                .collect()
        };
        StepInfo {
            step: self.step_count,
            timestamp: self.timestamps[self.current_index],
            action,
            cumulative_reward: self.cumulative_reward,
            elements_in_outage: with_status(ElementStatus::Outage),
            elements_in_maintenance: with_status(ElementStatus::Maintenance),
        }
    }

    pub fn state(&self) -> EpisodeState {
        self.state
    }

    pub fn is_terminated(&self) -> bool {
        self.state == EpisodeState::Terminated
    }

    pub fn action_space(&self) -> &ActionSpace {
        &self.action_space
    }

    pub fn registry(&self) -> &LifecycleRegistry {
        &self.registry
    }

    pub fn current_network(&self) -> &Network {
        &self.current_network
    }

    pub fn current_timestamp(&self) -> DateTime<Utc> {
        self.timestamps[self.current_index]
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn observation(&self) -> &NetworkObservation {
        &self.observation
    }

    pub fn one_hot_map(&self) -> &OneHotMap {
        &self.one_hot_map
    }

    /// Current observation history flattened with the episode's one-hot map.
    pub fn observation_array(&self) -> Result<Vec<f64>, GridError> {
        self.observation.to_array(&self.one_hot_map)
    }

    pub fn cumulative_reward(&self) -> f64 {
        self.cumulative_reward
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }
}

/// Fetches `config.network_id` from the repository and wires the default
/// observation builder and the configured reward weights around `solver`.
pub fn make_env(
    config: &EnvironmentConfig,
    repository: &dyn NetworkRepository,
    solver: Box<dyn LoadFlowSolver>,
) -> Result<NetworkEnvironment, GridError> {
    let network = repository.get(&config.network_id)?;
    NetworkEnvironment::new(
        &network,
        config,
        solver,
        Box::new(SnapshotObservationBuilder),
        Box::new(LinearRewardAggregator::new(config.rewards.clone())),
    )
}
