use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::constants::{
    DAILY_SAMPLING_CADENCE, DEFAULT_SEED, HOURLY_SAMPLING_CADENCE, LONG_TERM_DURATION,
    LONG_TERM_OUTAGE_WEIGHT, MID_TERM_DURATION, MID_TERM_OUTAGE_WEIGHT, SHORT_TERM_DURATION,
    SHORT_TERM_OUTAGE_WEIGHT, WEEKLY_SAMPLING_CADENCE,
};
use crate::config::environment_config::ElementLifecycleConfig;
use crate::error::GridError;
use crate::models::element::{Element, ElementStatus, ElementType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Granularity {
    Hour,
    Day,
    Week,
}

impl Granularity {
    /// Usage steps between two outage draws.
    pub fn cadence(&self) -> u32 {
        match self {
            Granularity::Hour => HOURLY_SAMPLING_CADENCE,
            Granularity::Day => DAILY_SAMPLING_CADENCE,
            Granularity::Week => WEEKLY_SAMPLING_CADENCE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutageType {
    ShortTerm,
    MidTerm,
    LongTerm,
}

impl OutageType {
    pub const ALL: [OutageType; 3] = [OutageType::ShortTerm, OutageType::MidTerm, OutageType::LongTerm];

    pub fn weight(&self) -> f64 {
        match self {
            OutageType::ShortTerm => SHORT_TERM_OUTAGE_WEIGHT,
            OutageType::MidTerm => MID_TERM_OUTAGE_WEIGHT,
            OutageType::LongTerm => LONG_TERM_OUTAGE_WEIGHT,
        }
    }

    /// Duration bucket as `(lower, upper)`, upper exclusive.
    pub fn duration_range(&self) -> (u32, u32) {
        match self {
            OutageType::ShortTerm => SHORT_TERM_DURATION,
            OutageType::MidTerm => MID_TERM_DURATION,
            OutageType::LongTerm => LONG_TERM_DURATION,
        }
    }
}

/// Something that happened to an element during one lifecycle tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LifecycleEvent {
    UsageAccrued { lambda_factor: f64 },
    OutageSampled { outage_type: OutageType, duration: u32 },
    DurationElapsed,
    MaintenanceStarted { duration: u32 },
    OperationalStatusChanged(ElementStatus),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LifecycleState {
    pub status: ElementStatus,
    pub outage_probability: f64,
    pub usage_time: u32,
    pub remaining_duration: u32,
    pub outage_type: Option<OutageType>,
}

impl LifecycleState {
    fn back_in_service(self) -> LifecycleState {
        LifecycleState {
            status: ElementStatus::On,
            outage_probability: 0.0,
            usage_time: 0,
            remaining_duration: 0,
            outage_type: None,
        }
    }

    /// Pure transition function. Events that don't apply to the current
    /// status leave the state untouched.
    pub fn apply(&self, event: LifecycleEvent) -> LifecycleState {
        let state = *self;
        match event {
            LifecycleEvent::UsageAccrued { lambda_factor } => {
                if state.status != ElementStatus::On {
                    return state;
                }
                let usage_time = state.usage_time.saturating_add(1);
                LifecycleState {
                    usage_time,
                    outage_probability: (lambda_factor * usage_time as f64).clamp(0.0, 1.0),
                    ..state
                }
            },
            LifecycleEvent::OutageSampled { outage_type, duration } => {
                if state.status != ElementStatus::On {
                    return state;
                }
                LifecycleState {
                    status: ElementStatus::Outage,
                    outage_probability: 0.0,
                    remaining_duration: duration,
                    outage_type: Some(outage_type),
                    ..state
                }
            },
            LifecycleEvent::DurationElapsed => {
                if !state.status.is_unavailable() {
                    return state;
                }
                let remaining_duration = state.remaining_duration.saturating_sub(1);
                if remaining_duration == 0 {
                    state.back_in_service()
                } else {
                    LifecycleState { remaining_duration, ..state }
                }
            },
            LifecycleEvent::MaintenanceStarted { duration } => {
                if state.status != ElementStatus::On {
                    return state;
                }
                LifecycleState {
                    status: ElementStatus::Maintenance,
                    outage_probability: 0.0,
                    usage_time: 0,
                    remaining_duration: duration,
                    outage_type: None,
                }
            },
            LifecycleEvent::OperationalStatusChanged(status) => match status {
                ElementStatus::On | ElementStatus::Off => {
                    if state.status.is_unavailable() {
                        LifecycleState { status, ..state.back_in_service() }
                    } else {
                        LifecycleState { status, ..state }
                    }
                },
                // Outage and maintenance have dedicated events
                ElementStatus::Outage | ElementStatus::Maintenance => state,
            },
        }
    }
}

/// Stochastic ON/OFF/OUTAGE/MAINTENANCE state machine for one element.
#[derive(Debug, Clone)]
pub struct ElementLifecycleHandler {
    element_id: String,
    element_type: ElementType,
    lambda_factor: f64,
    granularity: Granularity,
    maintenance_duration: u32,
    seed: u64,
    rng: StdRng,
    initial: LifecycleState,
    state: LifecycleState,
}

impl ElementLifecycleHandler {
    pub fn new(
        element: &Element,
        config: &ElementLifecycleConfig,
        granularity: Granularity,
        maintenance_duration: u32,
    ) -> Result<Self, GridError> {
        let status = element.status().ok_or_else(|| GridError::UncoveredElementType {
            element_id: element.id.clone(),
            element_type: element.element_type(),
        })?;

        let initial = LifecycleState {
            status,
            outage_probability: config.initial_outage_probability.clamp(0.0, 1.0),
            usage_time: config.initial_usage_time,
            // A duration only makes sense when starting out of service
            remaining_duration: if status == ElementStatus::Outage {
                config.initial_remaining_duration
            } else {
                0
            },
            outage_type: None,
        };
        let seed = config.seed.unwrap_or(DEFAULT_SEED);

        Ok(Self {
            element_id: element.id.clone(),
            element_type: element.element_type(),
            lambda_factor: config.lambda_factor,
            granularity,
            maintenance_duration,
            seed,
            rng: StdRng::seed_from_u64(seed),
            initial,
            state: initial,
        })
    }

    pub fn element_id(&self) -> &str {
        &self.element_id
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    pub fn state(&self) -> &LifecycleState {
        &self.state
    }

    pub fn status(&self) -> ElementStatus {
        self.state.status
    }

    pub fn outage_probability(&self) -> f64 {
        self.state.outage_probability
    }

    pub fn usage_time(&self) -> u32 {
        self.state.usage_time
    }

    pub fn remaining_duration(&self) -> u32 {
        self.state.remaining_duration
    }

    pub fn outage_type(&self) -> Option<OutageType> {
        self.state.outage_type
    }

    /// Advances the element by one granularity unit.
    pub fn step(&mut self) {
        let previous = self.state.status;
        let mut state = self.state.apply(LifecycleEvent::UsageAccrued { lambda_factor: self.lambda_factor });

        if state.status == ElementStatus::On && state.usage_time % self.granularity.cadence() == 0 {
            let draw: f64 = self.rng.gen();
            if draw < state.outage_probability {
                let (outage_type, duration) = self.sample_outage();
                state = state.apply(LifecycleEvent::OutageSampled { outage_type, duration });
                debug!(
                    element_id = %self.element_id,
                    outage_type = ?outage_type,
                    duration,
                    "unplanned outage sampled"
                );
            }
        }

        // Decrement also applies in the step an outage was sampled
        state = state.apply(LifecycleEvent::DurationElapsed);

        if previous.is_unavailable() && state.status == ElementStatus::On {
            debug!(element_id = %self.element_id, from = %previous, "element back in service");
        }
        self.state = state;
    }

    fn sample_outage(&mut self) -> (OutageType, u32) {
        let weights = OutageType::ALL.map(|t| t.weight());
        let outage_type = match WeightedIndex::new(weights) {
            Ok(distribution) => OutageType::ALL[distribution.sample(&mut self.rng)],
            Err(_) => OutageType::ShortTerm,
        };
        let (lower, upper) = outage_type.duration_range();
        (outage_type, self.rng.gen_range(lower..upper))
    }

    /// Starts planned maintenance. Only an ON element can enter maintenance,
    /// any other status leaves the handler unchanged.
    pub fn send_to_maintenance(&mut self) {
        let next = self.state.apply(LifecycleEvent::MaintenanceStarted { duration: self.maintenance_duration });
        if next != self.state {
            debug!(element_id = %self.element_id, duration = self.maintenance_duration, "maintenance started");
        }
        self.state = next;
    }

    /// Mirrors an operator ON/OFF switch into the handler.
    pub fn sync_operational_status(&mut self, status: ElementStatus) {
        self.state = self.state.apply(LifecycleEvent::OperationalStatusChanged(status));
    }

    /// Restores construction-time values and restarts the random stream.
    pub fn reset(&mut self) {
        self.state = self.initial;
        self.rng = StdRng::seed_from_u64(self.seed);
    }
}
