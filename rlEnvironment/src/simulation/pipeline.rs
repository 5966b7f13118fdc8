use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::constants::{
    DEFAULT_SEED, DEFAULT_TIME_STEP_HOURS, SIMULATED_NETWORK_SUFFIX, SIMULATED_VALUE_DECIMALS,
};
use crate::error::GridError;
use crate::models::element::{Element, ElementAttributes, GeneratorDynamic, LoadDynamic};
use crate::models::network::Network;
use crate::simulation::generators::{run_steps, SeriesStep};
use crate::utils::logging::{self, OperationCategory};

/// Dynamic attribute a pipeline can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DynamicParameter {
    Pd,
    Qd,
    TargetP,
    TargetV,
    TargetQ,
    RatedS,
}

impl fmt::Display for DynamicParameter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DynamicParameter::Pd => write!(f, "pd"),
            DynamicParameter::Qd => write!(f, "qd"),
            DynamicParameter::TargetP => write!(f, "target_p"),
            DynamicParameter::TargetV => write!(f, "target_v"),
            DynamicParameter::TargetQ => write!(f, "target_q"),
            DynamicParameter::RatedS => write!(f, "rated_s"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSeries {
    pub steps: Vec<SeriesStep>,
}

/// Pipelines for one generator or load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSimulationConfig {
    pub id: String,
    pub parameters: BTreeMap<DynamicParameter, ParameterSeries>,
}

/// Expands a single-timestamp snapshot into an hourly timeline over
/// `[start, end)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub network_id: String,
    #[serde(default)]
    pub simulated_network_id: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default = "default_time_step")]
    pub time_step_hours: u32,
    #[serde(default)]
    pub seed: Option<u64>,
    pub elements: Vec<ElementSimulationConfig>,
}

fn default_time_step() -> u32 {
    DEFAULT_TIME_STEP_HOURS
}

impl SimulationConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, GridError> {
        let raw = fs::read_to_string(path)?;
        let config: SimulationConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), GridError> {
        if self.time_step_hours == 0 {
            return Err(GridError::Config("time_step_hours must be at least 1".to_string()));
        }
        if self.end <= self.start {
            return Err(GridError::Config(format!("simulation end {} is not after start {}", self.end, self.start)));
        }
        let mut seen = HashSet::new();
        for element in &self.elements {
            if !seen.insert(element.id.as_str()) {
                return Err(GridError::Config(format!("element {} is configured more than once", element.id)));
            }
        }
        Ok(())
    }

    pub fn output_network_id(&self) -> String {
        self.simulated_network_id
            .clone()
            .unwrap_or_else(|| format!("{}{}", self.network_id, SIMULATED_NETWORK_SUFFIX))
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        let step = Duration::hours(i64::from(self.time_step_hours));
        let mut timestamps = Vec::new();
        let mut current = self.start;
        while current < self.end {
            timestamps.push(current);
            current += step;
        }
        timestamps
    }
}

fn round(value: f64) -> f64 {
    let factor = 10f64.powi(SIMULATED_VALUE_DECIMALS);
    (value * factor).round() / factor
}

fn unsupported(element: &Element, parameter: DynamicParameter) -> GridError {
    GridError::UnsupportedParameter {
        element_id: element.id.clone(),
        parameter: parameter.to_string(),
    }
}

fn set_dynamic(element: &mut Element, parameter: DynamicParameter, value: f64) -> Result<(), GridError> {
    let rejected = unsupported(element, parameter);
    match &mut element.metadata {
        ElementAttributes::Load(attrs) => {
            let dynamic = attrs.dynamic.get_or_insert(LoadDynamic { pd: 0.0, qd: 0.0 });
            match parameter {
                DynamicParameter::Pd => dynamic.pd = value,
                DynamicParameter::Qd => dynamic.qd = value,
                _ => return Err(rejected),
            }
        },
        ElementAttributes::Generator(attrs) => {
            let dynamic = attrs.dynamic.get_or_insert(GeneratorDynamic {
                target_p: 0.0,
                target_v: 0.0,
                target_q: None,
                rated_s: None,
            });
            match parameter {
                DynamicParameter::TargetP => dynamic.target_p = value,
                DynamicParameter::TargetV => dynamic.target_v = value,
                DynamicParameter::TargetQ => dynamic.target_q = Some(value),
                DynamicParameter::RatedS => dynamic.rated_s = Some(value),
                _ => return Err(rejected),
            }
        },
        _ => return Err(rejected),
    }
    Ok(())
}

/// Builds the simulated network. Generators and loads need an entry in
/// `config.elements`; parameters without a pipeline keep their snapshot
/// value. Every other element is repeated unchanged at each timestamp.
pub fn simulate_network(snapshot: &Network, config: &SimulationConfig) -> Result<Network, GridError> {
    let _timing = logging::start_timing("simulate_network", OperationCategory::Simulation);
    config.validate()?;

    if snapshot.is_empty() {
        return Err(GridError::EmptyNetwork(snapshot.id.clone()));
    }
    let found = snapshot.list_timestamps().len();
    if found != 1 {
        return Err(GridError::MultiTimestampSimulation { network_id: snapshot.id.clone(), found });
    }

    let timestamps = config.timestamps();
    let pipelines: HashMap<&str, &ElementSimulationConfig> =
        config.elements.iter().map(|e| (e.id.as_str(), e)).collect();
    let mut rng = StdRng::seed_from_u64(config.seed.unwrap_or(DEFAULT_SEED));
    let mut elements = Vec::with_capacity(snapshot.len() * timestamps.len());

    for element in snapshot.elements() {
        let mut series = Vec::new();
        if element.has_dynamic_attributes() {
            let pipeline = pipelines
                .get(element.id.as_str())
                .ok_or_else(|| GridError::Config(format!("element {} has no simulation config", element.id)))?;
            for (parameter, parameter_series) in &pipeline.parameters {
                series.push((*parameter, run_steps(&parameter_series.steps, timestamps.len(), &mut rng)?));
            }
        } else if let Some(pipeline) = pipelines.get(element.id.as_str()) {
            if let Some(parameter) = pipeline.parameters.keys().next() {
                return Err(unsupported(element, *parameter));
            }
        }

        for (index, timestamp) in timestamps.iter().enumerate() {
            let mut simulated = element.clone();
            simulated.timestamp = *timestamp;
            simulated.clear_solved();
            for (parameter, values) in &series {
                set_dynamic(&mut simulated, *parameter, round(values[index]))?;
            }
            elements.push(simulated);
        }
        debug!(element_id = %element.id, parameters = series.len(), "element simulated");
    }

    let network = Network::new(config.output_network_id(), elements)?;
    info!(
        network_id = %network.id,
        source = %snapshot.id,
        timestamps = timestamps.len(),
        elements = snapshot.len(),
        "simulated network built"
    );
    Ok(network)
}
