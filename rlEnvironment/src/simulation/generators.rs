use std::f64::consts::PI;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::GridError;
use crate::utils::traits::SeriesGenerator;

/// Replaces the series with a constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StableGenerator {
    pub value: f64,
}

impl SeriesGenerator for StableGenerator {
    fn generate(&self, base: &[f64], _rng: &mut StdRng) -> Result<Vec<f64>, GridError> {
        Ok(vec![self.value; base.len()])
    }
}

/// Adds `offset + amplitude * sin(2π t / period + phase_shift)` at step `t`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CyclicalGenerator {
    pub amplitude: f64,
    pub period: f64,
    pub offset: f64,
    #[serde(default)]
    pub phase_shift: f64,
}

impl SeriesGenerator for CyclicalGenerator {
    fn generate(&self, base: &[f64], _rng: &mut StdRng) -> Result<Vec<f64>, GridError> {
        if self.period.is_nan() || self.period <= 0.0 {
            return Err(GridError::Config(format!("cyclical period must be positive, got {}", self.period)));
        }
        Ok(base
            .iter()
            .enumerate()
            .map(|(t, value)| {
                let angle = 2.0 * PI * t as f64 / self.period + self.phase_shift;
                value + self.offset + self.amplitude * angle.sin()
            })
            .collect())
    }
}

/// Adds gaussian noise. With `allow_negative` off, negative draws are
/// clipped to zero so the noise only ever raises the series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseGenerator {
    pub mean: f64,
    pub std: f64,
    pub allow_negative: bool,
}

impl Default for NoiseGenerator {
    fn default() -> Self {
        Self {
            mean: 0.0,
            std: 1.0,
            allow_negative: true,
        }
    }
}

impl SeriesGenerator for NoiseGenerator {
    fn generate(&self, base: &[f64], rng: &mut StdRng) -> Result<Vec<f64>, GridError> {
        let normal = Normal::new(self.mean, self.std)
            .map_err(|e| GridError::Config(format!("invalid noise parameters: {}", e)))?;
        Ok(base
            .iter()
            .map(|value| {
                let noise = normal.sample(rng);
                let noise = if self.allow_negative { noise } else { noise.max(0.0) };
                value + noise
            })
            .collect())
    }
}

/// A configured pipeline stage, tagged by generator name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "parameters", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeriesStep {
    Stable(StableGenerator),
    Cyclical(CyclicalGenerator),
    Noise(NoiseGenerator),
}

impl SeriesGenerator for SeriesStep {
    fn generate(&self, base: &[f64], rng: &mut StdRng) -> Result<Vec<f64>, GridError> {
        match self {
            SeriesStep::Stable(generator) => generator.generate(base, rng),
            SeriesStep::Cyclical(generator) => generator.generate(base, rng),
            SeriesStep::Noise(generator) => generator.generate(base, rng),
        }
    }
}

/// Folds `steps` over a zero series of length `len`.
pub fn run_steps(steps: &[SeriesStep], len: usize, rng: &mut StdRng) -> Result<Vec<f64>, GridError> {
    steps
        .iter()
        .try_fold(vec![0.0; len], |series, step| step.generate(&series, rng))
}
