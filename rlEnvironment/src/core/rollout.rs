use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info};

use crate::ai::actions::grid_action::GridAction;
use crate::ai::agent::Agent;
use crate::core::environment::NetworkEnvironment;
use crate::error::EnvironmentError;
use crate::utils::logging::{self, OperationCategory};

/// One row of an experiment log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    pub episode: usize,
    pub step: usize,
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub reward: f64,
    pub cumulative_reward: f64,
    pub terminated: bool,
    pub elements_in_outage: usize,
    pub elements_in_maintenance: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeSummary {
    pub episode: usize,
    pub agent: String,
    pub steps: usize,
    pub cumulative_reward: f64,
    pub terminated: bool,
    pub outage_steps: usize,
    pub maintenance_steps: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RolloutReport {
    pub summaries: Vec<EpisodeSummary>,
    pub records: Vec<StepRecord>,
}

/// Plays one episode from a fresh reset until termination or `max_steps`.
pub fn run_episode(
    env: &mut NetworkEnvironment,
    agent: &mut dyn Agent,
    episode: usize,
    max_steps: Option<usize>,
) -> Result<(EpisodeSummary, Vec<StepRecord>), EnvironmentError> {
    let _timing = logging::start_timing("run_episode", OperationCategory::Simulation);

    let (mut observation, _) = env.reset();
    agent.reset();
    let mut records = Vec::new();
    let mut terminated = false;

    while !terminated && max_steps.map_or(true, |limit| records.len() < limit) {
        let index = agent.choose(&observation, env.action_space());
        let result = match env.step_index(index) {
            Err(EnvironmentError::InvalidAction(reason)) => {
                debug!(episode, %reason, "chosen action not applicable, stepping with DoNothing");
                env.step(&GridAction::DoNothing)?
            },
            other => other?,
        };
        records.push(StepRecord {
            episode,
            step: result.info.step,
            timestamp: result.info.timestamp,
            action: result.info.action.as_ref().map(|a| a.to_string()).unwrap_or_default(),
            reward: result.reward,
            cumulative_reward: result.info.cumulative_reward,
            terminated: result.terminated,
            elements_in_outage: result.info.elements_in_outage.len(),
            elements_in_maintenance: result.info.elements_in_maintenance.len(),
        });
        terminated = result.terminated;
        observation = result.observation;
    }

    let summary = EpisodeSummary {
        episode,
        agent: agent.name().to_string(),
        steps: records.len(),
        cumulative_reward: env.cumulative_reward(),
        terminated,
        outage_steps: records.iter().filter(|r| r.elements_in_outage > 0).count(),
        maintenance_steps: records.iter().filter(|r| r.elements_in_maintenance > 0).count(),
    };
    Ok((summary, records))
}

pub fn run_rollouts(
    env: &mut NetworkEnvironment,
    agent: &mut dyn Agent,
    episodes: usize,
    max_steps: Option<usize>,
    show_progress: bool,
) -> Result<RolloutReport, EnvironmentError> {
    let progress = if show_progress {
        let bar = ProgressBar::new(episodes as u64);
        if let Ok(style) = ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} {msg}") {
            bar.set_style(style.progress_chars("##-"));
        }
        bar
    } else {
        ProgressBar::hidden()
    };

    let mut report = RolloutReport::default();
    for episode in 0..episodes {
        let (summary, records) = run_episode(env, agent, episode, max_steps)?;
        progress.set_message(format!("reward {:.2}", summary.cumulative_reward));
        progress.inc(1);
        report.summaries.push(summary);
        report.records.extend(records);
    }
    progress.finish_and_clear();

    info!(episodes, agent = agent.name(), "rollouts finished");
    Ok(report)
}
