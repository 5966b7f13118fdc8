mod common;

use rstest::rstest;

use gridrl::ai::agent::{Agent, DoNothingAgent, RandomAgent};
use gridrl::core::rollout::{run_episode, run_rollouts};
use gridrl::data::network_loader::JsonNetworkRepository;
use gridrl::solver::CopperPlateSolver;
use gridrl::{make_env, ActionKind, GridAction, NetworkEnvironment};
use gridrl::config::environment_config::{ElementLifecycleConfig, EnvironmentConfig, LifecycleConfig};
use gridrl::lifecycle::Granularity;

use common::{config, network};

fn env(hours: u32, config: &EnvironmentConfig) -> NetworkEnvironment {
    let mut repository = JsonNetworkRepository::new();
    repository.insert(network(hours));
    make_env(config, &repository, Box::new(CopperPlateSolver)).unwrap()
}

#[test]
fn test_do_nothing_agent_picks_do_nothing() {
    let env = env(3, &config());
    let mut agent = DoNothingAgent;
    let index = agent.choose(env.observation(), env.action_space());
    assert_eq!(env.action_space().get(index), Some(&GridAction::DoNothing));
}

#[test]
fn test_do_nothing_agent_falls_back_to_first_action() {
    let config = EnvironmentConfig { action_kinds: vec![ActionKind::Switch], ..config() };
    let env = env(3, &config);
    let mut agent = DoNothingAgent;
    assert_eq!(agent.choose(env.observation(), env.action_space()), 0);
}

#[test]
fn test_random_agent_repeats_after_reset() {
    let env = env(3, &config());
    let mut agent = RandomAgent::new(7);
    let first: Vec<usize> = (0..20).map(|_| agent.choose(env.observation(), env.action_space())).collect();
    agent.reset();
    let second: Vec<usize> = (0..20).map(|_| agent.choose(env.observation(), env.action_space())).collect();
    assert_eq!(first, second);
    assert!(first.iter().all(|&i| i < env.action_space().len()));
}

#[rstest]
#[case(2, None, 1)]
#[case(5, None, 4)]
#[case(5, Some(2), 2)]
fn test_episode_length(#[case] hours: u32, #[case] max_steps: Option<usize>, #[case] expected: usize) {
    let mut env = env(hours, &config());
    let mut agent = DoNothingAgent;
    let (summary, records) = run_episode(&mut env, &mut agent, 0, max_steps).unwrap();
    assert_eq!(summary.steps, expected);
    assert_eq!(records.len(), expected);
    assert_eq!(summary.terminated, max_steps.is_none());
    assert!(records.iter().all(|r| r.action == "DoNothing"));
    assert_eq!(records.last().map(|r| r.step), Some(expected));
}

#[test]
fn test_rollouts_are_reproducible() {
    let mut env = env(6, &config());
    let mut agent = RandomAgent::new(3);
    let report = run_rollouts(&mut env, &mut agent, 3, None, false).unwrap();

    assert_eq!(report.summaries.len(), 3);
    assert_eq!(report.records.len(), 15);
    // Agent and handlers are reseeded on every reset
    let first = &report.summaries[0];
    for summary in &report.summaries[1..] {
        assert_eq!(summary.cumulative_reward, first.cumulative_reward);
        assert_eq!(summary.steps, first.steps);
    }
    let actions = |episode: usize| -> Vec<&str> {
        report.records.iter().filter(|r| r.episode == episode).map(|r| r.action.as_str()).collect()
    };
    assert_eq!(actions(0), actions(2));
}

#[test]
fn test_inapplicable_choices_fall_back_to_do_nothing() {
    let config = EnvironmentConfig {
        granularity: Granularity::Week,
        action_kinds: vec![ActionKind::DoNothing, ActionKind::StartMaintenance],
        lifecycle: LifecycleConfig {
            defaults: ElementLifecycleConfig { lambda_factor: 1.0, ..ElementLifecycleConfig::default() },
            ..LifecycleConfig::default()
        },
        ..config()
    };
    let mut env = env(5, &config);
    // Both lines are in outage from the first step on
    let mut agent = RandomAgent::new(11);
    let (summary, records) = run_episode(&mut env, &mut agent, 0, None).unwrap();

    assert!(summary.terminated);
    assert_eq!(summary.steps, 4);
    assert!(records[1..].iter().all(|r| r.action == "DoNothing"));
    assert_eq!(summary.outage_steps, 4);
}
