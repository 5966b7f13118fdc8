mod common;

use rstest::{fixture, rstest};

use gridrl::config::environment_config::{ElementLifecycleConfig, EnvironmentConfig, LifecycleConfig};
use gridrl::core::environment::EpisodeState;
use gridrl::data::network_loader::JsonNetworkRepository;
use gridrl::lifecycle::Granularity;
use gridrl::observation::element_observation::ElementObservation;
use gridrl::solver::CopperPlateSolver;
use gridrl::{make_env, ActionKind, ElementStatus, EnvironmentError, GridAction, GridError, InvalidAction, NetworkEnvironment};

use common::{config, demand, network, ts, NETWORK_ID};

fn env_with(hours: u32, config: &EnvironmentConfig) -> NetworkEnvironment {
    let mut repository = JsonNetworkRepository::new();
    repository.insert(network(hours));
    make_env(config, &repository, Box::new(CopperPlateSolver)).unwrap()
}

fn play_do_nothing(env: &mut NetworkEnvironment) -> Vec<f64> {
    env.reset();
    let mut rewards = Vec::new();
    while !env.is_terminated() {
        rewards.push(env.step(&GridAction::DoNothing).unwrap().reward);
    }
    rewards
}

#[fixture]
fn two_step_env() -> NetworkEnvironment {
    env_with(2, &config())
}

#[fixture]
fn long_env() -> NetworkEnvironment {
    env_with(6, &config())
}

#[rstest]
fn test_single_step_terminates_two_timestamp_network(mut two_step_env: NetworkEnvironment) {
    two_step_env.reset();
    let result = two_step_env.step(&GridAction::DoNothing).unwrap();

    assert!(result.terminated);
    assert!(two_step_env.is_terminated());
    let latest = result.observation.latest().unwrap();
    assert_eq!(latest.timestamp(), ts(1));
    match latest.get_observation("D1") {
        Some(ElementObservation::Load(load)) => {
            assert_eq!(load.pd, demand(1));
            assert_eq!(load.active_power, demand(1));
        },
        other => panic!("expected a load observation, got {:?}", other),
    }
    assert_eq!(result.info.step, 1);
    assert_eq!(result.info.action, Some(GridAction::DoNothing));
}

#[rstest]
fn test_step_before_reset_is_rejected(mut two_step_env: NetworkEnvironment) {
    assert_eq!(two_step_env.state(), EpisodeState::NotReset);
    assert!(matches!(two_step_env.step(&GridAction::DoNothing), Err(EnvironmentError::NotReset)));
}

#[rstest]
fn test_step_after_termination_is_rejected(mut two_step_env: NetworkEnvironment) {
    two_step_env.reset();
    two_step_env.step(&GridAction::DoNothing).unwrap();
    assert!(matches!(two_step_env.step(&GridAction::DoNothing), Err(EnvironmentError::AlreadyTerminated)));

    // A fresh reset makes the environment usable again
    two_step_env.reset();
    assert!(two_step_env.step(&GridAction::DoNothing).is_ok());
}

#[rstest]
fn test_action_space_holds_line_switches(long_env: NetworkEnvironment) {
    let space = long_env.action_space();
    assert_eq!(
        space.valid_actions(),
        &[
            GridAction::DoNothing,
            GridAction::Switch("L1".to_string()),
            GridAction::Switch("L2".to_string()),
        ]
    );
    // Buses, the generator and the load were rejected
    assert_eq!(space.invalid_actions().count(), 4);
}

#[rstest]
fn test_action_outside_space_is_rejected(mut long_env: NetworkEnvironment) {
    long_env.reset();
    let result = long_env.step(&GridAction::Switch("B1".to_string()));
    assert!(matches!(result, Err(EnvironmentError::ActionNotInSpace(_))));
    assert_eq!(long_env.step_count(), 0);
}

#[test]
fn test_action_is_revalidated_against_current_lifecycle() {
    let config = EnvironmentConfig {
        granularity: Granularity::Week,
        action_kinds: vec![ActionKind::DoNothing, ActionKind::Switch, ActionKind::StartMaintenance],
        lifecycle: LifecycleConfig {
            defaults: ElementLifecycleConfig { lambda_factor: 1.0, ..ElementLifecycleConfig::default() },
            ..LifecycleConfig::default()
        },
        ..config()
    };
    let mut env = env_with(6, &config);
    env.reset();
    let maintenance = GridAction::StartMaintenance("L1".to_string());
    assert!(env.action_space().contains(&maintenance));

    env.step(&GridAction::DoNothing).unwrap();
    assert_eq!(env.registry().get_handler("L1").map(|h| h.status()), Some(ElementStatus::Outage));

    match env.step(&maintenance) {
        Err(EnvironmentError::InvalidAction(InvalidAction::AlreadyUnavailable { element_id, status })) => {
            assert_eq!(element_id, "L1");
            assert_eq!(status, ElementStatus::Outage);
        },
        other => panic!("expected AlreadyUnavailable, got {:?}", other.map(|r| r.reward)),
    }
    assert!(matches!(
        env.step(&GridAction::Switch("L1".to_string())),
        Err(EnvironmentError::InvalidAction(InvalidAction::UnderOutage { .. }))
    ));
    // Rejected actions leave the episode where it was
    assert_eq!(env.step_count(), 1);
    assert_eq!(env.current_timestamp(), ts(1));
    assert!(env.step(&GridAction::DoNothing).is_ok());
}

#[rstest]
fn test_step_index_out_of_range(mut long_env: NetworkEnvironment) {
    long_env.reset();
    let size = long_env.action_space().len();
    match long_env.step_index(size) {
        Err(EnvironmentError::IndexOutOfRange { index, size: reported }) => {
            assert_eq!(index, size);
            assert_eq!(reported, size);
        },
        other => panic!("expected IndexOutOfRange, got {:?}", other.map(|r| r.reward)),
    }
}

#[rstest]
fn test_switching_both_lines_leaves_load_unserved(mut long_env: NetworkEnvironment) {
    long_env.reset();
    let first = long_env.step(&GridAction::Switch("L1".to_string())).unwrap();
    assert_eq!(first.reward, 0.0);
    assert_eq!(
        long_env.current_network().get_element("L1").and_then(|e| e.status()),
        Some(gridrl::ElementStatus::Off)
    );

    let second = long_env.step(&GridAction::Switch("L2".to_string())).unwrap();
    assert_eq!(second.reward, -demand(2));
    assert_eq!(second.info.cumulative_reward, -demand(2));
    assert!(!second.terminated);
}

#[rstest]
fn test_dynamic_values_follow_the_timeline(mut long_env: NetworkEnvironment) {
    long_env.reset();
    for hour in 1..6 {
        let result = long_env.step(&GridAction::DoNothing).unwrap();
        assert_eq!(long_env.current_timestamp(), ts(hour));
        let latest = result.observation.latest().unwrap();
        let served: f64 = latest.loads().map(|l| l.pd).sum();
        assert_eq!(served, demand(hour));
        assert_eq!(result.terminated, hour == 5);
    }
}

#[rstest]
fn test_observation_history_is_bounded() {
    let config = EnvironmentConfig { observation_history_length: 2, ..config() };
    let mut env = env_with(5, &config);
    env.reset();
    for _ in 0..3 {
        env.step(&GridAction::DoNothing).unwrap();
    }
    let history: Vec<_> = env.observation().iter().map(|s| s.timestamp()).collect();
    assert_eq!(history, vec![ts(2), ts(3)]);
    assert!(!env.observation_array().unwrap().is_empty());
}

#[rstest]
#[case::hourly(Granularity::Hour)]
#[case::weekly(Granularity::Week)]
fn test_reset_restores_first_reset_state(#[case] granularity: Granularity) {
    let config = EnvironmentConfig {
        granularity,
        lifecycle: LifecycleConfig {
            defaults: ElementLifecycleConfig { lambda_factor: 0.3, ..ElementLifecycleConfig::default() },
            ..LifecycleConfig::default()
        },
        ..config()
    };
    let mut env = env_with(6, &config);

    let (first_observation, first_info) = env.reset();
    let first_network = env.current_network().clone();
    let first_registry = env.registry().snapshot();

    env.step(&GridAction::Switch("L1".to_string())).unwrap();
    env.step(&GridAction::DoNothing).unwrap();
    env.step(&GridAction::DoNothing).unwrap();
    assert_ne!(env.registry().snapshot(), first_registry);

    let (observation, info) = env.reset();
    assert_eq!(observation, first_observation);
    assert_eq!(info, first_info);
    assert_eq!(env.current_network(), &first_network);
    assert_eq!(env.registry().snapshot(), first_registry);
    assert_eq!(env.cumulative_reward(), 0.0);
    assert_eq!(env.step_count(), 0);
}

#[rstest]
fn test_reset_replays_the_same_trajectory() {
    let config = EnvironmentConfig {
        granularity: Granularity::Week,
        lifecycle: LifecycleConfig {
            defaults: ElementLifecycleConfig { lambda_factor: 0.3, ..ElementLifecycleConfig::default() },
            ..LifecycleConfig::default()
        },
        ..config()
    };
    let mut env = env_with(6, &config);

    let first = play_do_nothing(&mut env);
    let second = play_do_nothing(&mut env);
    assert_eq!(first, second);
}

#[test]
fn test_single_timestamp_network_is_rejected() {
    let mut repository = JsonNetworkRepository::new();
    repository.insert(network(1));
    let result = make_env(&config(), &repository, Box::new(CopperPlateSolver));
    assert!(matches!(result, Err(GridError::NotEnoughTimestamps { found: 1, .. })));
}

#[test]
fn test_unknown_network_id_is_rejected() {
    let repository = JsonNetworkRepository::new();
    let result = make_env(&config(), &repository, Box::new(CopperPlateSolver));
    match result {
        Err(GridError::NetworkNotFound(id)) => assert_eq!(id, NETWORK_ID),
        Err(other) => panic!("unexpected error {}", other),
        Ok(_) => panic!("expected NetworkNotFound"),
    }
}
