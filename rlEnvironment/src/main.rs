use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use tracing::info;

use gridrl::ai::agent::{Agent, DoNothingAgent, RandomAgent};
use gridrl::cli::cli::{AgentChoice, Args};
use gridrl::config::environment_config::EnvironmentConfig;
use gridrl::core::environment::make_env;
use gridrl::core::rollout::run_rollouts;
use gridrl::data::network_loader::JsonNetworkRepository;
use gridrl::simulation::pipeline::{simulate_network, SimulationConfig};
use gridrl::solver::CopperPlateSolver;
use gridrl::utils::csv_export::CsvExporter;
use gridrl::utils::logging::{self, FileIOType, OperationCategory};
use gridrl::utils::traits::NetworkRepository;

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_logging(args.enable_timing());

    let mut repository = JsonNetworkRepository::from_file(args.network())
        .with_context(|| format!("failed to load networks from {}", args.network()))?;

    let mut config = match args.config() {
        Some(path) => {
            let _timing = logging::start_timing(
                "load_config",
                OperationCategory::FileIO { subcategory: FileIOType::ConfigLoad },
            );
            EnvironmentConfig::from_json_file(path).with_context(|| format!("invalid config {}", path))?
        },
        None => EnvironmentConfig::default(),
    };
    if let Some(path) = args.simulation() {
        let simulation = {
            let _timing = logging::start_timing(
                "load_simulation_config",
                OperationCategory::FileIO { subcategory: FileIOType::ConfigLoad },
            );
            SimulationConfig::from_json_file(path).with_context(|| format!("invalid simulation config {}", path))?
        };
        let snapshot = repository.get(&simulation.network_id)?;
        let simulated = simulate_network(&snapshot, &simulation)
            .with_context(|| format!("failed to simulate network {}", simulation.network_id))?;
        if config.network_id.is_empty() || config.network_id == simulation.network_id {
            config.network_id = simulated.id.clone();
        }
        repository.insert(simulated);
    }
    if let Some(network_id) = args.network_id() {
        config.network_id = network_id.to_string();
    }
    if config.network_id.is_empty() {
        // A file with a single network doesn't need an explicit id
        let ids: Vec<&str> = repository.ids().collect();
        match ids.as_slice() {
            [only] => config.network_id = only.to_string(),
            [] => bail!("{} contains no networks", args.network()),
            _ => bail!("{} holds several networks ({}), pass --network-id", args.network(), ids.join(", ")),
        }
    }

    let mut env = make_env(&config, &repository, Box::new(CopperPlateSolver))
        .with_context(|| format!("failed to build environment for network {}", config.network_id))?;

    let mut agent: Box<dyn Agent> = match args.agent() {
        AgentChoice::DoNothing => Box::new(DoNothingAgent),
        AgentChoice::Random => Box::new(RandomAgent::new(args.seed())),
    };

    info!(
        network_id = %config.network_id,
        actions = env.action_space().len(),
        timestamps = env.timestamps().len(),
        agent = agent.name(),
        "starting rollouts"
    );

    let report = run_rollouts(&mut env, agent.as_mut(), args.episodes(), args.max_steps(), !args.no_progress())?;

    for summary in &report.summaries {
        println!(
            "episode {}: steps={}, reward={:.4}, terminated={}, outage steps={}, maintenance steps={}",
            summary.episode,
            summary.steps,
            summary.cumulative_reward,
            summary.terminated,
            summary.outage_steps,
            summary.maintenance_steps,
        );
    }

    if args.enable_csv_export() {
        let exporter = CsvExporter::new(args.csv_dir()).map_err(|e| anyhow!("failed to create csv dir: {}", e))?;
        exporter.export_rollouts(&report).map_err(|e| anyhow!("csv export failed: {}", e))?;
        println!("CSV export written to {}", exporter.output_dir().display());
    }

    logging::print_timing_report();
    Ok(())
}
