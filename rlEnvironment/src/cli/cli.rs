use clap::{Parser, ValueEnum};

use crate::config::constants::{DEFAULT_CSV_DIR, DEFAULT_EPISODES, DEFAULT_SEED};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AgentChoice {
    DoNothing,
    Random,
}

#[derive(Parser)]
#[command(author, version, about = "Rollouts over a multi-timestamp power grid environment", long_about = None)]
pub struct Args {
    #[arg(short, long, help = "JSON file with one network or a list of networks")]
    network: String,

    #[arg(short, long, help = "JSON environment config; defaults are used when omitted")]
    config: Option<String>,

    #[arg(long, help = "Network id to run; overrides the config value")]
    network_id: Option<String>,

    #[arg(long, help = "JSON simulation config expanding a single-timestamp network into a timeline")]
    simulation: Option<String>,

    #[arg(short, long, default_value_t = DEFAULT_EPISODES)]
    episodes: usize,

    #[arg(short, long, help = "Stop an episode after this many steps")]
    max_steps: Option<usize>,

    #[arg(short, long, value_enum, default_value_t = AgentChoice::DoNothing)]
    agent: AgentChoice,

    #[arg(long, help = "Seed for the random agent", default_value_t = DEFAULT_SEED)]
    seed: u64,

    #[arg(long, default_value_t = false)]
    enable_timing: bool,

    #[arg(long, default_value_t = false)]
    enable_csv_export: bool,

    #[arg(long, default_value = DEFAULT_CSV_DIR)]
    csv_dir: String,

    #[arg(long, default_value_t = false)]
    no_progress: bool,
}

impl Args {
    pub fn network(&self) -> &str {
        &self.network
    }

    pub fn config(&self) -> Option<&str> {
        self.config.as_deref()
    }

    pub fn network_id(&self) -> Option<&str> {
        self.network_id.as_deref()
    }

    pub fn simulation(&self) -> Option<&str> {
        self.simulation.as_deref()
    }

    pub fn episodes(&self) -> usize {
        self.episodes
    }

    pub fn max_steps(&self) -> Option<usize> {
        self.max_steps
    }

    pub fn agent(&self) -> AgentChoice {
        self.agent
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn enable_timing(&self) -> bool {
        self.enable_timing
    }

    pub fn enable_csv_export(&self) -> bool {
        self.enable_csv_export
    }

    pub fn csv_dir(&self) -> &str {
        &self.csv_dir
    }

    pub fn no_progress(&self) -> bool {
        self.no_progress
    }
}
