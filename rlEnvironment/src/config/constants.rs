// Lifecycle Constants
pub const MAINTENANCE_DURATION: u32 = 5;           // Steps a line stays in planned maintenance
pub const DEFAULT_LAMBDA_FACTOR: f64 = 0.0001;     // Outage probability growth per usage step
pub const DEFAULT_SEED: u64 = 42;

// Outage sampling weights (must sum to 1.0)
pub const SHORT_TERM_OUTAGE_WEIGHT: f64 = 0.50;
pub const MID_TERM_OUTAGE_WEIGHT: f64 = 0.35;
pub const LONG_TERM_OUTAGE_WEIGHT: f64 = 0.15;

// Outage duration buckets, lower bound inclusive, upper exclusive
pub const SHORT_TERM_DURATION: (u32, u32) = (24, 48);
pub const MID_TERM_DURATION: (u32, u32) = (48, 72);
pub const LONG_TERM_DURATION: (u32, u32) = (72, 150);

// Usage steps between two outage draws, per granularity
pub const HOURLY_SAMPLING_CADENCE: u32 = 24;
pub const DAILY_SAMPLING_CADENCE: u32 = 7;
pub const WEEKLY_SAMPLING_CADENCE: u32 = 1;

// Environment Constants
pub const DEFAULT_OBSERVATION_HISTORY_LENGTH: usize = 1;
pub const MIN_EPISODE_TIMESTAMPS: usize = 2;

// Reward Constants
pub const LINE_OVERLOAD_PENALTY: f64 = 5.0;        // Penalty per overloaded line

// Simulation Constants
pub const SIMULATED_NETWORK_SUFFIX: &str = "_simulated";
pub const DEFAULT_TIME_STEP_HOURS: u32 = 1;
pub const SIMULATED_VALUE_DECIMALS: i32 = 2;

// Rollout Constants
pub const DEFAULT_EPISODES: usize = 1;
pub const DEFAULT_CSV_DIR: &str = "rollouts";

// Timing histogram bounds in nanoseconds
pub const HISTOGRAM_LOW_NS: u64 = 1;
pub const HISTOGRAM_HIGH_NS: u64 = 60_000_000_000;
pub const HISTOGRAM_SIGFIG: u8 = 3;
