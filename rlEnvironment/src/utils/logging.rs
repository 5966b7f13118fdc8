use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use parking_lot::RwLock;
use tracing::Level;
use tracing_subscriber::{EnvFilter, filter::Directive, prelude::*};
use tracing_timing::{Builder, Histogram};

use crate::config::constants::{HISTOGRAM_HIGH_NS, HISTOGRAM_LOW_NS, HISTOGRAM_SIGFIG};

#[derive(Hash, Eq, PartialEq, Clone, Debug)]
pub enum OperationCategory {
    Simulation,
    Transition,
    LoadFlow,
    Observation,
    ActionSpace,
    FileIO {
        subcategory: FileIOType,
    },
    Other,
}

#[derive(Hash, Eq, PartialEq, Clone, Debug)]
pub enum FileIOType {
    NetworkLoad,
    ConfigLoad,
    ResultsSave,
    Other,
}

impl fmt::Display for FileIOType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FileIOType::NetworkLoad => "Network Load",
            FileIOType::ConfigLoad => "Config Load",
            FileIOType::ResultsSave => "Results Save",
            FileIOType::Other => "Other",
        };
        f.write_str(label)
    }
}

impl fmt::Display for OperationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationCategory::Simulation => f.write_str("Simulation"),
            OperationCategory::Transition => f.write_str("Network Transition"),
            OperationCategory::LoadFlow => f.write_str("Load Flow"),
            OperationCategory::Observation => f.write_str("Observation"),
            OperationCategory::ActionSpace => f.write_str("Action Space"),
            OperationCategory::FileIO { subcategory } => write!(f, "File I/O - {}", subcategory),
            OperationCategory::Other => f.write_str("Other Operations"),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct CallStats {
    total: Duration,
    calls: usize,
    callers: Vec<String>,
}

#[derive(Default)]
struct TimingStore {
    calls: HashMap<String, CallStats>,
    functions: HashMap<String, Histogram<u64>>,
    categories: HashMap<OperationCategory, Histogram<u64>>,
}

fn new_histogram() -> Option<Histogram<u64>> {
    Histogram::<u64>::new_with_bounds(HISTOGRAM_LOW_NS, HISTOGRAM_HIGH_NS, HISTOGRAM_SIGFIG).ok()
}

impl TimingStore {
    fn record(&mut self, name: &str, category: &OperationCategory, elapsed: Duration, caller: Option<&str>) {
        let stats = self.calls.entry(name.to_string()).or_default();
        stats.total += elapsed;
        stats.calls += 1;
        if let Some(caller) = caller {
            if !stats.callers.iter().any(|c| c == caller) {
                stats.callers.push(caller.to_string());
            }
        }

        // Values beyond the histogram bounds are dropped
        let nanos = elapsed.as_nanos().min(u64::MAX as u128) as u64;
        if !self.functions.contains_key(name) {
            if let Some(histogram) = new_histogram() {
                self.functions.insert(name.to_string(), histogram);
            }
        }
        if let Some(histogram) = self.functions.get_mut(name) {
            let _ = histogram.record(nanos);
        }
        if !self.categories.contains_key(category) {
            if let Some(histogram) = new_histogram() {
                self.categories.insert(category.clone(), histogram);
            }
        }
        if let Some(histogram) = self.categories.get_mut(category) {
            let _ = histogram.record(nanos);
        }
    }
}

thread_local! {
    // Names of the timed functions currently running on this thread
    static CALL_STACK: RefCell<Vec<String>> = RefCell::new(Vec::new());
}

lazy_static! {
    static ref TIMING_ENABLED: AtomicBool = AtomicBool::new(false);
    static ref TIMINGS: RwLock<TimingStore> = RwLock::new(TimingStore::default());
}

/// Records the elapsed time of a scope when dropped.
pub struct TimingGuard {
    function_name: String,
    category: OperationCategory,
    start: Instant,
    tracked: bool,
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        if !self.tracked {
            return;
        }
        let elapsed = self.start.elapsed();
        let caller = CALL_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            stack.pop();
            stack.last().cloned()
        });
        TIMINGS.write().record(&self.function_name, &self.category, elapsed, caller.as_deref());
    }
}

pub fn start_timing(function_name: &str, category: OperationCategory) -> TimingGuard {
    let tracked = is_timing_enabled();
    if tracked {
        CALL_STACK.with(|stack| stack.borrow_mut().push(function_name.to_string()));
    }

    TimingGuard {
        function_name: function_name.to_string(),
        category,
        start: Instant::now(),
        tracked,
    }
}

/// Installs the global subscriber. Calling it twice keeps the first one.
pub fn init_logging(enable_timing: bool) {
    set_timing_enabled(enable_timing);

    let mut env_filter = EnvFilter::from_default_env().add_directive(Level::INFO.into());
    if let Ok(directive) = "gridrl=debug".parse::<Directive>() {
        env_filter = env_filter.add_directive(directive);
    }
    let fmt_layer = tracing_subscriber::fmt::layer().pretty();

    let installed = if enable_timing {
        let timing_layer = Builder::default().layer(|| {
            Histogram::<u64>::new_with_bounds(HISTOGRAM_LOW_NS, HISTOGRAM_HIGH_NS, HISTOGRAM_SIGFIG)
                .expect("histogram bounds are valid constants")
        });
        tracing::subscriber::set_global_default(
            tracing_subscriber::registry().with(env_filter).with(fmt_layer).with(timing_layer.boxed()),
        )
    } else {
        tracing::subscriber::set_global_default(tracing_subscriber::registry().with(env_filter).with(fmt_layer))
    };

    if installed.is_err() {
        eprintln!("Tracing subscriber already installed, keeping the existing one");
    }
}

pub fn set_timing_enabled(enabled: bool) {
    TIMING_ENABLED.store(enabled, Ordering::SeqCst);
}

pub fn is_timing_enabled() -> bool {
    TIMING_ENABLED.load(Ordering::SeqCst)
}

/// Number of recorded calls for a timed function.
pub fn call_count(function_name: &str) -> usize {
    TIMINGS.read().calls.get(function_name).map(|s| s.calls).unwrap_or(0)
}

fn millis(nanos: f64) -> f64 {
    nanos / 1_000_000.0
}

pub fn print_timing_report() {
    if !is_timing_enabled() {
        return;
    }
    let store = TIMINGS.read();

    println!("\nTiming Report");
    println!("=============");

    println!("\nBy function (slowest total first):");
    let mut calls: Vec<_> = store.calls.iter().collect();
    calls.sort_by(|a, b| b.1.total.cmp(&a.1.total));
    for (name, stats) in calls {
        let mean = stats.total.as_secs_f64() * 1000.0 / stats.calls.max(1) as f64;
        let p95 = store.functions.get(name).map(|h| h.value_at_quantile(0.95) as f64).unwrap_or(0.0);
        println!(
            "  {:<48} calls={:<8} total={:>9.3}s mean={:>9.3}ms p95={:>9.3}ms",
            name,
            stats.calls,
            stats.total.as_secs_f64(),
            mean,
            millis(p95),
        );
        if !stats.callers.is_empty() {
            println!("    called by: {}", stats.callers.join(", "));
        }
    }

    println!("\nBy category:");
    let totals: Vec<(&OperationCategory, &Histogram<u64>, f64)> = store
        .categories
        .iter()
        .map(|(category, histogram)| (category, histogram, histogram.mean() * histogram.len() as f64))
        .collect();
    let grand_total: f64 = totals.iter().map(|(_, _, total)| total).sum();
    let mut totals = totals;
    totals.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));
    for (category, histogram, total) in totals {
        let share = if grand_total > 0.0 { total / grand_total * 100.0 } else { 0.0 };
        println!(
            "  {:<28} {:>5.1}%  count={} mean={:.3}ms p99={:.3}ms",
            category.to_string(),
            share,
            histogram.len(),
            millis(histogram.mean()),
            millis(histogram.value_at_quantile(0.99) as f64),
        );
    }
    println!();
}
