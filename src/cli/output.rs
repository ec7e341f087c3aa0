//! CLI output formatting.
//!
//! Formatting is split into `format_*` functions returning strings (tested)
//! and thin `print_*` wrappers.

use std::fmt::Write as _;

use crate::config::SimConfig;
use crate::domains::histogram::Histogram;
use crate::domains::statistics::SimulationStats;
use crate::engine::params::SimulationParams;
use crate::engine::{RunOutcome, SimulationSnapshot};

/// Widest histogram bar in characters.
pub const BAR_WIDTH: usize = 50;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Version string, with the git hash when the build captured one.
#[must_use]
pub fn version_string() -> String {
    match option_env!("BINOSIM_GIT_HASH") {
        Some(hash) if !hash.is_empty() => {
            format!("binosim {} ({hash})", env!("CARGO_PKG_VERSION"))
        }
        _ => format!("binosim {}", env!("CARGO_PKG_VERSION")),
    }
}

/// Print version information.
pub fn print_version() {
    println!("{}", version_string());
}

/// Print help message.
pub fn print_help() {
    println!(
        r"binosim - Bernoulli trial simulator

USAGE:
    binosim <COMMAND> [OPTIONS]

COMMANDS:
    run                         Run a simulation
        -c, --config <FILE>     Load settings from a YAML file
        -p, --probability <P>   Success probability in [0, 1] (default: 0.5)
        -t, --trials <N>        Trials per experiment (default: 100)
        -n, --experiments <N>   Number of experiments (default: 1000)
        --seed <N>              Master seed (default: 42)
        --delay <MS>            Pause between experiments (default: 0)
        --capped [BINS]         Cap the histogram at BINS bins (default: 20)
        --json                  Print a JSON snapshot
        -v, --verbose           Print every experiment

    stats --values <A,B,..>     Statistics for given success counts
        -p, --probability <P>   Success probability (default: 0.5)
        -t, --trials <N>        Trials per experiment (default: 100)

    validate <config.yaml>      Validate a configuration file

    help                        Show this help message
    version                     Show version information

EXAMPLES:
    binosim run -p 0.3 -t 50 -n 2000
    binosim run --config binosim.yaml --capped 15
    binosim stats --values 40,50,60

Press Ctrl-C during a run to stop it; partial results are reported.
"
    );
}

/// Render a horizontal ASCII histogram, one line per bin.
#[must_use]
pub fn format_histogram(histogram: &Histogram, selected: Option<usize>) -> String {
    if histogram.is_empty() {
        return "  (no results)\n".to_string();
    }

    let max = histogram.max_frequency().max(1);
    let label_width = histogram.labels.iter().map(String::len).max().unwrap_or(1);
    let mut out = String::new();

    for (i, (label, &count)) in histogram.labels.iter().zip(&histogram.data).enumerate() {
        let len = ((count as f64 / max as f64) * BAR_WIDTH as f64).round() as usize;
        let bar = if count > 0 { "█".repeat(len.max(1)) } else { String::new() };
        let marker = if selected == Some(i) { '>' } else { ' ' };
        let _ = writeln!(out, "{marker} {label:>label_width$} │{bar} {count}");
    }
    out
}

/// Render the statistics block.
#[must_use]
pub fn format_statistics(stats: &SimulationStats, params: &SimulationParams) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Statistics:");
    let _ = writeln!(out, "  Mean:               {:.4}", stats.mean);
    let _ = writeln!(out, "  Variance:           {:.4}", stats.variance);
    let _ = writeln!(out, "  Standard deviation: {:.4}", stats.standard_deviation);
    let _ = writeln!(out, "  Min / Max:          {} / {}", stats.min, stats.max);
    let _ = writeln!(
        out,
        "  Expected value:     {:.4}  (p = {}, n = {})",
        stats.expected_value,
        params.probability_label(),
        params.trials_per_experiment
    );
    let _ = writeln!(out, "  z-score:            {:.4}", stats.z_score);
    let verdict = if stats.is_significant(0.05) {
        "significant at 5%"
    } else {
        "consistent with p"
    };
    let _ = writeln!(out, "  p-value:            {:.4}  ({verdict})", stats.p_value);
    out
}

/// Print the text report of a finished (or stopped) run.
pub fn print_run_report(snapshot: &SimulationSnapshot, verbose: bool) {
    let params = &snapshot.params;
    let status = match snapshot.outcome {
        RunOutcome::Completed => "✓ COMPLETED",
        RunOutcome::Cancelled => "■ STOPPED",
        RunOutcome::Faulted => "✗ FAULTED",
        RunOutcome::Idle => "· IDLE",
    };

    println!("{RULE}");
    println!(
        "p = {}  trials = {}  experiments = {}  seed = {}",
        params.probability_label(),
        params.trials_per_experiment,
        params.number_of_experiments,
        snapshot.seed
    );
    println!(
        "{status}: {} / {} experiments",
        snapshot.progress, params.number_of_experiments
    );
    println!("{RULE}\n");

    if verbose {
        for r in &snapshot.results {
            println!(
                "  #{:<6} {:>6} successes  (+{:.3}s)",
                r.experiment_number,
                r.successes,
                r.timestamp.as_secs_f64()
            );
        }
        println!();
    }

    println!("Histogram:");
    print!("{}", format_histogram(&snapshot.histogram, None));
    println!();
    print!("{}", format_statistics(&snapshot.statistics, params));

    if let Some(ref err) = snapshot.last_error {
        println!("\nError: {err}");
    }
}

/// Print the report of the `stats` command.
pub fn print_stats_report(histogram: &Histogram, stats: &SimulationStats, params: &SimulationParams) {
    println!("{RULE}");
    println!(
        "{} values, p = {}, trials = {}",
        histogram.total(),
        params.probability_label(),
        params.trials_per_experiment
    );
    println!("{RULE}\n");
    print!("{}", format_histogram(histogram, None));
    println!();
    print!("{}", format_statistics(stats, params));
}

/// Render a configuration summary.
#[must_use]
pub fn format_config_summary(config: &SimConfig) -> String {
    let mut out = String::new();
    let params = &config.simulation;
    let _ = writeln!(out, "  Seed:          {}", config.reproducibility.seed);
    let _ = writeln!(out, "  Probability:   {}", params.probability_label());
    let _ = writeln!(out, "  Trials:        {}", params.trials_per_experiment);
    let _ = writeln!(out, "  Experiments:   {}", params.number_of_experiments);
    let _ = writeln!(out, "  Delay:         {} ms", config.pacing.delay_ms);
    let _ = writeln!(out, "  Binning:       {:?}", config.binning_policy());
    let _ = writeln!(out, "  TUI refresh:   {} Hz", config.visualization.tui.refresh_hz);
    let _ = writeln!(out, "  Log filter:    {}", config.logging.filter);
    out
}
