//! CLI command handlers.
//!
//! This module contains the execution logic for each CLI command.

use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::SimConfig;
use crate::domains::histogram::{compute_histogram, BinningPolicy};
use crate::domains::statistics::compute_statistics;
use crate::engine::params::{ParamsUpdate, SimulationParams};
use crate::engine::runner::ExperimentResult;
use crate::engine::{RunSummary, Simulator};
use crate::error::{SimError, SimResult};

use super::args::RunOptions;
use super::output::{
    format_config_summary, print_help, print_run_report, print_stats_report, print_version,
};
use super::{Args, Command};

/// Main CLI entry point.
///
/// Dispatches to the appropriate command handler based on parsed arguments.
#[must_use]
pub fn run_cli(args: Args) -> ExitCode {
    if !matches!(args.command, Command::Run(_)) {
        init_logging(QUIET_FILTER);
    }
    match args.command {
        Command::Run(opts) => run_simulation(&opts),
        Command::Stats {
            values,
            probability,
            trials,
        } => stats_command(&values, probability, trials),
        Command::Validate { config_path } => validate_config(&config_path),
        Command::Help => {
            print_help();
            ExitCode::SUCCESS
        }
        Command::Invalid => {
            eprintln!("Run 'binosim help' for usage.");
            ExitCode::from(1)
        }
        Command::Version => {
            print_version();
            ExitCode::SUCCESS
        }
    }
}

/// Filter used when neither `RUST_LOG` nor a config file names one.
const QUIET_FILTER: &str = "warn";

/// Install the stderr subscriber. `RUST_LOG` wins over `default_filter`.
///
/// Later calls are ignored.
pub fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new(QUIET_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Resolve the configuration for a `run` invocation.
///
/// Without `--config` or `--delay` the CLI runs unpaced.
///
/// # Errors
///
/// Returns the load or validation error of the config file.
pub fn resolve_config(opts: &RunOptions) -> SimResult<SimConfig> {
    let mut config = match opts.config_path {
        Some(ref path) => SimConfig::load(path)?,
        None => SimConfig::builder().delay_ms(0).build(),
    };

    if let Some(seed) = opts.seed {
        config.reproducibility.seed = seed;
    }
    if let Some(ms) = opts.delay_ms {
        config.pacing.delay_ms = ms;
    }
    Ok(config)
}

/// Build a simulator for `opts`, applying parameter overrides.
///
/// # Errors
///
/// Returns a config error or [`SimError::InvalidParameter`] for a rejected
/// override.
pub fn build_simulator(opts: &RunOptions) -> SimResult<(SimConfig, Simulator)> {
    let config = resolve_config(opts)?;
    let mut sim = Simulator::new(&config);

    let update = ParamsUpdate {
        probability_of_success: opts.probability,
        trials_per_experiment: opts.trials,
        number_of_experiments: opts.experiments,
    };
    if !update.is_empty() {
        sim.set_params(update)?;
    }
    if let Some(max_bins) = opts.capped {
        sim.set_binning(BinningPolicy::Capped { max_bins });
    }
    // Headless runs take the configured delay as-is, including zero.
    sim.set_delay_unclamped(Duration::from_millis(config.pacing.delay_ms));

    Ok((config, sim))
}

/// Drive one run on a current-thread tokio runtime.
///
/// Ctrl-C fires the run's cancel token; results gathered so far are kept.
///
/// # Errors
///
/// Returns I/O errors from the runtime and guard violations from the run.
pub fn execute_run(sim: &mut Simulator) -> SimResult<RunSummary> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| SimError::io(format!("failed to start runtime: {e}")))?;

    runtime.block_on(async {
        if !sim.start() {
            return Ok(sim.summary());
        }

        let token = sim.cancel_token();
        let listener = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, stopping run");
                token.cancel();
            }
        });

        let summary = sim.drive().await;
        listener.abort();
        summary
    })
}

/// Run a simulation and print its report.
#[must_use]
pub fn run_simulation(opts: &RunOptions) -> ExitCode {
    let built = build_simulator(opts);
    // Reports stay readable unless the config file asks for more.
    let filter = match (&built, &opts.config_path) {
        (Ok((config, _)), Some(_)) => config.logging.filter.as_str(),
        _ => QUIET_FILTER,
    };
    init_logging(filter);

    let (_, mut sim) = match built {
        Ok(built) => built,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(1);
        }
    };

    if !opts.json {
        println!("╔═══════════════════════════════════════════════════════════════╗");
        println!("║             binosim - Bernoulli Trial Simulator               ║");
        println!("╚═══════════════════════════════════════════════════════════════╝\n");
    }

    debug!(seed = sim.seed(), "starting CLI run");
    let result = execute_run(&mut sim);
    let snapshot = sim.snapshot();

    if opts.json {
        match serde_json::to_string_pretty(&snapshot) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error: {}", SimError::serialization(e.to_string()));
                return ExitCode::from(1);
            }
        }
    } else {
        print_run_report(&snapshot, opts.verbose);
    }

    match result {
        Ok(_) => ExitCode::SUCCESS,
        // Run faults are already part of the report as `last_error`.
        Err(e) if e.is_run_fault() => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Statistics over externally supplied success counts.
///
/// # Errors
///
/// Returns [`SimError::InvalidParameter`] for an empty list, bad parameters,
/// or a count above `trials`.
pub fn observed_results(
    values: &[u64],
    probability: f64,
    trials: u64,
) -> SimResult<(SimulationParams, Vec<ExperimentResult>)> {
    if values.is_empty() {
        return Err(SimError::invalid_parameter("values", "at least one value is required"));
    }
    let params = SimulationParams::new(probability, trials, values.len() as u64)?;
    if let Some(&bad) = values.iter().find(|&&v| v > trials) {
        return Err(SimError::invalid_parameter(
            "values",
            format!("{bad} exceeds {trials} trials"),
        ));
    }

    let results = values
        .iter()
        .enumerate()
        .map(|(i, &successes)| ExperimentResult {
            experiment_number: i as u64 + 1,
            successes,
            timestamp: Duration::ZERO,
        })
        .collect();
    Ok((params, results))
}

/// Print statistics and a histogram for given success counts.
#[must_use]
pub fn stats_command(values: &[u64], probability: f64, trials: u64) -> ExitCode {
    match observed_results(values, probability, trials) {
        Ok((params, results)) => {
            let histogram = compute_histogram(&results, BinningPolicy::Unlimited);
            let stats = compute_statistics(&results, &params);
            print_stats_report(&histogram, &stats, &params);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Validate a configuration file.
#[must_use]
pub fn validate_config(path: &Path) -> ExitCode {
    println!("╔═══════════════════════════════════════════════════════════════╗");
    println!("║            binosim - Configuration Validation                 ║");
    println!("╚═══════════════════════════════════════════════════════════════╝\n");

    println!("Validating: {}\n", path.display());

    match SimConfig::load(path) {
        Ok(config) => {
            println!("✓ Configuration is valid\n");
            print!("{}", format_config_summary(&config));
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("✗ Configuration is invalid\n");
            eprintln!("  {e}");
            ExitCode::from(1)
        }
    }
}
