//! CLI argument parsing.
//!
//! Hand-rolled parser for the binosim CLI. Takes any iterator of strings so
//! the parsing logic is testable without touching `std::env`.

use std::path::PathBuf;

use crate::domains::histogram::DEFAULT_MAX_BINS;
use crate::engine::params::{DEFAULT_PROBABILITY, DEFAULT_TRIALS};

/// CLI arguments container.
#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    /// The command to execute.
    pub command: Command,
}

/// Options of the `run` command. `None` keeps the configured value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOptions {
    /// YAML configuration file.
    pub config_path: Option<PathBuf>,
    /// Success probability override.
    pub probability: Option<f64>,
    /// Trials per experiment override.
    pub trials: Option<u64>,
    /// Number of experiments override.
    pub experiments: Option<u64>,
    /// Seed override.
    pub seed: Option<u64>,
    /// Pacing override in milliseconds.
    pub delay_ms: Option<u64>,
    /// Bin cap; enables capped binning.
    pub capped: Option<u64>,
    /// Print a JSON snapshot instead of the text report.
    pub json: bool,
    /// Enable verbose output.
    pub verbose: bool,
}

/// Available CLI commands.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Run a simulation
    Run(RunOptions),
    /// Compute statistics for given success counts
    Stats {
        /// Observed success counts.
        values: Vec<u64>,
        /// Success probability.
        probability: f64,
        /// Trials per experiment.
        trials: u64,
    },
    /// Validate a configuration file
    Validate {
        /// Path to the YAML configuration.
        config_path: PathBuf,
    },
    /// Show help
    Help,
    /// Unusable arguments; the parser has already reported why
    Invalid,
    /// Show version
    Version,
}

impl Args {
    /// Parse command-line arguments from an iterator.
    ///
    /// This method is testable as it accepts any iterator of strings,
    /// not just `std::env::args()`.
    #[must_use]
    pub fn parse_from<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();
        Self::parse_from_vec(&args)
    }

    /// Parse command-line arguments from the environment.
    #[must_use]
    pub fn parse() -> Self {
        Self::parse_from(std::env::args())
    }

    fn parse_from_vec(args: &[String]) -> Self {
        if args.len() < 2 {
            return Self {
                command: Command::Help,
            };
        }

        let command = match args[1].as_str() {
            "run" => Self::parse_run_command(&args[2..]),
            "stats" => Self::parse_stats_command(&args[2..]),
            "validate" => Self::parse_validate_command(args),
            "-h" | "--help" | "help" => Command::Help,
            "-V" | "--version" | "version" => Command::Version,
            unknown => {
                eprintln!("Unknown command: {unknown}");
                Command::Invalid
            }
        };

        Self { command }
    }

    /// Parse the 'run' command arguments.
    fn parse_run_command(args: &[String]) -> Command {
        let mut opts = RunOptions::default();

        let mut i = 0;
        while i < args.len() {
            let flag = args[i].as_str();
            let value = args.get(i + 1).map(String::as_str);
            match flag {
                "-c" | "--config" => match value {
                    Some(path) => {
                        opts.config_path = Some(PathBuf::from(path));
                        i += 2;
                    }
                    None => return missing_value(flag),
                },
                "-p" | "--probability" => match parse_value(flag, value) {
                    Some(p) => {
                        opts.probability = Some(p);
                        i += 2;
                    }
                    None => return Command::Invalid,
                },
                "-t" | "--trials" => match parse_value(flag, value) {
                    Some(n) => {
                        opts.trials = Some(n);
                        i += 2;
                    }
                    None => return Command::Invalid,
                },
                "-n" | "--experiments" => match parse_value(flag, value) {
                    Some(n) => {
                        opts.experiments = Some(n);
                        i += 2;
                    }
                    None => return Command::Invalid,
                },
                "--seed" => match parse_value(flag, value) {
                    Some(seed) => {
                        opts.seed = Some(seed);
                        i += 2;
                    }
                    None => return Command::Invalid,
                },
                "--delay" => match parse_value(flag, value) {
                    Some(ms) => {
                        opts.delay_ms = Some(ms);
                        i += 2;
                    }
                    None => return Command::Invalid,
                },
                "--capped" => {
                    // Bin cap is optional: `--capped` alone uses the default.
                    match value.and_then(|v| v.parse::<u64>().ok()) {
                        Some(bins) => {
                            opts.capped = Some(bins);
                            i += 2;
                        }
                        None => {
                            opts.capped = Some(DEFAULT_MAX_BINS);
                            i += 1;
                        }
                    }
                }
                "--json" => {
                    opts.json = true;
                    i += 1;
                }
                "-v" | "--verbose" => {
                    opts.verbose = true;
                    i += 1;
                }
                unknown => {
                    eprintln!("Warning: ignoring unknown option '{unknown}'");
                    i += 1;
                }
            }
        }

        Command::Run(opts)
    }

    /// Parse the 'stats' command arguments.
    fn parse_stats_command(args: &[String]) -> Command {
        let mut values = None;
        let mut probability = DEFAULT_PROBABILITY;
        let mut trials = DEFAULT_TRIALS;

        let mut i = 0;
        while i < args.len() {
            let flag = args[i].as_str();
            let value = args.get(i + 1).map(String::as_str);
            match flag {
                "--values" => {
                    let Some(list) = value else {
                        return missing_value(flag);
                    };
                    let parsed: Result<Vec<u64>, _> = list
                        .split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::parse)
                        .collect();
                    match parsed {
                        Ok(v) => values = Some(v),
                        Err(_) => {
                            eprintln!("Error: --values expects comma-separated integers");
                            return Command::Invalid;
                        }
                    }
                    i += 2;
                }
                "-p" | "--probability" => match parse_value(flag, value) {
                    Some(p) => {
                        probability = p;
                        i += 2;
                    }
                    None => return Command::Invalid,
                },
                "-t" | "--trials" => match parse_value(flag, value) {
                    Some(n) => {
                        trials = n;
                        i += 2;
                    }
                    None => return Command::Invalid,
                },
                unknown => {
                    eprintln!("Warning: ignoring unknown option '{unknown}'");
                    i += 1;
                }
            }
        }

        match values {
            Some(values) => Command::Stats {
                values,
                probability,
                trials,
            },
            None => {
                eprintln!("Error: 'stats' command requires --values");
                Command::Invalid
            }
        }
    }

    /// Parse the 'validate' command arguments.
    fn parse_validate_command(args: &[String]) -> Command {
        if args.len() < 3 {
            eprintln!("Error: 'validate' command requires a config path");
            return Command::Invalid;
        }

        Command::Validate {
            config_path: PathBuf::from(&args[2]),
        }
    }
}

fn missing_value(flag: &str) -> Command {
    eprintln!("Error: {flag} requires a value");
    Command::Invalid
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<&str>) -> Option<T> {
    let Some(raw) = value else {
        eprintln!("Error: {flag} requires a value");
        return None;
    };
    let parsed = raw.parse().ok();
    if parsed.is_none() {
        eprintln!("Error: invalid value '{raw}' for {flag}");
    }
    parsed
}
