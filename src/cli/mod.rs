//! CLI module for binosim.
//!
//! All CLI logic lives here so it can be tested; `main.rs` only calls
//! [`run_cli`].

mod args;
mod commands;
mod output;

pub use args::{Args, Command, RunOptions};
pub use commands::{
    build_simulator, execute_run, init_logging, observed_results, resolve_config, run_cli,
    run_simulation, stats_command, validate_config,
};
pub use output::{
    format_config_summary, format_histogram, format_statistics, print_help, print_run_report,
    print_stats_report, print_version, version_string,
};
