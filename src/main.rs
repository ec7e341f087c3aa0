//! binosim CLI - Bernoulli trial simulator
//!
//! Command-line interface for running simulations.

use std::process::ExitCode;

use binosim::cli::{run_cli, Args};

fn main() -> ExitCode {
    run_cli(Args::parse())
}
