//! # binosim
//!
//! Reproducible Bernoulli trial simulator.
//!
//! Runs batches of independent Bernoulli trials, aggregates the success
//! counts into a histogram and tests them against the binomial expectation:
//! - Deterministic: PCG streams partitioned from one master seed
//! - Cancellable: cooperative stop between experiments, partial results kept
//! - Stop-on-error: every emitted result passes a guard before it is stored
//!
//! ## Example
//!
//! ```rust
//! use binosim::prelude::*;
//!
//! let config = SimConfig::builder().seed(42).delay_ms(0).build();
//! let mut sim = Simulator::new(&config);
//! sim.set_params(ParamsUpdate::experiments(100)).ok();
//! sim.run_blocking().ok();
//!
//! assert_eq!(sim.histogram().total(), 100);
//! assert!(sim.statistics().p_value <= 1.0);
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::suboptimal_flops,  // Horner form of the erf polynomial
    clippy::imprecise_flops,
    clippy::too_many_lines,
    clippy::missing_const_for_fn,
)]

pub mod cli;
pub mod config;
pub mod domains;
pub mod engine;
pub mod error;
pub mod tui;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{SimConfig, SimConfigBuilder};
    pub use crate::domains::histogram::{BinningPolicy, Histogram};
    pub use crate::domains::statistics::{SelectedBarStats, SimulationStats};
    pub use crate::engine::params::{ParamField, ParamsUpdate, SimulationParams};
    pub use crate::engine::rng::SimRng;
    pub use crate::engine::runner::{CancelToken, ExperimentResult};
    pub use crate::engine::{RunOutcome, RunSummary, SimulationSnapshot, Simulator};
    pub use crate::error::{SimError, SimResult};
}

/// Re-export for public API
pub use error::{SimError, SimResult};
