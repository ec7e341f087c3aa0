//! Derived views over an experiment result set.
//!
//! - Histogram: frequency of each success count (or count range)
//! - Statistics: summary moments and two-tailed z-tests against the binomial

pub mod histogram;
pub mod statistics;

pub use histogram::{compute_histogram, BinningPolicy, Histogram, HistogramBin};
pub use statistics::{
    compute_selected_bar_stats, compute_statistics, normal_cdf, SelectedBarStats, SimulationStats,
};
