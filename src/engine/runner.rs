//! Lazy, cancellable experiment stream.
//!
//! Each experiment is `trials_per_experiment` Bernoulli draws counted into a
//! single [`ExperimentResult`]. Cancellation is checked once per experiment,
//! before it starts; an experiment that has started always completes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use super::params::SimulationParams;
use super::rng::SimRng;

/// Outcome of one experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentResult {
    /// Sequential number, starting at 1.
    pub experiment_number: u64,
    /// Successes in `[0, trials_per_experiment]`.
    pub successes: u64,
    /// Monotonic creation time, measured from the start of the run.
    pub timestamp: Duration,
}

/// Shared cooperative cancellation flag.
///
/// Cloning yields a handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create an unfired token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Iterator over the experiments of one run.
///
/// Parameters are snapshotted when the runner is created.
///
/// # Example
///
/// ```rust
/// use binosim::engine::params::SimulationParams;
/// use binosim::engine::rng::SimRng;
/// use binosim::engine::runner::{CancelToken, ExperimentRunner};
///
/// let params = SimulationParams {
///     probability_of_success: 1.0,
///     trials_per_experiment: 10,
///     number_of_experiments: 5,
/// };
/// let runner = ExperimentRunner::new(params, SimRng::new(42), CancelToken::new());
/// let results: Vec<_> = runner.collect();
/// assert_eq!(results.len(), 5);
/// assert!(results.iter().all(|r| r.successes == 10));
/// ```
#[derive(Debug)]
pub struct ExperimentRunner {
    params: SimulationParams,
    rng: SimRng,
    cancel: CancelToken,
    next_index: u64,
    started: Instant,
}

impl ExperimentRunner {
    /// Create a runner over a parameter snapshot.
    #[must_use]
    pub fn new(params: SimulationParams, rng: SimRng, cancel: CancelToken) -> Self {
        Self {
            params,
            rng,
            cancel,
            next_index: 1,
            started: Instant::now(),
        }
    }

    /// Parameters this run was started with.
    #[must_use]
    pub const fn params(&self) -> &SimulationParams {
        &self.params
    }

    /// Experiments emitted so far.
    #[must_use]
    pub const fn completed(&self) -> u64 {
        self.next_index - 1
    }

    /// Experiments left before the run completes.
    #[must_use]
    pub const fn remaining(&self) -> u64 {
        self.params.number_of_experiments - self.completed()
    }

    /// Whether every experiment has been emitted.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.remaining() == 0
    }

    fn run_experiment(&mut self) -> ExperimentResult {
        let successes = self.rng.count_successes(
            self.params.trials_per_experiment,
            self.params.probability_of_success,
        );
        let result = ExperimentResult {
            experiment_number: self.next_index,
            successes,
            timestamp: self.started.elapsed(),
        };
        self.next_index += 1;
        result
    }
}

impl Iterator for ExperimentRunner {
    type Item = ExperimentResult;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_finished() || self.cancel.is_cancelled() {
            return None;
        }
        Some(self.run_experiment())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let upper = usize::try_from(self.remaining()).ok();
        (0, upper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(p: f64, trials: u64, experiments: u64) -> SimulationParams {
        SimulationParams {
            probability_of_success: p,
            trials_per_experiment: trials,
            number_of_experiments: experiments,
        }
    }

    #[test]
    fn test_emits_every_experiment_in_order() {
        let runner = ExperimentRunner::new(params(0.5, 20, 50), SimRng::new(42), CancelToken::new());
        let results: Vec<_> = runner.collect();
        assert_eq!(results.len(), 50);
        for (i, r) in results.iter().enumerate() {
            assert_eq!(r.experiment_number, i as u64 + 1);
            assert!(r.successes <= 20);
        }
    }

    #[test]
    fn test_timestamps_monotonic() {
        let runner = ExperimentRunner::new(params(0.5, 10, 20), SimRng::new(1), CancelToken::new());
        let results: Vec<_> = runner.collect();
        for pair in results.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }

    #[test]
    fn test_probability_zero_and_one() {
        let zeros = ExperimentRunner::new(params(0.0, 30, 10), SimRng::new(3), CancelToken::new());
        assert!(zeros.into_iter().all(|r| r.successes == 0));

        let ones = ExperimentRunner::new(params(1.0, 30, 10), SimRng::new(3), CancelToken::new());
        assert!(ones.into_iter().all(|r| r.successes == 30));
    }

    #[test]
    fn test_cancel_stops_before_next_experiment() {
        let token = CancelToken::new();
        let mut runner = ExperimentRunner::new(params(0.5, 10, 100), SimRng::new(5), token.clone());

        assert!(runner.next().is_some());
        assert!(runner.next().is_some());
        token.cancel();
        assert!(runner.next().is_none());
        assert_eq!(runner.completed(), 2);
        assert_eq!(runner.remaining(), 98);
    }

    #[test]
    fn test_same_seed_same_stream() {
        let a: Vec<u64> = ExperimentRunner::new(params(0.3, 40, 25), SimRng::new(11), CancelToken::new())
            .map(|r| r.successes)
            .collect();
        let b: Vec<u64> = ExperimentRunner::new(params(0.3, 40, 25), SimRng::new(11), CancelToken::new())
            .map(|r| r.successes)
            .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_size_hint_upper_bound() {
        let mut runner = ExperimentRunner::new(params(0.5, 1, 4), SimRng::new(0), CancelToken::new());
        assert_eq!(runner.size_hint(), (0, Some(4)));
        let _ = runner.next();
        assert_eq!(runner.size_hint(), (0, Some(3)));
    }

    #[test]
    fn test_cancel_token_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!token.is_cancelled());
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
