//! Stop-on-error guard for the run loop.
//!
//! Every emitted experiment is checked before it is appended to the result
//! set. A violation stops the line: the run goes idle, results already
//! appended stay, nothing is rolled back.

use serde::{Deserialize, Serialize};

use super::params::SimulationParams;
use super::runner::ExperimentResult;
use crate::error::SimError;

/// Anomaly detected in an emitted experiment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuardViolation {
    /// More successes than trials.
    SuccessesExceedTrials {
        /// Offending experiment.
        experiment: u64,
        /// Reported successes.
        successes: u64,
        /// Trials per experiment.
        trials: u64,
    },
    /// Experiment number is not the next in sequence.
    OutOfSequence {
        /// Expected experiment number.
        expected: u64,
        /// Received experiment number.
        found: u64,
    },
}

impl From<GuardViolation> for SimError {
    fn from(v: GuardViolation) -> Self {
        match v {
            GuardViolation::SuccessesExceedTrials {
                experiment,
                successes,
                trials,
            } => Self::GuardViolation {
                experiment,
                reason: format!("successes {successes} exceed trials {trials}"),
            },
            GuardViolation::OutOfSequence { expected, found } => Self::GuardViolation {
                experiment: found,
                reason: format!("expected experiment {expected}"),
            },
        }
    }
}

/// Per-run guard state.
#[derive(Debug, Clone)]
pub struct RunGuard {
    trials: u64,
    expected_next: u64,
}

impl RunGuard {
    /// Create a guard for a run over `params`.
    #[must_use]
    pub const fn new(params: &SimulationParams) -> Self {
        Self {
            trials: params.trials_per_experiment,
            expected_next: 1,
        }
    }

    /// Check one result and advance the expected sequence number.
    ///
    /// # Errors
    ///
    /// Returns the violation found; the guard state is not advanced.
    pub fn check(&mut self, result: &ExperimentResult) -> Result<(), GuardViolation> {
        if result.experiment_number != self.expected_next {
            return Err(GuardViolation::OutOfSequence {
                expected: self.expected_next,
                found: result.experiment_number,
            });
        }
        if result.successes > self.trials {
            return Err(GuardViolation::SuccessesExceedTrials {
                experiment: result.experiment_number,
                successes: result.successes,
                trials: self.trials,
            });
        }
        self.expected_next += 1;
        Ok(())
    }
}
