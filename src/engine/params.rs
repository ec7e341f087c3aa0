//! Simulation parameters and the parameter store.
//!
//! The store is the only place parameters are validated. The run loop reads a
//! snapshot and never re-validates.

use serde::{Deserialize, Serialize};
use tracing::warn;
use validator::Validate;

use crate::error::{SimError, SimResult};

/// Slack absorbed around `[0, 1]` when parsing probabilities from text.
pub const PROBABILITY_TOLERANCE: f64 = 1e-10;

/// Probability restored when the probability field is left empty.
pub const DEFAULT_PROBABILITY: f64 = 0.5;
/// Default trials per experiment.
pub const DEFAULT_TRIALS: u64 = 100;
/// Default number of experiments per run.
pub const DEFAULT_EXPERIMENTS: u64 = 1000;

/// Parameters of one simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct SimulationParams {
    /// Success probability of each Bernoulli trial.
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default = "default_probability")]
    pub probability_of_success: f64,
    /// Bernoulli trials per experiment.
    #[validate(range(min = 1))]
    #[serde(default = "default_trials")]
    pub trials_per_experiment: u64,
    /// Experiments per run.
    #[validate(range(min = 1))]
    #[serde(default = "default_experiments")]
    pub number_of_experiments: u64,
}

const fn default_probability() -> f64 {
    DEFAULT_PROBABILITY
}

const fn default_trials() -> u64 {
    DEFAULT_TRIALS
}

const fn default_experiments() -> u64 {
    DEFAULT_EXPERIMENTS
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            probability_of_success: DEFAULT_PROBABILITY,
            trials_per_experiment: DEFAULT_TRIALS,
            number_of_experiments: DEFAULT_EXPERIMENTS,
        }
    }
}

impl SimulationParams {
    /// Create parameters, checking every invariant.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidParameter`] for an out-of-range probability
    /// or a zero count.
    pub fn new(probability: f64, trials: u64, experiments: u64) -> SimResult<Self> {
        Ok(Self {
            probability_of_success: check_probability(probability)?,
            trials_per_experiment: check_count("trials_per_experiment", trials)?,
            number_of_experiments: check_count("number_of_experiments", experiments)?,
        })
    }

    /// Theoretical binomial mean `p * n`.
    #[must_use]
    pub fn expected_value(&self) -> f64 {
        self.probability_of_success * self.trials_per_experiment as f64
    }

    /// Theoretical binomial standard deviation `sqrt(n p (1 - p))`.
    #[must_use]
    pub fn theoretical_std_dev(&self) -> f64 {
        let p = self.probability_of_success;
        (self.trials_per_experiment as f64 * p * (1.0 - p)).sqrt()
    }

    /// Probability rendered as a percentage: 3 decimals below 1%, else 1.
    #[must_use]
    pub fn probability_label(&self) -> String {
        let p = self.probability_of_success;
        let decimals = if p < 0.01 { 3 } else { 1 };
        format!("{:.*}%", decimals, p * 100.0)
    }
}

/// Partial parameter update; `None` fields keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamsUpdate {
    /// New success probability.
    pub probability_of_success: Option<f64>,
    /// New trials per experiment.
    pub trials_per_experiment: Option<u64>,
    /// New number of experiments.
    pub number_of_experiments: Option<u64>,
}

impl ParamsUpdate {
    /// Update only the probability.
    #[must_use]
    pub const fn probability(p: f64) -> Self {
        Self {
            probability_of_success: Some(p),
            trials_per_experiment: None,
            number_of_experiments: None,
        }
    }

    /// Update only the trial count.
    #[must_use]
    pub const fn trials(n: u64) -> Self {
        Self {
            probability_of_success: None,
            trials_per_experiment: Some(n),
            number_of_experiments: None,
        }
    }

    /// Update only the experiment count.
    #[must_use]
    pub const fn experiments(n: u64) -> Self {
        Self {
            probability_of_success: None,
            trials_per_experiment: None,
            number_of_experiments: Some(n),
        }
    }

    /// True when no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.probability_of_success.is_none()
            && self.trials_per_experiment.is_none()
            && self.number_of_experiments.is_none()
    }
}

/// Which parameter a text input targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamField {
    /// `probability_of_success`
    Probability,
    /// `trials_per_experiment`
    Trials,
    /// `number_of_experiments`
    Experiments,
}

impl ParamField {
    /// All fields in display order.
    pub const ALL: [Self; 3] = [Self::Probability, Self::Trials, Self::Experiments];

    /// Field name used in errors.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Probability => "probability_of_success",
            Self::Trials => "trials_per_experiment",
            Self::Experiments => "number_of_experiments",
        }
    }

    /// Next field in display order (wraps).
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Probability => Self::Trials,
            Self::Trials => Self::Experiments,
            Self::Experiments => Self::Probability,
        }
    }
}

/// Holds the current parameters and the validity of the last input.
///
/// Rejected input never replaces a valid value.
#[derive(Debug, Clone, Default)]
pub struct ParamStore {
    params: SimulationParams,
    invalid_field: Option<ParamField>,
}

impl ParamStore {
    /// Create a store holding `params`.
    #[must_use]
    pub const fn new(params: SimulationParams) -> Self {
        Self {
            params,
            invalid_field: None,
        }
    }

    /// Current parameters.
    #[must_use]
    pub const fn params(&self) -> &SimulationParams {
        &self.params
    }

    /// Whether the most recent input was rejected.
    #[must_use]
    pub const fn is_last_input_invalid(&self) -> bool {
        self.invalid_field.is_some()
    }

    /// Field of the most recently rejected input, if any.
    #[must_use]
    pub const fn invalid_field(&self) -> Option<ParamField> {
        self.invalid_field
    }

    /// Merge a partial update. All fields are checked before any is applied.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidParameter`] and sets the invalid flag when
    /// any field is out of range. The stored parameters are unchanged.
    pub fn apply(&mut self, update: ParamsUpdate) -> SimResult<SimulationParams> {
        let mut next = self.params;

        if let Some(p) = update.probability_of_success {
            next.probability_of_success = self.accept(ParamField::Probability, check_probability(p))?;
        }
        if let Some(n) = update.trials_per_experiment {
            next.trials_per_experiment =
                self.accept(ParamField::Trials, check_count(ParamField::Trials.name(), n))?;
        }
        if let Some(n) = update.number_of_experiments {
            next.number_of_experiments = self.accept(
                ParamField::Experiments,
                check_count(ParamField::Experiments.name(), n),
            )?;
        }

        self.params = next;
        self.invalid_field = None;
        Ok(next)
    }

    /// Parse text input for `field` and apply it.
    ///
    /// Empty probability input is treated as "still typing": it is flagged
    /// invalid, and the stored value is kept.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidParameter`] for unparseable or out-of-range
    /// text.
    pub fn apply_text(&mut self, field: ParamField, text: &str) -> SimResult<SimulationParams> {
        let text = text.trim();
        let update = match field {
            ParamField::Probability => {
                let parsed = text.parse::<f64>().map_err(|_| {
                    SimError::invalid_parameter(field.name(), format!("'{text}' is not a number"))
                });
                ParamsUpdate::probability(self.accept(field, parsed)?)
            }
            ParamField::Trials | ParamField::Experiments => {
                let parsed = text.parse::<u64>().map_err(|_| {
                    SimError::invalid_parameter(
                        field.name(),
                        format!("'{text}' is not a positive integer"),
                    )
                });
                let n = self.accept(field, parsed)?;
                if field == ParamField::Trials {
                    ParamsUpdate::trials(n)
                } else {
                    ParamsUpdate::experiments(n)
                }
            }
        };
        self.apply(update)
    }

    /// Restore the default probability (empty field left by the user).
    pub fn restore_default_probability(&mut self) -> SimulationParams {
        self.params.probability_of_success = DEFAULT_PROBABILITY;
        self.invalid_field = None;
        self.params
    }

    /// Record the outcome of one field check.
    fn accept<T>(&mut self, field: ParamField, result: SimResult<T>) -> SimResult<T> {
        if let Err(ref e) = result {
            warn!(field = field.name(), error = %e, "parameter input rejected");
            self.invalid_field = Some(field);
        }
        result
    }
}

/// Check a probability against `[0, 1]` with [`PROBABILITY_TOLERANCE`].
///
/// Values inside the tolerance band are clamped onto the interval.
///
/// # Errors
///
/// Returns [`SimError::InvalidParameter`] for NaN or out-of-range values.
pub fn check_probability(p: f64) -> SimResult<f64> {
    if p.is_nan() || p < -PROBABILITY_TOLERANCE || p > 1.0 + PROBABILITY_TOLERANCE {
        return Err(SimError::invalid_parameter(
            ParamField::Probability.name(),
            format!("{p} must be between 0.0 and 1.0"),
        ));
    }
    Ok(p.clamp(0.0, 1.0))
}

fn check_count(field: &'static str, n: u64) -> SimResult<u64> {
    if n == 0 {
        return Err(SimError::invalid_parameter(field, "must be a positive integer"));
    }
    Ok(n)
}
