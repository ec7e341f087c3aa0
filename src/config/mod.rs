//! Configuration system with YAML schema and validation.
//!
//! Implements mistake-proofing through:
//! - Type-safe configuration structs
//! - Range validation via `validator`
//! - Runtime semantic validation

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use validator::Validate;

use crate::domains::histogram::{BinningPolicy, DEFAULT_MAX_BINS};
use crate::engine::params::{check_probability, SimulationParams};
use crate::error::{SimError, SimResult};

/// Top-level simulator configuration.
///
/// Loaded from YAML files with full schema validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SimConfig {
    /// Schema version for forward compatibility.
    #[validate(length(min = 1))]
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Reproducibility settings.
    #[validate(nested)]
    #[serde(default)]
    pub reproducibility: ReproducibilityConfig,

    /// Initial run parameters.
    #[validate(nested)]
    #[serde(default)]
    pub simulation: SimulationParams,

    /// Pacing between experiments.
    #[validate(nested)]
    #[serde(default)]
    pub pacing: PacingConfig,

    /// Histogram binning.
    #[validate(nested)]
    #[serde(default)]
    pub histogram: HistogramConfig,

    /// Visualization configuration.
    #[validate(nested)]
    #[serde(default)]
    pub visualization: VisualizationConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_schema_version() -> String {
    "1.0".to_string()
}

impl SimConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - YAML parsing fails
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> SimResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string.
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails.
    pub fn from_yaml(yaml: &str) -> SimResult<Self> {
        let mut config: Self = serde_yaml::from_str(yaml)?;
        config.clamp_probability();
        config.validate()?;
        config.validate_semantic()?;
        Ok(config)
    }

    /// Serialize to YAML.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Serialization`] if encoding fails.
    pub fn to_yaml(&self) -> SimResult<String> {
        serde_yaml::to_string(self).map_err(|e| SimError::serialization(e.to_string()))
    }

    /// Create a builder for configuration.
    #[must_use]
    pub fn builder() -> SimConfigBuilder {
        SimConfigBuilder::default()
    }

    /// Pull a probability within the tolerance band onto `[0, 1]`.
    ///
    /// Values further out are left for schema validation to reject.
    fn clamp_probability(&mut self) {
        if let Ok(p) = check_probability(self.simulation.probability_of_success) {
            self.simulation.probability_of_success = p;
        }
    }

    /// Validate semantic constraints beyond schema.
    fn validate_semantic(&self) -> SimResult<()> {
        if self.simulation.probability_of_success.is_nan() {
            return Err(SimError::config("probability_of_success must be a number"));
        }

        if self.histogram.policy == PolicyKind::Capped && self.histogram.max_bins == 0 {
            return Err(SimError::config("capped histogram needs at least one bin"));
        }

        if self.logging.filter.trim().is_empty() {
            return Err(SimError::config("logging filter must not be empty"));
        }

        Ok(())
    }

    /// Binning policy described by the `histogram` section.
    #[must_use]
    pub const fn binning_policy(&self) -> BinningPolicy {
        match self.histogram.policy {
            PolicyKind::Unlimited => BinningPolicy::Unlimited,
            PolicyKind::Capped => BinningPolicy::Capped {
                max_bins: self.histogram.max_bins,
            },
        }
    }

    /// Pacing delay between experiments.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        Duration::from_millis(self.pacing.delay_ms)
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            reproducibility: ReproducibilityConfig::default(),
            simulation: SimulationParams::default(),
            pacing: PacingConfig::default(),
            histogram: HistogramConfig::default(),
            visualization: VisualizationConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration builder for programmatic construction.
#[derive(Debug, Default)]
pub struct SimConfigBuilder {
    seed: Option<u64>,
    params: Option<SimulationParams>,
    delay_ms: Option<u64>,
    binning: Option<BinningPolicy>,
}

impl SimConfigBuilder {
    /// Set the random seed.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the initial run parameters.
    #[must_use]
    pub const fn params(mut self, params: SimulationParams) -> Self {
        self.params = Some(params);
        self
    }

    /// Set the pacing delay in milliseconds.
    #[must_use]
    pub const fn delay_ms(mut self, ms: u64) -> Self {
        self.delay_ms = Some(ms);
        self
    }

    /// Set the binning policy.
    #[must_use]
    pub const fn binning(mut self, policy: BinningPolicy) -> Self {
        self.binning = Some(policy);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> SimConfig {
        let mut config = SimConfig::default();

        if let Some(seed) = self.seed {
            config.reproducibility.seed = seed;
        }

        if let Some(params) = self.params {
            config.simulation = params;
        }

        if let Some(ms) = self.delay_ms {
            config.pacing.delay_ms = ms;
        }

        if let Some(policy) = self.binning {
            config.histogram = match policy {
                BinningPolicy::Unlimited => HistogramConfig::default(),
                BinningPolicy::Capped { max_bins } => HistogramConfig {
                    policy: PolicyKind::Capped,
                    max_bins,
                },
            };
        }

        config
    }
}

/// Reproducibility settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ReproducibilityConfig {
    /// Master seed for all RNG streams.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

const fn default_seed() -> u64 {
    42
}

impl Default for ReproducibilityConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
        }
    }
}

/// Pacing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct PacingConfig {
    /// Delay between experiments in milliseconds (0 runs flat out).
    #[validate(range(max = 60_000))]
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

const fn default_delay_ms() -> u64 {
    30
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
        }
    }
}

/// Histogram binning policy name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    /// One bin per success count.
    #[default]
    Unlimited,
    /// At most `max_bins` range bins.
    Capped,
}

/// Histogram configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct HistogramConfig {
    /// Binning policy.
    #[serde(default)]
    pub policy: PolicyKind,
    /// Bin cap for the capped policy.
    #[validate(range(min = 1, max = 1000))]
    #[serde(default = "default_max_bins")]
    pub max_bins: u64,
}

const fn default_max_bins() -> u64 {
    DEFAULT_MAX_BINS
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            policy: PolicyKind::Unlimited,
            max_bins: default_max_bins(),
        }
    }
}

/// Visualization configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct VisualizationConfig {
    /// TUI configuration.
    #[validate(nested)]
    #[serde(default)]
    pub tui: TuiConfig,
}

/// TUI visualization configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct TuiConfig {
    /// Redraw rate in Hz.
    #[validate(range(min = 1, max = 240))]
    #[serde(default = "default_refresh_hz")]
    pub refresh_hz: u32,
}

const fn default_refresh_hz() -> u32 {
    30
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            refresh_hz: default_refresh_hz(),
        }
    }
}

impl TuiConfig {
    /// Time between redraws.
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        Duration::from_micros(1_000_000 / u64::from(self.refresh_hz.max(1)))
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive, used when `RUST_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}
