//! Core simulation engine.
//!
//! Implements the experiment loop with:
//! - Deterministic RNG (PCG with partitioned seeds)
//! - A validated parameter store
//! - Cooperative, per-experiment cancellation with inter-step pacing
//! - A stop-on-error guard over every emitted result
//!
//! [`Simulator`] is the single writer of the result set. Derived histogram
//! and statistics are recomputed on read and memoized until the next change.

pub mod guard;
pub mod params;
pub mod rng;
pub mod runner;

use std::cell::OnceCell;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub use guard::{GuardViolation, RunGuard};
pub use params::{ParamField, ParamStore, ParamsUpdate, SimulationParams};
pub use rng::SimRng;
pub use runner::{CancelToken, ExperimentResult, ExperimentRunner};

use crate::config::SimConfig;
use crate::domains::histogram::{compute_histogram, BinningPolicy, Histogram};
use crate::domains::statistics::{
    compute_selected_bar_stats, compute_statistics, SelectedBarStats, SimulationStats,
};
use crate::error::{SimError, SimResult};

/// Fastest interactive pacing.
pub const MIN_DELAY_MS: u64 = 10;
/// Slowest interactive pacing.
pub const MAX_DELAY_MS: u64 = 200;

/// How the most recent run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunOutcome {
    /// No run has ended since the last reset.
    #[default]
    Idle,
    /// Every requested experiment was emitted.
    Completed,
    /// Stopped through [`Simulator::stop`] or the cancel token.
    Cancelled,
    /// Aborted by the run guard.
    Faulted,
}

/// Summary returned by the run drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Experiments in the result set.
    pub completed: u64,
    /// Experiments the run was started with.
    pub requested: u64,
    /// How the run ended.
    pub outcome: RunOutcome,
}

/// Serializable view of everything the simulator exposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    /// Master seed of the session.
    pub seed: u64,
    /// Current parameters.
    pub params: SimulationParams,
    /// Whether a run is active.
    pub running: bool,
    /// Experiments completed in the current run.
    pub progress: u64,
    /// How the most recent run ended.
    pub outcome: RunOutcome,
    /// Result set.
    pub results: Vec<ExperimentResult>,
    /// Derived histogram.
    pub histogram: Histogram,
    /// Derived statistics.
    pub statistics: SimulationStats,
    /// Statistics of the selected bar, if any.
    pub selected_bar: Option<SelectedBarStats>,
    /// Message of the last run fault, if any.
    pub last_error: Option<String>,
}

struct ActiveRun {
    runner: ExperimentRunner,
    guard: RunGuard,
}

/// Controller over parameters, runs and derived state.
///
/// # Example
///
/// ```rust
/// use binosim::config::SimConfig;
/// use binosim::engine::{ParamsUpdate, Simulator};
///
/// let config = SimConfig::builder().seed(7).delay_ms(0).build();
/// let mut sim = Simulator::new(&config);
/// sim.set_params(ParamsUpdate::experiments(20)).ok();
///
/// let summary = sim.run_blocking().ok();
/// assert_eq!(summary.map(|s| s.completed), Some(20));
/// assert_eq!(sim.histogram().total(), 20);
/// ```
pub struct Simulator {
    store: ParamStore,
    rng: SimRng,
    binning: BinningPolicy,
    delay: Duration,
    results: Vec<ExperimentResult>,
    progress: u64,
    active: Option<ActiveRun>,
    cancel: CancelToken,
    outcome: RunOutcome,
    selected: Option<u64>,
    last_error: Option<String>,
    version: u64,
    histogram_cache: OnceCell<Histogram>,
    stats_cache: OnceCell<SimulationStats>,
}

impl std::fmt::Debug for Simulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("params", self.store.params())
            .field("running", &self.is_running())
            .field("progress", &self.progress)
            .field("results", &self.results.len())
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new(&SimConfig::default())
    }
}

impl Simulator {
    /// Create a simulator from configuration.
    #[must_use]
    pub fn new(config: &SimConfig) -> Self {
        Self {
            store: ParamStore::new(config.simulation),
            rng: SimRng::new(config.reproducibility.seed),
            binning: config.binning_policy(),
            delay: config.delay(),
            results: Vec::new(),
            progress: 0,
            active: None,
            cancel: CancelToken::new(),
            outcome: RunOutcome::Idle,
            selected: None,
            last_error: None,
            version: 0,
            histogram_cache: OnceCell::new(),
            stats_cache: OnceCell::new(),
        }
    }

    // ===== Parameters =====

    /// Current parameters.
    #[must_use]
    pub const fn params(&self) -> &SimulationParams {
        self.store.params()
    }

    /// Whether the last parameter input was rejected.
    #[must_use]
    pub const fn is_last_input_invalid(&self) -> bool {
        self.store.is_last_input_invalid()
    }

    /// Field of the last rejected input.
    #[must_use]
    pub const fn invalid_field(&self) -> Option<ParamField> {
        self.store.invalid_field()
    }

    /// Merge a partial parameter update and clear the result set.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] while a run is active and
    /// [`SimError::InvalidParameter`] for rejected values. Neither clears
    /// the results.
    pub fn set_params(&mut self, update: ParamsUpdate) -> SimResult<SimulationParams> {
        self.ensure_idle()?;
        let params = self.store.apply(update)?;
        self.clear_results();
        Ok(params)
    }

    /// Parse text input for one field, then behave like [`Self::set_params`].
    ///
    /// # Errors
    ///
    /// See [`Self::set_params`].
    pub fn set_param_text(&mut self, field: ParamField, text: &str) -> SimResult<SimulationParams> {
        self.ensure_idle()?;
        let params = self.store.apply_text(field, text)?;
        self.clear_results();
        Ok(params)
    }

    /// Put back the default probability after an empty input.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] while a run is active.
    pub fn restore_default_probability(&mut self) -> SimResult<SimulationParams> {
        self.ensure_idle()?;
        let params = self.store.restore_default_probability();
        self.clear_results();
        Ok(params)
    }

    // ===== Pacing and binning =====

    /// Delay between experiments.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Set the interactive pacing, clamped to `[MIN_DELAY_MS, MAX_DELAY_MS]`.
    pub fn set_delay(&mut self, ms: u64) {
        self.delay = Duration::from_millis(ms.clamp(MIN_DELAY_MS, MAX_DELAY_MS));
    }

    /// Set pacing without clamping (`Duration::ZERO` for headless runs).
    pub fn set_delay_unclamped(&mut self, delay: Duration) {
        self.delay = delay;
    }

    /// Current binning policy.
    #[must_use]
    pub const fn binning(&self) -> BinningPolicy {
        self.binning
    }

    /// Change the binning policy. The selection is kept by value.
    pub fn set_binning(&mut self, policy: BinningPolicy) {
        self.binning = policy;
        self.histogram_cache = OnceCell::new();
    }

    // ===== Run control =====

    /// Whether a run is active.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Experiments completed in the current run (`0..=number_of_experiments`).
    #[must_use]
    pub const fn progress(&self) -> u64 {
        self.progress
    }

    /// How the most recent run ended.
    #[must_use]
    pub const fn outcome(&self) -> RunOutcome {
        self.outcome
    }

    /// Message of the last run fault.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Master seed the session's runs are drawn from.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.rng.master_seed()
    }

    /// Cancellation handle of the active (or most recent) run.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Begin a run. Returns `false` without effect if one is already active.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            debug!("start ignored: run already active");
            return false;
        }

        self.clear_results();
        self.last_error = None;
        self.outcome = RunOutcome::Idle;
        self.cancel = CancelToken::new();

        let params = *self.store.params();
        let runner = ExperimentRunner::new(params, self.rng.next_stream(), self.cancel.clone());
        self.active = Some(ActiveRun {
            guard: RunGuard::new(&params),
            runner,
        });

        debug!(
            probability = params.probability_of_success,
            trials = params.trials_per_experiment,
            experiments = params.number_of_experiments,
            "run started"
        );
        true
    }

    /// Run one experiment of the active run.
    ///
    /// Returns `Ok(None)` when no run is active or the run just ended.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::GuardViolation`] when the emitted result fails the
    /// guard. The run is then idle and earlier results are kept.
    pub fn step(&mut self) -> SimResult<Option<ExperimentResult>> {
        let Some(active) = self.active.as_mut() else {
            return Ok(None);
        };

        let Some(result) = active.runner.next() else {
            let outcome = if active.runner.is_finished() {
                RunOutcome::Completed
            } else {
                RunOutcome::Cancelled
            };
            self.finish(outcome);
            return Ok(None);
        };

        let finished = active.runner.is_finished();
        self.record(result)?;

        if finished {
            self.finish(RunOutcome::Completed);
        }
        Ok(Some(result))
    }

    /// Request cancellation. Results already appended are kept.
    pub fn stop(&mut self) {
        if self.is_running() {
            self.cancel.cancel();
            self.finish(RunOutcome::Cancelled);
        }
    }

    /// Clear results, progress, run state and selection.
    pub fn reset(&mut self) {
        if self.is_running() {
            self.cancel.cancel();
            self.active = None;
        }
        self.clear_results();
        self.outcome = RunOutcome::Idle;
        self.last_error = None;
        debug!("simulator reset");
    }

    /// Drive the active run to its end, sleeping between experiments.
    ///
    /// # Errors
    ///
    /// Propagates a guard violation from [`Self::step`].
    pub fn drive_blocking(&mut self) -> SimResult<RunSummary> {
        while self.step()?.is_some() {
            if self.is_running() && !self.delay.is_zero() {
                std::thread::sleep(self.delay);
            }
        }
        Ok(self.summary())
    }

    /// Async variant of [`Self::drive_blocking`] using `tokio::time::sleep`.
    ///
    /// With zero pacing the loop still yields to the runtime after every
    /// experiment so other tasks (a Ctrl-C listener) can fire the token.
    ///
    /// # Errors
    ///
    /// Propagates a guard violation from [`Self::step`].
    pub async fn drive(&mut self) -> SimResult<RunSummary> {
        while self.step()?.is_some() {
            if !self.is_running() {
                break;
            }
            if self.delay.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(self.delay).await;
            }
        }
        Ok(self.summary())
    }

    /// Start and drive a run on the current thread.
    ///
    /// A run that is already active is left alone and its summary returned.
    ///
    /// # Errors
    ///
    /// Propagates a guard violation from [`Self::step`].
    pub fn run_blocking(&mut self) -> SimResult<RunSummary> {
        if !self.start() {
            return Ok(self.summary());
        }
        self.drive_blocking()
    }

    /// Start and drive a run asynchronously.
    ///
    /// # Errors
    ///
    /// Propagates a guard violation from [`Self::step`].
    pub async fn run(&mut self) -> SimResult<RunSummary> {
        if !self.start() {
            return Ok(self.summary());
        }
        self.drive().await
    }

    /// Summary of the current or most recent run.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        let requested = self
            .active
            .as_ref()
            .map_or(self.params().number_of_experiments, |a| {
                a.runner.params().number_of_experiments
            });
        RunSummary {
            completed: self.results.len() as u64,
            requested,
            outcome: self.outcome,
        }
    }

    // ===== Derived state =====

    /// Result set in experiment order.
    #[must_use]
    pub fn results(&self) -> &[ExperimentResult] {
        &self.results
    }

    /// Counter bumped on every result-set change.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Histogram of the result set.
    #[must_use]
    pub fn histogram(&self) -> &Histogram {
        self.histogram_cache
            .get_or_init(|| compute_histogram(&self.results, self.binning))
    }

    /// Statistics of the result set under the current parameters.
    #[must_use]
    pub fn statistics(&self) -> &SimulationStats {
        self.stats_cache
            .get_or_init(|| compute_statistics(&self.results, self.store.params()))
    }

    /// Select the success count shown by histogram bar `index`.
    ///
    /// Returns the selected value, or `None` (no change) for an empty
    /// histogram or an out-of-range index.
    pub fn select_bar(&mut self, index: usize) -> Option<u64> {
        let value = self.histogram().value_at(index)?;
        self.selected = Some(value);
        Some(value)
    }

    /// Drop the bar selection.
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Selected success count.
    #[must_use]
    pub const fn selected_bar(&self) -> Option<u64> {
        self.selected
    }

    /// Histogram index of the selected success count.
    #[must_use]
    pub fn selected_index(&self) -> Option<usize> {
        self.selected.and_then(|v| self.histogram().index_of(v))
    }

    /// Statistics of the selected success count.
    #[must_use]
    pub fn selected_bar_stats(&self) -> Option<SelectedBarStats> {
        let selected = self.selected?;
        compute_selected_bar_stats(&self.results, self.store.params(), selected)
    }

    /// Owned snapshot of all observables.
    #[must_use]
    pub fn snapshot(&self) -> SimulationSnapshot {
        SimulationSnapshot {
            seed: self.seed(),
            params: *self.params(),
            running: self.is_running(),
            progress: self.progress,
            outcome: self.outcome,
            results: self.results.clone(),
            histogram: self.histogram().clone(),
            statistics: *self.statistics(),
            selected_bar: self.selected_bar_stats(),
            last_error: self.last_error.clone(),
        }
    }

    // ===== Internals =====

    fn ensure_idle(&self) -> SimResult<()> {
        if self.is_running() {
            return Err(SimError::config(
                "parameters cannot change while a run is active",
            ));
        }
        Ok(())
    }

    fn finish(&mut self, outcome: RunOutcome) {
        self.active = None;
        self.outcome = outcome;
        match outcome {
            RunOutcome::Completed => info!(completed = self.results.len(), "run completed"),
            RunOutcome::Cancelled => debug!(completed = self.results.len(), "run stopped"),
            RunOutcome::Faulted | RunOutcome::Idle => {}
        }
    }

    /// Append a result of the active run after the guard accepts it.
    ///
    /// A rejected result faults the run: it goes idle, earlier results and
    /// progress stay as they were.
    fn record(&mut self, result: ExperimentResult) -> SimResult<()> {
        let Some(active) = self.active.as_mut() else {
            return Ok(());
        };

        if let Err(violation) = active.guard.check(&result) {
            let err = SimError::from(violation);
            warn!(experiment = result.experiment_number, error = %err, "run aborted by guard");
            self.last_error = Some(err.to_string());
            self.finish(RunOutcome::Faulted);
            return Err(err);
        }

        self.results.push(result);
        self.progress = result.experiment_number;
        self.invalidate();
        Ok(())
    }

    fn clear_results(&mut self) {
        self.results.clear();
        self.progress = 0;
        self.selected = None;
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.version += 1;
        self.histogram_cache = OnceCell::new();
        self.stats_cache = OnceCell::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simulator(p: f64, trials: u64, experiments: u64) -> Simulator {
        let config = SimConfig::builder()
            .seed(42)
            .delay_ms(0)
            .params(SimulationParams {
                probability_of_success: p,
                trials_per_experiment: trials,
                number_of_experiments: experiments,
            })
            .build();
        Simulator::new(&config)
    }

    #[test]
    fn test_initial_state() {
        let sim = Simulator::default();
        assert!(!sim.is_running());
        assert_eq!(sim.progress(), 0);
        assert!(sim.results().is_empty());
        assert!(sim.histogram().is_empty());
        assert_eq!(*sim.statistics(), SimulationStats::default());
        assert_eq!(sim.outcome(), RunOutcome::Idle);
    }

    #[test]
    fn test_run_to_completion() {
        let mut sim = simulator(0.5, 20, 30);
        let summary = sim.run_blocking().ok();
        assert_eq!(
            summary,
            Some(RunSummary {
                completed: 30,
                requested: 30,
                outcome: RunOutcome::Completed
            })
        );
        assert!(!sim.is_running());
        assert_eq!(sim.progress(), 30);
        assert_eq!(sim.histogram().total(), 30);
        assert!(sim.results().iter().all(|r| r.successes <= 20));
    }

    #[test]
    fn test_running_flag_clears_after_last_step() {
        let mut sim = simulator(0.5, 5, 2);
        assert!(sim.start());
        assert!(matches!(sim.step(), Ok(Some(_))));
        assert!(sim.is_running());
        assert!(matches!(sim.step(), Ok(Some(_))));
        assert!(!sim.is_running(), "run ends with its last experiment");
        assert!(matches!(sim.step(), Ok(None)));
    }

    #[test]
    fn test_start_is_noop_while_running() {
        let mut sim = simulator(0.5, 5, 10);
        assert!(sim.start());
        let _ = sim.step();
        let _ = sim.step();
        assert!(!sim.start());
        assert_eq!(sim.results().len(), 2, "second start must not clear results");
    }

    #[test]
    fn test_stop_preserves_results() {
        let mut sim = simulator(0.5, 5, 100);
        assert!(sim.start());
        for _ in 0..3 {
            let _ = sim.step();
        }
        sim.stop();
        assert!(!sim.is_running());
        assert_eq!(sim.outcome(), RunOutcome::Cancelled);
        assert!(matches!(sim.step(), Ok(None)));
        assert_eq!(sim.results().len(), 3);
        assert_eq!(sim.progress(), 3);

        sim.reset();
        assert!(sim.results().is_empty());
        assert_eq!(sim.progress(), 0);
    }

    #[test]
    fn test_external_cancel_token() {
        let mut sim = simulator(0.5, 5, 100);
        assert!(sim.start());
        let token = sim.cancel_token();
        let _ = sim.step();
        token.cancel();
        assert!(matches!(sim.step(), Ok(None)));
        assert!(!sim.is_running());
        assert_eq!(sim.outcome(), RunOutcome::Cancelled);
        assert_eq!(sim.results().len(), 1);
    }

    #[test]
    fn test_set_params_clears_results() {
        let mut sim = simulator(0.5, 10, 5);
        let _ = sim.run_blocking();
        assert_eq!(sim.results().len(), 5);
        let _ = sim.select_bar(0);

        assert!(sim.set_params(ParamsUpdate::trials(12)).is_ok());
        assert!(sim.results().is_empty());
        assert_eq!(sim.progress(), 0);
        assert_eq!(sim.selected_bar(), None);
        assert_eq!(sim.params().trials_per_experiment, 12);
    }

    #[test]
    fn test_invalid_params_keep_results() {
        let mut sim = simulator(0.5, 10, 5);
        let _ = sim.run_blocking();
        assert!(sim.set_params(ParamsUpdate::probability(3.0)).is_err());
        assert!(sim.is_last_input_invalid());
        assert_eq!(sim.results().len(), 5);
        assert!((sim.params().probability_of_success - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_set_params_rejected_while_running() {
        let mut sim = simulator(0.5, 10, 50);
        assert!(sim.start());
        let _ = sim.step();
        let err = sim.set_params(ParamsUpdate::trials(3));
        assert!(matches!(err, Err(SimError::Config { .. })));
        assert_eq!(sim.params().trials_per_experiment, 10);
    }

    #[test]
    fn test_set_param_text() {
        let mut sim = simulator(0.5, 10, 5);
        assert!(sim.set_param_text(ParamField::Probability, "0.2").is_ok());
        assert!(sim.set_param_text(ParamField::Probability, "1.2").is_err());
        assert_eq!(sim.invalid_field(), Some(ParamField::Probability));
        assert!((sim.params().probability_of_success - 0.2).abs() < f64::EPSILON);
        assert!(sim.restore_default_probability().is_ok());
        assert!((sim.params().probability_of_success - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_degenerate_probabilities() {
        let mut sim = simulator(0.0, 15, 10);
        let _ = sim.run_blocking();
        assert!(sim.results().iter().all(|r| r.successes == 0));
        assert_eq!(sim.histogram().labels, vec!["0"]);

        let mut sim = simulator(1.0, 15, 10);
        let _ = sim.run_blocking();
        assert!(sim.results().iter().all(|r| r.successes == 15));
        assert!(sim.statistics().z_score.abs() < f64::EPSILON);
    }

    #[test]
    fn test_selection() {
        let mut sim = simulator(0.5, 10, 50);
        assert_eq!(sim.select_bar(0), None, "empty histogram leaves selection alone");

        let _ = sim.run_blocking();
        let first = sim.histogram().value_at(0);
        assert_eq!(sim.select_bar(0), first);
        assert_eq!(sim.selected_index(), Some(0));
        let stats = sim.selected_bar_stats();
        assert_eq!(stats.map(|s| s.successes), first);
        assert_eq!(stats.map(|s| s.frequency), sim.histogram().data.first().copied());

        assert_eq!(sim.select_bar(10_000), None);
        assert_eq!(sim.selected_bar(), first, "out-of-range index keeps selection");

        sim.clear_selection();
        assert!(sim.selected_bar_stats().is_none());
    }

    #[test]
    fn test_reproducible_sessions() {
        let mut a = simulator(0.3, 25, 40);
        let mut b = simulator(0.3, 25, 40);
        let _ = a.run_blocking();
        let _ = b.run_blocking();
        let successes = |s: &Simulator| s.results().iter().map(|r| r.successes).collect::<Vec<_>>();
        assert_eq!(successes(&a), successes(&b));

        // A second run in the same session draws a fresh stream.
        let first = successes(&a);
        let _ = a.run_blocking();
        let second = successes(&a);
        assert_ne!(first, second);
    }

    #[test]
    fn test_version_and_cache_invalidation() {
        let mut sim = simulator(0.5, 10, 3);
        let v0 = sim.version();
        assert!(sim.start());
        let _ = sim.step();
        assert!(sim.version() > v0);
        assert_eq!(sim.histogram().total(), 1);
        let _ = sim.step();
        assert_eq!(sim.histogram().total(), 2, "cache refreshed after step");
    }

    #[test]
    fn test_binning_switch() {
        let mut sim = simulator(0.5, 100, 200);
        let _ = sim.run_blocking();
        let unlimited = sim.histogram().len();
        sim.set_binning(BinningPolicy::Capped { max_bins: 5 });
        assert!(sim.histogram().len() <= 5);
        assert!(sim.histogram().len() <= unlimited);
        assert_eq!(sim.histogram().total(), 200);
    }

    #[test]
    fn test_delay_clamp() {
        let mut sim = Simulator::default();
        sim.set_delay(1);
        assert_eq!(sim.delay(), Duration::from_millis(MIN_DELAY_MS));
        sim.set_delay(5_000);
        assert_eq!(sim.delay(), Duration::from_millis(MAX_DELAY_MS));
        sim.set_delay(100);
        assert_eq!(sim.delay(), Duration::from_millis(100));
        sim.set_delay_unclamped(Duration::ZERO);
        assert!(sim.delay().is_zero());
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut sim = simulator(0.5, 10, 4);
        let _ = sim.run_blocking();
        let snapshot = sim.snapshot();
        assert_eq!(snapshot.results.len(), 4);
        assert!(!snapshot.running);
        let json = serde_json::to_string(&snapshot);
        assert!(json.is_ok());
        assert!(json.map(|j| j.contains("\"outcome\":\"completed\"")).unwrap_or(false));
        assert_eq!(snapshot.seed, 42);
    }

    fn forged(experiment_number: u64, successes: u64) -> ExperimentResult {
        ExperimentResult {
            experiment_number,
            successes,
            timestamp: Duration::ZERO,
        }
    }

    fn assert_faulted_after(sim: &Simulator, kept: usize) {
        assert!(!sim.is_running());
        assert_eq!(sim.outcome(), RunOutcome::Faulted);
        assert!(sim.last_error().is_some());
        assert_eq!(sim.results().len(), kept);
        assert_eq!(sim.progress(), kept as u64);
        assert_eq!(sim.histogram().total(), kept as u64);
    }

    #[test]
    fn test_guard_fault_on_excess_successes() {
        let mut sim = simulator(0.5, 10, 20);
        assert!(sim.start());
        for _ in 0..3 {
            assert!(matches!(sim.step(), Ok(Some(_))));
        }
        let before = sim.results().to_vec();

        let err = sim.record(forged(4, 11));
        assert!(matches!(err, Err(SimError::GuardViolation { experiment: 4, .. })));
        assert_faulted_after(&sim, 3);
        assert_eq!(sim.results(), before.as_slice());
        assert!(sim.last_error().is_some_and(|m| m.contains("11")));

        // The faulted run is over; nothing more is appended.
        assert!(matches!(sim.step(), Ok(None)));
        assert_eq!(sim.results().len(), 3);
        assert_eq!(sim.snapshot().last_error.as_deref(), sim.last_error());

        assert!(sim.start());
        assert!(sim.last_error().is_none());
        assert_eq!(sim.outcome(), RunOutcome::Idle);
        assert!(sim.results().is_empty());
    }

    #[test]
    fn test_guard_fault_on_out_of_sequence_result() {
        let mut sim = simulator(0.5, 10, 20);
        assert!(sim.start());
        for _ in 0..2 {
            let _ = sim.step();
        }

        let err = sim.record(forged(7, 1));
        assert!(err.as_ref().is_err_and(SimError::is_run_fault));
        assert_faulted_after(&sim, 2);
    }

    #[test]
    fn test_reset_clears_guard_fault() {
        let mut sim = simulator(0.5, 10, 20);
        assert!(sim.start());
        let _ = sim.step();
        assert!(sim.record(forged(2, 99)).is_err());
        sim.reset();
        assert_eq!(sim.outcome(), RunOutcome::Idle);
        assert!(sim.last_error().is_none());
        assert!(sim.results().is_empty());
    }

    #[test]
    fn test_blocking_pacing_skips_trailing_sleep() {
        let mut sim = simulator(0.5, 10, 2);
        sim.set_delay_unclamped(Duration::from_millis(40));
        let started = std::time::Instant::now();
        let summary = sim.run_blocking().ok();
        let elapsed = started.elapsed();
        assert_eq!(summary.map(|s| s.completed), Some(2));
        assert!(elapsed >= Duration::from_millis(40), "one pause between two experiments");
        assert!(elapsed < Duration::from_millis(80), "no pause after the last experiment");
    }

    #[tokio::test(start_paused = true)]
    async fn test_async_run_with_pacing() {
        let mut sim = simulator(0.5, 10, 5);
        sim.set_delay(50);
        let started = tokio::time::Instant::now();
        let summary = sim.run().await.ok();
        let elapsed = started.elapsed();
        assert_eq!(summary.map(|s| s.completed), Some(5));
        assert_eq!(summary.map(|s| s.outcome), Some(RunOutcome::Completed));
        assert_eq!(elapsed, Duration::from_millis(4 * 50));
    }
}
