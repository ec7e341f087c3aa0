//! Simulator TUI application state and logic.
//!
//! Terminal I/O is handled by the `binosim-tui` binary; key handling, text
//! input and run pacing live here so they can be tested without a terminal.

use std::time::Duration;

use crossterm::event::KeyCode;

use crate::config::SimConfig;
use crate::engine::params::{ParamField, SimulationParams};
use crate::engine::Simulator;

/// Pacing change per `+`/`-` key press.
pub const DELAY_STEP_MS: u64 = 10;

/// Application state for the simulator TUI.
pub struct SimulatorApp {
    /// The underlying simulator.
    pub sim: Simulator,
    /// Parameter field receiving text input.
    pub focus: ParamField,
    /// Text buffers, indexed like [`ParamField::ALL`].
    pub inputs: [String; 3],
    /// One-line status message.
    pub status: String,
    /// Frame counter.
    pub frame_count: u64,
    /// Whether the app should quit.
    pub should_quit: bool,
    since_step: Duration,
}

impl Default for SimulatorApp {
    fn default() -> Self {
        Self::new(&SimConfig::default())
    }
}

impl SimulatorApp {
    /// Create an application from configuration.
    #[must_use]
    pub fn new(config: &SimConfig) -> Self {
        let sim = Simulator::new(config);
        let inputs = input_buffers(sim.params());
        Self {
            sim,
            focus: ParamField::Probability,
            inputs,
            status: "Press Space to start".to_string(),
            frame_count: 0,
            should_quit: false,
            since_step: Duration::ZERO,
        }
    }

    /// Text buffer of `field`.
    #[must_use]
    pub fn input(&self, field: ParamField) -> &str {
        &self.inputs[field_index(field)]
    }

    /// Whether `field` holds the last rejected input.
    #[must_use]
    pub fn is_field_invalid(&self, field: ParamField) -> bool {
        self.sim.invalid_field() == Some(field)
    }

    /// Completed fraction of the current run in `[0, 1]`.
    #[must_use]
    pub fn progress_ratio(&self) -> f64 {
        let total = self.sim.params().number_of_experiments.max(1);
        (self.sim.progress() as f64 / total as f64).clamp(0.0, 1.0)
    }

    /// Current pacing in milliseconds.
    #[must_use]
    pub fn delay_ms(&self) -> u64 {
        self.sim.delay().as_millis() as u64
    }

    /// Check if the app should quit.
    #[must_use]
    pub const fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Advance the clock by `elapsed`, stepping the run once the pacing
    /// delay has passed.
    pub fn tick(&mut self, elapsed: Duration) {
        self.frame_count += 1;
        if !self.sim.is_running() {
            self.since_step = Duration::ZERO;
            return;
        }

        self.since_step += elapsed;
        if self.since_step < self.sim.delay() {
            return;
        }
        self.since_step = Duration::ZERO;

        match self.sim.step() {
            Ok(_) if !self.sim.is_running() => {
                self.status = format!("Run finished: {} experiments", self.sim.results().len());
            }
            Ok(_) => {}
            Err(e) => self.status = format!("Run aborted: {e}"),
        }
    }

    /// Toggle between running and stopped.
    pub fn toggle_run(&mut self) {
        if self.sim.is_running() {
            self.sim.stop();
            self.status = format!("Stopped after {} experiments", self.sim.progress());
        } else {
            self.sim.start();
            self.since_step = self.sim.delay();
            self.status = "Running".to_string();
        }
    }

    /// Clear results and selection.
    pub fn reset(&mut self) {
        self.sim.reset();
        self.since_step = Duration::ZERO;
        self.status = "Reset".to_string();
    }

    /// Move the bar selection by `delta` bars, clamped to the histogram.
    pub fn move_selection(&mut self, delta: isize) {
        let len = self.sim.histogram().len();
        if len == 0 {
            return;
        }
        let next = match self.sim.selected_index() {
            Some(i) => i.saturating_add_signed(delta).min(len - 1),
            None if delta < 0 => len - 1,
            None => 0,
        };
        self.sim.select_bar(next);
    }

    /// Commit the focused text buffer to the parameter store.
    pub fn commit_input(&mut self) {
        let field = self.focus;
        let text = self.inputs[field_index(field)].clone();
        match self.sim.set_param_text(field, &text) {
            Ok(params) => {
                self.inputs = input_buffers(&params);
                self.status = format!("{} updated", field.name());
            }
            Err(e) => self.status = e.to_string(),
        }
    }

    /// Leave the focused field: an empty probability restores the default,
    /// anything else is committed.
    pub fn blur_input(&mut self) {
        let empty = self.inputs[field_index(self.focus)].trim().is_empty();
        if self.focus == ParamField::Probability && empty {
            match self.sim.restore_default_probability() {
                Ok(params) => {
                    self.inputs = input_buffers(&params);
                    self.status = "Probability reset to default".to_string();
                }
                Err(e) => self.status = e.to_string(),
            }
        } else if self.input(self.focus) != self.committed_text(self.focus) {
            self.commit_input();
        }
    }

    fn committed_text(&self, field: ParamField) -> String {
        input_buffers(self.sim.params())[field_index(field)].clone()
    }

    fn adjust_delay(&mut self, faster: bool) {
        let current = self.delay_ms();
        let next = if faster {
            current.saturating_sub(DELAY_STEP_MS)
        } else {
            current + DELAY_STEP_MS
        };
        self.sim.set_delay(next);
        self.status = format!("Delay {} ms", self.delay_ms());
    }

    /// Handle a key press.
    pub fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc => {
                if self.sim.selected_bar().is_some() {
                    self.sim.clear_selection();
                } else {
                    self.should_quit = true;
                }
            }
            KeyCode::Char(' ') => self.toggle_run(),
            KeyCode::Char('r') => self.reset(),
            KeyCode::Left => self.move_selection(-1),
            KeyCode::Right => self.move_selection(1),
            KeyCode::Char('+' | '=') => self.adjust_delay(true),
            KeyCode::Char('-') => self.adjust_delay(false),
            KeyCode::Tab => {
                self.blur_input();
                self.focus = self.focus.next();
            }
            KeyCode::Enter => self.commit_input(),
            KeyCode::Backspace => {
                self.inputs[field_index(self.focus)].pop();
            }
            KeyCode::Char(c) if c.is_ascii_digit() || c == '.' => {
                self.inputs[field_index(self.focus)].push(c);
            }
            _ => {}
        }
    }
}

const fn field_index(field: ParamField) -> usize {
    match field {
        ParamField::Probability => 0,
        ParamField::Trials => 1,
        ParamField::Experiments => 2,
    }
}

fn input_buffers(params: &SimulationParams) -> [String; 3] {
    [
        params.probability_of_success.to_string(),
        params.trials_per_experiment.to_string(),
        params.number_of_experiments.to_string(),
    ]
}
