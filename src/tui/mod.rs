//! TUI module for binosim.
//!
//! This module contains the TUI application state and logic, kept out of
//! `bin/binosim_tui.rs` so it can be tested.
//!
//! The terminal I/O remains in the binary; all state management lives here.

#[cfg(feature = "tui")]
pub mod simulator_app;
