//! Dictation session management
//!
//! This module provides the `SessionController` abstraction that manages:
//! - The Idle/Active/Paused session state machine
//! - A pluggable recognition backend (open, pause/resume, teardown)
//! - Transcript snapshots published over a watch channel
//! - Silence-based auto-stop via the `SilenceWatchdog`

mod config;
mod controller;
mod state;
mod watchdog;

pub use config::SessionConfig;
pub use controller::SessionController;
pub use state::{SessionSnapshot, SessionState};
pub use watchdog::SilenceWatchdog;
