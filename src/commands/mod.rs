//! Consumer-facing command handlers, organized by functional domain.
//!
//! - `capture`: start/stop/toggle capture, replay submission, export
//! - `view`: filter text, scroll reports, resume, snapshot queries
//! - `logic`: Pure business logic functions (unit-testable)
//! - `state`: Shared `AppState` definition

pub mod capture;
mod logic;
mod state;
pub mod view;

pub use logic::{next_capture_command, validate_replay_artifact, CaptureToggle};
pub use state::AppState;
