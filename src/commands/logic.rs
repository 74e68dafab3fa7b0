//! Pure business logic functions extracted from command handlers.
//!
//! These functions take plain parameters (no channel or runtime dependency)
//! and can be unit-tested directly.

use std::path::Path;

use crate::config::REPLAY_EXTENSIONS;
use crate::error::AppError;

/// Which command a capture toggle should send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureToggle {
    Start,
    Stop,
}

/// Decide from the last reported capture flag.
pub fn next_capture_command(capturing: bool) -> CaptureToggle {
    if capturing {
        CaptureToggle::Stop
    } else {
        CaptureToggle::Start
    }
}

/// Reject replay artifacts the backend could never read.
pub fn validate_replay_artifact(file_name: &str, bytes: &[u8]) -> Result<(), AppError> {
    if file_name.trim().is_empty() {
        return Err(AppError::InvalidInput("Replay file name is empty".into()));
    }
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension {
        Some(ext) if REPLAY_EXTENSIONS.contains(&ext.as_str()) => {}
        _ => {
            return Err(AppError::InvalidInput(format!(
                "{file_name} is not a .pcap or .pcapng capture"
            )))
        }
    }
    if bytes.is_empty() {
        return Err(AppError::InvalidInput(format!("{file_name} is empty")));
    }
    Ok(())
}
