//! Capture control, replay submission, and export commands.
//!
//! None of these touch aggregation state. Capture flags change only when the
//! backend reports a `status` event; a stop request does not stop the engine
//! from applying packets still in flight.

use crate::capture::{CaptureArtifact, PendingReply};
use crate::error::AppError;

use super::logic::{next_capture_command, validate_replay_artifact, CaptureToggle};
use super::state::AppState;

pub fn start_capture(state: &AppState) -> Result<(), AppError> {
    state.backend.start_capture()?;
    tracing::info!("Requested capture start");
    Ok(())
}

pub fn stop_capture(state: &AppState) -> Result<(), AppError> {
    state.backend.stop_capture()?;
    tracing::info!("Requested capture stop");
    Ok(())
}

/// Start or stop depending on the last reported capture flag.
pub fn toggle_capture(state: &AppState) -> Result<CaptureToggle, AppError> {
    let toggle = next_capture_command(state.current().status.capturing);
    match toggle {
        CaptureToggle::Start => start_capture(state)?,
        CaptureToggle::Stop => stop_capture(state)?,
    }
    Ok(toggle)
}

/// Submit a capture file for the backend to re-emit as a live stream.
pub async fn submit_replay(state: &AppState, artifact: CaptureArtifact) -> Result<(), AppError> {
    validate_replay_artifact(&artifact.file_name, &artifact.bytes)?;
    let file_name = artifact.file_name.clone();
    let size = artifact.bytes.len();
    let pending: PendingReply<()> = state.backend.submit_replay(artifact)?;
    match pending.wait().await {
        Ok(()) => {
            tracing::info!("Replay of {file_name} ({size} bytes) accepted");
            Ok(())
        }
        Err(e) => {
            tracing::warn!("Replay of {file_name} failed: {e}");
            Err(e)
        }
    }
}

/// Fetch the backend's capture file.
pub async fn request_export(state: &AppState) -> Result<CaptureArtifact, AppError> {
    let artifact = state.backend.request_export()?.wait().await?;
    tracing::info!(
        "Exported {} ({} bytes)",
        artifact.file_name,
        artifact.bytes.len()
    );
    Ok(artifact)
}
