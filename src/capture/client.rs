//! Owned channel client for commands toward the capture backend.
//!
//! The client is constructed explicitly and injected wherever commands are
//! issued. Commands are queued without waiting; their outcomes come back later
//! as ordinary status events. Replay and export carry a reply slot so a
//! failure can be surfaced to whoever issued them.

use std::sync::Mutex;

use tokio::sync::{mpsc, oneshot};

use crate::config::COMMAND_QUEUE_DEPTH;
use crate::error::AppError;

/// A capture-file artifact, opaque to this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Reply slot filled by the transport with the backend's verdict.
pub type ReplySender<T> = oneshot::Sender<Result<T, String>>;

/// Commands drained by the transport layer.
#[derive(Debug)]
pub enum BackendCommand {
    StartCapture,
    StopCapture,
    SubmitReplay {
        artifact: CaptureArtifact,
        reply: ReplySender<()>,
    },
    RequestExport {
        reply: ReplySender<CaptureArtifact>,
    },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::StartCapture => "start_capture",
            BackendCommand::StopCapture => "stop_capture",
            BackendCommand::SubmitReplay { .. } => "upload_pcap",
            BackendCommand::RequestExport { .. } => "download_pcap",
        }
    }
}

/// Receiving half handed to the transport.
pub type CommandReceiver = mpsc::Receiver<BackendCommand>;

/// Outcome of a replay or export, resolved once the backend answers.
#[derive(Debug)]
pub struct PendingReply<T> {
    rx: oneshot::Receiver<Result<T, String>>,
}

impl<T> PendingReply<T> {
    pub async fn wait(self) -> Result<T, AppError> {
        match self.rx.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(message)) => Err(AppError::Command(message)),
            Err(_) => Err(AppError::Transport(
                "backend dropped the request without answering".into(),
            )),
        }
    }
}

/// Command side of the capture backend.
pub trait CaptureBackend: Send + Sync {
    fn start_capture(&self) -> Result<(), AppError>;
    fn stop_capture(&self) -> Result<(), AppError>;
    fn submit_replay(&self, artifact: CaptureArtifact) -> Result<PendingReply<()>, AppError>;
    fn request_export(&self) -> Result<PendingReply<CaptureArtifact>, AppError>;
}

/// Channel-backed client with an explicit open/close lifecycle.
pub struct ChannelClient {
    tx: Mutex<Option<mpsc::Sender<BackendCommand>>>,
}

impl ChannelClient {
    /// Open a client and the command queue the transport will drain.
    pub fn open(depth: usize) -> (Self, CommandReceiver) {
        let (tx, rx) = mpsc::channel(depth.max(1));
        tracing::info!("Backend command channel opened (depth {depth})");
        (
            Self {
                tx: Mutex::new(Some(tx)),
            },
            rx,
        )
    }

    pub fn open_default() -> (Self, CommandReceiver) {
        Self::open(COMMAND_QUEUE_DEPTH)
    }

    /// Stop accepting commands. Already queued commands still reach the transport.
    pub fn close(&self) {
        let mut guard = self.tx.lock().unwrap_or_else(|e| e.into_inner());
        if guard.take().is_some() {
            tracing::info!("Backend command channel closed");
        }
    }

    pub fn is_open(&self) -> bool {
        let guard = self.tx.lock().unwrap_or_else(|e| e.into_inner());
        guard.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    fn dispatch(&self, command: BackendCommand) -> Result<(), AppError> {
        let name = command.name();
        let guard = self.tx.lock().unwrap_or_else(|e| e.into_inner());
        let tx = guard
            .as_ref()
            .ok_or_else(|| AppError::Transport("backend channel is closed".into()))?;
        tx.try_send(command).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                AppError::Transport(format!("backend command queue full, dropped {name}"))
            }
            mpsc::error::TrySendError::Closed(_) => {
                AppError::Transport("backend transport has shut down".into())
            }
        })?;
        tracing::debug!("Queued backend command {name}");
        Ok(())
    }
}

impl CaptureBackend for ChannelClient {
    fn start_capture(&self) -> Result<(), AppError> {
        self.dispatch(BackendCommand::StartCapture)
    }

    fn stop_capture(&self) -> Result<(), AppError> {
        self.dispatch(BackendCommand::StopCapture)
    }

    fn submit_replay(&self, artifact: CaptureArtifact) -> Result<PendingReply<()>, AppError> {
        let (reply, rx) = oneshot::channel();
        self.dispatch(BackendCommand::SubmitReplay { artifact, reply })?;
        Ok(PendingReply { rx })
    }

    fn request_export(&self) -> Result<PendingReply<CaptureArtifact>, AppError> {
        let (reply, rx) = oneshot::channel();
        self.dispatch(BackendCommand::RequestExport { reply })?;
        Ok(PendingReply { rx })
    }
}

impl Drop for ChannelClient {
    fn drop(&mut self) {
        self.close();
    }
}
