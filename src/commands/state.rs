//! Shared application state handed to every command handler.

use std::sync::Arc;

use tokio::sync::watch;

use crate::capture::CaptureBackend;
use crate::core::engine::DashboardSnapshot;
use crate::services::EventSink;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Injected backend client; commands go out through it and nothing else.
    pub backend: Arc<dyn CaptureBackend>,
    /// Ordered queue into the event pump, for view inputs.
    pub inbound: EventSink,
    /// Latest published snapshot.
    pub snapshots: watch::Receiver<Arc<DashboardSnapshot>>,
}

impl AppState {
    pub fn new(
        backend: Arc<dyn CaptureBackend>,
        inbound: EventSink,
        snapshots: watch::Receiver<Arc<DashboardSnapshot>>,
    ) -> Self {
        Self {
            backend,
            inbound,
            snapshots,
        }
    }

    pub fn current(&self) -> Arc<DashboardSnapshot> {
        self.snapshots.borrow().clone()
    }
}
