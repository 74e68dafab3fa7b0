//! Background service lifecycle management.
//!
//! `BackgroundServices` owns the event pump: the single task that drains the
//! ordered inbound queue and applies each message to the engine to completion
//! before taking the next one. Everything that mutates aggregation state goes
//! through this queue, backend events and view inputs alike.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;

use crate::config;
use crate::core::engine::{DashboardSnapshot, EngineInput, TelemetryEngine, ViewInput};
use crate::core::scroll::ViewEffect;
use crate::error::AppError;

/// One message on the ordered inbound queue.
#[derive(Debug)]
pub enum Inbound {
    /// Raw backend message, decoded by the pump.
    Backend { name: String, payload: Value },
    View(ViewInput),
}

/// Cloneable producer half of the inbound queue.
///
/// Handed to the transport (backend events) and to command handlers (view inputs).
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::Sender<Inbound>,
}

impl EventSink {
    /// Queue a raw backend message. Waits if the queue is full.
    pub async fn deliver(&self, name: impl Into<String>, payload: Value) -> Result<(), AppError> {
        self.send(Inbound::Backend {
            name: name.into(),
            payload,
        })
        .await
    }

    pub async fn view(&self, input: ViewInput) -> Result<(), AppError> {
        self.send(Inbound::View(input)).await
    }

    async fn send(&self, msg: Inbound) -> Result<(), AppError> {
        self.tx
            .send(msg)
            .await
            .map_err(|_| AppError::Transport("event pump has stopped".into()))
    }
}

/// Handles to the running event pump.
///
/// The pump stops once every [`EventSink`] clone has been dropped.
pub struct BackgroundServices {
    pub sink: EventSink,
    pub snapshots: watch::Receiver<Arc<DashboardSnapshot>>,
    pub effects: broadcast::Receiver<ViewEffect>,
    pump: JoinHandle<TelemetryEngine>,
}

impl BackgroundServices {
    /// Spawn the event pump around `engine`.
    pub fn start(engine: TelemetryEngine) -> Self {
        let (tx, rx) = mpsc::channel(config::INBOUND_QUEUE_DEPTH);
        let snapshots = engine.subscribe();
        let effects = engine.view_effects();
        let pump = tokio::spawn(run_event_pump(engine, rx));
        tracing::info!("Event pump started");
        Self {
            sink: EventSink { tx },
            snapshots,
            effects,
            pump,
        }
    }

    /// Drop our sink and wait for the pump to drain, returning the engine.
    pub async fn shutdown(self) -> Result<TelemetryEngine, AppError> {
        drop(self.sink);
        self.pump
            .await
            .map_err(|e| AppError::Io(format!("event pump task failed: {e}")))
    }
}

async fn run_event_pump(mut engine: TelemetryEngine, mut rx: mpsc::Receiver<Inbound>) -> TelemetryEngine {
    let mut rejected = 0u64;
    while let Some(msg) = rx.recv().await {
        match msg {
            Inbound::Backend { name, payload } => {
                if let Err(e) = engine.ingest(&name, payload) {
                    rejected += 1;
                    tracing::warn!("Dropped `{name}` event: {e}");
                }
            }
            Inbound::View(input) => {
                engine.apply(EngineInput::View(input));
            }
        }
    }
    tracing::info!("Event pump drained ({rejected} events rejected)");
    engine
}
