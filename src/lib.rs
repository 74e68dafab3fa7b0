pub mod capture;
pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod services;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::capture::Envelope;
use crate::config::EngineLimits;
use crate::core::{
    ConnectionStatus, GeoConnection, ProtocolTally, Severity, StatusTier, TelemetryEngine,
    TrafficSample,
};
use crate::services::{BackgroundServices, EventSink};

pub use error::AppError;

/// End-of-stream summary printed by the binary.
#[derive(Debug, Serialize)]
pub struct ReplaySummary {
    pub status: ConnectionStatus,
    pub tally: ProtocolTally,
    pub severity: Severity,
    pub tier: StatusTier,
    pub buffer: String,
    pub alerts: usize,
    pub connections: Vec<GeoConnection>,
    pub traffic: Vec<TrafficSample>,
}

/// Install the panic hook and the tracing subscriber.
pub fn init_tracing() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!("PANIC in netwatch: {info}");
        default_hook(info);
    }));

    // try_init: a second call (tests, embedding) is not an error.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "netwatch=info".into()),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

/// Command-line arguments of the replay binary.
#[derive(Debug, Parser)]
#[command(name = "netwatch")]
#[command(about = "Replay a recorded capture event log and print the dashboard summary", long_about = None)]
pub struct Cli {
    /// Newline-delimited `{"event", "data"}` log; stdin when omitted.
    pub events: Option<PathBuf>,
}

/// Feed every envelope in `reader` to the event pump, in order.
///
/// Lines that are not valid JSON envelopes (including invalid UTF-8) are
/// logged and skipped. Returns the number of skipped lines.
pub async fn replay_events<R>(mut reader: R, sink: &EventSink) -> Result<u64, AppError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let mut line_no = 0u64;
    let mut skipped = 0u64;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        line_no += 1;
        if buf.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        match Envelope::parse(&buf) {
            Ok(envelope) => sink.deliver(envelope.event, envelope.data).await?,
            Err(e) => {
                skipped += 1;
                tracing::warn!("Skipping line {line_no}: {e}");
            }
        }
    }
    Ok(skipped)
}

/// Replay the event log named by `cli` (or stdin) through the engine and
/// print the resulting dashboard summary as JSON.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    init_tracing();

    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match cli.events {
        Some(path) => {
            let file = tokio::fs::File::open(&path)
                .await
                .with_context(|| format!("failed to open event log {}", path.display()))?;
            tracing::info!("Replaying events from {}", path.display());
            Box::new(BufReader::new(file))
        }
        None => {
            tracing::info!("Replaying events from stdin");
            Box::new(BufReader::new(tokio::io::stdin()))
        }
    };

    let services = BackgroundServices::start(TelemetryEngine::new(EngineLimits::default()));
    let skipped = replay_events(reader, &services.sink).await?;
    if skipped > 0 {
        tracing::warn!("{skipped} lines could not be decoded");
    }

    let engine = services.shutdown().await?;
    let snapshot = engine.snapshot();
    let summary = ReplaySummary {
        status: snapshot.status,
        tally: snapshot.tally,
        severity: snapshot.current_severity(),
        tier: snapshot.status_tier(),
        buffer: snapshot.buffer_label(),
        alerts: snapshot.alerts.len(),
        connections: snapshot.connections(),
        traffic: snapshot.traffic.clone(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
