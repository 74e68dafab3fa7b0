//! Rolling traffic series for the live throughput chart.
//!
//! One sample is appended per ingested packet: the local wall-clock label of
//! ingestion and the packet length. Only the most recent samples are kept.

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::core::bounded::BoundedSeq;

/// One chart point, serializable for the frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrafficSample {
    /// Ingestion time, `HH:MM:SS` local.
    pub label: String,
    /// Packet length in bytes.
    pub magnitude: u64,
}

/// Bounded, ordered sequence of traffic samples (oldest first).
#[derive(Debug, Clone)]
pub struct TrafficSeries {
    samples: BoundedSeq<TrafficSample>,
}

impl TrafficSeries {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: BoundedSeq::new(capacity),
        }
    }

    /// Record one packet observed at `now`.
    pub fn record(&mut self, length: u64, now: DateTime<Local>) {
        self.samples.append(TrafficSample {
            label: format_clock(now),
            magnitude: length,
        });
    }

    /// Produce a snapshot of the series for the frontend.
    pub fn snapshot(&self) -> Vec<TrafficSample> {
        self.samples.snapshot()
    }
}

/// Format a local timestamp the way the chart labels its x-axis.
pub fn format_clock(at: DateTime<Local>) -> String {
    at.format("%H:%M:%S").to_string()
}
