//! Core logic: bounded stores, derived projections, and the orchestrator.
//!
//! - [`BoundedSeq`]: fixed-capacity ring with oldest-evict-first semantics
//! - [`ProtocolTally`]: monotonic per-protocol counters
//! - [`TrafficSeries`]: rolling (time, length) chart samples
//! - [`AlertLog`] / [`Severity`]: newest-first alerts and current severity
//! - [`apply_geo_patch`]: late geolocation fan-out onto buffered packets
//! - [`aggregate_connections`]: coordinate-deduplicated map endpoints
//! - [`filter_packets`]: live text filter
//! - [`ScrollTracker`]: follow/hold state for the packet list
//! - [`TelemetryEngine`]: applies every input and publishes snapshots

pub mod alerts;
pub mod bounded;
pub mod connections;
pub mod engine;
pub mod filter;
pub mod geo;
pub mod packet;
pub mod scroll;
pub mod tally;
pub mod traffic;

pub use alerts::{AlertLog, Severity, StatusTier, ThreatAlert};
pub use bounded::BoundedSeq;
pub use connections::{aggregate_connections, marker_radius, GeoConnection};
pub use engine::{ConnectionStatus, DashboardSnapshot, EngineInput, TelemetryEngine, ViewInput};
pub use filter::filter_packets;
pub use geo::{apply_geo_patch, GeoInfo, GeoUpdate};
pub use packet::{GeoPoint, PacketRecord, Protocol};
pub use scroll::{ScrollPosition, ScrollState, ScrollTracker, ViewEffect};
pub use tally::ProtocolTally;
pub use traffic::{TrafficSample, TrafficSeries};
