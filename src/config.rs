//! Centralized runtime constants for netwatch.
//!
//! All capacities, windows, and thresholds are collected here so they can be
//! found and adjusted in a single place rather than scattered across modules.

/// Maximum number of packets retained in the packet ring buffer.
pub const PACKET_CAPACITY: usize = 1000;

/// Maximum number of (time, length) samples kept for the traffic chart.
pub const TRAFFIC_CAPACITY: usize = 30;

/// Maximum number of threat alerts kept in the alert log.
pub const ALERT_CAPACITY: usize = 50;

/// Number of most recent packets considered by the connection aggregator.
pub const MAP_WINDOW: usize = 50;

/// Packet-count domain of the marker radius scale.
pub const MARKER_COUNT_DOMAIN: (f64, f64) = (1.0, 50.0);

/// Radius range of the marker scale.
pub const MARKER_RADIUS_RANGE: (f64, f64) = (2.0, 8.0);

/// A view closer than this to the bottom of its content keeps following new rows.
pub const SCROLL_FOLLOW_THRESHOLD: f64 = 50.0;

/// Depth of the ordered inbound queue feeding the event pump.
pub const INBOUND_QUEUE_DEPTH: usize = 1024;

/// Depth of the outbound command queue drained by the transport.
pub const COMMAND_QUEUE_DEPTH: usize = 64;

/// Depth of the scroll side-effect broadcast channel.
pub const VIEW_EFFECT_DEPTH: usize = 64;

/// Location label used when the backend could not resolve an address.
pub const UNKNOWN_LOCATION: &str = "Unknown";

/// File extensions accepted for replay submission.
pub const REPLAY_EXTENSIONS: &[&str] = &["pcap", "pcapng"];

/// Capacities of the bounded stores owned by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineLimits {
    pub packets: usize,
    pub traffic: usize,
    pub alerts: usize,
    pub map_window: usize,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            packets: PACKET_CAPACITY,
            traffic: TRAFFIC_CAPACITY,
            alerts: ALERT_CAPACITY,
            map_window: MAP_WINDOW,
        }
    }
}
