//! Packet records as stored in the ring buffer, plus their wire form.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Transport protocol category.
///
/// Labels other than TCP and UDP (`IP`, `ICMP`, `Other`, ...) are kept verbatim
/// so they stay visible and filterable, but they all tally as OTHER.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Protocol {
    Tcp,
    Udp,
    Other(String),
}

impl Protocol {
    pub fn as_str(&self) -> &str {
        match self {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
            Protocol::Other(label) => label,
        }
    }
}

impl From<String> for Protocol {
    fn from(label: String) -> Self {
        match label.as_str() {
            "TCP" => Protocol::Tcp,
            "UDP" => Protocol::Udp,
            _ => Protocol::Other(label),
        }
    }
}

impl From<Protocol> for String {
    fn from(proto: Protocol) -> Self {
        match proto {
            Protocol::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

/// A resolved WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    /// Both halves or nothing.
    pub fn from_parts(lat: Option<f64>, lon: Option<f64>) -> Option<Self> {
        match (lat, lon) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => {
                Some(Self { lat, lon })
            }
            _ => None,
        }
    }
}

/// One observed packet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PacketRecord {
    /// Capture time, seconds.
    pub timestamp: f64,
    pub source_address: String,
    pub dest_address: String,
    pub protocol: Protocol,
    /// Size on the wire, bytes.
    pub length: u64,
    pub summary: String,
    pub dest_port: Option<u16>,
    pub payload_hex: Option<String>,
    pub payload_ascii: Option<String>,
    /// Resolved location label for `dest_address`.
    pub geo: Option<String>,
    pub coords: Option<GeoPoint>,
}

impl PacketRecord {
    /// Hex payload as space-separated byte pairs (`"de ad be ef"`).
    pub fn hex_dump(&self) -> Option<String> {
        let hex = self.payload_hex.as_deref()?;
        let pairs: Vec<&str> = hex
            .as_bytes()
            .chunks(2)
            .filter_map(|pair| std::str::from_utf8(pair).ok())
            .collect();
        Some(pairs.join(" "))
    }

    /// Capture timestamp rendered on the local wall clock.
    pub fn time_label(&self) -> String {
        let secs = self.timestamp.trunc() as i64;
        let nanos = (self.timestamp.fract() * 1e9) as u32;
        match DateTime::from_timestamp(secs, nanos) {
            Some(utc) => utc.with_timezone(&Local).format("%H:%M:%S").to_string(),
            None => "-".to_string(),
        }
    }
}

/// `packet` event payload exactly as the backend emits it.
#[derive(Debug, Deserialize)]
pub struct PacketWire {
    pub timestamp: f64,
    pub src: String,
    pub dst: String,
    pub proto: Protocol,
    pub len: u64,
    pub summary: String,
    #[serde(default)]
    pub dst_port: Option<u16>,
    #[serde(default)]
    pub payload_hex: Option<String>,
    #[serde(default)]
    pub payload_ascii: Option<String>,
    #[serde(default)]
    pub geo: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

impl From<PacketWire> for PacketRecord {
    fn from(wire: PacketWire) -> Self {
        Self {
            timestamp: wire.timestamp,
            source_address: wire.src,
            dest_address: wire.dst,
            protocol: wire.proto,
            length: wire.len,
            summary: wire.summary,
            dest_port: wire.dst_port,
            payload_hex: wire.payload_hex.filter(|s| !s.is_empty()),
            payload_ascii: wire.payload_ascii.filter(|s| !s.is_empty()),
            geo: wire.geo,
            coords: GeoPoint::from_parts(wire.lat, wire.lon),
        }
    }
}
