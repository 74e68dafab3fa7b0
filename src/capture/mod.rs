//! Capture backend seam.
//!
//! The backend is an external collaborator: it emits named events and accepts
//! commands. This module turns its raw `(name, payload)` messages into typed
//! [`BackendEvent`]s and exposes the command side through [`CaptureBackend`]:
//! - `client`: the injected channel client and its command queue

pub mod client;

use serde::Deserialize;
use serde_json::Value;

use crate::core::alerts::ThreatWire;
use crate::core::geo::GeoUpdate;
use crate::core::packet::{PacketRecord, PacketWire};
use crate::error::AppError;

pub use client::{
    BackendCommand, CaptureArtifact, CaptureBackend, ChannelClient, CommandReceiver, PendingReply,
};

/// One decoded inbound event.
#[derive(Debug, Clone)]
pub enum BackendEvent {
    Connect,
    Disconnect,
    Packet(PacketRecord),
    Threat(ThreatWire),
    GeoUpdate(GeoUpdate),
    Status { is_capturing: bool },
}

#[derive(Debug, Deserialize)]
struct StatusWire {
    is_capturing: bool,
}

impl BackendEvent {
    /// Decode a named backend message.
    ///
    /// Fails with `Payload` when a required field is missing or mistyped and
    /// with `UnknownEvent` for names the engine does not handle.
    pub fn decode(name: &str, payload: Value) -> Result<Self, AppError> {
        let event = match name {
            "connect" => BackendEvent::Connect,
            "disconnect" => BackendEvent::Disconnect,
            "packet" => {
                let wire: PacketWire = serde_json::from_value(payload)
                    .map_err(|e| AppError::Payload(format!("packet: {e}")))?;
                BackendEvent::Packet(wire.into())
            }
            "threat" => {
                let wire: ThreatWire = serde_json::from_value(payload)
                    .map_err(|e| AppError::Payload(format!("threat: {e}")))?;
                BackendEvent::Threat(wire)
            }
            "geo_update" => {
                let update: GeoUpdate = serde_json::from_value(payload)
                    .map_err(|e| AppError::Payload(format!("geo_update: {e}")))?;
                BackendEvent::GeoUpdate(update)
            }
            "status" => {
                let status: StatusWire = serde_json::from_value(payload)
                    .map_err(|e| AppError::Payload(format!("status: {e}")))?;
                BackendEvent::Status {
                    is_capturing: status.is_capturing,
                }
            }
            other => return Err(AppError::UnknownEvent(other.to_string())),
        };
        Ok(event)
    }
}

/// Recorded-stream envelope: one `{"event": ..., "data": ...}` object per line.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    /// Decode one raw line; invalid UTF-8 is a payload error like any other.
    pub fn parse(line: &[u8]) -> Result<Self, AppError> {
        Ok(serde_json::from_slice(line)?)
    }
}
