//! Aggregation orchestrator.
//!
//! [`TelemetryEngine`] owns every bounded store. Each input is applied to
//! completion before the next one, then a fresh immutable
//! [`DashboardSnapshot`] is published on a `watch` channel. Readers never see a
//! half-applied event. Derived views (filter, map aggregates, severity) are
//! recomputed from a snapshot on demand.
//!
//! Buffered packets are held behind `Arc`, so publishing shares records with
//! earlier snapshots instead of copying them. A geo patch copies only the
//! records it rewrites.

use std::borrow::Cow;
use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{broadcast, watch};

use crate::capture::BackendEvent;
use crate::config::{EngineLimits, SCROLL_FOLLOW_THRESHOLD, VIEW_EFFECT_DEPTH};
use crate::core::alerts::{AlertLog, Severity, StatusTier, ThreatAlert};
use crate::core::bounded::BoundedSeq;
use crate::core::connections::{aggregate_connections, GeoConnection};
use crate::core::filter::filter_packets;
use crate::core::geo::apply_geo_patch;
use crate::core::packet::PacketRecord;
use crate::core::scroll::{ScrollPosition, ScrollState, ScrollTracker, ViewEffect};
use crate::core::tally::ProtocolTally;
use crate::core::traffic::{TrafficSample, TrafficSeries};
use crate::error::AppError;

/// Link and capture flags, set only by backend signals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub capturing: bool,
}

/// Inputs originating from the consuming view.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ViewInput {
    SetFilter(String),
    Scroll(ScrollPosition),
    Resume,
}

/// Everything the engine consumes, in one ordered stream.
#[derive(Debug, Clone)]
pub enum EngineInput {
    Backend(BackendEvent),
    View(ViewInput),
}

/// Read-only state published after every committed input.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub revision: u64,
    pub status: ConnectionStatus,
    /// Oldest first.
    pub packets: Vec<Arc<PacketRecord>>,
    pub packet_capacity: usize,
    pub tally: ProtocolTally,
    pub traffic: Vec<TrafficSample>,
    /// Newest first.
    pub alerts: Vec<ThreatAlert>,
    /// Level of the most recent alert; SAFE when there is none.
    pub severity: Severity,
    pub filter_text: String,
    pub scroll: ScrollState,
    pub map_window: usize,
}

impl DashboardSnapshot {
    fn empty(limits: &EngineLimits) -> Self {
        Self {
            revision: 0,
            status: ConnectionStatus::default(),
            packets: Vec::new(),
            packet_capacity: limits.packets.max(1),
            tally: ProtocolTally::default(),
            traffic: Vec::new(),
            alerts: Vec::new(),
            severity: Severity::Safe,
            filter_text: String::new(),
            scroll: ScrollState::Following,
            map_window: limits.map_window,
        }
    }

    pub fn current_severity(&self) -> Severity {
        self.severity
    }

    pub fn status_tier(&self) -> StatusTier {
        self.current_severity().into()
    }

    /// Packets matching the live filter text, in buffer order.
    pub fn filtered_packets(&self) -> Cow<'_, [Arc<PacketRecord>]> {
        filter_packets(&self.packets, &self.filter_text)
    }

    pub fn connections(&self) -> Vec<GeoConnection> {
        aggregate_connections(&self.packets, self.map_window)
    }

    pub fn active_nodes(&self) -> usize {
        self.connections().len()
    }

    pub fn buffer_label(&self) -> String {
        format!(
            "BUFFER: {} / {} PACKETS",
            self.packets.len(),
            self.packet_capacity
        )
    }
}

/// Single-writer owner of all aggregation state.
pub struct TelemetryEngine {
    limits: EngineLimits,
    packets: BoundedSeq<Arc<PacketRecord>>,
    tally: ProtocolTally,
    traffic: TrafficSeries,
    alerts: AlertLog,
    scroll: ScrollTracker,
    status: ConnectionStatus,
    filter_text: String,
    revision: u64,
    snapshot_tx: watch::Sender<Arc<DashboardSnapshot>>,
    effects_tx: broadcast::Sender<ViewEffect>,
}

impl Default for TelemetryEngine {
    fn default() -> Self {
        Self::new(EngineLimits::default())
    }
}

impl TelemetryEngine {
    pub fn new(limits: EngineLimits) -> Self {
        let (snapshot_tx, _) = watch::channel(Arc::new(DashboardSnapshot::empty(&limits)));
        let (effects_tx, _) = broadcast::channel(VIEW_EFFECT_DEPTH);
        Self {
            limits,
            packets: BoundedSeq::new(limits.packets),
            tally: ProtocolTally::new(),
            traffic: TrafficSeries::new(limits.traffic),
            alerts: AlertLog::new(limits.alerts),
            scroll: ScrollTracker::new(SCROLL_FOLLOW_THRESHOLD),
            status: ConnectionStatus::default(),
            filter_text: String::new(),
            revision: 0,
            snapshot_tx,
            effects_tx,
        }
    }

    /// Subscribe to published snapshots.
    pub fn subscribe(&self) -> watch::Receiver<Arc<DashboardSnapshot>> {
        self.snapshot_tx.subscribe()
    }

    /// Subscribe to scroll side effects.
    pub fn view_effects(&self) -> broadcast::Receiver<ViewEffect> {
        self.effects_tx.subscribe()
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Arc<DashboardSnapshot> {
        self.snapshot_tx.borrow().clone()
    }

    /// Decode and apply one raw backend message.
    ///
    /// A malformed message leaves every store untouched and publishes nothing.
    pub fn ingest(&mut self, name: &str, payload: Value) -> Result<Option<ViewEffect>, AppError> {
        let event = BackendEvent::decode(name, payload)?;
        Ok(self.apply(EngineInput::Backend(event)))
    }

    pub fn apply(&mut self, input: EngineInput) -> Option<ViewEffect> {
        self.apply_at(input, Local::now())
    }

    /// Apply one input as of `now`, then publish.
    pub fn apply_at(&mut self, input: EngineInput, now: DateTime<Local>) -> Option<ViewEffect> {
        let effect = match input {
            EngineInput::Backend(event) => self.apply_backend(event, now),
            EngineInput::View(view) => self.apply_view(view),
        };
        self.publish();
        if let Some(effect) = effect {
            // No receivers is fine; the effect is also returned.
            let _ = self.effects_tx.send(effect);
        }
        effect
    }

    fn apply_backend(&mut self, event: BackendEvent, now: DateTime<Local>) -> Option<ViewEffect> {
        match event {
            BackendEvent::Connect => {
                self.status.connected = true;
                tracing::info!("Connected to capture backend");
                None
            }
            BackendEvent::Disconnect => {
                self.status.connected = false;
                tracing::info!(
                    "Disconnected from capture backend; keeping {} buffered packets",
                    self.packets.len()
                );
                None
            }
            BackendEvent::Packet(packet) => {
                tracing::trace!(
                    "packet {} -> {} {} {}B",
                    packet.source_address,
                    packet.dest_address,
                    packet.protocol.as_str(),
                    packet.length
                );
                self.tally.record(&packet.protocol);
                self.traffic.record(packet.length, now);
                self.packets.append(Arc::new(packet));
                self.scroll.on_ingest()
            }
            BackendEvent::Threat(wire) => {
                let alert = wire.observed(now);
                tracing::debug!("Threat [{}] {}: {}", alert.level.as_str(), alert.kind, alert.message);
                self.alerts.record(alert);
                None
            }
            BackendEvent::GeoUpdate(update) => {
                let matching = self
                    .packets
                    .iter_mut()
                    .filter(|p| p.dest_address == update.ip)
                    .map(Arc::make_mut);
                let patched = apply_geo_patch(matching, &update);
                tracing::debug!("Geo update for {} patched {patched} packets", update.ip);
                None
            }
            BackendEvent::Status { is_capturing } => {
                if self.status.capturing != is_capturing {
                    tracing::info!("Capture {}", if is_capturing { "started" } else { "stopped" });
                }
                self.status.capturing = is_capturing;
                None
            }
        }
    }

    fn apply_view(&mut self, input: ViewInput) -> Option<ViewEffect> {
        match input {
            ViewInput::SetFilter(text) => {
                self.filter_text = text;
                None
            }
            ViewInput::Scroll(position) => {
                self.scroll.report_position(position);
                None
            }
            ViewInput::Resume => Some(self.scroll.resume()),
        }
    }

    fn publish(&mut self) {
        self.revision += 1;
        let snapshot = DashboardSnapshot {
            revision: self.revision,
            status: self.status,
            packets: self.packets.snapshot(),
            packet_capacity: self.packets.capacity(),
            tally: self.tally,
            traffic: self.traffic.snapshot(),
            alerts: self.alerts.snapshot(),
            severity: self.alerts.current_severity(),
            filter_text: self.filter_text.clone(),
            scroll: self.scroll.state(),
            map_window: self.limits.map_window,
        };
        self.snapshot_tx.send_replace(Arc::new(snapshot));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::packet::GeoPoint;
    use serde_json::json;

    fn packet_json(dst: &str, proto: &str, len: u64, ts: f64) -> Value {
        json!({
            "timestamp": ts, "src": "192.168.1.10", "dst": dst, "proto": proto,
            "len": len, "summary": format!("Ether / IP / {proto} 192.168.1.10 > {dst}"),
            "payload_hex": "", "payload_ascii": ""
        })
    }

    fn threat_json(level: &str, kind: &str) -> Value {
        json!({ "type": kind, "level": level, "message": format!("{kind} from 10.0.0.5") })
    }

    fn small_limits() -> EngineLimits {
        EngineLimits { packets: 5, traffic: 3, alerts: 2, map_window: 4 }
    }

    #[test]
    fn test_packet_updates_buffer_tally_and_traffic() {
        let mut engine = TelemetryEngine::default();
        engine.ingest("packet", packet_json("1.2.3.4", "TCP", 60, 1.0)).unwrap();
        let snap = engine.snapshot();
        assert_eq!(snap.packets.len(), 1);
        assert_eq!(snap.tally, ProtocolTally { tcp: 1, udp: 0, other: 0, total: 1 });
        assert_eq!(snap.traffic.len(), 1);
        assert_eq!(snap.traffic[0].magnitude, 60);
        assert_eq!(snap.revision, 1);
    }

    #[test]
    fn test_buffers_stay_bounded_but_tally_keeps_counting() {
        let mut engine = TelemetryEngine::new(small_limits());
        for i in 0..12 {
            engine
                .ingest("packet", packet_json("1.1.1.1", "UDP", i, i as f64))
                .unwrap();
        }
        let snap = engine.snapshot();
        assert_eq!(snap.packets.len(), 5);
        assert_eq!(snap.packets[0].length, 7);
        assert_eq!(snap.traffic.len(), 3);
        assert_eq!(snap.tally.udp, 12);
        assert_eq!(snap.tally.total, 12);
        assert_eq!(snap.buffer_label(), "BUFFER: 5 / 5 PACKETS");
    }

    #[test]
    fn test_malformed_event_leaves_state_untouched() {
        let mut engine = TelemetryEngine::default();
        engine.ingest("packet", packet_json("1.2.3.4", "TCP", 60, 1.0)).unwrap();
        let before = engine.snapshot();

        let err = engine
            .ingest("packet", json!({"src": "a", "dst": "b", "proto": "TCP"}))
            .unwrap_err();
        assert_eq!(err.kind(), "Payload");
        assert!(engine.ingest("threat", json!({"level": "HIGH"})).is_err());
        assert!(engine.ingest("nonsense", Value::Null).is_err());

        let after = engine.snapshot();
        assert_eq!(after.revision, before.revision);
        assert_eq!(after.tally, before.tally);

        engine.ingest("packet", packet_json("1.2.3.4", "UDP", 10, 2.0)).unwrap();
        assert_eq!(engine.snapshot().tally.total, 2);
    }

    #[test]
    fn test_severity_follows_most_recent_alert() {
        let mut engine = TelemetryEngine::new(small_limits());
        assert_eq!(engine.snapshot().current_severity(), Severity::Safe);
        engine.ingest("threat", threat_json("CRITICAL", "SENSITIVE_DATA")).unwrap();
        assert_eq!(engine.snapshot().status_tier(), StatusTier::Critical);
        engine.ingest("threat", threat_json("MEDIUM", "HIGH_VOLUME")).unwrap();
        engine.ingest("threat", threat_json("HIGH", "PORT_SCAN")).unwrap();
        let snap = engine.snapshot();
        assert_eq!(snap.alerts.len(), 2);
        assert_eq!(snap.current_severity(), Severity::High);
        assert_eq!(snap.alerts[1].kind, "HIGH_VOLUME");
        assert_eq!(snap.severity, snap.alerts[0].level);
    }

    #[test]
    fn test_geo_update_patches_buffered_packets() {
        let mut engine = TelemetryEngine::default();
        engine.ingest("packet", packet_json("1.2.3.4", "TCP", 60, 1.0)).unwrap();
        engine.ingest("packet", packet_json("5.5.5.5", "TCP", 60, 2.0)).unwrap();
        engine.ingest("packet", packet_json("1.2.3.4", "UDP", 60, 3.0)).unwrap();
        engine
            .ingest(
                "geo_update",
                json!({"ip": "1.2.3.4", "geo_info": {"location": "US", "lat": 37.0, "lon": -122.0}}),
            )
            .unwrap();
        let snap = engine.snapshot();
        let coords: Vec<Option<GeoPoint>> = snap.packets.iter().map(|p| p.coords).collect();
        let us = Some(GeoPoint { lat: 37.0, lon: -122.0 });
        assert_eq!(coords, vec![us, None, us]);
        let connections = snap.connections();
        assert_eq!(connections.len(), 1);
        assert_eq!(connections[0].count, 2);
        assert_eq!(connections[0].last_seen, 3.0);
        assert_eq!(snap.active_nodes(), 1);
    }

    #[test]
    fn test_status_and_link_flags_come_only_from_signals() {
        let mut engine = TelemetryEngine::default();
        engine.ingest("connect", Value::Null).unwrap();
        engine.ingest("status", json!({"is_capturing": true})).unwrap();
        engine.ingest("packet", packet_json("1.2.3.4", "TCP", 60, 1.0)).unwrap();
        engine.ingest("disconnect", Value::Null).unwrap();
        let snap = engine.snapshot();
        assert_eq!(snap.status, ConnectionStatus { connected: false, capturing: true });
        assert_eq!(snap.packets.len(), 1);
    }

    #[test]
    fn test_filter_text_drives_filtered_view() {
        let mut engine = TelemetryEngine::default();
        engine.ingest("packet", packet_json("1.2.3.4", "TCP", 60, 1.0)).unwrap();
        engine.ingest("packet", packet_json("8.8.8.8", "UDP", 80, 2.0)).unwrap();
        assert_eq!(engine.snapshot().filtered_packets().len(), 2);
        engine.apply(EngineInput::View(ViewInput::SetFilter("udp".into())));
        let snap = engine.snapshot();
        assert_eq!(snap.filtered_packets().len(), 1);
        assert_eq!(snap.packets.len(), 2);
    }

    #[test]
    fn test_scroll_hold_suppresses_follow_until_resume() {
        let mut engine = TelemetryEngine::default();
        let follow = engine.ingest("packet", packet_json("1.2.3.4", "TCP", 60, 1.0)).unwrap();
        assert_eq!(follow, Some(ViewEffect::ScrollToBottom));

        engine.apply(EngineInput::View(ViewInput::Scroll(ScrollPosition {
            offset: 0.0,
            content_height: 600.0,
            viewport_height: 400.0,
        })));
        assert_eq!(engine.snapshot().scroll, ScrollState::Held);
        assert_eq!(engine.ingest("packet", packet_json("1.2.3.4", "TCP", 60, 2.0)).unwrap(), None);

        let resumed = engine.apply(EngineInput::View(ViewInput::Resume));
        assert_eq!(resumed, Some(ViewEffect::ScrollToBottom));
        assert_eq!(engine.snapshot().scroll, ScrollState::Following);
    }

    #[test]
    fn test_non_packet_events_never_scroll() {
        let mut engine = TelemetryEngine::default();
        assert_eq!(engine.ingest("threat", threat_json("HIGH", "PORT_SCAN")).unwrap(), None);
        assert_eq!(engine.ingest("connect", Value::Null).unwrap(), None);
    }

    #[test]
    fn test_subscribers_observe_each_publication() {
        let mut engine = TelemetryEngine::default();
        let mut rx = engine.subscribe();
        let mut effects = engine.view_effects();
        engine.ingest("packet", packet_json("1.2.3.4", "TCP", 60, 1.0)).unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().revision, 1);
        assert_eq!(effects.try_recv().unwrap(), ViewEffect::ScrollToBottom);
    }

    #[test]
    fn test_older_snapshot_is_unaffected_by_later_events() {
        let mut engine = TelemetryEngine::default();
        engine.ingest("packet", packet_json("1.2.3.4", "TCP", 60, 1.0)).unwrap();
        let held = engine.snapshot();
        engine
            .ingest("geo_update", json!({"ip": "1.2.3.4", "geo_info": null}))
            .unwrap();
        assert_eq!(held.packets[0].geo, None);
        assert_eq!(engine.snapshot().packets[0].geo.as_deref(), Some("Unknown"));
    }

    #[test]
    fn test_publication_shares_unchanged_records() {
        let mut engine = TelemetryEngine::default();
        engine.ingest("packet", packet_json("1.2.3.4", "TCP", 60, 1.0)).unwrap();
        engine.ingest("packet", packet_json("5.5.5.5", "TCP", 60, 2.0)).unwrap();
        let first = engine.snapshot();

        engine.ingest("packet", packet_json("6.6.6.6", "UDP", 60, 3.0)).unwrap();
        let second = engine.snapshot();
        assert!(Arc::ptr_eq(&first.packets[0], &second.packets[0]));
        assert!(Arc::ptr_eq(&first.packets[1], &second.packets[1]));

        engine
            .ingest("geo_update", json!({"ip": "1.2.3.4", "geo_info": null}))
            .unwrap();
        let third = engine.snapshot();
        assert!(!Arc::ptr_eq(&second.packets[0], &third.packets[0]));
        assert!(Arc::ptr_eq(&second.packets[1], &third.packets[1]));
        assert_eq!(second.packets[0].geo, None);
        assert_eq!(third.packets[0].geo.as_deref(), Some("Unknown"));
    }

    #[test]
    fn test_zero_packet_limit_reports_raised_capacity() {
        let limits = EngineLimits { packets: 0, ..EngineLimits::default() };
        let mut engine = TelemetryEngine::new(limits);
        assert_eq!(engine.snapshot().packet_capacity, 1);
        engine.ingest("packet", packet_json("1.2.3.4", "TCP", 60, 1.0)).unwrap();
        engine.ingest("packet", packet_json("1.2.3.4", "TCP", 60, 2.0)).unwrap();
        assert_eq!(engine.snapshot().buffer_label(), "BUFFER: 1 / 1 PACKETS");
    }

    #[test]
    fn test_view_input_deserializes_from_tagged_json() {
        let input: ViewInput =
            serde_json::from_value(json!({"kind": "set_filter", "value": "dns"})).unwrap();
        assert_eq!(input, ViewInput::SetFilter("dns".into()));
        let resume: ViewInput = serde_json::from_value(json!({"kind": "resume"})).unwrap();
        assert_eq!(resume, ViewInput::Resume);
    }
}
