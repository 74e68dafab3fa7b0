//! Packet list, map, and status queries, plus the view inputs that feed back
//! into the engine (filter text, scroll reports, resume).

use std::sync::Arc;

use serde::Serialize;

use crate::core::alerts::{Severity, StatusTier};
use crate::core::connections::GeoConnection;
use crate::core::engine::{DashboardSnapshot, ViewInput};
use crate::core::packet::PacketRecord;
use crate::core::scroll::ScrollPosition;
use crate::error::AppError;

use super::state::AppState;

/// Global indicator state for headers and borders.
#[derive(Debug, Clone, Serialize)]
pub struct GlobalStatus {
    pub connected: bool,
    pub capturing: bool,
    pub severity: Severity,
    pub tier: StatusTier,
    pub buffer_label: String,
    pub active_nodes: usize,
}

/// A map marker with its precomputed radius.
#[derive(Debug, Clone, Serialize)]
pub struct MapMarker {
    #[serde(flatten)]
    pub connection: GeoConnection,
    pub radius: f64,
}

pub fn get_snapshot(state: &AppState) -> Arc<DashboardSnapshot> {
    state.current()
}

/// Packets passing the live filter, oldest first.
pub fn get_filtered_packets(state: &AppState) -> Vec<Arc<PacketRecord>> {
    state.current().filtered_packets().into_owned()
}

pub fn get_map_markers(state: &AppState) -> Vec<MapMarker> {
    state
        .current()
        .connections()
        .into_iter()
        .map(|connection| MapMarker {
            radius: connection.marker_radius(),
            connection,
        })
        .collect()
}

pub fn get_global_status(state: &AppState) -> GlobalStatus {
    let snap = state.current();
    GlobalStatus {
        connected: snap.status.connected,
        capturing: snap.status.capturing,
        severity: snap.current_severity(),
        tier: snap.status_tier(),
        buffer_label: snap.buffer_label(),
        active_nodes: snap.active_nodes(),
    }
}

pub async fn set_filter(state: &AppState, text: String) -> Result<(), AppError> {
    state.inbound.view(ViewInput::SetFilter(text)).await
}

pub async fn report_scroll(state: &AppState, position: ScrollPosition) -> Result<(), AppError> {
    if !(position.offset.is_finite()
        && position.content_height.is_finite()
        && position.viewport_height.is_finite())
    {
        return Err(AppError::InvalidInput("Scroll position must be finite".into()));
    }
    state.inbound.view(ViewInput::Scroll(position)).await
}

/// Force the list back to following; the engine emits one scroll-to-bottom.
pub async fn resume_scroll(state: &AppState) -> Result<(), AppError> {
    state.inbound.view(ViewInput::Resume).await
}
