//! Late-arriving geolocation enrichment.
//!
//! The backend resolves destination addresses asynchronously and reports each
//! resolution once. A resolution patches every buffered packet sharing that
//! destination; packets already evicted are simply missed.

use serde::Deserialize;

use crate::config::UNKNOWN_LOCATION;
use crate::core::packet::{GeoPoint, PacketRecord};

/// Resolved location for one address.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeoInfo {
    pub location: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

/// `geo_update` event payload. A null `geo_info` means the lookup failed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeoUpdate {
    pub ip: String,
    #[serde(default)]
    pub geo_info: Option<GeoInfo>,
}

impl GeoUpdate {
    /// Location label and coordinates this update writes.
    pub fn resolved(&self) -> (String, Option<GeoPoint>) {
        match &self.geo_info {
            Some(info) => (info.location.clone(), GeoPoint::from_parts(info.lat, info.lon)),
            None => (UNKNOWN_LOCATION.to_string(), None),
        }
    }
}

/// Patch every record whose destination matches `update.ip`.
///
/// Returns the number of records touched. Idempotent.
pub fn apply_geo_patch<'a, I>(records: I, update: &GeoUpdate) -> usize
where
    I: IntoIterator<Item = &'a mut PacketRecord>,
{
    let (label, coords) = update.resolved();
    let mut patched = 0;
    for record in records {
        if record.dest_address == update.ip {
            record.geo = Some(label.clone());
            record.coords = coords;
            patched += 1;
        }
    }
    patched
}
