//! Geo-indexed connection aggregates for the live map.
//!
//! A pure projection over the most recent packets: no state survives between
//! calls, so the output depends only on the window it is given.

use std::borrow::Borrow;
use std::collections::HashMap;

use serde::Serialize;

use crate::config::{MARKER_COUNT_DOMAIN, MARKER_RADIUS_RANGE};
use crate::core::packet::PacketRecord;

/// One map endpoint, deduplicated by exact coordinate pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoConnection {
    pub lat: f64,
    pub lon: f64,
    pub count: usize,
    /// Largest capture timestamp among the grouped packets.
    pub last_seen: f64,
    /// Label of the first packet seen at this coordinate.
    pub location: Option<String>,
}

impl GeoConnection {
    pub fn marker_radius(&self) -> f64 {
        marker_radius(self.count)
    }
}

/// Group the last `window` packets by coordinate pair, in first-seen order.
///
/// Packets without coordinates are skipped.
pub fn aggregate_connections<P>(packets: &[P], window: usize) -> Vec<GeoConnection>
where
    P: Borrow<PacketRecord>,
{
    let start = packets.len().saturating_sub(window);
    let mut index: HashMap<(u64, u64), usize> = HashMap::new();
    let mut connections: Vec<GeoConnection> = Vec::new();

    for item in &packets[start..] {
        let packet: &PacketRecord = item.borrow();
        let Some(point) = packet.coords else {
            continue;
        };
        // +0.0 folds -0.0 onto 0.0 so both hash alike.
        let key = ((point.lat + 0.0).to_bits(), (point.lon + 0.0).to_bits());
        match index.get(&key) {
            Some(&i) => {
                let existing = &mut connections[i];
                existing.count += 1;
                existing.last_seen = existing.last_seen.max(packet.timestamp);
            }
            None => {
                index.insert(key, connections.len());
                connections.push(GeoConnection {
                    lat: point.lat,
                    lon: point.lon,
                    count: 1,
                    last_seen: packet.timestamp,
                    location: packet.geo.clone(),
                });
            }
        }
    }

    connections
}

/// Clamped linear scale from packet count onto marker radius.
pub fn marker_radius(count: usize) -> f64 {
    let (d0, d1) = MARKER_COUNT_DOMAIN;
    let (r0, r1) = MARKER_RADIUS_RANGE;
    let t = ((count as f64 - d0) / (d1 - d0)).clamp(0.0, 1.0);
    r0 + t * (r1 - r0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::packet::{GeoPoint, Protocol};

    fn make_packet(ts: f64, coords: Option<(f64, f64)>, geo: &str) -> PacketRecord {
        PacketRecord {
            timestamp: ts,
            source_address: "10.0.0.2".into(),
            dest_address: "1.2.3.4".into(),
            protocol: Protocol::Udp,
            length: 100,
            summary: "UDP".into(),
            dest_port: None,
            payload_hex: None,
            payload_ascii: None,
            geo: Some(geo.into()),
            coords: coords.map(|(lat, lon)| GeoPoint { lat, lon }),
        }
    }

    #[test]
    fn test_empty_window_yields_nothing() {
        assert!(aggregate_connections::<PacketRecord>(&[], 50).is_empty());
    }

    #[test]
    fn test_groups_by_pair_and_counts_sum_to_resolved() {
        let packets = vec![
            make_packet(1.0, Some((37.0, -122.0)), "US"),
            make_packet(2.0, None, "Resolving..."),
            make_packet(3.0, Some((51.5, -0.1)), "GB London"),
            make_packet(4.0, Some((37.0, -122.0)), "US"),
            make_packet(5.0, Some((35.6, 139.7)), "JP Tokyo"),
        ];
        let connections = aggregate_connections(&packets, 50);
        assert_eq!(connections.len(), 3);
        assert_eq!(connections.iter().map(|c| c.count).sum::<usize>(), 4);
        assert_eq!(connections[0].count, 2);
        assert_eq!(connections[0].location.as_deref(), Some("US"));
    }

    #[test]
    fn test_last_seen_is_maximum_not_last_in_order() {
        let packets = vec![
            make_packet(9.0, Some((1.0, 1.0)), "X"),
            make_packet(4.0, Some((1.0, 1.0)), "X"),
        ];
        let connections = aggregate_connections(&packets, 50);
        assert_eq!(connections[0].last_seen, 9.0);
    }

    #[test]
    fn test_only_the_trailing_window_is_considered() {
        let mut packets: Vec<PacketRecord> = (0..60)
            .map(|i| make_packet(i as f64, Some((10.0, 10.0)), "A"))
            .collect();
        packets[0].coords = Some(GeoPoint { lat: 99.0, lon: 99.0 });
        let connections = aggregate_connections(&packets, 50);
        assert_eq!(connections.len(), 1);
        assert_eq!(connections[0].count, 50);
    }

    #[test]
    fn test_zero_coordinates_are_valid() {
        let packets = vec![make_packet(1.0, Some((0.0, -0.0)), "Null Island")];
        let connections = aggregate_connections(&packets, 50);
        assert_eq!(connections.len(), 1);
    }

    #[test]
    fn test_recomputation_is_idempotent() {
        let packets = vec![
            make_packet(1.0, Some((37.0, -122.0)), "US"),
            make_packet(2.0, Some((37.0, -122.0)), "US"),
        ];
        assert_eq!(
            aggregate_connections(&packets, 50),
            aggregate_connections(&packets, 50)
        );
    }

    #[test]
    fn test_marker_radius_is_clamped_linear() {
        assert_eq!(marker_radius(1), 2.0);
        assert_eq!(marker_radius(50), 8.0);
        assert_eq!(marker_radius(500), 8.0);
        let mid = marker_radius(25);
        assert!(mid > 4.8 && mid < 5.0, "got {mid}");
    }
}
