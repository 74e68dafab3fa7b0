//! Running per-protocol packet counters.

use serde::Serialize;

use crate::core::packet::Protocol;

/// Monotonic tally keyed by protocol category, plus a grand total.
///
/// Counters are never decremented; eviction from the packet buffer does not
/// touch them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProtocolTally {
    pub tcp: u64,
    pub udp: u64,
    pub other: u64,
    pub total: u64,
}

impl ProtocolTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one packet.
    pub fn record(&mut self, proto: &Protocol) {
        self.total += 1;
        match proto {
            Protocol::Tcp => self.tcp += 1,
            Protocol::Udp => self.udp += 1,
            Protocol::Other(_) => self.other += 1,
        }
    }
}
