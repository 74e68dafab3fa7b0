//! Live text filter over the packet buffer.

use std::borrow::{Borrow, Cow};

use crate::core::packet::PacketRecord;

/// Stable, case-insensitive substring filter.
///
/// An empty predicate borrows the input unchanged. Otherwise a record matches
/// when its source, destination, protocol label, or summary contains the
/// predicate. Works over owned records and over the shared records a
/// snapshot holds.
pub fn filter_packets<'a, P>(packets: &'a [P], predicate: &str) -> Cow<'a, [P]>
where
    P: Borrow<PacketRecord> + Clone,
{
    if predicate.is_empty() {
        return Cow::Borrowed(packets);
    }
    let needle = predicate.to_lowercase();
    Cow::Owned(
        packets
            .iter()
            .filter(|p| {
                let record: &PacketRecord = (*p).borrow();
                record_matches(record, &needle)
            })
            .cloned()
            .collect(),
    )
}

/// `needle` must already be lowercase.
fn record_matches(packet: &PacketRecord, needle: &str) -> bool {
    [
        packet.source_address.as_str(),
        packet.dest_address.as_str(),
        packet.protocol.as_str(),
        packet.summary.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
}
