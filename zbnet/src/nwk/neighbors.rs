//! The neighbor table.

use crate::frame::CapabilityInformation;

/// The number of neighbor entries the table can hold.
pub const MAX_NEIGHBORS: usize = 16;

/// What kind of node a neighbor is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceType {
    Unknown,
    Coordinator,
    Router,
    EndDevice,
}

/// How a neighbor relates to this node in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Relationship {
    /// Heard on the air, no tree relation.
    None,
    Parent,
    /// A child whose association has completed.
    Child,
    /// A child whose Association Response has not been confirmed yet.
    UnconfirmedChild,
}

/// A single neighbor table entry.
#[derive(Debug, Clone, Copy)]
pub struct Neighbor {
    pub extended_address: Option<[u8; 8]>,
    pub short_address: u16,
    pub pan_id: u16,
    pub channel: u8,
    pub device_type: DeviceType,
    pub relationship: Relationship,
    pub depth: u8,
    pub permit_joining: bool,
    pub capability: CapabilityInformation,
    pub lqi: u8,
}

/// A bounded table of the nodes this device knows about.
///
/// Entries are created by network discovery, join and join indications, and
/// removed when a device leaves. The capacity is fixed at compile time;
/// insertion into a full table fails and the caller reports the exhaustion.
pub struct NeighborTable {
    entries: heapless::Vec<Neighbor, MAX_NEIGHBORS>,
}

impl NeighborTable {
    pub fn new() -> Self {
        Self {
            entries: heapless::Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Neighbor> {
        self.entries.iter()
    }

    /// Insert an entry, or refresh the existing one with the same short
    /// address and PAN.
    pub fn insert(&mut self, neighbor: Neighbor) -> bool {
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|n| n.short_address == neighbor.short_address && n.pan_id == neighbor.pan_id)
        {
            *existing = neighbor;
            return true;
        }
        self.entries.push(neighbor).is_ok()
    }

    pub fn find_by_short(&self, short_address: u16) -> Option<&Neighbor> {
        self.entries
            .iter()
            .find(|n| n.short_address == short_address)
    }

    pub fn find_by_extended(&self, extended_address: [u8; 8]) -> Option<&Neighbor> {
        self.entries
            .iter()
            .find(|n| n.extended_address == Some(extended_address))
    }

    pub fn find_by_short_mut(&mut self, short_address: u16) -> Option<&mut Neighbor> {
        self.entries
            .iter_mut()
            .find(|n| n.short_address == short_address)
    }

    /// The first discovered network on `pan_id` that accepts joiners.
    pub fn find_joinable(&self, pan_id: u16) -> Option<&Neighbor> {
        self.entries
            .iter()
            .find(|n| n.pan_id == pan_id && n.permit_joining)
    }

    pub fn remove_by_short(&mut self, short_address: u16) -> Option<Neighbor> {
        let index = self
            .entries
            .iter()
            .position(|n| n.short_address == short_address)?;
        Some(self.entries.swap_remove(index))
    }

    pub fn remove_by_extended(&mut self, extended_address: [u8; 8]) -> Option<Neighbor> {
        let index = self
            .entries
            .iter()
            .position(|n| n.extended_address == Some(extended_address))?;
        Some(self.entries.swap_remove(index))
    }

    /// The number of confirmed and unconfirmed children.
    pub fn child_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|n| {
                matches!(
                    n.relationship,
                    Relationship::Child | Relationship::UnconfirmedChild
                )
            })
            .count()
    }
}

impl Default for NeighborTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn neighbor(short_address: u16) -> Neighbor {
        Neighbor {
            extended_address: None,
            short_address,
            pan_id: 0x1234,
            channel: 15,
            device_type: DeviceType::Router,
            relationship: Relationship::None,
            depth: 1,
            permit_joining: true,
            capability: CapabilityInformation::empty(),
            lqi: 0xff,
        }
    }

    #[test]
    fn insert_refreshes_existing_entry() {
        let mut table = NeighborTable::new();

        assert!(table.insert(neighbor(0x0001)));
        let mut updated = neighbor(0x0001);
        updated.lqi = 0x10;
        assert!(table.insert(updated));

        assert_eq!(table.len(), 1);
        assert_eq!(table.find_by_short(0x0001).unwrap().lqi, 0x10);
    }

    #[test]
    fn full_table_rejects_insert() {
        let mut table = NeighborTable::new();
        for i in 0..MAX_NEIGHBORS as u16 {
            assert!(table.insert(neighbor(i)));
        }
        assert!(!table.insert(neighbor(0x1000)));
    }

    #[test]
    fn remove_forgets_the_entry() {
        let mut table = NeighborTable::new();
        table.insert(neighbor(0x0001));
        table.insert(neighbor(0x0002));

        assert!(table.remove_by_short(0x0001).is_some());
        assert!(table.find_by_short(0x0001).is_none());
        assert_eq!(table.len(), 1);
    }
}
