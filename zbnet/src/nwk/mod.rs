//! The ZigBee-style NWK layer: tree-shaped networks over the MAC.
//!
//! [`Nwk`] owns the [`Mac`] and is strictly layered above it: every frame it
//! sends goes through an MCPS data request, every frame it hears arrives as
//! a MAC indication through [`Nwk::process`]. Addresses are assigned with
//! the distributed Cskip scheme and routed by address arithmetic alone; no
//! routing tables exist.

pub mod address;
pub mod neighbors;
pub mod nib;

mod nlde;
mod nlme;

use rand_core::RngCore;

use crate::frame::{Address, CapabilityInformation};
use crate::mac::constants::MAX_PAN_DESCRIPTORS;
use crate::mac::timer::DelayTimer;
use crate::mac::{Mac, MacEvent, MacUpper, Status};
use crate::phy::Radio;
use crate::pool::Buffer;

use neighbors::NeighborTable;
use nib::{Nib, TreeConfig};

/// A network heard during discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NetworkDescriptor {
    pub pan_id: u16,
    pub channel: u8,
    /// The short address of the answering coordinator or router.
    pub coordinator_address: u16,
    pub pan_coordinator: bool,
    pub permit_joining: bool,
    pub lqi: u8,
}

/// A notification from the NWK layer to the application.
#[derive(Debug)]
pub enum NwkUpper<'p> {
    NetworkDiscoveryConfirm {
        status: Status,
        networks: heapless::Vec<NetworkDescriptor, MAX_PAN_DESCRIPTORS>,
    },
    JoinConfirm {
        status: Status,
        short_address: u16,
    },
    /// A device completed its join through this node.
    JoinIndication {
        short_address: u16,
        extended_address: [u8; 8],
        capability: CapabilityInformation,
    },
    LeaveConfirm {
        status: Status,
    },
    LeaveIndication {
        device: Address,
    },
    DataConfirm {
        status: Status,
    },
    DataIndication {
        src_address: u16,
        dst_address: u16,
        payload: Buffer<'p>,
        lqi: u8,
    },
}

/// A device-side join waiting for its associate confirm.
pub(crate) struct PendingJoin {
    pub(crate) parent: u16,
}

/// A parent-side join waiting for the comm-status of its Association
/// Response.
pub(crate) struct PendingChild {
    pub(crate) extended_address: [u8; 8],
    pub(crate) short_address: u16,
    pub(crate) capability: CapabilityInformation,
}

/// The target of a leave in progress.
pub(crate) enum PendingLeave {
    /// This node is leaving its parent.
    Own,
    /// A child at this short address is being expelled.
    Child(u16),
}

/// The NWK layer context.
pub struct Nwk<'p, R: Radio, T: DelayTimer, Rng: RngCore> {
    pub(crate) mac: Mac<'p, R, T, Rng>,
    pub(crate) nib: Nib,
    pub(crate) neighbors: NeighborTable,
    pub(crate) pending_join: Option<PendingJoin>,
    pub(crate) pending_child: Option<PendingChild>,
    pub(crate) pending_leave: Option<PendingLeave>,
}

impl<'p, R, T, Rng> Nwk<'p, R, T, Rng>
where
    R: Radio,
    T: DelayTimer,
    Rng: RngCore,
{
    /// Wrap a MAC into a network layer with the given tree parameters.
    ///
    /// The NWK sequence number is seeded from the MAC's RNG; the MAC itself
    /// is reset here.
    pub fn new(mut mac: Mac<'p, R, T, Rng>, tree: TreeConfig) -> Self {
        mac.mlme_reset_request(true);

        let mut nib = Nib::new(tree);
        nib.sequence_number = (mac.rng.next_u32() & 0xff) as u8;

        Self {
            mac,
            nib,
            neighbors: NeighborTable::new(),
            pending_join: None,
            pending_child: None,
            pending_leave: None,
        }
    }

    /// The short address of this node.
    pub fn short_address(&self) -> u16 {
        self.nib.short_address
    }

    /// The depth of this node in the tree.
    pub fn depth(&self) -> u8 {
        self.nib.depth
    }

    /// The current network state.
    pub fn network_state(&self) -> nib::NetworkState {
        self.nib.state
    }

    /// The neighbor table.
    pub fn neighbors(&self) -> &NeighborTable {
        &self.neighbors
    }

    /// Direct access to the MAC, for attributes the NWK does not wrap.
    pub fn mac(&mut self) -> &mut Mac<'p, R, T, Rng> {
        &mut self.mac
    }

    /// Feed one event through the MAC and interpret whatever it reports.
    pub fn process(&mut self, event: MacEvent) -> Option<NwkUpper<'p>> {
        let upper = self.mac.process(event)?;
        self.handle_mac_upper(upper)
    }

    fn handle_mac_upper(&mut self, upper: MacUpper<'p>) -> Option<NwkUpper<'p>> {
        match upper {
            MacUpper::ScanConfirm {
                status,
                kind: _,
                descriptors,
            } => self.handle_scan_confirm(status, descriptors),
            MacUpper::AssociateConfirm {
                status,
                short_address,
            } => self.handle_associate_confirm(status, short_address),
            MacUpper::AssociateIndication { device, capability } => {
                self.handle_associate_indication(device, capability)
            }
            MacUpper::CommStatus { status, device } => self.handle_comm_status(status, device),
            MacUpper::DisassociateConfirm { status } => self.handle_disassociate_confirm(status),
            MacUpper::DisassociateIndication { device, reason: _ } => {
                self.handle_disassociate_indication(device)
            }
            MacUpper::DataConfirm { status } => Some(NwkUpper::DataConfirm { status }),
            MacUpper::DataIndication(indication) => self.handle_data_indication(indication),
            MacUpper::OrphanIndication { device } => {
                // Realign a known former child; silence for strangers.
                if let Some(child) = self.neighbors.find_by_extended(device) {
                    let short_address = child.short_address;
                    self.mac.mlme_orphan_response(device, short_address);
                }
                None
            }
            MacUpper::BeaconNotify { .. } => None,
        }
    }
}
