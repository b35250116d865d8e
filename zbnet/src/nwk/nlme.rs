//! NLME primitives: formation, discovery, join, leave, start-router.

use rand_core::RngCore;

use crate::frame::{Address, AssociationStatus, CapabilityInformation, DisassociationReason};
use crate::mac::constants::{BROADCAST_SHORT_ADDRESS, MAX_PAN_DESCRIPTORS};
use crate::mac::state::MacState;
use crate::mac::timer::DelayTimer;
use crate::mac::{PanDescriptor, ScanKind, Status};
use crate::phy::Radio;

use super::address::{cskip, depth_of, end_device_child_address, router_child_address};
use super::neighbors::{DeviceType, Neighbor, Relationship};
use super::nib::{NetworkState, Nib, Role};
use super::{NetworkDescriptor, Nwk, NwkUpper, PendingChild, PendingJoin, PendingLeave};

impl<'p, R, T, Rng> Nwk<'p, R, T, Rng>
where
    R: Radio,
    T: DelayTimer,
    Rng: RngCore,
{
    /// Form a new network as its coordinator. Synchronous.
    pub fn nlme_network_formation_request(&mut self, pan_id: u16, channel: u8) -> bool {
        if self.nib.state != NetworkState::Idle {
            return false;
        }
        if !self.mac.mlme_start_request(pan_id, channel) {
            return false;
        }

        self.nib.short_address = self.mac.short_address();
        self.nib.depth = 0;
        self.nib.parent = BROADCAST_SHORT_ADDRESS;
        self.nib.role = Role::Coordinator;
        self.nib.state = NetworkState::Formed;
        self.nib.cskip = cskip(&self.nib.tree, 0);
        self.nib.pan_id = pan_id;
        self.nib.channel = channel;

        info!("formed network");
        true
    }

    /// Discover nearby networks with an active scan.
    ///
    /// Completion arrives as [`NwkUpper::NetworkDiscoveryConfirm`], with
    /// every network heard merged into the neighbor table.
    pub fn nlme_network_discovery_request(
        &mut self,
        first_channel: u8,
        last_channel: u8,
        duration_order: u8,
    ) -> bool {
        if self.nib.state != NetworkState::Idle {
            return false;
        }
        if !self
            .mac
            .mlme_scan_request(ScanKind::Active, first_channel, last_channel, duration_order)
        {
            return false;
        }

        self.nib.state = NetworkState::Discovering;
        true
    }

    pub(crate) fn handle_scan_confirm(
        &mut self,
        status: Status,
        descriptors: heapless::Vec<PanDescriptor, MAX_PAN_DESCRIPTORS>,
    ) -> Option<NwkUpper<'p>> {
        if self.nib.state != NetworkState::Discovering {
            return None;
        }
        self.nib.state = NetworkState::Idle;

        let mut networks = heapless::Vec::new();
        for descriptor in &descriptors {
            let coordinator_address = match descriptor.coord_address {
                Address::Short(bytes) => u16::from_le_bytes(bytes),
                _ => continue,
            };

            let network = NetworkDescriptor {
                pan_id: descriptor.pan_id,
                channel: descriptor.channel,
                coordinator_address,
                pan_coordinator: descriptor.pan_coordinator,
                permit_joining: descriptor.association_permit,
                lqi: descriptor.lqi,
            };
            // The scan deduplicated; the list cannot overflow.
            let _ = networks.push(network);

            if !self.neighbors.insert(Neighbor {
                extended_address: None,
                short_address: coordinator_address,
                pan_id: descriptor.pan_id,
                channel: descriptor.channel,
                device_type: if descriptor.pan_coordinator {
                    DeviceType::Coordinator
                } else {
                    DeviceType::Router
                },
                relationship: Relationship::None,
                depth: depth_of(&self.nib.tree, coordinator_address)
                    .unwrap_or(self.nib.tree.max_depth),
                permit_joining: descriptor.association_permit,
                capability: CapabilityInformation::empty(),
                lqi: descriptor.lqi,
            }) {
                warn!("neighbor table full during discovery");
            }
        }

        Some(NwkUpper::NetworkDiscoveryConfirm { status, networks })
    }

    /// Join a discovered network through its best join-permitting node.
    ///
    /// Completion arrives as [`NwkUpper::JoinConfirm`].
    pub fn nlme_join_request(&mut self, pan_id: u16, as_router: bool) -> bool {
        if self.nib.state != NetworkState::Idle {
            return false;
        }

        let Some(parent) = self.neighbors.find_joinable(pan_id) else {
            return false;
        };
        let (parent_address, channel) = (parent.short_address, parent.channel);

        let mut capability = CapabilityInformation::ALLOCATE_ADDRESS;
        if as_router {
            capability |= CapabilityInformation::FULL_FUNCTION_DEVICE
                | CapabilityInformation::RX_ON_WHEN_IDLE
                | CapabilityInformation::MAINS_POWERED;
        }

        if !self.mac.mlme_associate_request(
            channel,
            pan_id,
            Address::short(parent_address),
            capability,
        ) {
            return false;
        }

        self.nib.state = NetworkState::Joining;
        self.nib.pan_id = pan_id;
        self.nib.channel = channel;
        self.pending_join = Some(PendingJoin {
            parent: parent_address,
        });
        true
    }

    pub(crate) fn handle_associate_confirm(
        &mut self,
        status: Status,
        short_address: u16,
    ) -> Option<NwkUpper<'p>> {
        if self.nib.state != NetworkState::Joining {
            return None;
        }
        let pending = self.pending_join.take()?;

        if status != Status::Success {
            self.nib.state = NetworkState::Idle;
            self.nib.pan_id = crate::mac::constants::BROADCAST_PAN_ID;
            return Some(NwkUpper::JoinConfirm {
                status,
                short_address: BROADCAST_SHORT_ADDRESS,
            });
        }

        let depth =
            depth_of(&self.nib.tree, short_address).unwrap_or(self.nib.tree.max_depth);

        self.nib.short_address = short_address;
        self.nib.depth = depth;
        self.nib.parent = pending.parent;
        self.nib.role = Role::Device;
        self.nib.state = NetworkState::Joined;
        self.nib.cskip = cskip(&self.nib.tree, depth);

        if let Some(parent) = self.neighbors.find_by_short_mut(pending.parent) {
            parent.relationship = Relationship::Parent;
        }

        info!("joined at depth {}", depth);
        Some(NwkUpper::JoinConfirm {
            status: Status::Success,
            short_address,
        })
    }

    /// Hand out a Cskip address from the requested pool. Counters are
    /// monotonic: a failed join never returns its address.
    pub(crate) fn allocate_child_address(&mut self, router: bool) -> Option<u16> {
        let tree = self.nib.tree;
        let skip = cskip(&tree, self.nib.depth);
        if skip == 0 {
            return None;
        }

        if router {
            if self.nib.routers_allocated >= tree.max_routers {
                return None;
            }
            let address = router_child_address(
                &tree,
                self.nib.short_address,
                self.nib.depth,
                self.nib.routers_allocated,
            );
            self.nib.routers_allocated += 1;
            Some(address)
        } else {
            if self.nib.end_devices_allocated >= tree.max_children - tree.max_routers {
                return None;
            }
            let address = end_device_child_address(
                &tree,
                self.nib.short_address,
                self.nib.depth,
                self.nib.end_devices_allocated,
            );
            self.nib.end_devices_allocated += 1;
            Some(address)
        }
    }

    pub(crate) fn handle_associate_indication(
        &mut self,
        device: [u8; 8],
        capability: CapabilityInformation,
    ) -> Option<NwkUpper<'p>> {
        if !self.nib.is_relay() {
            return None;
        }

        // Re-association: a known child keeps its address.
        let existing = self
            .neighbors
            .find_by_extended(device)
            .map(|n| n.short_address);

        let wants_router = capability.contains(CapabilityInformation::FULL_FUNCTION_DEVICE);
        let address = existing.or_else(|| self.allocate_child_address(wants_router));

        let Some(short_address) = address else {
            // Out of addresses for this pool: deny and stop advertising.
            self.mac
                .mlme_associate_response(device, BROADCAST_SHORT_ADDRESS, AssociationStatus::PanAtCapacity);
            self.mac.set_association_permit(false);
            warn!("join denied, address pool exhausted");
            return None;
        };

        let accepted = self.neighbors.insert(Neighbor {
            extended_address: Some(device),
            short_address,
            pan_id: self.nib.pan_id,
            channel: self.nib.channel,
            device_type: if wants_router {
                DeviceType::Router
            } else {
                DeviceType::EndDevice
            },
            relationship: Relationship::UnconfirmedChild,
            depth: self.nib.depth + 1,
            permit_joining: false,
            capability,
            lqi: 0,
        });
        if !accepted {
            self.mac
                .mlme_associate_response(device, BROADCAST_SHORT_ADDRESS, AssociationStatus::PanAtCapacity);
            self.mac.set_association_permit(false);
            warn!("join denied, neighbor table full");
            return None;
        }

        if !self
            .mac
            .mlme_associate_response(device, short_address, AssociationStatus::Successful)
        {
            self.neighbors.remove_by_extended(device);
            return None;
        }

        self.pending_child = Some(PendingChild {
            extended_address: device,
            short_address,
            capability,
        });
        None
    }

    /// The second half of a parent-side join: the MAC reported the fate of
    /// the Association Response.
    pub(crate) fn handle_comm_status(
        &mut self,
        status: Status,
        device: [u8; 8],
    ) -> Option<NwkUpper<'p>> {
        let pending = self.pending_child.take()?;
        if pending.extended_address != device {
            self.pending_child = Some(pending);
            return None;
        }

        if status != Status::Success {
            // The child never heard its address; forget it. The address
            // counter stays where it is.
            self.neighbors.remove_by_extended(device);
            warn!("association response undelivered");
            return None;
        }

        if let Some(child) = self.neighbors.find_by_short_mut(pending.short_address) {
            child.relationship = Relationship::Child;
        }

        Some(NwkUpper::JoinIndication {
            short_address: pending.short_address,
            extended_address: pending.extended_address,
            capability: pending.capability,
        })
    }

    /// Leave the network, or expel the child at `device`.
    ///
    /// Completion arrives as [`NwkUpper::LeaveConfirm`].
    pub fn nlme_leave_request(&mut self, device: Option<u16>) -> bool {
        match device {
            None => {
                if !matches!(self.nib.state, NetworkState::Joined | NetworkState::Started) {
                    return false;
                }
                if !self.mac.mlme_disassociate_request(
                    Address::short(self.nib.parent),
                    DisassociationReason::DeviceLeave,
                ) {
                    return false;
                }
                self.nib.state = NetworkState::Leaving;
                self.pending_leave = Some(PendingLeave::Own);
                true
            }
            Some(short_address) => {
                if !self.nib.is_relay() {
                    return false;
                }
                if self.neighbors.find_by_short(short_address).is_none() {
                    return false;
                }
                if !self.mac.mlme_disassociate_request(
                    Address::short(short_address),
                    DisassociationReason::CoordinatorLeave,
                ) {
                    return false;
                }
                self.pending_leave = Some(PendingLeave::Child(short_address));
                true
            }
        }
    }

    pub(crate) fn handle_disassociate_confirm(&mut self, status: Status) -> Option<NwkUpper<'p>> {
        match self.pending_leave.take()? {
            PendingLeave::Own => {
                let tree = self.nib.tree;
                self.nib = Nib::new(tree);
                self.nib.sequence_number = (self.mac.rng.next_u32() & 0xff) as u8;
                Some(NwkUpper::LeaveConfirm { status })
            }
            PendingLeave::Child(short_address) => {
                if status == Status::Success {
                    self.neighbors.remove_by_short(short_address);
                    // Room opened up again.
                    self.mac.set_association_permit(true);
                }
                Some(NwkUpper::LeaveConfirm { status })
            }
        }
    }

    pub(crate) fn handle_disassociate_indication(
        &mut self,
        device: Address,
    ) -> Option<NwkUpper<'p>> {
        if self.nib.is_relay() {
            // A child announced its leave.
            match device {
                Address::Short(bytes) => {
                    self.neighbors.remove_by_short(u16::from_le_bytes(bytes));
                }
                Address::Extended(bytes) => {
                    self.neighbors.remove_by_extended(bytes);
                }
                Address::Absent => {}
            }
            self.mac.set_association_permit(true);
            Some(NwkUpper::LeaveIndication { device })
        } else {
            // The parent expelled this node; the MAC already fell back to
            // idle.
            let tree = self.nib.tree;
            self.nib = Nib::new(tree);
            self.nib.sequence_number = (self.mac.rng.next_u32() & 0xff) as u8;
            Some(NwkUpper::LeaveIndication { device })
        }
    }

    /// Begin operating as a router after joining with router capability.
    /// Synchronous.
    pub fn nlme_start_router_request(&mut self) -> bool {
        if self.nib.state != NetworkState::Joined || self.nib.role != Role::Device {
            return false;
        }
        if self.nib.cskip == 0 {
            // At the maximum depth there is no address space to parent
            // children with.
            return false;
        }
        if self.mac.state() != MacState::Associated {
            return false;
        }
        // Take up coordinator duties on the joined PAN: answer beacon
        // requests, association requests and polls.
        self.mac.set_short_address(self.nib.short_address);
        if !self
            .mac
            .mlme_start_request(self.nib.pan_id, self.nib.channel)
        {
            return false;
        }

        self.nib.role = Role::Router;
        self.nib.state = NetworkState::Started;
        self.mac.set_rx_on_when_idle(true);

        info!("routing enabled");
        true
    }
}
