use crate::mac::constants::{BROADCAST_PAN_ID, BROADCAST_SHORT_ADDRESS};

/// The role a node plays in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Role {
    Unknown,
    /// An end device: leaf of the tree, never relays.
    Device,
    /// A router: relays frames and parents children.
    Router,
    /// The coordinator: root of the tree, address 0x0000.
    Coordinator,
}

/// The lifecycle state of the network layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NetworkState {
    Idle,
    /// A network discovery scan is running.
    Discovering,
    /// An association with the selected parent is in progress.
    Joining,
    /// Joined as an end device.
    Joined,
    /// Formed a new network as the coordinator.
    Formed,
    /// Operating as a router.
    Started,
    /// A self-initiated leave is in progress.
    Leaving,
}

/// The Cskip tree parameters, fixed for the whole network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TreeConfig {
    /// The maximum number of children per router (Cm).
    pub max_children: u8,
    /// The maximum number of router children per router (Rm).
    pub max_routers: u8,
    /// The maximum depth of the tree (Lm).
    pub max_depth: u8,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_children: 20,
            max_routers: 6,
            max_depth: 5,
        }
    }
}

/// Network Information Base (NIB) maintained by the NWK layer.
pub struct Nib {
    /// The sequence number for the next outgoing NWK frame.
    pub(crate) sequence_number: u8,
    /// The short address of this node, assigned at join or formation.
    pub(crate) short_address: u16,
    /// The depth of this node in the tree.
    pub(crate) depth: u8,
    /// The short address of the parent.
    pub(crate) parent: u16,
    pub(crate) role: Role,
    pub(crate) state: NetworkState,
    pub(crate) tree: TreeConfig,
    /// The address block stride for children at this node's depth.
    pub(crate) cskip: u16,
    /// The number of router children allocated so far. Monotonic: a failed
    /// join never returns its address block.
    pub(crate) routers_allocated: u8,
    /// The number of end-device children allocated so far. Monotonic.
    pub(crate) end_devices_allocated: u8,
    pub(crate) pan_id: u16,
    pub(crate) channel: u8,
}

impl Nib {
    pub(crate) fn new(tree: TreeConfig) -> Self {
        Self {
            sequence_number: 0,
            short_address: BROADCAST_SHORT_ADDRESS,
            depth: 0,
            parent: BROADCAST_SHORT_ADDRESS,
            role: Role::Unknown,
            state: NetworkState::Idle,
            tree,
            cskip: 0,
            routers_allocated: 0,
            end_devices_allocated: 0,
            pan_id: BROADCAST_PAN_ID,
            channel: 0,
        }
    }

    pub(crate) fn next_sequence_number(&mut self) -> u8 {
        let sequence_number = self.sequence_number;
        self.sequence_number = self.sequence_number.wrapping_add(1);
        sequence_number
    }

    /// Whether this node relays frames for others.
    pub(crate) fn is_relay(&self) -> bool {
        matches!(self.role, Role::Router | Role::Coordinator)
    }
}
