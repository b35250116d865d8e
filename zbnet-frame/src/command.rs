//! MAC command identifiers and command payload representations.

use bitflags::bitflags;

use super::{Error, Result};

/// IEEE 802.15.4 MAC command frame identifier.
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum CommandId {
    AssociationRequest = 0x01,
    AssociationResponse = 0x02,
    DisassociationNotification = 0x03,
    DataRequest = 0x04,
    PanIdConflictNotification = 0x05,
    OrphanNotification = 0x06,
    BeaconRequest = 0x07,
    CoordinatorRealignment = 0x08,
    Unknown,
}

impl From<u8> for CommandId {
    fn from(value: u8) -> Self {
        match value {
            0x01 => Self::AssociationRequest,
            0x02 => Self::AssociationResponse,
            0x03 => Self::DisassociationNotification,
            0x04 => Self::DataRequest,
            0x05 => Self::PanIdConflictNotification,
            0x06 => Self::OrphanNotification,
            0x07 => Self::BeaconRequest,
            0x08 => Self::CoordinatorRealignment,
            _ => Self::Unknown,
        }
    }
}

bitflags! {
    /// The capability information field of an Association Request.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CapabilityInformation: u8 {
        /// The device is capable of acting as an alternate PAN coordinator.
        const ALTERNATE_PAN_COORDINATOR = 0b0000_0001;
        /// The device is a full-function device.
        const FULL_FUNCTION_DEVICE = 0b0000_0010;
        /// The device is mains powered.
        const MAINS_POWERED = 0b0000_0100;
        /// The receiver stays enabled while the device is idle.
        const RX_ON_WHEN_IDLE = 0b0000_1000;
        /// The device supports secured frames.
        const SECURITY_CAPABLE = 0b0100_0000;
        /// The device requests a short address from the coordinator.
        const ALLOCATE_ADDRESS = 0b1000_0000;
    }
}

/// The status field of an Association Response.
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum AssociationStatus {
    Successful = 0x00,
    PanAtCapacity = 0x01,
    PanAccessDenied = 0x02,
    Unknown,
}

impl From<u8> for AssociationStatus {
    fn from(value: u8) -> Self {
        match value {
            0x00 => Self::Successful,
            0x01 => Self::PanAtCapacity,
            0x02 => Self::PanAccessDenied,
            _ => Self::Unknown,
        }
    }
}

/// The reason field of a Disassociation Notification.
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum DisassociationReason {
    /// The coordinator wishes the device to leave the PAN.
    CoordinatorLeave = 0x01,
    /// The device wishes to leave the PAN.
    DeviceLeave = 0x02,
    Unknown,
}

impl From<u8> for DisassociationReason {
    fn from(value: u8) -> Self {
        match value {
            0x01 => Self::CoordinatorLeave,
            0x02 => Self::DeviceLeave,
            _ => Self::Unknown,
        }
    }
}

/// A high-level representation of a MAC command frame content: the command
/// identifier and its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacCommandRepr {
    AssociationRequest {
        capability: CapabilityInformation,
    },
    AssociationResponse {
        short_address: u16,
        status: AssociationStatus,
    },
    DisassociationNotification {
        reason: DisassociationReason,
    },
    DataRequest,
    PanIdConflictNotification,
    OrphanNotification,
    BeaconRequest,
    CoordinatorRealignment {
        pan_id: u16,
        coord_short_address: u16,
        channel: u8,
        short_address: u16,
    },
}

impl MacCommandRepr {
    /// Return the [`CommandId`] of the command.
    pub fn command_id(&self) -> CommandId {
        match self {
            Self::AssociationRequest { .. } => CommandId::AssociationRequest,
            Self::AssociationResponse { .. } => CommandId::AssociationResponse,
            Self::DisassociationNotification { .. } => CommandId::DisassociationNotification,
            Self::DataRequest => CommandId::DataRequest,
            Self::PanIdConflictNotification => CommandId::PanIdConflictNotification,
            Self::OrphanNotification => CommandId::OrphanNotification,
            Self::BeaconRequest => CommandId::BeaconRequest,
            Self::CoordinatorRealignment { .. } => CommandId::CoordinatorRealignment,
        }
    }

    /// Parse a MAC command payload.
    pub fn parse(id: CommandId, payload: &[u8]) -> Result<Self> {
        match id {
            CommandId::AssociationRequest => {
                if payload.is_empty() {
                    return Err(Error);
                }
                Ok(Self::AssociationRequest {
                    capability: CapabilityInformation::from_bits_truncate(payload[0]),
                })
            }
            CommandId::AssociationResponse => {
                if payload.len() < 3 {
                    return Err(Error);
                }
                Ok(Self::AssociationResponse {
                    short_address: u16::from_le_bytes([payload[0], payload[1]]),
                    status: AssociationStatus::from(payload[2]),
                })
            }
            CommandId::DisassociationNotification => {
                if payload.is_empty() {
                    return Err(Error);
                }
                Ok(Self::DisassociationNotification {
                    reason: DisassociationReason::from(payload[0]),
                })
            }
            CommandId::DataRequest => Ok(Self::DataRequest),
            CommandId::PanIdConflictNotification => Ok(Self::PanIdConflictNotification),
            CommandId::OrphanNotification => Ok(Self::OrphanNotification),
            CommandId::BeaconRequest => Ok(Self::BeaconRequest),
            CommandId::CoordinatorRealignment => {
                if payload.len() < 7 {
                    return Err(Error);
                }
                Ok(Self::CoordinatorRealignment {
                    pan_id: u16::from_le_bytes([payload[0], payload[1]]),
                    coord_short_address: u16::from_le_bytes([payload[2], payload[3]]),
                    channel: payload[4],
                    short_address: u16::from_le_bytes([payload[5], payload[6]]),
                })
            }
            CommandId::Unknown => Err(Error),
        }
    }

    /// Return the length of the command payload, excluding the command
    /// identifier.
    pub fn buffer_len(&self) -> usize {
        match self {
            Self::AssociationRequest { .. } => 1,
            Self::AssociationResponse { .. } => 3,
            Self::DisassociationNotification { .. } => 1,
            Self::DataRequest
            | Self::PanIdConflictNotification
            | Self::OrphanNotification
            | Self::BeaconRequest => 0,
            Self::CoordinatorRealignment { .. } => 7,
        }
    }

    /// Emit the command payload into a buffer.
    pub fn emit(&self, buffer: &mut [u8]) {
        match self {
            Self::AssociationRequest { capability } => buffer[0] = capability.bits(),
            Self::AssociationResponse {
                short_address,
                status,
            } => {
                buffer[..2].copy_from_slice(&short_address.to_le_bytes());
                buffer[2] = *status as u8;
            }
            Self::DisassociationNotification { reason } => buffer[0] = *reason as u8,
            Self::DataRequest
            | Self::PanIdConflictNotification
            | Self::OrphanNotification
            | Self::BeaconRequest => {}
            Self::CoordinatorRealignment {
                pan_id,
                coord_short_address,
                channel,
                short_address,
            } => {
                buffer[..2].copy_from_slice(&pan_id.to_le_bytes());
                buffer[2..4].copy_from_slice(&coord_short_address.to_le_bytes());
                buffer[4] = *channel;
                buffer[5..7].copy_from_slice(&short_address.to_le_bytes());
            }
        }
    }
}
