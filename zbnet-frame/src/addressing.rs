//! Addressing fields readers and writers.

use super::FrameControl;
use super::{Error, Result};

/// An IEEE 802.15.4 address.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Address {
    Absent,
    Short([u8; 2]),
    Extended([u8; 8]),
}

impl Address {
    /// The broadcast address.
    pub const BROADCAST: Address = Address::Short([0xff; 2]);

    /// Create a short address from its 16-bit value.
    pub const fn short(value: u16) -> Self {
        Address::Short(value.to_le_bytes())
    }

    /// Return the 16-bit value of a short address.
    pub fn as_short(&self) -> Option<u16> {
        match self {
            Address::Short(value) => Some(u16::from_le_bytes(*value)),
            _ => None,
        }
    }

    /// Query whether the address is an unicast address.
    pub fn is_unicast(&self) -> bool {
        !self.is_broadcast()
    }

    /// Query whether this address is the broadcast address.
    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }

    pub fn from_bytes(a: &[u8]) -> Self {
        if a.is_empty() {
            Address::Absent
        } else if a.len() == 2 {
            let mut b = [0u8; 2];
            b.copy_from_slice(a);
            Address::Short(b)
        } else if a.len() == 8 {
            let mut b = [0u8; 8];
            b.copy_from_slice(a);
            Address::Extended(b)
        } else {
            unreachable!()
        }
    }

    pub const fn as_bytes(&self) -> &[u8] {
        match self {
            Address::Absent => &[],
            Address::Short(value) => value,
            Address::Extended(value) => value,
        }
    }

    /// Return the length of the address in octets.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        match self {
            Address::Absent => 0,
            Address::Short(_) => 2,
            Address::Extended(_) => 8,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Address::Absent)
    }
}

impl From<Address> for AddressingMode {
    fn from(value: Address) -> Self {
        match value {
            Address::Absent => AddressingMode::Absent,
            Address::Short(_) => AddressingMode::Short,
            Address::Extended(_) => AddressingMode::Extended,
        }
    }
}

impl core::fmt::Display for Address {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Address::Absent => write!(f, "absent"),
            Address::Short(value) => write!(f, "{:02x}:{:02x}", value[0], value[1]),
            Address::Extended(value) => write!(
                f,
                "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
                value[0], value[1], value[2], value[3], value[4], value[5], value[6], value[7]
            ),
        }
    }
}

/// IEEE 802.15.4 addressing mode.
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum AddressingMode {
    Absent = 0b00,
    Short = 0b10,
    Extended = 0b11,
    Unknown,
}

impl AddressingMode {
    /// Return the size of the address in octets.
    pub fn size(&self) -> usize {
        match self {
            Self::Absent => 0,
            Self::Short => 2,
            Self::Extended => 8,
            Self::Unknown => 0,
        }
    }
}

impl From<u8> for AddressingMode {
    fn from(value: u8) -> Self {
        match value {
            0b00 => Self::Absent,
            0b10 => Self::Short,
            0b11 => Self::Extended,
            _ => Self::Unknown,
        }
    }
}

/// A reader/writer for the IEEE 802.15.4 Addressing Fields.
///
/// In the 2003 frame format the layout is fixed by the frame control field
/// alone: a destination PAN identifier and address when the destination mode
/// is not absent, followed by a source PAN identifier (omitted when the
/// intra-PAN bit is set and a destination is present) and source address.
pub struct AddressingFields<T: AsRef<[u8]>> {
    buffer: T,
}

impl<T: AsRef<[u8]>> AddressingFields<T> {
    /// Create a new [`AddressingFields`] reader/writer from a given buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is too short to contain the addressing
    /// fields described by the frame control field.
    pub fn new<FC: AsRef<[u8]>>(buffer: T, fc: &FrameControl<FC>) -> Result<Self> {
        let af = Self::new_unchecked(buffer);

        if !af.check_len(fc) {
            return Err(Error);
        }

        Ok(af)
    }

    /// Check if the buffer is large enough to contain the addressing fields.
    fn check_len<FC: AsRef<[u8]>>(&self, fc: &FrameControl<FC>) -> bool {
        let Some(expected) = Self::length(fc) else {
            return false;
        };

        self.buffer.as_ref().len() >= expected
    }

    /// Create a new [`AddressingFields`] reader/writer from a given buffer
    /// without checking the length.
    pub fn new_unchecked(buffer: T) -> Self {
        Self { buffer }
    }

    /// Return the length in octets of the addressing fields described by a
    /// frame control field, or `None` for an unknown addressing mode.
    pub fn length<FC: AsRef<[u8]>>(fc: &FrameControl<FC>) -> Option<usize> {
        let dst = fc.dst_addressing_mode();
        let src = fc.src_addressing_mode();

        if dst == AddressingMode::Unknown || src == AddressingMode::Unknown {
            return None;
        }

        let mut len = 0;

        if dst != AddressingMode::Absent {
            len += 2 + dst.size();
        }

        if src != AddressingMode::Absent {
            if !(fc.intra_pan() && dst != AddressingMode::Absent) {
                len += 2;
            }
            len += src.size();
        }

        Some(len)
    }

    /// Return the destination PAN identifier, if present.
    pub fn dst_pan_id<FC: AsRef<[u8]>>(&self, fc: &FrameControl<FC>) -> Option<u16> {
        if fc.dst_addressing_mode() == AddressingMode::Absent {
            return None;
        }

        let b = self.buffer.as_ref();
        Some(u16::from_le_bytes([b[0], b[1]]))
    }

    /// Return the destination [`Address`].
    pub fn dst_address<FC: AsRef<[u8]>>(&self, fc: &FrameControl<FC>) -> Address {
        let mode = fc.dst_addressing_mode();

        if mode == AddressingMode::Absent {
            return Address::Absent;
        }

        Address::from_bytes(&self.buffer.as_ref()[2..2 + mode.size()])
    }

    /// Return the source PAN identifier, if present.
    ///
    /// For intra-PAN frames the source PAN identifier is the destination PAN
    /// identifier.
    pub fn src_pan_id<FC: AsRef<[u8]>>(&self, fc: &FrameControl<FC>) -> Option<u16> {
        if fc.src_addressing_mode() == AddressingMode::Absent {
            return None;
        }

        let dst = fc.dst_addressing_mode();

        if fc.intra_pan() && dst != AddressingMode::Absent {
            return self.dst_pan_id(fc);
        }

        let offset = if dst != AddressingMode::Absent {
            2 + dst.size()
        } else {
            0
        };

        let b = self.buffer.as_ref();
        Some(u16::from_le_bytes([b[offset], b[offset + 1]]))
    }

    /// Return the source [`Address`].
    pub fn src_address<FC: AsRef<[u8]>>(&self, fc: &FrameControl<FC>) -> Address {
        let mode = fc.src_addressing_mode();

        if mode == AddressingMode::Absent {
            return Address::Absent;
        }

        let dst = fc.dst_addressing_mode();
        let mut offset = if dst != AddressingMode::Absent {
            2 + dst.size()
        } else {
            0
        };

        if !(fc.intra_pan() && dst != AddressingMode::Absent) {
            offset += 2;
        }

        Address::from_bytes(&self.buffer.as_ref()[offset..offset + mode.size()])
    }
}
