//! Superframe Specification readers and writers for beacon frames.

use super::{Error, Result};

/// A reader/writer for the Superframe Specification field of a beacon frame.
pub struct SuperframeSpecification<T: AsRef<[u8]>> {
    buffer: T,
}

impl<T: AsRef<[u8]>> SuperframeSpecification<T> {
    /// Create a new [`SuperframeSpecification`] reader/writer from a given
    /// buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is too short.
    pub fn new(buffer: T) -> Result<Self> {
        let spec = Self::new_unchecked(buffer);

        if !spec.check_len() {
            return Err(Error);
        }

        Ok(spec)
    }

    /// Returns `false` if the buffer is too short to contain the field.
    fn check_len(&self) -> bool {
        self.buffer.as_ref().len() >= 2
    }

    /// Create a new [`SuperframeSpecification`] reader/writer from a given
    /// buffer without length checking.
    pub fn new_unchecked(buffer: T) -> Self {
        Self { buffer }
    }

    fn bits(&self) -> u16 {
        let b = &self.buffer.as_ref()[..2];
        u16::from_le_bytes([b[0], b[1]])
    }

    /// Return the beacon order field (15 on a beaconless PAN).
    pub fn beacon_order(&self) -> u8 {
        (self.bits() & 0b1111) as u8
    }

    /// Return the superframe order field.
    pub fn superframe_order(&self) -> u8 {
        ((self.bits() >> 4) & 0b1111) as u8
    }

    /// Return the final CAP slot field.
    pub fn final_cap_slot(&self) -> u8 {
        ((self.bits() >> 8) & 0b1111) as u8
    }

    /// Returns `true` when the battery life extension field is set.
    pub fn battery_life_extension(&self) -> bool {
        ((self.bits() >> 12) & 0b1) == 1
    }

    /// Returns `true` when the beacon was sent by the PAN coordinator.
    pub fn pan_coordinator(&self) -> bool {
        ((self.bits() >> 14) & 0b1) == 1
    }

    /// Returns `true` when the coordinator is currently accepting
    /// association requests.
    pub fn association_permit(&self) -> bool {
        ((self.bits() >> 15) & 0b1) == 1
    }
}

/// A high-level representation of the beacon frame payload: the superframe
/// specification followed by (empty) GTS and pending-address fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeaconRepr {
    /// The beacon order. 15 means no periodic beacons are transmitted.
    pub beacon_order: u8,
    /// The superframe order.
    pub superframe_order: u8,
    /// The final CAP slot.
    pub final_cap_slot: u8,
    /// The battery life extension flag.
    pub battery_life_extension: bool,
    /// Whether the beacon originates from the PAN coordinator.
    pub pan_coordinator: bool,
    /// Whether the coordinator is accepting association requests.
    pub association_permit: bool,
}

impl BeaconRepr {
    /// The beacon content emitted on a beaconless PAN: GTS and pending
    /// address fields are always empty.
    const GTS_NONE: u8 = 0x00;
    const PENDING_NONE: u8 = 0x00;

    /// Parse the content of a beacon frame.
    pub fn parse(content: &[u8]) -> Result<Self> {
        if content.len() < 4 {
            return Err(Error);
        }

        let spec = SuperframeSpecification::new(content)?;

        Ok(Self {
            beacon_order: spec.beacon_order(),
            superframe_order: spec.superframe_order(),
            final_cap_slot: spec.final_cap_slot(),
            battery_life_extension: spec.battery_life_extension(),
            pan_coordinator: spec.pan_coordinator(),
            association_permit: spec.association_permit(),
        })
    }

    /// Return the length of the beacon content when emitted.
    pub fn buffer_len(&self) -> usize {
        4
    }

    /// Emit the beacon content into a buffer.
    pub fn emit(&self, buffer: &mut [u8]) {
        let bits = (self.beacon_order as u16 & 0b1111)
            | ((self.superframe_order as u16 & 0b1111) << 4)
            | ((self.final_cap_slot as u16 & 0b1111) << 8)
            | ((self.battery_life_extension as u16) << 12)
            | ((self.pan_coordinator as u16) << 14)
            | ((self.association_permit as u16) << 15);

        buffer[..2].copy_from_slice(&bits.to_le_bytes());
        buffer[2] = Self::GTS_NONE;
        buffer[3] = Self::PENDING_NONE;
    }
}
