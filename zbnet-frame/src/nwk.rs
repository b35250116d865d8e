//! ZigBee NWK frame readers and writers.
//!
//! The NWK header is carried as the payload of a MAC data frame:
//! a two-byte frame control field, the destination and source short
//! addresses, a radius, and a sequence number.

use super::{Error, Result};

/// The length of the NWK frame header in octets.
pub const HEADER_LEN: usize = 8;

/// The protocol version emitted in every NWK frame control field.
pub const PROTOCOL_VERSION: u8 = 2;

/// The NWK broadcast address.
pub const BROADCAST_ADDRESS: u16 = 0xffff;

/// ZigBee NWK frame type.
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum NwkFrameType {
    Data = 0b00,
    Command = 0b01,
    Unknown,
}

impl From<u8> for NwkFrameType {
    fn from(value: u8) -> Self {
        match value {
            0b00 => Self::Data,
            0b01 => Self::Command,
            _ => Self::Unknown,
        }
    }
}

/// The route discovery field of the NWK frame control field.
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum DiscoverRoute {
    Suppress = 0b00,
    Enable = 0b01,
    Force = 0b10,
    Unknown,
}

impl From<u8> for DiscoverRoute {
    fn from(value: u8) -> Self {
        match value {
            0b00 => Self::Suppress,
            0b01 => Self::Enable,
            0b10 => Self::Force,
            _ => Self::Unknown,
        }
    }
}

/// A reader/writer for the ZigBee NWK Frame Control field.
pub struct NwkFrameControl<T: AsRef<[u8]>> {
    buffer: T,
}

impl<T: AsRef<[u8]>> NwkFrameControl<T> {
    /// Create a new [`NwkFrameControl`] reader/writer from a given buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is too short.
    pub fn new(buffer: T) -> Result<Self> {
        let fc = Self::new_unchecked(buffer);

        if !fc.check_len() {
            return Err(Error);
        }

        Ok(fc)
    }

    fn check_len(&self) -> bool {
        self.buffer.as_ref().len() >= 2
    }

    /// Create a new [`NwkFrameControl`] reader/writer from a given buffer
    /// without length checking.
    pub fn new_unchecked(buffer: T) -> Self {
        Self { buffer }
    }

    fn bits(&self) -> u16 {
        let b = &self.buffer.as_ref()[..2];
        u16::from_le_bytes([b[0], b[1]])
    }

    /// Return the [`NwkFrameType`] field.
    pub fn frame_type(&self) -> NwkFrameType {
        NwkFrameType::from((self.bits() & 0b11) as u8)
    }

    /// Return the protocol version field.
    pub fn protocol_version(&self) -> u8 {
        ((self.bits() >> 2) & 0b1111) as u8
    }

    /// Return the [`DiscoverRoute`] field.
    pub fn discover_route(&self) -> DiscoverRoute {
        DiscoverRoute::from(((self.bits() >> 6) & 0b11) as u8)
    }

    /// Returns `true` when the multicast flag is set.
    pub fn multicast(&self) -> bool {
        ((self.bits() >> 8) & 0b1) == 1
    }

    /// Returns `true` when the security field is set.
    pub fn security_enabled(&self) -> bool {
        ((self.bits() >> 9) & 0b1) == 1
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> NwkFrameControl<T> {
    fn set_bits(&mut self, bits: u16) {
        self.buffer.as_mut()[..2].copy_from_slice(&bits.to_le_bytes());
    }

    fn set_field(&mut self, shift: u16, mask: u16, value: u16) {
        let bits = (self.bits() & !(mask << shift)) | ((value & mask) << shift);
        self.set_bits(bits);
    }

    /// Set the frame type field.
    pub fn set_frame_type(&mut self, frame_type: NwkFrameType) {
        self.set_field(0, 0b11, frame_type as u16);
    }

    /// Set the protocol version field.
    pub fn set_protocol_version(&mut self, version: u8) {
        self.set_field(2, 0b1111, version as u16);
    }

    /// Set the discover route field.
    pub fn set_discover_route(&mut self, discover_route: DiscoverRoute) {
        self.set_field(6, 0b11, discover_route as u16);
    }

    /// Set the multicast flag.
    pub fn set_multicast(&mut self, multicast: bool) {
        self.set_field(8, 0b1, multicast as u16);
    }

    /// Set the security field.
    pub fn set_security_enabled(&mut self, security: bool) {
        self.set_field(9, 0b1, security as u16);
    }
}

/// A reader/writer for a ZigBee NWK frame.
pub struct NwkFrame<T: AsRef<[u8]>> {
    buffer: T,
}

impl<T: AsRef<[u8]>> NwkFrame<T> {
    /// Create a new [`NwkFrame`] reader/writer from a given buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is too short to contain the NWK
    /// header.
    pub fn new(buffer: T) -> Result<Self> {
        let frame = Self::new_unchecked(buffer);

        if !frame.check_len() {
            return Err(Error);
        }

        Ok(frame)
    }

    fn check_len(&self) -> bool {
        self.buffer.as_ref().len() >= HEADER_LEN
    }

    /// Create a new [`NwkFrame`] reader/writer from a given buffer without
    /// length checking.
    pub fn new_unchecked(buffer: T) -> Self {
        Self { buffer }
    }

    /// Return a [`NwkFrameControl`] reader.
    pub fn frame_control(&self) -> NwkFrameControl<&'_ [u8]> {
        NwkFrameControl::new_unchecked(&self.buffer.as_ref()[..2])
    }

    /// Return the destination short address.
    pub fn dst_address(&self) -> u16 {
        let b = &self.buffer.as_ref()[2..4];
        u16::from_le_bytes([b[0], b[1]])
    }

    /// Return the source short address.
    pub fn src_address(&self) -> u16 {
        let b = &self.buffer.as_ref()[4..6];
        u16::from_le_bytes([b[0], b[1]])
    }

    /// Return the radius field.
    pub fn radius(&self) -> u8 {
        self.buffer.as_ref()[6]
    }

    /// Return the sequence number.
    pub fn sequence_number(&self) -> u8 {
        self.buffer.as_ref()[7]
    }

}

impl<'f, T: AsRef<[u8]> + ?Sized> NwkFrame<&'f T> {
    /// Return the payload of the frame, borrowed from the underlying buffer.
    pub fn payload(&self) -> &'f [u8] {
        &self.buffer.as_ref()[HEADER_LEN..]
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> NwkFrame<T> {
    /// Return a mutable [`NwkFrameControl`] writer.
    pub fn frame_control_mut(&mut self) -> NwkFrameControl<&'_ mut [u8]> {
        NwkFrameControl::new_unchecked(&mut self.buffer.as_mut()[..2])
    }

    /// Set the destination short address.
    pub fn set_dst_address(&mut self, address: u16) {
        self.buffer.as_mut()[2..4].copy_from_slice(&address.to_le_bytes());
    }

    /// Set the source short address.
    pub fn set_src_address(&mut self, address: u16) {
        self.buffer.as_mut()[4..6].copy_from_slice(&address.to_le_bytes());
    }

    /// Set the radius field.
    pub fn set_radius(&mut self, radius: u8) {
        self.buffer.as_mut()[6] = radius;
    }

    /// Set the sequence number.
    pub fn set_sequence_number(&mut self, sequence_number: u8) {
        self.buffer.as_mut()[7] = sequence_number;
    }

    /// Return the mutable payload of the frame.
    pub fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.buffer.as_mut()[HEADER_LEN..]
    }
}

/// A high-level representation of a ZigBee NWK frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NwkFrameRepr<'p> {
    /// The frame type.
    pub frame_type: NwkFrameType,
    /// The discover route field.
    pub discover_route: DiscoverRoute,
    /// The security flag.
    pub security_enabled: bool,
    /// The destination short address.
    pub dst_address: u16,
    /// The source short address.
    pub src_address: u16,
    /// The radius.
    pub radius: u8,
    /// The sequence number.
    pub sequence_number: u8,
    /// The payload.
    pub payload: &'p [u8],
}

impl<'f> NwkFrameRepr<'f> {
    /// Parse a ZigBee NWK frame.
    pub fn parse(reader: &NwkFrame<&'f [u8]>) -> Result<Self> {
        let fc = reader.frame_control();

        let frame_type = fc.frame_type();
        if frame_type == NwkFrameType::Unknown || fc.protocol_version() != PROTOCOL_VERSION {
            return Err(Error);
        }

        Ok(Self {
            frame_type,
            discover_route: fc.discover_route(),
            security_enabled: fc.security_enabled(),
            dst_address: reader.dst_address(),
            src_address: reader.src_address(),
            radius: reader.radius(),
            sequence_number: reader.sequence_number(),
            payload: reader.payload(),
        })
    }

    /// Return the length of the frame when emitted into a buffer.
    pub fn buffer_len(&self) -> usize {
        HEADER_LEN + self.payload.len()
    }

    /// Emit the frame into a writer.
    ///
    /// The writer's buffer must be exactly [`buffer_len`] bytes long.
    ///
    /// [`buffer_len`]: NwkFrameRepr::buffer_len
    pub fn emit(&self, frame: &mut NwkFrame<&'_ mut [u8]>) {
        {
            let mut fc = frame.frame_control_mut();
            fc.set_bits(0);
            fc.set_frame_type(self.frame_type);
            fc.set_protocol_version(PROTOCOL_VERSION);
            fc.set_discover_route(self.discover_route);
            fc.set_multicast(false);
            fc.set_security_enabled(self.security_enabled);
        }
        frame.set_dst_address(self.dst_address);
        frame.set_src_address(self.src_address);
        frame.set_radius(self.radius);
        frame.set_sequence_number(self.sequence_number);
        frame.payload_mut().copy_from_slice(self.payload);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nwk_frame_roundtrip() {
        let repr = NwkFrameRepr {
            frame_type: NwkFrameType::Data,
            discover_route: DiscoverRoute::Suppress,
            security_enabled: false,
            dst_address: 0x0000,
            src_address: 0x0015,
            radius: 5,
            sequence_number: 0x42,
            payload: &[0xaa, 0xbb],
        };

        let mut buffer = [0u8; 10];
        repr.emit(&mut NwkFrame::new_unchecked(&mut buffer[..]));
        assert_eq!(
            buffer,
            [0x08, 0x00, 0x00, 0x00, 0x15, 0x00, 0x05, 0x42, 0xaa, 0xbb]
        );

        let frame = NwkFrame::new(&buffer[..]).unwrap();
        assert_eq!(NwkFrameRepr::parse(&frame).unwrap(), repr);
    }

    #[test]
    fn wrong_protocol_version_rejected() {
        // Version 3 in bits 2..6.
        let buffer = [0x0c, 0x00, 0x00, 0x00, 0x15, 0x00, 0x05, 0x42];
        let frame = NwkFrame::new(&buffer[..]).unwrap();
        assert!(NwkFrameRepr::parse(&frame).is_err());
    }

    #[test]
    fn truncated_header_rejected() {
        assert!(NwkFrame::new(&[0x08, 0x00, 0x00][..]).is_err());
    }
}
