//! IEEE 802.15.4 (2003) Frame Control field readers and writers.

use super::AddressingMode;
use super::{Error, Result};

/// IEEE 802.15.4 frame type.
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum FrameType {
    Beacon = 0b000,
    Data = 0b001,
    Ack = 0b010,
    MacCommand = 0b011,
    Unknown,
}

impl From<u8> for FrameType {
    fn from(value: u8) -> Self {
        match value {
            0b000 => Self::Beacon,
            0b001 => Self::Data,
            0b010 => Self::Ack,
            0b011 => Self::MacCommand,
            _ => Self::Unknown,
        }
    }
}

/// A reader/writer for the IEEE 802.15.4 Frame Control field.
///
/// The dongle speaks the 2003 frame format: three type bits, the
/// security/pending/ack-request/intra-PAN flags, and two addressing-mode
/// fields. The version bits of later amendments are reserved here.
pub struct FrameControl<T: AsRef<[u8]>> {
    buffer: T,
}

impl<T: AsRef<[u8]>> FrameControl<T> {
    /// Create a new [`FrameControl`] reader/writer from a given buffer.
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

    /// Returns `false` if the buffer is too short to contain the Frame Control field.
    fn check_len(&self) -> bool {
        self.buffer.as_ref().len() >= 2
    }

    /// Create a new [`FrameControl`] reader/writer from a given buffer without length checking.
    pub fn new_unchecked(buffer: T) -> Self {
        Self { buffer }
    }

    fn bits(&self) -> u16 {
        let b = &self.buffer.as_ref()[..2];
        u16::from_le_bytes([b[0], b[1]])
    }

    /// Return the [`FrameType`] field.
    pub fn frame_type(&self) -> FrameType {
        FrameType::from((self.bits() & 0b111) as u8)
    }

    /// Returns `true` when the security enabled field is set.
    pub fn security_enabled(&self) -> bool {
        ((self.bits() >> 3) & 0b1) == 1
    }

    /// Returns `true` when the frame pending field is set.
    pub fn frame_pending(&self) -> bool {
        ((self.bits() >> 4) & 0b1) == 1
    }

    /// Returns `true` when the acknowledgment request field is set.
    pub fn ack_request(&self) -> bool {
        ((self.bits() >> 5) & 0b1) == 1
    }

    /// Returns `true` when the intra-PAN field is set.
    ///
    /// When set, the source PAN identifier is omitted from the addressing
    /// fields and is the same as the destination PAN identifier.
    pub fn intra_pan(&self) -> bool {
        ((self.bits() >> 6) & 0b1) == 1
    }

    /// Return the destination [`AddressingMode`].
    pub fn dst_addressing_mode(&self) -> AddressingMode {
        AddressingMode::from(((self.bits() >> 10) & 0b11) as u8)
    }

    /// Return the source [`AddressingMode`].
    pub fn src_addressing_mode(&self) -> AddressingMode {
        AddressingMode::from(((self.bits() >> 14) & 0b11) as u8)
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> FrameControl<T> {
    fn set_bits(&mut self, bits: u16) {
        self.buffer.as_mut()[..2].copy_from_slice(&bits.to_le_bytes());
    }

    fn set_field(&mut self, shift: u16, mask: u16, value: u16) {
        let bits = (self.bits() & !(mask << shift)) | ((value & mask) << shift);
        self.set_bits(bits);
    }

    /// Set the frame type field.
    pub fn set_frame_type(&mut self, frame_type: FrameType) {
        self.set_field(0, 0b111, frame_type as u16);
    }

    /// Set the security enabled field.
    pub fn set_security_enabled(&mut self, security: bool) {
        self.set_field(3, 0b1, security as u16);
    }

    /// Set the frame pending field.
    pub fn set_frame_pending(&mut self, pending: bool) {
        self.set_field(4, 0b1, pending as u16);
    }

    /// Set the acknowledgment request field.
    pub fn set_ack_request(&mut self, ack_request: bool) {
        self.set_field(5, 0b1, ack_request as u16);
    }

    /// Set the intra-PAN field.
    pub fn set_intra_pan(&mut self, intra_pan: bool) {
        self.set_field(6, 0b1, intra_pan as u16);
    }

    /// Set the destination addressing mode field.
    pub fn set_dst_addressing_mode(&mut self, mode: AddressingMode) {
        self.set_field(10, 0b11, mode as u16);
    }

    /// Set the source addressing mode field.
    pub fn set_src_addressing_mode(&mut self, mode: AddressingMode) {
        self.set_field(14, 0b11, mode as u16);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_control_fields() {
        // Data frame, ack request, intra-PAN, short dst, short src.
        let fc = FrameControl::new(&[0x61, 0x88][..]).unwrap();
        assert_eq!(fc.frame_type(), FrameType::Data);
        assert!(!fc.security_enabled());
        assert!(!fc.frame_pending());
        assert!(fc.ack_request());
        assert!(fc.intra_pan());
        assert_eq!(fc.dst_addressing_mode(), AddressingMode::Short);
        assert_eq!(fc.src_addressing_mode(), AddressingMode::Short);
    }

    #[test]
    fn frame_control_roundtrip() {
        let mut buffer = [0u8; 2];
        let mut fc = FrameControl::new_unchecked(&mut buffer[..]);
        fc.set_frame_type(FrameType::MacCommand);
        fc.set_ack_request(true);
        fc.set_dst_addressing_mode(AddressingMode::Extended);
        fc.set_src_addressing_mode(AddressingMode::Short);
        assert_eq!(buffer, [0x23, 0x8c]);
    }

    #[test]
    fn too_short() {
        assert!(FrameControl::new(&[0x61][..]).is_err());
    }
}
