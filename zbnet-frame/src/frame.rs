//! High-level readers/writers for whole IEEE 802.15.4 frames.

use super::{AddressingFields, CommandId, Error, FrameControl, FrameType, Result};

/// A reader/writer for an IEEE 802.15.4 frame with a Frame Check Sequence
/// (FCS).
///
/// On the dongle the FCS is computed and checked by the radio hardware; this
/// wrapper exists for host-side tooling that sees the full frame on the wire.
pub struct FrameWithFcs<T: AsRef<[u8]>> {
    buffer: T,
}

impl<T: AsRef<[u8]>> FrameWithFcs<T> {
    /// Create a new [`FrameWithFcs`] from a given buffer, checking the FCS.
    pub fn new(buffer: T) -> Result<Self> {
        let frame = Self::new_unchecked(buffer);

        if !frame.check_len() {
            return Err(Error);
        }

        if !frame.check_fcs() {
            return Err(Error);
        }

        Ok(frame)
    }

    /// Check the length of the frame.
    pub fn check_len(&self) -> bool {
        self.buffer.as_ref().len() > 2
    }

    /// Create a new [`FrameWithFcs`] from a given buffer without checking the
    /// FCS.
    pub fn new_unchecked(buffer: T) -> Self {
        Self { buffer }
    }

    /// Calculate the Frame Check Sequence (FCS) of the frame.
    #[inline]
    pub fn calculate_fcs(&self) -> u16 {
        // The FCS field contains a 16-bit ITU-T CRC, using the x^16 + x^12 +
        // x^5 + 1 polynomial with initial and final values of 0x0000. The CRC
        // is calculated over the entire frame, excluding the FCS field
        // itself.
        const CRC_16_IEEE802154: crc::Algorithm<u16> = crc::Algorithm {
            width: 16,
            poly: 0x1021,
            init: 0x0000,
            refin: true,
            refout: true,
            xorout: 0x0000,
            check: 0x2189,
            residue: 0x0000,
        };
        crc::Crc::<u16>::new(&CRC_16_IEEE802154).checksum(self.content())
    }

    /// Check the Frame Check Sequence (FCS) of the frame.
    #[inline]
    pub fn check_fcs(&self) -> bool {
        self.calculate_fcs() == self.fcs()
    }

    /// Return the content of the frame, excluding the FCS.
    pub fn content(&self) -> &[u8] {
        &self.buffer.as_ref()[..self.buffer.as_ref().len() - 2]
    }

    /// Return the Frame Check Sequence (FCS) of the frame.
    pub fn fcs(&self) -> u16 {
        let len = self.buffer.as_ref().len();
        u16::from_le_bytes([self.buffer.as_ref()[len - 2], self.buffer.as_ref()[len - 1]])
    }

    /// Return a [`Frame`] reader over the content, excluding the FCS.
    pub fn frame(&self) -> Result<Frame<&'_ [u8]>> {
        Frame::new(self.content())
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> FrameWithFcs<T> {
    /// Compute and append the FCS over the frame content.
    pub fn fill_fcs(&mut self) {
        let fcs = self.calculate_fcs();
        let len = self.buffer.as_ref().len();
        self.buffer.as_mut()[len - 2..].copy_from_slice(&fcs.to_le_bytes());
    }
}

/// A reader/writer for an IEEE 802.15.4 frame, excluding the FCS.
///
/// All 2003-format frames share one header layout, so one reader covers
/// beacon, data, acknowledgment and MAC command frames. The frame control
/// field determines where each field starts.
pub struct Frame<T: AsRef<[u8]>> {
    buffer: T,
}

impl<T: AsRef<[u8]>> Frame<T> {
    /// Create a new [`Frame`] reader/writer from a given buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is too short to contain the header
    /// described by its frame control field.
    pub fn new(buffer: T) -> Result<Self> {
        let frame = Self::new_unchecked(buffer);

        if !frame.check_len() {
            return Err(Error);
        }

        Ok(frame)
    }

    /// Returns `false` if the buffer is too short to contain the frame
    /// header.
    fn check_len(&self) -> bool {
        let buffer = self.buffer.as_ref();

        if buffer.len() < 3 {
            return false;
        }

        let fc = FrameControl::new_unchecked(&buffer[..2]);

        let Some(addressing_len) = AddressingFields::<&[u8]>::length(&fc) else {
            return false;
        };

        let mut len = 3 + addressing_len;

        if fc.frame_type() == FrameType::MacCommand {
            len += 1;
        }

        buffer.len() >= len
    }

    /// Create a new [`Frame`] reader/writer from a given buffer without
    /// length checking.
    pub fn new_unchecked(buffer: T) -> Self {
        Self { buffer }
    }

    /// Return a [`FrameControl`] reader.
    pub fn frame_control(&self) -> FrameControl<&'_ [u8]> {
        FrameControl::new_unchecked(&self.buffer.as_ref()[..2])
    }

    /// Return the sequence number of the frame.
    pub fn sequence_number(&self) -> u8 {
        self.buffer.as_ref()[2]
    }

    /// Return an [`AddressingFields`] reader.
    pub fn addressing(&self) -> AddressingFields<&'_ [u8]> {
        AddressingFields::new_unchecked(&self.buffer.as_ref()[3..])
    }

    fn payload_offset(&self) -> usize {
        let fc = self.frame_control();
        // The length is validated on construction.
        3 + AddressingFields::<&[u8]>::length(&fc).unwrap_or(0)
    }

    /// Return the [`CommandId`] of a MAC command frame, or `None` for other
    /// frame types.
    pub fn command_id(&self) -> Option<CommandId> {
        if self.frame_control().frame_type() != FrameType::MacCommand {
            return None;
        }

        Some(CommandId::from(self.buffer.as_ref()[self.payload_offset()]))
    }

}

impl<'f, T: AsRef<[u8]> + ?Sized> Frame<&'f T> {
    /// Return the payload of the frame, borrowed from the underlying buffer.
    ///
    /// For MAC command frames this is the content following the command
    /// identifier.
    pub fn payload(&self) -> &'f [u8] {
        let mut offset = self.payload_offset();

        if self.frame_control().frame_type() == FrameType::MacCommand {
            offset += 1;
        }

        &self.buffer.as_ref()[offset..]
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Frame<T> {
    /// Return a mutable [`FrameControl`] writer.
    pub fn frame_control_mut(&mut self) -> FrameControl<&'_ mut [u8]> {
        FrameControl::new_unchecked(&mut self.buffer.as_mut()[..2])
    }

    /// Set the sequence number of the frame.
    pub fn set_sequence_number(&mut self, sequence_number: u8) {
        self.buffer.as_mut()[2] = sequence_number;
    }

    /// Return the buffer starting at the addressing fields.
    pub(crate) fn addressing_mut(&mut self) -> &mut [u8] {
        &mut self.buffer.as_mut()[3..]
    }

    /// Set the command identifier of a MAC command frame.
    ///
    /// The frame control field must be written first.
    pub fn set_command_id(&mut self, id: CommandId) {
        let offset = self.payload_offset();
        self.buffer.as_mut()[offset] = id as u8;
    }

    /// Return the mutable payload of the frame.
    ///
    /// The frame control field must be written first.
    pub fn payload_mut(&mut self) -> &mut [u8] {
        let mut offset = self.payload_offset();

        if self.frame_control().frame_type() == FrameType::MacCommand {
            offset += 1;
        }

        &mut self.buffer.as_mut()[offset..]
    }
}
