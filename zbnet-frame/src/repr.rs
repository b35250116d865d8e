//! High-level representations of IEEE 802.15.4 frames.

use super::{
    Address, AddressingFields, AddressingMode, BeaconRepr, Error, Frame, FrameControl, FrameType,
    MacCommandRepr, Result,
};

/// A high-level representation of the Frame Control field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameControlRepr {
    pub frame_type: FrameType,
    pub security_enabled: bool,
    pub frame_pending: bool,
    pub ack_request: bool,
    pub intra_pan: bool,
    pub dst_addressing_mode: AddressingMode,
    pub src_addressing_mode: AddressingMode,
}

impl FrameControlRepr {
    /// Parse a Frame Control field.
    pub fn parse<T: AsRef<[u8]>>(fc: FrameControl<T>) -> Result<Self> {
        let frame_type = fc.frame_type();
        let dst_addressing_mode = fc.dst_addressing_mode();
        let src_addressing_mode = fc.src_addressing_mode();

        if frame_type == FrameType::Unknown
            || dst_addressing_mode == AddressingMode::Unknown
            || src_addressing_mode == AddressingMode::Unknown
        {
            return Err(Error);
        }

        Ok(Self {
            frame_type,
            security_enabled: fc.security_enabled(),
            frame_pending: fc.frame_pending(),
            ack_request: fc.ack_request(),
            intra_pan: fc.intra_pan(),
            dst_addressing_mode,
            src_addressing_mode,
        })
    }

    /// Emit the Frame Control field into a writer.
    pub fn emit<T: AsRef<[u8]> + AsMut<[u8]>>(&self, fc: &mut FrameControl<T>) {
        fc.set_frame_type(self.frame_type);
        fc.set_security_enabled(self.security_enabled);
        fc.set_frame_pending(self.frame_pending);
        fc.set_ack_request(self.ack_request);
        fc.set_intra_pan(self.intra_pan);
        fc.set_dst_addressing_mode(self.dst_addressing_mode);
        fc.set_src_addressing_mode(self.src_addressing_mode);
    }
}

/// A high-level representation of the addressing fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressingRepr {
    /// The destination PAN identifier, present iff a destination address is.
    pub dst_pan_id: Option<u16>,
    /// The destination address.
    pub dst_address: Address,
    /// The source PAN identifier. `None` for intra-PAN frames and frames
    /// without a source address.
    pub src_pan_id: Option<u16>,
    /// The source address.
    pub src_address: Address,
}

impl AddressingRepr {
    /// An addressing block with every field absent.
    pub const fn absent() -> Self {
        Self {
            dst_pan_id: None,
            dst_address: Address::Absent,
            src_pan_id: None,
            src_address: Address::Absent,
        }
    }

    /// Parse the addressing fields of a frame.
    pub fn parse<T: AsRef<[u8]>, FC: AsRef<[u8]>>(
        af: AddressingFields<T>,
        fc: &FrameControl<FC>,
    ) -> Self {
        Self {
            dst_pan_id: af.dst_pan_id(fc),
            dst_address: af.dst_address(fc),
            src_pan_id: if fc.intra_pan() {
                None
            } else {
                af.src_pan_id(fc)
            },
            src_address: af.src_address(fc),
        }
    }

    /// Validate the addressing fields against a frame control
    /// representation.
    pub fn validate(&self, fc: &FrameControlRepr) -> Result<()> {
        if AddressingMode::from(self.dst_address) != fc.dst_addressing_mode
            || AddressingMode::from(self.src_address) != fc.src_addressing_mode
        {
            return Err(Error);
        }

        if self.dst_address != Address::Absent && self.dst_pan_id.is_none() {
            return Err(Error);
        }

        // The intra-PAN bit replaces the source PAN identifier.
        if fc.intra_pan && self.src_pan_id.is_some() {
            return Err(Error);
        }

        if !fc.intra_pan && self.src_address != Address::Absent && self.src_pan_id.is_none() {
            return Err(Error);
        }

        Ok(())
    }

    /// Return the length of the addressing fields when emitted.
    pub fn buffer_len(&self) -> usize {
        let mut len = 0;

        if self.dst_pan_id.is_some() {
            len += 2;
        }
        len += self.dst_address.len();

        if self.src_pan_id.is_some() {
            len += 2;
        }
        len += self.src_address.len();

        len
    }

    /// Emit the addressing fields into a buffer.
    pub fn emit(&self, buffer: &mut [u8]) {
        let mut offset = 0;

        if let Some(pan) = self.dst_pan_id {
            buffer[offset..offset + 2].copy_from_slice(&pan.to_le_bytes());
            offset += 2;
        }

        buffer[offset..offset + self.dst_address.len()].copy_from_slice(self.dst_address.as_bytes());
        offset += self.dst_address.len();

        if let Some(pan) = self.src_pan_id {
            buffer[offset..offset + 2].copy_from_slice(&pan.to_le_bytes());
            offset += 2;
        }

        buffer[offset..offset + self.src_address.len()].copy_from_slice(self.src_address.as_bytes());
    }
}

/// The typed payload of a frame representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePayload<'p> {
    /// An acknowledgment frame carries no payload.
    Ack,
    /// The superframe specification of a beacon frame.
    Beacon(BeaconRepr),
    /// The raw payload of a data frame.
    Data(&'p [u8]),
    /// A MAC command.
    Command(MacCommandRepr),
}

/// A high-level representation of an IEEE 802.15.4 frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRepr<'p> {
    /// The frame control field.
    pub frame_control: FrameControlRepr,
    /// The sequence number.
    pub sequence_number: u8,
    /// The addressing fields.
    pub addressing: AddressingRepr,
    /// The payload.
    pub payload: FramePayload<'p>,
}

impl<'f> FrameRepr<'f> {
    /// Parse an IEEE 802.15.4 frame.
    ///
    /// This is the single parsing pass per received frame: the result is all
    /// the metadata the MAC layer consumes.
    pub fn parse(reader: &Frame<&'f [u8]>) -> Result<Self> {
        let fc = FrameControlRepr::parse(reader.frame_control())?;
        let addressing = AddressingRepr::parse(reader.addressing(), &reader.frame_control());

        let payload = match fc.frame_type {
            FrameType::Ack => FramePayload::Ack,
            FrameType::Beacon => FramePayload::Beacon(BeaconRepr::parse(reader.payload())?),
            FrameType::Data => FramePayload::Data(reader.payload()),
            FrameType::MacCommand => {
                let Some(id) = reader.command_id() else {
                    return Err(Error);
                };
                FramePayload::Command(MacCommandRepr::parse(id, reader.payload())?)
            }
            FrameType::Unknown => return Err(Error),
        };

        Ok(Self {
            frame_control: fc,
            sequence_number: reader.sequence_number(),
            addressing,
            payload,
        })
    }

    /// Validate the frame.
    pub fn validate(&self) -> Result<()> {
        self.addressing.validate(&self.frame_control)?;

        // A data frame must carry at least one address.
        if self.frame_control.frame_type == FrameType::Data
            && self.addressing.dst_address == Address::Absent
            && self.addressing.src_address == Address::Absent
        {
            return Err(Error);
        }

        // Requesting an acknowledgment of a broadcast is invalid.
        if self.frame_control.ack_request && self.addressing.dst_address.is_broadcast() {
            return Err(Error);
        }

        let payload_matches = matches!(
            (self.frame_control.frame_type, &self.payload),
            (FrameType::Ack, FramePayload::Ack)
                | (FrameType::Beacon, FramePayload::Beacon(_))
                | (FrameType::Data, FramePayload::Data(_))
                | (FrameType::MacCommand, FramePayload::Command(_))
        );

        if !payload_matches {
            return Err(Error);
        }

        Ok(())
    }

    /// Return the length of the frame when emitted into a buffer, excluding
    /// the FCS.
    pub fn buffer_len(&self) -> usize {
        let mut len = 3; // Frame control and sequence number.

        len += self.addressing.buffer_len();

        len += match &self.payload {
            FramePayload::Ack => 0,
            FramePayload::Beacon(beacon) => beacon.buffer_len(),
            FramePayload::Data(payload) => payload.len(),
            FramePayload::Command(command) => 1 + command.buffer_len(),
        };

        len
    }

    /// Emit the frame into a writer.
    ///
    /// The writer's buffer must be exactly [`buffer_len`] bytes long.
    ///
    /// [`buffer_len`]: FrameRepr::buffer_len
    pub fn emit(&self, frame: &mut Frame<&'_ mut [u8]>) {
        self.frame_control.emit(&mut frame.frame_control_mut());
        frame.set_sequence_number(self.sequence_number);
        self.addressing.emit(frame.addressing_mut());

        match &self.payload {
            FramePayload::Ack => {}
            FramePayload::Beacon(beacon) => beacon.emit(frame.payload_mut()),
            FramePayload::Data(payload) => frame.payload_mut().copy_from_slice(payload),
            FramePayload::Command(command) => {
                frame.set_command_id(command.command_id());
                command.emit(frame.payload_mut());
            }
        }
    }
}
