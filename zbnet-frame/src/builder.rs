//! A helper for building IEEE 802.15.4 frames.

use super::{
    Address, AddressingMode, AddressingRepr, BeaconRepr, FrameControlRepr, FramePayload, FrameRepr,
    FrameType, MacCommandRepr, Result,
};

/// A helper for building IEEE 802.15.4 frames.
///
/// The builder fills in the addressing modes and the intra-PAN compression
/// from the addresses it is given; [`finalize`] validates the result.
///
/// [`finalize`]: FrameBuilder::finalize
pub struct FrameBuilder<'p> {
    frame: FrameRepr<'p>,
}

impl<'p> FrameBuilder<'p> {
    fn new(frame_type: FrameType, payload: FramePayload<'p>) -> Self {
        Self {
            frame: FrameRepr {
                frame_control: FrameControlRepr {
                    frame_type,
                    security_enabled: false,
                    frame_pending: false,
                    ack_request: false,
                    intra_pan: false,
                    dst_addressing_mode: AddressingMode::Absent,
                    src_addressing_mode: AddressingMode::Absent,
                },
                sequence_number: 0,
                addressing: AddressingRepr::absent(),
                payload,
            },
        }
    }

    /// Create a new builder for a data frame.
    pub fn new_data(payload: &'p [u8]) -> Self {
        Self::new(FrameType::Data, FramePayload::Data(payload))
    }

    /// Create a new builder for a beacon frame.
    pub fn new_beacon(beacon: BeaconRepr) -> Self {
        Self::new(FrameType::Beacon, FramePayload::Beacon(beacon))
    }

    /// Create a new builder for a MAC command frame.
    pub fn new_command(command: MacCommandRepr) -> Self {
        Self::new(FrameType::MacCommand, FramePayload::Command(command))
    }

    /// Create a new builder for an acknowledgment frame.
    pub fn new_ack(sequence_number: u8) -> Self {
        Self::new(FrameType::Ack, FramePayload::Ack).set_sequence_number(sequence_number)
    }

    /// Set the sequence number of the frame.
    pub fn set_sequence_number(mut self, sequence_number: u8) -> Self {
        self.frame.sequence_number = sequence_number;
        self
    }

    /// Request an acknowledgment for the frame.
    pub fn set_ack_request(mut self, ack_request: bool) -> Self {
        self.frame.frame_control.ack_request = ack_request;
        self
    }

    /// Set the destination PAN identifier.
    pub fn set_dst_pan_id(mut self, pan_id: u16) -> Self {
        self.frame.addressing.dst_pan_id = Some(pan_id);
        self
    }

    /// Set the destination address.
    pub fn set_dst_address(mut self, address: Address) -> Self {
        self.frame.addressing.dst_address = address;
        self.frame.frame_control.dst_addressing_mode = address.into();
        self
    }

    /// Set the source PAN identifier.
    pub fn set_src_pan_id(mut self, pan_id: u16) -> Self {
        self.frame.addressing.src_pan_id = Some(pan_id);
        self
    }

    /// Set the source address.
    pub fn set_src_address(mut self, address: Address) -> Self {
        self.frame.addressing.src_address = address;
        self.frame.frame_control.src_addressing_mode = address.into();
        self
    }

    /// Finalize the builder into a validated [`FrameRepr`].
    ///
    /// When the source and destination PAN identifiers are equal, the source
    /// PAN identifier is compressed away and the intra-PAN bit is set.
    pub fn finalize(mut self) -> Result<FrameRepr<'p>> {
        let addressing = &mut self.frame.addressing;

        if addressing.dst_pan_id.is_some() && addressing.dst_pan_id == addressing.src_pan_id {
            addressing.src_pan_id = None;
            self.frame.frame_control.intra_pan = true;
        }

        self.frame.validate()?;

        Ok(self.frame)
    }
}
