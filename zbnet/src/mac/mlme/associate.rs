//! The association exchanges, device and coordinator side.
//!
//! Device side, driven entirely by events once the request is accepted:
//!
//! 1. Association Request        -> `WaitingAssociationRequestAck`
//! 2. acknowledgment             -> `WaitingResponseWindow` (timer)
//! 3. timer, Data Request poll   -> `WaitingDataRequestAck`
//! 4. acknowledgment             -> `WaitingAssociationResponse` (timer)
//! 5. Association Response       -> `Associated`, associate confirm
//!
//! A missing acknowledgment or an empty response window unwinds to `Idle`
//! with the matching failure status. The coordinator parks its Association
//! Response in the indirect slot until the device polls for it.

use rand_core::RngCore;

use crate::frame::{
    Address, AssociationStatus, CapabilityInformation, Frame, FrameBuilder, FrameRepr,
    MacCommandRepr,
};
use crate::mac::constants::*;
use crate::mac::state::MacState;
use crate::mac::timer::DelayTimer;
use crate::mac::{IndirectResponse, Mac, MacUpper, Status};
use crate::phy::Radio;

impl<'p, R, T, Rng> Mac<'p, R, T, Rng>
where
    R: Radio,
    T: DelayTimer,
    Rng: RngCore,
{
    /// Request association with a coordinator heard during a scan.
    ///
    /// Returns whether the exchange was started; completion arrives as
    /// [`MacUpper::AssociateConfirm`].
    pub fn mlme_associate_request(
        &mut self,
        channel: u8,
        coord_pan_id: u16,
        coord_address: Address,
        capability: CapabilityInformation,
    ) -> bool {
        if self.state != MacState::Idle {
            return false;
        }
        if coord_pan_id == BROADCAST_PAN_ID
            || !(FIRST_CHANNEL..=LAST_CHANNEL).contains(&channel)
            || coord_address == Address::Absent
        {
            return false;
        }

        self.pib.channel = channel;
        self.pib.pan_id = coord_pan_id;
        match coord_address {
            Address::Short(bytes) => {
                self.pib.coord_short_address = u16::from_le_bytes(bytes);
            }
            Address::Extended(bytes) => {
                self.pib.coord_short_address = NO_SHORT_ADDRESS;
                self.pib.coord_extended_address = Some(bytes);
            }
            Address::Absent => unreachable!(),
        }

        self.radio.set_channel(channel);
        self.radio.set_pan_id(coord_pan_id);

        let sequence_number = self.next_sequence_number();
        let Ok(frame) = FrameBuilder::new_command(MacCommandRepr::AssociationRequest {
            capability,
        })
        .set_sequence_number(sequence_number)
        .set_dst_pan_id(coord_pan_id)
        .set_dst_address(coord_address)
        // Not yet part of the PAN: the source PAN identifier is broadcast
        // and the source address is the extended one.
        .set_src_pan_id(BROADCAST_PAN_ID)
        .set_src_address(Address::Extended(self.pib.extended_address))
        .set_ack_request(true)
        .finalize() else {
            return false;
        };

        if !self.transmit_frame(&frame) {
            return false;
        }

        self.prior = MacState::Idle;
        self.state = MacState::WaitingAssociationRequestAck;
        self.ack_seq = sequence_number;
        true
    }

    /// Answer an association indication (coordinator only).
    ///
    /// The response frame is built immediately but parked until the device
    /// polls with a Data Request; the outcome of that transmission arrives
    /// as [`MacUpper::CommStatus`].
    pub fn mlme_associate_response(
        &mut self,
        device: [u8; 8],
        short_address: u16,
        status: AssociationStatus,
    ) -> bool {
        if self.state != MacState::Started {
            return false;
        }
        // One parked response at a time.
        if self.indirect.is_some() {
            return false;
        }

        let sequence_number = self.next_sequence_number();
        let Ok(repr) = FrameBuilder::new_command(MacCommandRepr::AssociationResponse {
            short_address,
            status,
        })
        .set_sequence_number(sequence_number)
        .set_dst_pan_id(self.pib.pan_id)
        .set_dst_address(Address::Extended(device))
        .set_src_pan_id(self.pib.pan_id)
        .set_src_address(Address::Extended(self.pib.extended_address))
        .set_ack_request(true)
        .finalize() else {
            return false;
        };

        let len = repr.buffer_len();
        let Some(mut buffer) = self.pool.alloc(len) else {
            warn!("pool exhausted, cannot park association response");
            return false;
        };
        {
            let mut frame = Frame::new_unchecked(&mut buffer[..]);
            repr.emit(&mut frame);
        }

        self.indirect = Some(IndirectResponse {
            frame: buffer,
            device,
            sequence_number,
        });
        true
    }

    /// The response window elapsed; poll the coordinator for the parked
    /// Association Response.
    pub(crate) fn send_data_request_poll(&mut self) -> Option<MacUpper<'p>> {
        let coord_address = if self.pib.coord_short_address != NO_SHORT_ADDRESS {
            Address::short(self.pib.coord_short_address)
        } else if let Some(extended) = self.pib.coord_extended_address {
            Address::Extended(extended)
        } else {
            return self.fail_association(Status::NoData);
        };

        let sequence_number = self.next_sequence_number();
        let Ok(frame) = FrameBuilder::new_command(MacCommandRepr::DataRequest)
            .set_sequence_number(sequence_number)
            .set_dst_pan_id(self.pib.pan_id)
            .set_dst_address(coord_address)
            .set_src_pan_id(BROADCAST_PAN_ID)
            .set_src_address(Address::Extended(self.pib.extended_address))
            .set_ack_request(true)
            .finalize()
        else {
            return self.fail_association(Status::NoData);
        };

        if !self.transmit_frame(&frame) {
            return self.fail_association(Status::ChannelAccessFailure);
        }

        self.state = MacState::WaitingDataRequestAck;
        self.ack_seq = sequence_number;
        None
    }

    /// An Association Request arrived (coordinator side).
    pub(crate) fn handle_association_request(
        &mut self,
        capability: CapabilityInformation,
        repr: &FrameRepr<'_>,
    ) -> Option<MacUpper<'p>> {
        if self.state != MacState::Started || !self.pib.association_permit {
            return None;
        }

        let Address::Extended(device) = repr.addressing.src_address else {
            return None;
        };

        Some(MacUpper::AssociateIndication { device, capability })
    }

    /// An Association Response arrived (device side).
    pub(crate) fn handle_association_response(
        &mut self,
        short_address: u16,
        status: AssociationStatus,
    ) -> Option<MacUpper<'p>> {
        if self.state != MacState::WaitingAssociationResponse {
            return None;
        }
        self.timer.cancel();

        match status {
            AssociationStatus::Successful => {
                self.pib.short_address = short_address;
                self.radio.set_short_address(short_address);
                self.state = MacState::Associated;
                self.prior = MacState::Associated;
                self.radio_idle();
                info!("associated with short address {}", short_address);
                Some(MacUpper::AssociateConfirm {
                    status: Status::Success,
                    short_address,
                })
            }
            AssociationStatus::PanAtCapacity => self.fail_association(Status::AtCapacity),
            AssociationStatus::PanAccessDenied | AssociationStatus::Unknown => {
                self.fail_association(Status::Denied)
            }
        }
    }

    /// A device polled for pending data; hand out the parked Association
    /// Response if it is addressed to it.
    pub(crate) fn handle_data_request_poll(
        &mut self,
        repr: &FrameRepr<'_>,
    ) -> Option<MacUpper<'p>> {
        if self.state != MacState::Started {
            return None;
        }

        let matches = match (&self.indirect, repr.addressing.src_address) {
            (Some(indirect), Address::Extended(src)) => indirect.device == src,
            _ => false,
        };
        if !matches {
            return None;
        }

        // The parked frame stays in the slot until its acknowledgment; a
        // failure keeps the possibility of reporting which device it was
        // for.
        let (sent, sequence_number) = {
            let indirect = self.indirect.as_ref()?;
            let sequence_number = indirect.sequence_number;

            let mut frame = [0u8; crate::frame::MAX_FRAME_LEN];
            let len = indirect.frame.len();
            frame[..len].copy_from_slice(&indirect.frame);

            self.radio.set_state(crate::phy::RadioState::Tx);
            (self.radio.transmit(&frame[..len]), sequence_number)
        };

        if !sent {
            self.radio_idle();
            let device = self.indirect.take().map(|i| i.device).unwrap_or([0; 8]);
            return Some(MacUpper::CommStatus {
                status: Status::ChannelAccessFailure,
                device,
            });
        }

        self.prior = self.state;
        self.state = MacState::WaitingAssociationResponseAck;
        self.ack_seq = sequence_number;
        None
    }

    /// Unwind a failed device-side association to `Idle`.
    pub(crate) fn fail_association(&mut self, status: Status) -> Option<MacUpper<'p>> {
        self.timer.cancel();
        self.pib.pan_id = BROADCAST_PAN_ID;
        self.pib.coord_short_address = BROADCAST_SHORT_ADDRESS;
        self.pib.coord_extended_address = None;
        self.radio.set_pan_id(BROADCAST_PAN_ID);

        self.state = MacState::Idle;
        self.prior = MacState::Idle;
        self.radio_idle();

        warn!("association failed");
        Some(MacUpper::AssociateConfirm {
            status,
            short_address: BROADCAST_SHORT_ADDRESS,
        })
    }
}
