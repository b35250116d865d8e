use rand_core::RngCore;

use crate::frame::{Address, DisassociationReason, FrameBuilder, FrameRepr, MacCommandRepr};
use crate::mac::constants::*;
use crate::mac::state::MacState;
use crate::mac::timer::DelayTimer;
use crate::mac::{Mac, MacUpper};
use crate::phy::Radio;

impl<'p, R, T, Rng> Mac<'p, R, T, Rng>
where
    R: Radio,
    T: DelayTimer,
    Rng: RngCore,
{
    /// Notify a disassociation.
    ///
    /// One primitive covers both directions: an associated device names its
    /// coordinator to leave the PAN, a coordinator names a device to expel
    /// it. Completion arrives as [`MacUpper::DisassociateConfirm`].
    pub fn mlme_disassociate_request(
        &mut self,
        device: Address,
        reason: DisassociationReason,
    ) -> bool {
        match self.state {
            MacState::Associated | MacState::Started => {}
            _ => return false,
        }
        if device == Address::Absent {
            return false;
        }

        let sequence_number = self.next_sequence_number();
        let src_address = if self.pib.short_address == BROADCAST_SHORT_ADDRESS {
            Address::Extended(self.pib.extended_address)
        } else {
            Address::short(self.pib.short_address)
        };

        let Ok(frame) = FrameBuilder::new_command(MacCommandRepr::DisassociationNotification {
            reason,
        })
        .set_sequence_number(sequence_number)
        .set_dst_pan_id(self.pib.pan_id)
        .set_dst_address(device)
        .set_src_pan_id(self.pib.pan_id)
        .set_src_address(src_address)
        .set_ack_request(true)
        .finalize() else {
            return false;
        };

        if !self.transmit_frame(&frame) {
            return false;
        }

        self.prior = self.state;
        self.state = MacState::WaitingDisassociationAck;
        self.ack_seq = sequence_number;
        true
    }

    /// Complete a disassociation exchange, successful or not.
    ///
    /// A device leaving its PAN falls back to `Idle` and forgets the PAN;
    /// a coordinator expelling a device stays `Started`.
    pub(crate) fn finish_disassociation(&mut self) {
        if self.prior == MacState::Started {
            self.restore_prior();
            return;
        }

        self.pib.pan_id = BROADCAST_PAN_ID;
        self.pib.short_address = BROADCAST_SHORT_ADDRESS;
        self.pib.coord_short_address = BROADCAST_SHORT_ADDRESS;
        self.pib.coord_extended_address = None;
        self.radio.set_pan_id(BROADCAST_PAN_ID);
        self.radio.set_short_address(BROADCAST_SHORT_ADDRESS);

        self.state = MacState::Idle;
        self.prior = MacState::Idle;
        self.radio_idle();
    }

    /// A Disassociation Notification arrived.
    pub(crate) fn handle_disassociation_notification(
        &mut self,
        reason: DisassociationReason,
        repr: &FrameRepr<'_>,
    ) -> Option<MacUpper<'p>> {
        let device = repr.addressing.src_address;

        match self.state {
            // A device told its coordinator it is leaving.
            MacState::Started => Some(MacUpper::DisassociateIndication { device, reason }),
            // The coordinator expelled this device.
            MacState::Associated => {
                self.prior = MacState::Idle;
                self.finish_disassociation();
                Some(MacUpper::DisassociateIndication { device, reason })
            }
            _ => None,
        }
    }
}
