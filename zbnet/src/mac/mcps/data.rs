use rand_core::RngCore;

use crate::frame::{Address, AddressingMode, FrameBuilder};
use crate::mac::state::MacState;
use crate::mac::timer::DelayTimer;
use crate::mac::Mac;
use crate::phy::Radio;

impl<R, T, Rng> Mac<'_, R, T, Rng>
where
    R: Radio,
    T: DelayTimer,
    Rng: RngCore,
{
    /// Transmit a data frame.
    ///
    /// `src_mode` selects whether the short or the extended source address
    /// is used. With `ack_request` the confirm carries the acknowledgment
    /// outcome and the MAC blocks new requests until it arrives (restoring
    /// the prior operational state afterwards); without it the confirm
    /// follows the transmit completion. Completion arrives as
    /// [`MacUpper::DataConfirm`].
    ///
    /// [`MacUpper::DataConfirm`]: crate::mac::MacUpper::DataConfirm
    pub fn mcps_data_request(
        &mut self,
        dst_pan_id: u16,
        dst_address: Address,
        src_mode: AddressingMode,
        payload: &[u8],
        ack_request: bool,
    ) -> bool {
        if !self.state.is_operational() || self.state == MacState::Idle {
            return false;
        }
        if self.unacked_data {
            return false;
        }

        let src_address = match src_mode {
            AddressingMode::Short => Address::short(self.pib.short_address),
            AddressingMode::Extended => Address::Extended(self.pib.extended_address),
            _ => Address::Absent,
        };
        // At least one address must be present, and an acknowledged
        // broadcast is invalid; `finalize` rejects both.

        let sequence_number = self.next_sequence_number();
        let Ok(frame) = FrameBuilder::new_data(payload)
            .set_sequence_number(sequence_number)
            .set_dst_pan_id(dst_pan_id)
            .set_dst_address(dst_address)
            .set_src_pan_id(self.pib.pan_id)
            .set_src_address(src_address)
            .set_ack_request(ack_request)
            .finalize()
        else {
            return false;
        };

        if !self.transmit_frame(&frame) {
            return false;
        }

        if ack_request {
            self.prior = self.state;
            self.state = MacState::TxWaitingAck;
            self.ack_seq = sequence_number;
        } else {
            self.unacked_data = true;
        }

        true
    }
}
