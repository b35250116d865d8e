use rand_core::RngCore;

use crate::mac::constants::*;
use crate::mac::state::MacState;
use crate::mac::timer::DelayTimer;
use crate::mac::Mac;
use crate::phy::{Radio, RadioState};

impl<R, T, Rng> Mac<'_, R, T, Rng>
where
    R: Radio,
    T: DelayTimer,
    Rng: RngCore,
{
    /// Start operating as a coordinator: of a new PAN from `Idle`, or as a
    /// router on the PAN just joined from `Associated`.
    ///
    /// Synchronous: the PIB and the radio filters are programmed and the MAC
    /// enters `Started` before this returns. The short address must have
    /// been chosen by the layer above or assigned during association; if it
    /// was never set, 0x0000 is used.
    pub fn mlme_start_request(&mut self, pan_id: u16, channel: u8) -> bool {
        if !matches!(self.state, MacState::Idle | MacState::Associated) {
            return false;
        }
        if pan_id == BROADCAST_PAN_ID || !(FIRST_CHANNEL..=LAST_CHANNEL).contains(&channel) {
            return false;
        }

        self.pib.pan_id = pan_id;
        self.pib.channel = channel;
        if self.pib.short_address == BROADCAST_SHORT_ADDRESS {
            self.pib.short_address = 0x0000;
        }
        self.pib.association_permit = true;

        self.radio.set_channel(channel);
        self.radio.set_pan_id(pan_id);
        self.radio.set_short_address(self.pib.short_address);
        self.radio.set_state(RadioState::Rx);

        self.state = MacState::Started;
        self.prior = MacState::Started;
        info!("started PAN on channel {}", channel);

        true
    }
}
