use rand_core::RngCore;

use crate::mac::pib::Pib;
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
    /// Reset the MAC sublayer.
    ///
    /// Cancels any exchange in progress, reinitializes the radio and, when
    /// `set_default_pib` is set, restores the PIB defaults (the extended
    /// address is hardware-derived and survives). The data sequence number
    /// is re-randomized either way.
    pub fn mlme_reset_request(&mut self, set_default_pib: bool) -> bool {
        self.timer.cancel();
        self.scan = None;
        // Drops any parked Association Response back into the pool.
        self.indirect = None;
        self.unacked_data = false;

        if set_default_pib || self.state == MacState::Uninitialized {
            self.pib = Pib {
                extended_address: self.pib.extended_address,
                ..Pib::default()
            };
        }

        self.dsn = (self.rng.next_u32() & 0xff) as u8;

        self.radio.init();
        self.radio.set_channel(self.pib.channel);
        self.radio.set_pan_id(self.pib.pan_id);
        self.radio.set_short_address(self.pib.short_address);
        self.radio.set_extended_address(self.pib.extended_address);

        self.state = MacState::Idle;
        self.prior = MacState::Idle;
        self.radio_idle();

        true
    }
}
