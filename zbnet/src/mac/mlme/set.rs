use rand_core::RngCore;

use crate::mac::timer::DelayTimer;
use crate::mac::Mac;
use crate::phy::Radio;

impl<R, T, Rng> Mac<'_, R, T, Rng>
where
    R: Radio,
    T: DelayTimer,
    Rng: RngCore,
{
    /// Program the hardware-derived extended address.
    pub fn set_extended_address(&mut self, address: [u8; 8]) {
        self.pib.extended_address = address;
        self.radio.set_extended_address(address);
    }

    /// Program the short address chosen by the layer above.
    pub fn set_short_address(&mut self, address: u16) {
        self.pib.short_address = address;
        self.radio.set_short_address(address);
    }

    /// Allow or refuse association requests (coordinator only).
    pub fn set_association_permit(&mut self, permit: bool) {
        self.pib.association_permit = permit;
    }

    /// Configure whether the receiver stays enabled during idle periods.
    pub fn set_rx_on_when_idle(&mut self, rx_on: bool) {
        self.pib.rx_on_when_idle = rx_on;
        if self.state.is_operational() {
            self.radio_idle();
        }
    }
}
