//! The radio abstraction.
//!
//! The protocol core never talks to hardware directly. A driver implements
//! [`Radio`] and forwards its interrupt-context completions (transmission
//! done, frame received) to the event queue; the core pulls frames out with
//! [`Radio::read`] and pushes them in with [`Radio::transmit`] from thread
//! context only.
//!
//! Frames cross this boundary without their FCS: the hardware verifies it on
//! reception and appends it on transmission.

/// The power and listening state of the radio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioState {
    /// Powered down.
    Off,
    /// Powered but not listening.
    Sleep,
    /// Listening for frames.
    Rx,
    /// Transmitting a frame.
    Tx,
}

/// The outcome of a transmission, reported by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxStatus {
    /// The frame left the antenna.
    Success,
    /// The channel was busy.
    ChannelAccessFailure,
}

/// Interface to an IEEE 802.15.4 radio driver.
///
/// `transmit` and `read` refuse to work in the wrong [`RadioState`];
/// the core owns all state transitions through `set_state`.
pub trait Radio {
    /// Power up the radio and apply any reset-time configuration.
    fn init(&mut self);

    /// Queue a frame (without FCS) for transmission.
    ///
    /// Returns whether the radio accepted the frame. Completion is reported
    /// asynchronously by the driver.
    fn transmit(&mut self, frame: &[u8]) -> bool;

    /// Copy the most recently received frame (without FCS) into `buffer`.
    ///
    /// Returns the length of the frame, or 0 when nothing is pending or the
    /// frame does not fit.
    fn read(&mut self, buffer: &mut [u8]) -> usize;

    /// Return the current radio state.
    fn state(&self) -> RadioState;

    /// Transition the radio to `state`.
    fn set_state(&mut self, state: RadioState);

    /// Tune to an IEEE 802.15.4 channel (11 through 26).
    fn set_channel(&mut self, channel: u8);

    /// Program the short address used for frame filtering.
    fn set_short_address(&mut self, address: u16);

    /// Program the extended address used for frame filtering.
    fn set_extended_address(&mut self, address: [u8; 8]);

    /// Program the PAN identifier used for frame filtering.
    fn set_pan_id(&mut self, pan_id: u16);

    /// Return the link quality of the most recently received frame.
    fn last_lqi(&self) -> u8;
}

#[cfg(test)]
pub mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::vec::Vec;

    /// A scripted radio for exercising the protocol core.
    ///
    /// Transmitted frames are recorded; received frames are injected by the
    /// test before posting a frame-received event.
    pub struct TestRadio {
        pub transmitted: Vec<Vec<u8>>,
        pub rx_queue: VecDeque<Vec<u8>>,
        pub accept_transmit: bool,
        pub state: RadioState,
        pub channel: u8,
        pub pan_id: u16,
        pub short_address: u16,
        pub extended_address: [u8; 8],
        pub lqi: u8,
    }

    impl TestRadio {
        pub fn new() -> Self {
            Self {
                transmitted: Vec::new(),
                rx_queue: VecDeque::new(),
                accept_transmit: true,
                state: RadioState::Off,
                channel: 11,
                pan_id: 0xffff,
                short_address: 0xffff,
                extended_address: [0; 8],
                lqi: 0xff,
            }
        }

        /// Queue a frame for the next [`Radio::read`].
        pub fn inject(&mut self, frame: &[u8]) {
            self.rx_queue.push_back(Vec::from(frame));
        }

        /// Pop the oldest recorded transmission.
        pub fn next_transmitted(&mut self) -> Option<Vec<u8>> {
            if self.transmitted.is_empty() {
                None
            } else {
                Some(self.transmitted.remove(0))
            }
        }
    }

    impl Radio for TestRadio {
        fn init(&mut self) {
            self.state = RadioState::Sleep;
        }

        fn transmit(&mut self, frame: &[u8]) -> bool {
            if !self.accept_transmit {
                return false;
            }
            self.transmitted.push(Vec::from(frame));
            true
        }

        fn read(&mut self, buffer: &mut [u8]) -> usize {
            match self.rx_queue.pop_front() {
                Some(frame) if frame.len() <= buffer.len() => {
                    buffer[..frame.len()].copy_from_slice(&frame);
                    frame.len()
                }
                _ => 0,
            }
        }

        fn state(&self) -> RadioState {
            self.state
        }

        fn set_state(&mut self, state: RadioState) {
            self.state = state;
        }

        fn set_channel(&mut self, channel: u8) {
            self.channel = channel;
        }

        fn set_short_address(&mut self, address: u16) {
            self.short_address = address;
        }

        fn set_extended_address(&mut self, address: [u8; 8]) {
            self.extended_address = address;
        }

        fn set_pan_id(&mut self, pan_id: u16) {
            self.pan_id = pan_id;
        }

        fn last_lqi(&self) -> u8 {
            self.lqi
        }
    }
}
