//! The delay-timer boundary.
//!
//! The MAC owns exactly one timer slot. Acknowledgment waits, response
//! windows and per-channel scan dwells are sequential, never concurrent, so
//! a single slot suffices; starting a new wait replaces a pending one.
//! Expiry reaches the MAC as [`MacEvent::TimerExpired`] through the event
//! queue.
//!
//! [`MacEvent::TimerExpired`]: crate::mac::MacEvent::TimerExpired

/// Interface to a hardware delay timer counting in symbol periods.
pub trait DelayTimer {
    /// Arm the timer for `symbols` symbol periods, replacing any pending
    /// wait.
    fn start(&mut self, symbols: u32);

    /// Disarm the timer. A cancelled wait never fires.
    fn cancel(&mut self);
}

#[cfg(test)]
pub mod tests {
    use super::*;

    use std::vec::Vec;

    /// A timer that records every wait; tests fire expiries by hand.
    pub struct TestTimer {
        pub started: Vec<u32>,
        pub armed: bool,
    }

    impl TestTimer {
        pub fn new() -> Self {
            Self {
                started: Vec::new(),
                armed: false,
            }
        }

        /// The most recently armed duration.
        pub fn last_started(&self) -> Option<u32> {
            self.started.last().copied()
        }
    }

    impl DelayTimer for TestTimer {
        fn start(&mut self, symbols: u32) {
            self.started.push(symbols);
            self.armed = true;
        }

        fn cancel(&mut self) {
            self.armed = false;
        }
    }
}
