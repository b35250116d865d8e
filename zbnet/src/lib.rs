//! IEEE 802.15.4 MAC and ZigBee NWK layers for a research radio dongle.
//!
//! The stack is built for a single-threaded, interrupt-driven target: a
//! superloop alternates between [`kernel::EventQueue::dispatch`] and polling
//! the hardware, while interrupt handlers post events. Nothing in the
//! protocol core blocks; asynchronous primitives arrange for a later event
//! (a radio acknowledgment or the expiry of the single shared delay timer)
//! to deliver their result.
//!
//! ```ignore
//! let pool = BufferPool::new(&[(16, 8), (64, 8), (128, 4)]).unwrap();
//! let queue = EventQueue::new();
//! let mut nwk = Nwk::new(Mac::new(radio, timer, &pool, rng), TreeConfig::default());
//!
//! loop {
//!     if let Some(event) = queue.dispatch() {
//!         if let Some(indication) = nwk.process(event) {
//!             // deliver to the application
//!         }
//!     }
//!     // poll hardware, sleep until the next interrupt, ...
//! }
//! ```
#![no_std]

#[cfg(any(feature = "std", test))]
#[macro_use]
extern crate std;

#[macro_use]
pub(crate) mod utils;

pub use zbnet_frame as frame;

pub mod kernel;
pub mod mac;
pub mod nwk;
pub mod phy;
pub mod pool;

#[cfg(test)]
mod tests;
