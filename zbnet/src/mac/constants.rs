#![allow(dead_code)]

/// The PAN identifier matching every PAN.
pub const BROADCAST_PAN_ID: u16 = 0xffff;
/// The short address matching every device.
pub const BROADCAST_SHORT_ADDRESS: u16 = 0xffff;
/// The short address of a device that only uses its extended address.
pub const NO_SHORT_ADDRESS: u16 = 0xfffe;

/// The lowest O-QPSK channel number.
pub const FIRST_CHANNEL: u8 = 11;
/// The highest O-QPSK channel number.
pub const LAST_CHANNEL: u8 = 26;

// MAC constants of IEEE 802.15.4, section 8.4.2, in symbol periods.
/// The number of symbols forming a superframe slot when the superframe order
/// is equal to zero.
pub const BASE_SLOT_DURATION: u32 = 60;
/// The number of slots contained in any superframe.
pub const NUM_SUPERFRAME_SLOTS: u32 = 16;
/// The number of symbols forming a superframe when the superframe order is
/// equal to zero.
pub const BASE_SUPERFRAME_DURATION: u32 = BASE_SLOT_DURATION * NUM_SUPERFRAME_SLOTS;
/// The maximum number of symbols to wait for an acknowledgment frame.
pub const ACK_WAIT_DURATION: u32 = 120;
/// The maximum number of symbols a device waits for a response command frame
/// following a request.
pub const RESPONSE_WAIT_TIME: u32 = 32 * BASE_SUPERFRAME_DURATION;

/// The number of PAN descriptors a single scan can accumulate.
pub const MAX_PAN_DESCRIPTORS: usize = 8;

/// The number of symbols a channel is listened to during a scan with
/// duration order `n`.
pub const fn scan_duration(n: u8) -> u32 {
    BASE_SUPERFRAME_DURATION * ((1 << n as u32) + 1)
}
