//! Zero-copy read and write structures for the frames spoken by the zbnet
//! dongle stack: IEEE 802.15.4 (2003 frame format) MAC frames and ZigBee NWK
//! frames.
//!
//! Each reader contains the following functions:
//! - [`new`]: Create a new reader, checking that the buffer is large enough.
//! - [`new_unchecked`]: Create a new reader without checking the buffer
//!   length.
//!
//! The most important reader is the [`Frame`] reader, which reads a full MAC
//! frame:
//! - [`frame_control`]: returns a [`FrameControl`] reader.
//! - [`sequence_number`]: returns the sequence number.
//! - [`addressing`]: returns an [`AddressingFields`] reader.
//! - [`command_id`]: returns the [`CommandId`] of a MAC command frame.
//! - [`payload`]: returns the payload of the frame.
//!
//! ## Reading a frame
//! ```
//! use zbnet_frame::{CommandId, Frame, FrameType};
//!
//! // Association Request from a short source address to a coordinator.
//! let frame: [u8; 13] = [
//!     0x23, 0x88, 0x42, 0x34, 0x12, 0x00, 0x00, 0xff, 0xff, 0x02, 0x00, 0x01,
//!     0x8e,
//! ];
//! let frame = Frame::new(&frame[..]).unwrap();
//! assert_eq!(frame.frame_control().frame_type(), FrameType::MacCommand);
//! assert_eq!(frame.sequence_number(), 0x42);
//! assert_eq!(frame.command_id(), Some(CommandId::AssociationRequest));
//! ```
//!
//! ## Writing a frame
//! Frames are written through their high-level representation, [`FrameRepr`],
//! usually constructed with the [`FrameBuilder`]:
//! ```
//! use zbnet_frame::{Address, Frame, FrameBuilder};
//!
//! let repr = FrameBuilder::new_data(&[0xde, 0xad])
//!     .set_sequence_number(1)
//!     .set_dst_pan_id(0x1234)
//!     .set_dst_address(Address::Short([0x00, 0x00]))
//!     .set_src_pan_id(0x1234)
//!     .set_src_address(Address::Short([0x01, 0x00]))
//!     .finalize()
//!     .unwrap();
//!
//! let mut buffer = [0u8; 127];
//! let len = repr.buffer_len();
//! repr.emit(&mut Frame::new_unchecked(&mut buffer[..len]));
//! ```
//!
//! The NWK side lives in the [`nwk`] module and follows the same reader,
//! writer and `Repr` conventions.
//!
//! [`new`]: Frame::new
//! [`new_unchecked`]: Frame::new_unchecked
//! [`frame_control`]: Frame::frame_control
//! [`sequence_number`]: Frame::sequence_number
//! [`addressing`]: Frame::addressing
//! [`command_id`]: Frame::command_id
//! [`payload`]: Frame::payload
#![no_std]
#![deny(unsafe_code)]

#[cfg(any(feature = "std", test))]
#[macro_use]
extern crate std;


mod frame;
pub use frame::Frame;
pub use frame::FrameWithFcs;

mod frame_control;
pub use frame_control::*;

mod addressing;
pub use addressing::*;

mod command;
pub use command::*;

mod beacon;
pub use beacon::*;

mod repr;
pub use repr::{AddressingRepr, FrameControlRepr, FramePayload, FrameRepr};

mod builder;
pub use builder::FrameBuilder;

pub mod nwk;

/// The maximum length of a MAC frame, excluding the FCS.
pub const MAX_FRAME_LEN: usize = 125;

/// A frame parsing or emitting error.
///
/// The frame crate deliberately carries no further information: the protocol
/// engine treats every malformed frame the same way (drop it), and the byte
/// offset of the problem is of no use on the dongle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Error;

/// A type alias for `Result<T, zbnet_frame::Error>`.
pub type Result<T> = core::result::Result<T, Error>;
