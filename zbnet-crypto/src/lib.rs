//! AES-128-CCM* for zbnet frame payloads, as used on the host side of the
//! dongle: sniffing secured traffic and preparing test frames.
//!
//! CCM* is CCM with one extension: a MIC length of zero is allowed, which
//! degenerates to plain CTR encryption with the CCM counter-block format.
//! Keys are 16 bytes and nonces 13, leaving two octets for the block
//! counter.

pub mod ccm_star;
pub mod error;

pub use ccm_star::{decrypt, encrypt, MicLength};
pub use error::CryptoError;
