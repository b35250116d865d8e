//! AES-128-CCM* encryption and decryption.
//!
//! The MIC length selects the CCM parameter M; zero selects the CCM*
//! encryption-only mode, where the AAD plays no role and the payload is
//! XORed with the CTR keystream built from the CCM counter blocks.

use aes::Aes128;
use ccm::aead::generic_array::GenericArray;
use ccm::aead::{Aead, KeyInit, Payload};
use ccm::consts::{U13, U16, U4, U8};
use ccm::Ccm;
use ctr::cipher::{KeyIvInit, StreamCipher};

use crate::CryptoError;

type Ccm4 = Ccm<Aes128, U4, U13>;
type Ccm8 = Ccm<Aes128, U8, U13>;
type Ccm16 = Ccm<Aes128, U16, U13>;
type Aes128Ctr = ctr::Ctr128BE<Aes128>;

/// The MIC length of a CCM* operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicLength {
    /// No MIC: encryption only.
    None,
    Mic4,
    Mic8,
    Mic16,
}

impl MicLength {
    /// The number of MIC octets appended to the ciphertext.
    pub fn bytes(self) -> usize {
        match self {
            MicLength::None => 0,
            MicLength::Mic4 => 4,
            MicLength::Mic8 => 8,
            MicLength::Mic16 => 16,
        }
    }
}

/// Encrypt `payload`, returning the ciphertext with the MIC appended.
///
/// The AAD is authenticated but not encrypted; with [`MicLength::None`] it
/// is ignored entirely.
pub fn encrypt(
    key: &[u8; 16],
    nonce: &[u8; 13],
    aad: &[u8],
    payload: &[u8],
    mic: MicLength,
) -> Vec<u8> {
    let nonce = GenericArray::from_slice(nonce);
    let payload = Payload { msg: payload, aad };

    // CCM encryption only fails when the payload overflows the two-octet
    // length field, which a 16-bit length cannot.
    match mic {
        MicLength::None => ctr_keystream(key, nonce.as_slice(), payload.msg),
        MicLength::Mic4 => Ccm4::new(key.into())
            .encrypt(nonce, payload)
            .expect("payload fits the CCM length field"),
        MicLength::Mic8 => Ccm8::new(key.into())
            .encrypt(nonce, payload)
            .expect("payload fits the CCM length field"),
        MicLength::Mic16 => Ccm16::new(key.into())
            .encrypt(nonce, payload)
            .expect("payload fits the CCM length field"),
    }
}

/// Decrypt `ciphertext` (with its MIC appended) and verify the MIC.
///
/// # Errors
///
/// [`CryptoError::InvalidMic`] when the MIC does not verify, and
/// [`CryptoError::TruncatedCiphertext`] when the input is shorter than the
/// MIC it is supposed to carry.
pub fn decrypt(
    key: &[u8; 16],
    nonce: &[u8; 13],
    aad: &[u8],
    ciphertext: &[u8],
    mic: MicLength,
) -> Result<Vec<u8>, CryptoError> {
    if ciphertext.len() < mic.bytes() {
        return Err(CryptoError::TruncatedCiphertext);
    }

    let nonce = GenericArray::from_slice(nonce);
    let payload = Payload {
        msg: ciphertext,
        aad,
    };

    match mic {
        MicLength::None => Ok(ctr_keystream(key, nonce.as_slice(), payload.msg)),
        MicLength::Mic4 => Ccm4::new(key.into())
            .decrypt(nonce, payload)
            .map_err(|_| CryptoError::InvalidMic),
        MicLength::Mic8 => Ccm8::new(key.into())
            .decrypt(nonce, payload)
            .map_err(|_| CryptoError::InvalidMic),
        MicLength::Mic16 => Ccm16::new(key.into())
            .decrypt(nonce, payload)
            .map_err(|_| CryptoError::InvalidMic),
    }
}

/// XOR `data` with the CTR keystream over the CCM counter blocks: flags
/// octet 0x01 (two counter octets), the 13-byte nonce, then the block
/// counter starting at 1, where the payload starts.
fn ctr_keystream(key: &[u8; 16], nonce: &[u8], data: &[u8]) -> Vec<u8> {
    let mut iv = [0u8; 16];
    iv[0] = 0x01;
    iv[1..14].copy_from_slice(nonce);
    iv[15] = 0x01;

    let mut out = data.to_vec();
    let mut cipher = Aes128Ctr::new(key.into(), &iv.into());
    cipher.apply_keystream(&mut out);
    out
}
