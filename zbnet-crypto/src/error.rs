/// An error from a CCM* operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoError {
    /// The MIC did not verify: the frame is corrupt or forged, or the wrong
    /// key was used.
    InvalidMic,
    /// The ciphertext is shorter than its MIC.
    TruncatedCiphertext,
}

impl core::fmt::Display for CryptoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CryptoError::InvalidMic => write!(f, "MIC verification failed"),
            CryptoError::TruncatedCiphertext => write!(f, "ciphertext shorter than its MIC"),
        }
    }
}

impl std::error::Error for CryptoError {}
