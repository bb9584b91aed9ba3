use thiserror::Error;

/// Failure of a single encrypt or decrypt call. None of these are retried.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key/IV generation or the cipher itself failed; no blob was produced.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// The metadata record is malformed (bad base64, wrong key or IV length).
    #[error("invalid encryption metadata: {0}")]
    Metadata(String),

    /// Tag verification or any other cipher-level rejection.
    #[error("decryption failed: invalid key or corrupted data")]
    Decryption,
}

impl CryptoError {
    pub fn is_decryption(&self) -> bool {
        matches!(self, CryptoError::Decryption)
    }

    pub fn is_metadata(&self) -> bool {
        matches!(self, CryptoError::Metadata(_))
    }
}
