//! Per-file key and IV generation

use rand::{rngs::OsRng, RngCore};
use zeroize::Zeroize;

use crate::error::CryptoError;
use crate::{IV_SIZE, KEY_SIZE};

/// A per-file 256-bit AES-GCM key. Zeroized on drop.
///
/// The raw bytes never leave this crate except base64-encoded inside
/// [`EncryptionMetadata`](crate::EncryptionMetadata).
pub struct FileKey {
    bytes: [u8; KEY_SIZE],
}

impl FileKey {
    pub(crate) fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for FileKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for FileKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// A 16-byte AES-GCM initialization vector. Not secret, but never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitVector([u8; IV_SIZE]);

impl InitVector {
    pub fn from_bytes(bytes: [u8; IV_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; IV_SIZE] {
        &self.0
    }
}

/// Generate a random 256-bit file key from the OS CSPRNG.
pub fn generate_file_key() -> Result<FileKey, CryptoError> {
    let mut bytes = [0u8; KEY_SIZE];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| CryptoError::Encryption(format!("key generation failed: {e}")))?;
    Ok(FileKey::from_bytes(bytes))
}

/// Generate a random 16-byte IV from the OS CSPRNG.
pub fn generate_iv() -> Result<InitVector, CryptoError> {
    let mut bytes = [0u8; IV_SIZE];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| CryptoError::Encryption(format!("IV generation failed: {e}")))?;
    Ok(InitVector(bytes))
}
