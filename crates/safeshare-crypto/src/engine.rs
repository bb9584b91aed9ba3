//! Encryption and decryption engines
//!
//! `encrypt` and `decrypt` are plain functions over in-memory buffers. The
//! async `encrypt_file` / `decrypt_file` wrappers move their inputs onto the
//! blocking pool so large payloads do not stall the runtime; each call owns
//! its key material and nothing outlives the call.

use tracing::debug;

use crate::cipher;
use crate::error::CryptoError;
use crate::keys::{generate_file_key, generate_iv};
use crate::metadata::EncryptionMetadata;
use crate::TAG_SIZE;

/// A user-selected file, held entirely in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaintextFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl PlaintextFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }
}

/// Ciphertext plus the (non-secret) media type of the original file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedBlob {
    /// `[ciphertext][16-byte tag]`
    pub ciphertext: Vec<u8>,
    pub media_type: String,
}

impl EncryptedBlob {
    pub fn new(ciphertext: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self {
            ciphertext,
            media_type: media_type.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.ciphertext.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ciphertext.is_empty()
    }

    /// Size of the plaintext this blob decrypts to.
    pub fn plaintext_len(&self) -> usize {
        self.ciphertext.len().saturating_sub(TAG_SIZE)
    }
}

/// Reconstructed file contents, ready to be saved locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

/// Encrypt `file` under a fresh key and IV.
///
/// The returned metadata carries the base64 key, the IV, and the original
/// file name. On failure nothing is returned.
pub fn encrypt(file: &PlaintextFile) -> Result<(EncryptedBlob, EncryptionMetadata), CryptoError> {
    let key = generate_file_key()?;
    let iv = generate_iv()?;

    let ciphertext = cipher::seal(&key, &iv, &file.bytes)?;
    let metadata = EncryptionMetadata::from_parts(&key, &iv, Some(file.name.clone()));

    debug!(
        name = %file.name,
        plaintext_bytes = file.bytes.len(),
        ciphertext_bytes = ciphertext.len(),
        "encrypted file"
    );

    Ok((EncryptedBlob::new(ciphertext, file.media_type.clone()), metadata))
}

/// Decrypt `blob` with `metadata`, naming the result `target_name`.
///
/// Metadata is validated before any cipher call. Every cipher-level failure
/// collapses to [`CryptoError::Decryption`].
pub fn decrypt(
    blob: &EncryptedBlob,
    metadata: &EncryptionMetadata,
    target_name: &str,
) -> Result<DecryptedFile, CryptoError> {
    let key = metadata.file_key()?;
    let iv = metadata.init_vector()?;

    let bytes = cipher::open(&key, &iv, &blob.ciphertext)?;

    debug!(
        name = %target_name,
        ciphertext_bytes = blob.ciphertext.len(),
        plaintext_bytes = bytes.len(),
        "decrypted file"
    );

    Ok(DecryptedFile {
        name: target_name.to_string(),
        media_type: blob.media_type.clone(),
        bytes,
    })
}

/// [`encrypt`] on the blocking pool.
pub async fn encrypt_file(
    file: PlaintextFile,
) -> Result<(EncryptedBlob, EncryptionMetadata), CryptoError> {
    tokio::task::spawn_blocking(move || encrypt(&file))
        .await
        .map_err(|e| CryptoError::Encryption(format!("encryption task failed: {e}")))?
}

/// [`decrypt`] on the blocking pool.
pub async fn decrypt_file(
    blob: EncryptedBlob,
    metadata: EncryptionMetadata,
    target_name: String,
) -> Result<DecryptedFile, CryptoError> {
    tokio::task::spawn_blocking(move || decrypt(&blob, &metadata, &target_name))
        .await
        .map_err(|_| CryptoError::Decryption)?
}
