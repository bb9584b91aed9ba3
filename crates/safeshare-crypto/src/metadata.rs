//! Encryption metadata record
//!
//! The record that travels beside every encrypted blob:
//! ```json
//! {"iv": [16 integers 0-255], "key": "<base64 of the 32-byte key>"}
//! ```
//! Uploads send exactly this shape as the `encryption_metadata` form field.
//! Locally stored records may also carry `originalName`, which is the
//! authoritative name for the decrypted file.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;
use crate::keys::{FileKey, InitVector};
use crate::{IV_SIZE, KEY_SIZE};

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionMetadata {
    pub iv: Vec<u8>,
    pub key: String,
    #[serde(
        rename = "originalName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub original_name: Option<String>,
}

/// Exact upload wire shape: no name, no extra fields.
#[derive(Serialize)]
struct WireMetadata<'a> {
    iv: &'a [u8],
    key: &'a str,
}

impl EncryptionMetadata {
    pub(crate) fn from_parts(
        key: &FileKey,
        iv: &InitVector,
        original_name: Option<String>,
    ) -> Self {
        Self {
            iv: iv.as_bytes().to_vec(),
            key: STANDARD.encode(key.as_bytes()),
            original_name,
        }
    }

    /// Decode the base64 key. Fails unless it decodes to exactly 32 bytes.
    pub fn file_key(&self) -> Result<FileKey, CryptoError> {
        let mut decoded = STANDARD
            .decode(self.key.trim())
            .map_err(|e| CryptoError::Metadata(format!("key is not valid base64: {e}")))?;

        if decoded.len() != KEY_SIZE {
            let len = decoded.len();
            decoded.zeroize();
            return Err(CryptoError::Metadata(format!(
                "key has wrong size: {len} bytes (expected {KEY_SIZE})"
            )));
        }

        let mut bytes = [0u8; KEY_SIZE];
        bytes.copy_from_slice(&decoded);
        decoded.zeroize();
        Ok(FileKey::from_bytes(bytes))
    }

    /// Rebuild the IV. Fails unless the array holds exactly 16 bytes.
    pub fn init_vector(&self) -> Result<InitVector, CryptoError> {
        let bytes: [u8; IV_SIZE] = self.iv.as_slice().try_into().map_err(|_| {
            CryptoError::Metadata(format!(
                "IV has wrong length: {} bytes (expected {IV_SIZE})",
                self.iv.len()
            ))
        })?;
        Ok(InitVector::from_bytes(bytes))
    }

    /// Check both the key and IV without keeping the decoded key around.
    pub fn validate(&self) -> Result<(), CryptoError> {
        self.init_vector()?;
        self.file_key().map(drop)
    }

    /// Serialize the `{iv, key}` upload form.
    pub fn to_wire_json(&self) -> Result<String, CryptoError> {
        serde_json::to_string(&WireMetadata {
            iv: &self.iv,
            key: &self.key,
        })
        .map_err(|e| CryptoError::Metadata(format!("serializing metadata: {e}")))
    }

    /// Serialize the full record, including `originalName` when known.
    pub fn to_json_pretty(&self) -> Result<String, CryptoError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CryptoError::Metadata(format!("serializing metadata: {e}")))
    }

    pub fn from_json(data: &str) -> Result<Self, CryptoError> {
        serde_json::from_str(data)
            .map_err(|e| CryptoError::Metadata(format!("parsing metadata: {e}")))
    }

    pub fn from_json_slice(data: &[u8]) -> Result<Self, CryptoError> {
        serde_json::from_slice(data)
            .map_err(|e| CryptoError::Metadata(format!("parsing metadata: {e}")))
    }
}

impl std::fmt::Debug for EncryptionMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionMetadata")
            .field("iv", &self.iv)
            .field("key", &"[REDACTED]")
            .field("original_name", &self.original_name)
            .finish()
    }
}
