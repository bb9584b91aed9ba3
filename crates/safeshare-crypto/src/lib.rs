//! safeshare-crypto: client-side file encryption for safeshare
//!
//! Every file gets its own AES-256-GCM key and 16-byte IV. The ciphertext goes
//! to the backend as an opaque blob; the key and IV travel beside it as an
//! [`EncryptionMetadata`] record and are never embedded in the blob.
//!
//! ```text
//! PlaintextFile ──encrypt──▶ EncryptedBlob   (ciphertext || 16-byte tag, media type)
//!                      └───▶ EncryptionMetadata { iv: [u8; 16], key: base64 }
//!
//! EncryptedBlob + EncryptionMetadata ──decrypt──▶ DecryptedFile
//! ```
//!
//! There is no key store: each call generates or receives its own key, and
//! key material is zeroized when dropped.

pub mod cipher;
pub mod engine;
pub mod error;
pub mod keys;
pub mod metadata;

pub use engine::{
    decrypt, decrypt_file, encrypt, encrypt_file, DecryptedFile, EncryptedBlob, PlaintextFile,
};
pub use error::CryptoError;
pub use keys::{generate_file_key, generate_iv, FileKey, InitVector};
pub use metadata::EncryptionMetadata;

/// Size of a file key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of the AES-GCM initialization vector used for files
pub const IV_SIZE: usize = 16;

/// Size of the GCM authentication tag
pub const TAG_SIZE: usize = 16;
