//! Whole-payload AES-256-GCM with a 16-byte IV
//!
//! Output layout matches WebCrypto's `AES-GCM`:
//! ```text
//! [N bytes: ciphertext][16 bytes: GCM tag]
//! ```
//! The IV is not part of the output; it travels in the metadata record.
//! With a 16-byte IV the initial counter block is derived through GHASH
//! (NIST SP 800-38D), the same as browsers do for a 16-byte `iv`.

use aes_gcm::{
    aead::{consts::U16, Aead, KeyInit},
    aes::Aes256,
    AesGcm, Nonce,
};

use crate::error::CryptoError;
use crate::keys::{FileKey, InitVector};
use crate::TAG_SIZE;

type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// Encrypt `plaintext` under `key`/`iv`.
///
/// Returns `[ciphertext][16-byte tag]`.
pub fn seal(key: &FileKey, iv: &InitVector, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256Gcm16::new(key.as_bytes().into());
    cipher
        .encrypt(Nonce::<U16>::from_slice(iv.as_bytes()), plaintext)
        .map_err(|e| CryptoError::Encryption(format!("cipher operation failed: {e}")))
}

/// Decrypt and authenticate `[ciphertext][16-byte tag]`.
pub fn open(key: &FileKey, iv: &InitVector, sealed: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if sealed.len() < TAG_SIZE {
        return Err(CryptoError::Decryption);
    }
    let cipher = Aes256Gcm16::new(key.as_bytes().into());
    cipher
        .decrypt(Nonce::<U16>::from_slice(iv.as_bytes()), sealed)
        .map_err(|_| CryptoError::Decryption)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{generate_file_key, generate_iv};
    use crate::KEY_SIZE;

    #[test]
    fn test_seal_open_roundtrip() {
        let key = generate_file_key().unwrap();
        let iv = generate_iv().unwrap();
        let plaintext = b"hello, encrypted world!";

        let sealed = seal(&key, &iv, plaintext).unwrap();
        let opened = open(&key, &iv, &sealed).unwrap();

        assert_eq!(&opened, plaintext);
    }

    #[test]
    fn test_sealed_size() {
        let key = generate_file_key().unwrap();
        let iv = generate_iv().unwrap();

        let sealed = seal(&key, &iv, &[0u8; 1000]).unwrap();

        // plaintext (1000) + tag (16), no IV prefix
        assert_eq!(sealed.len(), 1000 + TAG_SIZE);
    }

    #[test]
    fn test_open_wrong_iv() {
        let key = generate_file_key().unwrap();
        let iv = generate_iv().unwrap();
        let other_iv = generate_iv().unwrap();

        let sealed = seal(&key, &iv, b"secret data").unwrap();
        let result = open(&key, &other_iv, &sealed);

        assert!(matches!(result, Err(CryptoError::Decryption)));
    }

    #[test]
    fn test_open_truncated_below_tag() {
        let key = generate_file_key().unwrap();
        let iv = generate_iv().unwrap();

        let result = open(&key, &iv, &[0u8; TAG_SIZE - 1]);
        assert!(matches!(result, Err(CryptoError::Decryption)));
    }

    #[test]
    fn test_tampered_tag() {
        let key = generate_file_key().unwrap();
        let iv = generate_iv().unwrap();

        let mut sealed = seal(&key, &iv, b"secret data").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;

        assert!(open(&key, &iv, &sealed).is_err(), "tampered tag must fail");
    }

    #[test]
    fn test_deterministic_for_fixed_key_and_iv() {
        let key = FileKey::from_bytes([0x42; KEY_SIZE]);
        let iv = InitVector::from_bytes([0x24; 16]);

        let a = seal(&key, &iv, b"same input").unwrap();
        let b = seal(&key, &iv, b"same input").unwrap();
        assert_eq!(a, b);
    }
}
