//! Encryption service for blob payloads (client-side encryption at rest)

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose, Engine as _};

use crate::error::{Error, Result};

const NONCE_LEN: usize = 12;

/// Encrypts and decrypts blob payloads with AES-256-GCM.
///
/// The wire format is `nonce (12 bytes) || ciphertext`; a fresh random nonce
/// is generated per payload. Decrypting with the wrong key fails
/// authentication and surfaces as [`Error::Encryption`].
#[derive(Clone)]
pub struct EncryptionService {
    cipher: Aes256Gcm,
}

impl EncryptionService {
    /// Create a new encryption service from a raw 32-byte key.
    pub fn from_key_bytes(key_bytes: &[u8]) -> Result<Self> {
        if key_bytes.len() != 32 {
            return Err(Error::Encryption(
                "Encryption key must be 32 bytes (256 bits)".to_string(),
            ));
        }
        let key = Key::<Aes256Gcm>::from_slice(key_bytes);
        Ok(Self {
            cipher: Aes256Gcm::new(key),
        })
    }

    /// Create a new encryption service from a base64-encoded 32-byte key.
    pub fn from_base64_key(encoded: &str) -> Result<Self> {
        let key_bytes = general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| Error::Encryption(format!("Failed to decode encryption key: {}", e)))?;
        Self::from_key_bytes(&key_bytes)
    }

    /// Encrypt a payload. Output is nonce-prefixed ciphertext.
    pub fn encrypt_bytes(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|e| Error::Encryption(format!("Encryption failed: {}", e)))?;

        let mut combined = nonce.to_vec();
        combined.extend_from_slice(&ciphertext);
        Ok(combined)
    }

    /// Decrypt a nonce-prefixed payload produced by [`encrypt_bytes`].
    ///
    /// [`encrypt_bytes`]: EncryptionService::encrypt_bytes
    pub fn decrypt_bytes(&self, combined: &[u8]) -> Result<Vec<u8>> {
        if combined.len() < NONCE_LEN {
            return Err(Error::Encryption("Encrypted data too short".to_string()));
        }

        let nonce = Nonce::from_slice(&combined[..NONCE_LEN]);
        let ciphertext = &combined[NONCE_LEN..];

        self.cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| Error::Encryption(format!("Decryption failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> EncryptionService {
        let test_key = b"01234567890123456789012345678901";
        EncryptionService::from_key_bytes(test_key).unwrap()
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let service = test_service();
        let plaintext = b"payload bytes \x00\x01\x02";

        let encrypted = service.encrypt_bytes(plaintext).unwrap();
        assert_ne!(&encrypted[NONCE_LEN..], plaintext.as_slice());

        let decrypted = service.decrypt_bytes(&encrypted).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_nonce_is_unique_per_payload() {
        let service = test_service();
        let a = service.encrypt_bytes(b"same input").unwrap();
        let b = service.encrypt_bytes(b"same input").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_key_fails() {
        let service = test_service();
        let other = EncryptionService::from_key_bytes(b"10987654321098765432109876543210").unwrap();

        let encrypted = service.encrypt_bytes(b"secret").unwrap();
        assert!(matches!(
            other.decrypt_bytes(&encrypted),
            Err(Error::Encryption(_))
        ));
    }

    #[test]
    fn test_truncated_payload_rejected() {
        let service = test_service();
        assert!(matches!(
            service.decrypt_bytes(&[0u8; 4]),
            Err(Error::Encryption(_))
        ));
    }

    #[test]
    fn test_key_length_enforced() {
        assert!(EncryptionService::from_key_bytes(b"short").is_err());
    }

    #[test]
    fn test_base64_key() {
        use base64::{engine::general_purpose, Engine as _};
        let encoded = general_purpose::STANDARD.encode(b"01234567890123456789012345678901");
        let service = EncryptionService::from_base64_key(&encoded).unwrap();
        let encrypted = service.encrypt_bytes(b"data").unwrap();
        assert_eq!(service.decrypt_bytes(&encrypted).unwrap(), b"data");
    }
}
