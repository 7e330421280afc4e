//! Envelope encryption of secret payloads.
//!
//! The session key is derived once per login with Argon2id and used with
//! AES-256-GCM. Every `encrypt` call draws a fresh 12-byte nonce and
//! prepends it:
//!   [ 12-byte nonce | ciphertext + 16-byte auth tag ]

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// Argon2id cost: 19 MiB, 2 passes, 1 lane
const MEMORY_KIB: u32 = 19 * 1024;
const ITERATIONS: u32 = 2;
const PARALLELISM: u32 = 1;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("decryption failed (wrong key or corrupted data)")]
    Decryption,
}

/// 32-byte AES key, wiped from memory when dropped
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey([u8; KEY_LEN]);

impl SessionKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionKey(***)")
    }
}

/// Salt string fed to Argon2; always longer than its 8-byte minimum
fn salt_for(salt: u64) -> String {
    format!("keeper-session:{}", salt)
}

/// Deterministic: the same password and salt always yield the same key
pub fn derive_key(password: &str, salt: u64) -> Result<SessionKey, CryptoError> {
    let params = Params::new(MEMORY_KIB, ITERATIONS, PARALLELISM, Some(KEY_LEN))
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = [0u8; KEY_LEN];
    argon2
        .hash_password_into(password.as_bytes(), salt_for(salt).as_bytes(), &mut key)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    let session_key = SessionKey(key);
    key.zeroize();
    Ok(session_key)
}

pub fn encrypt(plaintext: &[u8], key: &SessionKey) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| CryptoError::Encryption(format!("invalid key length: {e}")))?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    let mut output = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    output.extend_from_slice(&nonce);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

pub fn decrypt(ciphertext: &[u8], key: &SessionKey) -> Result<Vec<u8>, CryptoError> {
    if ciphertext.len() < NONCE_LEN {
        return Err(CryptoError::Decryption);
    }

    let (nonce_bytes, body) = ciphertext.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| CryptoError::Decryption)?;

    cipher
        .decrypt(nonce, body)
        .map_err(|_| CryptoError::Decryption)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_key_is_deterministic() {
        let a = derive_key("hunter2", 42).unwrap();
        let b = derive_key("hunter2", 42).unwrap();
        let other_salt = derive_key("hunter2", 43).unwrap();
        let other_password = derive_key("hunter3", 42).unwrap();

        assert_eq!(a.as_bytes(), b.as_bytes());
        assert_ne!(a.as_bytes(), other_salt.as_bytes());
        assert_ne!(a.as_bytes(), other_password.as_bytes());
    }

    #[test]
    fn test_encrypt_decrypt() {
        let key = derive_key("pw", 1).unwrap();
        let sealed = encrypt(b"top secret", &key).unwrap();

        assert_eq!(sealed.len(), NONCE_LEN + b"top secret".len() + 16);
        assert_eq!(decrypt(&sealed, &key).unwrap(), b"top secret");
    }

    #[test]
    fn test_fresh_nonce_per_call() {
        let key = derive_key("pw", 1).unwrap();
        let a = encrypt(b"same", &key).unwrap();
        let b = encrypt(b"same", &key).unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_key_is_rejected() {
        let key = derive_key("pw", 1).unwrap();
        let wrong = derive_key("pw", 2).unwrap();
        let sealed = encrypt(b"top secret", &key).unwrap();

        assert!(matches!(decrypt(&sealed, &wrong), Err(CryptoError::Decryption)));
    }

    #[test]
    fn test_short_or_tampered_input_is_rejected() {
        let key = derive_key("pw", 1).unwrap();
        assert!(matches!(decrypt(&[0u8; 5], &key), Err(CryptoError::Decryption)));

        let mut sealed = encrypt(b"top secret", &key).unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0xff;
        assert!(matches!(decrypt(&sealed, &key), Err(CryptoError::Decryption)));
    }

    #[test]
    fn test_debug_hides_key() {
        let key = derive_key("pw", 1).unwrap();
        assert_eq!(format!("{:?}", key), "SessionKey(***)");
    }
}
