//! AES-256-GCM encryption for the session data plane.
//!
//! Wire format keeps the IV (nonce) out of band from the ciphertext (spec §6
//! sends `iv` and `encryptedChallenge`/`data` as separate base64 fields), so
//! unlike the teacher's `dl_crypto::aead` (which prepends the nonce), `encrypt`
//! here returns `(iv, ciphertext)` and `decrypt` takes them back apart.
//!
//! Nonce: 96 bits, fresh random bytes per call — never reused with the same
//! key (spec §4.2).  Tag: 128 bits, appended by the `aes-gcm` crate.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::CryptoError;

pub const IV_LEN: usize = 12;

pub fn encrypt(key: &[u8; 32], plaintext: &[u8]) -> Result<([u8; IV_LEN], Vec<u8>), CryptoError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));

    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);

    let nonce = Nonce::from_slice(&iv);
    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| CryptoError::AeadEncrypt)?;

    Ok((iv, ciphertext))
}

pub fn decrypt(key: &[u8; 32], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if iv.len() != IV_LEN {
        return Err(CryptoError::AeadDecrypt);
    }
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Nonce::from_slice(iv);
    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| CryptoError::AeadDecrypt)
}

/// `len` bytes of OS randomness — used for the key-confirmation challenge
/// (spec §6: "32 bytes of cryptographically secure randomness"). Exposed
/// here rather than pulling `rand` into `schat_session` directly, keeping
/// every randomness source behind the crypto capability.
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    OsRng.fill_bytes(&mut buf);
    buf
}
