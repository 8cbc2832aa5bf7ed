//! HKDF-SHA256 key derivation — the shared-secret-to-session-key step.
//!
//! Mirrors `dl_crypto::kdf::hkdf_expand`'s shape; the session key is the only
//! thing derived here (no ratchet chain — forward secrecy beyond per-session
//! ephemerality is a non-goal).

use hkdf::Hkdf;
use sha2::Sha256;

use crate::error::CryptoError;

/// Fixed info string binding the derived key to this protocol. §9 Open
/// Question resolved: empty salt, fixed info, single HKDF-Expand call — see
/// DESIGN.md.
const SESSION_KEY_INFO: &[u8] = b"schat-session-key-v1";

/// Derive a 256-bit AES-GCM key from the raw ECDH shared secret.
pub fn derive_session_key(shared_secret: &[u8]) -> Result<[u8; 32], CryptoError> {
    let hk = Hkdf::<Sha256>::new(None, shared_secret);
    let mut key = [0u8; 32];
    hk.expand(SESSION_KEY_INFO, &mut key)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    Ok(key)
}
