//! Ephemeral ECDH over P-256.
//!
//! Public keys travel on the wire as base64-encoded DER SubjectPublicKeyInfo
//! (SPKI), matching spec §6's "base64-SPKI-P256". We also accept a raw SEC1
//! point on import (uncompressed, 65 bytes) so peers that skip the SPKI
//! wrapper still interoperate — the decode tries SPKI first, then SEC1.

use base64::{engine::general_purpose::STANDARD, Engine};
use p256::ecdh::{EphemeralSecret, SharedSecret};
use p256::elliptic_curve::sec1::FromEncodedPoint;
use p256::pkcs8::{DecodePublicKey, EncodePublicKey};
use p256::{EncodedPoint, PublicKey};
use rand_core::OsRng;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;

/// Our half of an in-progress ECDH exchange. Zeroized on drop.
#[derive(ZeroizeOnDrop)]
pub struct OwnKeyPair {
    #[zeroize(skip)]
    public: PublicKey,
    secret: EphemeralSecret,
}

impl OwnKeyPair {
    pub fn generate() -> Self {
        let secret = EphemeralSecret::random(&mut OsRng);
        let public = secret.public_key();
        Self { public, secret }
    }

    /// DER SPKI, base64-encoded — the wire form of `publicKey`.
    pub fn export_public_key(&self) -> Result<String, CryptoError> {
        let der = self
            .public
            .to_public_key_der()
            .map_err(|e| CryptoError::KeyGeneration(format!("SPKI encode failed: {e}")))?;
        Ok(STANDARD.encode(der.as_bytes()))
    }

    pub fn diffie_hellman(&self, peer: &PeerPublicKey) -> SharedSecret {
        self.secret.diffie_hellman(&peer.0)
    }
}

/// An imported, validated peer P-256 public key.
pub struct PeerPublicKey(PublicKey);

/// Decode a base64 `publicKey` wire field into a validated P-256 point.
///
/// Tries DER SPKI first (the spec-mandated encoding), then falls back to a
/// raw uncompressed SEC1 point for interop with peers that send the bare
/// point.
pub fn import_peer_public_key(b64: &str) -> Result<PeerPublicKey, CryptoError> {
    let raw = STANDARD
        .decode(b64.trim())
        .map_err(CryptoError::Base64Decode)?;

    if let Ok(pk) = PublicKey::from_public_key_der(&raw) {
        return Ok(PeerPublicKey(pk));
    }

    let point = EncodedPoint::from_bytes(&raw)
        .map_err(|_| CryptoError::InvalidKey("malformed P-256 public key bytes".into()))?;
    let pk = Option::<PublicKey>::from(PublicKey::from_encoded_point(&point))
        .ok_or_else(|| CryptoError::InvalidKey("point is not on the P-256 curve".into()))?;
    Ok(PeerPublicKey(pk))
}

impl Drop for PeerPublicKey {
    fn drop(&mut self) {
        // The public key itself isn't secret, but we clear the encoded form
        // defensively in case a future refactor adds secret-derived caching.
        let mut encoded = self.0.to_encoded_point(false).as_bytes().to_vec();
        encoded.zeroize();
    }
}
