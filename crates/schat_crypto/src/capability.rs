//! `CryptoCapability` — the per-session owner of ephemeral key material.
//!
//! Mirrors the teacher's `dl_crypto::session::Session` in spirit (a struct
//! that owns root/chain key material and zeroizes on drop) but scoped to
//! exactly what spec §4.2 names: one ECDH keypair, one imported peer key, one
//! derived AEAD key, with a strict lifetime discipline enforced by `Option`
//! state rather than by convention.

use zeroize::Zeroize;

use crate::ecdh::{self, OwnKeyPair, PeerPublicKey};
use crate::error::CryptoError;
use crate::{aead, kdf};

pub struct CryptoCapability {
    own_keys: Option<OwnKeyPair>,
    peer_public_key: Option<PeerPublicKey>,
    session_key: Option<[u8; 32]>,
}

impl Default for CryptoCapability {
    fn default() -> Self {
        Self::new()
    }
}

impl CryptoCapability {
    pub fn new() -> Self {
        Self {
            own_keys: None,
            peer_public_key: None,
            session_key: None,
        }
    }

    /// Generate a fresh ephemeral P-256 keypair. Callable again after
    /// `wipe_keys()` — spec §4.2's key lifetime invariant.
    pub fn generate_ecdh_keypair(&mut self) {
        self.own_keys = Some(OwnKeyPair::generate());
    }

    pub fn export_own_public_key(&self) -> Result<String, CryptoError> {
        self.own_keys
            .as_ref()
            .ok_or(CryptoError::NotReady)?
            .export_public_key()
    }

    /// Import and store the peer's public key. Spec invariant 3: this may
    /// only succeed once per capability lifetime (until a `wipe_keys()` reset).
    pub fn import_peer_public_key(&mut self, b64: &str) -> Result<(), CryptoError> {
        if self.peer_public_key.is_some() {
            return Err(CryptoError::KeyGeneration(
                "peer public key already imported for this session".into(),
            ));
        }
        self.peer_public_key = Some(ecdh::import_peer_public_key(b64)?);
        Ok(())
    }

    pub fn has_peer_public_key(&self) -> bool {
        self.peer_public_key.is_some()
    }

    /// Run the ECDH step. Does not install a session key by itself — see
    /// `derive_session_key`, kept as a separate step so the FSM can record an
    /// in-flight marker before either runs (spec §4.3).
    pub fn derive_shared_secret(&self) -> Result<Vec<u8>, CryptoError> {
        let own = self.own_keys.as_ref().ok_or(CryptoError::NotReady)?;
        let peer = self.peer_public_key.as_ref().ok_or(CryptoError::NotReady)?;
        let shared = own.diffie_hellman(peer);
        Ok(shared.raw_secret_bytes().to_vec())
    }

    /// Install the derived AES-256-GCM session key. Fails if one is already
    /// installed (spec §4.2: "idempotent per session — must fail if already
    /// installed").
    pub fn derive_session_key(&mut self, shared_secret: &[u8]) -> Result<(), CryptoError> {
        if self.session_key.is_some() {
            return Err(CryptoError::AlreadyDerived);
        }
        self.session_key = Some(kdf::derive_session_key(shared_secret)?);
        Ok(())
    }

    pub fn has_session_key(&self) -> bool {
        self.session_key.is_some()
    }

    /// `len` bytes of fresh OS randomness, for the caller's own use (spec
    /// §6's 32-byte key-confirmation challenge). Does not touch any key
    /// material, so it is available regardless of lifecycle state.
    pub fn generate_challenge(&self, len: usize) -> Vec<u8> {
        aead::random_bytes(len)
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<(Vec<u8>, Vec<u8>), CryptoError> {
        let key = self.session_key.as_ref().ok_or(CryptoError::NotReady)?;
        let (iv, ciphertext) = aead::encrypt(key, plaintext)?;
        Ok((iv.to_vec(), ciphertext))
    }

    pub fn decrypt(&self, ciphertext: &[u8], iv: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let key = self.session_key.as_ref().ok_or(CryptoError::NotReady)?;
        aead::decrypt(key, iv, ciphertext)
    }

    /// Zeroize all key material. Idempotent. After this call,
    /// `generate_ecdh_keypair()` may be called again to start a fresh
    /// handshake — all other operations fail with `CryptoError::NotReady`
    /// until then.
    pub fn wipe_keys(&mut self) {
        self.own_keys = None; // OwnKeyPair's ZeroizeOnDrop handles the secret
        self.peer_public_key = None;
        if let Some(mut key) = self.session_key.take() {
            key.zeroize();
        }
    }
}
