//! schat_crypto — cryptographic primitives for the secure chat session
//!
//! # Design principles
//! - NO custom crypto; all primitives come from audited Rust crates
//!   (`p256`, `aes-gcm`, `hkdf`).
//! - Zeroize all secret material on drop.
//! - `CryptoCapability` enforces key lifetime discipline: each kind of key
//!   material may be installed at most once until `wipe_keys()` resets it.
//!
//! # Module layout
//! - `ecdh`       — P-256 ephemeral keypairs, SPKI import/export
//! - `aead`       — AES-256-GCM encrypt/decrypt
//! - `kdf`        — HKDF-SHA256 session key derivation
//! - `codec`      — base64 / UTF-8 helpers
//! - `capability` — `CryptoCapability`, the per-session facade over the above
//! - `error`      — unified error type

pub mod aead;
pub mod capability;
pub mod codec;
pub mod ecdh;
pub mod error;
pub mod kdf;

pub use capability::CryptoCapability;
pub use ecdh::{OwnKeyPair, PeerPublicKey};
pub use error::CryptoError;
