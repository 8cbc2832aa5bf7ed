//! Per-session configuration — replaces the "global mutable `config.DEBUG`"
//! smell noted in spec §9 with an explicit, injectable struct, shaped after
//! `GuardSettings`'s struct-with-`Default`-impl pattern in the teacher's
//! `guard-v2/crates/guard-core/src/settings.rs`.

use serde::{Deserialize, Serialize};

use schat_proto::validate::{MAX_ENCRYPTED_DATA_LENGTH, MAX_IV_LENGTH, MAX_PUBLIC_KEY_LENGTH};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizeCaps {
    pub max_public_key_length: usize,
    pub max_iv_length: usize,
    pub max_encrypted_data_length: usize,
}

impl Default for SizeCaps {
    fn default() -> Self {
        Self {
            max_public_key_length: MAX_PUBLIC_KEY_LENGTH,
            max_iv_length: MAX_IV_LENGTH,
            max_encrypted_data_length: MAX_ENCRYPTED_DATA_LENGTH,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub size_caps: SizeCaps,
    /// Length of the responder's key-confirmation challenge, in bytes —
    /// spec §6 fixes this at 32.
    pub challenge_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            size_caps: SizeCaps::default(),
            challenge_len: 32,
        }
    }
}
