//! Pre-crypto shape and size validation (spec §6, invariant 6: size caps are
//! enforced before any cryptographic work).

use crate::error::ProtoError;
use crate::message::{
    ChatPayload, KeyConfirmationChallengePayload, KeyConfirmationResponsePayload, PublicKeyPayload,
};

/// Base64 character caps, not raw byte caps — spec §6 states both caps in
/// base64 chars.
pub const MAX_PUBLIC_KEY_LENGTH: usize = 512;
pub const MAX_IV_LENGTH: usize = 32;
pub const MAX_ENCRYPTED_DATA_LENGTH: usize = 131_072;

fn check_len(field: &str, value: &str, max: usize) -> Result<(), ProtoError> {
    if value.is_empty() {
        return Err(ProtoError::ValidationFailure(format!(
            "{field} must not be empty"
        )));
    }
    if value.len() > max {
        return Err(ProtoError::ValidationFailure(format!(
            "{field} is an excessively large public key or field ({} chars, max {max})",
            value.len()
        )));
    }
    Ok(())
}

pub fn validate_public_key_payload(p: &PublicKeyPayload) -> Result<(), ProtoError> {
    check_len("publicKey", &p.public_key, MAX_PUBLIC_KEY_LENGTH)
}

pub fn validate_challenge_payload(
    p: &KeyConfirmationChallengePayload,
) -> Result<(), ProtoError> {
    check_len("iv", &p.iv, MAX_IV_LENGTH)?;
    check_len(
        "encryptedChallenge",
        &p.encrypted_challenge,
        MAX_ENCRYPTED_DATA_LENGTH,
    )
}

pub fn validate_response_payload(p: &KeyConfirmationResponsePayload) -> Result<(), ProtoError> {
    check_len("iv", &p.iv, MAX_IV_LENGTH)?;
    check_len(
        "encryptedResponse",
        &p.encrypted_response,
        MAX_ENCRYPTED_DATA_LENGTH,
    )
}

pub fn validate_chat_payload(p: &ChatPayload) -> Result<(), ProtoError> {
    check_len("iv", &p.iv, MAX_IV_LENGTH)?;
    check_len("data", &p.data, MAX_ENCRYPTED_DATA_LENGTH)
}
