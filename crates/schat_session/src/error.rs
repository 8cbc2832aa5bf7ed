use thiserror::Error;

use schat_crypto::CryptoError;
use schat_proto::ProtoError;

/// Internal error taxonomy (spec §7). Every variant here is translated by the
/// FSM into either `ActionRecord::Reset` (handshake errors) or
/// `ActionRecord::DisplaySystemMessage` (the one data-plane exception, Type 8
/// decrypt failure, which is handled separately and never constructs this
/// type).
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("validation failed: {0}")]
    Validation(#[from] ProtoError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("challenge response verification failed!")]
    ChallengeMismatch,

    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("internal error processing message: {0}")]
    Internal(String),
}
