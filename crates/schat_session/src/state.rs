//! Data model (spec §3): handshake states, the buffered-challenge tri-state,
//! and session history.

use crate::action::MessageKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    InitiatingSession,
    RequestReceived,
    AwaitingChallenge,
    DerivingKeyInitiator,
    DerivingKeyResponder,
    KeyDerivedInitiator,
    ReceivedInitiatorKey,
    ReceivedChallenge,
    AwaitingFinalConfirmation,
    HandshakeComplete,
    ActiveSession,
    Denied,
}

/// Which side of the handshake this session is playing. Recorded the moment
/// a derivation begins (spec §4.3) so `complete_key_derivation` knows which
/// follow-up action to emit without re-deriving it from `state` alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Initiator,
    Responder,
}

/// Tri-state for the responder's key-confirmation challenge as observed by
/// the initiator (spec §3, §9 "Buffered challenge tri-state" design note).
/// Progresses monotonically `None -> Buffered -> Decrypted -> None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChallengeReceived {
    None,
    Buffered { iv: Vec<u8>, ciphertext: Vec<u8> },
    Decrypted(Vec<u8>),
}

impl ChallengeReceived {
    pub fn is_buffered(&self) -> bool {
        matches!(self, ChallengeReceived::Buffered { .. })
    }
}

/// Opaque marker recorded synchronously the instant a derivation begins,
/// before the (potentially suspending) ECDH/HKDF work actually runs. Its mere
/// presence is what the Type 5 handler checks to decide whether to buffer.
#[derive(Debug, Clone, Copy)]
pub struct DerivationHandle;

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub sender: String,
    pub text: String,
    pub kind: MessageKind,
}
