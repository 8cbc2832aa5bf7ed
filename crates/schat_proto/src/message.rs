//! Wire message types — the eleven typed messages a session exchanges.
//!
//! Type 1 (`SessionRequest`) is included for wire completeness but is not
//! dispatched by `schat_session::Session::process`: it is what causes a
//! `Session` to be constructed in the first place, before any `Session`
//! object exists to process it (see SPEC_FULL.md §6.5 / DESIGN.md).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageType {
    SessionRequest = 1,
    Accept = 2,
    Deny = 3,
    PublicKeyResponse = 4,
    KeyConfirmationChallenge = 5,
    KeyConfirmationResponse = 6,
    SessionEstablished = 7,
    Chat = 8,
    SessionEnd = 9,
    TypingStart = 10,
    TypingStop = 11,
}

impl MessageType {
    pub fn from_u8(v: u8) -> Option<Self> {
        Some(match v {
            1 => Self::SessionRequest,
            2 => Self::Accept,
            3 => Self::Deny,
            4 => Self::PublicKeyResponse,
            5 => Self::KeyConfirmationChallenge,
            6 => Self::KeyConfirmationResponse,
            7 => Self::SessionEstablished,
            8 => Self::Chat,
            9 => Self::SessionEnd,
            10 => Self::TypingStart,
            11 => Self::TypingStop,
            _ => return None,
        })
    }
}

/// Type 2 (responder → initiator) and Type 4 (initiator → responder) share
/// this shape — spec §6's table gives both a single `publicKey` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyPayload {
    pub public_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyConfirmationChallengePayload {
    pub iv: String,
    pub encrypted_challenge: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyConfirmationResponsePayload {
    pub iv: String,
    pub encrypted_response: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEstablishedPayload {
    #[serde(default)]
    pub message: Option<String>,
}

/// Type 8 (either direction) — the data-plane envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatPayload {
    pub iv: String,
    pub data: String,
}
