//! schat_proto — wire message types and validation for the secure chat session
//!
//! # Modules
//! - `message`  — the eleven typed wire messages and their payload shapes
//! - `validate` — pre-crypto shape/size validation with the caps from spec §6
//! - `error`    — unified error type

pub mod error;
pub mod message;
pub mod validate;

pub use error::ProtoError;
pub use message::{
    ChatPayload, KeyConfirmationChallengePayload, KeyConfirmationResponsePayload, MessageType,
    PublicKeyPayload, SessionEstablishedPayload,
};
