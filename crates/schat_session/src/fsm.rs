//! `Session` — the handshake + data-plane state machine.
//!
//! Mirrors the shape of the teacher's `dl_crypto::session::Session`: a struct
//! that owns its crypto capability exclusively and exposes a handful of
//! methods that mutate state and return a value for the caller to act on,
//! with no back-reference to any orchestrator object (spec §9 "circular
//! reference to orchestrator").
//!
//! `Session` is not `Sync`: exactly one `process()`/`complete_key_derivation()`
//! call may be in flight for a given session at a time. The caller is
//! responsible for serializing calls per peer (a per-peer mailbox or serial
//! executor), matching spec §5's single-threaded cooperative model.

use tracing::{debug, error, warn};

use schat_crypto::CryptoCapability;
use schat_proto::message::{
    ChatPayload, KeyConfirmationChallengePayload, KeyConfirmationResponsePayload, PublicKeyPayload,
    SessionEstablishedPayload,
};
use schat_proto::validate;

use crate::action::{ActionRecord, MessageKind};
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::state::{ChallengeReceived, ChatMessage, DerivationHandle, HandshakeState, Role};
use crate::timers::{cancel_if_present, CancelToken};

/// The ten message bodies `Session::process` dispatches on — Type 1
/// (`SessionRequest`) is what causes a `Session` to be constructed in the
/// first place, so it has no `Inbound` variant (see SPEC_FULL.md §6.4).
/// A wire type this crate doesn't recognize never reaches this enum: the
/// caller maps raw `MessageType`s to `Inbound` and treats a failed mapping as
/// the spec's "unknown type: warn, emit NONE" case before `process` is even
/// called.
#[derive(Debug, Clone)]
pub enum Inbound {
    Accept(PublicKeyPayload),
    Deny,
    PublicKeyResponse(PublicKeyPayload),
    KeyConfirmationChallenge(KeyConfirmationChallengePayload),
    KeyConfirmationResponse(KeyConfirmationResponsePayload),
    SessionEstablished(SessionEstablishedPayload),
    Chat(ChatPayload),
    SessionEnd,
    TypingStart,
    TypingStop,
}

pub struct Session {
    peer_id: String,
    state: HandshakeState,
    crypto: CryptoCapability,
    peer_public_key_imported: bool,
    challenge_sent: Option<[u8; 32]>,
    challenge_received: ChallengeReceived,
    key_derivation_inflight: Option<DerivationHandle>,
    pending_derivation_role: Option<Role>,
    messages: Vec<ChatMessage>,
    peer_is_typing: bool,
    handshake_timeout: Option<Box<dyn CancelToken>>,
    request_timeout: Option<Box<dyn CancelToken>>,
    typing_indicator_timeout: Option<Box<dyn CancelToken>>,
    config: SessionConfig,
}

impl Session {
    fn new(peer_id: impl Into<String>, state: HandshakeState, config: SessionConfig) -> Self {
        let mut crypto = CryptoCapability::new();
        crypto.generate_ecdh_keypair();
        Self {
            peer_id: peer_id.into(),
            state,
            crypto,
            peer_public_key_imported: false,
            challenge_sent: None,
            challenge_received: ChallengeReceived::None,
            key_derivation_inflight: None,
            pending_derivation_role: None,
            messages: Vec::new(),
            peer_is_typing: false,
            handshake_timeout: None,
            request_timeout: None,
            typing_indicator_timeout: None,
            config,
        }
    }

    /// Construct a session for the peer that initiates — starts in
    /// `InitiatingSession`, already holding a fresh ephemeral keypair (its
    /// public key is what goes out in the out-of-scope Type 1 request).
    pub fn new_initiator(peer_id: impl Into<String>, config: SessionConfig) -> Self {
        Self::new(peer_id, HandshakeState::InitiatingSession, config)
    }

    /// Construct a session for the peer deciding whether to accept a
    /// request — starts in `RequestReceived`, awaiting `accept()`/`deny()`.
    pub fn new_responder(peer_id: impl Into<String>, config: SessionConfig) -> Self {
        Self::new(peer_id, HandshakeState::RequestReceived, config)
    }

    pub fn peer_id(&self) -> &str {
        &self.peer_id
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    pub fn has_session_key(&self) -> bool {
        self.crypto.has_session_key()
    }

    pub fn is_peer_typing(&self) -> bool {
        self.peer_is_typing
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn challenge_received(&self) -> &ChallengeReceived {
        &self.challenge_received
    }

    pub fn derivation_in_flight(&self) -> bool {
        self.key_derivation_inflight.is_some()
    }

    /// Own SPKI public key, base64-encoded — what the orchestrator embeds in
    /// the Type 1/2/4 payload it sends out.
    pub fn own_public_key(&self) -> Result<String, SessionError> {
        Ok(self.crypto.export_own_public_key()?)
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<(Vec<u8>, Vec<u8>), SessionError> {
        Ok(self.crypto.encrypt(plaintext)?)
    }

    pub fn decrypt(&self, ciphertext: &[u8], iv: &[u8]) -> Result<Vec<u8>, SessionError> {
        Ok(self.crypto.decrypt(ciphertext, iv)?)
    }

    pub fn set_handshake_timeout(&mut self, token: Box<dyn CancelToken>) {
        self.handshake_timeout = Some(token);
    }

    pub fn set_request_timeout(&mut self, token: Box<dyn CancelToken>) {
        self.request_timeout = Some(token);
    }

    pub fn set_typing_indicator_timeout(&mut self, token: Box<dyn CancelToken>) {
        self.typing_indicator_timeout = Some(token);
    }

    /// Responder's local decision to accept the pending request. Not a
    /// reply to any inbound message — the orchestrator calls this once the
    /// user (external to this crate) has decided.
    pub fn accept(&mut self) -> ActionRecord {
        if self.state != HandshakeState::RequestReceived {
            warn!(peer_id = %self.peer_id, state = ?self.state, "accept() called outside RequestReceived");
            return ActionRecord::None;
        }
        self.state = HandshakeState::AwaitingChallenge;
        match self.own_public_key() {
            Ok(public_key) => ActionRecord::SendType2 { public_key },
            Err(e) => self.reset(format!("failed to export own public key: {e}")),
        }
    }

    /// Responder's local decision to deny the pending request.
    pub fn deny(&mut self) -> ActionRecord {
        self.state = HandshakeState::Denied;
        ActionRecord::SendType3
    }

    /// Generate the 32-byte key-confirmation challenge, encrypt it under the
    /// freshly derived session key, and record `challenge_sent` (spec §3:
    /// "set by responder when emitting Type 5"). Returns `(iv, ciphertext)`
    /// for the orchestrator to place on the wire as Type 5.
    pub fn prepare_challenge(&mut self) -> Result<(Vec<u8>, Vec<u8>), SessionError> {
        let bytes = self.crypto.generate_challenge(self.config.challenge_len);
        let mut challenge = [0u8; 32];
        challenge.copy_from_slice(&bytes);
        let (iv, ciphertext) = self.crypto.encrypt(&challenge)?;
        self.challenge_sent = Some(challenge);
        Ok((iv, ciphertext))
    }

    /// `process(msg) -> ActionRecord` (spec §4.1). Every handler follows
    /// *validate shape/sizes → parse → crypto → state update → emit action*;
    /// any validation or crypto failure resets the session.
    pub fn process(&mut self, inbound: Inbound) -> ActionRecord {
        match inbound {
            Inbound::Accept(p) => self.handle_accept(p),
            Inbound::Deny => self.handle_deny(),
            Inbound::PublicKeyResponse(p) => self.handle_public_key_response(p),
            Inbound::KeyConfirmationChallenge(p) => self.handle_challenge(p),
            Inbound::KeyConfirmationResponse(p) => self.handle_response(p),
            Inbound::SessionEstablished(p) => self.handle_established(p),
            Inbound::Chat(p) => self.handle_chat(p),
            Inbound::SessionEnd => self.handle_session_end(),
            Inbound::TypingStart => self.handle_typing(true),
            Inbound::TypingStop => self.handle_typing(false),
        }
    }

    fn handle_accept(&mut self, payload: PublicKeyPayload) -> ActionRecord {
        if self.state != HandshakeState::InitiatingSession {
            warn!(peer_id = %self.peer_id, state = ?self.state, "Type 2 ignored outside InitiatingSession");
            return ActionRecord::None;
        }
        if let Err(e) = validate::validate_public_key_payload(&payload) {
            return self.reset(e.to_string());
        }
        if let Err(e) = self.crypto.import_peer_public_key(&payload.public_key) {
            return self.reset(format!("failed to import responder public key: {e}"));
        }
        self.peer_public_key_imported = true;
        self.state = HandshakeState::DerivingKeyInitiator;
        self.key_derivation_inflight = Some(DerivationHandle);
        self.pending_derivation_role = Some(Role::Initiator);
        debug!(peer_id = %self.peer_id, "key derivation started (initiator)");
        ActionRecord::None
    }

    fn handle_deny(&mut self) -> ActionRecord {
        self.state = HandshakeState::Denied;
        ActionRecord::ShowInfo {
            message: "the peer declined the session request".into(),
            show_retry: false,
        }
    }

    fn handle_public_key_response(&mut self, payload: PublicKeyPayload) -> ActionRecord {
        if self.state != HandshakeState::AwaitingChallenge {
            warn!(peer_id = %self.peer_id, state = ?self.state, "Type 4 ignored outside AwaitingChallenge");
            return ActionRecord::None;
        }
        if let Err(e) = validate::validate_public_key_payload(&payload) {
            return self.reset(e.to_string());
        }
        if let Err(e) = self.crypto.import_peer_public_key(&payload.public_key) {
            return self.reset(format!("failed to import initiator public key: {e}"));
        }
        self.peer_public_key_imported = true;
        self.state = HandshakeState::DerivingKeyResponder;
        self.key_derivation_inflight = Some(DerivationHandle);
        self.pending_derivation_role = Some(Role::Responder);
        debug!(peer_id = %self.peer_id, "key derivation started (responder)");
        ActionRecord::None
    }

    /// Type 5's three branches (spec §4.1) are keyed entirely on crypto/
    /// derivation status, not on `state` — unlike Type 2/4 there is no
    /// "accepted only in" state restriction in the spec, and the mandated
    /// `RESET` for "no derivation ever started" must fire regardless of
    /// which state the session happens to be in.
    fn handle_challenge(&mut self, payload: KeyConfirmationChallengePayload) -> ActionRecord {
        if let Err(e) = validate::validate_challenge_payload(&payload) {
            return self.reset(e.to_string());
        }
        let iv = match schat_crypto::codec::base64_to_bytes(&payload.iv) {
            Ok(v) => v,
            Err(e) => return self.reset(format!("malformed challenge iv: {e}")),
        };
        let ciphertext = match schat_crypto::codec::base64_to_bytes(&payload.encrypted_challenge) {
            Ok(v) => v,
            Err(e) => return self.reset(format!("malformed challenge ciphertext: {e}")),
        };

        if self.crypto.has_session_key() {
            match self.crypto.decrypt(&ciphertext, &iv) {
                Ok(plaintext) => {
                    self.challenge_received = ChallengeReceived::Decrypted(plaintext.clone());
                    self.state = HandshakeState::AwaitingFinalConfirmation;
                    ActionRecord::SendType6 {
                        challenge_data: plaintext,
                    }
                }
                Err(e) => self.reset(format!("failed to decrypt key confirmation challenge: {e}")),
            }
        } else if self.key_derivation_inflight.is_some() {
            self.challenge_received = ChallengeReceived::Buffered { iv, ciphertext };
            debug!(peer_id = %self.peer_id, "buffered key confirmation challenge pending derivation");
            ActionRecord::None
        } else {
            self.reset("Challenge received before key derivation initiated.")
        }
    }

    /// Called once the orchestrator has carried out the ECDH + HKDF work it
    /// scheduled in response to `process()` setting `key_derivation_inflight`
    /// (spec §4.3). Not itself a handler for any wire message.
    pub fn complete_key_derivation(&mut self) -> Vec<ActionRecord> {
        if self.key_derivation_inflight.is_none() {
            return Vec::new();
        }
        let role = match self.pending_derivation_role.take() {
            Some(r) => r,
            None => return Vec::new(),
        };
        self.key_derivation_inflight = None;

        let shared_secret = match self.crypto.derive_shared_secret() {
            Ok(s) => s,
            Err(e) => return vec![self.reset(format!("ECDH derivation failed: {e}"))],
        };
        if let Err(e) = self.crypto.derive_session_key(&shared_secret) {
            return vec![self.reset(format!("session key derivation failed: {e}"))];
        }

        match role {
            Role::Initiator => {
                self.state = HandshakeState::KeyDerivedInitiator;
                let mut actions = vec![ActionRecord::SendType4];
                if let ChallengeReceived::Buffered { iv, ciphertext } =
                    self.challenge_received.clone()
                {
                    match self.crypto.decrypt(&ciphertext, &iv) {
                        Ok(plaintext) => {
                            self.challenge_received =
                                ChallengeReceived::Decrypted(plaintext.clone());
                            self.state = HandshakeState::AwaitingFinalConfirmation;
                            actions.push(ActionRecord::SendType6 {
                                challenge_data: plaintext,
                            });
                        }
                        Err(e) => {
                            return vec![self
                                .reset(format!("failed to decrypt buffered challenge: {e}"))]
                        }
                    }
                }
                actions
            }
            Role::Responder => {
                self.state = HandshakeState::ReceivedInitiatorKey;
                vec![ActionRecord::SendType5]
            }
        }
    }

    fn handle_response(&mut self, payload: KeyConfirmationResponsePayload) -> ActionRecord {
        let sent = match self.challenge_sent {
            Some(c) => c,
            None => return self.reset("key confirmation response received with no challenge outstanding"),
        };
        if !self.crypto.has_session_key() {
            return self.reset("key confirmation response received before session key derived");
        }
        if let Err(e) = validate::validate_response_payload(&payload) {
            return self.reset(e.to_string());
        }
        let iv = match schat_crypto::codec::base64_to_bytes(&payload.iv) {
            Ok(v) => v,
            Err(e) => return self.reset(format!("malformed response iv: {e}")),
        };
        let ciphertext = match schat_crypto::codec::base64_to_bytes(&payload.encrypted_response) {
            Ok(v) => v,
            Err(e) => return self.reset(format!("malformed response ciphertext: {e}")),
        };
        let plaintext = match self.crypto.decrypt(&ciphertext, &iv) {
            Ok(p) => p,
            Err(e) => return self.reset(format!("failed to decrypt key confirmation response: {e}")),
        };

        if constant_time_eq(&plaintext, &sent) {
            self.challenge_sent = None;
            self.state = HandshakeState::HandshakeComplete;
            ActionRecord::SendType7
        } else {
            self.reset(SessionError::ChallengeMismatch.to_string())
        }
    }

    fn handle_established(&mut self, _payload: SessionEstablishedPayload) -> ActionRecord {
        if !matches!(
            self.state,
            HandshakeState::AwaitingFinalConfirmation | HandshakeState::ReceivedChallenge
        ) {
            // Open question (spec §9) resolved leniently: log and transition anyway.
            warn!(peer_id = %self.peer_id, state = ?self.state, "Type 7 received outside the expected pre-active states");
        }
        self.state = HandshakeState::ActiveSession;
        self.challenge_received = ChallengeReceived::None;
        cancel_if_present(self.handshake_timeout.take());
        ActionRecord::SessionActive
    }

    fn handle_chat(&mut self, payload: ChatPayload) -> ActionRecord {
        if self.state != HandshakeState::ActiveSession {
            warn!(peer_id = %self.peer_id, state = ?self.state, "Type 8 ignored outside ActiveSession");
            return ActionRecord::None;
        }
        if let Err(e) = validate::validate_chat_payload(&payload) {
            return self.reset(e.to_string());
        }
        if !self.crypto.has_session_key() {
            return self.reset("chat message received with no session key installed");
        }
        let iv = match schat_crypto::codec::base64_to_bytes(&payload.iv) {
            Ok(v) => v,
            Err(e) => return self.reset(format!("malformed chat iv: {e}")),
        };
        let ciphertext = match schat_crypto::codec::base64_to_bytes(&payload.data) {
            Ok(v) => v,
            Err(e) => return self.reset(format!("malformed chat ciphertext: {e}")),
        };

        let plaintext = match self.crypto.decrypt(&ciphertext, &iv) {
            Ok(p) => p,
            Err(e) => {
                warn!(peer_id = %self.peer_id, error = %e, "chat message failed to decrypt");
                return ActionRecord::DisplaySystemMessage {
                    text: "Failed to decrypt message.".into(),
                };
            }
        };
        let text = match schat_crypto::codec::decode_utf8(plaintext) {
            Ok(t) => t,
            Err(e) => {
                warn!(peer_id = %self.peer_id, error = %e, "chat message was not valid UTF-8");
                return ActionRecord::DisplaySystemMessage {
                    text: "Failed to decrypt message.".into(),
                };
            }
        };

        self.messages.push(ChatMessage {
            sender: self.peer_id.clone(),
            text: text.clone(),
            kind: MessageKind::Peer,
        });
        ActionRecord::DisplayMessage {
            sender: self.peer_id.clone(),
            text,
            kind: MessageKind::Peer,
        }
    }

    fn handle_session_end(&mut self) -> ActionRecord {
        self.reset_notify("the peer ended the session")
    }

    fn handle_typing(&mut self, is_typing: bool) -> ActionRecord {
        if self.state != HandshakeState::ActiveSession {
            return ActionRecord::None;
        }
        self.peer_is_typing = is_typing;
        if is_typing {
            ActionRecord::ShowTyping
        } else {
            ActionRecord::HideTyping
        }
    }

    pub fn reset(&mut self, reason: impl Into<String>) -> ActionRecord {
        self.reset_internal(reason.into(), false)
    }

    pub fn reset_notify(&mut self, reason: impl Into<String>) -> ActionRecord {
        self.reset_internal(reason.into(), true)
    }

    fn reset_internal(&mut self, reason: String, notify_user: bool) -> ActionRecord {
        error!(peer_id = %self.peer_id, reason = %reason, "session reset");
        cancel_if_present(self.handshake_timeout.take());
        cancel_if_present(self.request_timeout.take());
        cancel_if_present(self.typing_indicator_timeout.take());
        self.crypto.wipe_keys();
        self.peer_public_key_imported = false;
        self.challenge_sent = None;
        self.challenge_received = ChallengeReceived::None;
        self.key_derivation_inflight = None;
        self.pending_derivation_role = None;
        self.state = HandshakeState::Denied;
        ActionRecord::Reset {
            reason,
            notify_user,
        }
    }
}

/// Full-length, no-early-return byte comparison (spec §9 "constant-time
/// compare"), grounded on the teacher's `PublicKeyBytes::fingerprints_match`.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
