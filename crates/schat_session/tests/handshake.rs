//! Scenario tests S1-S6 (handshake + data plane), driven entirely through
//! the public `Session` API as two independent peers passing payloads to
//! each other by hand — there is no transport here, matching the crate's
//! scope (spec §1: transport/orchestrator are external collaborators).

use schat_crypto::codec::bytes_to_base64;
use schat_proto::message::{
    ChatPayload, KeyConfirmationChallengePayload, KeyConfirmationResponsePayload,
    PublicKeyPayload, SessionEstablishedPayload,
};
use schat_session::{ActionRecord, HandshakeState, Inbound, Session, SessionConfig};

struct Pair {
    initiator: Session,
    responder: Session,
}

fn fresh_pair() -> Pair {
    Pair {
        initiator: Session::new_initiator("responder-peer", SessionConfig::default()),
        responder: Session::new_responder("initiator-peer", SessionConfig::default()),
    }
}

/// Drives the pair from `accept()` through `ACTIVE_SESSION` on both sides,
/// returning the 32-byte challenge the responder generated so callers can
/// assert on it (S1).
fn run_happy_path(pair: &mut Pair) -> Vec<u8> {
    let accept = pair.responder.accept();
    let responder_pub = match accept {
        ActionRecord::SendType2 { public_key } => public_key,
        other => panic!("expected SendType2, got {other:?}"),
    };

    let action = pair.initiator.process(Inbound::Accept(PublicKeyPayload {
        public_key: responder_pub,
    }));
    assert_eq!(action, ActionRecord::None);
    assert_eq!(
        pair.initiator.state(),
        HandshakeState::DerivingKeyInitiator
    );

    let actions = pair.initiator.complete_key_derivation();
    assert_eq!(actions, vec![ActionRecord::SendType4]);
    let initiator_pub = pair.initiator.own_public_key().unwrap();

    let action = pair
        .responder
        .process(Inbound::PublicKeyResponse(PublicKeyPayload {
            public_key: initiator_pub,
        }));
    assert_eq!(action, ActionRecord::None);
    let actions = pair.responder.complete_key_derivation();
    assert_eq!(actions, vec![ActionRecord::SendType5]);

    let (iv, ciphertext) = pair.responder.prepare_challenge().unwrap();

    let action = pair
        .initiator
        .process(Inbound::KeyConfirmationChallenge(
            KeyConfirmationChallengePayload {
                iv: bytes_to_base64(&iv),
                encrypted_challenge: bytes_to_base64(&ciphertext),
            },
        ));
    let challenge_data = match action {
        ActionRecord::SendType6 { challenge_data } => challenge_data,
        other => panic!("expected SendType6, got {other:?}"),
    };
    assert_eq!(
        pair.initiator.state(),
        HandshakeState::AwaitingFinalConfirmation
    );

    let (resp_iv, resp_ct) = pair.initiator.encrypt(&challenge_data).unwrap();
    let action = pair
        .responder
        .process(Inbound::KeyConfirmationResponse(
            KeyConfirmationResponsePayload {
                iv: bytes_to_base64(&resp_iv),
                encrypted_response: bytes_to_base64(&resp_ct),
            },
        ));
    assert_eq!(action, ActionRecord::SendType7);
    assert_eq!(pair.responder.state(), HandshakeState::HandshakeComplete);

    let action = pair
        .initiator
        .process(Inbound::SessionEstablished(SessionEstablishedPayload {
            message: None,
        }));
    assert_eq!(action, ActionRecord::SessionActive);
    assert_eq!(pair.initiator.state(), HandshakeState::ActiveSession);

    let action = pair
        .responder
        .process(Inbound::SessionEstablished(SessionEstablishedPayload {
            message: None,
        }));
    assert_eq!(action, ActionRecord::SessionActive);
    assert_eq!(pair.responder.state(), HandshakeState::ActiveSession);

    challenge_data
}

#[test]
fn s1_initiator_happy_path() {
    let mut pair = fresh_pair();
    let challenge = run_happy_path(&mut pair);
    assert_eq!(challenge.len(), 32);
    assert!(pair.initiator.has_session_key());
    assert!(pair.responder.has_session_key());
    assert_eq!(pair.initiator.state(), HandshakeState::ActiveSession);
}

#[test]
fn s2_race_buffering_then_reconciliation() {
    let mut pair = fresh_pair();
    let accept = pair.responder.accept();
    let responder_pub = match accept {
        ActionRecord::SendType2 { public_key } => public_key,
        other => panic!("expected SendType2, got {other:?}"),
    };

    pair.initiator.process(Inbound::Accept(PublicKeyPayload {
        public_key: responder_pub,
    }));
    assert_eq!(
        pair.initiator.state(),
        HandshakeState::DerivingKeyInitiator
    );

    // Drive the responder all the way to a real Type 5 so the buffered
    // ciphertext is genuine (not a fake that would fail to decrypt).
    let initiator_pub_preview = pair.initiator.own_public_key().unwrap();
    pair.responder
        .process(Inbound::PublicKeyResponse(PublicKeyPayload {
            public_key: initiator_pub_preview,
        }));
    pair.responder.complete_key_derivation();
    let (iv, ciphertext) = pair.responder.prepare_challenge().unwrap();

    // Type 5 arrives for the initiator before its own derivation completes.
    let action = pair
        .initiator
        .process(Inbound::KeyConfirmationChallenge(
            KeyConfirmationChallengePayload {
                iv: bytes_to_base64(&iv),
                encrypted_challenge: bytes_to_base64(&ciphertext),
            },
        ));
    assert_eq!(action, ActionRecord::None);
    assert!(pair.initiator.challenge_received().is_buffered());
    assert_eq!(
        pair.initiator.state(),
        HandshakeState::DerivingKeyInitiator
    );

    // Now the initiator's derivation completes: SendType4 plus the
    // reconciled SendType6 must both come out, in order.
    let actions = pair.initiator.complete_key_derivation();
    assert_eq!(actions.len(), 2);
    assert_eq!(actions[0], ActionRecord::SendType4);
    assert!(matches!(actions[1], ActionRecord::SendType6 { .. }));
    assert!(matches!(
        pair.initiator.challenge_received(),
        schat_session::ChallengeReceived::Decrypted(_)
    ));
}

#[test]
fn s3_oversized_public_key_resets_without_crypto_import() {
    let mut initiator = Session::new_initiator("peer", SessionConfig::default());
    let oversized = "A".repeat(513);
    let action = initiator.process(Inbound::Accept(PublicKeyPayload {
        public_key: oversized,
    }));
    match action {
        ActionRecord::Reset { reason, .. } => {
            assert!(reason.contains("excessively large public key"))
        }
        other => panic!("expected Reset, got {other:?}"),
    }
    assert!(!initiator.has_session_key());
    assert_eq!(initiator.state(), HandshakeState::Denied);
}

#[test]
fn key_confirmation_challenge_with_no_derivation_ever_started_resets() {
    // A session that never received Type 2/4 has no session key and no
    // derivation in flight — spec §4.1/§7 mandate RESET here, not NONE.
    let mut initiator = Session::new_initiator("peer", SessionConfig::default());
    let action = initiator.process(Inbound::KeyConfirmationChallenge(
        KeyConfirmationChallengePayload {
            iv: bytes_to_base64(&[0u8; 12]),
            encrypted_challenge: bytes_to_base64(&[0u8; 48]),
        },
    ));
    match action {
        ActionRecord::Reset { reason, .. } => {
            assert!(reason.contains("Challenge received before key derivation initiated"))
        }
        other => panic!("expected Reset, got {other:?}"),
    }
    assert_eq!(initiator.state(), HandshakeState::Denied);
}

#[test]
fn s4_wrong_challenge_response_resets_with_verification_failed() {
    let mut pair = fresh_pair();
    let accept = pair.responder.accept();
    let responder_pub = match accept {
        ActionRecord::SendType2 { public_key } => public_key,
        other => panic!("expected SendType2, got {other:?}"),
    };
    pair.initiator.process(Inbound::Accept(PublicKeyPayload {
        public_key: responder_pub,
    }));
    pair.initiator.complete_key_derivation();
    let initiator_pub = pair.initiator.own_public_key().unwrap();
    pair.responder
        .process(Inbound::PublicKeyResponse(PublicKeyPayload {
            public_key: initiator_pub,
        }));
    pair.responder.complete_key_derivation();
    let (iv, ciphertext) = pair.responder.prepare_challenge().unwrap();
    pair.initiator
        .process(Inbound::KeyConfirmationChallenge(
            KeyConfirmationChallengePayload {
                iv: bytes_to_base64(&iv),
                encrypted_challenge: bytes_to_base64(&ciphertext),
            },
        ));

    // Respond with the wrong plaintext instead of the real challenge.
    let (resp_iv, resp_ct) = pair
        .initiator
        .encrypt(b"this is not the challenge bytes!")
        .unwrap();
    let action = pair
        .responder
        .process(Inbound::KeyConfirmationResponse(
            KeyConfirmationResponsePayload {
                iv: bytes_to_base64(&resp_iv),
                encrypted_response: bytes_to_base64(&resp_ct),
            },
        ));
    match action {
        ActionRecord::Reset { reason, .. } => assert!(reason.contains("verification failed")),
        other => panic!("expected Reset, got {other:?}"),
    }
    assert_eq!(pair.responder.state(), HandshakeState::Denied);
}

#[test]
fn s5_data_plane_decrypt_failure_is_recoverable() {
    let mut pair = fresh_pair();
    run_happy_path(&mut pair);

    let action = pair.initiator.process(Inbound::Chat(ChatPayload {
        iv: bytes_to_base64(&[7u8; 12]),
        data: bytes_to_base64(&[9u8; 40]),
    }));
    assert_eq!(
        action,
        ActionRecord::DisplaySystemMessage {
            text: "Failed to decrypt message.".into()
        }
    );
    assert_eq!(pair.initiator.state(), HandshakeState::ActiveSession);
    assert!(pair.initiator.has_session_key());
}

#[test]
fn s6_typing_in_wrong_state_is_ignored() {
    let mut initiator = Session::new_initiator("peer", SessionConfig::default());
    let action = initiator.process(Inbound::TypingStart);
    assert_eq!(action, ActionRecord::None);
    assert!(!initiator.is_peer_typing());
}

#[test]
fn chat_round_trips_between_both_sides_once_active() {
    let mut pair = fresh_pair();
    run_happy_path(&mut pair);

    let (iv, ct) = pair.initiator.encrypt(b"hey there").unwrap();
    let action = pair.responder.process(Inbound::Chat(ChatPayload {
        iv: bytes_to_base64(&iv),
        data: bytes_to_base64(&ct),
    }));
    match action {
        ActionRecord::DisplayMessage { text, .. } => assert_eq!(text, "hey there"),
        other => panic!("expected DisplayMessage, got {other:?}"),
    }
    assert_eq!(pair.responder.messages().len(), 1);
}

#[test]
fn session_end_resets_with_notify_user() {
    let mut pair = fresh_pair();
    run_happy_path(&mut pair);

    let action = pair.initiator.process(Inbound::SessionEnd);
    match action {
        ActionRecord::Reset { notify_user, .. } => assert!(notify_user),
        other => panic!("expected Reset, got {other:?}"),
    }
    assert_eq!(pair.initiator.state(), HandshakeState::Denied);
    assert!(!pair.initiator.has_session_key());
}
