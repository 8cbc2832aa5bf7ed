//! `ActionRecord` — the tagged value `Session::process` returns for the
//! orchestrator to act on (spec §4.1). The session never performs I/O itself.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    System,
    Own,
    Peer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionRecord {
    /// No action — message ignored (unknown type, wrong-state arrival, or
    /// buffered a mid-derivation challenge).
    None,
    /// Responder accepted the request (`Session::accept`) — not a reply to
    /// any inbound wire message, so it isn't produced by `process()`.
    SendType2 { public_key: String },
    /// Responder denied the request (`Session::deny`), mirror of `SendType2`.
    SendType3,
    SendType4,
    SendType5,
    SendType6 { challenge_data: Vec<u8> },
    SendType7,
    ShowInfo { message: String, show_retry: bool },
    SessionActive,
    DisplayMessage {
        sender: String,
        text: String,
        kind: MessageKind,
    },
    DisplaySystemMessage {
        text: String,
    },
    ShowTyping,
    HideTyping,
    Reset {
        reason: String,
        notify_user: bool,
    },
}

impl ActionRecord {
    pub fn reset(reason: impl Into<String>) -> Self {
        ActionRecord::Reset {
            reason: reason.into(),
            notify_user: false,
        }
    }

    pub fn reset_notify(reason: impl Into<String>) -> Self {
        ActionRecord::Reset {
            reason: reason.into(),
            notify_user: true,
        }
    }
}
