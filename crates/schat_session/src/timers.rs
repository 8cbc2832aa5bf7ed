//! Opaque, orchestrator-owned cancel tokens.
//!
//! Breaks the "circular reference to orchestrator" smell flagged in spec §9:
//! the session never calls back into a `manager` object to read state-label
//! constants or services. It only holds something it can cancel.

/// A handle to a pending timer (handshake timeout, request timeout, typing
/// indicator timeout). The orchestrator implements this over its real timer
/// primitive; the session calls `cancel()` and forgets it.
pub trait CancelToken {
    fn cancel(self: Box<Self>);
}

pub(crate) fn cancel_if_present(token: Option<Box<dyn CancelToken>>) {
    if let Some(t) = token {
        t.cancel();
    }
}
