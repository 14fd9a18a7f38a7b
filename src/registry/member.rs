//! Room membership entries

use bytes::Bytes;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Outcome of pushing one frame to a member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Queued,
    /// Member's outbound queue is full; the frame was skipped
    Full,
    /// Member's connection is gone
    Closed,
}

/// A room's reference to a connected client
///
/// The room never owns the client. It holds the client's id, its display
/// name at join time, and a handle to the client's outbound frame queue.
#[derive(Debug, Clone)]
pub struct Member {
    /// Connection id
    pub id: u64,

    /// Display name
    pub name: String,

    outbound: mpsc::Sender<Bytes>,
}

impl Member {
    pub fn new(id: u64, name: impl Into<String>, outbound: mpsc::Sender<Bytes>) -> Self {
        Self {
            id,
            name: name.into(),
            outbound,
        }
    }

    /// Whether the member's connection is still open
    pub fn is_open(&self) -> bool {
        !self.outbound.is_closed()
    }

    /// Push an encoded frame without waiting
    pub fn push(&self, frame: Bytes) -> PushOutcome {
        match self.outbound.try_send(frame) {
            Ok(()) => PushOutcome::Queued,
            Err(TrySendError::Full(_)) => PushOutcome::Full,
            Err(TrySendError::Closed(_)) => PushOutcome::Closed,
        }
    }
}
