use std::time::Duration;

use tokio::sync::mpsc::error::SendError;

use crate::Event;

/// The single error type for all expecto operations.
///
/// Every fallible API returns `expecto::Result<T>` (alias for
/// `Result<T, expecto::Error>`). A failed wait is meant to end the test
/// that issued it, so each variant carries enough context to diagnose the
/// failure from its message alone.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("timed out after {timeout:?} waiting on [{}] for: {}", .categories.join(", "), .outstanding.join("; "))]
    Timeout {
        timeout: Duration,
        categories: Vec<String>,
        outstanding: Vec<String>,
    },

    #[error("forbidden event occurred: {event} (forbidden by {pattern})")]
    ForbiddenEventOccurred { event: Box<Event>, pattern: String },

    #[error("demanded {expected}, but the next event was {actual}")]
    UnexpectedEvent { expected: String, actual: Box<Event> },

    #[error("invalid event kind {0:?}: no category can be derived")]
    InvalidKind(String),

    /// An [`EventSender`](crate::EventSender) outlived its queue.
    #[error("event source closed")]
    SourceClosed,
}

impl Error {
    /// Returns the offending event for forbidden and unexpected events.
    pub fn event(&self) -> Option<&Event> {
        match self {
            Error::ForbiddenEventOccurred { event, .. } => Some(event),
            Error::UnexpectedEvent { actual, .. } => Some(actual),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }
}

impl From<SendError<Event>> for Error {
    fn from(_e: SendError<Event>) -> Self {
        Error::SourceClosed
    }
}
