use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::JobKind;

/// Generation state as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    NotGenerated,
    Queued,
    Processing,
    Ready,
    Failed,
    /// Only reported by the answer poll endpoint.
    NotFound,
}

impl JobState {
    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw {
            "not_generated" => Some(JobState::NotGenerated),
            "queued" => Some(JobState::Queued),
            "processing" => Some(JobState::Processing),
            "ready" => Some(JobState::Ready),
            "failed" => Some(JobState::Failed),
            "not_found" => Some(JobState::NotFound),
            _ => None,
        }
    }

    pub fn as_wire(self) -> &'static str {
        match self {
            JobState::NotGenerated => "not_generated",
            JobState::Queued => "queued",
            JobState::Processing => "processing",
            JobState::Ready => "ready",
            JobState::Failed => "failed",
            JobState::NotFound => "not_found",
        }
    }

    /// Whether `kind` may legitimately report this state.
    pub fn is_valid_for(self, kind: JobKind) -> bool {
        self != JobState::NotFound || kind == JobKind::Answer
    }

    /// No further polling happens once a terminal state is observed.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobState::Ready | JobState::Failed | JobState::NotFound
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub question: String,
    pub answer: String,
}

/// Artifact attached to a `ready` status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Summary(String),
    Flashcards(Vec<Flashcard>),
    Answer(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatus {
    pub state: JobState,
    pub payload: Option<Payload>,
}

impl JobStatus {
    pub fn new(state: JobState) -> Self {
        Self {
            state,
            payload: None,
        }
    }

    pub fn ready(payload: Payload) -> Self {
        Self {
            state: JobState::Ready,
            payload: Some(payload),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportErrorKind {
    Network,
    Timeout,
    HttpStatus(u16),
    Decode,
    InvalidRequest,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportErrorKind::Network => write!(f, "network error"),
            TransportErrorKind::Timeout => write!(f, "timeout"),
            TransportErrorKind::HttpStatus(code) => write!(f, "http status {code}"),
            TransportErrorKind::Decode => write!(f, "malformed response"),
            TransportErrorKind::InvalidRequest => write!(f, "invalid request"),
        }
    }
}

/// Failure reaching the backend or understanding its reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self.kind {
            TransportErrorKind::HttpStatus(code) => Some(code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_values_round_trip_through_parser() {
        for state in [
            JobState::NotGenerated,
            JobState::Queued,
            JobState::Processing,
            JobState::Ready,
            JobState::Failed,
            JobState::NotFound,
        ] {
            assert_eq!(JobState::from_wire(state.as_wire()), Some(state));
        }
        assert_eq!(JobState::from_wire("READY"), None);
    }

    #[test]
    fn not_found_is_only_valid_for_answers() {
        assert!(JobState::NotFound.is_valid_for(JobKind::Answer));
        assert!(!JobState::NotFound.is_valid_for(JobKind::Summary));
        assert!(!JobState::NotFound.is_valid_for(JobKind::Flashcards));
        assert!(JobState::Queued.is_valid_for(JobKind::Summary));
    }

    #[test]
    fn transport_error_exposes_status_code() {
        let err = TransportError::new(TransportErrorKind::HttpStatus(503), "unavailable");
        assert_eq!(err.status_code(), Some(503));
        assert_eq!(err.to_string(), "http status 503: unavailable");
    }
}
