use std::fmt;

pub type DocumentId = String;

/// Identifies one poll session (and the probe or trigger that precedes it).
///
/// Ids are never reused within an [`AppState`](crate::AppState), so a
/// response tagged with an old id can always be recognised as stale.
pub type SessionId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JobKind {
    Summary,
    Flashcards,
    Answer,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::Summary => write!(f, "summary"),
            JobKind::Flashcards => write!(f, "flashcards"),
            JobKind::Answer => write!(f, "answer"),
        }
    }
}

/// A (kind, subject) pair whose generation status is polled.
///
/// Answer jobs are keyed by the literal question text: `"What is X?"` and
/// `"What is X? "` are two different jobs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrackedJob {
    pub kind: JobKind,
    pub document_id: DocumentId,
    pub question: Option<String>,
}

impl TrackedJob {
    pub fn summary(document_id: impl Into<DocumentId>) -> Self {
        Self {
            kind: JobKind::Summary,
            document_id: document_id.into(),
            question: None,
        }
    }

    pub fn flashcards(document_id: impl Into<DocumentId>) -> Self {
        Self {
            kind: JobKind::Flashcards,
            document_id: document_id.into(),
            question: None,
        }
    }

    pub fn answer(document_id: impl Into<DocumentId>, question: impl Into<String>) -> Self {
        Self {
            kind: JobKind::Answer,
            document_id: document_id.into(),
            question: Some(question.into()),
        }
    }
}

impl fmt::Display for TrackedJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.question {
            Some(question) => write!(f, "{} of {} for {:?}", self.kind, self.document_id, question),
            None => write!(f, "{} of {}", self.kind, self.document_id),
        }
    }
}

/// Monotonic allocator for [`SessionId`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIds {
    next: SessionId,
}

impl Default for SessionIds {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl SessionIds {
    pub fn next_id(&mut self) -> SessionId {
        let id = self.next;
        self.next += 1;
        id
    }
}
