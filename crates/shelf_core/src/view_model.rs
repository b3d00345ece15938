use crate::{JobState, SessionId};

pub type MessageId = u64;

/// Fixed chat prompts offered under the input box.
pub const QUICK_PROMPTS: [&str; 4] = [
    "Summarize this chapter",
    "What are the key points?",
    "Quiz me on this",
    "Define main concepts",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorView {
    pub message: String,
    pub detail: Option<String>,
    pub can_retry: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SummaryView {
    #[default]
    Closed,
    Loading {
        stage: Option<JobState>,
    },
    Empty,
    Content {
        paragraphs: Vec<String>,
    },
    Error(ErrorView),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    pub question: String,
    pub answer: String,
    pub showing_answer: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckView {
    pub card: Option<CardView>,
    /// 1-based; 0 for an empty deck.
    pub position: usize,
    pub total: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FlashcardsView {
    #[default]
    Closed,
    Loading {
        stage: Option<JobState>,
    },
    Empty,
    Content(DeckView),
    Error(ErrorView),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessageView {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub pending: bool,
    pub can_retry: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChatView {
    pub document_id: Option<String>,
    pub messages: Vec<ChatMessageView>,
    pub pending_answers: usize,
    pub quick_prompts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub summary: SummaryView,
    pub flashcards: FlashcardsView,
    pub chat: ChatView,
    pub active_sessions: Vec<SessionId>,
    pub dirty: bool,
}

impl AppViewModel {
    /// True while any surface is still waiting on the backend.
    pub fn is_busy(&self) -> bool {
        matches!(self.summary, SummaryView::Loading { .. })
            || matches!(self.flashcards, FlashcardsView::Loading { .. })
            || self.chat.pending_answers > 0
    }
}
