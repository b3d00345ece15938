//! StudyShelf core: pure job-status state machine and view-model helpers.
mod chat;
mod effect;
mod flashcards;
mod job;
mod msg;
mod policy;
mod session;
mod state;
mod status;
mod summary;
mod tracker;
mod update;
mod view_model;

pub use chat::{
    ChatPanel, FAILED_TEXT, GREETING, NOT_FOUND_TEXT, SEND_FAILED_TEXT, TIMED_OUT_TEXT,
};
pub use effect::Effect;
pub use flashcards::FlashcardsPanel;
pub use job::{DocumentId, JobKind, SessionId, SessionIds, TrackedJob};
pub use msg::{Msg, Surface};
pub use policy::{PollPolicy, TransportErrorPolicy};
pub use session::{PollOutcome, PollSession, SessionCommand, SessionEvent, SessionPhase, Step};
pub use state::AppState;
pub use status::{Flashcard, JobState, JobStatus, Payload, TransportError, TransportErrorKind};
pub use summary::SummaryPanel;
pub use tracker::{ErrorTexts, JobError, JobTracker, JobView};
pub use update::update;
pub use view_model::{
    AppViewModel, CardView, ChatMessageView, ChatView, DeckView, ErrorView, FlashcardsView,
    MessageId, Role, SummaryView, QUICK_PROMPTS,
};
