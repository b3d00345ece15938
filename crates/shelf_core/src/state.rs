use crate::chat::ChatPanel;
use crate::flashcards::FlashcardsPanel;
use crate::summary::SummaryPanel;
use crate::tracker::JobTracker;
use crate::view_model::AppViewModel;
use crate::{SessionId, SessionIds};

/// Everything the interface shows for the open document. Poll state lives
/// here only; nothing is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    pub(crate) summary: SummaryPanel,
    pub(crate) flashcards: FlashcardsPanel,
    pub(crate) chat: ChatPanel,
    pub(crate) sessions: SessionIds,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            summary: self.summary.view(),
            flashcards: self.flashcards.view(),
            chat: self.chat.view(),
            active_sessions: self.active_sessions(),
            dirty: self.dirty,
        }
    }

    /// Returns and clears the dirty flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Tracker that currently owns `session`, on any surface.
    pub fn tracker_for(&self, session: SessionId) -> Option<&JobTracker> {
        let owns = |tracker: &&JobTracker| tracker.session_id() == Some(session);
        self.summary
            .tracker()
            .filter(owns)
            .or_else(|| self.flashcards.tracker().filter(owns))
            .or_else(|| self.chat.tracker_for(session))
    }

    /// Poll attempts made so far by the session, while it is polling.
    pub fn session_attempts(&self, session: SessionId) -> Option<u32> {
        self.tracker_for(session).and_then(JobTracker::attempts)
    }

    fn active_sessions(&self) -> Vec<SessionId> {
        let mut sessions: Vec<SessionId> = self
            .summary
            .tracker()
            .and_then(JobTracker::session_id)
            .into_iter()
            .chain(self.flashcards.tracker().and_then(JobTracker::session_id))
            .chain(self.chat.active_sessions())
            .collect();
        sessions.sort_unstable();
        sessions
    }
}
