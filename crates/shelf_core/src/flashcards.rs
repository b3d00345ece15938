use crate::tracker::{ErrorTexts, JobTracker, JobView};
use crate::view_model::{CardView, DeckView, ErrorView, FlashcardsView};
use crate::{
    Effect, Flashcard, JobStatus, Payload, SessionId, SessionIds, TrackedJob, TransportError,
};

const TEXTS: ErrorTexts = ErrorTexts {
    probe: "Failed to fetch flashcards status",
    trigger: "Failed to trigger flashcard generation",
    job_failed: "Failed to load flashcards",
    timed_out: "Flashcard generation timed out.",
};

/// Flashcard surface: the generated deck plus the reader's position in it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FlashcardsPanel {
    tracker: Option<JobTracker>,
    index: usize,
    show_answer: bool,
}

impl FlashcardsPanel {
    pub fn tracker(&self) -> Option<&JobTracker> {
        self.tracker.as_ref()
    }

    pub fn mount(&mut self, document_id: &str, ids: &mut SessionIds) -> Vec<Effect> {
        let mut effects = self.unmount();
        let mut tracker = JobTracker::new(TrackedJob::flashcards(document_id));
        effects.extend(tracker.mount(ids));
        self.tracker = Some(tracker);
        effects
    }

    pub fn unmount(&mut self) -> Vec<Effect> {
        self.reset_position();
        self.tracker
            .take()
            .map(|mut tracker| tracker.cancel())
            .unwrap_or_default()
    }

    pub fn generate(&mut self, ids: &mut SessionIds) -> Vec<Effect> {
        let Some(tracker) = self.tracker.as_mut() else {
            return Vec::new();
        };
        let effects = tracker.generate(ids);
        if !effects.is_empty() {
            self.reset_position();
        }
        effects
    }

    pub fn retry(&mut self, ids: &mut SessionIds) -> Vec<Effect> {
        if matches!(self.view(), FlashcardsView::Error(_)) {
            self.generate(ids)
        } else {
            Vec::new()
        }
    }

    pub fn on_triggered(
        &mut self,
        session: SessionId,
        result: Result<JobStatus, TransportError>,
    ) -> Vec<Effect> {
        match self.tracker.as_mut() {
            Some(tracker) => tracker.on_triggered(session, result),
            None => Vec::new(),
        }
    }

    pub fn on_status(
        &mut self,
        session: SessionId,
        result: Result<JobStatus, TransportError>,
    ) -> Vec<Effect> {
        match self.tracker.as_mut() {
            Some(tracker) => tracker.on_status(session, result),
            None => Vec::new(),
        }
    }

    pub fn on_tick(&mut self, session: SessionId) -> Vec<Effect> {
        match self.tracker.as_mut() {
            Some(tracker) => tracker.on_tick(session),
            None => Vec::new(),
        }
    }

    /// Returns whether the position changed.
    pub fn next_card(&mut self) -> bool {
        let len = self.cards().len();
        if self.index + 1 < len {
            self.index += 1;
            self.show_answer = false;
            true
        } else {
            false
        }
    }

    pub fn prev_card(&mut self) -> bool {
        if self.index > 0 && !self.cards().is_empty() {
            self.index -= 1;
            self.show_answer = false;
            true
        } else {
            false
        }
    }

    pub fn flip_card(&mut self) -> bool {
        if self.cards().is_empty() {
            return false;
        }
        self.show_answer = !self.show_answer;
        true
    }

    pub fn view(&self) -> FlashcardsView {
        let Some(tracker) = &self.tracker else {
            return FlashcardsView::Closed;
        };
        match tracker.view() {
            JobView::Loading => FlashcardsView::Loading {
                stage: tracker.latest().map(|status| status.state),
            },
            JobView::Empty => FlashcardsView::Empty,
            JobView::Content(Payload::Flashcards(cards)) => {
                FlashcardsView::Content(self.deck_view(cards))
            }
            JobView::Content(_) | JobView::NotFound => FlashcardsView::Error(ErrorView {
                message: TEXTS.job_failed.to_string(),
                detail: None,
                can_retry: true,
            }),
            JobView::Error(err) => FlashcardsView::Error(err.describe(&TEXTS)),
        }
    }

    fn deck_view(&self, cards: &[Flashcard]) -> DeckView {
        let total = cards.len();
        let card = cards.get(self.index).map(|card| CardView {
            question: card.question.clone(),
            answer: card.answer.clone(),
            showing_answer: self.show_answer,
        });
        DeckView {
            card,
            position: if total == 0 { 0 } else { self.index + 1 },
            total,
            has_prev: total > 0 && self.index > 0,
            has_next: self.index + 1 < total,
        }
    }

    fn cards(&self) -> &[Flashcard] {
        match self.tracker.as_ref().map(JobTracker::view) {
            Some(JobView::Content(Payload::Flashcards(cards))) => cards.as_slice(),
            _ => &[],
        }
    }

    fn reset_position(&mut self) {
        self.index = 0;
        self.show_answer = false;
    }
}
