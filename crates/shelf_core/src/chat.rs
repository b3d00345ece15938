//! Question-and-answer surface.
//!
//! Every submitted question gets its own [`JobTracker`] keyed by the exact
//! question text, so several answers can be polled at once.

use shelf_logging::shelf_debug;

use crate::tracker::{JobError, JobTracker, JobView};
use crate::view_model::{ChatMessageView, ChatView, MessageId, Role, QUICK_PROMPTS};
use crate::{
    DocumentId, Effect, JobStatus, Payload, SessionId, SessionIds, TrackedJob, TransportError,
};

pub const GREETING: &str = "Ask me anything about this document!";
pub const NOT_FOUND_TEXT: &str = "I couldn't find the answer in the document.";
pub const TIMED_OUT_TEXT: &str = "Sorry, I timed out trying to find the answer.";
pub const FAILED_TEXT: &str = "Sorry, I encountered an error.";
pub const SEND_FAILED_TEXT: &str = "Failed to send question.";

#[derive(Debug, Clone, PartialEq, Eq)]
struct ChatMessage {
    id: MessageId,
    role: Role,
    content: String,
    pending: bool,
    can_retry: bool,
}

/// One question and the tracker producing its answer message.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Thread {
    answer_id: MessageId,
    tracker: JobTracker,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChatPanel {
    document_id: Option<DocumentId>,
    messages: Vec<ChatMessage>,
    threads: Vec<Thread>,
    next_message: MessageId,
}

impl ChatPanel {
    pub fn mount(&mut self, document_id: &str) -> Vec<Effect> {
        let effects = self.unmount();
        self.document_id = Some(document_id.to_string());
        self.next_message = 1;
        let greeting = self.push_message(Role::Assistant, GREETING, false);
        shelf_debug!("chat opened for {} with greeting {}", document_id, greeting);
        effects
    }

    pub fn unmount(&mut self) -> Vec<Effect> {
        let effects = self
            .threads
            .iter_mut()
            .flat_map(|thread| thread.tracker.cancel())
            .collect();
        self.document_id = None;
        self.messages.clear();
        self.threads.clear();
        effects
    }

    /// Sends a question. Blank input is ignored, as is a question whose
    /// identical text is still being answered.
    pub fn submit(&mut self, question: &str, ids: &mut SessionIds) -> Vec<Effect> {
        let Some(document_id) = self.document_id.clone() else {
            return Vec::new();
        };
        if question.trim().is_empty() {
            return Vec::new();
        }
        let job = TrackedJob::answer(document_id, question);
        if self.is_pending(&job, None) {
            return Vec::new();
        }

        self.prune_settled_threads();
        self.push_message(Role::User, question, false);
        let answer_id = self.push_message(Role::Assistant, "", true);
        let mut tracker = JobTracker::new(job);
        let effects = tracker.generate(ids);
        self.threads.push(Thread { answer_id, tracker });
        effects
    }

    /// Re-asks the question behind a failed answer message, unless the same
    /// question is already being answered by a later submission.
    pub fn retry(&mut self, message_id: MessageId, ids: &mut SessionIds) -> Vec<Effect> {
        let Some(index) = self
            .threads
            .iter()
            .position(|thread| thread.answer_id == message_id)
        else {
            return Vec::new();
        };
        let retryable = self
            .messages
            .iter()
            .any(|msg| msg.id == message_id && msg.can_retry);
        if !retryable || self.is_pending(self.threads[index].tracker.job(), Some(index)) {
            return Vec::new();
        }
        let effects = self.threads[index].tracker.generate(ids);
        if !effects.is_empty() {
            self.sync_message(index);
        }
        effects
    }

    pub fn on_triggered(
        &mut self,
        session: SessionId,
        result: Result<JobStatus, TransportError>,
    ) -> Vec<Effect> {
        self.with_thread(session, |tracker| tracker.on_triggered(session, result))
    }

    pub fn on_status(
        &mut self,
        session: SessionId,
        result: Result<JobStatus, TransportError>,
    ) -> Vec<Effect> {
        self.with_thread(session, |tracker| tracker.on_status(session, result))
    }

    pub fn on_tick(&mut self, session: SessionId) -> Vec<Effect> {
        self.with_thread(session, |tracker| tracker.on_tick(session))
    }

    /// Tracker currently driving `session`, if any.
    pub fn tracker_for(&self, session: SessionId) -> Option<&JobTracker> {
        self.threads
            .iter()
            .map(|thread| &thread.tracker)
            .find(|tracker| tracker.session_id() == Some(session))
    }

    pub fn active_sessions(&self) -> impl Iterator<Item = SessionId> + '_ {
        self.threads
            .iter()
            .filter_map(|thread| thread.tracker.session_id())
    }

    pub fn view(&self) -> ChatView {
        ChatView {
            document_id: self.document_id.clone(),
            messages: self
                .messages
                .iter()
                .map(|msg| ChatMessageView {
                    id: msg.id,
                    role: msg.role,
                    content: msg.content.clone(),
                    pending: msg.pending,
                    can_retry: msg.can_retry,
                })
                .collect(),
            pending_answers: self.messages.iter().filter(|msg| msg.pending).count(),
            quick_prompts: if self.document_id.is_some() {
                QUICK_PROMPTS.iter().map(|prompt| prompt.to_string()).collect()
            } else {
                Vec::new()
            },
        }
    }

    /// True when a thread other than `except` is still working on `job`.
    fn is_pending(&self, job: &TrackedJob, except: Option<usize>) -> bool {
        let pending = self.threads.iter().enumerate().any(|(index, thread)| {
            Some(index) != except && thread.tracker.is_active() && thread.tracker.job() == job
        });
        if pending {
            shelf_debug!("question already pending: {:?}", job.question);
        }
        pending
    }

    /// Drops threads whose answer is final: idle and not offering a retry.
    /// Their messages stay in the transcript.
    fn prune_settled_threads(&mut self) {
        let messages = &self.messages;
        self.threads.retain(|thread| {
            thread.tracker.is_active()
                || messages
                    .iter()
                    .any(|msg| msg.id == thread.answer_id && msg.can_retry)
        });
    }

    fn with_thread(
        &mut self,
        session: SessionId,
        apply: impl FnOnce(&mut JobTracker) -> Vec<Effect>,
    ) -> Vec<Effect> {
        let Some(index) = self
            .threads
            .iter()
            .position(|thread| thread.tracker.session_id() == Some(session))
        else {
            shelf_debug!("no chat thread owns session {}", session);
            return Vec::new();
        };
        let effects = apply(&mut self.threads[index].tracker);
        self.sync_message(index);
        effects
    }

    fn sync_message(&mut self, index: usize) {
        let thread = &self.threads[index];
        let (content, pending, can_retry) = match thread.tracker.view() {
            JobView::Loading => (String::new(), true, false),
            JobView::Content(Payload::Answer(text)) if !text.trim().is_empty() => {
                (text.clone(), false, false)
            }
            JobView::NotFound => (NOT_FOUND_TEXT.to_string(), false, false),
            JobView::Error(JobError::TimedOut { .. }) => (TIMED_OUT_TEXT.to_string(), false, true),
            JobView::Error(JobError::Trigger(_)) => (SEND_FAILED_TEXT.to_string(), false, true),
            JobView::Content(_) | JobView::Empty | JobView::Error(_) => {
                (FAILED_TEXT.to_string(), false, true)
            }
        };
        let answer_id = thread.answer_id;
        if let Some(message) = self.messages.iter_mut().find(|msg| msg.id == answer_id) {
            message.content = content;
            message.pending = pending;
            message.can_retry = can_retry;
        }
    }

    fn push_message(&mut self, role: Role, content: &str, pending: bool) -> MessageId {
        let id = self.next_message;
        self.next_message += 1;
        self.messages.push(ChatMessage {
            id,
            role,
            content: content.to_string(),
            pending,
            can_retry: false,
        });
        id
    }
}
