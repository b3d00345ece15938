use crate::{JobStatus, MessageId, SessionId, TrackedJob, TransportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Summary,
    Flashcards,
    Chat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// A surface was opened for a document; replaces whatever it showed.
    SurfaceOpened {
        surface: Surface,
        document_id: String,
    },
    /// The surface was torn down. Cancels its sessions.
    SurfaceClosed { surface: Surface },
    /// User clicked Generate on the summary or flashcards surface.
    GenerateClicked { surface: Surface },
    /// User clicked Try Again on an error view.
    RetryClicked { surface: Surface },
    NextCardClicked,
    PrevCardClicked,
    FlipCardClicked,
    /// User sent a question (typed or picked from the quick prompts).
    QuestionSubmitted(String),
    /// User asked again after a failed answer.
    RetryQuestionClicked { message_id: MessageId },
    /// Backend reply to an `Effect::Trigger`.
    TriggerCompleted {
        session: SessionId,
        job: TrackedJob,
        result: Result<JobStatus, TransportError>,
    },
    /// Backend reply to an `Effect::FetchStatus`.
    StatusFetched {
        session: SessionId,
        job: TrackedJob,
        result: Result<JobStatus, TransportError>,
    },
    /// A timer armed by `Effect::ArmTimer` fired.
    TimerFired { session: SessionId, job: TrackedJob },
    /// Fallback for placeholder wiring.
    NoOp,
}
