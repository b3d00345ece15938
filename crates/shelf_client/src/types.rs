use shelf_core::{JobStatus, SessionId, TrackedJob, TransportError};

/// Completions reported back by the engine thread, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    TriggerCompleted {
        session: SessionId,
        job: TrackedJob,
        result: Result<JobStatus, TransportError>,
    },
    StatusFetched {
        session: SessionId,
        job: TrackedJob,
        result: Result<JobStatus, TransportError>,
    },
    TimerFired {
        session: SessionId,
        job: TrackedJob,
    },
}

impl EngineEvent {
    pub fn session(&self) -> SessionId {
        match self {
            EngineEvent::TriggerCompleted { session, .. }
            | EngineEvent::StatusFetched { session, .. }
            | EngineEvent::TimerFired { session, .. } => *session,
        }
    }
}
