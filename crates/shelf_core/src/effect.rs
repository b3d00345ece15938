use std::time::Duration;

use crate::{SessionId, TrackedJob};

/// Side effects requested by [`update`](crate::update). The runtime reports
/// the result of each request back as a [`Msg`](crate::Msg) tagged with the
/// same session id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Trigger {
        session: SessionId,
        job: TrackedJob,
    },
    FetchStatus {
        session: SessionId,
        job: TrackedJob,
    },
    /// Start a repeating timer; the first fire comes one interval from now.
    ArmTimer {
        session: SessionId,
        job: TrackedJob,
        interval: Duration,
    },
    DisarmTimer {
        session: SessionId,
    },
}

impl Effect {
    pub fn session(&self) -> SessionId {
        match self {
            Effect::Trigger { session, .. }
            | Effect::FetchStatus { session, .. }
            | Effect::ArmTimer { session, .. }
            | Effect::DisarmTimer { session } => *session,
        }
    }
}
