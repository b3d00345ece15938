//! Poll controller: the timing state machine for one tracked job.
//!
//! A [`PollSession`] never performs I/O. Every method returns a [`Step`]
//! describing the requests the owner must issue (fetch, arm or disarm the
//! timer) and, when the session changed state, the single event the owner
//! observes.

use std::time::Duration;

use shelf_logging::{shelf_debug, shelf_info, shelf_warn};

use crate::{
    JobState, JobStatus, Payload, PollPolicy, SessionId, TrackedJob, TransportError,
    TransportErrorPolicy,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Polling,
    Succeeded,
    Failed,
    TimedOut,
    Cancelled,
}

/// Terminal result of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Succeeded(Option<Payload>),
    /// The backend reported `failed`.
    JobFailed,
    /// Answer only: the backend has no answer for the question.
    NotFound,
    /// Attempt budget exhausted while the job was still running.
    TimedOut { last_error: Option<TransportError> },
    /// Only produced under [`TransportErrorPolicy::Abort`].
    TransportFailed(TransportError),
    Cancelled,
}

impl PollOutcome {
    pub fn phase(&self) -> SessionPhase {
        match self {
            PollOutcome::Succeeded(_) => SessionPhase::Succeeded,
            PollOutcome::JobFailed | PollOutcome::NotFound | PollOutcome::TransportFailed(_) => {
                SessionPhase::Failed
            }
            PollOutcome::TimedOut { .. } => SessionPhase::TimedOut,
            PollOutcome::Cancelled => SessionPhase::Cancelled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Fetch,
    ArmTimer(Duration),
    DisarmTimer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A non-terminal status was observed; polling continues.
    Observed(JobStatus),
    Finished(PollOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Step {
    pub commands: Vec<SessionCommand>,
    pub event: Option<SessionEvent>,
}

impl Step {
    fn none() -> Self {
        Self::default()
    }

    fn command(command: SessionCommand) -> Self {
        Self {
            commands: vec![command],
            event: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.event.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    Idle,
    Polling,
    Finished(PollOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSession {
    id: SessionId,
    job: TrackedJob,
    policy: PollPolicy,
    attempts: u32,
    in_flight: bool,
    last_error: Option<TransportError>,
    phase: Phase,
}

impl PollSession {
    pub fn new(id: SessionId, job: TrackedJob, policy: PollPolicy) -> Self {
        Self {
            id,
            job,
            policy,
            attempts: 0,
            in_flight: false,
            last_error: None,
            phase: Phase::Idle,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn job(&self) -> &TrackedJob {
        &self.job
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn phase(&self) -> SessionPhase {
        match &self.phase {
            Phase::Idle => SessionPhase::Idle,
            Phase::Polling => SessionPhase::Polling,
            Phase::Finished(outcome) => outcome.phase(),
        }
    }

    pub fn outcome(&self) -> Option<&PollOutcome> {
        match &self.phase {
            Phase::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished(_))
    }

    /// Issues the immediate status fetch. Only valid from `Idle`.
    pub fn start(&mut self) -> Step {
        if self.phase != Phase::Idle || self.in_flight {
            return Step::none();
        }
        shelf_debug!("session {} started for {}", self.id, self.job);
        self.in_flight = true;
        Step::command(SessionCommand::Fetch)
    }

    /// Starts from a status the owner already holds (a trigger response or
    /// a mount probe) instead of fetching it again.
    pub fn start_from(&mut self, status: JobStatus) -> Step {
        if self.phase != Phase::Idle || self.in_flight {
            return Step::none();
        }
        shelf_debug!(
            "session {} started for {} from known status {}",
            self.id,
            self.job,
            status.state
        );
        self.in_flight = true;
        self.on_response(Ok(status))
    }

    /// Timer fire. Skipped while a fetch is still outstanding.
    pub fn on_tick(&mut self) -> Step {
        if self.phase != Phase::Polling {
            return Step::none();
        }
        if self.in_flight {
            shelf_debug!(
                "session {} skipped tick, fetch {} still outstanding",
                self.id,
                self.attempts
            );
            return Step::none();
        }
        self.attempts += 1;
        self.in_flight = true;
        Step::command(SessionCommand::Fetch)
    }

    /// Applies the result of the outstanding fetch.
    ///
    /// Results arriving after the session finished (or with no fetch
    /// outstanding) are discarded.
    pub fn on_response(&mut self, result: Result<JobStatus, TransportError>) -> Step {
        if !self.in_flight || self.is_finished() {
            shelf_debug!("session {} discarded stale response", self.id);
            return Step::none();
        }
        self.in_flight = false;
        let was_polling = self.phase == Phase::Polling;

        let status = match result {
            Ok(status) => status,
            Err(err) => return self.on_transport_error(err, was_polling),
        };

        match status.state {
            JobState::Ready => self.finish(PollOutcome::Succeeded(status.payload), was_polling),
            JobState::Failed => self.finish(PollOutcome::JobFailed, was_polling),
            JobState::NotFound => self.finish(PollOutcome::NotFound, was_polling),
            JobState::NotGenerated | JobState::Queued | JobState::Processing => {
                if self.budget_exhausted() {
                    let last_error = self.last_error.take();
                    return self.finish(PollOutcome::TimedOut { last_error }, was_polling);
                }
                let mut step = Step {
                    commands: Vec::new(),
                    event: Some(SessionEvent::Observed(status)),
                };
                if !was_polling {
                    self.phase = Phase::Polling;
                    step.commands.push(SessionCommand::ArmTimer(self.policy.interval));
                }
                step
            }
        }
    }

    /// Stops the session. No event is emitted for a cancellation.
    pub fn cancel(&mut self) -> Step {
        let was_polling = match self.phase {
            Phase::Finished(_) => return Step::none(),
            Phase::Polling => true,
            Phase::Idle => false,
        };
        shelf_debug!(
            "session {} cancelled after {} attempts",
            self.id,
            self.attempts
        );
        self.phase = Phase::Finished(PollOutcome::Cancelled);
        self.in_flight = false;
        if was_polling {
            Step::command(SessionCommand::DisarmTimer)
        } else {
            Step::none()
        }
    }

    fn on_transport_error(&mut self, err: TransportError, was_polling: bool) -> Step {
        shelf_warn!(
            "session {} fetch for {} failed: {}",
            self.id,
            self.job,
            err
        );
        match self.policy.on_transport_error {
            TransportErrorPolicy::Abort => {
                self.finish(PollOutcome::TransportFailed(err), was_polling)
            }
            TransportErrorPolicy::Tolerate => {
                self.last_error = Some(err);
                if self.budget_exhausted() {
                    let last_error = self.last_error.take();
                    return self.finish(PollOutcome::TimedOut { last_error }, was_polling);
                }
                if was_polling {
                    Step::none()
                } else {
                    self.phase = Phase::Polling;
                    Step::command(SessionCommand::ArmTimer(self.policy.interval))
                }
            }
        }
    }

    fn budget_exhausted(&self) -> bool {
        self.attempts > self.policy.max_attempts
    }

    fn finish(&mut self, outcome: PollOutcome, was_polling: bool) -> Step {
        shelf_info!(
            "session {} for {} finished after {} attempts: {:?}",
            self.id,
            self.job,
            self.attempts,
            outcome.phase()
        );
        self.phase = Phase::Finished(outcome.clone());
        Step {
            commands: if was_polling {
                vec![SessionCommand::DisarmTimer]
            } else {
                Vec::new()
            },
            event: Some(SessionEvent::Finished(outcome)),
        }
    }
}
