//! Generic job view model shared by every surface.
//!
//! A [`JobTracker`] owns at most one [`PollSession`] for its job, guards
//! against duplicate triggers, drops responses that belong to an older
//! session, and folds the session's events into a [`JobView`].

use shelf_logging::shelf_debug;

use crate::session::{PollOutcome, PollSession, SessionCommand, SessionEvent, Step};
use crate::view_model::ErrorView;
use crate::{
    Effect, JobKind, JobState, JobStatus, Payload, PollPolicy, SessionId, SessionIds, TrackedJob,
    TransportError,
};

/// Renderable state of one tracked job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobView {
    Loading,
    /// Not generated yet; the surface offers a generate action.
    Empty,
    Content(Payload),
    /// Answer only: the backend has no answer. Not an error.
    NotFound,
    Error(JobError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// The status probe on mount failed.
    Probe(TransportError),
    Trigger(TransportError),
    JobFailed,
    TimedOut { last_error: Option<TransportError> },
    Transport(TransportError),
}

/// User-facing wording for each error of one surface.
#[derive(Debug, Clone, Copy)]
pub struct ErrorTexts {
    pub probe: &'static str,
    pub trigger: &'static str,
    pub job_failed: &'static str,
    pub timed_out: &'static str,
}

impl JobError {
    pub fn describe(&self, texts: &ErrorTexts) -> ErrorView {
        let (message, detail) = match self {
            JobError::Probe(err) | JobError::Transport(err) => (texts.probe, Some(err.to_string())),
            JobError::Trigger(err) => (texts.trigger, Some(err.to_string())),
            JobError::JobFailed => (texts.job_failed, None),
            JobError::TimedOut { last_error } => (
                texts.timed_out,
                last_error.as_ref().map(|err| format!("last error: {err}")),
            ),
        };
        ErrorView {
            message: message.to_string(),
            detail,
            can_retry: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Activity {
    Idle,
    Probing(SessionId),
    Triggering(SessionId),
    Polling(PollSession),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobTracker {
    job: TrackedJob,
    policy: PollPolicy,
    activity: Activity,
    latest: Option<JobStatus>,
    view: JobView,
}

impl JobTracker {
    pub fn new(job: TrackedJob) -> Self {
        let policy = PollPolicy::for_kind(job.kind);
        Self::with_policy(job, policy)
    }

    pub fn with_policy(job: TrackedJob, policy: PollPolicy) -> Self {
        Self {
            job,
            policy,
            activity: Activity::Idle,
            latest: None,
            view: JobView::Loading,
        }
    }

    pub fn job(&self) -> &TrackedJob {
        &self.job
    }

    pub fn view(&self) -> &JobView {
        &self.view
    }

    /// Latest status observed for this job, terminal or not.
    pub fn latest(&self) -> Option<&JobStatus> {
        self.latest.as_ref()
    }

    /// True while a probe, trigger or poll session is outstanding.
    pub fn is_active(&self) -> bool {
        self.activity != Activity::Idle
    }

    pub fn session_id(&self) -> Option<SessionId> {
        match &self.activity {
            Activity::Idle => None,
            Activity::Probing(id) | Activity::Triggering(id) => Some(*id),
            Activity::Polling(session) => Some(session.id()),
        }
    }

    pub fn attempts(&self) -> Option<u32> {
        match &self.activity {
            Activity::Polling(session) => Some(session.attempts()),
            _ => None,
        }
    }

    /// Learns the current state without triggering generation.
    pub fn mount(&mut self, ids: &mut SessionIds) -> Vec<Effect> {
        let mut effects = self.cancel();
        let session = ids.next_id();
        self.activity = Activity::Probing(session);
        self.view = JobView::Loading;
        effects.push(Effect::FetchStatus {
            session,
            job: self.job.clone(),
        });
        effects
    }

    /// Triggers generation unless something is already in flight.
    pub fn generate(&mut self, ids: &mut SessionIds) -> Vec<Effect> {
        if self.is_active() {
            shelf_debug!("generate ignored for {}, already active", self.job);
            return Vec::new();
        }
        let session = ids.next_id();
        self.activity = Activity::Triggering(session);
        self.view = JobView::Loading;
        vec![Effect::Trigger {
            session,
            job: self.job.clone(),
        }]
    }

    /// Same as [`generate`](Self::generate), but only from the error view.
    pub fn retry(&mut self, ids: &mut SessionIds) -> Vec<Effect> {
        if !matches!(self.view, JobView::Error(_)) {
            return Vec::new();
        }
        self.generate(ids)
    }

    pub fn on_triggered(
        &mut self,
        session: SessionId,
        result: Result<JobStatus, TransportError>,
    ) -> Vec<Effect> {
        if self.activity != Activity::Triggering(session) {
            shelf_debug!("dropped stale trigger response for {}", self.job);
            return Vec::new();
        }
        match result {
            Ok(status) => {
                let mut poll = PollSession::new(session, self.job.clone(), self.policy);
                let step = if status.state.is_terminal() {
                    poll.start_from(status)
                } else {
                    self.latest = Some(status);
                    poll.start()
                };
                self.activity = Activity::Polling(poll);
                self.apply(session, step)
            }
            Err(err) => {
                self.activity = Activity::Idle;
                self.view = JobView::Error(JobError::Trigger(err));
                Vec::new()
            }
        }
    }

    pub fn on_status(
        &mut self,
        session: SessionId,
        result: Result<JobStatus, TransportError>,
    ) -> Vec<Effect> {
        if self.activity == Activity::Probing(session) {
            return self.on_probe(session, result);
        }
        if let Activity::Polling(poll) = &mut self.activity {
            if poll.id() == session {
                let step = poll.on_response(result);
                return self.apply(session, step);
            }
        }
        shelf_debug!("dropped stale status for {} (session {})", self.job, session);
        Vec::new()
    }

    pub fn on_tick(&mut self, session: SessionId) -> Vec<Effect> {
        if let Activity::Polling(poll) = &mut self.activity {
            if poll.id() == session {
                let step = poll.on_tick();
                return self.apply(session, step);
            }
        }
        Vec::new()
    }

    fn on_probe(
        &mut self,
        session: SessionId,
        result: Result<JobStatus, TransportError>,
    ) -> Vec<Effect> {
        match result {
            Ok(status) if status.state == JobState::NotGenerated => {
                self.activity = Activity::Idle;
                self.latest = Some(status);
                self.view = JobView::Empty;
                Vec::new()
            }
            Ok(status) => {
                let mut poll = PollSession::new(session, self.job.clone(), self.policy);
                let step = poll.start_from(status);
                self.activity = Activity::Polling(poll);
                self.apply(session, step)
            }
            Err(err) => {
                self.activity = Activity::Idle;
                self.view = JobView::Error(JobError::Probe(err));
                Vec::new()
            }
        }
    }

    /// Cancels whatever is in flight. Responses to it will be dropped.
    pub fn cancel(&mut self) -> Vec<Effect> {
        let activity = std::mem::replace(&mut self.activity, Activity::Idle);
        match activity {
            Activity::Polling(mut poll) => {
                let session = poll.id();
                let step = poll.cancel();
                self.commands_to_effects(session, step.commands)
            }
            Activity::Probing(_) | Activity::Triggering(_) | Activity::Idle => Vec::new(),
        }
    }

    fn apply(&mut self, session: SessionId, step: Step) -> Vec<Effect> {
        match step.event {
            Some(SessionEvent::Observed(status)) => {
                self.latest = Some(status);
                self.view = JobView::Loading;
            }
            Some(SessionEvent::Finished(outcome)) => {
                self.activity = Activity::Idle;
                self.view = self.finish(outcome);
            }
            None => {}
        }
        self.commands_to_effects(session, step.commands)
    }

    fn finish(&mut self, outcome: PollOutcome) -> JobView {
        match outcome {
            PollOutcome::Succeeded(payload) => {
                let payload = payload.unwrap_or_else(|| empty_payload(self.job.kind));
                self.latest = Some(JobStatus::ready(payload.clone()));
                JobView::Content(payload)
            }
            PollOutcome::JobFailed => {
                self.latest = Some(JobStatus::new(JobState::Failed));
                JobView::Error(JobError::JobFailed)
            }
            PollOutcome::NotFound => {
                self.latest = Some(JobStatus::new(JobState::NotFound));
                JobView::NotFound
            }
            PollOutcome::TimedOut { last_error } => {
                JobView::Error(JobError::TimedOut { last_error })
            }
            PollOutcome::TransportFailed(err) => JobView::Error(JobError::Transport(err)),
            // Cancellation never reaches the observer.
            PollOutcome::Cancelled => self.view.clone(),
        }
    }

    fn commands_to_effects(
        &self,
        session: SessionId,
        commands: Vec<SessionCommand>,
    ) -> Vec<Effect> {
        commands
            .into_iter()
            .map(|command| match command {
                SessionCommand::Fetch => Effect::FetchStatus {
                    session,
                    job: self.job.clone(),
                },
                SessionCommand::ArmTimer(interval) => Effect::ArmTimer {
                    session,
                    job: self.job.clone(),
                    interval,
                },
                SessionCommand::DisarmTimer => Effect::DisarmTimer { session },
            })
            .collect()
    }
}

fn empty_payload(kind: JobKind) -> Payload {
    match kind {
        JobKind::Summary => Payload::Summary(String::new()),
        JobKind::Flashcards => Payload::Flashcards(Vec::new()),
        JobKind::Answer => Payload::Answer(String::new()),
    }
}
