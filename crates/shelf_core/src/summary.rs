use crate::tracker::{ErrorTexts, JobTracker, JobView};
use crate::view_model::{ErrorView, SummaryView};
use crate::{Effect, JobStatus, Payload, SessionId, SessionIds, TrackedJob, TransportError};

const TEXTS: ErrorTexts = ErrorTexts {
    probe: "Failed to fetch summary status",
    trigger: "Failed to trigger summary generation",
    job_failed: "Failed to generate summary",
    timed_out: "Summary generation timed out. Please try again.",
};

/// Summary surface for the currently open document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SummaryPanel {
    tracker: Option<JobTracker>,
}

impl SummaryPanel {
    pub fn tracker(&self) -> Option<&JobTracker> {
        self.tracker.as_ref()
    }

    pub fn mount(&mut self, document_id: &str, ids: &mut SessionIds) -> Vec<Effect> {
        let mut effects = self.unmount();
        let mut tracker = JobTracker::new(TrackedJob::summary(document_id));
        effects.extend(tracker.mount(ids));
        self.tracker = Some(tracker);
        effects
    }

    pub fn unmount(&mut self) -> Vec<Effect> {
        self.tracker
            .take()
            .map(|mut tracker| tracker.cancel())
            .unwrap_or_default()
    }

    pub fn generate(&mut self, ids: &mut SessionIds) -> Vec<Effect> {
        match self.tracker.as_mut() {
            Some(tracker) => tracker.generate(ids),
            None => Vec::new(),
        }
    }

    /// Retry is offered by the error view only; an empty ready summary
    /// counts as an error here even though the job itself succeeded.
    pub fn retry(&mut self, ids: &mut SessionIds) -> Vec<Effect> {
        if matches!(self.view(), SummaryView::Error(_)) {
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

    pub fn view(&self) -> SummaryView {
        let Some(tracker) = &self.tracker else {
            return SummaryView::Closed;
        };
        match tracker.view() {
            JobView::Loading => SummaryView::Loading {
                stage: tracker.latest().map(|status| status.state),
            },
            JobView::Empty => SummaryView::Empty,
            JobView::Content(Payload::Summary(text)) if !text.trim().is_empty() => {
                SummaryView::Content {
                    paragraphs: text.split('\n').map(ToOwned::to_owned).collect(),
                }
            }
            JobView::Content(_) | JobView::NotFound => SummaryView::Error(ErrorView {
                message: TEXTS.job_failed.to_string(),
                detail: None,
                can_retry: true,
            }),
            JobView::Error(err) => SummaryView::Error(err.describe(&TEXTS)),
        }
    }
}
