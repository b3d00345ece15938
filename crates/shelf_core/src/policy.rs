use std::time::Duration;

use crate::JobKind;

/// What a poll session does when a status fetch fails in transit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorPolicy {
    /// Count the failed fetch as an attempt, remember the error and keep
    /// polling. The last error is reported with the timeout outcome.
    Tolerate,
    /// End the session with a transport failure on the first error.
    Abort,
}

/// Cadence and budget of one poll session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
    pub on_transport_error: TransportErrorPolicy,
}

impl PollPolicy {
    pub const SUMMARY_INTERVAL: Duration = Duration::from_millis(2000);
    pub const SUMMARY_MAX_ATTEMPTS: u32 = 45;
    pub const ANSWER_INTERVAL: Duration = Duration::from_millis(1000);
    pub const ANSWER_MAX_ATTEMPTS: u32 = 60;

    /// Constant-interval policy for `kind`.
    ///
    /// Every kind tolerates transport errors while polling; an unreachable
    /// backend surfaces as a timeout carrying the last error.
    pub fn for_kind(kind: JobKind) -> Self {
        let (interval, max_attempts) = match kind {
            JobKind::Summary | JobKind::Flashcards => {
                (Self::SUMMARY_INTERVAL, Self::SUMMARY_MAX_ATTEMPTS)
            }
            JobKind::Answer => (Self::ANSWER_INTERVAL, Self::ANSWER_MAX_ATTEMPTS),
        };
        Self {
            interval,
            max_attempts,
            on_transport_error: TransportErrorPolicy::Tolerate,
        }
    }

    pub fn with_transport_errors(mut self, policy: TransportErrorPolicy) -> Self {
        self.on_transport_error = policy;
        self
    }
}
