use serde::Deserialize;
use shelf_core::{
    Flashcard, JobKind, JobState, JobStatus, Payload, TransportError, TransportErrorKind,
};

/// Union of the three status bodies: `{status, summary?}`,
/// `{status, flashcards?}` and `{status, answer?}`.
#[derive(Debug, Deserialize)]
struct StatusBody {
    status: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    flashcards: Option<Vec<Flashcard>>,
    #[serde(default)]
    answer: Option<String>,
}

/// Decodes a status body for `kind`. The payload is only kept for `ready`.
pub(crate) fn decode_status(kind: JobKind, body: &[u8]) -> Result<JobStatus, TransportError> {
    let raw: StatusBody = serde_json::from_slice(body)
        .map_err(|err| TransportError::new(TransportErrorKind::Decode, err.to_string()))?;

    let state = JobState::from_wire(&raw.status)
        .filter(|state| state.is_valid_for(kind))
        .ok_or_else(|| {
            TransportError::new(
                TransportErrorKind::Decode,
                format!("unexpected {kind} status {:?}", raw.status),
            )
        })?;

    if state != JobState::Ready {
        return Ok(JobStatus::new(state));
    }

    let payload = match kind {
        JobKind::Summary => raw.summary.map(Payload::Summary),
        JobKind::Flashcards => raw.flashcards.map(Payload::Flashcards),
        JobKind::Answer => raw.answer.map(Payload::Answer),
    };
    Ok(JobStatus { state, payload })
}
