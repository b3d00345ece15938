use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, Response};
use shelf_core::{JobKind, JobStatus, TrackedJob, TransportError, TransportErrorKind};
use shelf_logging::{shelf_debug, shelf_trace};
use url::Url;

use crate::wire::decode_status;

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Request functions for generation jobs. No retry or timing logic lives
/// here; that belongs to the poll session.
#[async_trait::async_trait]
pub trait JobClient: Send + Sync {
    /// Asks the backend to start generating. Not safe to repeat blindly.
    async fn trigger(&self, job: &TrackedJob) -> Result<JobStatus, TransportError>;

    /// Reads the current status. Always safe to repeat.
    async fn fetch_status(&self, job: &TrackedJob) -> Result<JobStatus, TransportError>;
}

/// HTTP client for the document backend.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    http: reqwest::Client,
    base: Url,
}

impl ReqwestClient {
    pub fn new(settings: ClientSettings) -> Result<Self, TransportError> {
        let base = Url::parse(&settings.base_url).map_err(|err| {
            TransportError::new(
                TransportErrorKind::InvalidRequest,
                format!("bad base url {:?}: {err}", settings.base_url),
            )
        })?;
        if base.cannot_be_a_base() {
            return Err(TransportError::new(
                TransportErrorKind::InvalidRequest,
                format!("base url {:?} cannot carry paths", settings.base_url),
            ));
        }
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| TransportError::new(TransportErrorKind::Network, err.to_string()))?;
        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Joins percent-encoded path segments onto the base url.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub(crate) fn endpoint_with_query(&self, segments: &[&str], query: &str) -> Url {
        let mut url = self.endpoint(segments);
        url.query_pairs_mut().append_pair("q", query);
        url
    }

    /// Sends a request and turns transport failures and non-2xx statuses
    /// into [`TransportError`].
    pub(crate) async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<Response, TransportError> {
        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        shelf_trace!("{} {}", status.as_u16(), response.url());
        if status.is_success() {
            return Ok(response);
        }
        let body = response.bytes().await.unwrap_or_default();
        Err(TransportError::new(
            TransportErrorKind::HttpStatus(status.as_u16()),
            error_detail(&body).unwrap_or_else(|| status.to_string()),
        ))
    }

    pub(crate) fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        self.http.request(method, url)
    }

    fn job_request(
        &self,
        job: &TrackedJob,
        trigger: bool,
    ) -> Result<reqwest::RequestBuilder, TransportError> {
        let id = job.document_id.as_str();
        let method = if trigger { Method::POST } else { Method::GET };
        match job.kind {
            JobKind::Summary => Ok(self.request(method, self.endpoint(&["files", id, "summary"]))),
            JobKind::Flashcards => {
                Ok(self.request(method, self.endpoint(&["files", id, "flashcards"])))
            }
            JobKind::Answer => {
                let question = job.question.as_deref().ok_or_else(|| {
                    TransportError::new(
                        TransportErrorKind::InvalidRequest,
                        "answer job without a question",
                    )
                })?;
                if trigger {
                    let body = serde_json::json!({ "question": question });
                    Ok(self
                        .request(method, self.endpoint(&["files", id, "ask"]))
                        .header(CONTENT_TYPE, "application/json")
                        .body(body.to_string()))
                } else {
                    // Answers are looked up by the literal question text.
                    let url = self.endpoint_with_query(&["files", id, "ask"], question);
                    Ok(self.request(method, url))
                }
            }
        }
    }

    async fn job_call(
        &self,
        job: &TrackedJob,
        trigger: bool,
    ) -> Result<JobStatus, TransportError> {
        let request = self.job_request(job, trigger)?;
        let response = self.send(request).await?;
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        let status = decode_status(job.kind, &body)?;
        shelf_debug!(
            "{} {} -> {}",
            if trigger { "trigger" } else { "status" },
            job,
            status.state
        );
        Ok(status)
    }
}

#[async_trait::async_trait]
impl JobClient for ReqwestClient {
    async fn trigger(&self, job: &TrackedJob) -> Result<JobStatus, TransportError> {
        self.job_call(job, true).await
    }

    async fn fetch_status(&self, job: &TrackedJob) -> Result<JobStatus, TransportError> {
        self.job_call(job, false).await
    }
}

/// Pulls `detail` out of an error body such as `{"detail": "..."}`.
pub(crate) fn error_detail(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::new(TransportErrorKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return TransportError::new(TransportErrorKind::Decode, err.to_string());
    }
    TransportError::new(TransportErrorKind::Network, err.to_string())
}
