//! # dr-client
//!
//! HTTP transport for the DeepResearch backend.
//!
//! | request | method | framing |
//! |---|---|---|
//! | start   | `GET {stream_path}/{thread_id}?goal=..` | event-stream |
//! | resume  | `POST {review_path}` (JSON) | chunked |
//! | ingest  | `POST {ingest_path}` (multipart `file`) | chunked |
//!
//! [`ResearchClient`] implements [`Transport`], so a
//! [`SessionController`](dr_session::SessionController) can drive it directly.

mod error;
mod http;

pub use error::ClientError;

use std::path::Path;
use std::time::Duration;

use dr_config::ServerConfig;
use dr_core::ids::ThreadId;
use dr_session::{ReviewRequest, StreamRequest, Transport};
use dr_stream::{BoxFrameStream, FramingKind};
use reqwest::header::{ACCEPT, CACHE_CONTROL, HeaderValue};
use reqwest::multipart::{Form, Part};

use crate::http::{check_response, frames};

const EVENT_STREAM: &str = "text/event-stream";

// ── Client ─────────────────────────────────────────────────────────

/// HTTP client for one research backend.
#[derive(Debug, Clone)]
pub struct ResearchClient {
    http: reqwest::Client,
    server: ServerConfig,
}

impl ResearchClient {
    /// Build a client for the configured backend.
    ///
    /// Only a connect timeout is set: research streams stay open for as
    /// long as the workflow runs.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the underlying `reqwest::Client`
    /// fails to build.
    pub fn from_config(server: &ServerConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .user_agent(server.user_agent.as_str())
            .connect_timeout(Duration::from_secs(server.connect_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            server: server.clone(),
        })
    }

    pub const fn server(&self) -> &ServerConfig {
        &self.server
    }

    /// URL of the initial research stream for `thread_id` and `goal`.
    pub fn stream_url(&self, thread_id: &ThreadId, goal: &str) -> String {
        format!(
            "{}/{}?goal={}",
            self.server.endpoint(&self.server.stream_path).trim_end_matches('/'),
            urlencoding::encode(thread_id.as_str()),
            urlencoding::encode(goal)
        )
    }

    pub fn review_url(&self) -> String {
        self.server.endpoint(&self.server.review_path)
    }

    pub fn ingest_url(&self) -> String {
        self.server.endpoint(&self.server.ingest_path)
    }

    /// Open the initial research stream.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the request fails or the backend answers
    /// with a non-success status.
    pub async fn start_stream(
        &self,
        thread_id: &ThreadId,
        goal: &str,
    ) -> Result<BoxFrameStream, ClientError> {
        let url = self.stream_url(thread_id, goal);
        tracing::debug!(%url, "client: opening research stream");
        let resp = self
            .http
            .get(&url)
            .header(ACCEPT, HeaderValue::from_static(EVENT_STREAM))
            .header(CACHE_CONTROL, HeaderValue::from_static("no-cache"))
            .send()
            .await?;
        let resp = check_response(resp).await?;
        Ok(frames(resp, FramingKind::EventStream))
    }

    /// Send a review decision and open the resumed stream.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the request fails or the backend answers
    /// with a non-success status.
    pub async fn resume_stream(
        &self,
        review: &ReviewRequest,
    ) -> Result<BoxFrameStream, ClientError> {
        let url = self.review_url();
        tracing::debug!(%url, thread_id = %review.thread_id, action = %review.action, "client: resuming");
        let resp = self.http.post(&url).json(review).send().await?;
        let resp = check_response(resp).await?;
        Ok(frames(resp, FramingKind::Chunked))
    }

    /// Upload a document for ingestion.
    ///
    /// The file is read fully into memory and sent as the `file` part of a
    /// multipart form, named after the file.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Io`] if the file cannot be read, otherwise the
    /// same errors as the stream requests.
    pub async fn upload_document(&self, path: &Path) -> Result<BoxFrameStream, ClientError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map_or_else(|| "upload".to_string(), |name| name.to_string_lossy().into_owned());
        tracing::debug!(file = %file_name, bytes = bytes.len(), "client: uploading document");

        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));
        let resp = self
            .http
            .post(self.ingest_url())
            .multipart(form)
            .send()
            .await?;
        let resp = check_response(resp).await?;
        Ok(frames(resp, FramingKind::Chunked))
    }
}

impl Transport for ResearchClient {
    type Error = ClientError;

    async fn open(&self, request: &StreamRequest) -> Result<BoxFrameStream, ClientError> {
        match request {
            StreamRequest::Start { thread_id, goal } => self.start_stream(thread_id, goal).await,
            StreamRequest::Resume(review) => self.resume_stream(review).await,
        }
    }

    async fn upload(&self, path: &Path) -> Result<BoxFrameStream, ClientError> {
        self.upload_document(path).await
    }
}
