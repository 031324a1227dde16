//! The seam between the controller and whatever carries frames.

use std::fmt::Display;
use std::future::Future;
use std::path::Path;

use dr_core::enums::ReviewAction;
use dr_core::ids::ThreadId;
use dr_stream::BoxFrameStream;
use serde::Serialize;

/// Body of a resume request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewRequest {
    pub thread_id: ThreadId,
    pub action: ReviewAction,
    /// `null` on approve.
    pub feedback: Option<String>,
}

/// Addressing for one stream open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamRequest {
    Start { thread_id: ThreadId, goal: String },
    Resume(ReviewRequest),
}

impl StreamRequest {
    #[must_use]
    pub const fn thread_id(&self) -> &ThreadId {
        match self {
            Self::Start { thread_id, .. } => thread_id,
            Self::Resume(review) => &review.thread_id,
        }
    }

    #[must_use]
    pub const fn is_resume(&self) -> bool {
        matches!(self, Self::Resume(_))
    }
}

/// Opens frame streams for the controller.
///
/// An implementation picks the framing for each request; the controller
/// only ever sees decoded frames. Dropping a returned stream must release
/// the underlying connection.
pub trait Transport {
    type Error: Display;

    /// Open the initial stream or a resume stream.
    fn open(
        &self,
        request: &StreamRequest,
    ) -> impl Future<Output = Result<BoxFrameStream, Self::Error>> + Send;

    /// Upload a document for ingestion and stream back its progress frames.
    fn upload(
        &self,
        path: &Path,
    ) -> impl Future<Output = Result<BoxFrameStream, Self::Error>> + Send;
}
