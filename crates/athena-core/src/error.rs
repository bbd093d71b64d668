//! Error types.
//!
//! [`BackendError`] is what every [`QuizBackend`](crate::traits::QuizBackend)
//! call fails with. It lives here rather than in the HTTP crate so the session
//! and dashboard can classify failures without string matching.

use thiserror::Error;

use crate::model::QuestionId;

/// Errors that can occur when talking to the athena backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend answered 404.
    #[error("not found: {0}")]
    NotFound(String),

    /// The backend returned any other non-2xx response.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// The response body did not have the expected shape.
    #[error("malformed response: {0}")]
    Decode(String),

    /// The configured base URL cannot be used for requests.
    #[error("invalid backend URL: {0}")]
    InvalidBaseUrl(String),
}

impl BackendError {
    /// Returns `true` for a 404 from the backend.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::NotFound(_))
    }

    /// Returns `true` if the failure happened before any response arrived.
    pub fn is_transport(&self) -> bool {
        matches!(self, BackendError::Timeout(_) | BackendError::Network(_))
    }
}

/// Input rejected before anything is sent to the backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("quiz set title cannot be empty")]
    EmptyTitle,

    #[error("no source URLs given")]
    NoUrls,
}

/// A scrape request that failed either validation or the backend call.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("scraping failed: {0}")]
    Backend(#[from] BackendError),
}

/// Errors from mutating the question list.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NavigatorError {
    #[error("question {0} not found")]
    QuestionNotFound(QuestionId),

    #[error("option {index} out of range for question {question_id} ({len} options)")]
    OptionOutOfRange {
        question_id: QuestionId,
        index: usize,
        len: usize,
    },
}
