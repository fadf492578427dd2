//! Shared error type for the upstream API clients

use thiserror::Error;

/// Errors from the IBM Cloud API clients
#[derive(Debug, Error)]
pub enum ApiError {
    /// The service answered with a non-success status; the raw response
    /// body is carried for diagnosability
    #[error("{service} request failed with status {status}: {body}")]
    Service {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{0} returned an empty resource collection")]
    EmptyResponse(&'static str),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    /// HTTP status of the failure, when one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Service { status, .. } => Some(*status),
            ApiError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
