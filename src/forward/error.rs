//! Forward module error types
//!
//! Every way a chat request can fail, one variant per kind, rendered as
//! `{"error": ..., "details": ...}` at the endpoint.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Error types for the forward module
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ForwardError {
    /// Request body is not valid JSON
    #[error("Invalid JSON format")]
    MalformedPayload(String),
    /// Neither a usable `messages` list nor a non-blank `prompt`
    #[error("Invalid prompt or messages")]
    MissingInput,
    /// Anything other than POST / OPTIONS
    #[error("Only POST requests are accepted")]
    MethodNotAllowed(String),
    /// No API key configured
    #[error("API key is not configured")]
    Misconfiguration,
    /// Provider answered with an `error` object
    #[error("Gemini API error")]
    Upstream(String),
    /// Provider answered without any candidate
    #[error("No response received from AI")]
    EmptyUpstreamResponse(Option<String>),
    /// First candidate carries no text
    #[error("No content received from AI")]
    EmptyContent,
    /// Network or decoding failure talking to the provider
    #[error("Server error")]
    Transport(String),
}

/// Error body sent to clients
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl ForwardError {
    pub fn status(&self) -> StatusCode {
        match self {
            ForwardError::MalformedPayload(_) | ForwardError::MissingInput => {
                StatusCode::BAD_REQUEST
            }
            ForwardError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ForwardError::Misconfiguration
            | ForwardError::Upstream(_)
            | ForwardError::EmptyUpstreamResponse(_)
            | ForwardError::EmptyContent
            | ForwardError::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::MalformedPayload(_) => "malformed_payload",
            ForwardError::MissingInput => "missing_input",
            ForwardError::MethodNotAllowed(_) => "method_not_allowed",
            ForwardError::Misconfiguration => "misconfiguration",
            ForwardError::Upstream(_) => "upstream_error",
            ForwardError::EmptyUpstreamResponse(_) => "empty_upstream_response",
            ForwardError::EmptyContent => "empty_content",
            ForwardError::Transport(_) => "transport",
        }
    }

    pub fn details(&self) -> Option<String> {
        match self {
            ForwardError::MalformedPayload(msg)
            | ForwardError::Upstream(msg)
            | ForwardError::Transport(msg) => Some(msg.clone()),
            ForwardError::EmptyUpstreamResponse(reason) => reason.clone(),
            ForwardError::MissingInput
            | ForwardError::MethodNotAllowed(_)
            | ForwardError::Misconfiguration
            | ForwardError::EmptyContent => None,
        }
    }
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        let status = self.status();
        let details = self.details();

        if status.is_server_error() {
            crate::logger::error(
                "forward_error",
                &format!(
                    "Returning error response: status={}, kind={}, details={}",
                    status.as_u16(),
                    self.kind(),
                    details.as_deref().unwrap_or("-")
                ),
            );
        } else {
            let method = match &self {
                ForwardError::MethodNotAllowed(method) => method.as_str(),
                _ => "-",
            };
            crate::logger::debug(
                "forward_error",
                &format!(
                    "Rejected request: status={}, kind={}, method={}",
                    status.as_u16(),
                    self.kind(),
                    method
                ),
            );
        }

        let body = ErrorBody {
            error: self.to_string(),
            details,
        };
        (status, Json(body)).into_response()
    }
}

/// Result type alias for forward operations
pub type ForwardResult<T> = Result<T, ForwardError>;
