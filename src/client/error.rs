//! Client error types.

use axum::http::StatusCode;

use crate::resilience::DeadlineExceeded;

/// Errors surfaced to callers of a remote service.
///
/// Transport failures never appear here; they become the fallback value.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("client '{service}': invalid url: {source}")]
    InvalidUrl {
        service: String,
        source: url::ParseError,
    },

    #[error("client '{service}': failed to build transport: {source}")]
    Transport {
        service: String,
        source: reqwest::Error,
    },

    #[error("client '{service}': failed to decode response: {source}")]
    Decode {
        service: String,
        source: serde_json::Error,
    },
}

/// Why a call ended in the fallback.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CallFailure {
    #[error("circuit open")]
    CircuitOpen,

    #[error("too many concurrent calls")]
    Saturated,

    #[error(transparent)]
    Deadline(#[from] DeadlineExceeded),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(StatusCode),
}

impl CallFailure {
    /// Metric label for this failure.
    pub(crate) fn outcome(&self) -> &'static str {
        match self {
            CallFailure::CircuitOpen => "short_circuited",
            CallFailure::Saturated => "rejected",
            CallFailure::Deadline(_) => "timeout",
            CallFailure::Request(_) => "error",
            CallFailure::Status(_) => "bad_status",
        }
    }

    /// Whether the downstream service is to blame.
    pub(crate) fn counts_against_circuit(&self) -> bool {
        !matches!(self, CallFailure::CircuitOpen | CallFailure::Saturated)
    }
}
