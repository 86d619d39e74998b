//! Ways a chat stream can end badly.

use std::fmt::Display;

use thiserror::Error;

/// Every failure a stream can report through
/// [`EventSink::on_error`](crate::EventSink::on_error).
///
/// Malformed bytes are not represented here: they are replaced with
/// U+FFFD during decoding and never end a stream.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    /// Sending the request or reading the body failed (connection drop,
    /// reset, timeout).
    #[error("{0}")]
    Transport(String),

    /// The server sent the `[ERROR]` marker. Holds the marker and the
    /// server's text verbatim.
    #[error("{0}")]
    Protocol(String),

    /// The request was answered with a non-2xx status. Reported before any
    /// body bytes are decoded.
    #[error("{message}")]
    Response {
        /// HTTP status code.
        status: u16,
        /// Classified, human-readable failure.
        message: String,
    },

    /// The request could not be built, e.g. from an invalid endpoint.
    /// Nothing was sent.
    #[error("{0}")]
    InvalidRequest(String),

    /// The caller's cancellation token fired while the stream was live.
    #[error("stream cancelled")]
    Cancelled,
}

impl StreamError {
    /// A failed request send.
    pub fn network(err: impl Display) -> Self {
        Self::Transport(format!("network error: {err}"))
    }

    /// A failed body read.
    pub fn read_failed(err: impl Display) -> Self {
        Self::Transport(format!("stream read failed: {err}"))
    }

    /// Whether the failure was reported by the server rather than caused
    /// locally.
    #[must_use]
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Protocol(_) | Self::Response { .. })
    }

    /// Whether repeating the request might succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Response { status, .. } => *status == 429 || (500..=599).contains(status),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            StreamError::network("connection refused").to_string(),
            "network error: connection refused"
        );
        assert_eq!(
            StreamError::read_failed("reset by peer").to_string(),
            "stream read failed: reset by peer"
        );
        assert_eq!(
            StreamError::Protocol("[ERROR]quota exceeded".into()).to_string(),
            "[ERROR]quota exceeded"
        );
        assert_eq!(
            StreamError::Response {
                status: 500,
                message: "HTTP 500: boom".into()
            }
            .to_string(),
            "HTTP 500: boom"
        );
        assert_eq!(StreamError::Cancelled.to_string(), "stream cancelled");
    }

    #[test]
    fn upstream_classification() {
        assert!(StreamError::Protocol("[ERROR]".into()).is_upstream());
        assert!(
            StreamError::Response {
                status: 400,
                message: String::new()
            }
            .is_upstream()
        );
        assert!(!StreamError::read_failed("x").is_upstream());
        assert!(!StreamError::Cancelled.is_upstream());
        assert!(!StreamError::InvalidRequest("bad url".into()).is_upstream());
    }

    #[test]
    fn retryable_classification() {
        assert!(StreamError::read_failed("timeout").is_retryable());
        assert!(
            StreamError::Response {
                status: 503,
                message: String::new()
            }
            .is_retryable()
        );
        assert!(
            StreamError::Response {
                status: 429,
                message: String::new()
            }
            .is_retryable()
        );
        assert!(
            !StreamError::Response {
                status: 400,
                message: String::new()
            }
            .is_retryable()
        );
        assert!(!StreamError::Protocol("[ERROR]".into()).is_retryable());
        assert!(!StreamError::Cancelled.is_retryable());
    }
}
