//! Error types for the ingestion pipeline

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse failure category attached to a per-file extraction outcome
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The parser rejected the bytes
    UnsupportedOrCorrupt,
    /// Network or endpoint error
    TransportFailure,
    /// Malformed response shape after a successful transport
    DecodeFailure,
    /// Raw bytes could not be read from the source
    ReadFailure,
    /// Extraction did not finish within the per-file limit
    Timeout,
}

impl ErrorKind {
    /// Stable label used in rendered context and API payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnsupportedOrCorrupt => "unsupported_or_corrupt",
            Self::TransportFailure => "transport_failure",
            Self::DecodeFailure => "decode_failure",
            Self::ReadFailure => "read_failure",
            Self::Timeout => "timeout",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ingestion errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Parser rejected the file contents
    #[error("Failed to parse file '{filename}': {message}")]
    FileParse { filename: String, message: String },

    /// Source bytes could not be read
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Endpoint unreachable or returned a non-success status
    #[error("Transport error: {0}")]
    Transport(String),

    /// Endpoint replied with an unexpected payload
    #[error("Decode error: {0}")]
    Decode(String),

    /// Per-file timeout elapsed
    #[error("Timed out after {0}s")]
    Timeout(u64),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Malformed API request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a file parse error
    pub fn file_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create a read error
    pub fn read(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Project this error onto the per-file failure taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::FileParse { .. }
            | Error::Internal(_)
            | Error::Config(_)
            | Error::InvalidRequest(_) => ErrorKind::UnsupportedOrCorrupt,
            Error::Read { .. } => ErrorKind::ReadFailure,
            Error::Transport(_) | Error::Http(_) => ErrorKind::TransportFailure,
            Error::Decode(_) | Error::Json(_) => ErrorKind::DecodeFailure,
            Error::Timeout(_) => ErrorKind::Timeout,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Error::Config(_) => (StatusCode::BAD_REQUEST, "config_error"),
            Error::FileParse { .. } => (StatusCode::BAD_REQUEST, "parse_error"),
            Error::Read { .. } => (StatusCode::BAD_REQUEST, "read_error"),
            Error::Transport(_) => (StatusCode::BAD_GATEWAY, "transport_error"),
            Error::Decode(_) => (StatusCode::BAD_GATEWAY, "decode_error"),
            Error::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "timeout"),
            Error::Json(_) => (StatusCode::BAD_REQUEST, "json_error"),
            Error::Http(_) => (StatusCode::BAD_GATEWAY, "http_error"),
            Error::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_projection() {
        assert_eq!(
            Error::file_parse("a.docx", "bad zip").kind(),
            ErrorKind::UnsupportedOrCorrupt
        );
        assert_eq!(Error::transport("503").kind(), ErrorKind::TransportFailure);
        assert_eq!(Error::decode("no candidates").kind(), ErrorKind::DecodeFailure);
        assert_eq!(Error::Timeout(30).kind(), ErrorKind::Timeout);

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert_eq!(Error::read("/tmp/x", io).kind(), ErrorKind::ReadFailure);
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(ErrorKind::UnsupportedOrCorrupt.to_string(), "unsupported_or_corrupt");
        assert_eq!(
            serde_json::to_string(&ErrorKind::ReadFailure).unwrap(),
            "\"read_failure\""
        );
    }
}
