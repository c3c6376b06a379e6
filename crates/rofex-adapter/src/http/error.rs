/*
[INPUT]:  Error sources (HTTP, API status, validation, auth, WebSocket)
[OUTPUT]: Structured error types with context and retry hints
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use reqwest::StatusCode;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Main error type for the ROFEX adapter
#[derive(Error, Debug)]
pub enum RofexError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response
    #[error("http {status}: {body}")]
    Status { status: u16, body: String },

    /// Caller supplied invalid or missing parameters
    #[error("validation error: {field}: {message}")]
    Validation { field: String, message: String },

    /// No usable token
    #[error("unauthorized")]
    Unauthorized,

    /// Login flow failed
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Transient failure worth retrying later
    #[error("temporary error: {message}")]
    Temporary { message: String },

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// WebSocket transport error
    #[error("WebSocket error: {0}")]
    WebSocket(Box<tungstenite::Error>),

    /// Header value rejected (token with invalid characters)
    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    /// Peer closed the stream, or it ended without a close frame
    #[error("stream closed (code {code}): {reason}")]
    StreamClosed { code: u16, reason: String },

    /// Operation on a connection that is not open
    #[error("connection closed")]
    NotConnected,

    /// Cancellation token fired while waiting
    #[error("operation cancelled")]
    Cancelled,

    /// Reconnect budget exhausted
    #[error("max retries exceeded: {source}")]
    MaxRetriesExceeded {
        #[source]
        source: Box<RofexError>,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<tungstenite::Error> for RofexError {
    fn from(err: tungstenite::Error) -> Self {
        RofexError::WebSocket(Box::new(err))
    }
}

impl RofexError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        RofexError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a status error from a response status and body
    pub fn status(status: StatusCode, body: impl Into<String>) -> Self {
        RofexError::Status {
            status: status.as_u16(),
            body: body.into(),
        }
    }

    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            RofexError::Http(err) => err.is_timeout() || err.is_connect(),
            RofexError::Status { status, .. } => *status == 429 || *status >= 500,
            RofexError::Temporary { .. } | RofexError::WebSocket(_) => true,
            _ => false,
        }
    }

    /// Check if error indicates authentication failure
    pub fn is_auth_error(&self) -> bool {
        match self {
            RofexError::Unauthorized | RofexError::Authentication { .. } => true,
            RofexError::Status { status, .. } => *status == 401,
            _ => false,
        }
    }

    /// HTTP status carried by the error, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            RofexError::Status { status, .. } => Some(*status),
            RofexError::Http(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }
}

/// Result type alias for ROFEX operations
pub type Result<T> = std::result::Result<T, RofexError>;
