/*
[INPUT]:  Errors raised while connecting, subscribing or reading a stream
[OUTPUT]: Recoverable / non-recoverable verdict driving reconnects
[POS]:    WebSocket layer - error classification
[UPDATE]: When the server or transport surfaces a new failure shape
*/

use std::io;

use tokio_tungstenite::tungstenite::{self, error::ProtocolError};

use crate::http::RofexError;

/// Close codes that end a subscription for good.
const FINAL_CLOSE_CODES: [u16; 2] = [1000, 1001];

const TRANSIENT_MARKERS: [&str; 6] = [
    "i/o timeout",
    "timed out",
    "connection reset",
    "broken pipe",
    "network is unreachable",
    "connection refused",
];

/// Whether the manager should reconnect after `err`.
pub fn is_recoverable(err: &RofexError) -> bool {
    match err {
        RofexError::StreamClosed { code, .. } => !FINAL_CLOSE_CODES.contains(code),
        RofexError::WebSocket(inner) => websocket_recoverable(inner),
        RofexError::Temporary { .. } => true,
        RofexError::Serialization(_)
        | RofexError::Cancelled
        | RofexError::Unauthorized
        | RofexError::Authentication { .. }
        | RofexError::Validation { .. }
        | RofexError::InvalidHeader(_)
        | RofexError::MaxRetriesExceeded { .. } => false,
        other => has_transient_marker(&other.to_string()),
    }
}

fn websocket_recoverable(err: &tungstenite::Error) -> bool {
    match err {
        tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => false,
        tungstenite::Error::Io(io_err) => {
            is_transient_io(io_err.kind()) || has_transient_marker(&io_err.to_string())
        }
        tungstenite::Error::Protocol(ProtocolError::ResetWithoutClosingHandshake) => true,
        other => has_transient_marker(&other.to_string()),
    }
}

fn is_transient_io(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::TimedOut
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::UnexpectedEof
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::NotConnected
            | io::ErrorKind::NetworkUnreachable
            | io::ErrorKind::HostUnreachable
    )
}

fn has_transient_marker(description: &str) -> bool {
    if description.contains("EOF") {
        return true;
    }
    let lowered = description.to_ascii_lowercase();
    TRANSIENT_MARKERS.iter().any(|marker| lowered.contains(marker))
}
