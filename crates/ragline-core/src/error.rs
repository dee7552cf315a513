//! Transport error taxonomy
//!
//! Failures never cross the session boundary as `Err`; they are rendered
//! into a terminal `error` event and folded like any other event.

use thiserror::Error;

/// Local transport failures, converted to synthetic error events.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Non-success response status when opening the SSE stream
    #[error("HTTP {0}")]
    Status(u16),

    /// Connection could not be established
    #[error("connect failed: {0}")]
    Connect(String),

    /// Read failure mid-stream
    #[error("stream read error: {0}")]
    Read(String),

    /// Request message could not be sent after the socket opened
    #[error("send failed: {0}")]
    Send(String),

    /// The socket closed before a terminal event arrived
    #[error("connection closed before completion")]
    ClosedEarly,
}
