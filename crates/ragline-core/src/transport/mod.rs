//! Streaming transports
//!
//! Two transports implement the same event contract: a unidirectional SSE
//! byte stream and a full-duplex WebSocket. Transport code is limited to
//! connection setup and frame decoding; everything after a decoded
//! [`crate::protocol::PipelineEvent`] is shared.

pub(crate) mod sse;
pub(crate) mod ws;

use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;
use crate::protocol::QueryRequest;
use crate::session::SessionSink;

/// Which transport a session uses to reach the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// `GET /api/stream` with `data: `-prefixed newline-delimited frames
    Sse,
    /// `/ws/query` with one JSON event per text message
    WebSocket,
}

/// Drive one transport until the stream ends, the session is cancelled, or
/// the sink rejects an event (superseded generation).
pub(crate) async fn run(
    kind: TransportKind,
    config: ClientConfig,
    request: QueryRequest,
    sink: SessionSink,
    cancel: CancellationToken,
) {
    match kind {
        TransportKind::Sse => sse::run(config, request, sink, cancel).await,
        TransportKind::WebSocket => ws::run(config, request, sink, cancel).await,
    }
}
