//! SSE transport (transport A)
//!
//! Opens a long-lived GET request with the query parameters encoded in the
//! query string and decodes the newline-delimited `data: ` frames from the
//! response body. Frames are folded strictly in order, one at a time.

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::protocol::{PipelineEvent, QueryRequest};
use crate::session::SessionSink;

/// Frame prefix marking a candidate event line.
const DATA_PREFIX: &str = "data: ";

/// Turns a raw byte stream into discrete event records.
///
/// Keeps the trailing (possibly incomplete) line fragment across pushes;
/// lines that fail to parse are logged and skipped, never fatal.
pub(crate) struct FrameDecoder {
    buffer: String,
}

impl FrameDecoder {
    pub(crate) fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    /// Append one chunk of bytes and decode every complete frame in it.
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<PipelineEvent> {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));

        let mut events = Vec::new();
        while let Some(newline) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=newline).collect();
            let line = line.trim_end_matches(['\n', '\r']);
            let Some(data) = line.strip_prefix(DATA_PREFIX) else {
                continue;
            };
            match serde_json::from_str::<PipelineEvent>(data) {
                Ok(event) => events.push(event),
                Err(e) => warn!("skipping unparseable SSE frame: {e}"),
            }
        }
        events
    }
}

pub(crate) async fn run(
    config: ClientConfig,
    request: QueryRequest,
    sink: SessionSink,
    cancel: CancellationToken,
) {
    let client = reqwest::Client::new();
    let pending = client.get(config.stream_url()).query(&request).send();

    let response = tokio::select! {
        _ = cancel.cancelled() => return,
        response = pending => response,
    };

    let response = match response {
        Ok(response) => response,
        Err(e) => {
            sink.deliver(PipelineEvent::transport_error(
                TransportError::Connect(e.to_string()).to_string(),
            ));
            return;
        }
    };

    let status = response.status();
    if !status.is_success() {
        sink.deliver(PipelineEvent::transport_error(
            TransportError::Status(status.as_u16()).to_string(),
        ));
        return;
    }

    let mut byte_stream = response.bytes_stream();
    let mut decoder = FrameDecoder::new();

    loop {
        let chunk = tokio::select! {
            _ = cancel.cancelled() => return,
            chunk = byte_stream.next() => chunk,
        };

        match chunk {
            Some(Ok(bytes)) => {
                // Fold each decoded frame before the next read begins
                for event in decoder.push(&bytes) {
                    if !sink.deliver(event) {
                        return;
                    }
                }
            }
            Some(Err(e)) => {
                sink.deliver(PipelineEvent::transport_error(
                    TransportError::Read(e.to_string()).to_string(),
                ));
                return;
            }
            None => {
                // End of stream; any unterminated trailing fragment is
                // discarded. A clean close without a terminal event still
                // releases callers waiting on the session.
                debug!("SSE stream ended");
                sink.stream_ended();
                return;
            }
        }
    }
}
