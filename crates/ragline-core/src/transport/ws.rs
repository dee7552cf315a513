//! WebSocket transport (transport B)
//!
//! Connects to the pipeline's query endpoint, sends the request parameters
//! as a single JSON text message, and treats every incoming text message as
//! one event record. Framing is handled by the transport, so no line
//! buffering is needed here.

use futures::{SinkExt, StreamExt};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::protocol::{PipelineEvent, QueryRequest};
use crate::session::SessionSink;

pub(crate) async fn run(
    config: ClientConfig,
    request: QueryRequest,
    sink: SessionSink,
    cancel: CancellationToken,
) {
    let url = config.ws_url();

    let connected = tokio::select! {
        _ = cancel.cancelled() => return,
        connected = connect_async(url.as_str()) => connected,
    };

    let (mut socket, _response) = match connected {
        Ok(pair) => pair,
        Err(e) => {
            sink.deliver(PipelineEvent::transport_error(
                TransportError::Connect(e.to_string()).to_string(),
            ));
            return;
        }
    };

    debug!(url = %url, "websocket connected");
    sink.deliver(PipelineEvent::Progress {
        message: Some("Connected, sending query...".to_string()),
        stage: None,
        step: None,
        total: None,
        refined: None,
    });

    let payload = match serde_json::to_string(&request) {
        Ok(payload) => payload,
        Err(e) => {
            sink.deliver(PipelineEvent::transport_error(
                TransportError::Send(e.to_string()).to_string(),
            ));
            return;
        }
    };
    if let Err(e) = socket.send(Message::Text(payload)).await {
        sink.deliver(PipelineEvent::transport_error(
            TransportError::Send(e.to_string()).to_string(),
        ));
        return;
    }

    // Closure after a terminal event is a normal shutdown; before one it is
    // surfaced as an error transition.
    let mut saw_terminal = false;

    loop {
        let message = tokio::select! {
            _ = cancel.cancelled() => {
                let _ = socket.close(None).await;
                return;
            }
            message = socket.next() => message,
        };

        match message {
            Some(Ok(Message::Text(text))) => match serde_json::from_str::<PipelineEvent>(&text) {
                Ok(event) => {
                    let terminal = event.is_terminal();
                    if !sink.deliver(event) {
                        return;
                    }
                    saw_terminal |= terminal;
                }
                Err(e) => warn!("skipping unparseable websocket message: {e}"),
            },
            Some(Ok(Message::Close(_))) | None => {
                if !saw_terminal {
                    sink.deliver(PipelineEvent::transport_error(
                        TransportError::ClosedEarly.to_string(),
                    ));
                }
                debug!("websocket closed");
                return;
            }
            // Ping/pong are answered by the library; binary frames are not
            // part of the contract
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                if !saw_terminal {
                    sink.deliver(PipelineEvent::transport_error(
                        TransportError::Read(e.to_string()).to_string(),
                    ));
                }
                return;
            }
        }
    }
}
