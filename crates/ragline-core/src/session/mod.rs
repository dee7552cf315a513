//! Stream session lifecycle
//!
//! A [`StreamSession`] owns the transport connection and the folded
//! [`SessionState`]. At most one transport is live per session; rapid
//! re-submission cancels the previous transport and bumps a generation
//! counter so late arrivals from a torn-down transport are never folded.

mod state;

pub use state::SessionState;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::protocol::{PipelineEvent, QueryRequest, Stage};
use crate::transport::{self, TransportKind};

pub(crate) struct SessionShared {
    state: watch::Sender<SessionState>,
    generation: AtomicU64,
}

/// Write half handed to a transport task, tagged with the generation that
/// spawned it. Delivery fails once the session has moved on.
#[derive(Clone)]
pub(crate) struct SessionSink {
    shared: Arc<SessionShared>,
    generation: u64,
}

impl SessionSink {
    /// Fold one event; returns false when this sink's generation has been
    /// superseded, in which case the event is discarded and the transport
    /// should stop.
    pub(crate) fn deliver(&self, event: PipelineEvent) -> bool {
        let mut applied = false;
        self.shared.state.send_if_modified(|state| {
            if self.shared.generation.load(Ordering::SeqCst) != self.generation {
                return false;
            }
            state.apply(event);
            applied = true;
            true
        });
        if !applied {
            debug!(
                generation = self.generation,
                "discarding event from superseded session"
            );
        }
        applied
    }

    /// The transport ended without a terminal event; clear the loading flag
    /// unless this sink's generation has been superseded.
    pub(crate) fn stream_ended(&self) {
        self.shared.state.send_if_modified(|state| {
            if self.shared.generation.load(Ordering::SeqCst) != self.generation {
                return false;
            }
            state.stream_ended();
            true
        });
    }
}

/// One query session over a chosen transport.
///
/// `start` and `reset` take `&self`; the session can be shared behind an
/// `Arc` with any number of display collaborators holding receivers.
pub struct StreamSession {
    config: ClientConfig,
    transport: TransportKind,
    shared: Arc<SessionShared>,
    cancel: Mutex<CancellationToken>,
}

impl StreamSession {
    pub fn new(config: ClientConfig, transport: TransportKind) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            config,
            transport,
            shared: Arc::new(SessionShared {
                state,
                generation: AtomicU64::new(0),
            }),
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    /// Watch folded state updates, one per processed event.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.shared.state.subscribe()
    }

    /// Read-only copy of the current folded state.
    pub fn snapshot(&self) -> SessionState {
        self.shared.state.borrow().clone()
    }

    /// Open the transport and begin folding events.
    ///
    /// Any session already in flight is cancelled first; its remaining
    /// events are discarded by the generation check.
    pub fn start(&self, request: QueryRequest) {
        let generation = self.advance_generation();

        let (status, stage) = match self.transport {
            TransportKind::Sse => ("Initializing...", Stage::Other("initializing".to_string())),
            TransportKind::WebSocket => ("Connecting...", Stage::Connecting),
        };
        self.shared.state.send_modify(|s| s.begin(status, stage));

        info!(generation, query = %request.query, transport = ?self.transport, "starting session");

        let sink = SessionSink {
            shared: Arc::clone(&self.shared),
            generation,
        };
        let token = self
            .cancel
            .lock()
            .expect("cancellation lock poisoned")
            .clone();
        let kind = self.transport;
        let config = self.config.clone();
        tokio::spawn(transport::run(kind, config, request, sink, token));
    }

    /// Close any open transport and restore the initial state. Idempotent.
    pub fn reset(&self) {
        self.advance_generation();
        self.shared
            .state
            .send_modify(|s| *s = SessionState::default());
    }

    /// Cancel the current transport, bump the generation, and install a
    /// fresh cancellation token for the next one.
    fn advance_generation(&self) -> u64 {
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let mut guard = self.cancel.lock().expect("cancellation lock poisoned");
        guard.cancel();
        *guard = CancellationToken::new();
        generation
    }
}
