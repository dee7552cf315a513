//! ragline-core - client library for a progressive search-and-generation pipeline
//!
//! Submits a query over one of two transports (SSE or WebSocket), folds the
//! typed event stream into a session state snapshot, and resolves inline
//! citation markers in the final answer against the retrieved source list.

pub mod citations;
pub mod config;
pub mod error;
pub mod protocol;
pub mod session;
pub mod transport;

pub use citations::{extract_markers, resolve_citations};
pub use config::{ClientConfig, ConfigError};
pub use error::TransportError;
pub use protocol::{PipelineEvent, QueryRequest, SourceRecord, Stage};
pub use session::{SessionState, StreamSession};
pub use transport::TransportKind;
