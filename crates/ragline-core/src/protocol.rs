//! Wire protocol for the pipeline event stream
//!
//! Both transports deliver the same JSON event records; only the framing
//! differs (SSE lines vs WebSocket text messages).

use serde::{Deserialize, Serialize, Serializer};

/// Parameters for one query submission, sent to the pipeline service.
///
/// Serializes to the query string on the SSE transport and to a single JSON
/// text message on the WebSocket transport.
#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest {
    pub query: String,
    pub top_k: u32,
    pub refine_query: bool,
    pub use_reranker: bool,
}

impl QueryRequest {
    /// Build a request with the service's default options (top_k=8, both
    /// refinement and reranking enabled).
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            top_k: 8,
            refine_query: true,
            use_reranker: true,
        }
    }
}

/// One retrieved source, set once at completion and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acm_url: Option<String>,
}

/// Events emitted by the pipeline service
///
/// Unknown extra fields (`original`, `num_chunks`, `num_papers`, ...) are
/// accepted and ignored; the service is free to send a superset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// Pipeline phase update
    Progress {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        stage: Option<String>,
        #[serde(default)]
        step: Option<u32>,
        #[serde(default)]
        total: Option<u32>,
        /// Refined form of the query, reported by the refinement phase
        #[serde(default)]
        refined: Option<String>,
    },

    /// Answer text fragment
    Chunk {
        #[serde(default)]
        content: Option<String>,
    },

    /// Terminal: pipeline finished, payload answer is authoritative
    Complete {
        #[serde(default)]
        answer: Option<String>,
        #[serde(default)]
        processing_time: Option<f64>,
        #[serde(default)]
        sources: Option<Vec<SourceRecord>>,
        #[serde(default)]
        step: Option<u32>,
        #[serde(default)]
        total: Option<u32>,
    },

    /// Terminal: pipeline failed
    Error {
        #[serde(default)]
        message: Option<String>,
    },
}

impl PipelineEvent {
    /// Whether this event ends the session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Error { .. })
    }

    /// Synthesize an error event for a local transport failure.
    pub(crate) fn transport_error(message: impl Into<String>) -> Self {
        Self::Error {
            message: Some(message.into()),
        }
    }
}

/// Pipeline stage labels, used purely for display (icon selection).
///
/// The service may report stages outside this vocabulary; those are kept
/// verbatim in [`Stage::Other`] and get the default display treatment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Pending,
    Connecting,
    Refining,
    Refined,
    SemanticSearch,
    SemanticDone,
    Bm25Search,
    Bm25Done,
    Fusion,
    Reranking,
    Found,
    Generating,
    Writing,
    Complete,
    Error,
    Other(String),
}

impl Stage {
    /// Map a reported stage string to the vocabulary, never rejecting.
    pub fn parse(stage: &str) -> Self {
        match stage {
            "connecting" => Self::Connecting,
            "refining" => Self::Refining,
            "refined" => Self::Refined,
            "semantic_search" => Self::SemanticSearch,
            "semantic_done" => Self::SemanticDone,
            "bm25_search" => Self::Bm25Search,
            "bm25_done" => Self::Bm25Done,
            "fusion" => Self::Fusion,
            "reranking" => Self::Reranking,
            "found" => Self::Found,
            "generating" => Self::Generating,
            "writing" => Self::Writing,
            "complete" => Self::Complete,
            "error" => Self::Error,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Connecting => "connecting",
            Self::Refining => "refining",
            Self::Refined => "refined",
            Self::SemanticSearch => "semantic_search",
            Self::SemanticDone => "semantic_done",
            Self::Bm25Search => "bm25_search",
            Self::Bm25Done => "bm25_done",
            Self::Fusion => "fusion",
            Self::Reranking => "reranking",
            Self::Found => "found",
            Self::Generating => "generating",
            Self::Writing => "writing",
            Self::Complete => "complete",
            Self::Error => "error",
            Self::Other(s) => s,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Stage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
