//! Session state and the event fold
//!
//! One session owns one [`SessionState`]; the fold is a pure transition
//! so it can be tested without any transport.

use serde::Serialize;

use crate::protocol::{PipelineEvent, SourceRecord, Stage};

/// Folded view of one query session, distributed to display collaborators
/// as read-only snapshots.
#[derive(Debug, Clone, Serialize)]
pub struct SessionState {
    /// Accumulated answer text; append-only until a `complete` payload
    /// replaces it wholesale.
    pub answer: String,
    /// Source list, set once at completion.
    pub sources: Vec<SourceRecord>,
    pub processing_time: Option<f64>,
    pub status_message: String,
    pub stage: Stage,
    pub current_step: u32,
    pub total_steps: u32,
    /// Refined form of the query, when the refinement phase reports one.
    pub refined_query: Option<String>,
    pub is_active: bool,
    pub is_loading: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            answer: String::new(),
            sources: Vec::new(),
            processing_time: None,
            status_message: String::new(),
            stage: Stage::Pending,
            current_step: 0,
            total_steps: 4,
            refined_query: None,
            is_active: false,
            is_loading: false,
        }
    }
}

impl SessionState {
    /// Reset to a fresh loading state at the start of a new session.
    pub fn begin(&mut self, status_message: &str, stage: Stage) {
        *self = Self {
            status_message: status_message.to_string(),
            stage,
            is_active: true,
            is_loading: true,
            ..Self::default()
        };
    }

    /// Whether a terminal event (`complete` or `error`) has been folded.
    pub fn is_terminal(&self) -> bool {
        matches!(self.stage, Stage::Complete | Stage::Error)
    }

    /// The transport reached end-of-stream without a terminal event.
    ///
    /// Clears the loading flag so callers waiting on the session can move
    /// on; status and stage keep their last folded values.
    pub fn stream_ended(&mut self) {
        self.is_loading = false;
    }

    /// Fold one event into the state.
    pub fn apply(&mut self, event: PipelineEvent) {
        match event {
            PipelineEvent::Progress {
                message,
                stage,
                step,
                total,
                refined,
            } => {
                if let Some(message) = message {
                    self.status_message = message;
                }
                if let Some(stage) = stage {
                    self.stage = Stage::parse(&stage);
                }
                if let Some(step) = step {
                    self.current_step = step;
                }
                if let Some(total) = total {
                    self.total_steps = total;
                }
                if let Some(refined) = refined {
                    self.refined_query = Some(refined);
                }
                self.is_active = true;
            }

            PipelineEvent::Chunk { content } => {
                if let Some(content) = content {
                    self.answer.push_str(&content);
                }
                self.status_message = "Writing answer...".to_string();
                self.stage = Stage::Writing;
                self.is_active = true;
            }

            PipelineEvent::Complete {
                answer,
                processing_time,
                sources,
                step,
                total,
            } => {
                // The payload answer is authoritative over accumulated chunks
                if let Some(answer) = answer {
                    self.answer = answer;
                }
                if processing_time.is_some() {
                    self.processing_time = processing_time;
                }
                if let Some(sources) = sources {
                    self.sources = sources;
                }
                if let Some(step) = step {
                    self.current_step = step;
                }
                if let Some(total) = total {
                    self.total_steps = total;
                }
                self.stage = Stage::Complete;
                self.status_message = match processing_time {
                    Some(seconds) => format!("Done in {seconds:.1}s"),
                    None => "Done in ?s".to_string(),
                };
                self.is_active = false;
                self.is_loading = false;
            }

            PipelineEvent::Error { message } => {
                let detail = message.unwrap_or_else(|| "Unknown error".to_string());
                self.status_message = format!("Error: {detail}");
                self.stage = Stage::Error;
                self.is_active = false;
                self.is_loading = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loading_state() -> SessionState {
        let mut state = SessionState::default();
        state.begin("Initializing...", Stage::Other("initializing".into()));
        state
    }

    fn chunk(content: &str) -> PipelineEvent {
        PipelineEvent::Chunk {
            content: Some(content.to_string()),
        }
    }

    #[test]
    fn test_progress_keeps_loading_until_terminal() {
        let mut state = loading_state();
        for stage in ["refining", "semantic_search", "fusion", "reranking"] {
            state.apply(PipelineEvent::Progress {
                message: Some(format!("in {stage}")),
                stage: Some(stage.to_string()),
                step: None,
                total: None,
                refined: None,
            });
            assert!(state.is_active);
            assert!(state.is_loading);
            assert!(!state.is_terminal());
        }
    }

    #[test]
    fn test_progress_without_message_keeps_previous() {
        let mut state = loading_state();
        state.apply(PipelineEvent::Progress {
            message: Some("Refining query...".into()),
            stage: Some("refining".into()),
            step: None,
            total: None,
            refined: None,
        });
        state.apply(PipelineEvent::Progress {
            message: None,
            stage: Some("refined".into()),
            step: None,
            total: None,
            refined: Some("neural radiance fields".into()),
        });
        assert_eq!(state.status_message, "Refining query...");
        assert_eq!(state.stage, Stage::Refined);
        assert_eq!(state.refined_query.as_deref(), Some("neural radiance fields"));
    }

    #[test]
    fn test_chunks_concatenate_in_receipt_order() {
        let mut state = loading_state();
        state.apply(chunk("Hel"));
        state.apply(chunk("lo"));
        assert_eq!(state.answer, "Hello");
        assert_eq!(state.stage, Stage::Writing);
        assert_eq!(state.status_message, "Writing answer...");
        assert!(state.is_loading);
    }

    #[test]
    fn test_complete_answer_replaces_accumulated_chunks() {
        let mut state = loading_state();
        state.apply(chunk("partial dr"));
        state.apply(PipelineEvent::Complete {
            answer: Some("Full corrected answer".into()),
            processing_time: Some(2.34),
            sources: None,
            step: None,
            total: None,
        });
        assert_eq!(state.answer, "Full corrected answer");
        assert_eq!(state.status_message, "Done in 2.3s");
        assert!(!state.is_active);
        assert!(!state.is_loading);
        assert!(state.is_terminal());
    }

    #[test]
    fn test_complete_without_answer_keeps_chunks() {
        let mut state = loading_state();
        state.apply(chunk("Hello"));
        state.apply(PipelineEvent::Complete {
            answer: None,
            processing_time: None,
            sources: None,
            step: None,
            total: None,
        });
        assert_eq!(state.answer, "Hello");
        assert_eq!(state.status_message, "Done in ?s");
    }

    #[test]
    fn test_error_before_complete_is_terminal_with_empty_sources() {
        let mut state = loading_state();
        state.apply(PipelineEvent::Error {
            message: Some("pipeline exploded".into()),
        });
        assert_eq!(state.stage, Stage::Error);
        assert_eq!(state.status_message, "Error: pipeline exploded");
        assert!(!state.is_active);
        assert!(!state.is_loading);
        assert!(state.sources.is_empty());
    }

    #[test]
    fn test_error_without_message_uses_fallback() {
        let mut state = loading_state();
        state.apply(PipelineEvent::Error { message: None });
        assert_eq!(state.status_message, "Error: Unknown error");
    }

    #[test]
    fn test_step_counters_do_not_gate_transitions() {
        let mut state = loading_state();
        state.apply(PipelineEvent::Progress {
            message: None,
            stage: None,
            step: Some(3),
            total: Some(6),
            refined: None,
        });
        assert_eq!(state.current_step, 3);
        assert_eq!(state.total_steps, 6);
        state.apply(chunk("x"));
        assert_eq!(state.answer, "x");
    }

    #[test]
    fn test_stream_ended_clears_loading_but_is_not_terminal() {
        let mut state = loading_state();
        state.apply(chunk("partial"));
        state.stream_ended();
        assert!(!state.is_loading);
        assert!(state.is_active);
        assert!(!state.is_terminal());
        assert_eq!(state.answer, "partial");
        assert_eq!(state.stage, Stage::Writing);
    }

    #[test]
    fn test_begin_resets_everything() {
        let mut state = loading_state();
        state.apply(chunk("stale"));
        state.apply(PipelineEvent::Error { message: None });
        state.begin("Connecting...", Stage::Connecting);
        assert_eq!(state.answer, "");
        assert!(state.sources.is_empty());
        assert_eq!(state.stage, Stage::Connecting);
        assert!(state.is_active);
        assert!(state.is_loading);
    }
}
