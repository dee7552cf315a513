//! Terminal rendering for status lines and the references table

use ragline_core::{SessionState, SourceRecord, Stage};

/// Icon shown next to the status line for each pipeline stage.
///
/// Anything outside the vocabulary gets the pending treatment.
pub fn stage_icon(stage: &Stage) -> &'static str {
    match stage {
        Stage::Connecting => "🔌",
        Stage::Refining => "🔧",
        Stage::Refined => "✨",
        Stage::SemanticSearch => "🔍",
        Stage::SemanticDone => "✅",
        Stage::Bm25Search => "📝",
        Stage::Bm25Done => "✅",
        Stage::Fusion => "🔀",
        Stage::Reranking => "📊",
        Stage::Found => "📚",
        Stage::Generating => "🤖",
        Stage::Writing => "✍️",
        Stage::Complete => "✅",
        Stage::Error => "❌",
        Stage::Pending | Stage::Other(_) => "⏳",
    }
}

/// One status line: icon, optional step counter, message.
pub fn status_line(state: &SessionState) -> String {
    let message = if state.status_message.is_empty() {
        "Processing..."
    } else {
        &state.status_message
    };
    if state.current_step > 0 {
        format!(
            "{} [{}/{}] {}",
            stage_icon(&state.stage),
            state.current_step,
            state.total_steps,
            message
        )
    } else {
        format!("{} {}", stage_icon(&state.stage), message)
    }
}

/// Numbered references table for the sources cited in the answer.
pub fn references(cited: &[&SourceRecord]) -> String {
    let mut out = String::new();
    out.push_str(&format!("References ({})\n", cited.len()));
    for (index, source) in cited.iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", index + 1, source.title));
        if let Some(authors) = &source.authors {
            out.push_str(&format!("     {authors}\n"));
        }
        let links: Vec<String> = [
            ("PDF", &source.pdf_url),
            ("GitHub", &source.github_link),
            ("Video", &source.video_link),
            ("ACM", &source.acm_url),
        ]
        .iter()
        .filter_map(|(label, url)| url.as_ref().map(|url| format!("{label}: {url}")))
        .collect();
        if !links.is_empty() {
            out.push_str(&format!("     {}\n", links.join("  ")));
        }
    }
    out
}
