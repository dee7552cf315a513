//! Citation resolution
//!
//! Maps bracketed markers in the generated answer (e.g. `[NeRF]`) back to
//! entries of the retrieved source list using a tiered matching strategy.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::protocol::SourceRecord;

// One bracket pair per marker; nesting is not supported.
static MARKER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]+)\]").expect("valid regex"));

/// Extract distinct citation markers in first-appearance order.
pub fn extract_markers(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut markers = Vec::new();
    for capture in MARKER_RE.captures_iter(text) {
        let marker = &capture[1];
        if seen.insert(marker.to_string()) {
            markers.push(marker.to_string());
        }
    }
    markers
}

/// Resolve citation markers in `answer` against `sources`.
///
/// Each marker tries three tiers in order: exact title match,
/// case-insensitive match, then lowercased substring containment in either
/// direction. A source is consumed by at most one marker; unresolved
/// markers are dropped silently. Output follows marker extraction order.
pub fn resolve_citations<'a>(answer: &str, sources: &'a [SourceRecord]) -> Vec<&'a SourceRecord> {
    let mut used: HashSet<usize> = HashSet::new();
    let mut cited = Vec::new();

    for marker in extract_markers(answer) {
        let marker_lower = marker.to_lowercase();

        let found = find_source(sources, &used, |title| title == marker)
            .or_else(|| find_source(sources, &used, |title| title.to_lowercase() == marker_lower))
            .or_else(|| {
                find_source(sources, &used, |title| {
                    let title_lower = title.to_lowercase();
                    marker_lower.contains(&title_lower) || title_lower.contains(&marker_lower)
                })
            });

        if let Some(index) = found {
            used.insert(index);
            cited.push(&sources[index]);
        }
    }

    cited
}

fn find_source(
    sources: &[SourceRecord],
    used: &HashSet<usize>,
    matches: impl Fn(&str) -> bool,
) -> Option<usize> {
    sources
        .iter()
        .enumerate()
        .find(|(index, source)| !used.contains(index) && matches(&source.title))
        .map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(title: &str) -> SourceRecord {
        SourceRecord {
            title: title.to_string(),
            authors: None,
            pdf_url: None,
            github_link: None,
            video_link: None,
            acm_url: None,
        }
    }

    #[test]
    fn test_extract_markers_dedupes_in_first_appearance_order() {
        let markers = extract_markers("See [B] and [A], also [B] again and [C].");
        assert_eq!(markers, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_extract_ignores_empty_brackets() {
        assert!(extract_markers("nothing [] here").is_empty());
    }

    #[test]
    fn test_exact_then_substring_tiers() {
        // Exact match for NeRF, substring match for "gaussian splatting"
        // against "3D Gaussian Splatting".
        let sources = vec![source("NeRF"), source("3D Gaussian Splatting")];
        let cited = resolve_citations("Gaussians [NeRF] are great [gaussian splatting]", &sources);
        let titles: Vec<&str> = cited.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["NeRF", "3D Gaussian Splatting"]);
    }

    #[test]
    fn test_case_insensitive_tier() {
        let sources = vec![source("Neural Radiance Fields")];
        let cited = resolve_citations("[neural radiance fields]", &sources);
        assert_eq!(cited.len(), 1);
        assert_eq!(cited[0].title, "Neural Radiance Fields");
    }

    #[test]
    fn test_marker_containing_title_resolves() {
        let sources = vec![source("NeRF")];
        let cited = resolve_citations("[NeRF: representing scenes]", &sources);
        assert_eq!(cited.len(), 1);
    }

    #[test]
    fn test_unresolved_markers_are_dropped() {
        let sources = vec![source("NeRF")];
        let cited = resolve_citations("[NeRF] and [completely unrelated]", &sources);
        assert_eq!(cited.len(), 1);
    }

    #[test]
    fn test_each_source_consumed_at_most_once() {
        // Two markers that would both match the single source; only the
        // first consumes it.
        let sources = vec![source("NeRF")];
        let cited = resolve_citations("[NeRF] then [nerf]", &sources);
        assert_eq!(cited.len(), 1);
    }

    #[test]
    fn test_injective_within_one_pass() {
        let sources = vec![source("Splatting Methods"), source("Splatting Survey")];
        let cited = resolve_citations("[splatting methods] and [splatting survey]", &sources);
        let titles: Vec<&str> = cited.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Splatting Methods", "Splatting Survey"]);
    }

    #[test]
    fn test_no_sources_yields_empty() {
        assert!(resolve_citations("[anything]", &[]).is_empty());
    }
}
