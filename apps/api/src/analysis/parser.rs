//! Result Parser: pulls the JSON answer out of a free-text model completion.
//!
//! The model is only asked, not forced, to answer in a ```json fenced block, so
//! this is best-effort. Only syntactic validity is checked here; the lenient
//! projection in `result` deals with missing or oddly shaped keys.

use serde_json::Value;
use thiserror::Error;

use crate::analysis::prompts::OUTPUT_MARKER;
use crate::analysis::result::AnalysisResult;
use crate::llm_client::ModelCompletion;

const FENCE: &str = "```";
const JSON_LABEL: &str = "json";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseFailure {
    #[error("model reply did not contain a ```json block")]
    NoJsonBlock { raw: String },

    #[error("model reply contained malformed JSON: {reason}")]
    MalformedJson {
        raw: String,
        candidate: String,
        reason: String,
    },
}

impl ParseFailure {
    /// The completion text exactly as the model returned it.
    pub fn raw(&self) -> &str {
        match self {
            ParseFailure::NoJsonBlock { raw } | ParseFailure::MalformedJson { raw, .. } => raw,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ParseFailure::NoJsonBlock { .. } => "NO_JSON_BLOCK",
            ParseFailure::MalformedJson { .. } => "MALFORMED_JSON",
        }
    }
}

/// Strategy for finding the embedded JSON text inside a completion.
pub trait BlockLocator {
    fn locate<'a>(&self, text: &'a str) -> Option<&'a str>;
}

/// Finds ```json fenced blocks, preferring the first one after the last
/// output marker that still has a block following it.
#[derive(Debug, Clone, Copy, Default)]
pub struct FencedJsonLocator;

/// A located block: where its opening fence starts, and its trimmed body.
struct FencedBlock<'a> {
    start: usize,
    body: &'a str,
}

impl BlockLocator for FencedJsonLocator {
    fn locate<'a>(&self, text: &'a str) -> Option<&'a str> {
        let blocks = json_blocks(text);

        let after_marker = text
            .match_indices(OUTPUT_MARKER)
            .map(|(at, _)| at)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .find_map(|marker| blocks.iter().find(|b| b.start > marker));

        after_marker.or_else(|| blocks.first()).map(|b| b.body)
    }
}

/// Every ```json block in order. An unterminated block runs to the end.
fn json_blocks(text: &str) -> Vec<FencedBlock<'_>> {
    let mut blocks = Vec::new();
    let mut cursor = 0;

    while let Some(offset) = text[cursor..].find(FENCE) {
        let start = cursor + offset;
        let after_fence = start + FENCE.len();

        let Some(body_start) = json_label_end(text, after_fence) else {
            cursor = after_fence;
            continue;
        };

        let (body_end, next) = match text[body_start..].find(FENCE) {
            Some(close) => (body_start + close, body_start + close + FENCE.len()),
            None => (text.len(), text.len()),
        };

        blocks.push(FencedBlock {
            start,
            body: text[body_start..body_end].trim(),
        });
        cursor = next;
    }

    blocks
}

/// If the fence at `pos` is labeled `json`, returns where its body starts.
fn json_label_end(text: &str, pos: usize) -> Option<usize> {
    let rest = &text[pos..];
    let label_start = rest.len() - rest.trim_start_matches([' ', '\t']).len();
    let label = rest.get(label_start..label_start + JSON_LABEL.len())?;
    if !label.eq_ignore_ascii_case(JSON_LABEL) {
        return None;
    }

    let end = label_start + JSON_LABEL.len();
    // reject longer labels such as `jsonc` or `json5`
    match rest[end..].chars().next() {
        Some(c) if c.is_alphanumeric() || c == '_' || c == '-' => None,
        _ => Some(pos + end),
    }
}

/// Parses a completion with the default fenced-block strategy.
pub fn parse(completion: &ModelCompletion) -> Result<AnalysisResult, ParseFailure> {
    parse_with(&FencedJsonLocator, completion)
}

pub fn parse_with(
    locator: &dyn BlockLocator,
    completion: &ModelCompletion,
) -> Result<AnalysisResult, ParseFailure> {
    let raw = completion.text();

    let candidate = locator.locate(raw).ok_or_else(|| ParseFailure::NoJsonBlock {
        raw: raw.to_string(),
    })?;

    let value: Value =
        serde_json::from_str(candidate).map_err(|e| ParseFailure::MalformedJson {
            raw: raw.to_string(),
            candidate: candidate.to_string(),
            reason: e.to_string(),
        })?;

    Ok(AnalysisResult::from_value(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completion(text: &str) -> ModelCompletion {
        ModelCompletion::new(text)
    }

    const SAMPLE: &str = r#"[REASONING]
my_reasoning: The candidate matches most requirements.

[OUTPUT]
```json
{"keywords": {"Headline": "Data Engineer", "Education": ["MSc Statistics"]},
 "skills_experience_match": {"Technical Skills": {"matched_items": ["SQL"], "explanation": "ok"}},
 "percentage_scores": {"Technical Skills Match": 75.5, "Soft Skills Match": 80.0, "Relevant Experience Match": 70.0, "Overall Suitability Score": 75.2}}
```
"#;

    #[test]
    fn test_parse_reads_overall_score() {
        let result = parse(&completion(SAMPLE)).unwrap();
        let scores = result.percentage_scores.unwrap();
        assert_eq!(scores.overall_suitability_score, Some(75.2));
        assert_eq!(scores.technical_skills_match, Some(75.5));
    }

    #[test]
    fn test_parse_inline_fence() {
        let text = r#"```json {"keywords": {}, "skills_experience_match": {}, "percentage_scores": {"Technical Skills Match": 75.5, "Soft Skills Match": 80.0, "Relevant Experience Match": 70.0, "Overall Suitability Score": 75.2}} ```"#;
        let result = parse(&completion(text)).unwrap();
        assert_eq!(
            result.percentage_scores.unwrap().overall_suitability_score,
            Some(75.2)
        );
    }

    #[test]
    fn test_parse_is_idempotent() {
        let c = completion(SAMPLE);
        assert_eq!(parse(&c), parse(&c));
    }

    #[test]
    fn test_no_fenced_block_keeps_raw_text() {
        let text = "Sorry, I can't help with that.\n{\"keywords\": {}}";
        let err = parse(&completion(text)).unwrap_err();
        assert!(matches!(err, ParseFailure::NoJsonBlock { .. }));
        assert_eq!(err.raw(), text);
        assert_eq!(err.code(), "NO_JSON_BLOCK");
    }

    #[test]
    fn test_unlabeled_fence_is_not_json_block() {
        let text = "```\n{\"keywords\": {}}\n```";
        let err = parse(&completion(text)).unwrap_err();
        assert!(matches!(err, ParseFailure::NoJsonBlock { .. }));
    }

    #[test]
    fn test_trailing_comma_is_malformed() {
        let text = "[OUTPUT]\n```json\n{\"percentage_scores\": {\"Overall Suitability Score\": 70,}}\n```";
        match parse(&completion(text)).unwrap_err() {
            ParseFailure::MalformedJson {
                raw,
                candidate,
                reason,
            } => {
                assert_eq!(raw, text);
                assert_eq!(
                    candidate,
                    "{\"percentage_scores\": {\"Overall Suitability Score\": 70,}}"
                );
                assert!(!reason.is_empty());
            }
            other => panic!("expected MalformedJson, got {other:?}"),
        }
    }

    #[test]
    fn test_prefers_block_after_output_marker() {
        let text = "Example:\n```json\n{\"percentage_scores\": {\"Overall Suitability Score\": 1}}\n```\n\
                    [OUTPUT]\n```json\n{\"percentage_scores\": {\"Overall Suitability Score\": 2}}\n```";
        let result = parse(&completion(text)).unwrap();
        assert_eq!(
            result.percentage_scores.unwrap().overall_suitability_score,
            Some(2.0)
        );
    }

    #[test]
    fn test_falls_back_to_first_block_when_marker_has_none_after() {
        let text = "```json\n{\"percentage_scores\": {\"Overall Suitability Score\": 1}}\n```\n\
                    ```json\n{\"percentage_scores\": {\"Overall Suitability Score\": 2}}\n```\n[OUTPUT]\nsee above";
        let result = parse(&completion(text)).unwrap();
        assert_eq!(
            result.percentage_scores.unwrap().overall_suitability_score,
            Some(1.0)
        );
    }

    #[test]
    fn test_earlier_marker_used_when_last_marker_has_no_block() {
        let text = "```json\n{\"a\": 1}\n```\n[OUTPUT]\n```json\n{\"a\": 2}\n```\n[OUTPUT] done";
        let result = parse(&completion(text)).unwrap();
        assert_eq!(result.raw["a"], 2);
    }

    #[test]
    fn test_label_is_case_insensitive_and_rejects_longer_labels() {
        assert_eq!(FencedJsonLocator.locate("```JSON\n{}\n```"), Some("{}"));
        assert_eq!(FencedJsonLocator.locate("``` json\n[]\n```"), Some("[]"));
        assert_eq!(FencedJsonLocator.locate("```jsonc\n{}\n```"), None);
    }

    #[test]
    fn test_skips_other_language_blocks() {
        let text = "```python\nprint('x')\n```\nthen\n```json\n{\"ok\": true}\n```";
        assert_eq!(FencedJsonLocator.locate(text), Some("{\"ok\": true}"));
    }

    #[test]
    fn test_unterminated_block_runs_to_end() {
        let text = "[OUTPUT]\n```json\n{\"percentage_scores\": {\"Soft Skills Match\": 55}}\n";
        let result = parse(&completion(text)).unwrap();
        assert_eq!(result.percentage_scores.unwrap().soft_skills_match, Some(55.0));
    }

    #[test]
    fn test_missing_sections_are_not_an_error() {
        let text = "```json\n{\"keywords\": {\"Headline\": \"Engineer\"}}\n```";
        let result = parse(&completion(text)).unwrap();
        assert!(result.keywords.is_some());
        assert!(result.skills_experience_match.is_none());
        assert!(result.percentage_scores.is_none());
    }

    struct WholeText;

    impl BlockLocator for WholeText {
        fn locate<'a>(&self, text: &'a str) -> Option<&'a str> {
            Some(text.trim())
        }
    }

    #[test]
    fn test_locator_can_be_swapped() {
        let result = parse_with(&WholeText, &completion("{\"keywords\": {}}")).unwrap();
        assert_eq!(result.keywords.unwrap().sections.len(), 0);
    }
}
