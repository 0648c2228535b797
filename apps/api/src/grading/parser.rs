//! LLM reply parser — recovers a structured grading record from free text.
//!
//! The upstream model is asked for JSON but does not reliably produce it: a
//! frequent failure is a score written as `"score": 7/10`, which is not a
//! valid JSON number literal. Recovery runs an ordered fallback cascade,
//! each stage attempted only when the previous one fails:
//!
//! 1. strip code fences, decode the full reply directly
//! 2. normalize known malformations (collapse line breaks, quote `N/10`
//!    scores), decode again
//! 3. slice from the first `{` to the last `}`, normalize, decode the slice
//! 4. wrap the raw text in a free-text record
//!
//! Every path returns a record. This function never returns an error and
//! never panics past its boundary — grading must stay usable even when the
//! model degrades to prose.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use crate::grading::GradingMode;

// ────────────────────────────────────────────────────────────────────────────
// Record types per mode
// ────────────────────────────────────────────────────────────────────────────

/// A score as the model wrote it: a JSON number, or the string `"N/10"`.
/// Both forms are valid downstream; `pipeline::numeric_score` extracts the
/// numeric value while the original form is preserved for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScoreValue {
    Number(f64),
    Text(String),
}

/// Open-ended answer feedback (analysis mode). Field names mirror the exact
/// keys the prompt demands from the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerAnalysis {
    #[serde(rename = "contentRelevance", default)]
    pub content_relevance: String,
    #[serde(rename = "clarityAndStructure", default)]
    pub clarity_and_structure: String,
    #[serde(rename = "technicalAccuracy", default)]
    pub technical_accuracy: String,
    #[serde(rename = "areasOfImprovement", default)]
    pub areas_of_improvement: String,
    /// Required — a reply that lost its score is treated as unparsed.
    pub score: ScoreValue,
}

/// Practice-answer verdict (correctness mode).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerCheck {
    /// 0-100 percentage.
    pub correctness: f64,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// Code walkthrough (code-explanation mode).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeExplanation {
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub line_by_line: Vec<LineNote>,
    #[serde(default)]
    pub variable_tracking: Vec<VariableSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineNote {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableSnapshot {
    #[serde(default)]
    pub line_number: u32,
    #[serde(default)]
    pub variables: BTreeMap<String, VariableState>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableState {
    #[serde(default)]
    pub value: Value,
    #[serde(rename = "type", default)]
    pub value_type: String,
}

/// The best-effort result of parsing one reply. Serializes untagged, so the
/// stored payload is exactly the mode's record (or `{"text": ...}` for the
/// free-text fallback).
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AnalysisRecord {
    Answer(AnswerAnalysis),
    Check(AnswerCheck),
    Code(CodeExplanation),
    FreeText { text: String },
}

// ────────────────────────────────────────────────────────────────────────────
// Fallback cascade
// ────────────────────────────────────────────────────────────────────────────

/// Matches a bare `"score": N/10` token. One pattern covers every numerator
/// instead of enumerating the ten literal values.
static SCORE_FRACTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""score"\s*:\s*(\d{1,2})/10"#).expect("valid score pattern"));

/// Maps a raw model reply to the record shape the active mode implies.
/// Infallible: when every decode stage fails the raw text comes back as a
/// free-text record.
pub fn parse_reply(mode: GradingMode, raw: &str) -> AnalysisRecord {
    match mode {
        GradingMode::Analysis => decode_cascade::<AnswerAnalysis>(raw)
            .map(AnalysisRecord::Answer)
            .unwrap_or_else(|| free_text_record(raw)),
        GradingMode::Correctness => decode_cascade::<AnswerCheck>(raw)
            .map(AnalysisRecord::Check)
            .unwrap_or_else(|| free_text_record(raw)),
        GradingMode::CodeExplanation => decode_cascade::<CodeExplanation>(raw)
            .map(AnalysisRecord::Code)
            .unwrap_or_else(|| free_text_record(raw)),
    }
}

fn decode_cascade<T: DeserializeOwned>(raw: &str) -> Option<T> {
    let text = strip_code_fences(raw);

    // Stage 1: the reply is already valid JSON.
    if let Ok(record) = serde_json::from_str::<T>(text) {
        return Some(record);
    }

    // Stage 2: repair known malformations and retry on the whole reply.
    if let Ok(record) = serde_json::from_str::<T>(&normalize_reply(text)) {
        debug!("Reply decoded after normalization");
        return Some(record);
    }

    // Stage 3: the JSON object is buried in prose — slice between the
    // outermost braces and retry on the slice alone.
    let slice = brace_slice(text)?;
    match serde_json::from_str::<T>(&normalize_reply(slice)) {
        Ok(record) => {
            debug!("Reply decoded from brace-delimited slice");
            Some(record)
        }
        Err(e) => {
            debug!("All structured decode attempts failed: {e}");
            None
        }
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from a reply.
/// Shared with the question generator, which runs its own array-shaped cascade.
pub(crate) fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

/// Rewrites known malformed patterns into decodable JSON without touching
/// anything else: embedded line breaks collapse to spaces, and a bare
/// `"score": N/10` becomes the quoted string `"score": "N/10"`.
fn normalize_reply(text: &str) -> String {
    let flat = text.replace(['\n', '\r'], " ");
    SCORE_FRACTION
        .replace_all(&flat, "\"score\": \"$1/10\"")
        .into_owned()
}

/// The substring from the first `{` to the last `}`, inclusive.
fn brace_slice(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Wraps an undecodable reply as a free-text record, with line breaks
/// rendered as explicit paragraph markers for display.
fn free_text_record(raw: &str) -> AnalysisRecord {
    AnalysisRecord::FreeText {
        text: raw
            .trim()
            .replace("\r\n", "<br>")
            .replace(['\n', '\r'], "<br>"),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_analysis(raw: &str) -> AnswerAnalysis {
        match parse_reply(GradingMode::Analysis, raw) {
            AnalysisRecord::Answer(a) => a,
            other => panic!("expected Answer record, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_json_with_numeric_score_decodes_directly() {
        let raw = r#"{"contentRelevance": "on point", "clarityAndStructure": "clear",
            "technicalAccuracy": "correct", "areasOfImprovement": "examples", "score": 8}"#;
        let analysis = parse_analysis(raw);
        assert_eq!(analysis.score, ScoreValue::Number(8.0));
        assert_eq!(analysis.content_relevance, "on point");
    }

    #[test]
    fn test_bare_fraction_score_is_rewritten_to_string() {
        // The documented malformation: 7/10 is not a JSON number literal.
        let raw = r#"{"contentRelevance":"addresses the question directly","score": 7/10}"#;
        let analysis = parse_analysis(raw);
        assert_eq!(analysis.score, ScoreValue::Text("7/10".to_string()));
        assert_eq!(
            analysis.content_relevance,
            "addresses the question directly"
        );
        // Fields the model omitted default to empty rather than failing the decode.
        assert!(analysis.clarity_and_structure.is_empty());
    }

    #[test]
    fn test_two_digit_numerator_is_handled() {
        let raw = r#"{"contentRelevance": "excellent", "score": 10/10}"#;
        let analysis = parse_analysis(raw);
        assert_eq!(analysis.score, ScoreValue::Text("10/10".to_string()));
    }

    #[test]
    fn test_normalization_leaves_rest_of_document_unchanged() {
        let raw = r#"{"contentRelevance": "good", "areasOfImprovement": "none", "score": 3/10}"#;
        let normalized = normalize_reply(raw);
        assert_eq!(
            normalized,
            r#"{"contentRelevance": "good", "areasOfImprovement": "none", "score": "3/10"}"#
        );
    }

    #[test]
    fn test_embedded_line_breaks_collapse_to_spaces() {
        let raw = "{\"contentRelevance\": \"good\",\n\"clarityAndStructure\": \"fine\",\r\n\"score\": 6/10}";
        let analysis = parse_analysis(raw);
        assert_eq!(analysis.score, ScoreValue::Text("6/10".to_string()));
        assert_eq!(analysis.clarity_and_structure, "fine");
    }

    #[test]
    fn test_json_buried_in_prose_is_sliced_out() {
        let raw = "Here is my evaluation of the answer:\n\n{\"contentRelevance\": \"strong\", \"score\": 9/10}\n\nI hope this helps!";
        let analysis = parse_analysis(raw);
        assert_eq!(analysis.score, ScoreValue::Text("9/10".to_string()));
        assert_eq!(analysis.content_relevance, "strong");
    }

    #[test]
    fn test_markdown_fenced_json_decodes() {
        let raw = "```json\n{\"contentRelevance\": \"ok\", \"score\": 5}\n```";
        let analysis = parse_analysis(raw);
        assert_eq!(analysis.score, ScoreValue::Number(5.0));
    }

    #[test]
    fn test_reply_without_braces_falls_back_to_free_text() {
        let raw = "The answer was vague.\nIt never addressed the question.";
        match parse_reply(GradingMode::Analysis, raw) {
            AnalysisRecord::FreeText { text } => {
                assert_eq!(
                    text,
                    "The answer was vague.<br>It never addressed the question."
                );
            }
            other => panic!("expected FreeText record, got {other:?}"),
        }
    }

    #[test]
    fn test_degenerate_inputs_never_panic() {
        for raw in ["", "}{", "{{{{", "{}", "score: 7/10", "```"] {
            // Whatever comes back, something comes back.
            let _ = parse_reply(GradingMode::Analysis, raw);
            let _ = parse_reply(GradingMode::Correctness, raw);
            let _ = parse_reply(GradingMode::CodeExplanation, raw);
        }
    }

    #[test]
    fn test_missing_score_is_not_an_analysis_record() {
        // An object that lost its score is worse than prose: fall through.
        let raw = r#"{"contentRelevance": "fine", "clarityAndStructure": "fine"}"#;
        assert!(matches!(
            parse_reply(GradingMode::Analysis, raw),
            AnalysisRecord::FreeText { .. }
        ));
    }

    #[test]
    fn test_correctness_reply_decodes_with_ordered_suggestions() {
        let raw = r#"{"correctness": 85, "explanation": "mostly right",
            "suggestions": ["mention base cases", "discuss complexity", "add an example"]}"#;
        match parse_reply(GradingMode::Correctness, raw) {
            AnalysisRecord::Check(check) => {
                assert!((check.correctness - 85.0).abs() < f64::EPSILON);
                assert_eq!(check.suggestions.len(), 3);
                assert_eq!(check.suggestions[0], "mention base cases");
                assert_eq!(check.suggestions[2], "add an example");
            }
            other => panic!("expected Check record, got {other:?}"),
        }
    }

    #[test]
    fn test_correctness_prose_falls_back_to_free_text() {
        let raw = "Your answer is partially correct but misses edge cases.";
        assert!(matches!(
            parse_reply(GradingMode::Correctness, raw),
            AnalysisRecord::FreeText { .. }
        ));
    }

    #[test]
    fn test_code_explanation_decodes_variable_tracking() {
        let raw = r#"{
            "overview": "Squares the numbers 0..3",
            "line_by_line": [
                {"code": "x = [i * i for i in range(3)]", "explanation": "list comprehension"}
            ],
            "variable_tracking": [
                {"line_number": 1, "variables": {"x": {"value": [0, 1, 4], "type": "list"}}}
            ]
        }"#;
        match parse_reply(GradingMode::CodeExplanation, raw) {
            AnalysisRecord::Code(code) => {
                assert_eq!(code.overview, "Squares the numbers 0..3");
                assert_eq!(code.line_by_line.len(), 1);
                let snapshot = &code.variable_tracking[0];
                assert_eq!(snapshot.line_number, 1);
                let state = snapshot.variables.get("x").unwrap();
                assert_eq!(state.value_type, "list");
                assert_eq!(state.value, serde_json::json!([0, 1, 4]));
            }
            other => panic!("expected Code record, got {other:?}"),
        }
    }

    #[test]
    fn test_code_explanation_sliced_from_prose() {
        let raw = "Sure! {\"overview\": \"adds two numbers\", \"line_by_line\": [], \"variable_tracking\": []} Let me know if anything is unclear.";
        match parse_reply(GradingMode::CodeExplanation, raw) {
            AnalysisRecord::Code(code) => assert_eq!(code.overview, "adds two numbers"),
            other => panic!("expected Code record, got {other:?}"),
        }
    }

    #[test]
    fn test_free_text_record_serializes_as_text_field() {
        let record = parse_reply(GradingMode::Analysis, "no structure here");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json, serde_json::json!({"text": "no structure here"}));
    }

    #[test]
    fn test_answer_record_serializes_with_prompt_field_names() {
        let raw = r#"{"contentRelevance": "good", "score": 7}"#;
        let record = parse_reply(GradingMode::Analysis, raw);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["contentRelevance"], "good");
        assert_eq!(json["score"], 7.0);
        assert!(json.get("content_relevance").is_none());
    }

    #[test]
    fn test_brace_slice_bounds() {
        assert_eq!(brace_slice("ab {1} cd"), Some("{1}"));
        assert_eq!(brace_slice("no braces"), None);
        assert_eq!(brace_slice("}{"), None);
    }
}
