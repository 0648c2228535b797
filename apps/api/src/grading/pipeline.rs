//! Grading pipeline — one full round-trip for a single answer.
//!
//! Flow: build prompt → LLM call (fixed temperature, per-mode system
//! instruction) → parse reply → extract numeric score → upsert analysis
//! under the (interview, question, question_type) identity.
//!
//! Practice checks and code explanations run the same pipeline without a
//! target interview and persist nothing. A model failure surfaces before any
//! write, and the analysis upsert touches only the analysis column, so a
//! previously stored transcript always survives a failed grading round.

use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::grading::parser::{parse_reply, AnalysisRecord, ScoreValue};
use crate::grading::prompts::{build_grading_prompt, system_instruction};
use crate::grading::GradingMode;
use crate::llm_client::LlmClient;
use crate::models::response::QuestionType;
use crate::transcripts::store::upsert_analysis;

/// One grading request. `interview_id` selects whether the result is
/// persisted; the identity triple for the write is
/// (interview_id, question, question_type).
#[derive(Debug, Clone)]
pub struct GradeRequest {
    pub interview_id: Option<Uuid>,
    pub question: String,
    pub answer: String,
    pub question_type: QuestionType,
    pub mode: GradingMode,
}

#[derive(Debug, serde::Serialize)]
pub struct GradeOutcome {
    pub analysis: AnalysisRecord,
    /// Numeric score for aggregation, when the mode carries one. The parsed
    /// record keeps the model's original form for display.
    pub score: Option<f64>,
}

/// Runs one grading round-trip and (when an interview is attached) upserts
/// the analysis into the transcript store.
pub async fn grade_answer(
    pool: &PgPool,
    llm: &LlmClient,
    request: GradeRequest,
) -> Result<GradeOutcome, AppError> {
    // Reject incomplete input before any external call.
    if request.question.trim().is_empty() {
        return Err(AppError::Validation("question must not be empty".to_string()));
    }
    if request.answer.trim().is_empty() {
        return Err(AppError::Validation("answer must not be empty".to_string()));
    }

    let prompt = build_grading_prompt(
        request.mode,
        &request.question,
        &request.answer,
        request.question_type,
    );

    let reply = llm
        .complete(&prompt, system_instruction(request.mode))
        .await
        .map_err(|e| AppError::Llm(format!("Grading call failed: {e}")))?;

    let analysis = parse_reply(request.mode, &reply);
    let score = outcome_score(&analysis);

    match (request.mode, score) {
        (GradingMode::Analysis, Some(s)) if !(1.0..=10.0).contains(&s) => {
            warn!("Model returned analysis score {s} outside 1-10; passing through")
        }
        (GradingMode::Correctness, Some(s)) if !(0.0..=100.0).contains(&s) => {
            warn!("Model returned correctness {s} outside 0-100; passing through")
        }
        _ => {}
    }

    if let Some(interview_id) = request.interview_id {
        let payload = serde_json::to_string(&analysis)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize analysis: {e}")))?;
        upsert_analysis(
            pool,
            interview_id,
            &request.question,
            request.question_type.as_str(),
            &payload,
        )
        .await?;
        info!(
            "Stored analysis for interview {interview_id}, question type {}",
            request.question_type
        );
    }

    Ok(GradeOutcome { analysis, score })
}

/// Extracts the numeric value from a score in either form the model emits.
pub fn numeric_score(score: &ScoreValue) -> Option<f64> {
    match score {
        ScoreValue::Number(n) => Some(*n),
        ScoreValue::Text(s) => s
            .trim()
            .strip_suffix("/10")
            .and_then(|n| n.trim().parse::<f64>().ok()),
    }
}

/// The aggregatable score of a parsed record, when its mode carries one.
pub fn outcome_score(record: &AnalysisRecord) -> Option<f64> {
    match record {
        AnalysisRecord::Answer(analysis) => numeric_score(&analysis.score),
        AnalysisRecord::Check(check) => Some(check.correctness),
        AnalysisRecord::Code(_) | AnalysisRecord::FreeText { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_score_from_json_number() {
        assert_eq!(numeric_score(&ScoreValue::Number(8.0)), Some(8.0));
    }

    #[test]
    fn test_numeric_score_from_fraction_string() {
        assert_eq!(
            numeric_score(&ScoreValue::Text("7/10".to_string())),
            Some(7.0)
        );
        assert_eq!(
            numeric_score(&ScoreValue::Text("10/10".to_string())),
            Some(10.0)
        );
    }

    #[test]
    fn test_numeric_score_tolerates_padding() {
        assert_eq!(
            numeric_score(&ScoreValue::Text(" 9 /10".to_string())),
            Some(9.0)
        );
    }

    #[test]
    fn test_numeric_score_rejects_other_strings() {
        assert_eq!(numeric_score(&ScoreValue::Text("great".to_string())), None);
        assert_eq!(numeric_score(&ScoreValue::Text("7/5".to_string())), None);
    }

    #[test]
    fn test_outcome_score_for_correctness_is_the_percentage() {
        let record = parse_reply(
            GradingMode::Correctness,
            r#"{"correctness": 72, "explanation": "decent", "suggestions": []}"#,
        );
        assert_eq!(outcome_score(&record), Some(72.0));
    }

    #[test]
    fn test_outcome_score_absent_for_free_text() {
        let record = parse_reply(GradingMode::Analysis, "no json here");
        assert_eq!(outcome_score(&record), None);
    }

    #[test]
    fn test_fraction_reply_extracts_numerator_and_keeps_display_form() {
        // The documented end-to-end example: a malformed 7/10 reply yields a
        // "7/10" display string and a numeric 7 for aggregation.
        let record = parse_reply(
            GradingMode::Analysis,
            r#"{"contentRelevance":"addresses the question","score": 7/10}"#,
        );
        assert_eq!(outcome_score(&record), Some(7.0));
        match record {
            AnalysisRecord::Answer(analysis) => {
                assert_eq!(analysis.score, ScoreValue::Text("7/10".to_string()));
            }
            other => panic!("expected Answer record, got {other:?}"),
        }
    }

    #[test]
    fn test_out_of_range_score_passes_through_unclamped() {
        let record = parse_reply(
            GradingMode::Analysis,
            r#"{"contentRelevance": "?", "score": 12}"#,
        );
        assert_eq!(outcome_score(&record), Some(12.0));
    }
}
