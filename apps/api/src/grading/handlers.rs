use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::grading::pipeline::{grade_answer, GradeRequest};
use crate::grading::GradingMode;
use crate::interviews::store::get_owned_interview;
use crate::models::response::QuestionType;
use crate::state::AppState;
use crate::transcripts::store::find_by_identity;

#[derive(Debug, Deserialize)]
pub struct GradeAnswerRequest {
    pub user_id: Uuid,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub question_type: QuestionType,
    #[serde(default)]
    pub mode: GradingMode,
}

/// POST /api/v1/interviews/:id/grade
/// Grades one answer and upserts the analysis under the question's identity
/// triple. Repeating the call replaces the stored analysis for that triple.
pub async fn handle_grade(
    State(state): State<AppState>,
    Path(interview_id): Path<Uuid>,
    Json(req): Json<GradeAnswerRequest>,
) -> Result<Json<Value>, AppError> {
    get_owned_interview(&state.db, interview_id, req.user_id).await?;

    let existing = find_by_identity(
        &state.db,
        interview_id,
        &req.question,
        req.question_type.as_str(),
    )
    .await?;
    if existing.as_ref().and_then(|r| r.transcript.as_ref()).is_none() {
        info!("Grading a question with no transcript on file for interview {interview_id}");
    }

    let outcome = grade_answer(
        &state.db,
        &state.llm,
        GradeRequest {
            interview_id: Some(interview_id),
            question: req.question,
            answer: req.answer,
            question_type: req.question_type,
            mode: req.mode,
        },
    )
    .await?;

    Ok(Json(json!({
        "analysis": outcome.analysis,
        "score": outcome.score,
    })))
}

#[derive(Debug, Deserialize)]
pub struct PracticeCheckRequest {
    pub question: PracticeQuestion,
    pub answer: String,
}

#[derive(Debug, Deserialize)]
pub struct PracticeQuestion {
    pub question: String,
    #[serde(rename = "type", default)]
    pub question_type: QuestionType,
}

/// POST /api/v1/practice/check
/// Scores a practice answer as a 0-100 correctness verdict. Not tied to an
/// interview; nothing is persisted.
pub async fn handle_practice_check(
    State(state): State<AppState>,
    Json(req): Json<PracticeCheckRequest>,
) -> Result<Json<Value>, AppError> {
    let outcome = grade_answer(
        &state.db,
        &state.llm,
        GradeRequest {
            interview_id: None,
            question: req.question.question,
            answer: req.answer,
            question_type: req.question.question_type,
            mode: GradingMode::Correctness,
        },
    )
    .await?;

    Ok(Json(json!({
        "analysis": outcome.analysis,
        "score": outcome.score,
    })))
}

fn default_language() -> String {
    "python".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ExplainCodeRequest {
    pub code: String,
    #[serde(default = "default_language")]
    pub language: String,
}

/// POST /api/v1/code/explain
/// Produces an overview, line-by-line notes and variable tracking for a code
/// snippet. Nothing is persisted.
pub async fn handle_explain_code(
    State(state): State<AppState>,
    Json(req): Json<ExplainCodeRequest>,
) -> Result<Json<Value>, AppError> {
    let outcome = grade_answer(
        &state.db,
        &state.llm,
        GradeRequest {
            interview_id: None,
            question: req.language,
            answer: req.code,
            question_type: QuestionType::Coding,
            mode: GradingMode::CodeExplanation,
        },
    )
    .await?;

    Ok(Json(json!({ "analysis": outcome.analysis })))
}
