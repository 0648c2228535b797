use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interviews::store::{
    create_interview, get_owned_interview, list_for_user, set_overall_score,
};
use crate::models::response::QuestionType;
use crate::questions::generator::generate_interview_questions;
use crate::state::AppState;
use crate::transcripts::handlers::{response_view, ResponseView, UserIdQuery};
use crate::transcripts::store::list_for_interview;

fn default_num_questions() -> u8 {
    5
}

#[derive(Debug, Deserialize)]
pub struct CreateInterviewRequest {
    pub user_id: Uuid,
    pub job_title: String,
    pub experience_level: String,
    #[serde(default)]
    pub experience_years: Option<i32>,
    #[serde(default)]
    pub question_types: Vec<QuestionType>,
    #[serde(default = "default_num_questions")]
    pub num_questions: u8,
}

/// POST /api/v1/interviews
/// Finalizes interview setup: generates the question set, persists the
/// interview row and returns both. The questions travel with the client and
/// come back on every grading call — nothing is parked in server state.
pub async fn handle_create_interview(
    State(state): State<AppState>,
    Json(req): Json<CreateInterviewRequest>,
) -> Result<Json<Value>, AppError> {
    if req.job_title.trim().is_empty() || req.experience_level.trim().is_empty() {
        return Err(AppError::Validation(
            "job_title and experience_level are required".to_string(),
        ));
    }

    let questions = generate_interview_questions(
        &state.llm,
        &req.job_title,
        &req.experience_level,
        &req.question_types,
        req.num_questions,
    )
    .await?;

    let interview = create_interview(
        &state.db,
        req.user_id,
        &req.job_title,
        &req.experience_level,
        req.experience_years,
    )
    .await?;

    info!(
        "Created interview {} for user {} with {} questions",
        interview.id,
        req.user_id,
        questions.len()
    );

    Ok(Json(json!({
        "interview_id": interview.id,
        "questions": questions,
    })))
}

/// GET /api/v1/interviews
pub async fn handle_list_interviews(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Value>, AppError> {
    let interviews = list_for_user(&state.db, params.user_id).await?;
    Ok(Json(json!({ "interviews": interviews })))
}

/// GET /api/v1/interviews/:id
/// The results view: the interview plus every response with its decoded
/// analysis payload.
pub async fn handle_get_interview(
    State(state): State<AppState>,
    Path(interview_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Value>, AppError> {
    let interview = get_owned_interview(&state.db, interview_id, params.user_id).await?;

    let rows = list_for_interview(&state.db, interview_id).await?;
    let responses: Vec<ResponseView> = rows.iter().map(response_view).collect();

    Ok(Json(json!({
        "interview": interview,
        "responses": responses,
    })))
}

#[derive(Debug, Deserialize)]
pub struct SaveScoreRequest {
    pub user_id: Uuid,
    pub overall_score: i32,
}

/// POST /api/v1/interviews/:id/score
pub async fn handle_save_score(
    State(state): State<AppState>,
    Path(interview_id): Path<Uuid>,
    Json(req): Json<SaveScoreRequest>,
) -> Result<Json<Value>, AppError> {
    get_owned_interview(&state.db, interview_id, req.user_id).await?;

    set_overall_score(&state.db, interview_id, req.overall_score).await?;

    info!(
        "Saved overall score {} for interview {interview_id}",
        req.overall_score
    );

    Ok(Json(json!({ "success": true })))
}
