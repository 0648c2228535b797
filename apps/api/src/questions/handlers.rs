use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::models::response::QuestionType;
use crate::questions::generator::{generate_prep_questions, PrepParams};
use crate::state::AppState;

fn default_num_questions() -> u8 {
    5
}

fn default_difficulty() -> String {
    "medium".to_string()
}

#[derive(Debug, Deserialize)]
pub struct PrepQuestionsRequest {
    pub job_title: String,
    pub experience_level: String,
    #[serde(default)]
    pub question_types: Vec<QuestionType>,
    #[serde(default)]
    pub coding_languages: Vec<String>,
    #[serde(default = "default_num_questions")]
    pub num_questions: u8,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
}

/// POST /api/v1/practice/questions
/// Generates a practice set. Nothing is persisted — the questions travel
/// with the client and come back on each practice check.
pub async fn handle_prep_questions(
    State(state): State<AppState>,
    Json(req): Json<PrepQuestionsRequest>,
) -> Result<Json<Value>, AppError> {
    if req.job_title.trim().is_empty() || req.experience_level.trim().is_empty() {
        return Err(AppError::Validation(
            "job_title and experience_level are required".to_string(),
        ));
    }

    let questions = generate_prep_questions(
        &state.llm,
        PrepParams {
            job_title: &req.job_title,
            experience_level: &req.experience_level,
            question_types: &req.question_types,
            coding_languages: &req.coding_languages,
            num_questions: req.num_questions,
            difficulty: &req.difficulty,
        },
    )
    .await?;

    Ok(Json(json!({ "questions": questions })))
}
