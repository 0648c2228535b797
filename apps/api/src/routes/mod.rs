pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::grading::handlers as grading;
use crate::interviews::handlers as interviews;
use crate::questions::handlers as questions;
use crate::state::AppState;
use crate::transcripts::handlers as transcripts;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Interview lifecycle
        .route(
            "/api/v1/interviews",
            post(interviews::handle_create_interview).get(interviews::handle_list_interviews),
        )
        .route(
            "/api/v1/interviews/:id",
            get(interviews::handle_get_interview),
        )
        .route(
            "/api/v1/interviews/:id/score",
            post(interviews::handle_save_score),
        )
        // Responses and transcripts
        .route(
            "/api/v1/interviews/:id/responses",
            get(transcripts::handle_list_responses).post(transcripts::handle_save_responses),
        )
        .route(
            "/api/v1/interviews/:id/transcripts",
            post(transcripts::handle_save_transcript),
        )
        .route(
            "/api/v1/interviews/:id/transcripts/audio",
            post(transcripts::handle_transcribe_audio),
        )
        // Grading
        .route("/api/v1/interviews/:id/grade", post(grading::handle_grade))
        .route(
            "/api/v1/practice/check",
            post(grading::handle_practice_check),
        )
        .route("/api/v1/code/explain", post(grading::handle_explain_code))
        // Practice prep
        .route(
            "/api/v1/practice/questions",
            post(questions::handle_prep_questions),
        )
        .with_state(state)
}
