use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::interview::InterviewRow;

/// Fetches an interview and verifies it belongs to the requesting user.
/// Missing id → NotFound; wrong owner → Forbidden. Every interview-scoped
/// operation goes through this check.
pub async fn get_owned_interview(
    pool: &PgPool,
    interview_id: Uuid,
    user_id: Uuid,
) -> Result<InterviewRow, AppError> {
    let interview = sqlx::query_as::<_, InterviewRow>("SELECT * FROM interviews WHERE id = $1")
        .bind(interview_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Interview {interview_id} not found")))?;

    ensure_owner(&interview, user_id)?;
    Ok(interview)
}

/// Ownership gate shared by all interview-scoped handlers.
pub fn ensure_owner(interview: &InterviewRow, user_id: Uuid) -> Result<(), AppError> {
    if interview.user_id != user_id {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// Inserts a new interview row and returns it.
pub async fn create_interview(
    pool: &PgPool,
    user_id: Uuid,
    job_title: &str,
    experience_level: &str,
    experience_years: Option<i32>,
) -> Result<InterviewRow, sqlx::Error> {
    sqlx::query_as::<_, InterviewRow>(
        r#"
        INSERT INTO interviews (id, user_id, job_title, experience_level, experience_years)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(job_title)
    .bind(experience_level)
    .bind(experience_years)
    .fetch_one(pool)
    .await
}

/// A user's interviews, newest first (dashboard view).
pub async fn list_for_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<InterviewRow>, sqlx::Error> {
    sqlx::query_as::<_, InterviewRow>(
        "SELECT * FROM interviews WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Finalizes an interview with its overall score.
pub async fn set_overall_score(
    pool: &PgPool,
    interview_id: Uuid,
    overall_score: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE interviews SET overall_score = $1 WHERE id = $2")
        .bind(overall_score)
        .bind(interview_id)
        .execute(pool)
        .await?;
    Ok(())
}
