//! Transcript store — persistence façade over the `responses` table.
//!
//! The natural key for every write is the identity triple
//! (interview_id, question, question_type), backed by a UNIQUE constraint.
//! Upserts are single `INSERT ... ON CONFLICT ... DO UPDATE` statements, so
//! two concurrent submissions for the same triple resolve atomically to
//! last-writer-wins instead of racing a find-then-insert into duplicates.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::response::ResponseRow;

/// Looks up the response stored under an identity triple, if any.
pub async fn find_by_identity(
    pool: &PgPool,
    interview_id: Uuid,
    question: &str,
    question_type: &str,
) -> Result<Option<ResponseRow>, sqlx::Error> {
    sqlx::query_as::<_, ResponseRow>(
        "SELECT * FROM responses WHERE interview_id = $1 AND question = $2 AND question_type = $3",
    )
    .bind(interview_id)
    .bind(question)
    .bind(question_type)
    .fetch_optional(pool)
    .await
}

/// Writes a transcript under its identity triple, creating the response row
/// if needed. Touches only the transcript column, so a stored analysis
/// survives transcript re-submission.
pub async fn upsert_transcript(
    pool: &PgPool,
    interview_id: Uuid,
    question: &str,
    question_type: &str,
    transcript: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO responses (id, interview_id, question, question_type, transcript)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (interview_id, question, question_type)
        DO UPDATE SET transcript = EXCLUDED.transcript
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(interview_id)
    .bind(question)
    .bind(question_type)
    .bind(transcript)
    .execute(pool)
    .await?;
    Ok(())
}

/// Writes an analysis payload under its identity triple, creating the
/// response row if needed. Touches only the analysis column, so a failed or
/// repeated grading round never disturbs a stored transcript.
pub async fn upsert_analysis(
    pool: &PgPool,
    interview_id: Uuid,
    question: &str,
    question_type: &str,
    analysis: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO responses (id, interview_id, question, question_type, analysis)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (interview_id, question, question_type)
        DO UPDATE SET analysis = EXCLUDED.analysis
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(interview_id)
    .bind(question)
    .bind(question_type)
    .bind(analysis)
    .execute(pool)
    .await?;
    Ok(())
}

/// Writes transcript and analysis together (bulk save from the client).
pub async fn upsert_response(
    pool: &PgPool,
    interview_id: Uuid,
    question: &str,
    question_type: &str,
    transcript: Option<&str>,
    analysis: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO responses (id, interview_id, question, question_type, transcript, analysis)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (interview_id, question, question_type)
        DO UPDATE SET transcript = EXCLUDED.transcript, analysis = EXCLUDED.analysis
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(interview_id)
    .bind(question)
    .bind(question_type)
    .bind(transcript)
    .bind(analysis)
    .execute(pool)
    .await?;
    Ok(())
}

/// All responses recorded for an interview, oldest first.
pub async fn list_for_interview(
    pool: &PgPool,
    interview_id: Uuid,
) -> Result<Vec<ResponseRow>, sqlx::Error> {
    sqlx::query_as::<_, ResponseRow>(
        "SELECT * FROM responses WHERE interview_id = $1 ORDER BY created_at ASC",
    )
    .bind(interview_id)
    .fetch_all(pool)
    .await
}
