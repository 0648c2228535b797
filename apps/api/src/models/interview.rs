use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One mock-interview session. `overall_score` stays NULL until the client
/// finalizes the interview with a score write.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterviewRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_title: String,
    pub experience_level: String,
    pub experience_years: Option<i32>,
    pub overall_score: Option<i32>,
    pub created_at: DateTime<Utc>,
}
