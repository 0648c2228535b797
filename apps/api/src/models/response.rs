use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One answered question within an interview. The triple
/// (interview_id, question, question_type) is the natural key — the
/// `responses` table enforces it with a UNIQUE constraint, so a question can
/// never accumulate duplicate rows no matter how often it is re-submitted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResponseRow {
    pub id: Uuid,
    pub interview_id: Uuid,
    pub question: String,
    pub question_type: String,
    pub transcript: Option<String>,
    /// Serialized analysis record. Written by the grading pipeline after the
    /// transcript, so a row may transiently hold a transcript and no analysis.
    pub analysis: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The fixed set of question categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Technical,
    Behavioral,
    Situational,
    Coding,
    #[default]
    General,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Technical => "technical",
            QuestionType::Behavioral => "behavioral",
            QuestionType::Situational => "situational",
            QuestionType::Coding => "coding",
            QuestionType::General => "general",
        }
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_type_serde_lowercase() {
        let qt: QuestionType = serde_json::from_str(r#""behavioral""#).unwrap();
        assert_eq!(qt, QuestionType::Behavioral);
        assert_eq!(serde_json::to_string(&qt).unwrap(), r#""behavioral""#);
    }

    #[test]
    fn test_question_type_default_is_general() {
        assert_eq!(QuestionType::default(), QuestionType::General);
    }

    #[test]
    fn test_question_type_as_str_round_trip() {
        for qt in [
            QuestionType::Technical,
            QuestionType::Behavioral,
            QuestionType::Situational,
            QuestionType::Coding,
            QuestionType::General,
        ] {
            let json = format!("\"{}\"", qt.as_str());
            let parsed: QuestionType = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, qt);
        }
    }

    #[test]
    fn test_unknown_question_type_is_rejected() {
        let result: Result<QuestionType, _> = serde_json::from_str(r#""trivia""#);
        assert!(result.is_err());
    }
}
