use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interviews::store::get_owned_interview;
use crate::models::response::{QuestionType, ResponseRow};
use crate::speech::transcribe_with_fallback;
use crate::state::AppState;
use crate::transcripts::store::{
    list_for_interview, upsert_response, upsert_transcript,
};

#[derive(Debug, Deserialize)]
pub struct SaveTranscriptRequest {
    pub user_id: Uuid,
    pub question: String,
    pub question_type: QuestionType,
    pub transcript: String,
}

/// POST /api/v1/interviews/:id/transcripts
/// Persists a client-supplied transcript under its identity triple.
pub async fn handle_save_transcript(
    State(state): State<AppState>,
    Path(interview_id): Path<Uuid>,
    Json(req): Json<SaveTranscriptRequest>,
) -> Result<Json<Value>, AppError> {
    if req.question.trim().is_empty() || req.transcript.trim().is_empty() {
        return Err(AppError::Validation(
            "question and transcript are required".to_string(),
        ));
    }

    get_owned_interview(&state.db, interview_id, req.user_id).await?;

    upsert_transcript(
        &state.db,
        interview_id,
        &req.question,
        req.question_type.as_str(),
        &req.transcript,
    )
    .await?;

    Ok(Json(json!({ "success": true })))
}

/// POST /api/v1/interviews/:id/transcripts/audio
/// Accepts a multipart audio upload, transcribes it through the attempt
/// ladder, persists the transcript and returns it.
pub async fn handle_transcribe_audio(
    State(state): State<AppState>,
    Path(interview_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let mut audio: Option<bytes::Bytes> = None;
    let mut user_id: Option<Uuid> = None;
    let mut question: Option<String> = None;
    let mut question_type = QuestionType::General;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "audio" => {
                audio = Some(field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read audio field: {e}"))
                })?)
            }
            "user_id" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid user_id field: {e}")))?;
                user_id = Some(text.parse().map_err(|_| {
                    AppError::Validation("user_id must be a UUID".to_string())
                })?);
            }
            "question" => {
                question = Some(field.text().await.map_err(|e| {
                    AppError::Validation(format!("Invalid question field: {e}"))
                })?)
            }
            "question_type" => {
                let text = field.text().await.map_err(|e| {
                    AppError::Validation(format!("Invalid question_type field: {e}"))
                })?;
                question_type = serde_json::from_value(Value::String(text)).map_err(|_| {
                    AppError::Validation("unknown question_type".to_string())
                })?;
            }
            _ => {}
        }
    }

    let audio = audio
        .ok_or_else(|| AppError::Validation("No audio file provided".to_string()))?;
    if audio.is_empty() {
        return Err(AppError::Validation("Empty audio file received".to_string()));
    }
    let user_id =
        user_id.ok_or_else(|| AppError::Validation("user_id is required".to_string()))?;
    let question =
        question.ok_or_else(|| AppError::Validation("question is required".to_string()))?;

    get_owned_interview(&state.db, interview_id, user_id).await?;

    let transcript = transcribe_with_fallback(state.speech.as_ref(), &audio)
        .await
        .map_err(|e| AppError::Speech(e.to_string()))?;

    upsert_transcript(
        &state.db,
        interview_id,
        &question,
        question_type.as_str(),
        &transcript,
    )
    .await?;

    Ok(Json(json!({ "transcript": transcript })))
}

#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

/// A response row shaped for clients, with the stored analysis text decoded
/// back into a structured payload.
#[derive(Debug, Serialize)]
pub struct ResponseView {
    pub id: Uuid,
    pub question: QuestionView,
    pub transcript: Option<String>,
    pub analysis: Value,
}

#[derive(Debug, Serialize)]
pub struct QuestionView {
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: String,
}

/// GET /api/v1/interviews/:id/responses
pub async fn handle_list_responses(
    State(state): State<AppState>,
    Path(interview_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Value>, AppError> {
    get_owned_interview(&state.db, interview_id, params.user_id).await?;

    let rows = list_for_interview(&state.db, interview_id).await?;
    let responses: Vec<ResponseView> = rows.iter().map(response_view).collect();

    Ok(Json(json!({ "responses": responses })))
}

#[derive(Debug, Deserialize)]
pub struct SaveResponsesRequest {
    pub user_id: Uuid,
    pub responses: Vec<SavedResponse>,
}

#[derive(Debug, Deserialize)]
pub struct SavedResponse {
    pub question: SavedQuestion,
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub analysis: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct SavedQuestion {
    pub question: String,
    #[serde(rename = "type", default)]
    pub question_type: QuestionType,
}

/// POST /api/v1/interviews/:id/responses
/// Bulk save at the end of an interview: every entry is upserted under its
/// identity triple, so re-submitting the batch keeps the latest values only.
pub async fn handle_save_responses(
    State(state): State<AppState>,
    Path(interview_id): Path<Uuid>,
    Json(req): Json<SaveResponsesRequest>,
) -> Result<Json<Value>, AppError> {
    get_owned_interview(&state.db, interview_id, req.user_id).await?;

    for entry in &req.responses {
        if entry.question.question.trim().is_empty() {
            continue;
        }
        let analysis_text = match &entry.analysis {
            Some(value) => Some(serde_json::to_string(value).map_err(|e| {
                AppError::Internal(anyhow::anyhow!("Failed to serialize analysis: {e}"))
            })?),
            None => None,
        };
        upsert_response(
            &state.db,
            interview_id,
            &entry.question.question,
            entry.question.question_type.as_str(),
            entry.transcript.as_deref(),
            analysis_text.as_deref(),
        )
        .await?;
    }

    Ok(Json(json!({ "success": true })))
}

/// Shapes one stored row for clients.
pub fn response_view(row: &ResponseRow) -> ResponseView {
    ResponseView {
        id: row.id,
        question: QuestionView {
            text: row.question.clone(),
            question_type: row.question_type.clone(),
        },
        transcript: row.transcript.clone(),
        analysis: parse_stored_analysis(row.analysis.as_deref()),
    }
}

/// Decodes a stored analysis payload. Rows written before an analysis ran
/// yield an empty object; payloads that are not valid JSON (legacy free-text
/// fallbacks) degrade to a `{"text": ...}` wrapper instead of erroring.
pub fn parse_stored_analysis(analysis: Option<&str>) -> Value {
    match analysis {
        None => json!({}),
        Some(text) => serde_json::from_str(text)
            .unwrap_or_else(|_| json!({ "text": text })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_parse_stored_analysis_none_is_empty_object() {
        assert_eq!(parse_stored_analysis(None), json!({}));
    }

    #[test]
    fn test_parse_stored_analysis_valid_json_passes_through() {
        let value = parse_stored_analysis(Some(r#"{"score": "7/10"}"#));
        assert_eq!(value, json!({"score": "7/10"}));
    }

    #[test]
    fn test_parse_stored_analysis_invalid_json_wraps_as_text() {
        let value = parse_stored_analysis(Some("not json at all"));
        assert_eq!(value, json!({"text": "not json at all"}));
    }

    #[test]
    fn test_response_view_shape() {
        let row = ResponseRow {
            id: Uuid::new_v4(),
            interview_id: Uuid::new_v4(),
            question: "What is polymorphism?".to_string(),
            question_type: "technical".to_string(),
            transcript: Some("It lets one interface serve many types.".to_string()),
            analysis: Some(r#"{"score": 8}"#.to_string()),
            created_at: Utc::now(),
        };
        let view = response_view(&row);
        assert_eq!(view.question.text, "What is polymorphism?");
        assert_eq!(view.question.question_type, "technical");
        assert_eq!(view.analysis, json!({"score": 8}));
    }
}
