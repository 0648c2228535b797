//! Question generation — builds the question set for interview setup and
//! practice prep.
//!
//! The model is asked for a JSON array but, as with grading replies, does not
//! always deliver one. Recovery runs an array-shaped fallback chain: direct
//! decode → bracket-delimited slice → line-by-line extraction keyed on type
//! keywords. An empty result is the caller's problem to surface.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::AppError;
use crate::grading::parser::strip_code_fences;
use crate::llm_client::LlmClient;
use crate::models::response::QuestionType;
use crate::questions::prompts::{
    CODING_LANGUAGES_INSTRUCTION, INTERVIEW_QUESTIONS_TEMPLATE, PREP_QUESTIONS_TEMPLATE,
    QUESTION_SYSTEM,
};

/// One generated question as returned to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    #[serde(rename = "type", default)]
    pub question_type: QuestionType,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Generates the question set for a new interview.
pub async fn generate_interview_questions(
    llm: &LlmClient,
    job_title: &str,
    experience_level: &str,
    question_types: &[QuestionType],
    num_questions: u8,
) -> Result<Vec<GeneratedQuestion>, AppError> {
    let prompt = INTERVIEW_QUESTIONS_TEMPLATE
        .replace("{num_questions}", &num_questions.to_string())
        .replace("{experience_level}", experience_level)
        .replace("{job_title}", job_title)
        .replace("{question_types}", &join_types(question_types));

    let reply = llm
        .complete(&prompt, QUESTION_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("Question generation failed: {e}")))?;

    let questions = parse_question_reply(&reply);
    if questions.is_empty() {
        return Err(AppError::Llm(
            "The model returned no usable questions".to_string(),
        ));
    }
    Ok(questions)
}

/// Parameters for practice-prep generation.
#[derive(Debug, Clone)]
pub struct PrepParams<'a> {
    pub job_title: &'a str,
    pub experience_level: &'a str,
    pub question_types: &'a [QuestionType],
    pub coding_languages: &'a [String],
    pub num_questions: u8,
    pub difficulty: &'a str,
}

/// Generates a practice question set, optionally targeting coding languages.
pub async fn generate_prep_questions(
    llm: &LlmClient,
    params: PrepParams<'_>,
) -> Result<Vec<GeneratedQuestion>, AppError> {
    let coding_instruction = if params.question_types.contains(&QuestionType::Coding)
        && !params.coding_languages.is_empty()
    {
        CODING_LANGUAGES_INSTRUCTION.replace("{languages}", &params.coding_languages.join(", "))
    } else {
        String::new()
    };

    let prompt = PREP_QUESTIONS_TEMPLATE
        .replace("{num_questions}", &params.num_questions.to_string())
        .replace("{experience_level}", params.experience_level)
        .replace("{job_title}", params.job_title)
        .replace("{question_types}", &join_types(params.question_types))
        .replace("{difficulty}", params.difficulty)
        .replace("{coding_instruction}", &coding_instruction);

    let reply = llm
        .complete(&prompt, QUESTION_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("Prep question generation failed: {e}")))?;

    let questions = parse_question_reply(&reply);
    if questions.is_empty() {
        return Err(AppError::Llm(
            "The model returned no usable questions".to_string(),
        ));
    }
    Ok(questions)
}

fn join_types(types: &[QuestionType]) -> String {
    if types.is_empty() {
        return QuestionType::General.as_str().to_string();
    }
    types
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Best-effort recovery of a question list from a model reply.
pub fn parse_question_reply(raw: &str) -> Vec<GeneratedQuestion> {
    let text = strip_code_fences(raw);

    if let Ok(questions) = serde_json::from_str::<Vec<GeneratedQuestion>>(text) {
        return questions;
    }

    if let Some(slice) = bracket_slice(text) {
        if let Ok(questions) = serde_json::from_str::<Vec<GeneratedQuestion>>(slice) {
            debug!("Question reply decoded from bracket-delimited slice");
            return questions;
        }
    }

    debug!("Question reply not decodable as JSON; extracting from lines");
    extract_questions_from_lines(text)
}

/// The substring from the first `[` to the last `]`, inclusive.
fn bracket_slice(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (start < end).then(|| &text[start..=end])
}

/// Last-resort extraction: any `label: text` line becomes a question, typed
/// by the first category keyword found on the line.
fn extract_questions_from_lines(text: &str) -> Vec<GeneratedQuestion> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim();
            let (label, question) = line.split_once(':')?;
            let question = question.trim();
            if question.is_empty() {
                return None;
            }
            Some(GeneratedQuestion {
                question_type: classify_line(label),
                question: question.to_string(),
                difficulty: None,
                language: None,
            })
        })
        .collect()
}

/// Maps a line label to a question type by keyword.
fn classify_line(label: &str) -> QuestionType {
    let label = label.to_lowercase();
    if label.contains("technical") {
        QuestionType::Technical
    } else if label.contains("behavioral") {
        QuestionType::Behavioral
    } else if label.contains("situational") {
        QuestionType::Situational
    } else if label.contains("coding") {
        QuestionType::Coding
    } else {
        QuestionType::General
    }
}
