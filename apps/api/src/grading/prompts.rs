// All LLM prompt constants for the grading module. The reply schema is named
// literally inside each prompt — the model is a free-text generator, so
// spelling out exact field names is the only enforcement mechanism available.

use crate::grading::GradingMode;
use crate::models::response::QuestionType;

/// System prompt for open-ended answer analysis.
pub const ANALYSIS_SYSTEM: &str = "You are an expert at evaluating interview responses. \
    Always format your response as valid JSON.";

/// Analysis prompt template. Replace `{question}` and `{answer}` before sending.
pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"Question: {question}

Response: {answer}

Please analyze this interview response and provide feedback on:
1. Content relevance (how well the response addresses the question)
2. Clarity and structure
3. Technical accuracy (if applicable)
4. Areas of improvement
5. Score (rate the answer on a scale of 1-10)

Format your response as a JSON object with these EXACT fields:
{"contentRelevance": "...", "clarityAndStructure": "...", "technicalAccuracy": "...", "areasOfImprovement": "...", "score": X}

Where X is a number between 1 and 10 representing your overall assessment of the answer quality."#;

/// System prompt for practice-answer checking.
pub const CORRECTNESS_SYSTEM: &str = "You are an expert at evaluating interview responses. \
    Provide constructive feedback to help the user improve. \
    Always format your response as valid JSON.";

/// Correctness prompt template. Replace `{question}`, `{question_type}` and
/// `{answer}` before sending.
pub const CORRECTNESS_PROMPT_TEMPLATE: &str = r#"Question: {question}
Question Type: {question_type}
User's Answer: {answer}

Please evaluate this interview answer and provide feedback on:
1. Correctness (as a percentage from 0-100)
2. Explanation of what was good and what could be improved
3. Suggestions for improvement

Format your response as a JSON object with these EXACT fields:
{"correctness": X, "explanation": "...", "suggestions": ["...", "...", "..."]}

Where X is a number between 0 and 100 representing the correctness of the answer."#;

/// System prompt for code explanation.
pub const CODE_SYSTEM: &str = "You are an expert programming tutor. \
    Explain code clearly and accurately, tracking variables and their values \
    throughout execution. Always format your response as valid JSON.";

/// Code-explanation prompt template. Replace `{language}` and `{code}` before
/// sending.
pub const CODE_PROMPT_TEMPLATE: &str = r#"Explain this {language} code in detail:

```{language}
{code}
```

Provide:
1. An overview of what the code does
2. Line-by-line explanation
3. Variable tracking showing how each variable changes throughout execution

Format your response as a JSON object with these EXACT fields:
{"overview": "...", "line_by_line": [{"code": "line of code", "explanation": "explanation of this line"}], "variable_tracking": [{"line_number": X, "variables": {"variable_name": {"value": "current value", "type": "data type"}}}]}"#;

/// Returns the fixed system instruction for a grading mode.
pub fn system_instruction(mode: GradingMode) -> &'static str {
    match mode {
        GradingMode::Analysis => ANALYSIS_SYSTEM,
        GradingMode::Correctness => CORRECTNESS_SYSTEM,
        GradingMode::CodeExplanation => CODE_SYSTEM,
    }
}

/// Builds the grading prompt for one answer. Deterministic for identical
/// inputs. For `CodeExplanation` the `question` slot carries the language
/// label and `answer` carries the code itself.
pub fn build_grading_prompt(
    mode: GradingMode,
    question: &str,
    answer: &str,
    question_type: QuestionType,
) -> String {
    match mode {
        GradingMode::Analysis => ANALYSIS_PROMPT_TEMPLATE
            .replace("{question}", question)
            .replace("{answer}", answer),
        GradingMode::Correctness => CORRECTNESS_PROMPT_TEMPLATE
            .replace("{question}", question)
            .replace("{question_type}", question_type.as_str())
            .replace("{answer}", answer),
        GradingMode::CodeExplanation => CODE_PROMPT_TEMPLATE
            .replace("{language}", question)
            .replace("{code}", answer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_prompt_is_deterministic() {
        let a = build_grading_prompt(
            GradingMode::Analysis,
            "What is polymorphism?",
            "It lets one interface serve many types.",
            QuestionType::Technical,
        );
        let b = build_grading_prompt(
            GradingMode::Analysis,
            "What is polymorphism?",
            "It lets one interface serve many types.",
            QuestionType::Technical,
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_analysis_prompt_names_exact_fields() {
        let prompt = build_grading_prompt(
            GradingMode::Analysis,
            "Q",
            "A",
            QuestionType::General,
        );
        for field in [
            "contentRelevance",
            "clarityAndStructure",
            "technicalAccuracy",
            "areasOfImprovement",
            "score",
        ] {
            assert!(prompt.contains(field), "missing field name {field}");
        }
        assert!(prompt.contains("scale of 1-10"));
    }

    #[test]
    fn test_correctness_prompt_includes_question_type() {
        let prompt = build_grading_prompt(
            GradingMode::Correctness,
            "Reverse a linked list",
            "Iterate and flip pointers",
            QuestionType::Coding,
        );
        assert!(prompt.contains("Question Type: coding"));
        assert!(prompt.contains("correctness"));
        assert!(prompt.contains("suggestions"));
    }

    #[test]
    fn test_code_prompt_embeds_language_and_code() {
        let prompt = build_grading_prompt(
            GradingMode::CodeExplanation,
            "python",
            "x = [i * i for i in range(3)]",
            QuestionType::Coding,
        );
        assert!(prompt.contains("```python"));
        assert!(prompt.contains("x = [i * i for i in range(3)]"));
        assert!(prompt.contains("variable_tracking"));
        assert!(prompt.contains("line_by_line"));
    }

    #[test]
    fn test_placeholder_substitution_leaves_schema_braces_intact() {
        // The literal JSON shape in the template must survive substitution.
        let prompt = build_grading_prompt(
            GradingMode::Analysis,
            "Q",
            "A",
            QuestionType::General,
        );
        assert!(prompt.contains(r#"{"contentRelevance": "...""#));
        assert!(!prompt.contains("{question}"));
        assert!(!prompt.contains("{answer}"));
    }
}
