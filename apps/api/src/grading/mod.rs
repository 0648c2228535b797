pub mod handlers;
pub mod parser;
pub mod pipeline;
pub mod prompts;

use serde::{Deserialize, Serialize};

/// Selects which reply schema the model is asked for and which decode target
/// the parser aims at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradingMode {
    /// Open-ended feedback with a 1-10 score.
    #[default]
    Analysis,
    /// Practice-answer check scored as a 0-100 percentage.
    Correctness,
    /// Code walkthrough with line-by-line notes and variable tracking.
    CodeExplanation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_serde_snake_case() {
        let m: GradingMode = serde_json::from_str(r#""code_explanation""#).unwrap();
        assert_eq!(m, GradingMode::CodeExplanation);
        let m: GradingMode = serde_json::from_str(r#""analysis""#).unwrap();
        assert_eq!(m, GradingMode::Analysis);
    }

    #[test]
    fn test_mode_default_is_analysis() {
        assert_eq!(GradingMode::default(), GradingMode::Analysis);
    }
}
