// All LLM prompt constants for question generation.

/// System prompt for both interview setup and practice prep.
pub const QUESTION_SYSTEM: &str = "You are an expert interviewer for technical positions. \
    Generate diverse, challenging, and realistic interview questions.";

/// Interview-setup question template. Replace `{num_questions}`,
/// `{experience_level}`, `{job_title}` and `{question_types}` before sending.
pub const INTERVIEW_QUESTIONS_TEMPLATE: &str = r#"Generate {num_questions} interview questions for a {experience_level} level {job_title} position.
Include questions of these types: {question_types}.
Format the response as a JSON array of objects with 'type' and 'question' fields."#;

/// Practice-prep question template. Replace `{num_questions}`,
/// `{experience_level}`, `{job_title}`, `{question_types}`, `{difficulty}`
/// and `{coding_instruction}` before sending.
pub const PREP_QUESTIONS_TEMPLATE: &str = r#"Generate {num_questions} interview questions for a {experience_level} level {job_title} position.
Include questions of these types: {question_types}.
The difficulty level should be {difficulty}.
{coding_instruction}
Format the response as a JSON array of objects with 'type', 'question' and 'difficulty' fields.
For coding questions, also include a 'language' field."#;

/// Extra instruction inserted when coding questions target specific
/// languages. Replace `{languages}` before sending.
pub const CODING_LANGUAGES_INSTRUCTION: &str = "For coding questions, include problems that can \
    be solved in these languages: {languages}. For each coding question, specify which language \
    it is for.";
