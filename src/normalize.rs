//! Coerces raw model output into a validated question array.
//!
//! Model replies frequently wrap the JSON array in prose or markdown fences
//! and occasionally use typographic quotes. Parsing is a two-stage strategy:
//! a strict parse first, then a bracket-delimited fallback slice. Both stages
//! feed the same per-element validation so tests can target each stage
//! independently.

use serde_json::Value;

use crate::types::Question;

/// Result type for normalizer operations
pub type NormalizeResult<T> = Result<T, NormalizeError>;

/// Classified failures while turning model text into questions
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("response does not contain a parseable JSON array")]
    MalformedResponse,

    #[error("invalid question at index {index}: {reason}")]
    InvalidQuestionShape { index: usize, reason: String },

    #[error("provider returned an empty question array")]
    EmptyResult,
}

/// Extract and validate a question array from a raw model reply.
///
/// Pure and deterministic: identical input text always yields the identical
/// result. Never retries internally; callers own the retry policy.
pub fn questions_from_text(raw: &str) -> NormalizeResult<Vec<Question>> {
    // Typographic quotes break serde_json before we ever see the array.
    let text = raw.replace(['\u{201C}', '\u{201D}'], "\"");

    let value = match serde_json::from_str::<Value>(text.trim()) {
        Ok(value) if value.is_array() => value,
        _ => reparse_bracket_slice(&text)?,
    };

    let elements = value.as_array().ok_or(NormalizeError::MalformedResponse)?;
    let questions = elements
        .iter()
        .enumerate()
        .map(|(index, element)| question_from_value(index, element))
        .collect::<NormalizeResult<Vec<_>>>()?;

    if questions.is_empty() {
        // An empty quiz must trigger the caller's retry path, not render as
        // a silently empty game.
        return Err(NormalizeError::EmptyResult);
    }

    Ok(questions)
}

/// Fallback stage: slice between the first `[` and the last `]` and reparse.
fn reparse_bracket_slice(text: &str) -> NormalizeResult<Value> {
    let start = text.find('[').ok_or(NormalizeError::MalformedResponse)?;
    let end = text.rfind(']').ok_or(NormalizeError::MalformedResponse)?;
    if end <= start {
        return Err(NormalizeError::MalformedResponse);
    }

    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(value) if value.is_array() => Ok(value),
        _ => Err(NormalizeError::MalformedResponse),
    }
}

fn question_from_value(index: usize, element: &Value) -> NormalizeResult<Question> {
    let shape_err = |reason: &str| NormalizeError::InvalidQuestionShape {
        index,
        reason: reason.to_string(),
    };

    let question = element
        .get("question")
        .and_then(Value::as_str)
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| shape_err("missing or empty 'question'"))?;

    let options = element
        .get("options")
        .and_then(Value::as_array)
        .ok_or_else(|| shape_err("missing 'options' array"))?
        .iter()
        .map(|option| {
            option
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| shape_err("'options' must contain only strings"))
        })
        .collect::<NormalizeResult<Vec<_>>>()?;

    let correct_answer = element
        .get("correctAnswer")
        .and_then(Value::as_str)
        .ok_or_else(|| shape_err("missing 'correctAnswer'"))?;

    if !options.iter().any(|option| option == correct_answer) {
        return Err(shape_err("'correctAnswer' not present in 'options'"));
    }

    Ok(Question {
        question: question.to_string(),
        options,
        correct_answer: correct_answer.to_string(),
    })
}

/// Validate already-deserialized questions (used by the fetch client on proxy
/// response bodies). Same invariants as the parse path.
pub fn validate_questions(questions: &[Question]) -> NormalizeResult<()> {
    if questions.is_empty() {
        return Err(NormalizeError::EmptyResult);
    }

    for (index, q) in questions.iter().enumerate() {
        let shape_err = |reason: &str| NormalizeError::InvalidQuestionShape {
            index,
            reason: reason.to_string(),
        };
        if q.question.trim().is_empty() {
            return Err(shape_err("missing or empty 'question'"));
        }
        if !q.options.iter().any(|option| option == &q.correct_answer) {
            return Err(shape_err("'correctAnswer' not present in 'options'"));
        }
    }

    Ok(())
}
