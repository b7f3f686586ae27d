//! Answer extraction from raw model responses.

const ANSWER_OPEN: &str = "<answer>";
const ANSWER_CLOSE: &str = "</answer>";

/// Extract the text between the first `<answer>` and the `</answer>` after it.
///
/// Returns `None` when either tag is missing. Surrounding whitespace inside
/// the span is trimmed.
pub fn extract_answer(response: &str) -> Option<&str> {
    let start = response.find(ANSWER_OPEN)? + ANSWER_OPEN.len();
    let rest = &response[start..];
    let end = rest.find(ANSWER_CLOSE)?;
    Some(rest[..end].trim())
}

/// Compare an expected answer with a model answer, ignoring case and
/// surrounding whitespace.
pub fn answers_match(expected: &str, actual: &str) -> bool {
    expected.trim().to_lowercase() == actual.trim().to_lowercase()
}
