use super::CorpusError;

/// Observations plus the question that closes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub actions: Vec<String>,
    pub question: String,
    pub answer: String,
}

/// Parse scenario lines into scenarios.
///
/// Every line is trimmed. A line containing `?` closes the current scenario;
/// any other line is appended to the pending action list. Actions left
/// pending after the last question line are discarded.
pub fn parse_scenarios<I, S>(lines: I) -> Result<Vec<Scenario>, CorpusError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut scenarios = Vec::new();
    let mut actions = Vec::new();

    for (idx, line) in lines.into_iter().enumerate() {
        let line = line.as_ref().trim();
        let Some((question, answer)) = split_question(line) else {
            actions.push(line.to_string());
            continue;
        };

        let answer = first_answer_token(answer).ok_or_else(|| CorpusError::MissingAnswer {
            line: idx + 1,
            content: line.to_string(),
        })?;

        scenarios.push(Scenario {
            actions: std::mem::take(&mut actions),
            question: question.to_string(),
            answer: answer.to_string(),
        });
    }

    if !actions.is_empty() {
        tracing::debug!(
            dropped_actions = actions.len(),
            "scenario file ends without a question line"
        );
    }

    Ok(scenarios)
}

/// Split at the first `?`, keeping the `?` on the question side.
fn split_question(line: &str) -> Option<(&str, &str)> {
    let pos = line.find('?')?;
    Some(line.split_at(pos + 1))
}

fn first_answer_token(field: &str) -> Option<&str> {
    // split_whitespace treats tabs and spaces alike
    field.split_whitespace().next()
}
