//! Prompt rendering for benchmark questions.
//!
//! Rendering is a pure function of the record's actions and question. The
//! repeat command re-renders stored questions and relies on getting the
//! exact bytes the run command originally sent.
use crate::corpus::QuestionRecord;

/// System message sent alongside every prompt.
pub const SYSTEM_INSTRUCTION: &str = "You are a highly analytical, detail-oriented assistant.";

// Prompt template loaded at compile time
const QUESTION_TEMPLATE: &str = include_str!("../prompts/tom_question.md");

const ACTIONS_SLOT: &str = "{actions}";
const QUESTION_SLOT: &str = "{question}";

/// Render the user prompt for a question.
pub fn build_prompt(record: &QuestionRecord) -> String {
    render_prompt(&record.actions, &record.question)
}

/// Render the user prompt from its two variable parts.
pub fn render_prompt(actions: &[String], question: &str) -> String {
    let actions = actions.join("\n");
    fill_slots(
        QUESTION_TEMPLATE.trim_end(),
        &[(ACTIONS_SLOT, &actions), (QUESTION_SLOT, question)],
    )
}

/// Substitute slots in a single left-to-right pass.
///
/// Substituted text is never rescanned, so an action line that happens to
/// contain `{question}` is emitted verbatim.
fn fill_slots(template: &str, slots: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    loop {
        let next = slots
            .iter()
            .filter_map(|(slot, value)| rest.find(slot).map(|pos| (pos, *slot, *value)))
            .min_by_key(|(pos, _, _)| *pos);
        let Some((pos, slot, value)) = next else {
            out.push_str(rest);
            return out;
        };
        out.push_str(&rest[..pos]);
        out.push_str(value);
        rest = &rest[pos + slot.len()..];
    }
}
