use super::{CorpusError, QuestionRecord, Scenario, TraceTags};

/// Join trace tags and scenarios by position.
///
/// Both sequences must have the same length; a mismatch means the files have
/// drifted apart and every pairing after the drift would be wrong.
pub fn assemble(
    traces: Vec<TraceTags>,
    scenarios: Vec<Scenario>,
) -> Result<Vec<QuestionRecord>, CorpusError> {
    if traces.len() != scenarios.len() {
        return Err(CorpusError::MisalignedInput {
            traces: traces.len(),
            scenarios: scenarios.len(),
        });
    }

    Ok(traces
        .into_iter()
        .zip(scenarios)
        .map(|(tags, scenario)| QuestionRecord {
            question_type: tags.question_type,
            story_type: tags.story_type,
            actions: scenario.actions,
            question: scenario.question,
            answer: scenario.answer,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(question_type: &str, story_type: &str) -> TraceTags {
        TraceTags {
            question_type: question_type.to_string(),
            story_type: story_type.to_string(),
        }
    }

    fn scenario(question: &str, answer: &str) -> Scenario {
        Scenario {
            actions: vec![format!("before {question}")],
            question: question.to_string(),
            answer: answer.to_string(),
        }
    }

    #[test]
    fn pairs_records_in_order() {
        let records = assemble(
            vec![tags("first_order", "tom"), tags("reality", "no_tom")],
            vec![scenario("q1?", "a1"), scenario("q2?", "a2")],
        )
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].question_type, "first_order");
        assert_eq!(records[0].question, "q1?");
        assert_eq!(records[0].actions, vec!["before q1?"]);
        assert_eq!(records[1].story_type, "no_tom");
        assert_eq!(records[1].answer, "a2");
    }

    #[test]
    fn empty_inputs_assemble_to_nothing() {
        assert!(assemble(Vec::new(), Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn length_mismatch_fails_instead_of_truncating() {
        let err = assemble(
            vec![tags("a", "b"), tags("c", "d"), tags("e", "f")],
            vec![scenario("q?", "a")],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CorpusError::MisalignedInput {
                traces: 3,
                scenarios: 1
            }
        ));
    }
}
