use super::CorpusError;

/// Classification tags from one trace line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceTags {
    pub question_type: String,
    pub story_type: String,
}

/// Parse trace lines into classification tags, one entry per line.
///
/// Earlier fields may themselves contain commas, so only the last two
/// fields are taken. Blank lines produce empty tags rather than being
/// dropped, which keeps positions aligned with the scenario file.
pub fn parse_traces<I, S>(lines: I) -> Result<Vec<TraceTags>, CorpusError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .enumerate()
        .map(|(idx, line)| parse_trace_line(idx + 1, line.as_ref()))
        .collect()
}

fn parse_trace_line(line_no: usize, line: &str) -> Result<TraceTags, CorpusError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(TraceTags::default());
    }

    let mut fields = line.rsplitn(3, ',');
    let story_type = fields.next().unwrap_or_default();
    let Some(question_type) = fields.next() else {
        return Err(CorpusError::MalformedTrace {
            line: line_no,
            content: line.to_string(),
        });
    };

    Ok(TraceTags {
        question_type: question_type.to_string(),
        story_type: story_type.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_last_two_fields() {
        let tags = parse_traces(["1,2,3,simple-tom,location-change"]).unwrap();
        assert_eq!(
            tags,
            vec![TraceTags {
                question_type: "simple-tom".to_string(),
                story_type: "location-change".to_string(),
            }]
        );
    }

    #[test]
    fn exactly_two_fields_is_enough() {
        let tags = parse_traces(["first_order,tom"]).unwrap();
        assert_eq!(tags[0].question_type, "first_order");
        assert_eq!(tags[0].story_type, "tom");
    }

    #[test]
    fn blank_line_keeps_its_position() {
        let tags = parse_traces(["a,b,c", "", "d,e,f"]).unwrap();
        assert_eq!(tags.len(), 3);
        assert_eq!(tags[1], TraceTags::default());
        assert_eq!(tags[2].story_type, "f");
    }

    #[test]
    fn surrounding_whitespace_is_trimmed_from_the_line() {
        let tags = parse_traces(["  x,second_order,no_tom \r"]).unwrap();
        assert_eq!(tags[0].story_type, "no_tom");
    }

    #[test]
    fn single_field_line_is_malformed() {
        let err = parse_traces(["a,b,c", "no commas here"]).unwrap_err();
        match err {
            CorpusError::MalformedTrace { line, content } => {
                assert_eq!(line, 2);
                assert_eq!(content, "no commas here");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
