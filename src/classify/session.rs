use super::{
    classification_aliases, resolve_choice, row_key, ClassifiedRecord, MODEL_CORRECT,
};
use crate::answer::answers_match;
use crate::record::RawOutputRow;
use crate::store::KeyedStore;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::io::{BufRead, Write};

/// Counts from classifying one results file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifyOutcome {
    pub correct: usize,
    pub classified: usize,
    pub skipped: usize,
    /// False when input ended before every row was handled.
    pub completed: bool,
}

/// Classify every row of one results file, prompting on `input`/`out` for
/// incorrect rows. Each verdict is persisted before moving on.
pub fn classify_rows<R, W>(
    file_name: &str,
    rows: &[RawOutputRow],
    store: &mut KeyedStore<ClassifiedRecord>,
    reclassify: bool,
    input: &mut R,
    out: &mut W,
) -> Result<ClassifyOutcome>
where
    R: BufRead,
    W: Write,
{
    let mut outcome = ClassifyOutcome::default();

    for (ordinal, row) in rows.iter().enumerate() {
        let key = row_key(file_name, ordinal);
        if !reclassify && store.contains_key(&key) {
            outcome.skipped += 1;
            continue;
        }
        writeln!(out, "{key}")?;

        if answers_match(&row.answer, &row.parsed_answer) {
            store.upsert(
                &key,
                ClassifiedRecord {
                    row: row.clone(),
                    correct: true,
                    classification: MODEL_CORRECT.to_string(),
                },
            )?;
            outcome.correct += 1;
            continue;
        }

        show_row(out, file_name, ordinal, row)?;
        let aliases = classification_aliases(store.records().values());
        show_aliases(out, &aliases)?;

        let Some(classification) = prompt_classification(input, out, &aliases)? else {
            tracing::info!(file = file_name, ordinal, "input ended; stopping");
            return Ok(outcome);
        };
        store.upsert(
            &key,
            ClassifiedRecord {
                row: row.clone(),
                correct: false,
                classification,
            },
        )?;
        outcome.classified += 1;
        writeln!(out, "{}", "-".repeat(80))?;
    }

    outcome.completed = true;
    Ok(outcome)
}

fn show_row<W: Write>(
    out: &mut W,
    file_name: &str,
    ordinal: usize,
    row: &RawOutputRow,
) -> Result<()> {
    writeln!(out, "file {file_name}, line {}", ordinal + 1)?;
    writeln!(out, "{}", row.actions)?;
    writeln!(out, "{}", row.question)?;
    writeln!(
        out,
        "RIGHT ANSWER: {}, MODEL ANSWER: {}",
        row.answer, row.parsed_answer
    )?;
    writeln!(out, "{}", row.raw_response)?;
    Ok(())
}

fn show_aliases<W: Write>(out: &mut W, aliases: &BTreeMap<usize, String>) -> Result<()> {
    if aliases.is_empty() {
        writeln!(out, "No classifications yet...")?;
        writeln!(out, "Type the reason the first time you use it; afterwards you")?;
        writeln!(out, "can enter its number, or type a new reason to add it.")?;
        return Ok(());
    }
    writeln!(out, "Current classifications:")?;
    for (alias, classification) in aliases {
        writeln!(out, "  {alias}: {classification}")?;
    }
    Ok(())
}

/// Read until a valid classification arrives; `None` at end of input.
fn prompt_classification<R, W>(
    input: &mut R,
    out: &mut W,
    aliases: &BTreeMap<usize, String>,
) -> Result<Option<String>>
where
    R: BufRead,
    W: Write,
{
    loop {
        write!(out, "Classify why the answer is wrong: ")?;
        out.flush()?;

        let mut line = String::new();
        let read = input.read_line(&mut line).context("read classification")?;
        if read == 0 {
            return Ok(None);
        }
        match resolve_choice(&line, aliases) {
            Ok(classification) => return Ok(Some(classification)),
            Err(err) => writeln!(out, "{err}; try again")?,
        }
    }
}
