//! Manual failure classification.
//!
//! Rows from raw run output are scored by comparing the expected answer with
//! the model's parsed answer. Correct rows are stored automatically; for each
//! incorrect row the user types a short reason. Reasons typed so far are
//! offered back as numbered aliases so repeated reasons stay consistent.

mod session;

pub use session::{classify_rows, ClassifyOutcome};

use crate::record::RawOutputRow;
use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Classification stored for rows the model answered correctly.
pub const MODEL_CORRECT: &str = "model_correct";

/// A raw output row with its verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedRecord {
    #[serde(flatten)]
    pub row: RawOutputRow,
    pub correct: bool,
    pub classification: String,
}

/// Why typed input was not accepted as a classification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChoiceError {
    #[error("classification must not be empty")]
    Empty,
    #[error("no classification with alias {0}")]
    UnknownAlias(i64),
}

/// Key of row `ordinal` in the results file `file_name`.
pub fn row_key(file_name: &str, ordinal: usize) -> String {
    format!("{file_name}_{ordinal}")
}

/// Number the distinct classifications of incorrect records, sorted.
pub fn classification_aliases<'a, I>(records: I) -> BTreeMap<usize, String>
where
    I: IntoIterator<Item = &'a ClassifiedRecord>,
{
    records
        .into_iter()
        .filter(|record| !record.correct)
        .map(|record| record.classification.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .enumerate()
        .collect()
}

/// Interpret typed input: an integer selects an alias, anything else is a new
/// free-text classification.
pub fn resolve_choice(
    input: &str,
    aliases: &BTreeMap<usize, String>,
) -> Result<String, ChoiceError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ChoiceError::Empty);
    }
    let Ok(number) = input.parse::<i64>() else {
        return Ok(input.to_string());
    };
    usize::try_from(number)
        .ok()
        .and_then(|alias| aliases.get(&alias))
        .cloned()
        .ok_or(ChoiceError::UnknownAlias(number))
}

/// Results files in `dir` whose names match the glob `pattern`, sorted.
pub fn matching_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let matcher = glob_regex(pattern)?;
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let entry = entry.with_context(|| format!("read dir {}", dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| matcher.is_match(name));
        if matches {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Translate a file-name glob (`*` and `?` wildcards) to an anchored regex.
fn glob_regex(pattern: &str) -> Result<Regex> {
    let mut expr = String::from("^");
    for ch in pattern.chars() {
        match ch {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            other => expr.push_str(&regex::escape(&other.to_string())),
        }
    }
    expr.push('$');
    Regex::new(&expr).with_context(|| format!("compile file pattern {pattern:?}"))
}

#[cfg(test)]
#[path = "classify_tests.rs"]
mod tests;
