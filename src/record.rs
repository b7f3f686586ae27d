//! Raw run output.
//!
//! Each answered question becomes one JSON object appended to
//! `<output-dir>/results-<model>-<epoch_ms>.jsonl`:
//!
//! ```jsonl
//! {"index":12,"model":"gpt-4","actions":"...","question":"...","answer":"hall",...}
//! ```
//!
//! Rows are flushed as they are written so an aborted run keeps every row
//! finished before the failure.
use crate::corpus::QuestionRecord;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// One answered question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawOutputRow {
    /// Position of the question in the corpus.
    pub index: usize,
    pub model: String,
    /// Actions joined with newlines.
    pub actions: String,
    pub question: String,
    pub answer: String,
    pub question_type: String,
    pub story_type: String,
    pub prompt: String,
    pub raw_response: String,
    /// Text inside `<answer>` tags, empty when the response had none.
    pub parsed_answer: String,
}

impl RawOutputRow {
    pub fn new(
        index: usize,
        model: &str,
        record: &QuestionRecord,
        prompt: String,
        raw_response: String,
        parsed_answer: String,
    ) -> Self {
        Self {
            index,
            model: model.to_string(),
            actions: record.actions.join("\n"),
            question: record.question.clone(),
            answer: record.answer.clone(),
            question_type: record.question_type.clone(),
            story_type: record.story_type.clone(),
            prompt,
            raw_response,
            parsed_answer,
        }
    }

    /// Rebuild the question this row answered.
    pub fn to_question(&self) -> QuestionRecord {
        let actions = if self.actions.is_empty() {
            Vec::new()
        } else {
            self.actions.split('\n').map(str::to_string).collect()
        };
        QuestionRecord {
            question_type: self.question_type.clone(),
            story_type: self.story_type.clone(),
            actions,
            question: self.question.clone(),
            answer: self.answer.clone(),
        }
    }
}

/// Append-only sink for run results.
pub trait ResultRecorder {
    fn append_row(&mut self, row: &RawOutputRow) -> Result<()>;
}

/// JSON Lines file recorder.
///
/// The file is opened on the first appended row, so a run that fails before
/// answering anything leaves nothing on disk.
pub struct JsonlRecorder {
    path: PathBuf,
    file: Option<File>,
}

impl JsonlRecorder {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            file: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True once at least one row reached the file.
    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    fn open_file(&mut self) -> Result<&mut File> {
        if self.file.is_none() {
            let path = &self.path;
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open {}", path.display()))?;
            self.file = Some(file);
        }
        self.file
            .as_mut()
            .with_context(|| format!("open {}", self.path.display()))
    }
}

impl ResultRecorder for JsonlRecorder {
    fn append_row(&mut self, row: &RawOutputRow) -> Result<()> {
        let line = serde_json::to_string(row).context("serialize result row")?;
        let path = self.path.clone();
        let file = self.open_file()?;
        writeln!(file, "{line}").with_context(|| format!("append {}", path.display()))?;
        file.flush()
            .with_context(|| format!("flush {}", path.display()))
    }
}

/// Read every row of a results file, skipping blank lines.
pub fn read_rows(path: &Path) -> Result<Vec<RawOutputRow>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut rows = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("read {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let row = serde_json::from_str(&line)
            .with_context(|| format!("parse {} line {}", path.display(), idx + 1))?;
        rows.push(row);
    }
    Ok(rows)
}

/// File name for a new results file.
pub fn results_file_name(model: &str, epoch_ms: u128) -> String {
    let model: String = model
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | ' ' => '_',
            other => other,
        })
        .collect();
    format!("results-{model}-{epoch_ms}.jsonl")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(actions: &[&str]) -> QuestionRecord {
        QuestionRecord {
            question_type: "first_order".to_string(),
            story_type: "tom".to_string(),
            actions: actions.iter().map(|a| a.to_string()).collect(),
            question: "Where is Mary?".to_string(),
            answer: "hall".to_string(),
        }
    }

    fn row(index: usize) -> RawOutputRow {
        RawOutputRow::new(
            index,
            "gpt-4",
            &question(&["Mary entered the hall.", "John left."]),
            "prompt".to_string(),
            "<answer>hall</answer>".to_string(),
            "hall".to_string(),
        )
    }

    #[test]
    fn appends_rows_and_reads_them_back() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("out/results.jsonl");

        let mut recorder = JsonlRecorder::new(&path);
        recorder.append_row(&row(3)).unwrap();
        recorder.append_row(&row(1)).unwrap();
        drop(recorder);

        let mut recorder = JsonlRecorder::new(&path);
        recorder.append_row(&row(4)).unwrap();

        let rows = read_rows(&path).unwrap();
        let indices: Vec<usize> = rows.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![3, 1, 4]);
        assert_eq!(rows[0].actions, "Mary entered the hall.\nJohn left.");
    }

    #[test]
    fn recorder_touches_nothing_until_first_row() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("out/results.jsonl");

        let mut recorder = JsonlRecorder::new(&path);
        assert!(!recorder.is_open());
        assert!(!dir.path().join("out").exists());

        recorder.append_row(&row(0)).unwrap();
        assert!(recorder.is_open());
        assert_eq!(read_rows(&path).unwrap().len(), 1);
    }

    #[test]
    fn row_rebuilds_its_question() {
        let original = question(&["a.", "b."]);
        let row = RawOutputRow::new(0, "m", &original, String::new(), String::new(), String::new());
        assert_eq!(row.to_question(), original);

        let empty = question(&[]);
        let row = RawOutputRow::new(0, "m", &empty, String::new(), String::new(), String::new());
        assert_eq!(row.to_question(), empty);
    }

    #[test]
    fn read_rows_reports_bad_line() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("bad.jsonl");
        fs::write(&path, "\n{oops}\n").unwrap();
        let err = read_rows(&path).unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn file_name_sanitizes_model() {
        assert_eq!(
            results_file_name("mistralai/Mistral-7B", 17),
            "results-mistralai_Mistral-7B-17.jsonl"
        );
    }
}
