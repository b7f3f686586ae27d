//! Question corpus loading.
//!
//! A corpus is a pair of line-aligned text files:
//!
//! - a trace file (`test.trace`) whose last two comma-separated fields tag each
//!   question with its question type and story type
//! - a scenario file (`test.txt`) holding observation lines, each scenario
//!   terminated by a `<question>?<answer>` line
//!
//! Record *i* of one file describes the same question as record *i* of the
//! other. Nothing in the files links them beyond position, so the loader
//! refuses to assemble files with differing record counts.

mod assemble;
mod scenario;
mod trace;

pub use assemble::assemble;
pub use scenario::{parse_scenarios, Scenario};
pub use trace::{parse_traces, TraceTags};

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the trace (metadata) file inside a questions directory.
pub const TRACE_FILE_NAME: &str = "test.trace";
/// File name of the scenario file inside a questions directory.
pub const SCENARIO_FILE_NAME: &str = "test.txt";

/// Errors raised while loading a question corpus.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("trace line {line}: expected at least two comma-separated fields, got {content:?}")]
    MalformedTrace { line: usize, content: String },

    #[error("scenario line {line}: no answer follows the question in {content:?}")]
    MissingAnswer { line: usize, content: String },

    #[error("trace file has {traces} records but scenario file has {scenarios}")]
    MisalignedInput { traces: usize, scenarios: usize },

    #[error("read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One fully assembled benchmark question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub question_type: String,
    pub story_type: String,
    /// Observations preceding the question, in file order.
    pub actions: Vec<String>,
    /// Question text up to and including the first `?`.
    pub question: String,
    /// Expected one-word answer.
    pub answer: String,
}

/// Locations of the two corpus files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionPaths {
    pub trace: PathBuf,
    pub scenarios: PathBuf,
}

impl QuestionPaths {
    /// Standard file names inside a questions directory.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            trace: dir.join(TRACE_FILE_NAME),
            scenarios: dir.join(SCENARIO_FILE_NAME),
        }
    }
}

/// Read and assemble both corpus files.
pub fn load_corpus(paths: &QuestionPaths) -> Result<Vec<QuestionRecord>, CorpusError> {
    let trace_text = read_text(&paths.trace)?;
    let scenario_text = read_text(&paths.scenarios)?;

    let traces = parse_traces(trace_text.lines())?;
    let scenarios = parse_scenarios(scenario_text.lines())?;
    let records = assemble(traces, scenarios)?;

    tracing::debug!(
        records = records.len(),
        trace = %paths.trace.display(),
        scenarios = %paths.scenarios.display(),
        "corpus loaded"
    );
    Ok(records)
}

fn read_text(path: &Path) -> Result<String, CorpusError> {
    fs::read_to_string(path).map_err(|source| CorpusError::Read {
        path: path.to_path_buf(),
        source,
    })
}
