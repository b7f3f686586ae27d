//! The benchmark run loop.
//!
//! Loads the corpus, draws every index up front (so exhaustion fails before
//! any model call), then prompts the model once per drawn question and
//! appends each result as it arrives.
use crate::answer::extract_answer;
use crate::completion::CompletionClient;
use crate::corpus::{load_corpus, QuestionPaths};
use crate::prompt::build_prompt;
use crate::record::{RawOutputRow, ResultRecorder};
use crate::sampler::{SampleState, Sampler};
use crate::util::{read_json, write_json};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Inputs for one benchmark run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub n_questions: usize,
    pub model: String,
    pub sleep: Duration,
    pub questions: QuestionPaths,
    pub seed: Option<u64>,
    /// Persist visited indices here so later runs skip them.
    pub sample_state: Option<PathBuf>,
    /// Clear the persisted state before drawing.
    pub reset_sample_state: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub answered: usize,
    pub missing_answer_tags: usize,
    pub indices: Vec<usize>,
}

pub fn run_benchmark(
    options: &RunOptions,
    client: &dyn CompletionClient,
    recorder: &mut dyn ResultRecorder,
) -> Result<RunSummary> {
    let questions = load_corpus(&options.questions).context("load question corpus")?;
    let mut state = load_sample_state(options.sample_state.as_deref())?;
    if options.reset_sample_state && !state.is_empty() {
        tracing::info!(cleared = state.len(), "resetting sample state");
        state.clear();
    }

    // Draw against a scratch copy; the persisted state only records questions
    // that were actually answered.
    let mut sampler = Sampler::new(options.seed);
    let indices = sampler
        .sample(options.n_questions, questions.len(), &mut state.clone())
        .context("sample questions")?;
    tracing::info!(
        total = questions.len(),
        drawn = indices.len(),
        previously_visited = state.len(),
        "sampled questions"
    );

    let mut summary = RunSummary::default();
    for (position, &index) in indices.iter().enumerate() {
        println!(
            "Selecting Question: {} of {}",
            position + 1,
            options.n_questions
        );
        println!("Chose Random Index: {index}");

        let question = &questions[index];
        let prompt = build_prompt(question);
        println!("{prompt}");

        let raw_response = client
            .complete(&options.model, &prompt)
            .with_context(|| format!("complete question {index} with {}", options.model))?;
        println!("Model Response: {raw_response}");

        let parsed_answer = match extract_answer(&raw_response) {
            Some(answer) => answer.to_string(),
            None => {
                tracing::warn!(index, raw_response = %raw_response, "response has no <answer> tag");
                summary.missing_answer_tags += 1;
                String::new()
            }
        };
        println!("Model Answer: {parsed_answer}");

        let row = RawOutputRow::new(
            index,
            &options.model,
            question,
            prompt,
            raw_response,
            parsed_answer,
        );
        recorder.append_row(&row)?;

        state.mark(index);
        if let Some(path) = &options.sample_state {
            write_json(path, &state)?;
        }
        summary.answered += 1;
        summary.indices.push(index);

        if !options.sleep.is_zero() {
            std::thread::sleep(options.sleep);
        }
    }

    Ok(summary)
}

fn load_sample_state(path: Option<&Path>) -> Result<SampleState> {
    match path {
        Some(path) if path.exists() => {
            read_json(path).with_context(|| format!("load sample state {}", path.display()))
        }
        _ => Ok(SampleState::new()),
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
