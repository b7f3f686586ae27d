//! Repeated sampling of classified questions.
//!
//! Picks a balanced set of previously classified questions, re-renders each
//! prompt exactly as the original run did, and asks the model `n_reps`
//! times to measure how stable its answer is.
use crate::answer::{answers_match, extract_answer};
use crate::classify::ClassifiedRecord;
use crate::completion::CompletionClient;
use crate::prompt::build_prompt;
use crate::store::KeyedStore;
use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Classifications excluded from repeat sampling.
pub const SKIP_REASONS: &[&str] = &["answer key is wrong"];

/// One repeated answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepeatAnswer {
    pub answer: String,
    pub response: String,
    pub correct: bool,
}

/// All repetitions for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepeatRecord {
    pub originally_correct: bool,
    pub answers: Vec<RepeatAnswer>,
    /// Number of distinct answers given.
    pub n_answers: usize,
    pub pct_right: f64,
    pub model: String,
}

/// Inputs for a repeat session.
#[derive(Debug, Clone)]
pub struct RepeatOptions {
    pub n_questions: usize,
    pub n_reps: usize,
    pub model: String,
    pub sleep: Duration,
}

/// Choose up to `max_keys` keys: half (rounded down) from correct records and
/// the rest from incorrect records not in [`SKIP_REASONS`]. Each pool is
/// shuffled first.
pub fn select_keys<R>(
    records: &BTreeMap<String, ClassifiedRecord>,
    max_keys: usize,
    rng: &mut R,
) -> Vec<String>
where
    R: Rng + ?Sized,
{
    let mut right: Vec<&String> = records
        .iter()
        .filter(|(_, record)| record.correct)
        .map(|(key, _)| key)
        .collect();
    let mut wrong: Vec<&String> = records
        .iter()
        .filter(|(_, record)| {
            !record.correct && !SKIP_REASONS.contains(&record.classification.as_str())
        })
        .map(|(key, _)| key)
        .collect();
    right.shuffle(rng);
    wrong.shuffle(rng);

    let n_right = max_keys / 2;
    let n_wrong = max_keys - n_right;

    right
        .into_iter()
        .take(n_right)
        .chain(wrong.into_iter().take(n_wrong))
        .cloned()
        .collect()
}

/// Ask the model `n_reps` times about one classified record.
pub fn repeat_question(
    client: &dyn CompletionClient,
    record: &ClassifiedRecord,
    options: &RepeatOptions,
) -> Result<RepeatRecord> {
    let question = record.row.to_question();
    let prompt = build_prompt(&question);
    if prompt != record.row.prompt {
        tracing::warn!(
            index = record.row.index,
            "re-rendered prompt differs from the recorded prompt"
        );
    }

    let mut answers = Vec::with_capacity(options.n_reps);
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for rep in 0..options.n_reps {
        let response = client
            .complete(&options.model, &prompt)
            .with_context(|| format!("repeat {} of question {}", rep + 1, record.row.index))?;
        let answer = extract_answer(&response).unwrap_or_default().to_lowercase();
        let correct = answers_match(&question.answer, &answer);
        println!("{answer} {correct}");

        *counts.entry(answer.clone()).or_default() += 1;
        answers.push(RepeatAnswer {
            answer,
            response,
            correct,
        });

        if !options.sleep.is_zero() {
            std::thread::sleep(options.sleep);
        }
    }
    println!("{counts:?}");

    let n_right = answers.iter().filter(|a| a.correct).count();
    let pct_right = if answers.is_empty() {
        0.0
    } else {
        n_right as f64 / answers.len() as f64
    };

    Ok(RepeatRecord {
        originally_correct: record.correct,
        answers,
        n_answers: counts.len(),
        pct_right,
        model: options.model.clone(),
    })
}

/// Run repeat sampling over selected keys, skipping keys already in `output`.
///
/// Returns the number of newly processed keys.
pub fn run_repeats<R>(
    client: &dyn CompletionClient,
    classified: &KeyedStore<ClassifiedRecord>,
    output: &mut KeyedStore<RepeatRecord>,
    options: &RepeatOptions,
    rng: &mut R,
) -> Result<usize>
where
    R: Rng + ?Sized,
{
    let keys = select_keys(classified.records(), options.n_questions, rng);
    tracing::info!(
        selected = keys.len(),
        requested = options.n_questions,
        "selected questions for repeat sampling"
    );

    let mut processed = 0;
    for key in keys {
        if output.contains_key(&key) {
            tracing::debug!(key = %key, "already repeated; skipping");
            continue;
        }
        let Some(record) = classified.get(&key) else {
            continue;
        };
        println!("Repeating {key}");
        let result = repeat_question(client, record, options)?;
        output.upsert(&key, result)?;
        processed += 1;
    }
    Ok(processed)
}

#[cfg(test)]
#[path = "repeat_tests.rs"]
mod tests;
