use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::time::Duration;

mod answer;
mod classify;
mod cli;
mod completion;
mod config;
mod corpus;
mod prompt;
mod record;
mod repeat;
mod run;
mod sampler;
mod store;
mod util;

use classify::{classify_rows, matching_files, ClassifiedRecord};
use cli::{BackendArgs, ClassifyArgs, Command, RepeatArgs, RootArgs, RunArgs};
use completion::{build_client, Backend, CompletionClient};
use config::{
    load_config, process_env, resolve_backend_settings, resolve_output_dir,
    resolve_questions_dir, HarnessConfig,
};
use corpus::QuestionPaths;
use record::{read_rows, results_file_name, JsonlRecorder};
use repeat::{run_repeats, RepeatOptions, RepeatRecord};
use run::{run_benchmark, RunOptions};
use sampler::Sampler;
use store::KeyedStore;

fn main() -> Result<()> {
    let args = RootArgs::parse();
    init_tracing(args.verbose);

    let config = load_config(args.config.as_deref())?;
    match args.command {
        Command::Run(run_args) => cmd_run(run_args, &config),
        Command::Classify(classify_args) => cmd_classify(classify_args, &config),
        Command::Repeat(repeat_args) => cmd_repeat(repeat_args, &config),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();
}

fn completion_client(
    backend_args: &BackendArgs,
    config: &HarnessConfig,
) -> Result<Box<dyn CompletionClient>> {
    let settings = resolve_backend_settings(config, backend_args.lm_command.as_deref(), process_env);
    let backend = Backend::from_local_flag(backend_args.local);
    build_client(backend, &settings).with_context(|| format!("configure {backend} backend"))
}

fn cmd_run(args: RunArgs, config: &HarnessConfig) -> Result<()> {
    let questions_dir = resolve_questions_dir(config, args.questions_dir.as_deref());
    let output_dir = resolve_output_dir(config, args.output_dir.as_deref());
    let client = completion_client(&args.backend, config)?;

    let output_path = output_dir.join(results_file_name(
        &args.backend.model,
        util::epoch_ms()?,
    ));
    let mut recorder = JsonlRecorder::new(&output_path);

    let options = RunOptions {
        n_questions: args.n_questions,
        model: args.backend.model.clone(),
        sleep: Duration::from_secs(args.backend.sleep),
        questions: QuestionPaths::in_dir(&questions_dir),
        seed: args.backend.seed,
        sample_state: args.sample_state.clone(),
        reset_sample_state: args.reset_sample_state,
    };
    let summary = run_benchmark(&options, client.as_ref(), &mut recorder)?;
    tracing::debug!(indices = ?summary.indices, "run complete");

    if !recorder.is_open() {
        println!("No questions answered; no results file written");
        return Ok(());
    }
    println!(
        "Answered {} questions ({} without <answer> tags); wrote {}",
        summary.answered,
        summary.missing_answer_tags,
        recorder.path().display()
    );
    Ok(())
}

fn cmd_classify(args: ClassifyArgs, config: &HarnessConfig) -> Result<()> {
    let data_dir = resolve_output_dir(config, args.data_dir.as_deref());
    let mut store: KeyedStore<ClassifiedRecord> = KeyedStore::open(&args.output_file)?;

    let files = matching_files(&data_dir, &args.file_pattern)?;
    if files.is_empty() {
        println!(
            "No files matching {:?} in {}",
            args.file_pattern,
            data_dir.display()
        );
        return Ok(());
    }

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for path in files {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        println!("Running File {file_name}");

        let rows = read_rows(&path)?;
        let outcome = classify_rows(
            &file_name,
            &rows,
            &mut store,
            args.reclassify,
            &mut input,
            &mut out,
        )?;
        tracing::info!(
            file = %file_name,
            correct = outcome.correct,
            classified = outcome.classified,
            skipped = outcome.skipped,
            "classified results file"
        );
        if !outcome.completed {
            break;
        }
    }

    println!(
        "{} classified rows in {}",
        store.len(),
        store.path().display()
    );
    Ok(())
}

fn cmd_repeat(args: RepeatArgs, config: &HarnessConfig) -> Result<()> {
    let classified: KeyedStore<ClassifiedRecord> = KeyedStore::open(&args.file)?;
    if classified.is_empty() {
        println!("No classified results in {}", args.file.display());
        return Ok(());
    }
    let mut output: KeyedStore<RepeatRecord> = KeyedStore::open(&args.output_file)?;
    let client = completion_client(&args.backend, config)?;

    let options = RepeatOptions {
        n_questions: args.n_questions,
        n_reps: usize::try_from(args.n_reps).context("n_reps out of range")?,
        model: args.backend.model.clone(),
        sleep: Duration::from_secs(args.backend.sleep),
    };
    let mut sampler = Sampler::new(args.backend.seed);
    let processed = run_repeats(
        client.as_ref(),
        &classified,
        &mut output,
        &options,
        sampler.rng_mut(),
    )?;

    println!(
        "Repeated {processed} questions; {} records in {}",
        output.len(),
        output.path().display()
    );
    Ok(())
}
