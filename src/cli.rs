//! CLI argument parsing for the benchmark harness.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_CLASSIFIED_FILE: &str = "data/classified_results.json";
pub const DEFAULT_REPEAT_OUTPUT_FILE: &str = "data/repeat_query_output.json";

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "tombench",
    version,
    about = "Theory-of-mind question benchmark for language models",
    after_help = "Commands:\n  run       Sample questions, prompt a model, record raw output\n  classify  Mark raw output rows correct or tag why they are wrong\n  repeat    Re-prompt classified questions several times each\n\nExamples:\n  tombench run -n 50 -m gpt-4 -s 2\n  tombench run -n 10 -m mistral --local --lm-command 'ollama run {model}'\n  tombench classify --data-dir data/raw_output\n  tombench repeat -q 20 -r 10",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Optional JSON config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Run(RunArgs),
    Classify(ClassifyArgs),
    Repeat(RepeatArgs),
}

/// Backend selection shared by commands that call a model.
#[derive(clap::Args, Debug, Clone)]
pub struct BackendArgs {
    /// Model name passed to the backend
    #[arg(short, long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Use the local LM command instead of the OpenAI API
    #[arg(long, alias = "huggingface")]
    pub local: bool,

    /// Local LM command; `{model}` and `{system}` are substituted
    #[arg(long, value_name = "CMD", requires = "local")]
    pub lm_command: Option<String>,

    /// Seconds to sleep after each model call
    #[arg(short, long, default_value_t = 0)]
    pub sleep: u64,

    /// Seed for reproducible sampling
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Parser, Debug)]
#[command(about = "Sample questions, prompt a model, and record raw output")]
pub struct RunArgs {
    /// Number of questions to sample
    #[arg(short, long, default_value_t = 100)]
    pub n_questions: usize,

    #[command(flatten)]
    pub backend: BackendArgs,

    /// Directory with test.trace and test.txt [default: data/questions]
    #[arg(long, value_name = "DIR")]
    pub questions_dir: Option<PathBuf>,

    /// Directory for results files [default: data/raw_output]
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Visited-index file shared across runs
    #[arg(long, value_name = "PATH")]
    pub sample_state: Option<PathBuf>,

    /// Forget previously visited indices before sampling
    #[arg(long, requires = "sample_state")]
    pub reset_sample_state: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Classify why the model missed questions in raw output files")]
pub struct ClassifyArgs {
    /// File-name glob selecting results files in the data directory
    #[arg(long, visible_alias = "fp", default_value = "*.jsonl")]
    pub file_pattern: String,

    /// Directory searched for results files [default: data/raw_output]
    #[arg(short, long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Classified results store
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_CLASSIFIED_FILE)]
    pub output_file: PathBuf,

    /// Revisit rows that already have a classification
    #[arg(long)]
    pub reclassify: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Repeatedly prompt a model with previously classified questions")]
pub struct RepeatArgs {
    /// Classified results store to sample from
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_CLASSIFIED_FILE)]
    pub file: PathBuf,

    /// Repeat output store
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_REPEAT_OUTPUT_FILE)]
    pub output_file: PathBuf,

    /// Number of questions to re-prompt
    #[arg(short = 'q', long, default_value_t = 20)]
    pub n_questions: usize,

    /// Model calls per question
    #[arg(short = 'r', long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub n_reps: u64,

    #[command(flatten)]
    pub backend: BackendArgs,
}
