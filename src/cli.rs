use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shared application context for global flags
#[derive(Clone, Debug)]
pub struct AppContext {
    pub quiet: bool,    // global --quiet
    pub no_color: bool, // global --no-color
    pub config: Option<PathBuf>, // global --config
}

#[derive(Parser)]
#[command(name = "qg")]
#[command(
    about = "Quality gate for machine-generated exam questions: duplicates, source fidelity, difficulty and structure"
)]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress progress bars and non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Config file to use instead of ./quizguard.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate question batches in generation order within one session
    Batch(BatchArgs),

    /// Validate a complete exam for the final accept/regenerate decision
    Exam(ExamArgs),

    /// Strip leaked generation instructions from a text file
    Clean(CleanArgs),

    /// Initialize a quizguard.toml config file
    Init(InitArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    #[default]
    Text,
    /// Pretty JSON of the full result records
    Json,
    /// One table row per question
    Table,
}

#[derive(Debug, Parser)]
pub struct BatchArgs {
    /// Plain-text source document the questions were generated from
    pub source: PathBuf,

    /// JSON files, one batch each, in generation order
    #[arg(required = true)]
    pub batches: Vec<PathBuf>,

    /// Output format
    #[arg(long, default_value = "text", value_enum)]
    pub format: OutputFormat,

    /// Validate every batch even after a stop recommendation
    #[arg(long)]
    pub no_early_stop: bool,

    /// Override the minimum quality score
    #[arg(long)]
    pub min_quality: Option<f64>,

    /// Require answers to appear verbatim in the source
    #[arg(long)]
    pub strict_source: bool,
}

#[derive(Debug, Parser)]
pub struct ExamArgs {
    /// Plain-text source document the exam was generated from
    pub source: PathBuf,

    /// JSON file holding the complete question list
    pub questions: PathBuf,

    /// Output format
    #[arg(long, default_value = "text", value_enum)]
    pub format: OutputFormat,

    /// Override the minimum quality score
    #[arg(long)]
    pub min_quality: Option<f64>,

    /// Require answers to appear verbatim in the source
    #[arg(long)]
    pub strict_source: bool,
}

#[derive(Debug, Parser)]
pub struct CleanArgs {
    /// Text file to clean
    pub input: PathBuf,

    /// Write the cleaned text here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Only list the leaked instructions, do not clean
    #[arg(long)]
    pub check: bool,
}

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Directory to initialize config in
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Parser)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,

    /// Output directory; if omitted and --stdout not set, prints error
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Print completion script to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,
}
