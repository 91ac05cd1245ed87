use std::process::ExitCode;

use clap::Parser;
use quizguard::cli::{AppContext, Cli, Commands};
use quizguard::cli_ext::validate_cmd;
use quizguard::infra::io::QuestionFileError;
use tracing_subscriber::EnvFilter;

/// Exit status when validation ran but the verdict failed
const EXIT_INVALID: u8 = 2;

fn main() -> ExitCode {
    // Logs go to stderr; RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Build a context once, pass everywhere
    let ctx = AppContext {
        quiet: cli.quiet,
        no_color: cli.no_color,
        config: cli.config,
    };

    let outcome = match cli.command {
        Commands::Batch(args) => validate_cmd::run_batch(args, &ctx),
        Commands::Exam(args) => validate_cmd::run_exam(args, &ctx),
        Commands::Clean(args) => validate_cmd::run_clean(args, &ctx),
        Commands::Init(args) => quizguard::infra::config::init(args, &ctx).map(|_| true),
        Commands::Completions(args) => quizguard::completion::run(args, &ctx).map(|_| true),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_INVALID),
        Err(err) => {
            match err.downcast::<QuestionFileError>() {
                Ok(diag) => eprintln!("{:?}", miette::Report::new(diag)),
                Err(other) => eprintln!("Error: {other:?}"),
            }
            ExitCode::FAILURE
        }
    }
}
