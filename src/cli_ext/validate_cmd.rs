//! CLI command handlers for batch, exam and clean.
//!
//! Reads source text and question files, runs the validators and renders the
//! verdicts as text, JSON or a table. Returns whether the final verdict passed
//! so `main` can map it to an exit status.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::json;
use tabled::{Table, Tabled};
use tracing::{info, instrument, warn};

use crate::cli::{AppContext, BatchArgs, CleanArgs, ExamArgs, OutputFormat};
use crate::core::analyzer::QuestionValidationResult;
use crate::core::batch::{BatchValidationResult, BatchValidator};
use crate::core::exam::{ExamValidationResult, ExamValidator};
use crate::core::structure::InstructionPatterns;
use crate::infra::config::{self, Config};
use crate::infra::io::{read_questions, read_source};

/// Resolve the effective config: --config file, else ./quizguard.toml, else defaults
pub fn resolve_config(ctx: &AppContext) -> Result<Config>
{
    match &ctx.config
    {
        Some(path) => config::load_config_from(path),
        None => config::load_config(),
    }
}

fn apply_overrides(
    cfg: &mut Config,
    min_quality: Option<f64>,
    strict_source: bool,
)
{
    if let Some(min) = min_quality
    {
        cfg.validation
            .minimum_quality_score = min;
    }
    if strict_source
    {
        cfg.validation
            .strict_source_checking = true;
    }
}

/// One validated batch file, as rendered
#[derive(Serialize)]
struct BatchReport<'a>
{
    file: Utf8PathBuf,
    #[serde(flatten)]
    result: &'a BatchValidationResult,
}

/// Run the `batch` command; returns whether the last batch was valid
#[instrument(skip_all)]
pub fn run_batch(
    args: BatchArgs,
    ctx: &AppContext,
) -> Result<bool>
{
    let mut cfg = resolve_config(ctx)?;
    apply_overrides(&mut cfg, args.min_quality, args.strict_source);

    let source = read_source(&args.source)?;
    let mut session = BatchValidator::new(source.as_str()?, &cfg)?;

    let pb = progress(ctx, args.format, args.batches.len());

    let mut reports: Vec<(Utf8PathBuf, BatchValidationResult)> = Vec::new();
    for path in &args.batches
    {
        let questions = read_questions(path)?;
        let result = session
            .validate_batch(&questions)
            .with_context(|| format!("Failed to validate {}", path.display()))?;

        pb.inc(1);
        pb.set_message(format!("batch {}", result.batch_number));

        let stop = !result.continue_generation;
        reports.push((label(path), result));

        if stop && !args.no_early_stop
        {
            warn!("stop recommended after {}", path.display());
            break;
        }
    }
    pb.finish_and_clear();

    info!(batches = reports.len(), fingerprints = session.fingerprint_count(), "session finished");

    match args.format
    {
        OutputFormat::Json =>
        {
            let out: Vec<BatchReport<'_>> = reports
                .iter()
                .map(|(file, result)| BatchReport { file: file.clone(), result })
                .collect();
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Table =>
        {
            for (file, result) in &reports
            {
                println!("{} {}", heading("Batch", ctx), file);
                println!("{}", question_table(&result.question_results, ctx));
                print_batch_summary(result, ctx);
            }
        }
        OutputFormat::Text =>
        {
            for (file, result) in &reports
            {
                println!("{} {}", heading("Batch", ctx), file);
                print_question_lines(&result.question_results, ctx);
                print_batch_summary(result, ctx);
            }
        }
    }

    Ok(reports
        .last()
        .is_some_and(|(_, r)| r.is_valid))
}

/// Run the `exam` command; returns whether the exam was accepted
#[instrument(skip_all)]
pub fn run_exam(
    args: ExamArgs,
    ctx: &AppContext,
) -> Result<bool>
{
    let mut cfg = resolve_config(ctx)?;
    apply_overrides(&mut cfg, args.min_quality, args.strict_source);

    let source = read_source(&args.source)?;
    let questions = read_questions(&args.questions)?;

    let validator = ExamValidator::new(source.as_str()?, &cfg)?;
    let result = validator
        .validate_exam(&questions)
        .with_context(|| format!("Failed to validate {}", args.questions.display()))?;

    match args.format
    {
        OutputFormat::Json if ctx.quiet => println!("{}", exam_summary_json(&result)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Table =>
        {
            println!("{}", question_table(&result.question_results, ctx));
            print_exam_summary(&result, ctx);
        }
        OutputFormat::Text =>
        {
            print_question_lines(&result.question_results, ctx);
            print_exam_summary(&result, ctx);
        }
    }

    Ok(result.is_valid)
}

/// Run the `clean` command; returns false in --check mode when leaks exist
pub fn run_clean(
    args: CleanArgs,
    ctx: &AppContext,
) -> Result<bool>
{
    let cfg = resolve_config(ctx)?;
    let patterns = InstructionPatterns::with_extra(&cfg.patterns)?;
    let content = read_source(&args.input)?;
    let text = content.as_str()?;

    if args.check
    {
        let leaks = patterns.detect(text);
        for leak in &leaks
        {
            println!("{}\t{}", leak.category, leak.matched);
        }
        if !ctx.quiet
        {
            eprintln!("{} leaked instruction(s) found", leaks.len());
        }
        return Ok(leaks.is_empty());
    }

    let cleaned = patterns.clean(text);
    match args.output
    {
        Some(out) =>
        {
            fs::write(&out, format!("{cleaned}\n"))
                .with_context(|| format!("Failed to write {}", out.display()))?;
            if !ctx.quiet
            {
                eprintln!("Wrote cleaned text to {}", out.display());
            }
        }
        None => println!("{cleaned}"),
    }

    Ok(true)
}

fn progress(
    ctx: &AppContext,
    format: OutputFormat,
    len: usize,
) -> ProgressBar
{
    // Keep JSON output clean for pipelines
    if ctx.quiet || matches!(format, OutputFormat::Json)
    {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

fn label(path: &Path) -> Utf8PathBuf
{
    Utf8PathBuf::from_path_buf(path.to_path_buf())
        .unwrap_or_else(|p| Utf8PathBuf::from(p.to_string_lossy().into_owned()))
}

fn heading(
    text: &str,
    ctx: &AppContext,
) -> String
{
    if ctx.no_color
    {
        text.to_string()
    }
    else
    {
        text.bold()
            .to_string()
    }
}

fn verdict(
    ok: bool,
    ctx: &AppContext,
) -> String
{
    match (ok, ctx.no_color)
    {
        (true, true) => "PASS".to_string(),
        (false, true) => "FAIL".to_string(),
        (true, false) => "PASS"
            .green()
            .bold()
            .to_string(),
        (false, false) => "FAIL"
            .red()
            .bold()
            .to_string(),
    }
}

fn print_question_lines(
    results: &[QuestionValidationResult],
    ctx: &AppContext,
)
{
    for r in results
    {
        println!("  {} {} quality {:.2}", verdict(r.is_valid, ctx), r.question_id, r.quality_score);

        if r.is_duplicate()
        {
            let check = r
                .cross_batch_check
                .as_ref()
                .filter(|c| c.is_duplicate)
                .unwrap_or(&r.duplicate_check);
            println!(
                "      duplicate of {} ({:?}, similarity {:.2}, {:?})",
                check
                    .matched_question_id
                    .as_deref()
                    .unwrap_or("?"),
                check.duplicate_type,
                check.similarity,
                check.recommendation
            );
        }
        for issue in &r.source_issues
        {
            println!("      source: {issue}");
        }
        if let Some(m) = &r.difficulty_mismatch
        {
            println!("      difficulty: {m}");
        }
        for issue in &r.structural_issues
        {
            println!("      structure: {issue}");
        }
    }
}

fn print_batch_summary(
    r: &BatchValidationResult,
    ctx: &AppContext,
)
{
    if ctx.quiet
    {
        println!("{} batch {}", verdict(r.is_valid, ctx), r.batch_number);
        return;
    }

    println!(
        "{} batch {}: average {:.2}, duplicates {} (cross-batch {}), trend {}, total {}",
        verdict(r.is_valid, ctx),
        r.batch_number,
        r.average_quality,
        r.duplicates_found,
        r.cross_batch_duplicates,
        r.quality_trend,
        r.total_validated
    );
    if r.should_retry
    {
        println!("  -> retry this batch");
    }
    if !r.continue_generation
    {
        println!("  -> stop generation");
    }
    for rec in &r.recommendations
    {
        println!("  * {rec}");
    }
}

fn print_exam_summary(
    r: &ExamValidationResult,
    ctx: &AppContext,
)
{
    println!(
        "{} exam: overall {:.2} over {} questions",
        verdict(r.is_valid, ctx),
        r.overall_score,
        r.total_questions
    );
    if ctx.quiet
    {
        return;
    }

    let m = &r.metrics;
    println!(
        "  uniqueness {:.2}  accuracy {:.2}  difficulty {:.2}  coverage {:.2}",
        m.uniqueness, m.accuracy, m.difficulty, m.coverage
    );
    if r.should_regenerate
    {
        println!("  -> regenerate exam");
    }
    for rec in &r.recommendations
    {
        println!("  * {rec}");
    }
}

fn question_table(
    results: &[QuestionValidationResult],
    ctx: &AppContext,
) -> String
{
    #[derive(Tabled)]
    struct Row
    {
        id: String,
        status: String,
        quality: String,
        duplicate: String,
        source: usize,
        difficulty: String,
        structure: usize,
    }

    let rows: Vec<Row> = results
        .iter()
        .map(|r| Row {
            id: r
                .question_id
                .clone(),
            status: verdict(r.is_valid, ctx),
            quality: format!("{:.2}", r.quality_score),
            duplicate: if r.is_duplicate() { "yes".to_string() } else { "-".to_string() },
            source: r
                .source_issues
                .len(),
            difficulty: r
                .difficulty_mismatch
                .as_ref()
                .map_or_else(|| "-".to_string(), |m| format!("{} -> {}", m.declared, m.detected)),
            structure: r
                .structural_issues
                .len(),
        })
        .collect();

    Table::new(rows).to_string()
}

/// One-line summary printed for `--quiet --format json`
fn exam_summary_json(r: &ExamValidationResult) -> serde_json::Value
{
    json!({
        "valid": r.is_valid,
        "overall": r.overall_score,
        "regenerate": r.should_regenerate,
    })
}
