use clap::Parser;
use quizguard::cli::{BatchArgs, Cli, Commands, ExamArgs, OutputFormat};

#[test]
fn batch_flags_parse()
{
    // Given
    let argv = vec![
        "qg",
        "--quiet",
        "batch",
        "notes.txt",
        "b1.json",
        "b2.json",
        "--format",
        "json",
        "--no-early-stop",
        "--min-quality",
        "0.8",
    ];

    // When
    let cli = Cli::parse_from(argv);

    // Then
    assert!(cli.quiet);
    match cli.command
    {
        Commands::Batch(BatchArgs { source, batches, format, no_early_stop, min_quality, strict_source }) =>
        {
            assert!(
                source
                    .to_string_lossy()
                    .ends_with("notes.txt")
            );
            assert_eq!(batches.len(), 2);
            assert!(matches!(format, OutputFormat::Json));
            assert!(no_early_stop);
            assert_eq!(min_quality, Some(0.8));
            assert!(!strict_source);
        }
        _ => panic!("expected Batch command"),
    }
}

#[test]
fn exam_defaults_to_text_output()
{
    let cli = Cli::parse_from(["qg", "exam", "notes.txt", "exam.json", "--strict-source"]);

    match cli.command
    {
        Commands::Exam(ExamArgs { format, strict_source, min_quality, .. }) =>
        {
            assert!(matches!(format, OutputFormat::Text));
            assert!(strict_source);
            assert!(min_quality.is_none());
        }
        _ => panic!("expected Exam command"),
    }
}

#[test]
fn batch_requires_at_least_one_file()
{
    assert!(Cli::try_parse_from(["qg", "batch", "notes.txt"]).is_err());
}
