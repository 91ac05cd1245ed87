//! Shared test utilities for integration tests
//!
//! Question builders and on-disk fixtures used across the test files.

#![allow(dead_code)]

use assert_fs::prelude::*;
use quizguard::core::{Answer, Difficulty, Question, QuestionType};
use quizguard::{Config, ValidationConfig};

/// Source text the photosynthesis questions are grounded in
pub const PHOTOSYNTHESIS: &str = "Photosynthesis converts light energy into chemical energy in plants.";

/// Easy short-answer question whose text only carries the "what" cue
pub fn short(
    id: &str,
    text: &str,
    answer: &str,
) -> Question
{
    Question::new(id, QuestionType::ShortAnswer, Difficulty::Easy, text, Answer::Single(answer.into()))
}

/// Multiple-choice question declared at the level the classifier detects for it
pub fn multiple_choice(
    id: &str,
    text: &str,
    options: &[&str],
    answer: &str,
) -> Question
{
    Question::new(id, QuestionType::MultipleChoice, Difficulty::Easy, text, Answer::Single(answer.into()))
        .with_options(options.iter().copied())
}

/// Defaults with source checking switched off, so scores depend on structure only
pub fn config_without_source() -> Config
{
    Config {
        validation: ValidationConfig { source_verification_enabled: false, ..Default::default() },
        ..Default::default()
    }
}

/// Write a JSON question list into the temp dir and return it
pub fn write_questions(
    dir: &assert_fs::TempDir,
    name: &str,
    questions: &[Question],
) -> assert_fs::fixture::ChildPath
{
    let child = dir.child(name);
    let body = serde_json::to_string_pretty(questions).expect("serialize questions");
    child
        .write_str(&body)
        .expect("write questions");
    child
}

/// Temp dir holding `source.txt` with the photosynthesis text
pub fn make_source_fixture() -> assert_fs::TempDir
{
    let tmp = assert_fs::TempDir::new().expect("tempdir");
    tmp.child("source.txt")
        .write_str(PHOTOSYNTHESIS)
        .expect("write source");
    tmp
}

pub fn approx(
    a: f64,
    b: f64,
) -> bool
{
    (a - b).abs() < 1e-9
}
