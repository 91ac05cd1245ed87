//! Whole-exam metrics, weighting and recommendations.

use quizguard::core::{Difficulty, ExamValidator};
use quizguard::{Config, ValidationError};

mod util;
use util::{PHOTOSYNTHESIS, approx, config_without_source, short};

fn water_exam() -> Vec<quizguard::Question>
{
    vec![
        short("w1", "What causes water to evaporate from oceans?", "heat"),
        short("w2", "What do clouds form from when water vapor condenses?", "droplets"),
        short("w3", "What process lets plants release water vapor?", "transpiration"),
        short("w4", "What slowly flows through underground aquifers?", "groundwater"),
        short("w5", "What name is given to water falling from clouds?", "precipitation"),
    ]
}

#[test]
fn positional_duplicate_lowers_uniqueness_only()
{
    // Given: five distinct questions and a late copy of the first
    let mut questions = water_exam();
    let mut copy = questions[0].clone();
    copy.id = "w6".into();
    questions.push(copy);

    let validator = ExamValidator::new("", &config_without_source()).expect("validator");

    // When
    let r = validator
        .validate_exam(&questions)
        .expect("exam");

    // Then
    assert_eq!(r.total_questions, 6);
    assert_eq!(r.duplicates_found, 1);
    assert!(r.question_results[5].is_duplicate());
    assert!(!r.question_results[0].is_duplicate());

    assert!(approx(r.metrics.uniqueness, 5.0 / 6.0));
    assert!(approx(r.metrics.accuracy, 1.0));
    assert!(approx(r.metrics.difficulty, 1.0));
    assert!(approx(r.metrics.coverage, 1.0));
    assert!(approx(r.overall_score, 0.3 * 5.0 / 6.0 + 0.7));

    assert!(r.is_valid);
    assert!(!r.should_regenerate);
    assert!(r.recommendations.is_empty());
}

#[test]
fn repeated_questions_trigger_duplicate_recommendation()
{
    // Given: three distinct questions followed by copies of the first two
    let mut questions = water_exam();
    questions.truncate(3);
    for (id, src) in [("w4", 0), ("w5", 1)]
    {
        let mut copy = questions[src].clone();
        copy.id = id.into();
        questions.push(copy);
    }

    let validator = ExamValidator::new("", &config_without_source()).expect("validator");

    // When
    let r = validator
        .validate_exam(&questions)
        .expect("exam");

    // Then
    assert_eq!(r.duplicates_found, 2);
    assert!(approx(r.metrics.uniqueness, 0.6));
    assert!(approx(r.overall_score, 0.3 * 0.6 + 0.7));
    assert!(
        r.recommendations
            .iter()
            .any(|s| s.contains("Reduce duplicate questions"))
    );
}

#[test]
fn ungrounded_exam_is_sent_back()
{
    let validator = ExamValidator::new(PHOTOSYNTHESIS, &Config::default()).expect("validator");

    let r = validator
        .validate_exam(&water_exam())
        .expect("exam");

    assert!(approx(r.metrics.accuracy, 0.0));
    assert!(approx(r.overall_score, 0.6));
    assert!(!r.is_valid);
    assert!(r.should_regenerate);
    assert!(
        r.recommendations
            .iter()
            .any(|s| s.contains("source material"))
    );
}

#[test]
fn narrow_exam_gets_coverage_recommendation()
{
    let texts = [
        "What causes water to evaporate from oceans?",
        "What causes water to freeze into ice?",
        "What causes water pollution in rivers?",
        "What causes water tables to drop during droughts?",
        "What causes water pressure to rise with depth?",
        "What causes water hammer in household pipes?",
    ];
    let questions: Vec<_> = texts
        .iter()
        .enumerate()
        .map(|(i, t)| short(&format!("c{i}"), t, "answer"))
        .collect();

    let validator = ExamValidator::new("", &config_without_source()).expect("validator");
    let r = validator
        .validate_exam(&questions)
        .expect("exam");

    // One leading concept against an expected two
    assert!(approx(r.metrics.coverage, 0.5));
    assert_eq!(r.duplicates_found, 0);
    assert!(r.is_valid);
    assert!(
        r.recommendations
            .iter()
            .any(|s| s.contains("broader range"))
    );
}

#[test]
fn declared_difficulty_drift_is_reported()
{
    let mut questions = water_exam();
    questions[1].difficulty = Difficulty::VeryHard;
    questions[2].difficulty = Difficulty::Hard;
    questions.truncate(4);

    let validator = ExamValidator::new("", &config_without_source()).expect("validator");
    let r = validator
        .validate_exam(&questions)
        .expect("exam");

    assert!(approx(r.metrics.difficulty, 0.5));
    assert!(approx(r.overall_score, 0.9));
    assert!(
        r.recommendations
            .iter()
            .any(|s| s.contains("difficulty"))
    );
    assert!(r.question_results[1].difficulty_mismatch.is_some());
}

#[test]
fn exam_validation_is_repeatable()
{
    let validator = ExamValidator::new(PHOTOSYNTHESIS, &Config::default()).expect("validator");
    let questions = water_exam();

    let first = validator
        .validate_exam(&questions)
        .expect("first");
    let second = validator
        .validate_exam(&questions)
        .expect("second");

    assert_eq!(first, second);
}

#[test]
fn empty_exam_is_rejected()
{
    let validator = ExamValidator::new(PHOTOSYNTHESIS, &Config::default()).expect("validator");

    assert_eq!(
        validator
            .validate_exam(&[])
            .unwrap_err(),
        ValidationError::EmptyExam
    );
}
