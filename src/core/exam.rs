//! Whole-exam validation for the final accept/regenerate decision.
//!
//! Independent of any batch session: duplicates are found by position within
//! the supplied list only.

use std::collections::HashSet;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::core::analyzer::{QuestionAnalyzer, QuestionValidationResult};
use crate::core::error::ValidationError;
use crate::core::fingerprint::check_within_batch;
use crate::core::model::Question;
use crate::infra::config::Config;

/// Leading tokens that identify the concept a question covers
const CONCEPT_TOKENS: usize = 3;

/// Questions expected per distinct concept
const QUESTIONS_PER_CONCEPT: usize = 3;

/// Exam-level quality metrics, each in 0..=1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExamMetrics
{
    pub uniqueness: f64,
    pub accuracy: f64,
    pub difficulty: f64,
    pub coverage: f64,
}

/// Verdict for a complete exam
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamValidationResult
{
    pub is_valid: bool,
    pub overall_score: f64,
    pub metrics: ExamMetrics,
    pub question_results: Vec<QuestionValidationResult>,
    pub total_questions: usize,
    pub duplicates_found: usize,
    /// True when the caller should regenerate the exam
    pub should_regenerate: bool,
    pub recommendations: Vec<String>,
}

#[derive(Debug)]
pub struct ExamValidator
{
    analyzer: QuestionAnalyzer,
}

impl ExamValidator
{
    pub fn new(
        source_text: &str,
        config: &Config,
    ) -> Result<Self, ValidationError>
    {
        Ok(Self { analyzer: QuestionAnalyzer::new(source_text, config)? })
    }

    /// Validate the full question list at once
    #[instrument(skip_all, fields(size = questions.len()))]
    pub fn validate_exam(
        &self,
        questions: &[Question],
    ) -> Result<ExamValidationResult, ValidationError>
    {
        if questions.is_empty()
        {
            return Err(ValidationError::EmptyExam);
        }

        let analyzer = &self.analyzer;
        let thresholds = analyzer.thresholds();

        // Order-independent checks fan out; duplicate scanning stays positional
        let findings: Vec<_> = questions
            .par_iter()
            .map(|q| analyzer.inspect(q))
            .collect();

        let results: Vec<QuestionValidationResult> = questions
            .iter()
            .zip(findings)
            .enumerate()
            .map(|(i, (q, found))| {
                let dup = check_within_batch(analyzer.engine(), q, &questions[..i], thresholds);
                analyzer.assemble(q, dup, None, found)
            })
            .collect();

        let n = results.len() as f64;
        let fraction = |pred: &dyn Fn(&QuestionValidationResult) -> bool| {
            results
                .iter()
                .filter(|r| pred(r))
                .count() as f64
                / n
        };

        let duplicates_found = results
            .iter()
            .filter(|r| r.is_duplicate())
            .count();

        let metrics = ExamMetrics {
            uniqueness: 1.0 - fraction(&|r| r.is_duplicate()),
            accuracy: 1.0 - fraction(&|r| r.has_source_issues()),
            difficulty: 1.0 - fraction(&|r| r.difficulty_mismatch.is_some()),
            coverage: self.coverage(questions),
        };

        let w = &analyzer
            .scoring()
            .exam_weights;
        let overall_score = (metrics.uniqueness * w.uniqueness
            + metrics.accuracy * w.accuracy
            + metrics.difficulty * w.difficulty
            + metrics.coverage * w.coverage)
            .clamp(0.0, 1.0);

        let is_valid = overall_score
            >= analyzer
                .validation()
                .minimum_quality_score;
        let recommendations = self.recommendations(&metrics);

        info!(overall = overall_score, valid = is_valid, duplicates = duplicates_found, "exam validated");

        Ok(ExamValidationResult {
            is_valid,
            overall_score,
            metrics,
            question_results: results,
            total_questions: questions.len(),
            duplicates_found,
            should_regenerate: !is_valid,
            recommendations,
        })
    }

    /// Distinct leading-token concepts relative to max(1, n / 3), capped at 1
    fn coverage(
        &self,
        questions: &[Question],
    ) -> f64
    {
        let normalizer = self
            .analyzer
            .engine()
            .normalizer();

        let concepts: HashSet<String> = questions
            .iter()
            .map(|q| {
                normalizer
                    .tokens(&q.text)
                    .iter()
                    .take(CONCEPT_TOKENS)
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect();

        let expected = (questions.len() / QUESTIONS_PER_CONCEPT).max(1);

        (concepts.len() as f64 / expected as f64).min(1.0)
    }

    fn recommendations(
        &self,
        m: &ExamMetrics,
    ) -> Vec<String>
    {
        let floors = &self
            .analyzer
            .scoring()
            .recommendation_floors;
        let mut out = Vec::new();

        if m.uniqueness < floors.uniqueness
        {
            out.push("Reduce duplicate questions by varying topics and phrasing".to_string());
        }
        if m.accuracy < floors.accuracy
        {
            out.push("Ground questions more closely in the source material".to_string());
        }
        if m.difficulty < floors.difficulty
        {
            out.push("Align declared difficulty levels with question complexity".to_string());
        }
        if m.coverage < floors.coverage
        {
            out.push("Cover a broader range of concepts from the source".to_string());
        }

        out
    }
}
