//! Per-question checks shared by the batch and exam validators.

use serde::{Deserialize, Serialize};

use crate::core::difficulty::{DifficultyClassifier, DifficultyMismatch};
use crate::core::error::ValidationError;
use crate::core::fingerprint::{DuplicateCheckResult, DuplicateThresholds};
use crate::core::model::Question;
use crate::core::similarity::SimilarityEngine;
use crate::core::source::SourceChecker;
use crate::core::structure::{InstructionLeak, InstructionPatterns, StructuralChecker};
use crate::infra::config::{Config, Penalties, ScoringConfig, ValidationConfig};

/// Verdict for one question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionValidationResult
{
    pub question_id: String,
    /// Not a duplicate and quality at or above the configured minimum
    pub is_valid: bool,
    /// Duplicate check against earlier questions of the same batch or exam
    pub duplicate_check: DuplicateCheckResult,
    /// Cross-batch check against the session fingerprint store, batch mode only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cross_batch_check: Option<DuplicateCheckResult>,
    pub source_issues: Vec<String>,
    pub difficulty_mismatch: Option<DifficultyMismatch>,
    pub structural_issues: Vec<String>,
    pub instruction_leaks: Vec<InstructionLeak>,
    pub quality_score: f64,
}

impl QuestionValidationResult
{
    /// Flagged by either duplicate check
    pub fn is_duplicate(&self) -> bool
    {
        self.duplicate_check
            .is_duplicate
            || self
                .cross_batch_check
                .as_ref()
                .is_some_and(|c| c.is_duplicate)
    }

    pub fn is_cross_batch_duplicate(&self) -> bool
    {
        self.cross_batch_check
            .as_ref()
            .is_some_and(|c| c.is_duplicate)
    }

    pub fn has_source_issues(&self) -> bool
    {
        !self
            .source_issues
            .is_empty()
    }
}

/// Checks that do not depend on other questions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndependentFindings
{
    pub source_issues: Vec<String>,
    pub difficulty_mismatch: Option<DifficultyMismatch>,
    pub structural_issues: Vec<String>,
    pub instruction_leaks: Vec<InstructionLeak>,
}

/// Quality score for a question, clamped to 0..=1
pub fn quality_score(
    penalties: &Penalties,
    duplicate: bool,
    findings: &IndependentFindings,
) -> f64
{
    let mut score = 1.0;

    if duplicate
    {
        score -= penalties.duplicate;
    }
    if !findings
        .source_issues
        .is_empty()
    {
        score -= penalties.source;
    }
    if findings
        .difficulty_mismatch
        .is_some()
    {
        score -= penalties.difficulty;
    }
    score -= penalties.structural
        * findings
            .structural_issues
            .len() as f64;

    f64::clamp(score, 0.0, 1.0)
}

/// Source, difficulty and structure checks bound to one source document
#[derive(Debug)]
pub struct QuestionAnalyzer
{
    engine: SimilarityEngine,
    source: SourceChecker,
    difficulty: DifficultyClassifier,
    structure: StructuralChecker,
    validation: ValidationConfig,
    scoring: ScoringConfig,
}

impl QuestionAnalyzer
{
    pub fn new(
        source_text: &str,
        config: &Config,
    ) -> Result<Self, ValidationError>
    {
        config
            .validation
            .validate()?;
        config
            .scoring
            .validate()?;

        let engine = SimilarityEngine::default();
        let scoring = config
            .scoring
            .clone();

        let source = SourceChecker::new(
            engine.normalizer(),
            source_text,
            scoring.source_overlap_floor,
            scoring.answer_prefix_chars,
            config
                .validation
                .strict_source_checking,
        );
        let difficulty = DifficultyClassifier::new(
            scoring
                .difficulty
                .clone(),
        )?;
        let patterns = InstructionPatterns::with_extra(&config.patterns)?;
        let structure = StructuralChecker::new(patterns, &scoring);

        Ok(Self {
            engine,
            source,
            difficulty,
            structure,
            validation: config
                .validation
                .clone(),
            scoring,
        })
    }

    pub fn engine(&self) -> &SimilarityEngine
    {
        &self.engine
    }

    pub fn validation(&self) -> &ValidationConfig
    {
        &self.validation
    }

    pub fn scoring(&self) -> &ScoringConfig
    {
        &self.scoring
    }

    pub fn thresholds(&self) -> DuplicateThresholds
    {
        DuplicateThresholds {
            duplicate: self
                .validation
                .duplicate_threshold,
            concept: self
                .validation
                .concept_similarity_threshold,
            strict: self
                .validation
                .strict_duplicate_threshold,
            exact_cutoff: self
                .scoring
                .exact_duplicate_cutoff,
        }
    }

    /// Run the order-independent checks for one question
    pub fn inspect(
        &self,
        question: &Question,
    ) -> IndependentFindings
    {
        let source_issues = if self
            .validation
            .source_verification_enabled
        {
            self.source
                .check(self.engine.normalizer(), question)
        }
        else
        {
            Vec::new()
        };

        let difficulty_mismatch = if self
            .validation
            .difficulty_validation_enabled
        {
            self.difficulty
                .mismatch(question)
        }
        else
        {
            None
        };

        let structural = self
            .structure
            .check(question);

        IndependentFindings {
            source_issues,
            difficulty_mismatch,
            structural_issues: structural.issues,
            instruction_leaks: structural.leaks,
        }
    }

    /// Combine duplicate verdicts with independent findings into a result
    pub fn assemble(
        &self,
        question: &Question,
        duplicate_check: DuplicateCheckResult,
        cross_batch_check: Option<DuplicateCheckResult>,
        findings: IndependentFindings,
    ) -> QuestionValidationResult
    {
        let duplicate = duplicate_check.is_duplicate
            || cross_batch_check
                .as_ref()
                .is_some_and(|c| c.is_duplicate);
        let quality = quality_score(&self.scoring.penalties, duplicate, &findings);

        QuestionValidationResult {
            question_id: question
                .id
                .clone(),
            is_valid: !duplicate
                && quality
                    >= self
                        .validation
                        .minimum_quality_score,
            duplicate_check,
            cross_batch_check,
            source_issues: findings.source_issues,
            difficulty_mismatch: findings.difficulty_mismatch,
            structural_issues: findings.structural_issues,
            instruction_leaks: findings.instruction_leaks,
            quality_score: quality,
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::core::model::Difficulty;

    #[test]
    fn test_quality_score_penalties_stack_and_floor()
    {
        let p = Penalties::default();
        let clean = IndependentFindings::default();
        assert_eq!(quality_score(&p, false, &clean), 1.0);

        let findings = IndependentFindings {
            source_issues: vec!["x".into()],
            difficulty_mismatch: Some(DifficultyMismatch {
                declared: Difficulty::Easy,
                detected: Difficulty::Hard,
                confidence: 0.5,
            }),
            structural_issues: vec!["a".into(), "b".into()],
            instruction_leaks: vec![],
        };
        // 1.0 - 0.3 - 0.2 - 0.2
        assert!((quality_score(&p, false, &findings) - 0.3).abs() < 1e-9);
        assert_eq!(quality_score(&p, true, &findings), 0.0);
    }

    #[test]
    fn test_analyzer_rejects_invalid_config()
    {
        let mut config = Config::default();
        config
            .validation
            .minimum_quality_score = -0.1;

        assert!(matches!(
            QuestionAnalyzer::new("text", &config),
            Err(ValidationError::InvalidConfig { field: "minimum_quality_score", .. })
        ));
    }
}
