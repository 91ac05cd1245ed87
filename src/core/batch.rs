//! Incremental batch validation for one generation session.
//!
//! A [`BatchValidator`] owns the session state: the fingerprint store, the
//! per-batch quality history and every question seen so far. Batches must be
//! fed in generation order; each one is compared against everything before it.
//! Call [`BatchValidator::reset`] before starting a new exam or document.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::core::analyzer::{QuestionAnalyzer, QuestionValidationResult};
use crate::core::error::ValidationError;
use crate::core::fingerprint::{
    DuplicateCheckResult,
    FingerprintStore,
    check_within_batch,
};
use crate::core::model::Question;
use crate::infra::config::{Config, TrendConfig};

/// Direction of recent batch quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QualityTrend
{
    Improving,
    Stable,
    Declining,
}

impl std::fmt::Display for QualityTrend
{
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result
    {
        match self
        {
            QualityTrend::Improving => write!(f, "improving"),
            QualityTrend::Stable => write!(f, "stable"),
            QualityTrend::Declining => write!(f, "declining"),
        }
    }
}

/// Verdict for one batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchValidationResult
{
    /// 1-based position of the batch in the session
    pub batch_number: usize,
    pub is_valid: bool,
    pub question_results: Vec<QuestionValidationResult>,
    /// Questions flagged by either duplicate check
    pub duplicates_found: usize,
    pub cross_batch_duplicates: usize,
    pub average_quality: f64,
    pub quality_trend: QualityTrend,
    /// False when the caller should stop requesting batches
    pub continue_generation: bool,
    /// True when the caller should regenerate this batch
    pub should_retry: bool,
    /// Questions accumulated across the session, this batch included
    pub total_validated: usize,
    pub recommendations: Vec<String>,
}

/// Session-scoped batch validator
#[derive(Debug)]
pub struct BatchValidator
{
    analyzer: QuestionAnalyzer,
    fingerprints: FingerprintStore,
    history: Vec<f64>,
    accumulated: Vec<Question>,
}

impl BatchValidator
{
    /// Start a session over `source_text`
    pub fn new(
        source_text: &str,
        config: &Config,
    ) -> Result<Self, ValidationError>
    {
        Ok(Self {
            analyzer: QuestionAnalyzer::new(source_text, config)?,
            fingerprints: FingerprintStore::new(),
            history: Vec::new(),
            accumulated: Vec::new(),
        })
    }

    /// Forget every question, fingerprint and score of the current session
    pub fn reset(&mut self)
    {
        self.fingerprints
            .clear();
        self.history
            .clear();
        self.accumulated
            .clear();
        self.analyzer
            .engine()
            .normalizer()
            .clear();
    }

    /// Per-batch average quality, oldest first
    pub fn trend_history(&self) -> &[f64]
    {
        &self.history
    }

    /// Every question validated in this session
    pub fn accumulated(&self) -> &[Question]
    {
        &self.accumulated
    }

    pub fn fingerprint_count(&self) -> usize
    {
        self.fingerprints
            .len()
    }

    pub fn batches_validated(&self) -> usize
    {
        self.history
            .len()
    }

    /// Check one question against the session store, registering it if unique.
    /// Always accepts when cross-batch validation is disabled.
    pub fn check_real_time_duplicate(
        &mut self,
        question: &Question,
    ) -> DuplicateCheckResult
    {
        if !self
            .analyzer
            .validation()
            .cross_batch_validation
        {
            return DuplicateCheckResult::unique(0.0);
        }

        let thresholds = self
            .analyzer
            .thresholds();
        self.fingerprints
            .check_and_register(self.analyzer.engine(), question, thresholds)
    }

    /// Validate the next batch of the session
    #[instrument(skip_all, fields(batch = self.history.len() + 1, size = questions.len()))]
    pub fn validate_batch(
        &mut self,
        questions: &[Question],
    ) -> Result<BatchValidationResult, ValidationError>
    {
        if questions.is_empty()
        {
            return Err(ValidationError::EmptyBatch);
        }

        let thresholds = self
            .analyzer
            .thresholds();
        let mut results = Vec::with_capacity(questions.len());

        for (i, question) in questions
            .iter()
            .enumerate()
        {
            let within = check_within_batch(
                self.analyzer
                    .engine(),
                question,
                &questions[..i],
                thresholds,
            );
            let cross = self.check_real_time_duplicate(question);
            let findings = self
                .analyzer
                .inspect(question);

            let result = self
                .analyzer
                .assemble(question, within, Some(cross), findings);
            debug!(id = %question.id, quality = result.quality_score, "question validated");

            results.push(result);
            self.accumulated
                .push(question.clone());
        }

        let duplicates_found = results
            .iter()
            .filter(|r| r.is_duplicate())
            .count();
        let cross_batch_duplicates = results
            .iter()
            .filter(|r| r.is_cross_batch_duplicate())
            .count();
        let average_quality = results
            .iter()
            .map(|r| r.quality_score)
            .sum::<f64>()
            / results.len() as f64;

        self.history
            .push(average_quality);

        let validation = self
            .analyzer
            .validation();
        let scoring = self
            .analyzer
            .scoring();

        let allowed_cross = (questions.len() as f64 * scoring.cross_batch_allowance).ceil() as usize;
        let is_valid = average_quality >= validation.minimum_quality_score
            && cross_batch_duplicates <= allowed_cross;

        let quality_trend = quality_trend(&self.history, &scoring.trend);
        let continue_generation = !(validation.early_termination_enabled
            && quality_trend == QualityTrend::Declining
            && average_quality < scoring.trend.early_stop_floor);
        let should_retry = !is_valid && validation.retry_on_low_quality;

        let recommendations = batch_recommendations(
            &results,
            average_quality,
            validation.minimum_quality_score,
            cross_batch_duplicates,
            allowed_cross,
            quality_trend,
            continue_generation,
        );

        let result = BatchValidationResult {
            batch_number: self.history.len(),
            is_valid,
            question_results: results,
            duplicates_found,
            cross_batch_duplicates,
            average_quality,
            quality_trend,
            continue_generation,
            should_retry,
            total_validated: self.accumulated.len(),
            recommendations,
        };

        info!(
            batch = result.batch_number,
            valid = result.is_valid,
            avg = result.average_quality,
            trend = %result.quality_trend,
            duplicates = result.duplicates_found,
            "batch validated"
        );

        Ok(result)
    }
}

/// Compare the mean of the latest window against the window before it
pub fn quality_trend(
    history: &[f64],
    trend: &TrendConfig,
) -> QualityTrend
{
    let window = trend
        .window
        .max(1);
    if history.len() < 2 || history.len() <= window
    {
        return QualityTrend::Stable;
    }

    let split = history.len() - window;
    let recent = &history[split..];
    let earlier = &history[split.saturating_sub(window)..split];

    let mean = |xs: &[f64]| xs.iter().sum::<f64>() / xs.len() as f64;
    let diff = mean(recent) - mean(earlier);

    if diff > trend.delta
    {
        QualityTrend::Improving
    }
    else if diff < -trend.delta
    {
        QualityTrend::Declining
    }
    else
    {
        QualityTrend::Stable
    }
}

fn batch_recommendations(
    results: &[QuestionValidationResult],
    average_quality: f64,
    minimum_quality: f64,
    cross_batch_duplicates: usize,
    allowed_cross: usize,
    trend: QualityTrend,
    continue_generation: bool,
) -> Vec<String>
{
    let mut out = Vec::new();

    if average_quality < minimum_quality
    {
        out.push(format!(
            "Batch quality {:.2} is below the minimum {:.2}; regenerate this batch",
            average_quality, minimum_quality
        ));
    }
    if cross_batch_duplicates > allowed_cross
    {
        out.push(format!(
            "{cross_batch_duplicates} questions repeat earlier batches (allowed {allowed_cross}); ask for new topics"
        ));
    }

    let with_source = results
        .iter()
        .filter(|r| r.has_source_issues())
        .count();
    if with_source > 0
    {
        out.push(format!("{with_source} questions drift away from the source material"));
    }

    let leaks = results
        .iter()
        .filter(|r| !r.instruction_leaks.is_empty())
        .count();
    if leaks > 0
    {
        out.push(format!("{leaks} questions contain leaked generation instructions; clean them"));
    }

    if trend == QualityTrend::Declining
    {
        out.push("Quality is declining across recent batches".to_string());
    }
    if !continue_generation
    {
        out.push("Stop generation: quality keeps dropping".to_string());
    }

    out
}
