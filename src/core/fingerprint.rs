//! Cross-batch duplicate detection.
//!
//! Every accepted question leaves a coarse fingerprint behind. Later questions
//! are scored against every stored question, so the store only ever grows
//! within a generation session.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::model::Question;
use crate::core::similarity::{SimilarityEngine, SimilarityPolicy, jaccard};

/// Leading meaningful tokens folded into a fingerprint
const FINGERPRINT_TOKENS: usize = 5;

/// Chars of each option folded into a fingerprint
const OPTION_PREFIX_CHARS: usize = 10;

/// How close a duplicate is to its match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicateType
{
    Exact,
    Semantic,
    Conceptual,
}

/// What the caller should do with a checked question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicateAction
{
    Accept,
    Modify,
    Reject,
}

/// Verdict of a single duplicate check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateCheckResult
{
    pub is_duplicate: bool,
    pub duplicate_type: Option<DuplicateType>,
    /// Best similarity seen, 0.0 when nothing was compared
    pub similarity: f64,
    pub matched_question_id: Option<String>,
    pub recommendation: DuplicateAction,
}

impl DuplicateCheckResult
{
    pub fn unique(similarity: f64) -> Self
    {
        Self {
            is_duplicate: false,
            duplicate_type: None,
            similarity,
            matched_question_id: None,
            recommendation: DuplicateAction::Accept,
        }
    }

    fn duplicate(
        kind: DuplicateType,
        similarity: f64,
        matched: &Question,
    ) -> Self
    {
        let recommendation = match kind
        {
            DuplicateType::Conceptual => DuplicateAction::Modify,
            DuplicateType::Exact | DuplicateType::Semantic => DuplicateAction::Reject,
        };

        Self {
            is_duplicate: true,
            duplicate_type: Some(kind),
            similarity,
            matched_question_id: Some(matched.id.clone()),
            recommendation,
        }
    }
}

/// Thresholds consulted by the duplicate checks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DuplicateThresholds
{
    /// Within-batch plain similarity
    pub duplicate: f64,
    /// Cross-batch conceptual match
    pub concept: f64,
    /// Cross-batch exact or semantic match
    pub strict: f64,
    /// Above this a match is labeled exact
    pub exact_cutoff: f64,
}

/// Session-scoped fingerprint → question map
#[derive(Debug, Clone, Default)]
pub struct FingerprintStore
{
    entries: IndexMap<String, Question>,
}

impl FingerprintStore
{
    pub fn new() -> Self
    {
        Self::default()
    }

    pub fn len(&self) -> usize
    {
        self.entries
            .len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.entries
            .is_empty()
    }

    pub fn contains(
        &self,
        key: &str,
    ) -> bool
    {
        self.entries
            .contains_key(key)
    }

    /// Stored questions in insertion order
    pub fn questions(&self) -> impl Iterator<Item = &Question>
    {
        self.entries
            .values()
    }

    /// Register `question` under its fingerprint; a colliding key is replaced
    pub fn insert(
        &mut self,
        engine: &SimilarityEngine,
        question: &Question,
    ) -> String
    {
        let key = fingerprint(engine, question);
        self.entries
            .insert(key.clone(), question.clone());
        key
    }

    pub fn clear(&mut self)
    {
        self.entries
            .clear();
    }

    /// Compare `question` with everything stored so far. Unique questions are
    /// registered; duplicates are reported and left out of the store.
    pub fn check_and_register(
        &mut self,
        engine: &SimilarityEngine,
        question: &Question,
        thresholds: DuplicateThresholds,
    ) -> DuplicateCheckResult
    {
        let best = self
            .questions()
            .map(|stored| {
                let sim = engine.question_similarity(question, stored, SimilarityPolicy::advanced());
                (sim, stored)
            })
            .max_by(|a, b| a.0.total_cmp(&b.0));

        if let Some((sim, stored)) = best
        {
            if sim >= thresholds.strict
            {
                let kind = if sim > thresholds.exact_cutoff
                {
                    DuplicateType::Exact
                }
                else
                {
                    DuplicateType::Semantic
                };

                debug!(id = %question.id, matched = %stored.id, sim, ?kind, "cross-batch duplicate");
                return DuplicateCheckResult::duplicate(kind, sim, stored);
            }

            if sim > thresholds.concept
            {
                debug!(id = %question.id, matched = %stored.id, sim, "conceptual duplicate");
                return DuplicateCheckResult::duplicate(DuplicateType::Conceptual, sim, stored);
            }
        }

        let best_sim = best.map_or(0.0, |(sim, _)| sim);
        self.insert(engine, question);

        DuplicateCheckResult::unique(best_sim)
    }
}

/// Coarse key: `type:difficulty:leading-tokens:option-prefixes`
pub fn fingerprint(
    engine: &SimilarityEngine,
    question: &Question,
) -> String
{
    let tokens = engine
        .normalizer()
        .tokens(&question.text);
    let lead = tokens
        .iter()
        .take(FINGERPRINT_TOKENS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ");

    let options = if question.is_multiple_choice()
    {
        question
            .option_list()
            .iter()
            .map(|o| {
                o.chars()
                    .take(OPTION_PREFIX_CHARS)
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("|")
    }
    else
    {
        String::new()
    };

    format!("{}:{}:{}:{}", question.kind, question.difficulty, lead, options)
}

/// Plain-text duplicate scan over questions seen earlier in the same pass
pub fn check_within_batch(
    engine: &SimilarityEngine,
    question: &Question,
    earlier: &[Question],
    thresholds: DuplicateThresholds,
) -> DuplicateCheckResult
{
    let tokens = engine
        .normalizer()
        .tokens(&question.text);

    let mut best: Option<(f64, &Question)> = None;
    for prev in earlier
    {
        let prev_tokens = engine
            .normalizer()
            .tokens(&prev.text);
        let sim = jaccard(&tokens[..], &prev_tokens[..]);

        if best.is_none_or(|(b, _)| sim > b)
        {
            best = Some((sim, prev));
        }
    }

    match best
    {
        Some((sim, prev)) if sim >= thresholds.duplicate =>
        {
            let kind = if sim > thresholds.exact_cutoff
            {
                DuplicateType::Exact
            }
            else
            {
                DuplicateType::Semantic
            };
            DuplicateCheckResult::duplicate(kind, sim, prev)
        }
        Some((sim, _)) => DuplicateCheckResult::unique(sim),
        None => DuplicateCheckResult::unique(0.0),
    }
}
