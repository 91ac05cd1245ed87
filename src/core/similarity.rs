//! Bag-of-words similarity between questions.
//!
//! Everything reduces to Jaccard similarity over token sets. Question-level
//! comparisons go through one function parameterized by a [`SimilarityPolicy`],
//! so the plain and the type-aware ("advanced") variants share all logic.

use std::collections::HashSet;

use crate::core::model::Question;
use crate::core::normalize::TextNormalizer;

/// Intersection over union of two token collections, treated as sets.
/// Returns 0.0 when both are empty.
pub fn jaccard<S: AsRef<str>>(
    a: &[S],
    b: &[S],
) -> f64
{
    let left: HashSet<&str> = a
        .iter()
        .map(AsRef::as_ref)
        .collect();
    let right: HashSet<&str> = b
        .iter()
        .map(AsRef::as_ref)
        .collect();

    let union = left
        .union(&right)
        .count();
    if union == 0
    {
        return 0.0;
    }

    let inter = left
        .intersection(&right)
        .count();

    inter as f64 / union as f64
}

/// Weighting applied by [`SimilarityEngine::question_similarity`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityPolicy
{
    /// Multiplier for questions of different types; 1.0 disables the penalty
    pub cross_type_factor: f64,
    /// Weight of question-text similarity when options are blended in
    pub text_weight: f64,
    /// Weight of option similarity; 0.0 disables option blending
    pub option_weight: f64,
}

impl SimilarityPolicy
{
    /// Pure text Jaccard, type-agnostic
    pub const fn plain() -> Self
    {
        Self { cross_type_factor: 1.0, text_weight: 1.0, option_weight: 0.0 }
    }

    /// Type-aware blend used for cross-batch duplicate detection
    pub const fn advanced() -> Self
    {
        Self { cross_type_factor: 0.7, text_weight: 0.7, option_weight: 0.3 }
    }

    fn blends_options(&self) -> bool
    {
        self.option_weight > 0.0
    }
}

impl Default for SimilarityPolicy
{
    fn default() -> Self
    {
        Self::advanced()
    }
}

/// Similarity computations backed by a shared token cache
#[derive(Debug, Clone, Default)]
pub struct SimilarityEngine
{
    normalizer: TextNormalizer,
}

impl SimilarityEngine
{
    pub fn new(normalizer: TextNormalizer) -> Self
    {
        Self { normalizer }
    }

    pub fn normalizer(&self) -> &TextNormalizer
    {
        &self.normalizer
    }

    /// Jaccard similarity of two raw strings
    pub fn text_similarity(
        &self,
        a: &str,
        b: &str,
    ) -> f64
    {
        let ta = self
            .normalizer
            .tokens(a);
        let tb = self
            .normalizer
            .tokens(b);

        jaccard(&ta[..], &tb[..])
    }

    /// Mean pairwise Jaccard over the full cross product of two option lists
    pub fn option_similarity(
        &self,
        a: &[String],
        b: &[String],
    ) -> f64
    {
        if a.is_empty() || b.is_empty()
        {
            return 0.0;
        }

        let mut total = 0.0;
        for x in a
        {
            for y in b
            {
                total += self.text_similarity(x, y);
            }
        }

        total / (a.len() * b.len()) as f64
    }

    /// Similarity of two questions under `policy`, in 0..=1
    pub fn question_similarity(
        &self,
        q1: &Question,
        q2: &Question,
        policy: SimilarityPolicy,
    ) -> f64
    {
        // Same wording and same options is the same question under every policy
        if q1.kind == q2.kind && q1.text == q2.text && q1.options == q2.options
        {
            return 1.0;
        }

        let text = self.text_similarity(&q1.text, &q2.text);

        let score = if q1.kind != q2.kind
        {
            text * policy.cross_type_factor
        }
        else if policy.blends_options()
            && q1.is_multiple_choice()
            && q1.options.is_some()
            && q2.options.is_some()
        {
            let opts = self.option_similarity(q1.option_list(), q2.option_list());
            policy.text_weight * text + policy.option_weight * opts
        }
        else
        {
            text
        };

        score.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::core::model::{Answer, Difficulty, QuestionType};

    fn q(
        kind: QuestionType,
        text: &str,
    ) -> Question
    {
        Question::new("id", kind, Difficulty::Easy, text, Answer::Single("x".into()))
    }

    #[test]
    fn test_jaccard_basics()
    {
        let empty: [&str; 0] = [];
        assert_eq!(jaccard(&empty, &empty), 0.0);
        assert_eq!(jaccard(&["cell", "wall"], &["wall", "cell", "cell"]), 1.0);
        assert_eq!(jaccard(&["cell", "wall"], &["cell", "membrane"]), 1.0 / 3.0);
    }

    #[test]
    fn test_cross_type_penalty()
    {
        let engine = SimilarityEngine::default();
        let a = q(QuestionType::ShortAnswer, "Which organelle produces cellular energy?");
        let b = q(QuestionType::Essay, "Which organelle produces cellular energy today?");

        let advanced = engine.question_similarity(&a, &b, SimilarityPolicy::advanced());
        let plain = engine.question_similarity(&a, &b, SimilarityPolicy::plain());

        assert!((advanced - plain * 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_multiple_choice_blends_options()
    {
        let engine = SimilarityEngine::default();
        let a = q(QuestionType::MultipleChoice, "Which planet is largest?")
            .with_options(["Jupiter", "Saturn", "Earth", "Mars"]);
        let b = q(QuestionType::MultipleChoice, "Which planet is largest?")
            .with_options(["Venus", "Mercury", "Neptune", "Uranus"]);

        let sim = engine.question_similarity(&a, &b, SimilarityPolicy::advanced());
        // Text identical, no option overlap
        assert!((sim - 0.7).abs() < 1e-9);

        let plain = engine.question_similarity(&a, &b, SimilarityPolicy::plain());
        assert!((plain - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_identical_questions_short_circuit()
    {
        let engine = SimilarityEngine::default();
        let a = q(QuestionType::MultipleChoice, "Which planet is largest?")
            .with_options(["Jupiter", "Saturn", "Earth", "Mars"]);

        assert_eq!(engine.question_similarity(&a, &a.clone(), SimilarityPolicy::advanced()), 1.0);
    }
}
