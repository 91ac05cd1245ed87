//! Lexical grounding of questions in the source document.

use std::sync::Arc;

use tracing::warn;

use crate::core::model::Question;
use crate::core::normalize::TextNormalizer;
use crate::core::similarity::jaccard;

pub const MSG_CONCEPTS_NOT_IN_SOURCE: &str = "Question references concepts not in source material";
pub const MSG_ANSWER_NOT_IN_SOURCE: &str = "Answer not found in source material";

/// Source text prepared once per session
#[derive(Debug, Clone)]
pub struct SourceChecker
{
    tokens: Arc<[String]>,
    lowered: String,
    overlap_floor: f64,
    answer_prefix_chars: usize,
    strict: bool,
}

impl SourceChecker
{
    pub fn new(
        normalizer: &TextNormalizer,
        source_text: &str,
        overlap_floor: f64,
        answer_prefix_chars: usize,
        strict: bool,
    ) -> Self
    {
        let tokens = normalizer.tokens(source_text);
        if tokens.is_empty()
        {
            warn!("source text has no meaningful tokens; source fidelity checks are skipped");
        }

        Self {
            tokens,
            lowered: source_text.to_lowercase(),
            overlap_floor,
            answer_prefix_chars,
            strict,
        }
    }

    /// A source without meaningful tokens cannot ground anything
    pub fn has_content(&self) -> bool
    {
        !self
            .tokens
            .is_empty()
    }

    /// Jaccard overlap between the question text and the whole source
    pub fn overlap(
        &self,
        normalizer: &TextNormalizer,
        question: &Question,
    ) -> f64
    {
        let q = normalizer.tokens(&question.text);
        jaccard(&q[..], &self.tokens[..])
    }

    /// Issues found for `question`; empty when grounded
    pub fn check(
        &self,
        normalizer: &TextNormalizer,
        question: &Question,
    ) -> Vec<String>
    {
        let mut issues = Vec::new();
        if !self.has_content()
        {
            return issues;
        }

        if self.overlap(normalizer, question) < self.overlap_floor
        {
            issues.push(MSG_CONCEPTS_NOT_IN_SOURCE.to_string());
        }

        if self.strict && !self.answer_in_source(question)
        {
            issues.push(MSG_ANSWER_NOT_IN_SOURCE.to_string());
        }

        issues
    }

    /// Every non-empty answer entry must appear, by its prefix, verbatim
    fn answer_in_source(
        &self,
        question: &Question,
    ) -> bool
    {
        question
            .answer
            .entries()
            .iter()
            .map(|e| {
                e.trim()
                    .to_lowercase()
            })
            .filter(|e| !e.is_empty())
            .all(|e| {
                let prefix: String = e
                    .chars()
                    .take(self.answer_prefix_chars)
                    .collect();
                self.lowered
                    .contains(&prefix)
            })
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::core::model::{Answer, Difficulty, QuestionType};

    const SOURCE: &str = "Photosynthesis converts light energy into chemical energy in plants.";

    fn q(
        text: &str,
        answer: &str,
    ) -> Question
    {
        Question::new("q", QuestionType::ShortAnswer, Difficulty::Easy, text, Answer::Single(answer.into()))
    }

    #[test]
    fn test_grounded_question_passes()
    {
        let n = TextNormalizer::new();
        let checker = SourceChecker::new(&n, SOURCE, 0.30, 20, true);
        let question = q("What process converts light energy into chemical energy?", "Photosynthesis");

        assert!(checker.overlap(&n, &question) >= 0.3);
        assert!(checker.check(&n, &question).is_empty());
    }

    #[test]
    fn test_unrelated_question_flagged()
    {
        let n = TextNormalizer::new();
        let checker = SourceChecker::new(&n, SOURCE, 0.30, 20, false);
        let question = q("Which treaty ended the Thirty Years War?", "Westphalia");

        assert_eq!(checker.check(&n, &question), vec![MSG_CONCEPTS_NOT_IN_SOURCE.to_string()]);
    }

    #[test]
    fn test_strict_mode_requires_answer_in_source()
    {
        let n = TextNormalizer::new();
        let checker = SourceChecker::new(&n, SOURCE, 0.30, 20, true);
        let question = q("What process converts light energy into chemical energy?", "Respiration");

        assert_eq!(checker.check(&n, &question), vec![MSG_ANSWER_NOT_IN_SOURCE.to_string()]);
    }

    #[test]
    fn test_empty_source_checks_nothing()
    {
        let n = TextNormalizer::new();
        let checker = SourceChecker::new(&n, "", 0.30, 20, true);
        assert!(!checker.has_content());
        assert!(checker.check(&n, &q("Anything?", "x")).is_empty());

        // Punctuation and stop words only
        let hollow = SourceChecker::new(&n, "?? ... it is the of !", 0.30, 20, false);
        assert!(!hollow.has_content());
        assert!(hollow.check(&n, &q("Which treaty ended the Thirty Years War?", "x")).is_empty());
    }
}
