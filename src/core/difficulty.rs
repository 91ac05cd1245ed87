//! Keyword and structure heuristic for detected difficulty.

use std::collections::BTreeSet;

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use serde::{Deserialize, Serialize};

use crate::core::error::ValidationError;
use crate::core::model::{Difficulty, Question, QuestionType};
use crate::infra::config::DifficultyBreakpoints;

/// Cue words and the score each contributes when present
const KEYWORD_WEIGHTS: [(&str, u32); 19] = [
    ("what", 1),
    ("define", 1),
    ("list", 1),
    ("name", 1),
    ("identify", 1),
    ("explain", 2),
    ("describe", 2),
    ("compare", 2),
    ("how", 2),
    ("analyze", 3),
    ("evaluate", 3),
    ("synthesize", 3),
    ("predict", 3),
    ("justify", 3),
    ("create", 4),
    ("design", 4),
    ("formulate", 4),
    ("critique", 4),
    ("develop", 4),
];

/// Classifier output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyAssessment
{
    pub level: Difficulty,
    pub score: u32,
    /// min(1, score / divisor)
    pub confidence: f64,
}

/// Declared vs detected difficulty disagreement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyMismatch
{
    pub declared: Difficulty,
    pub detected: Difficulty,
    pub confidence: f64,
}

impl std::fmt::Display for DifficultyMismatch
{
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result
    {
        write!(
            f,
            "declared {} but detected {} (confidence {:.2})",
            self.declared, self.detected, self.confidence
        )
    }
}

pub struct DifficultyClassifier
{
    keywords: AhoCorasick,
    breakpoints: DifficultyBreakpoints,
}

impl std::fmt::Debug for DifficultyClassifier
{
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result
    {
        f.debug_struct("DifficultyClassifier")
            .field("breakpoints", &self.breakpoints)
            .finish_non_exhaustive()
    }
}

impl DifficultyClassifier
{
    pub fn new(breakpoints: DifficultyBreakpoints) -> Result<Self, ValidationError>
    {
        let keywords = AhoCorasickBuilder::new()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::Standard)
            .build(KEYWORD_WEIGHTS.iter().map(|(k, _)| k))
            .map_err(|e| ValidationError::InvalidPattern {
                pattern: "difficulty keywords".to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self { keywords, breakpoints })
    }

    /// Score the question text and map it onto the difficulty scale
    pub fn assess(
        &self,
        question: &Question,
    ) -> DifficultyAssessment
    {
        // Each keyword counts once, and only as a whole word
        let text = question
            .text
            .as_bytes();
        let found: BTreeSet<usize> = self
            .keywords
            .find_overlapping_iter(&question.text)
            .filter(|m| is_whole_word(text, m.start(), m.end()))
            .map(|m| {
                m.pattern()
                    .as_usize()
            })
            .collect();

        let mut score: u32 = found
            .iter()
            .map(|&i| KEYWORD_WEIGHTS[i].1)
            .sum();

        score += match question.kind
        {
            QuestionType::MultipleChoice => 1,
            QuestionType::Essay => 3,
            _ => 0,
        };

        let words = question
            .text
            .split_whitespace()
            .count();
        if words > self.breakpoints.long_question_words
        {
            score += 1;
        }

        let bp = &self.breakpoints;
        let level = if score <= bp.easy_max
        {
            Difficulty::Easy
        }
        else if score <= bp.moderate_max
        {
            Difficulty::Moderate
        }
        else if score <= bp.hard_max
        {
            Difficulty::Hard
        }
        else
        {
            Difficulty::VeryHard
        };

        let confidence = if bp.confidence_divisor > 0.0
        {
            (score as f64 / bp.confidence_divisor).min(1.0)
        }
        else
        {
            1.0
        };

        DifficultyAssessment { level, score, confidence }
    }

    /// `Some` when the detected level differs from the declared one
    pub fn mismatch(
        &self,
        question: &Question,
    ) -> Option<DifficultyMismatch>
    {
        let assessed = self.assess(question);

        (assessed.level != question.difficulty).then(|| DifficultyMismatch {
            declared: question.difficulty,
            detected: assessed.level,
            confidence: assessed.confidence,
        })
    }
}

/// True when `text[start..end]` is not glued to a letter or digit on either side
fn is_whole_word(
    text: &[u8],
    start: usize,
    end: usize,
) -> bool
{
    let before = start
        .checked_sub(1)
        .and_then(|i| text.get(i));
    let after = text.get(end);

    !before.is_some_and(u8::is_ascii_alphanumeric) && !after.is_some_and(u8::is_ascii_alphanumeric)
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::core::model::Answer;

    fn classifier() -> DifficultyClassifier
    {
        DifficultyClassifier::new(DifficultyBreakpoints::default()).unwrap()
    }

    fn q(
        kind: QuestionType,
        declared: Difficulty,
        text: &str,
    ) -> Question
    {
        Question::new("q", kind, declared, text, Answer::Single("x".into()))
    }

    #[test]
    fn test_recall_question_is_easy()
    {
        let c = classifier();
        let question = q(
            QuestionType::ShortAnswer,
            Difficulty::Easy,
            "What process converts light energy into chemical energy?",
        );

        let a = c.assess(&question);
        assert_eq!(a.score, 1);
        assert_eq!(a.level, Difficulty::Easy);
        assert_eq!(a.confidence, 0.125);
        assert!(c.mismatch(&question).is_none());
    }

    #[test]
    fn test_keywords_count_once_each()
    {
        let c = classifier();
        let question = q(QuestionType::ShortAnswer, Difficulty::Easy, "What is what, and what else?");
        assert_eq!(c.assess(&question).score, 1);
    }

    #[test]
    fn test_keywords_inside_longer_words_do_not_count()
    {
        let c = classifier();
        let question = q(
            QuestionType::ShortAnswer,
            Difficulty::Easy,
            "Show which renamed specialist tools procreate?",
        );
        assert_eq!(c.assess(&question).score, 0);

        let cued = q(QuestionType::ShortAnswer, Difficulty::Easy, "How, and why: name (list) them?");
        // how 2 + name 1 + list 1
        assert_eq!(c.assess(&cued).score, 4);
    }

    #[test]
    fn test_essay_with_synthesis_is_very_hard()
    {
        let c = classifier();
        let question = q(
            QuestionType::Essay,
            Difficulty::Moderate,
            "Design an experiment and justify your choice of controls.",
        );

        // design 4 + justify 3 + essay 3
        let a = c.assess(&question);
        assert_eq!(a.score, 10);
        assert_eq!(a.level, Difficulty::VeryHard);
        assert_eq!(a.confidence, 1.0);

        let m = c.mismatch(&question).unwrap();
        assert_eq!(m.declared, Difficulty::Moderate);
        assert_eq!(m.detected, Difficulty::VeryHard);
    }

    #[test]
    fn test_long_multiple_choice_bonus()
    {
        let c = classifier();
        let question = q(
            QuestionType::MultipleChoice,
            Difficulty::Easy,
            "Which of the following statements about the structure of the cell membrane and its proteins is correct overall?",
        );

        // mc 1 + length 1
        assert_eq!(c.assess(&question).score, 2);
    }
}
