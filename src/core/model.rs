//! Question records supplied by the generation pipeline.
//!
//! The validator only reads these; ownership stays with the caller.

use serde::{Deserialize, Serialize};

/// Kind of exam question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType
{
    #[serde(alias = "multipleChoice")]
    MultipleChoice,
    #[serde(alias = "trueFalse")]
    TrueFalse,
    #[serde(alias = "fillInBlank")]
    FillInBlank,
    #[serde(alias = "shortAnswer")]
    ShortAnswer,
    Essay,
    Matching,
    Identification,
}

impl QuestionType
{
    /// Stable label used in fingerprints and reports
    pub fn as_str(self) -> &'static str
    {
        match self
        {
            QuestionType::MultipleChoice => "multiple-choice",
            QuestionType::TrueFalse => "true-false",
            QuestionType::FillInBlank => "fill-in-blank",
            QuestionType::ShortAnswer => "short-answer",
            QuestionType::Essay => "essay",
            QuestionType::Matching => "matching",
            QuestionType::Identification => "identification",
        }
    }
}

impl std::fmt::Display for QuestionType
{
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result
    {
        f.write_str(self.as_str())
    }
}

/// Ordered difficulty scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Difficulty
{
    #[serde(alias = "veryEasy")]
    VeryEasy,
    Easy,
    Moderate,
    Hard,
    #[serde(alias = "veryHard")]
    VeryHard,
}

impl Difficulty
{
    pub fn as_str(self) -> &'static str
    {
        match self
        {
            Difficulty::VeryEasy => "very-easy",
            Difficulty::Easy => "easy",
            Difficulty::Moderate => "moderate",
            Difficulty::Hard => "hard",
            Difficulty::VeryHard => "very-hard",
        }
    }
}

impl std::fmt::Display for Difficulty
{
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result
    {
        f.write_str(self.as_str())
    }
}

/// Expected answer: a single string or an ordered list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer
{
    Single(String),
    Multiple(Vec<String>),
}

impl Answer
{
    /// Individual answer entries, in order
    pub fn entries(&self) -> Vec<&str>
    {
        match self
        {
            Answer::Single(s) => vec![s.as_str()],
            Answer::Multiple(v) => v
                .iter()
                .map(String::as_str)
                .collect(),
        }
    }

    /// True when no entry carries any non-whitespace text
    pub fn is_blank(&self) -> bool
    {
        self.entries()
            .iter()
            .all(|e| e.trim().is_empty())
    }
}

impl Default for Answer
{
    fn default() -> Self
    {
        Answer::Single(String::new())
    }
}

/// A generated exam question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question
{
    pub id: String,

    #[serde(rename = "type")]
    pub kind: QuestionType,

    pub difficulty: Difficulty,

    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,

    #[serde(default)]
    pub answer: Answer,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl Question
{
    /// Build a question without options or explanation
    pub fn new(
        id: impl Into<String>,
        kind: QuestionType,
        difficulty: Difficulty,
        text: impl Into<String>,
        answer: Answer,
    ) -> Self
    {
        Self {
            id: id.into(),
            kind,
            difficulty,
            text: text.into(),
            options: None,
            answer,
            explanation: None,
        }
    }

    /// Attach answer options
    pub fn with_options<I, S>(
        mut self,
        options: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = Some(
            options
                .into_iter()
                .map(Into::into)
                .collect(),
        );
        self
    }

    /// Attach an explanation
    pub fn with_explanation(
        mut self,
        explanation: impl Into<String>,
    ) -> Self
    {
        self.explanation = Some(explanation.into());
        self
    }

    /// Options as a slice; empty when absent
    pub fn option_list(&self) -> &[String]
    {
        self.options
            .as_deref()
            .unwrap_or(&[])
    }

    pub fn is_multiple_choice(&self) -> bool
    {
        self.kind == QuestionType::MultipleChoice
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_deserialize_camel_case_aliases()
    {
        let raw = r#"{
            "id": "q1",
            "type": "shortAnswer",
            "difficulty": "veryHard",
            "text": "Why?",
            "answer": ["a", "b"]
        }"#;

        let q: Question = serde_json::from_str(raw).unwrap();
        assert_eq!(q.kind, QuestionType::ShortAnswer);
        assert_eq!(q.difficulty, Difficulty::VeryHard);
        assert_eq!(q.answer, Answer::Multiple(vec!["a".into(), "b".into()]));
        assert!(q.options.is_none());
    }

    #[test]
    fn test_blank_answer_detection()
    {
        assert!(Answer::Single("   ".into()).is_blank());
        assert!(Answer::Multiple(vec![]).is_blank());
        assert!(!Answer::Multiple(vec!["".into(), "x".into()]).is_blank());
    }

    #[test]
    fn test_difficulty_ordering()
    {
        assert!(Difficulty::VeryEasy < Difficulty::Easy);
        assert!(Difficulty::Hard < Difficulty::VeryHard);
        assert_eq!(Difficulty::Moderate.to_string(), "moderate");
    }
}
