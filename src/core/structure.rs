//! Rule-based structural checks and literal-instruction leakage.
//!
//! Generators sometimes echo their own prompt ("[Continue with...]",
//! "Generate all 20 questions") into the output. Those phrases are described
//! by a pattern table so new ones can be added from configuration without
//! touching the scoring code.

use std::sync::LazyLock;

use itertools::Itertools;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::error::ValidationError;
use crate::core::model::Question;
use crate::infra::config::{PatternConfig, ScoringConfig};

pub const MSG_TOO_SHORT: &str = "Question text is too short";
pub const MSG_TOO_LONG: &str = "Question text is too long";
pub const MSG_NO_TERMINATOR: &str = "Question should end with a question mark or contain a blank";
pub const MSG_OPTION_COUNT: &str = "Multiple choice question must have exactly 4 options";
pub const MSG_OPTION_DUPLICATES: &str = "Multiple choice options must be unique";
pub const MSG_OPTION_LENGTHS: &str = "Option lengths are inconsistent";
pub const MSG_EMPTY_ANSWER: &str = "Answer is missing or empty";

/// Options a multiple-choice question must carry
const MC_OPTION_COUNT: usize = 4;

/// Built-in (category, pattern) table
const BUILTIN_PATTERNS: [(&str, &str); 10] = [
    ("placeholder", r"(?i)\[\s*continue\s+with[^\]]*\]"),
    ("placeholder", r"(?i)\[\s*(?:add|insert|repeat|generate)\s+[^\]]*\]"),
    ("placeholder", r"(?i)\[\s*(?:\.\.\.|etc\.?)\s*\]"),
    ("placeholder", r"(?i)\[\s*question\s+\d+[^\]]*\]"),
    ("meta-instruction", r"(?i)generate\s+all\s+\d+\s+questions?[^\n]*"),
    ("meta-instruction", r"(?i)follow\s+this\s+(?:pattern|format)[^\n]*"),
    ("meta-instruction", r"(?i)continue\s+(?:this|the\s+same)\s+(?:pattern|format)[^\n]*"),
    ("meta-instruction", r"(?i)\(\s*continue\s+for\s+(?:the\s+)?remaining\s+questions?\s*\)"),
    ("meta-instruction", r"(?i)(?:\.\.\.\s*)?and\s+so\s+on\s+for\s+(?:all\s+)?(?:the\s+)?remaining[^\n]*"),
    ("meta-instruction", r"(?i)repeat\s+(?:this|the\s+above)\s+for\s+[^\n]*"),
];

static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*(?:\n[ \t]*)+").expect("static blank-line pattern"));

/// One leaked instruction found in question content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionLeak
{
    pub category: String,
    pub matched: String,
}

/// Compiled instruction pattern
#[derive(Debug, Clone)]
pub struct InstructionPattern
{
    pub category: String,
    pub regex: Regex,
}

/// Ordered set of instruction patterns
#[derive(Debug, Clone)]
pub struct InstructionPatterns
{
    patterns: Vec<InstructionPattern>,
}

impl InstructionPatterns
{
    /// Built-in table only
    pub fn builtin() -> Result<Self, ValidationError>
    {
        Self::with_extra(&[])
    }

    /// Built-in table followed by configured patterns
    pub fn with_extra(extra: &[PatternConfig]) -> Result<Self, ValidationError>
    {
        let builtin = BUILTIN_PATTERNS
            .iter()
            .map(|&(category, pattern)| (category, pattern));
        let configured = extra
            .iter()
            .map(|p| (p.category.as_str(), p.pattern.as_str()));

        let patterns = builtin
            .chain(configured)
            .map(|(category, pattern)| {
                Regex::new(pattern)
                    .map(|regex| InstructionPattern { category: category.to_string(), regex })
                    .map_err(|e| ValidationError::InvalidPattern {
                        pattern: pattern.to_string(),
                        reason: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    pub fn len(&self) -> usize
    {
        self.patterns
            .len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.patterns
            .is_empty()
    }

    /// Every match of every pattern, in table order
    pub fn detect(
        &self,
        text: &str,
    ) -> Vec<InstructionLeak>
    {
        self.patterns
            .iter()
            .flat_map(|p| {
                p.regex
                    .find_iter(text)
                    .map(|m| InstructionLeak {
                        category: p.category.clone(),
                        matched: m
                            .as_str()
                            .trim()
                            .to_string(),
                    })
            })
            .collect()
    }

    /// Strip every match and collapse the blank lines left behind
    pub fn clean(
        &self,
        text: &str,
    ) -> String
    {
        let mut out = text.to_string();
        for p in &self.patterns
        {
            out = p
                .regex
                .replace_all(&out, "")
                .into_owned();
        }

        BLANK_RUNS
            .replace_all(&out, "\n")
            .trim()
            .to_string()
    }
}

/// Strip literal instructions with the built-in table
pub fn clean_instructions(text: &str) -> Result<String, ValidationError>
{
    Ok(InstructionPatterns::builtin()?.clean(text))
}

/// Findings of the structural pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuralReport
{
    /// Human-readable issues; each costs one structural penalty
    pub issues: Vec<String>,
    pub leaks: Vec<InstructionLeak>,
}

/// Length, format, option and answer rules
#[derive(Debug, Clone)]
pub struct StructuralChecker
{
    patterns: InstructionPatterns,
    min_chars: usize,
    max_chars: usize,
    option_deviation: f64,
}

impl StructuralChecker
{
    pub fn new(
        patterns: InstructionPatterns,
        scoring: &ScoringConfig,
    ) -> Self
    {
        Self {
            patterns,
            min_chars: scoring.min_text_chars,
            max_chars: scoring.max_text_chars,
            option_deviation: scoring.option_length_deviation,
        }
    }

    pub fn patterns(&self) -> &InstructionPatterns
    {
        &self.patterns
    }

    pub fn check(
        &self,
        question: &Question,
    ) -> StructuralReport
    {
        let mut report = StructuralReport::default();

        // 1) Leaked instructions anywhere in the visible content
        let mut leaks = self
            .patterns
            .detect(&question.text);
        for option in question.option_list()
        {
            leaks.extend(
                self.patterns
                    .detect(option),
            );
        }
        if let Some(explanation) = &question.explanation
        {
            leaks.extend(
                self.patterns
                    .detect(explanation),
            );
        }
        for leak in &leaks
        {
            report
                .issues
                .push(format!("Contains literal instruction ({}): \"{}\"", leak.category, leak.matched));
        }
        report.leaks = leaks;

        // 2) Text length and terminator
        let text = question
            .text
            .trim();
        let chars = text
            .chars()
            .count();
        if chars < self.min_chars
        {
            report
                .issues
                .push(MSG_TOO_SHORT.to_string());
        }
        if chars > self.max_chars
        {
            report
                .issues
                .push(MSG_TOO_LONG.to_string());
        }
        if !text.ends_with('?') && !text.contains('_')
        {
            report
                .issues
                .push(MSG_NO_TERMINATOR.to_string());
        }

        // 3) Multiple-choice options
        if question.is_multiple_choice()
        {
            report
                .issues
                .extend(self.check_options(question.option_list()));
        }

        // 4) Answer
        if question
            .answer
            .is_blank()
        {
            report
                .issues
                .push(MSG_EMPTY_ANSWER.to_string());
        }

        report
    }

    fn check_options(
        &self,
        options: &[String],
    ) -> Vec<String>
    {
        let mut issues = Vec::new();

        if options.len() != MC_OPTION_COUNT
        {
            issues.push(MSG_OPTION_COUNT.to_string());
        }

        let normalized: Vec<String> = options
            .iter()
            .map(|o| {
                o.split_whitespace()
                    .join(" ")
                    .to_lowercase()
            })
            .collect();
        if !normalized
            .iter()
            .all_unique()
        {
            issues.push(MSG_OPTION_DUPLICATES.to_string());
        }

        if !options.is_empty()
        {
            let lengths: Vec<f64> = options
                .iter()
                .map(|o| {
                    o.trim()
                        .chars()
                        .count() as f64
                })
                .collect();
            let mean = lengths
                .iter()
                .sum::<f64>()
                / lengths.len() as f64;

            if mean > 0.0
                && lengths
                    .iter()
                    .any(|&l| (l - mean).abs() > mean * self.option_deviation)
            {
                issues.push(MSG_OPTION_LENGTHS.to_string());
            }
        }

        issues
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::core::model::{Answer, Difficulty, QuestionType};

    fn checker() -> StructuralChecker
    {
        StructuralChecker::new(InstructionPatterns::builtin().unwrap(), &ScoringConfig::default())
    }

    fn mc(options: &[&str]) -> Question
    {
        Question::new(
            "mc",
            QuestionType::MultipleChoice,
            Difficulty::Easy,
            "Which planet is known as the red planet?",
            Answer::Single("Mars".into()),
        )
        .with_options(options.iter().copied())
    }

    #[test]
    fn test_well_formed_question_has_no_issues()
    {
        let report = checker().check(&mc(&["Mars", "Venus", "Earth", "Saturn"]));
        assert!(report.issues.is_empty(), "{:?}", report.issues);
    }

    #[test]
    fn test_three_options_flagged()
    {
        let report = checker().check(&mc(&["Mars", "Venus", "Earth"]));
        assert_eq!(report.issues, vec![MSG_OPTION_COUNT.to_string()]);
    }

    #[test]
    fn test_duplicate_options_ignore_case_and_spacing()
    {
        let report = checker().check(&mc(&["Mars", " mars ", "Earth", "Venus"]));
        assert!(report.issues.contains(&MSG_OPTION_DUPLICATES.to_string()));
    }

    #[test]
    fn test_inconsistent_option_lengths()
    {
        let report = checker().check(&mc(&[
            "Mars",
            "Venus",
            "Earth",
            "The gas giant with the great red spot and dozens of moons",
        ]));
        assert!(report.issues.contains(&MSG_OPTION_LENGTHS.to_string()));
    }

    #[test]
    fn test_length_terminator_and_answer_rules()
    {
        let q = Question::new("s", QuestionType::ShortAnswer, Difficulty::Easy, "Cells", Answer::Single(" ".into()));
        let report = checker().check(&q);

        assert!(report.issues.contains(&MSG_TOO_SHORT.to_string()));
        assert!(report.issues.contains(&MSG_NO_TERMINATOR.to_string()));
        assert!(report.issues.contains(&MSG_EMPTY_ANSWER.to_string()));

        let blank = Question::new(
            "b",
            QuestionType::FillInBlank,
            Difficulty::Easy,
            "The powerhouse of the cell is the ___.",
            Answer::Single("mitochondria".into()),
        );
        assert!(checker().check(&blank).issues.is_empty());
    }

    #[test]
    fn test_detects_and_cleans_leaked_instructions()
    {
        let patterns = InstructionPatterns::builtin().unwrap();
        let text = "What is osmosis?\n[Continue with 9 more questions]\n\nGenerate all 10 questions like this.\nDefine diffusion?";

        let leaks = patterns.detect(text);
        assert_eq!(leaks.len(), 2);
        assert_eq!(leaks[0].category, "placeholder");
        assert_eq!(leaks[0].matched, "[Continue with 9 more questions]");
        assert_eq!(leaks[1].category, "meta-instruction");

        assert_eq!(patterns.clean(text), "What is osmosis?\nDefine diffusion?");
    }

    #[test]
    fn test_clean_instructions_uses_builtin_table()
    {
        let text = "Explain osmosis.\n\n(Continue for remaining questions)\n\nDefine diffusion?";
        assert_eq!(clean_instructions(text).unwrap(), "Explain osmosis.\nDefine diffusion?");

        let plain = "What is the boiling point of water?";
        assert_eq!(clean_instructions(plain).unwrap(), plain);
    }

    #[test]
    fn test_configured_patterns_extend_table()
    {
        let extra = vec![PatternConfig { category: "todo".into(), pattern: r"(?i)\bTODO\b".into() }];
        let patterns = InstructionPatterns::with_extra(&extra).unwrap();
        assert_eq!(patterns.len(), BUILTIN_PATTERNS.len() + 1);
        assert_eq!(patterns.detect("TODO: write question")[0].category, "todo");

        let bad = vec![PatternConfig { category: "x".into(), pattern: "(".into() }];
        assert!(matches!(
            InstructionPatterns::with_extra(&bad),
            Err(ValidationError::InvalidPattern { .. })
        ));
    }
}
