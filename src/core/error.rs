//! Caller errors raised by the validators.
//!
//! Ordinary validation outcomes are never errors; they are reported through the
//! result records. These variants cover contract violations only.

/// Fail-fast errors for misuse of the validation API
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ValidationError
{
    /// A batch with no questions has no average quality
    #[error("cannot validate an empty batch")]
    EmptyBatch,

    /// An exam with no questions has no overall score
    #[error("cannot validate an exam with no questions")]
    EmptyExam,

    /// A ratio setting fell outside 0..=1
    #[error("invalid config: {field} = {value} (expected a value between 0 and 1)")]
    InvalidConfig
    {
        field: &'static str,
        value: f64,
    },

    /// A configured instruction pattern failed to compile
    #[error("invalid instruction pattern `{pattern}`: {reason}")]
    InvalidPattern
    {
        pattern: String,
        reason: String,
    },
}
