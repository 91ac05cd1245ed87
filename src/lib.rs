//! **quizguard** - Quality gate for machine-generated exam questions
//!
//! Detects duplicate and near-duplicate questions within and across batches,
//! checks grounding in the source text, compares declared and detected
//! difficulty, scores structure, and tells the generation loop whether to
//! continue, retry a batch or regenerate the exam.

/// Command-line interface with clap integration
pub mod cli;

/// Shell completion generation
pub mod completion;

/// Validation engine - pure, in-memory, no I/O
pub mod core {
    /// Question records and enumerations
    pub mod model;
    pub use model::{Answer, Difficulty, Question, QuestionType};

    /// Caller errors
    pub mod error;
    pub use error::ValidationError;

    /// Memoizing tokenizer with stop-word removal
    pub mod normalize;
    pub use normalize::TextNormalizer;

    /// Jaccard similarity and type-aware weighting policies
    pub mod similarity;
    pub use similarity::{SimilarityEngine, SimilarityPolicy, jaccard};

    /// Cross-batch fingerprint store and duplicate verdicts
    pub mod fingerprint;
    pub use fingerprint::{DuplicateAction, DuplicateCheckResult, DuplicateType, FingerprintStore};

    /// Keyword/structure difficulty heuristic
    pub mod difficulty;
    pub use difficulty::{DifficultyClassifier, DifficultyMismatch};

    /// Structural rules and literal-instruction leakage
    pub mod structure;
    pub use structure::{InstructionLeak, InstructionPatterns, StructuralChecker, clean_instructions};

    /// Source fidelity heuristic
    pub mod source;
    pub use source::SourceChecker;

    /// Per-question checks and quality score
    pub mod analyzer;
    pub use analyzer::{QuestionAnalyzer, QuestionValidationResult};

    /// Session-scoped batch validation and quality trend
    pub mod batch;
    pub use batch::{BatchValidationResult, BatchValidator, QualityTrend};

    /// Whole-exam validation and metrics
    pub mod exam;
    pub use exam::{ExamMetrics, ExamValidationResult, ExamValidator};
}

/// CLI command handlers
pub mod cli_ext {
    /// `batch`, `exam` and `clean` commands with text/json/table output
    pub mod validate_cmd;
}

/// Infrastructure - Configuration and input loading
pub mod infra {
    /// Layered configuration with TOML support
    pub mod config;
    pub use config::{Config, ScoringConfig, ValidationConfig, init as config_init, load_config};

    /// Source text and question file loading
    pub mod io;
    pub use io::{read_questions, read_source};
}

// Strategic re-exports for library consumers
pub use cli::{AppContext, Cli, Commands};
pub use core::{
    BatchValidationResult,
    BatchValidator,
    ExamValidationResult,
    ExamValidator,
    Question,
    QuestionValidationResult,
    ValidationError,
};
pub use infra::{Config, ValidationConfig, load_config};
