use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cli::{AppContext, InitArgs};
use crate::core::error::ValidationError;

/// Config file names probed in priority order
pub const CONFIG_FILES: [&str; 4] =
    ["quizguard.toml", "quizguard.yaml", "quizguard.json", ".quizguard.toml"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config
{
    /// Validator switches and thresholds
    pub validation: ValidationConfig,

    /// Penalties, weights and heuristic breakpoints
    pub scoring: ScoringConfig,

    /// Extra literal-instruction patterns appended to the built-in table
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<PatternConfig>,
}

/// Switches and thresholds recognized by the validators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig
{
    /// Plain text similarity at which two questions count as duplicates
    pub duplicate_threshold: f64,

    /// Cross-batch similarity reported as a conceptual duplicate
    pub concept_similarity_threshold: f64,

    /// Cross-batch similarity reported as an exact or semantic duplicate
    pub strict_duplicate_threshold: f64,

    pub source_verification_enabled: bool,

    /// Also require answers to appear verbatim in the source
    pub strict_source_checking: bool,

    pub difficulty_validation_enabled: bool,

    /// Batch average or exam score required to pass
    pub minimum_quality_score: f64,

    /// Ask the caller to regenerate a failing batch
    pub retry_on_low_quality: bool,

    /// Keep a fingerprint store across batches
    pub cross_batch_validation: bool,

    /// Recommend stopping when quality keeps declining
    pub early_termination_enabled: bool,
}

impl Default for ValidationConfig
{
    fn default() -> Self
    {
        Self {
            duplicate_threshold: 0.85,
            concept_similarity_threshold: 0.75,
            strict_duplicate_threshold: 0.90,
            source_verification_enabled: true,
            strict_source_checking: false,
            difficulty_validation_enabled: true,
            minimum_quality_score: 0.70,
            retry_on_low_quality: true,
            cross_batch_validation: true,
            early_termination_enabled: true,
        }
    }
}

impl ValidationConfig
{
    /// Reject ratios outside 0..=1
    pub fn validate(&self) -> Result<(), ValidationError>
    {
        let ratios = [
            ("duplicate_threshold", self.duplicate_threshold),
            ("concept_similarity_threshold", self.concept_similarity_threshold),
            ("strict_duplicate_threshold", self.strict_duplicate_threshold),
            ("minimum_quality_score", self.minimum_quality_score),
        ];

        check_ratios(&ratios)
    }
}

/// Hand-tuned heuristics. Defaults reproduce the established behavior; none of
/// them are derived, so treat every field as tunable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig
{
    /// Jaccard overlap with the source below which a question is flagged
    pub source_overlap_floor: f64,

    /// Answer prefix length checked verbatim under strict source checking
    pub answer_prefix_chars: usize,

    /// Similarity above which a duplicate is labeled exact
    pub exact_duplicate_cutoff: f64,

    pub min_text_chars: usize,
    pub max_text_chars: usize,

    /// Allowed relative deviation of an option length from the mean
    pub option_length_deviation: f64,

    /// Cross-batch duplicates tolerated per batch, as a fraction of its size
    pub cross_batch_allowance: f64,

    pub penalties: Penalties,
    pub exam_weights: ExamWeights,
    pub recommendation_floors: RecommendationFloors,
    pub difficulty: DifficultyBreakpoints,
    pub trend: TrendConfig,
}

impl Default for ScoringConfig
{
    fn default() -> Self
    {
        Self {
            penalties: Penalties::default(),
            exam_weights: ExamWeights::default(),
            recommendation_floors: RecommendationFloors::default(),
            difficulty: DifficultyBreakpoints::default(),
            trend: TrendConfig::default(),
            source_overlap_floor: 0.30,
            answer_prefix_chars: 20,
            exact_duplicate_cutoff: 0.95,
            min_text_chars: 10,
            max_text_chars: 200,
            option_length_deviation: 0.8,
            cross_batch_allowance: 0.10,
        }
    }
}

impl ScoringConfig
{
    pub fn validate(&self) -> Result<(), ValidationError>
    {
        let p = &self.penalties;
        let w = &self.exam_weights;
        let ratios = [
            ("penalties.duplicate", p.duplicate),
            ("penalties.source", p.source),
            ("penalties.difficulty", p.difficulty),
            ("penalties.structural", p.structural),
            ("exam_weights.uniqueness", w.uniqueness),
            ("exam_weights.accuracy", w.accuracy),
            ("exam_weights.difficulty", w.difficulty),
            ("exam_weights.coverage", w.coverage),
            ("source_overlap_floor", self.source_overlap_floor),
            ("exact_duplicate_cutoff", self.exact_duplicate_cutoff),
            ("cross_batch_allowance", self.cross_batch_allowance),
            ("trend.early_stop_floor", self.trend.early_stop_floor),
        ];

        check_ratios(&ratios)
    }
}

/// Quality score deductions per issue category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Penalties
{
    pub duplicate: f64,
    pub source: f64,
    pub difficulty: f64,
    /// Applied once per structural issue
    pub structural: f64,
}

impl Default for Penalties
{
    fn default() -> Self
    {
        Self { duplicate: 0.5, source: 0.3, difficulty: 0.2, structural: 0.1 }
    }
}

/// Exam-level metric weights (sum to 1.0 by default)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExamWeights
{
    pub uniqueness: f64,
    pub accuracy: f64,
    pub difficulty: f64,
    pub coverage: f64,
}

impl Default for ExamWeights
{
    fn default() -> Self
    {
        Self { uniqueness: 0.3, accuracy: 0.4, difficulty: 0.2, coverage: 0.1 }
    }
}

/// Metric values below these trigger an exam recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationFloors
{
    pub uniqueness: f64,
    pub accuracy: f64,
    pub difficulty: f64,
    pub coverage: f64,
}

impl Default for RecommendationFloors
{
    fn default() -> Self
    {
        Self { uniqueness: 0.8, accuracy: 0.8, difficulty: 0.8, coverage: 0.7 }
    }
}

/// Keyword score breakpoints for the difficulty classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyBreakpoints
{
    /// Highest score still classified easy
    pub easy_max: u32,
    pub moderate_max: u32,
    pub hard_max: u32,
    /// Score at which confidence saturates
    pub confidence_divisor: f64,
    /// Word count above which a question earns the length bonus
    pub long_question_words: usize,
}

impl Default for DifficultyBreakpoints
{
    fn default() -> Self
    {
        Self {
            easy_max: 2,
            moderate_max: 4,
            hard_max: 6,
            confidence_divisor: 8.0,
            long_question_words: 15,
        }
    }
}

/// Rolling-window settings for the batch quality trend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig
{
    pub window: usize,
    /// Minimum change in window means before a trend is reported
    pub delta: f64,
    /// Batch average under which a declining session is told to stop
    pub early_stop_floor: f64,
}

impl Default for TrendConfig
{
    fn default() -> Self
    {
        Self { window: 3, delta: 0.05, early_stop_floor: 0.5 }
    }
}

/// A user-supplied literal-instruction pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternConfig
{
    pub category: String,
    pub pattern: String,
}

fn check_ratios(ratios: &[(&'static str, f64)]) -> Result<(), ValidationError>
{
    for &(field, value) in ratios
    {
        if !(0.0..=1.0).contains(&value)
        {
            return Err(ValidationError::InvalidConfig { field, value });
        }
    }

    Ok(())
}

/// Load config from the first config file found in the working directory plus
/// `QUIZGUARD__*` environment overrides
pub fn load_config() -> Result<Config>
{
    let found = CONFIG_FILES
        .iter()
        .map(Path::new)
        .find(|p| p.exists());

    load_layers(found)
}

/// Load config from an explicit file plus environment overrides
pub fn load_config_from(path: &Path) -> Result<Config>
{
    if !path.exists()
    {
        anyhow::bail!("Config file not found: {}", path.display());
    }

    load_layers(Some(path))
}

fn load_layers(file: Option<&Path>) -> Result<Config>
{
    let mut builder = config::Config::builder();

    if let Some(path) = file
    {
        builder = builder.add_source(config::File::from(path));
    }

    // Nested keys use a double underscore: QUIZGUARD__VALIDATION__MINIMUM_QUALITY_SCORE
    builder = builder.add_source(
        config::Environment::with_prefix("QUIZGUARD")
            .prefix_separator("__")
            .separator("__"),
    );

    let cfg = builder
        .build()
        .context("Failed to load configuration")?;
    let parsed: Config = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;

    parsed
        .validation
        .validate()?;
    parsed
        .scoring
        .validate()?;

    Ok(parsed)
}

pub fn init(
    args: InitArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config_path = args
        .path
        .join(CONFIG_FILES[0]);

    if config_path.exists() && !args.force
    {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let config = Config::default();
    let toml_string =
        toml::to_string_pretty(&config).context("Failed to serialize default config")?;

    std::fs::write(&config_path, toml_string).context("Failed to write config file")?;

    if !ctx.quiet
    {
        println!("Created config file at {}", config_path.display());
    }
    Ok(())
}
