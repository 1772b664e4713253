//! Configuration management for the CV evaluator

use crate::error::{CvEvaluatorError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub taxonomy: TaxonomyConfig,
    pub market: MarketConfig,
    pub extraction: ExtractionConfig,
    pub requirements: RequirementsConfig,
    pub scoring: ScoringConfig,
    pub recommendations: RecommendationConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Files larger than this are refused before they are read
    pub max_file_size_mb: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxonomyConfig {
    /// Custom vocabulary file; the built-in vocabulary is used when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub fuzzy_floor: f32,
    pub similarity: SimilarityBackend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityBackend {
    JaroWinkler,
    Levenshtein,
    TokenJaccard,
    CharNgram,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// TOML file with a `[weights]` table overriding the taxonomy demand values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub default_weight: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Date used to close open-ended ranges ("2021 - Present"); today when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RequirementsConfig {
    pub unmarked_must_have_limit: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub general: GeneralScoringConfig,
    pub job_match: JobMatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralScoringConfig {
    pub skill_points: f32,
    pub mentioned_factor: f32,
    pub professional_factor: f32,
    pub years_qualified_factor: f32,
    pub experience_ceiling_years: f32,
    pub points_per_year: f32,
    pub tail_points_per_year: f32,
    pub points_per_seniority_step: f32,
    pub max_progression_points: f32,
    pub certificate_points: f32,
    pub associate_points: f32,
    pub bachelor_points: f32,
    pub master_points: f32,
    pub doctorate_points: f32,
    pub in_progress_factor: f32,
    pub points_per_certification: f32,
    pub max_certification_bonus: f32,
    pub suggested_skills: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobMatchConfig {
    pub fulfillment_points: f32,
    pub must_have_multiplier: f32,
    pub partial_credit: f32,
    pub unmet_must_have_penalty: f32,
    pub floor: f32,
    pub max_adjustment: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    pub max_items: usize,
    pub critical_ratio: f32,
    pub moderate_ratio: f32,
    pub minor_ratio: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub detailed: bool,
    pub color_output: bool,
    pub narrative: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Console,
    Json,
    Markdown,
    Html,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self { max_file_size_mb: 10 }
    }
}

impl InputConfig {
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        Self {
            path: None,
            fuzzy_floor: 0.9,
            similarity: SimilarityBackend::JaroWinkler,
        }
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            path: None,
            default_weight: 0.5,
        }
    }
}

impl Default for RequirementsConfig {
    fn default() -> Self {
        Self {
            unmarked_must_have_limit: 5,
        }
    }
}

impl Default for GeneralScoringConfig {
    fn default() -> Self {
        Self {
            skill_points: 8.0,
            mentioned_factor: 0.6,
            professional_factor: 0.85,
            years_qualified_factor: 1.0,
            experience_ceiling_years: 8.0,
            points_per_year: 3.0,
            tail_points_per_year: 0.5,
            points_per_seniority_step: 1.5,
            max_progression_points: 4.0,
            certificate_points: 6.0,
            associate_points: 8.0,
            bachelor_points: 12.0,
            master_points: 16.0,
            doctorate_points: 18.0,
            in_progress_factor: 0.5,
            points_per_certification: 1.0,
            max_certification_bonus: 4.0,
            suggested_skills: 5,
        }
    }
}

impl Default for JobMatchConfig {
    fn default() -> Self {
        Self {
            fulfillment_points: 100.0,
            must_have_multiplier: 2.0,
            partial_credit: 0.5,
            unmet_must_have_penalty: 0.85,
            floor: 5.0,
            max_adjustment: 0.25,
        }
    }
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            max_items: 10,
            critical_ratio: 0.2,
            moderate_ratio: 0.5,
            minor_ratio: 0.8,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Console,
            detailed: false,
            color_output: true,
            narrative: true,
        }
    }
}

impl Config {
    /// Load from the default location, writing defaults on first run.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| CvEvaluatorError::Configuration(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| CvEvaluatorError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("cv-evaluator")
            .join("config.toml")
    }

    /// Range checks for every tunable. Runs on load and before an evaluator is built.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(CvEvaluatorError::Configuration(msg));

        if self.input.max_file_size_mb == 0 {
            return fail("input.max_file_size_mb must be at least 1".to_string());
        }
        if !(self.taxonomy.fuzzy_floor > 0.0 && self.taxonomy.fuzzy_floor <= 1.0) {
            return fail(format!("taxonomy.fuzzy_floor must be in (0, 1], got {}", self.taxonomy.fuzzy_floor));
        }
        if !(0.0..=1.0).contains(&self.market.default_weight) {
            return fail(format!("market.default_weight must be in [0, 1], got {}", self.market.default_weight));
        }

        let g = &self.scoring.general;
        let non_negative = [
            ("skill_points", g.skill_points),
            ("mentioned_factor", g.mentioned_factor),
            ("professional_factor", g.professional_factor),
            ("years_qualified_factor", g.years_qualified_factor),
            ("experience_ceiling_years", g.experience_ceiling_years),
            ("points_per_year", g.points_per_year),
            ("tail_points_per_year", g.tail_points_per_year),
            ("points_per_seniority_step", g.points_per_seniority_step),
            ("max_progression_points", g.max_progression_points),
            ("certificate_points", g.certificate_points),
            ("associate_points", g.associate_points),
            ("bachelor_points", g.bachelor_points),
            ("master_points", g.master_points),
            ("doctorate_points", g.doctorate_points),
            ("in_progress_factor", g.in_progress_factor),
            ("points_per_certification", g.points_per_certification),
            ("max_certification_bonus", g.max_certification_bonus),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return fail(format!("scoring.general.{} must be a non-negative number, got {}", name, value));
            }
        }
        if g.tail_points_per_year > g.points_per_year {
            return fail("scoring.general.tail_points_per_year must not exceed points_per_year".to_string());
        }

        let j = &self.scoring.job_match;
        if !(j.fulfillment_points > 0.0 && j.fulfillment_points <= 100.0) {
            return fail(format!("scoring.job_match.fulfillment_points must be in (0, 100], got {}", j.fulfillment_points));
        }
        if !(0.0..=j.fulfillment_points).contains(&j.floor) {
            return fail(format!("scoring.job_match.floor must be in [0, fulfillment_points], got {}", j.floor));
        }
        if j.must_have_multiplier < 1.0 {
            return fail(format!("scoring.job_match.must_have_multiplier must be >= 1, got {}", j.must_have_multiplier));
        }
        for (name, value) in [
            ("partial_credit", j.partial_credit),
            ("unmet_must_have_penalty", j.unmet_must_have_penalty),
            ("max_adjustment", j.max_adjustment),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return fail(format!("scoring.job_match.{} must be in [0, 1], got {}", name, value));
            }
        }

        let r = &self.recommendations;
        if r.max_items == 0 {
            return fail("recommendations.max_items must be at least 1".to_string());
        }
        if !(r.critical_ratio <= r.moderate_ratio && r.moderate_ratio <= r.minor_ratio && r.minor_ratio <= 1.0) {
            return fail("recommendations ratios must satisfy critical <= moderate <= minor <= 1".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_round_trip_through_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.extraction.reference_date = NaiveDate::from_ymd_opt(2024, 6, 1);
        config.recommendations.max_items = 3;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.recommendations.max_items, 3);
        assert_eq!(loaded.extraction.reference_date, NaiveDate::from_ymd_opt(2024, 6, 1));
        assert_eq!(loaded.taxonomy.similarity, SimilarityBackend::JaroWinkler);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[scoring.job_match]\nfloor = 10.0\n").unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.scoring.job_match.floor, 10.0);
        assert_eq!(loaded.scoring.job_match.must_have_multiplier, 2.0);
        assert_eq!(loaded.requirements.unmarked_must_have_limit, 5);
        assert_eq!(loaded.input.max_file_size_mb, 10);
        assert_eq!(loaded.input.max_file_size_bytes(), 10 * 1024 * 1024);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut config = Config::default();
        config.scoring.job_match.floor = 150.0;
        assert!(matches!(config.validate(), Err(CvEvaluatorError::Configuration(_))));

        let mut config = Config::default();
        config.recommendations.max_items = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.scoring.general.points_per_year = f32::NAN;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.input.max_file_size_mb = 0;
        assert!(matches!(config.validate(), Err(CvEvaluatorError::Configuration(_))));
    }
}
