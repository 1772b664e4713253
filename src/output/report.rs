//! Evaluation report assembled from extraction, scoring and recommendations

use crate::model::{
    CVFeatureSet, Confidence, ContactInfo, DegreeLevel, EducationEntry, ExperienceEntry, ExtractionWarning,
    RequirementModel, SkillMention,
};
use crate::recommendations::GapItem;
use crate::scoring::{ConstraintCheck, RequirementOutcome, ScoreBreakdown, ScoreMode, ScoreResult, SuggestedSkill};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Everything one evaluation produced. Carries no wall-clock data, so the
/// same inputs always serialize to the same report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub mode: ScoreMode,

    /// Category scores and the overall score
    pub breakdown: ScoreBreakdown,

    /// Prioritized gaps with remediation advice
    pub gaps: Vec<GapItem>,

    /// Narrative summary, when a narrator is configured and succeeded
    pub summary: Option<String>,

    /// How much of the CV the extractor could read cleanly
    pub confidence: ExtractionConfidence,

    /// Recovered extraction problems
    pub warnings: Vec<ExtractionWarning>,

    /// What was found in the CV
    pub profile: CandidateProfile,

    /// Title of the job matched against (job-match mode)
    pub job_title: Option<String>,

    /// Per-requirement results (job-match mode)
    pub requirement_outcomes: Vec<RequirementOutcome>,

    /// Role-level constraint results (job-match mode)
    pub constraint_checks: Vec<ConstraintCheck>,

    /// Job skills that could not be mapped to the taxonomy
    pub unresolved_job_terms: Vec<String>,

    /// In-demand skills the CV lacks (general mode)
    pub suggested_skills: Vec<SuggestedSkill>,

    pub metadata: ReportMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionConfidence {
    High,
    Medium,
    Low,
}

impl fmt::Display for ExtractionConfidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionConfidence::High => write!(f, "High"),
            ExtractionConfidence::Medium => write!(f, "Medium"),
            ExtractionConfidence::Low => write!(f, "Low"),
        }
    }
}

impl ExtractionConfidence {
    /// High with no warnings, Low when nothing was extracted, otherwise
    /// graded by the share of low-confidence experience entries.
    pub fn assess(features: &CVFeatureSet) -> Self {
        if features.is_empty() {
            return ExtractionConfidence::Low;
        }
        if features.warnings().is_empty() {
            return ExtractionConfidence::High;
        }

        let entries = features.experience().len();
        let low = features.experience().iter().filter(|e| e.confidence == Confidence::Low).count();
        if entries == 0 || (low as f32 / entries as f32) <= 0.5 {
            ExtractionConfidence::Medium
        } else {
            ExtractionConfidence::Low
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub skills: Vec<SkillMention>,
    pub unrecognized_terms: Vec<String>,
    pub total_years: f32,
    pub highest_degree: DegreeLevel,
    pub experience: Vec<ExperienceEntry>,
    pub education: Vec<EducationEntry>,
    pub contact: ContactInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Version of the evaluator that produced the report
    pub evaluator_version: String,

    /// Date open-ended roles were measured against
    pub reference_date: NaiveDate,

    /// Similarity backend used for fuzzy skill matching
    pub similarity: String,

    /// Number of canonical skills in the taxonomy
    pub taxonomy_size: usize,
}

impl ReportMetadata {
    pub fn new(reference_date: NaiveDate, similarity: &str, taxonomy_size: usize) -> Self {
        Self {
            evaluator_version: env!("CARGO_PKG_VERSION").to_string(),
            reference_date,
            similarity: similarity.to_string(),
            taxonomy_size,
        }
    }
}

impl EvaluationReport {
    pub fn from_evaluation(
        features: &CVFeatureSet,
        result: ScoreResult,
        gaps: Vec<GapItem>,
        model: Option<&RequirementModel>,
        metadata: ReportMetadata,
    ) -> Self {
        Self {
            mode: result.breakdown.mode,
            breakdown: result.breakdown,
            gaps,
            summary: None,
            confidence: ExtractionConfidence::assess(features),
            warnings: features.warnings().to_vec(),
            profile: Self::create_profile(features),
            job_title: model.and_then(|m| m.title().map(str::to_string)),
            requirement_outcomes: result.requirement_outcomes,
            constraint_checks: result.constraint_checks,
            unresolved_job_terms: model.map(|m| m.unresolved_terms().to_vec()).unwrap_or_default(),
            suggested_skills: result.suggested_skills,
            metadata,
        }
    }

    fn create_profile(features: &CVFeatureSet) -> CandidateProfile {
        CandidateProfile {
            skills: features.skills().to_vec(),
            unrecognized_terms: features.unrecognized_terms().to_vec(),
            total_years: features.total_years(),
            highest_degree: features.highest_degree(),
            experience: features.experience().to_vec(),
            education: features.education().to_vec(),
            contact: features.contact().clone(),
        }
    }

    pub fn with_summary(mut self, summary: Option<String>) -> Self {
        self.summary = summary;
        self
    }

    /// Score as a whole-number percentage of the maximum.
    pub fn percentage(&self) -> u8 {
        if self.breakdown.max_overall <= 0.0 {
            return 0;
        }
        (self.breakdown.overall / self.breakdown.max_overall * 100.0).round().clamp(0.0, 100.0) as u8
    }

    #[cfg(test)]
    pub(crate) fn placeholder() -> Self {
        let features = CVFeatureSet::empty(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap_or_default());
        let result = ScoreResult {
            breakdown: ScoreBreakdown {
                mode: ScoreMode::JobMatch,
                categories: Vec::new(),
                overall: 0.0,
                max_overall: 100.0,
            },
            requirement_outcomes: Vec::new(),
            constraint_checks: Vec::new(),
            suggested_skills: Vec::new(),
            adjustment_factor: 1.0,
        };
        Self::from_evaluation(&features, result, Vec::new(), None, ReportMetadata::new(features.reference_date(), "jaro_winkler", 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExperienceEntry, Seniority, WarningKind};

    fn entry(confidence: Confidence) -> ExperienceEntry {
        ExperienceEntry {
            title: "Analyst".to_string(),
            seniority: Seniority::Mid,
            period: None,
            skills: Vec::new(),
            achievements: Vec::new(),
            confidence,
            line: 1,
        }
    }

    fn warning() -> ExtractionWarning {
        ExtractionWarning { kind: WarningKind::UndatedExperience, line: 1, text: "Analyst".to_string() }
    }

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_confidence_levels() {
        assert_eq!(ExtractionConfidence::assess(&CVFeatureSet::empty(as_of())), ExtractionConfidence::Low);

        let clean = CVFeatureSet::new(Vec::new(), vec![entry(Confidence::High)], Vec::new(), as_of());
        assert_eq!(ExtractionConfidence::assess(&clean), ExtractionConfidence::High);

        let mixed = CVFeatureSet::new(
            Vec::new(),
            vec![entry(Confidence::High), entry(Confidence::Low)],
            Vec::new(),
            as_of(),
        )
        .with_warnings(vec![warning()]);
        assert_eq!(ExtractionConfidence::assess(&mixed), ExtractionConfidence::Medium);

        let poor = CVFeatureSet::new(
            Vec::new(),
            vec![entry(Confidence::Low), entry(Confidence::Low), entry(Confidence::High)],
            Vec::new(),
            as_of(),
        )
        .with_warnings(vec![warning(), warning()]);
        assert_eq!(ExtractionConfidence::assess(&poor), ExtractionConfidence::Low);
    }

    #[test]
    fn test_report_serializes_without_timestamps() {
        let report = EvaluationReport::placeholder();
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"reference_date\":\"2024-06-01\""));
        assert!(!json.contains("generated_at"));
        assert_eq!(report.percentage(), 0);
    }
}
