//! Gap items and remediation advice derived from a score result

use crate::config::RecommendationConfig;
use crate::model::{Proficiency, RequirementTier};
use crate::scoring::{
    ConstraintCheck, ConstraintKind, RequirementOutcome, RequirementStatus, ScoreCategory, ScoreMode, ScoreResult,
};
use log::debug;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Minor,
    Moderate,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Minor => write!(f, "Minor"),
            Severity::Moderate => write!(f, "Moderate"),
            Severity::Critical => write!(f, "Critical"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapKind {
    MissingSkill,
    InsufficientProficiency,
    ExperienceShortfall,
    EducationShortfall,
    SeniorityShortfall,
    WeakCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapItem {
    pub kind: GapKind,
    /// Skill name, constraint or category the gap is about
    pub subject: String,
    pub severity: Severity,
    pub tier: Option<RequirementTier>,
    pub remediation: String,
    /// Position of the originating requirement, constraint or category
    pub declared_index: usize,
}

pub struct RecommendationComposer {
    config: RecommendationConfig,
}

impl RecommendationComposer {
    pub fn new(config: RecommendationConfig) -> Self {
        Self { config }
    }

    /// Ordered by severity, then tier (must-have first, untiered last), then
    /// declaration order, and cut to the configured maximum. Requirement
    /// outcomes keep the job's declaration order, so the result alone decides.
    pub fn compose(&self, result: &ScoreResult) -> Vec<GapItem> {
        let mut items = match result.breakdown.mode {
            ScoreMode::JobMatch => job_match_gaps(result),
            ScoreMode::General => self.general_gaps(result),
        };

        items.sort_by(compare);
        if items.len() > self.config.max_items {
            debug!("Dropping {} lowest-priority gaps", items.len() - self.config.max_items);
        }
        items.truncate(self.config.max_items);
        items
    }

    fn severity_for(&self, ratio: f32) -> Option<Severity> {
        if ratio < self.config.critical_ratio {
            Some(Severity::Critical)
        } else if ratio < self.config.moderate_ratio {
            Some(Severity::Moderate)
        } else if ratio < self.config.minor_ratio {
            Some(Severity::Minor)
        } else {
            None
        }
    }

    fn general_gaps(&self, result: &ScoreResult) -> Vec<GapItem> {
        result
            .breakdown
            .categories
            .iter()
            .enumerate()
            .filter_map(|(index, category)| {
                let severity = self.severity_for(category.ratio())?;
                let remediation = match category.category {
                    ScoreCategory::Skills => {
                        let names: Vec<&str> = result.suggested_skills.iter().map(|s| s.name.as_str()).collect();
                        if names.is_empty() {
                            "Name your tools and technologies explicitly in a skills section".to_string()
                        } else {
                            format!("Consider building and listing in-demand skills: {}", names.join(", "))
                        }
                    }
                    ScoreCategory::Experience => {
                        "List each role with a title and a start and end date (month and year) so experience can be counted"
                            .to_string()
                    }
                    ScoreCategory::Education => {
                        "State degrees and certifications with their level, field and completion status".to_string()
                    }
                    other => format!("Improve {}", other),
                };
                Some(GapItem {
                    kind: GapKind::WeakCategory,
                    subject: format!("{} ({:.1} of {:.0})", category.category, category.score, category.max),
                    severity,
                    tier: None,
                    remediation,
                    declared_index: index,
                })
            })
            .collect()
    }
}

fn job_match_gaps(result: &ScoreResult) -> Vec<GapItem> {
    let skill_count = result.requirement_outcomes.len();
    let skills = result
        .requirement_outcomes
        .iter()
        .enumerate()
        .filter_map(|(index, outcome)| skill_gap(index, outcome));
    let constraints = result
        .constraint_checks
        .iter()
        .filter(|check| !check.met)
        .enumerate()
        .map(|(offset, check)| constraint_gap(skill_count + offset, check));
    skills.chain(constraints).collect()
}

fn skill_gap(index: usize, outcome: &RequirementOutcome) -> Option<GapItem> {
    let requirement = &outcome.requirement;
    let (kind, severity) = match (outcome.status, requirement.tier) {
        (RequirementStatus::Satisfied, _) => return None,
        (RequirementStatus::Unmet, RequirementTier::MustHave) => (GapKind::MissingSkill, Severity::Critical),
        (RequirementStatus::UnderSatisfied, RequirementTier::MustHave) => {
            (GapKind::InsufficientProficiency, Severity::Moderate)
        }
        (RequirementStatus::Unmet, RequirementTier::NiceToHave) => (GapKind::MissingSkill, Severity::Minor),
        (RequirementStatus::UnderSatisfied, RequirementTier::NiceToHave) => {
            (GapKind::InsufficientProficiency, Severity::Minor)
        }
    };

    let remediation = match (kind, requirement.min_years) {
        (GapKind::MissingSkill, _) => format!(
            "Add {} to your skills and show where you used it, if you have this experience",
            requirement.name
        ),
        (_, Some(years)) => match outcome.matched_years {
            Some(found) => format!(
                "The role asks for {} years of {}; the CV shows {:.1}. Make the duration explicit",
                years, requirement.name, found
            ),
            None => format!("State how many years you have used {} (the role asks for {})", requirement.name, years),
        },
        _ => match requirement.min_proficiency {
            Some(Proficiency::YearsQualified) => {
                format!("State how long you have worked with {}", requirement.name)
            }
            _ => format!(
                "Show {} in a role description, not only in a skills list",
                requirement.name
            ),
        },
    };

    Some(GapItem {
        kind,
        subject: requirement.name.clone(),
        severity,
        tier: Some(requirement.tier),
        remediation,
        declared_index: index,
    })
}

fn constraint_gap(index: usize, check: &ConstraintCheck) -> GapItem {
    let (kind, remediation) = match check.kind {
        ConstraintKind::Experience => (
            GapKind::ExperienceShortfall,
            format!(
                "The role asks for {}; the CV shows {}. Make sure every role is dated",
                check.required, check.actual
            ),
        ),
        ConstraintKind::Education => (
            GapKind::EducationShortfall,
            format!(
                "The role asks for {}; the highest level found is {}. List any equivalent qualifications",
                check.required, check.actual
            ),
        ),
        ConstraintKind::Seniority => (
            GapKind::SeniorityShortfall,
            format!(
                "The role is {} level; the CV shows {}. Highlight leadership and ownership in recent roles",
                check.required, check.actual
            ),
        ),
    };

    GapItem {
        kind,
        subject: check.kind.to_string(),
        severity: Severity::Moderate,
        tier: Some(RequirementTier::MustHave),
        remediation,
        declared_index: index,
    }
}

fn tier_rank(tier: Option<RequirementTier>) -> u8 {
    match tier {
        Some(RequirementTier::MustHave) => 0,
        Some(RequirementTier::NiceToHave) => 1,
        None => 2,
    }
}

fn compare(a: &GapItem, b: &GapItem) -> Ordering {
    b.severity
        .cmp(&a.severity)
        .then_with(|| tier_rank(a.tier).cmp(&tier_rank(b.tier)))
        .then_with(|| a.declared_index.cmp(&b.declared_index))
}
