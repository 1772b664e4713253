//! Scoring engine: general-quality and job-match scorers, ranking, and the
//! result types they share

pub mod general;
pub mod job_match;
pub mod ranking;

use crate::error::{CvEvaluatorError, Result};
use crate::model::{Proficiency, SkillRequirement};
use crate::taxonomy::SkillId;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use general::GeneralScorer;
pub use job_match::JobMatchScorer;
pub use ranking::{rank, RankedCandidate};

/// Tolerance for comparing rounded sums.
const SUM_TOLERANCE: f32 = 0.011;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreMode {
    General,
    JobMatch,
}

impl fmt::Display for ScoreMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreMode::General => write!(f, "General evaluation"),
            ScoreMode::JobMatch => write!(f, "Job match"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreCategory {
    Skills,
    Experience,
    Education,
    Fulfillment,
    GapPenalty,
}

impl fmt::Display for ScoreCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreCategory::Skills => write!(f, "Skills"),
            ScoreCategory::Experience => write!(f, "Experience"),
            ScoreCategory::Education => write!(f, "Education"),
            ScoreCategory::Fulfillment => write!(f, "Requirement fulfillment"),
            ScoreCategory::GapPenalty => write!(f, "Gap penalty"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: ScoreCategory,
    pub score: f32,
    pub max: f32,
}

impl CategoryScore {
    pub fn ratio(&self) -> f32 {
        if self.max > 0.0 {
            self.score / self.max
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub mode: ScoreMode,
    pub categories: Vec<CategoryScore>,
    pub overall: f32,
    pub max_overall: f32,
}

impl ScoreBreakdown {
    pub fn category(&self, category: ScoreCategory) -> Option<&CategoryScore> {
        self.categories.iter().find(|c| c.category == category)
    }

    pub fn score_of(&self, category: ScoreCategory) -> f32 {
        self.category(category).map_or(0.0, |c| c.score)
    }

    /// Check every bound the scorers promise. A failure is a defect in the
    /// scoring code and is never clamped away.
    pub fn verify(&self) -> Result<()> {
        let violation = |msg: String| Err(CvEvaluatorError::ScoringInvariantViolation(msg));

        if !self.overall.is_finite() || !self.max_overall.is_finite() {
            return violation(format!("non-finite overall score {} / {}", self.overall, self.max_overall));
        }
        if self.overall < 0.0 {
            return violation(format!("negative overall score {}", self.overall));
        }
        if self.overall > self.max_overall + f32::EPSILON {
            return violation(format!("overall {} exceeds maximum {}", self.overall, self.max_overall));
        }

        for c in &self.categories {
            if !c.score.is_finite() || !c.max.is_finite() {
                return violation(format!("{} score is not finite", c.category));
            }
            if c.score < 0.0 {
                return violation(format!("{} score is negative ({})", c.category, c.score));
            }
            if c.score > c.max + f32::EPSILON {
                return violation(format!("{} score {} exceeds its maximum {}", c.category, c.score, c.max));
            }
        }

        match self.mode {
            ScoreMode::General => {
                let sum: f32 = self.categories.iter().map(|c| c.score).sum();
                if (sum - self.overall).abs() > SUM_TOLERANCE {
                    return violation(format!("category sum {} differs from overall {}", sum, self.overall));
                }
            }
            ScoreMode::JobMatch => {
                let fulfillment = self.score_of(ScoreCategory::Fulfillment);
                let gap = self.score_of(ScoreCategory::GapPenalty);
                if gap > fulfillment + f32::EPSILON {
                    return violation(format!("gap penalty {} exceeds fulfillment {}", gap, fulfillment));
                }
                if (fulfillment - gap - self.overall).abs() > SUM_TOLERANCE {
                    return violation(format!(
                        "overall {} is not fulfillment {} minus gap penalty {}",
                        self.overall, fulfillment, gap
                    ));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementStatus {
    Unmet,
    UnderSatisfied,
    Satisfied,
}

impl fmt::Display for RequirementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequirementStatus::Satisfied => write!(f, "satisfied"),
            RequirementStatus::UnderSatisfied => write!(f, "partially satisfied"),
            RequirementStatus::Unmet => write!(f, "missing"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementOutcome {
    pub requirement: SkillRequirement,
    pub status: RequirementStatus,
    pub matched_proficiency: Option<Proficiency>,
    pub matched_years: Option<f32>,
    pub credit: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    Experience,
    Education,
    Seniority,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintKind::Experience => write!(f, "Years of experience"),
            ConstraintKind::Education => write!(f, "Education level"),
            ConstraintKind::Seniority => write!(f, "Seniority"),
        }
    }
}

/// A role-level constraint compared against the CV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintCheck {
    pub kind: ConstraintKind,
    pub required: String,
    pub actual: String,
    /// Fraction of the requirement met, in `[0, 1]`
    pub ratio: f32,
    pub met: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedSkill {
    pub skill: SkillId,
    pub name: String,
    pub demand: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub breakdown: ScoreBreakdown,
    pub requirement_outcomes: Vec<RequirementOutcome>,
    pub constraint_checks: Vec<ConstraintCheck>,
    pub suggested_skills: Vec<SuggestedSkill>,
    /// 1.0 in general mode
    pub adjustment_factor: f32,
}

/// Scores are reported with two decimals.
pub fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn general(skills: f32, experience: f32, education: f32, overall: f32) -> ScoreBreakdown {
        ScoreBreakdown {
            mode: ScoreMode::General,
            categories: vec![
                CategoryScore { category: ScoreCategory::Skills, score: skills, max: 50.0 },
                CategoryScore { category: ScoreCategory::Experience, score: experience, max: 30.0 },
                CategoryScore { category: ScoreCategory::Education, score: education, max: 20.0 },
            ],
            overall,
            max_overall: 100.0,
        }
    }

    fn job(fulfillment: f32, gap: f32, overall: f32) -> ScoreBreakdown {
        ScoreBreakdown {
            mode: ScoreMode::JobMatch,
            categories: vec![
                CategoryScore { category: ScoreCategory::Fulfillment, score: fulfillment, max: 100.0 },
                CategoryScore { category: ScoreCategory::GapPenalty, score: gap, max: 100.0 },
            ],
            overall,
            max_overall: 100.0,
        }
    }

    #[test]
    fn test_valid_breakdowns_verify() {
        assert!(general(0.0, 0.0, 0.0, 0.0).verify().is_ok());
        assert!(general(40.5, 12.25, 12.0, 64.75).verify().is_ok());
        assert!(job(80.0, 5.0, 75.0).verify().is_ok());
    }

    #[test]
    fn test_violations_are_reported() {
        let cases = [
            general(51.0, 0.0, 0.0, 51.0),
            general(-1.0, 0.0, 0.0, -1.0),
            general(10.0, 10.0, 10.0, 35.0),
            general(f32::NAN, 0.0, 0.0, 0.0),
            job(10.0, 20.0, 0.0),
            job(80.0, 5.0, 80.0),
        ];
        for breakdown in cases {
            assert!(
                matches!(breakdown.verify(), Err(CvEvaluatorError::ScoringInvariantViolation(_))),
                "expected violation for {:?}",
                breakdown
            );
        }
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(12.345_6), 12.35);
        assert_eq!(round2(0.0), 0.0);
    }
}
