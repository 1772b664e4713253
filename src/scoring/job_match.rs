//! Job-match scoring: weighted requirement fulfillment, adjusted by
//! role-level constraints

use super::{
    round2, CategoryScore, ConstraintCheck, ConstraintKind, RequirementOutcome, RequirementStatus, ScoreBreakdown,
    ScoreCategory, ScoreMode, ScoreResult,
};
use crate::config::JobMatchConfig;
use crate::error::Result;
use crate::model::{CVFeatureSet, DegreeLevel, Proficiency, RequirementModel, RequirementTier, SkillRequirement};
use log::debug;

pub struct JobMatchScorer {
    config: JobMatchConfig,
}

impl JobMatchScorer {
    pub fn new(config: JobMatchConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, features: &CVFeatureSet, model: &RequirementModel) -> Result<ScoreResult> {
        model.validate()?;
        let c = &self.config;

        let outcomes: Vec<RequirementOutcome> =
            model.requirements().iter().map(|r| self.assess(features, r)).collect();

        let mut earned = 0.0;
        let mut possible = 0.0;
        let mut unmet_must = 0;
        for outcome in &outcomes {
            let multiplier = match outcome.requirement.tier {
                RequirementTier::MustHave => c.must_have_multiplier,
                RequirementTier::NiceToHave => 1.0,
            };
            earned += multiplier * outcome.credit * outcome.requirement.weight;
            possible += multiplier * outcome.requirement.weight;
            if outcome.requirement.tier == RequirementTier::MustHave && outcome.status == RequirementStatus::Unmet {
                unmet_must += 1;
            }
        }
        let coverage = if possible > 0.0 { (earned / possible).min(1.0) } else { 0.0 };
        let fulfillment = round2(
            (c.fulfillment_points * coverage * c.unmet_must_have_penalty.powi(unmet_must)).max(c.floor),
        );

        let checks = constraint_checks(features, model);
        let compat = if checks.is_empty() {
            1.0
        } else {
            checks.iter().map(|check| check.ratio).sum::<f32>() / checks.len() as f32
        };
        let factor = 1.0 - c.max_adjustment * (1.0 - compat);

        let overall = round2(fulfillment * factor);
        let gap_penalty = round2(fulfillment - overall);
        debug!(
            "Job match: coverage {:.3}, {} unmet must-haves, fulfillment {}, factor {:.3}",
            coverage, unmet_must, fulfillment, factor
        );

        let breakdown = ScoreBreakdown {
            mode: ScoreMode::JobMatch,
            categories: vec![
                CategoryScore { category: ScoreCategory::Fulfillment, score: fulfillment, max: c.fulfillment_points },
                CategoryScore { category: ScoreCategory::GapPenalty, score: gap_penalty, max: c.fulfillment_points },
            ],
            overall,
            max_overall: c.fulfillment_points,
        };
        breakdown.verify()?;

        Ok(ScoreResult {
            breakdown,
            requirement_outcomes: outcomes,
            constraint_checks: checks,
            suggested_skills: Vec::new(),
            adjustment_factor: factor,
        })
    }

    /// A mention without its own years figure counts the whole career when
    /// the skill was used professionally.
    fn assess(&self, features: &CVFeatureSet, requirement: &SkillRequirement) -> RequirementOutcome {
        let Some(mention) = features.skill(&requirement.skill) else {
            return RequirementOutcome {
                requirement: requirement.clone(),
                status: RequirementStatus::Unmet,
                matched_proficiency: None,
                matched_years: None,
                credit: 0.0,
            };
        };

        let years = mention
            .years
            .or_else(|| (mention.proficiency >= Proficiency::Professional).then(|| features.total_years()));
        let satisfied = match requirement.min_years {
            Some(required) => years.map_or(false, |y| y >= required),
            None => requirement.min_proficiency.map_or(true, |p| mention.proficiency >= p),
        };

        let (status, credit) = if satisfied {
            (RequirementStatus::Satisfied, 1.0)
        } else {
            (RequirementStatus::UnderSatisfied, self.config.partial_credit)
        };

        RequirementOutcome {
            requirement: requirement.clone(),
            status,
            matched_proficiency: Some(mention.proficiency),
            matched_years: years,
            credit,
        }
    }
}

fn constraint_checks(features: &CVFeatureSet, model: &RequirementModel) -> Vec<ConstraintCheck> {
    let mut checks = Vec::new();

    if let Some(required) = model.min_years().filter(|y| *y > 0.0) {
        let actual = features.total_years();
        checks.push(ConstraintCheck {
            kind: ConstraintKind::Experience,
            required: format!("{} years", required),
            actual: format!("{:.1} years", actual),
            ratio: (actual / required).min(1.0),
            met: actual >= required,
        });
    }

    if let Some(required) = model.min_education().filter(|level| *level > DegreeLevel::None) {
        let actual = features.highest_credential();
        let met = actual >= required;
        checks.push(ConstraintCheck {
            kind: ConstraintKind::Education,
            required: required.to_string(),
            actual: actual.to_string(),
            ratio: if met { 1.0 } else { actual.rank() as f32 / required.rank() as f32 },
            met,
        });
    }

    if let Some(required) = model.min_seniority() {
        let actual = features.peak_seniority();
        let met = actual.map_or(false, |a| a >= required);
        let ratio = match actual {
            _ if met => 1.0,
            Some(a) => (a.rank() + 1) as f32 / (required.rank() + 1) as f32,
            None => 0.0,
        };
        checks.push(ConstraintCheck {
            kind: ConstraintKind::Seniority,
            required: required.to_string(),
            actual: actual.map_or_else(|| "none".to_string(), |a| a.to_string()),
            ratio,
            met,
        });
    }

    checks
}
