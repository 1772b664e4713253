//! General-quality scoring: skills, experience and education on a 100-point scale

use super::{round2, CategoryScore, ScoreBreakdown, ScoreCategory, ScoreMode, ScoreResult, SuggestedSkill};
use crate::config::GeneralScoringConfig;
use crate::error::Result;
use crate::model::{CVFeatureSet, CompletionStatus, DegreeLevel, Proficiency};
use crate::taxonomy::{MarketDemand, SkillTaxonomy};
use log::debug;
use std::sync::Arc;

pub const SKILLS_MAX: f32 = 50.0;
pub const EXPERIENCE_MAX: f32 = 30.0;
pub const EDUCATION_MAX: f32 = 20.0;

pub struct GeneralScorer {
    config: GeneralScoringConfig,
    taxonomy: Arc<SkillTaxonomy>,
    demand: Arc<dyn MarketDemand>,
}

impl GeneralScorer {
    pub fn new(config: GeneralScoringConfig, taxonomy: Arc<SkillTaxonomy>, demand: Arc<dyn MarketDemand>) -> Self {
        Self {
            config,
            taxonomy,
            demand,
        }
    }

    pub fn score(&self, features: &CVFeatureSet) -> Result<ScoreResult> {
        let skills = round2(self.skills_score(features));
        let experience = round2(self.experience_score(features));
        let education = round2(self.education_score(features));
        debug!("General subscores: skills {}, experience {}, education {}", skills, experience, education);

        let breakdown = ScoreBreakdown {
            mode: ScoreMode::General,
            categories: vec![
                CategoryScore { category: ScoreCategory::Skills, score: skills, max: SKILLS_MAX },
                CategoryScore { category: ScoreCategory::Experience, score: experience, max: EXPERIENCE_MAX },
                CategoryScore { category: ScoreCategory::Education, score: education, max: EDUCATION_MAX },
            ],
            overall: round2(skills + experience + education),
            max_overall: SKILLS_MAX + EXPERIENCE_MAX + EDUCATION_MAX,
        };
        breakdown.verify()?;

        Ok(ScoreResult {
            breakdown,
            requirement_outcomes: Vec::new(),
            constraint_checks: Vec::new(),
            suggested_skills: self.suggested_skills(features),
            adjustment_factor: 1.0,
        })
    }

    fn proficiency_factor(&self, proficiency: Proficiency) -> f32 {
        match proficiency {
            Proficiency::Mentioned => self.config.mentioned_factor,
            Proficiency::Professional => self.config.professional_factor,
            Proficiency::YearsQualified => self.config.years_qualified_factor,
        }
    }

    fn skills_score(&self, features: &CVFeatureSet) -> f32 {
        let raw: f32 = features
            .skills()
            .iter()
            .map(|m| self.config.skill_points * self.demand.demand_weight(&m.skill) * self.proficiency_factor(m.proficiency))
            .sum();
        raw.min(SKILLS_MAX)
    }

    /// Linear up to the ceiling, a slower slope after it, plus a capped
    /// bonus for visible seniority progression.
    fn experience_score(&self, features: &CVFeatureSet) -> f32 {
        let c = &self.config;
        let years = features.total_years();
        let base = years.min(c.experience_ceiling_years) * c.points_per_year
            + (years - c.experience_ceiling_years).max(0.0) * c.tail_points_per_year;
        let progression = (features.seniority_steps() as f32 * c.points_per_seniority_step).min(c.max_progression_points);
        (base + progression).min(EXPERIENCE_MAX)
    }

    fn level_points(&self, level: DegreeLevel) -> f32 {
        let c = &self.config;
        match level {
            DegreeLevel::None => 0.0,
            DegreeLevel::Certificate => c.certificate_points,
            DegreeLevel::Associate => c.associate_points,
            DegreeLevel::Bachelor => c.bachelor_points,
            DegreeLevel::Master => c.master_points,
            DegreeLevel::Doctorate => c.doctorate_points,
        }
    }

    fn education_score(&self, features: &CVFeatureSet) -> f32 {
        let c = &self.config;
        let best = features
            .education()
            .iter()
            .map(|e| {
                let factor = if e.status == CompletionStatus::InProgress { c.in_progress_factor } else { 1.0 };
                self.level_points(e.level) * factor
            })
            .fold(0.0_f32, f32::max);
        let certifications =
            (features.certification_count() as f32 * c.points_per_certification).min(c.max_certification_bonus);
        (best + certifications).min(EDUCATION_MAX)
    }

    /// Highest-demand hard skills the CV does not show.
    fn suggested_skills(&self, features: &CVFeatureSet) -> Vec<SuggestedSkill> {
        self.demand
            .ranked()
            .into_iter()
            .filter(|(id, _)| features.skill(id).is_none())
            .filter_map(|(id, demand)| {
                let entry = self.taxonomy.get(&id)?;
                (!entry.is_soft()).then(|| SuggestedSkill {
                    skill: id.clone(),
                    name: entry.name.clone(),
                    demand,
                })
            })
            .take(self.config.suggested_skills)
            .collect()
    }
}
