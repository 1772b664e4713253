//! What a job asks for

use super::cv::{DegreeLevel, Proficiency, Seniority};
use crate::error::{CvEvaluatorError, Result};
use crate::taxonomy::SkillId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

/// Must-have sorts before nice-to-have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementTier {
    MustHave,
    NiceToHave,
}

impl fmt::Display for RequirementTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequirementTier::MustHave => write!(f, "must-have"),
            RequirementTier::NiceToHave => write!(f, "nice-to-have"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRequirement {
    pub skill: SkillId,
    pub name: String,
    pub tier: RequirementTier,
    pub weight: f32,
    pub min_proficiency: Option<Proficiency>,
    pub min_years: Option<f32>,
}

impl SkillRequirement {
    pub fn new(skill: SkillId, name: impl Into<String>, tier: RequirementTier, weight: f32) -> Self {
        Self {
            skill,
            name: name.into(),
            tier,
            weight,
            min_proficiency: None,
            min_years: None,
        }
    }

    pub fn with_min_years(mut self, years: f32) -> Self {
        self.min_years = Some(years);
        self.min_proficiency = Some(Proficiency::YearsQualified);
        self
    }

    pub fn with_min_proficiency(mut self, proficiency: Proficiency) -> Self {
        self.min_proficiency = Some(proficiency);
        self
    }
}

/// A job's requirements. Immutable once built; skills keep declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementModel {
    title: Option<String>,
    requirements: Vec<SkillRequirement>,
    min_years: Option<f32>,
    min_seniority: Option<Seniority>,
    min_education: Option<DegreeLevel>,
    soft_skills: Vec<String>,
    unresolved_terms: Vec<String>,
}

impl RequirementModel {
    /// Rejects a skill listed under both tiers. Same-tier repeats keep the first.
    pub fn new(requirements: Vec<SkillRequirement>) -> Result<Self> {
        let mut seen: HashMap<SkillId, RequirementTier> = HashMap::new();
        let mut deduped = Vec::with_capacity(requirements.len());

        for requirement in requirements {
            match seen.get(&requirement.skill) {
                Some(tier) if *tier != requirement.tier => {
                    return Err(CvEvaluatorError::Configuration(format!(
                        "Skill '{}' is listed as both {} and {}",
                        requirement.skill, tier, requirement.tier
                    )));
                }
                Some(_) => continue,
                None => {
                    seen.insert(requirement.skill.clone(), requirement.tier);
                    deduped.push(requirement);
                }
            }
        }

        Ok(Self {
            title: None,
            requirements: deduped,
            min_years: None,
            min_seniority: None,
            min_education: None,
            soft_skills: Vec::new(),
            unresolved_terms: Vec::new(),
        })
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    pub fn with_min_years(mut self, years: Option<f32>) -> Self {
        self.min_years = years;
        self
    }

    pub fn with_min_seniority(mut self, seniority: Option<Seniority>) -> Self {
        self.min_seniority = seniority;
        self
    }

    pub fn with_min_education(mut self, level: Option<DegreeLevel>) -> Self {
        self.min_education = level;
        self
    }

    pub fn with_soft_skills(mut self, tags: Vec<String>) -> Self {
        self.soft_skills = tags;
        self
    }

    pub fn with_unresolved_terms(mut self, terms: Vec<String>) -> Self {
        self.unresolved_terms = terms;
        self
    }

    /// Fulfillment is undefined against nothing, so an empty model is a configuration error.
    pub fn validate(&self) -> Result<()> {
        if self.requirements.is_empty() {
            return Err(CvEvaluatorError::Configuration(
                "Requirement model contains no skill requirements".to_string(),
            ));
        }
        if let Some(bad) = self.requirements.iter().find(|r| !r.weight.is_finite() || r.weight <= 0.0) {
            return Err(CvEvaluatorError::Configuration(format!(
                "Requirement '{}' has non-positive weight {}",
                bad.skill, bad.weight
            )));
        }
        Ok(())
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn requirements(&self) -> &[SkillRequirement] {
        &self.requirements
    }

    pub fn must_haves(&self) -> impl Iterator<Item = &SkillRequirement> {
        self.requirements.iter().filter(|r| r.tier == RequirementTier::MustHave)
    }

    pub fn nice_to_haves(&self) -> impl Iterator<Item = &SkillRequirement> {
        self.requirements.iter().filter(|r| r.tier == RequirementTier::NiceToHave)
    }

    pub fn min_years(&self) -> Option<f32> {
        self.min_years
    }

    pub fn min_seniority(&self) -> Option<Seniority> {
        self.min_seniority
    }

    pub fn min_education(&self) -> Option<DegreeLevel> {
        self.min_education
    }

    pub fn soft_skills(&self) -> &[String] {
        &self.soft_skills
    }

    pub fn unresolved_terms(&self) -> &[String] {
        &self.unresolved_terms
    }
}

/// Structured job description: explicit lists, no inference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequirementTemplate {
    pub title: Option<String>,
    pub must_have: Vec<String>,
    pub nice_to_have: Vec<String>,
    pub min_years: Option<f32>,
    pub min_seniority: Option<Seniority>,
    pub min_education: Option<DegreeLevel>,
    pub soft_skills: Vec<String>,
    /// Per-skill weight overriding market demand
    pub weights: BTreeMap<String, f32>,
    /// Per-skill minimum years
    pub skill_years: BTreeMap<String, f32>,
}

impl RequirementTemplate {
    /// TOML or JSON, chosen by file extension.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "toml" => toml::from_str(&content).map_err(|e| {
                CvEvaluatorError::Configuration(format!("Failed to parse job template {}: {}", path.display(), e))
            }),
            "json" => serde_json::from_str(&content).map_err(|e| {
                CvEvaluatorError::Configuration(format!("Failed to parse job template {}: {}", path.display(), e))
            }),
            other => Err(CvEvaluatorError::UnsupportedFormat(format!(
                "Job template must be .toml or .json, got '.{}'",
                other
            ))),
        }
    }
}

/// A job description as handed to the evaluator.
#[derive(Debug, Clone, PartialEq)]
pub enum JobInput {
    Text(String),
    Template(RequirementTemplate),
}

impl From<&str> for JobInput {
    fn from(text: &str) -> Self {
        JobInput::Text(text.to_string())
    }
}

impl From<RequirementTemplate> for JobInput {
    fn from(template: RequirementTemplate) -> Self {
        JobInput::Template(template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn req(id: &str, tier: RequirementTier) -> SkillRequirement {
        SkillRequirement::new(SkillId::new(id), id, tier, 1.0)
    }

    #[test]
    fn test_conflicting_tiers_rejected() {
        let err = RequirementModel::new(vec![
            req("python", RequirementTier::MustHave),
            req("python", RequirementTier::NiceToHave),
        ])
        .unwrap_err();
        assert!(matches!(err, CvEvaluatorError::Configuration(_)));
    }

    #[test]
    fn test_same_tier_repeat_keeps_first() {
        let model = RequirementModel::new(vec![
            req("python", RequirementTier::MustHave),
            req("sql", RequirementTier::NiceToHave),
            req("python", RequirementTier::MustHave),
        ])
        .unwrap();
        let ids: Vec<&str> = model.requirements().iter().map(|r| r.skill.as_str()).collect();
        assert_eq!(ids, vec!["python", "sql"]);
        assert_eq!(model.must_haves().count(), 1);
        assert_eq!(model.nice_to_haves().count(), 1);
    }

    #[test]
    fn test_empty_model_fails_validation() {
        let model = RequirementModel::new(Vec::new()).unwrap();
        assert!(matches!(model.validate(), Err(CvEvaluatorError::Configuration(_))));
    }

    #[test]
    fn test_template_from_toml_and_json() {
        let mut toml_file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            toml_file,
            "title = \"Data Analyst\"\nmust_have = [\"Python\", \"SQL\"]\nnice_to_have = [\"Tableau\"]\nmin_years = 3.0\nmin_education = \"bachelor\""
        )
        .unwrap();
        let template = RequirementTemplate::load(toml_file.path()).unwrap();
        assert_eq!(template.must_have, vec!["Python", "SQL"]);
        assert_eq!(template.min_education, Some(DegreeLevel::Bachelor));

        let mut json_file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(json_file, r#"{{"must_have": ["Rust"], "min_seniority": "senior"}}"#).unwrap();
        let template = RequirementTemplate::load(json_file.path()).unwrap();
        assert_eq!(template.must_have, vec!["Rust"]);
        assert_eq!(template.min_seniority, Some(Seniority::Senior));
    }
}
