//! Requirement model construction
//!
//! Free-text job descriptions are read line by line and sentence by
//! sentence. Tier cues ("required", "a plus") are scoped to the clause they
//! appear in, then to the sentence, then to the header block above. Skills
//! with no cue at all fall back to a positional rule.

use super::credentials::{degree_levels, detect_seniority};
use super::dates::{nearest_years, years_figures};
use super::skill_matcher::SkillMatcher;
use super::text_processor::{bullet_content, TextProcessor};
use crate::error::Result;
use crate::model::{DegreeLevel, JobInput, RequirementModel, RequirementTemplate, RequirementTier, SkillRequirement};
use crate::taxonomy::{MarketDemand, SkillId};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::Arc;
use unicode_segmentation::UnicodeSegmentation;

static MUST_CUE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:must[- ]haves?|must|required|requires|essential|mandatory)\b").expect("Invalid cue regex")
});

static NICE_CUE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:nice[- ]to[- ]haves?|preferred|preferably|a\s+plus|bonus|desirable|ideally|optional)\b")
        .expect("Invalid cue regex")
});

/// Header labels that introduce must-have blocks without a cue word.
const MUST_HEADERS: &[&str] = &[
    "requirements",
    "qualifications",
    "what you need",
    "what you'll need",
    "what you bring",
    "what you'll bring",
    "you have",
];

const MAX_HEADER_WORDS: usize = 6;

/// Floor for demand-derived weights so every requirement counts.
const MIN_WEIGHT: f32 = 0.05;

#[derive(Debug, Clone)]
struct Draft {
    skill: SkillId,
    name: String,
    tier: Option<RequirementTier>,
    min_years: Option<f32>,
}

pub struct RequirementModelBuilder {
    matcher: Arc<SkillMatcher>,
    demand: Arc<dyn MarketDemand>,
    unmarked_limit: usize,
    processor: TextProcessor,
}

impl RequirementModelBuilder {
    pub fn new(matcher: Arc<SkillMatcher>, demand: Arc<dyn MarketDemand>, unmarked_limit: usize) -> Self {
        Self {
            matcher,
            demand,
            unmarked_limit,
            processor: TextProcessor::new(),
        }
    }

    /// Build the model. The result is not validated; an empty model is
    /// returned as-is and rejected when it is scored.
    pub fn build(&self, job: &JobInput) -> Result<RequirementModel> {
        let model = match job {
            JobInput::Text(text) => self.from_text(text)?,
            JobInput::Template(template) => self.from_template(template)?,
        };
        info!(
            "Requirement model: {} must-have, {} nice-to-have, {} soft skills",
            model.must_haves().count(),
            model.nice_to_haves().count(),
            model.soft_skills().len()
        );
        Ok(model)
    }

    fn weight_of(&self, skill: &SkillId) -> f32 {
        self.demand.demand_weight(skill).max(MIN_WEIGHT)
    }

    fn from_text(&self, text: &str) -> Result<RequirementModel> {
        let normalized = self.processor.normalize(text);
        let lines: Vec<&str> = normalized.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

        let title = lines.first().map(|line| job_title(line));
        let min_seniority = title.as_deref().and_then(detect_seniority);

        let mut drafts: Vec<Draft> = Vec::new();
        let mut soft_skills: Vec<String> = Vec::new();
        let mut mode: Option<RequirementTier> = None;
        let mut role_years: Option<f32> = None;
        let mut first_figure: Option<f32> = None;

        for (index, line) in lines.iter().enumerate() {
            let content = bullet_content(line).unwrap_or(line);
            let has_skills = !self.matcher.find(content).is_empty();

            if index > 0 && !has_skills {
                if let Some(header_tier) = header_mode(content) {
                    debug!("Header '{}' sets tier {:?}", content, header_tier);
                    mode = header_tier;
                    continue;
                }
            }

            for sentence in content.split_sentence_bounds() {
                let figures = years_figures(sentence);
                if first_figure.is_none() {
                    first_figure = figures.first().map(|(_, years)| *years);
                }

                let hits = self.matcher.find(sentence);
                let hard: Vec<_> = hits.iter().filter(|hit| !hit.entry.is_soft()).collect();
                if hard.is_empty() {
                    if role_years.is_none() {
                        role_years = figures.first().map(|(_, years)| *years);
                    }
                } else {
                    debug!("Sentence '{}' names {} skills", sentence.trim(), hard.len());
                }

                for hit in &hits {
                    if hit.entry.is_soft() {
                        if !soft_skills.contains(&hit.entry.name) {
                            soft_skills.push(hit.entry.name.clone());
                        }
                        continue;
                    }

                    let tier = cue_tier(sentence, hit.start).or(mode);
                    let draft = Draft {
                        skill: hit.entry.id.clone(),
                        name: hit.entry.name.clone(),
                        tier,
                        min_years: nearest_years(&figures, hit.start),
                    };
                    merge_draft(&mut drafts, draft);
                }
            }
        }

        let requirements = self.resolve_tiers(drafts);
        let min_education = degree_levels(&normalized)
            .into_iter()
            .filter(|level| *level > DegreeLevel::Certificate)
            .min();

        Ok(RequirementModel::new(requirements)?
            .with_title(title)
            .with_min_years(role_years.or(first_figure))
            .with_min_seniority(min_seniority)
            .with_min_education(min_education)
            .with_soft_skills(soft_skills))
    }

    /// Unmarked skills: the first few are must-have, the rest nice-to-have.
    fn resolve_tiers(&self, drafts: Vec<Draft>) -> Vec<SkillRequirement> {
        let mut unmarked = 0;
        drafts
            .into_iter()
            .map(|draft| {
                let tier = draft.tier.unwrap_or_else(|| {
                    unmarked += 1;
                    if unmarked <= self.unmarked_limit {
                        RequirementTier::MustHave
                    } else {
                        RequirementTier::NiceToHave
                    }
                });
                let weight = self.weight_of(&draft.skill);
                let requirement = SkillRequirement::new(draft.skill, draft.name, tier, weight);
                match draft.min_years {
                    Some(years) => requirement.with_min_years(years),
                    None => requirement,
                }
            })
            .collect()
    }

    fn from_template(&self, template: &RequirementTemplate) -> Result<RequirementModel> {
        let weights = self.resolve_keyed(&template.weights, "weight");
        let skill_years = self.resolve_keyed(&template.skill_years, "years");

        let mut requirements = Vec::new();
        let mut soft_skills: Vec<String> = Vec::new();
        let mut unresolved: Vec<String> = Vec::new();

        let tiers = [
            (RequirementTier::MustHave, &template.must_have),
            (RequirementTier::NiceToHave, &template.nice_to_have),
        ];
        for (tier, terms) in tiers {
            for term in terms {
                match self.matcher.resolve(term) {
                    Some(found) if found.entry.is_soft() => {
                        if !soft_skills.contains(&found.entry.name) {
                            soft_skills.push(found.entry.name.clone());
                        }
                    }
                    Some(found) => {
                        let id = found.entry.id.clone();
                        let weight = weights.get(&id).copied().unwrap_or_else(|| self.weight_of(&id));
                        let requirement = SkillRequirement::new(id.clone(), found.entry.name.clone(), tier, weight);
                        requirements.push(match skill_years.get(&id) {
                            Some(years) => requirement.with_min_years(*years),
                            None => requirement,
                        });
                    }
                    None => {
                        warn!("Job template skill '{}' is not in the taxonomy; ignoring it", term);
                        unresolved.push(term.clone());
                    }
                }
            }
        }

        for term in &template.soft_skills {
            let name = match self.matcher.resolve(term) {
                Some(found) => found.entry.name.clone(),
                None => term.trim().to_string(),
            };
            if !name.is_empty() && !soft_skills.contains(&name) {
                soft_skills.push(name);
            }
        }

        Ok(RequirementModel::new(requirements)?
            .with_title(template.title.clone())
            .with_min_years(template.min_years)
            .with_min_seniority(template.min_seniority)
            .with_min_education(template.min_education)
            .with_soft_skills(soft_skills)
            .with_unresolved_terms(unresolved))
    }

    fn resolve_keyed(&self, values: &BTreeMap<String, f32>, what: &str) -> BTreeMap<SkillId, f32> {
        let mut resolved = BTreeMap::new();
        for (term, value) in values {
            match self.matcher.resolve(term) {
                Some(found) => {
                    resolved.insert(found.entry.id.clone(), *value);
                }
                None => warn!("Ignoring {} for unknown skill '{}'", what, term),
            }
        }
        resolved
    }
}

/// A repeat keeps the first position; must-have beats nice-to-have beats unmarked.
fn merge_draft(drafts: &mut Vec<Draft>, draft: Draft) {
    match drafts.iter_mut().find(|d| d.skill == draft.skill) {
        Some(existing) => {
            existing.tier = match (existing.tier, draft.tier) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };
            existing.min_years = match (existing.min_years, draft.min_years) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (a, b) => a.or(b),
            };
        }
        None => drafts.push(draft),
    }
}

/// Cues as (position, tier), in text order.
fn cues(text: &str) -> Vec<(usize, RequirementTier)> {
    let mut found: Vec<(usize, RequirementTier)> = MUST_CUE_RE
        .find_iter(text)
        .map(|m| (m.start(), RequirementTier::MustHave))
        .chain(NICE_CUE_RE.find_iter(text).map(|m| (m.start(), RequirementTier::NiceToHave)))
        .collect();
    found.sort_by_key(|(pos, _)| *pos);
    found
}

/// Nearest preceding cue, else the first following one.
fn nearest_cue(cues: &[(usize, RequirementTier)], position: usize) -> Option<RequirementTier> {
    cues.iter()
        .filter(|(pos, _)| *pos <= position)
        .last()
        .or_else(|| cues.iter().find(|(pos, _)| *pos > position))
        .map(|(_, tier)| *tier)
}

/// The tier a sentence assigns to the skill at `position`: cues in the same
/// clause first, then anywhere in the sentence.
fn cue_tier(sentence: &str, position: usize) -> Option<RequirementTier> {
    let clause_start = sentence[..position].rfind([',', ';']).map_or(0, |idx| idx + 1);
    let clause_end = sentence[position..].find([',', ';']).map_or(sentence.len(), |idx| position + idx);
    let clause = &sentence[clause_start..clause_end];

    nearest_cue(&cues(clause), position - clause_start).or_else(|| nearest_cue(&cues(sentence), position))
}

/// `Some(tier mode)` when the line is a block header such as
/// `Nice to have:` or `Requirements`; `Some(None)` for other headers.
fn header_mode(line: &str) -> Option<Option<RequirementTier>> {
    let words = line.split_whitespace().count();
    if words == 0 || words > MAX_HEADER_WORDS {
        return None;
    }

    let label = line.trim_end_matches(':').trim();
    let lower = label.to_lowercase();
    let has_cue = MUST_CUE_RE.is_match(label) || NICE_CUE_RE.is_match(label);
    let title_case = label
        .split_whitespace()
        .all(|w| w.chars().next().map_or(false, |c| !c.is_alphabetic() || c.is_uppercase()));
    let is_header = line.ends_with(':') || (!label.ends_with('.') && (title_case || has_cue));
    if !is_header {
        return None;
    }

    if NICE_CUE_RE.is_match(label) {
        Some(Some(RequirementTier::NiceToHave))
    } else if MUST_CUE_RE.is_match(label) || MUST_HEADERS.iter().any(|h| lower.contains(h)) {
        Some(Some(RequirementTier::MustHave))
    } else {
        Some(None)
    }
}

/// "Job Title: Data Analyst" -> "Data Analyst"
fn job_title(line: &str) -> String {
    let line = bullet_content(line).unwrap_or(line);
    match line.split_once(':') {
        Some((label, rest)) if label.split_whitespace().count() <= 2 && !rest.trim().is_empty() => {
            rest.trim().to_string()
        }
        _ => line.to_string(),
    }
}
