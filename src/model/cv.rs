//! Features extracted from a CV

use crate::processing::document::SectionKind;
use crate::taxonomy::{SkillCategory, SkillId};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Proficiency {
    Mentioned,
    Professional,
    YearsQualified,
}

impl fmt::Display for Proficiency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Proficiency::Mentioned => write!(f, "mentioned"),
            Proficiency::Professional => write!(f, "used professionally"),
            Proficiency::YearsQualified => write!(f, "years-qualified"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Seniority {
    Entry,
    Junior,
    Mid,
    Senior,
    Lead,
    Principal,
    Executive,
}

impl Seniority {
    pub fn rank(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for Seniority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Seniority::Entry => "Entry",
            Seniority::Junior => "Junior",
            Seniority::Mid => "Mid-level",
            Seniority::Senior => "Senior",
            Seniority::Lead => "Lead",
            Seniority::Principal => "Principal",
            Seniority::Executive => "Executive",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DegreeLevel {
    None,
    Certificate,
    Associate,
    Bachelor,
    Master,
    Doctorate,
}

impl DegreeLevel {
    pub fn rank(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for DegreeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DegreeLevel::None => "None",
            DegreeLevel::Certificate => "Certificate",
            DegreeLevel::Associate => "Associate degree",
            DegreeLevel::Bachelor => "Bachelor's degree",
            DegreeLevel::Master => "Master's degree",
            DegreeLevel::Doctorate => "Doctorate",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    Completed,
    InProgress,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Low,
}

/// Where in the source text a skill was seen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceSpan {
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub section: SectionKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillMention {
    pub skill: SkillId,
    pub name: String,
    pub category: SkillCategory,
    pub proficiency: Proficiency,
    pub years: Option<f32>,
    pub confidence: f32,
    pub evidence: Vec<EvidenceSpan>,
}

impl SkillMention {
    /// Fold a repeated mention of the same skill into this one.
    pub fn merge(&mut self, other: SkillMention) {
        self.proficiency = self.proficiency.max(other.proficiency);
        self.years = match (self.years, other.years) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        self.confidence = self.confidence.max(other.confidence);
        self.evidence.extend(other.evidence);
    }
}

/// Months are counted as `year * 12 + (month - 1)`.
pub fn month_index(year: i32, month: u32) -> i32 {
    year * 12 + (month as i32 - 1)
}

pub fn month_index_of(date: NaiveDate) -> i32 {
    month_index(date.year(), date.month())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodEnd {
    /// Exclusive month index.
    Closed(i32),
    Open,
}

/// A half-open span of months `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    start: i32,
    end: PeriodEnd,
}

impl Period {
    /// `None` when the range runs backwards.
    pub fn new(start: i32, end: PeriodEnd) -> Option<Self> {
        match end {
            PeriodEnd::Closed(end) if end < start => None,
            _ => Some(Self { start, end }),
        }
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn end(&self) -> PeriodEnd {
        self.end
    }

    pub fn is_open(&self) -> bool {
        matches!(self.end, PeriodEnd::Open)
    }

    /// Concrete `[start, end)` with open ends closed at the reference month (inclusive).
    pub fn resolve(&self, as_of: i32) -> (i32, i32) {
        let end = match self.end {
            PeriodEnd::Closed(end) => end,
            PeriodEnd::Open => as_of + 1,
        };
        (self.start, end.max(self.start))
    }

    pub fn months(&self, as_of: i32) -> u32 {
        let (start, end) = self.resolve(as_of);
        (end - start) as u32
    }
}

/// Length of the union of all periods, so overlaps count once.
pub fn union_months<'a>(periods: impl IntoIterator<Item = &'a Period>, as_of: i32) -> u32 {
    let mut spans: Vec<(i32, i32)> = periods
        .into_iter()
        .map(|p| p.resolve(as_of))
        .filter(|(start, end)| end > start)
        .collect();
    spans.sort_unstable();

    let mut total = 0u32;
    let mut current: Option<(i32, i32)> = None;
    for (start, end) in spans {
        current = match current {
            Some((cs, ce)) if start <= ce => Some((cs, ce.max(end))),
            Some((cs, ce)) => {
                total += (ce - cs) as u32;
                Some((start, end))
            }
            None => Some((start, end)),
        };
    }
    if let Some((cs, ce)) = current {
        total += (ce - cs) as u32;
    }
    total
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub title: String,
    pub seniority: Seniority,
    /// `None` when the entry could not be dated.
    pub period: Option<Period>,
    pub skills: Vec<SkillId>,
    pub achievements: Vec<String>,
    pub confidence: Confidence,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    pub level: DegreeLevel,
    pub field: Option<String>,
    pub institution: Option<String>,
    pub status: CompletionStatus,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub emails: Vec<String>,
    pub phones: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStats {
    pub characters: usize,
    pub words: usize,
    pub lines: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    UnparseableDateRange,
    InvertedDateRange,
    UndatedExperience,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningKind::UnparseableDateRange => write!(f, "unparseable date range"),
            WarningKind::InvertedDateRange => write!(f, "end date before start date"),
            WarningKind::UndatedExperience => write!(f, "experience entry without dates"),
        }
    }
}

/// Something the extractor recovered from instead of failing on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionWarning {
    pub kind: WarningKind,
    pub line: usize,
    pub text: String,
}

/// Everything the scorer needs to know about one CV. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CVFeatureSet {
    skills: Vec<SkillMention>,
    experience: Vec<ExperienceEntry>,
    education: Vec<EducationEntry>,
    unrecognized_terms: Vec<String>,
    stated_years: Option<f32>,
    contact: ContactInfo,
    stats: TextStats,
    warnings: Vec<ExtractionWarning>,
    reference_date: NaiveDate,
    total_experience_months: u32,
}

impl CVFeatureSet {
    pub fn new(
        skills: Vec<SkillMention>,
        experience: Vec<ExperienceEntry>,
        education: Vec<EducationEntry>,
        reference_date: NaiveDate,
    ) -> Self {
        let as_of = month_index_of(reference_date);
        let total_experience_months = union_months(experience.iter().filter_map(|e| e.period.as_ref()), as_of);

        Self {
            skills,
            experience,
            education,
            unrecognized_terms: Vec::new(),
            stated_years: None,
            contact: ContactInfo::default(),
            stats: TextStats::default(),
            warnings: Vec::new(),
            reference_date,
            total_experience_months,
        }
    }

    pub fn empty(reference_date: NaiveDate) -> Self {
        Self::new(Vec::new(), Vec::new(), Vec::new(), reference_date)
    }

    pub fn with_unrecognized_terms(mut self, terms: Vec<String>) -> Self {
        self.unrecognized_terms = terms;
        self
    }

    pub fn with_stated_years(mut self, years: Option<f32>) -> Self {
        self.stated_years = years;
        self
    }

    pub fn with_contact(mut self, contact: ContactInfo) -> Self {
        self.contact = contact;
        self
    }

    pub fn with_stats(mut self, stats: TextStats) -> Self {
        self.stats = stats;
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<ExtractionWarning>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn skills(&self) -> &[SkillMention] {
        &self.skills
    }

    pub fn skill(&self, id: &SkillId) -> Option<&SkillMention> {
        self.skills.iter().find(|m| &m.skill == id)
    }

    pub fn experience(&self) -> &[ExperienceEntry] {
        &self.experience
    }

    pub fn education(&self) -> &[EducationEntry] {
        &self.education
    }

    pub fn unrecognized_terms(&self) -> &[String] {
        &self.unrecognized_terms
    }

    pub fn stated_years(&self) -> Option<f32> {
        self.stated_years
    }

    pub fn contact(&self) -> &ContactInfo {
        &self.contact
    }

    pub fn stats(&self) -> TextStats {
        self.stats
    }

    pub fn warnings(&self) -> &[ExtractionWarning] {
        &self.warnings
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    pub fn total_experience_months(&self) -> u32 {
        self.total_experience_months
    }

    /// Union of dated periods, or the stated claim if that is larger.
    pub fn total_years(&self) -> f32 {
        let from_periods = self.total_experience_months as f32 / 12.0;
        match self.stated_years {
            Some(stated) => from_periods.max(stated),
            None => from_periods,
        }
    }

    pub fn distinct_skill_count(&self) -> usize {
        self.skills.len()
    }

    pub fn highest_degree(&self) -> DegreeLevel {
        self.education
            .iter()
            .filter(|e| e.level != DegreeLevel::Certificate)
            .map(|e| e.level)
            .max()
            .unwrap_or(DegreeLevel::None)
    }

    /// Highest level counting certificates too, for requirement checks.
    pub fn highest_credential(&self) -> DegreeLevel {
        self.education.iter().map(|e| e.level).max().unwrap_or(DegreeLevel::None)
    }

    pub fn certification_count(&self) -> usize {
        self.education.iter().filter(|e| e.level == DegreeLevel::Certificate).count()
    }

    /// Highest seniority across experience entries.
    pub fn peak_seniority(&self) -> Option<Seniority> {
        self.experience.iter().map(|e| e.seniority).max()
    }

    /// Seniority increases between consecutive dated entries, oldest first.
    pub fn seniority_steps(&self) -> u32 {
        let mut dated: Vec<(i32, Seniority)> = self
            .experience
            .iter()
            .filter_map(|e| e.period.map(|p| (p.start(), e.seniority)))
            .collect();
        dated.sort_by_key(|(start, _)| *start);
        dated
            .windows(2)
            .filter(|w| w[1].1 > w[0].1)
            .map(|w| (w[1].1.rank() - w[0].1.rank()) as u32)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty() && self.experience.is_empty() && self.education.is_empty()
    }
}
