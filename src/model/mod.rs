//! Domain types shared by the extractor, the requirement builder and the scorer

pub mod cv;
pub mod requirement;

pub use cv::{
    CVFeatureSet, CompletionStatus, Confidence, ContactInfo, DegreeLevel, EducationEntry, EvidenceSpan,
    ExperienceEntry, ExtractionWarning, Period, PeriodEnd, Proficiency, Seniority, SkillMention, TextStats,
    WarningKind,
};
pub use requirement::{JobInput, RequirementModel, RequirementTemplate, RequirementTier, SkillRequirement};
