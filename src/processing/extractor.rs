//! CV feature extraction
//!
//! Turns plain CV text into a [`CVFeatureSet`]. Extraction is total: lines
//! that can't be understood become low-confidence entries plus warnings.

use super::credentials::{completion_status, detect_degree, detect_seniority, institution};
use super::dates::{nearest_years, scan_line, years_figures, DateScan};
use super::document::{segment, Line, Section, SectionKind, SegmentedDocument};
use super::skill_matcher::SkillMatcher;
use super::text_processor::{bullet_content, split_list_items, NormalizedText, TextProcessor};
use crate::model::{
    CVFeatureSet, CompletionStatus, Confidence, DegreeLevel, EducationEntry, EvidenceSpan, ExperienceEntry,
    ExtractionWarning, Period, Proficiency, Seniority, SkillMention, WarningKind,
};
use crate::taxonomy::SkillId;
use chrono::NaiveDate;
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

static STATED_YEARS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(\d{1,2}(?:\.\d+)?)\s*\+?\s*(?:years?|yrs?)\s+(?:of\s+)?(?:professional\s+|industry\s+|relevant\s+|work\s+|hands-on\s+)?experience\b",
    )
    .expect("Invalid stated years regex")
});

/// Skills-section items longer than this are prose, not list entries.
const MAX_ITEM_WORDS: usize = 4;

/// Title lines longer than this are treated as descriptions.
const MAX_TITLE_WORDS: usize = 10;

pub struct FeatureExtractor {
    matcher: Arc<SkillMatcher>,
    processor: TextProcessor,
    reference_date: NaiveDate,
}

#[derive(Default)]
struct SkillCollector {
    mentions: Vec<SkillMention>,
    index: HashMap<SkillId, usize>,
    unrecognized: Vec<String>,
}

impl SkillCollector {
    fn add(&mut self, mention: SkillMention) {
        match self.index.get(&mention.skill) {
            Some(&i) => self.mentions[i].merge(mention),
            None => {
                self.index.insert(mention.skill.clone(), self.mentions.len());
                self.mentions.push(mention);
            }
        }
    }

    fn add_unrecognized(&mut self, term: &str) {
        if !self.unrecognized.iter().any(|t| t.eq_ignore_ascii_case(term)) {
            self.unrecognized.push(term.to_string());
        }
    }
}

/// Experience entry under construction.
struct EntryDraft {
    title: String,
    period: Option<Period>,
    confidence: Confidence,
    line: usize,
    skills: Vec<SkillId>,
    achievements: Vec<String>,
}

impl EntryDraft {
    fn finish(self) -> ExperienceEntry {
        ExperienceEntry {
            seniority: detect_seniority(&self.title).unwrap_or(Seniority::Mid),
            title: self.title,
            period: self.period,
            skills: self.skills,
            achievements: self.achievements,
            confidence: self.confidence,
            line: self.line,
        }
    }

    fn add_skills(&mut self, skills: impl IntoIterator<Item = SkillId>) {
        for skill in skills {
            if !self.skills.contains(&skill) {
                self.skills.push(skill);
            }
        }
    }
}

impl FeatureExtractor {
    pub fn new(matcher: Arc<SkillMatcher>, reference_date: NaiveDate) -> Self {
        Self {
            matcher,
            processor: TextProcessor::new(),
            reference_date,
        }
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    /// Build the feature set. Never fails on formatting. Evidence spans are
    /// byte ranges into `text` as given.
    pub fn extract(&self, text: &str) -> CVFeatureSet {
        let normalized = self.processor.normalize_with_offsets(text);
        let doc = segment(normalized.as_str());
        let mut warnings = Vec::new();

        let skills = self.extract_skills(&doc, &normalized);
        let experience = self.extract_experience(&doc, &mut warnings);
        let education = self.extract_education(&doc);
        let stated_years = stated_years(normalized.as_str());

        info!(
            "Extracted {} skills, {} experience entries, {} education entries ({} warnings)",
            skills.mentions.len(),
            experience.len(),
            education.len(),
            warnings.len()
        );

        CVFeatureSet::new(skills.mentions, experience, education, self.reference_date)
            .with_unrecognized_terms(skills.unrecognized)
            .with_stated_years(stated_years)
            .with_contact(self.processor.extract_contact(normalized.as_str()))
            .with_stats(self.processor.stats(normalized.as_str()))
            .with_warnings(warnings)
    }

    fn extract_skills(&self, doc: &SegmentedDocument<'_>, normalized: &NormalizedText<'_>) -> SkillCollector {
        let mut collector = SkillCollector::default();

        for section in &doc.sections {
            for line in &section.lines {
                let figures = years_figures(line.text);
                let hits = self.matcher.find(line.text);
                let covered: Vec<(usize, usize)> = hits.iter().map(|hit| (hit.start, hit.end)).collect();

                for hit in hits {
                    let years = if section.kind == SectionKind::Skills {
                        nearest_years(&item_figures(line.text, &figures, hit.start), hit.start)
                    } else {
                        nearest_years(&figures, hit.start)
                    };
                    let proficiency = match years {
                        Some(_) => Proficiency::YearsQualified,
                        None if section.kind == SectionKind::Experience => Proficiency::Professional,
                        None => Proficiency::Mentioned,
                    };
                    collector.add(SkillMention {
                        skill: hit.entry.id.clone(),
                        name: hit.entry.name.clone(),
                        category: hit.entry.category,
                        proficiency,
                        years,
                        confidence: 1.0,
                        evidence: vec![evidence(normalized, line.offset + hit.start, line.offset + hit.end, &section.kind)],
                    });
                }

                if section.kind == SectionKind::Skills {
                    self.resolve_list_items(normalized, section, line, &covered, &figures, &mut collector);
                }
            }
        }

        debug!(
            "Skill scan: {} canonical skills, {} unrecognised terms",
            collector.mentions.len(),
            collector.unrecognized.len()
        );
        collector
    }

    /// Skills-list items the dictionary scan missed go through the normalizer
    /// (including fuzzy matching); the rest are kept as unrecognised terms.
    fn resolve_list_items(
        &self,
        normalized: &NormalizedText<'_>,
        section: &Section<'_>,
        line: &Line<'_>,
        covered: &[(usize, usize)],
        figures: &[(usize, f32)],
        collector: &mut SkillCollector,
    ) {
        let (base, content) = match bullet_content(line.text) {
            Some(content) => (line.text.len() - content.len(), content),
            None => (0, line.text),
        };
        for (offset, item) in split_list_items(content) {
            let start = base + offset;
            let end = start + item.len();
            if covered.iter().any(|(s, e)| *s < end && start < *e) {
                continue;
            }

            let term = clean_item(item);
            if term.is_empty() || term.split_whitespace().count() > MAX_ITEM_WORDS {
                continue;
            }

            match self.matcher.resolve(term) {
                Some(found) => {
                    let years = nearest_years(&item_figures(line.text, figures, start), start);
                    collector.add(SkillMention {
                        skill: found.entry.id.clone(),
                        name: found.entry.name.clone(),
                        category: found.entry.category,
                        proficiency: if years.is_some() { Proficiency::YearsQualified } else { Proficiency::Mentioned },
                        years,
                        confidence: found.confidence,
                        evidence: vec![evidence(normalized, line.offset + start, line.offset + end, &section.kind)],
                    });
                }
                None => collector.add_unrecognized(term),
            }
        }
    }

    fn extract_experience(&self, doc: &SegmentedDocument<'_>, warnings: &mut Vec<ExtractionWarning>) -> Vec<ExperienceEntry> {
        let sections: Vec<&Section<'_>> = if doc.has(SectionKind::Experience) {
            doc.sections_of(SectionKind::Experience).collect()
        } else {
            doc.sections
                .iter()
                .filter(|s| !matches!(s.kind, SectionKind::Education | SectionKind::Certifications))
                .collect()
        };

        let mut entries = Vec::new();
        for section in sections {
            entries.extend(self.parse_experience_section(section, warnings));
        }
        entries
    }

    /// Line state machine: a dated line opens an entry, bullets attach to it,
    /// and a short undated line is remembered as the title of what follows.
    fn parse_experience_section(&self, section: &Section<'_>, warnings: &mut Vec<ExtractionWarning>) -> Vec<ExperienceEntry> {
        let mut entries = Vec::new();
        let mut current: Option<EntryDraft> = None;
        let mut pending_title: Option<(usize, String)> = None;

        for line in &section.lines {
            let line_skills = self.skill_ids(line.text);

            if let Some(content) = bullet_content(line.text) {
                // A title line after the previous entry's bullets starts an undated entry;
                // right after a dated line it is only a company or location line.
                let starts_entry = pending_title.is_some()
                    && current.as_ref().map_or(true, |draft| !draft.achievements.is_empty());
                if starts_entry {
                    if let Some((number, title)) = pending_title.take() {
                        if let Some(done) = current.take() {
                            entries.push(done.finish());
                        }
                        warnings.push(ExtractionWarning {
                            kind: WarningKind::UndatedExperience,
                            line: number,
                            text: title.clone(),
                        });
                        current = Some(EntryDraft {
                            title,
                            period: None,
                            confidence: Confidence::Low,
                            line: number,
                            skills: Vec::new(),
                            achievements: Vec::new(),
                        });
                    }
                }
                if let Some(draft) = current.as_mut() {
                    draft.achievements.push(content.to_string());
                    draft.add_skills(line_skills);
                    pending_title = None;
                }
                continue;
            }

            match scan_line(line.text) {
                DateScan::Range { period, span } => {
                    if let Some(done) = current.take() {
                        entries.push(done.finish());
                    }
                    let title = pending_title
                        .take()
                        .map(|(_, t)| t)
                        .unwrap_or_else(|| title_from_line(line.text, span));
                    let mut draft = EntryDraft {
                        title,
                        period: Some(period),
                        confidence: Confidence::High,
                        line: line.number,
                        skills: Vec::new(),
                        achievements: Vec::new(),
                    };
                    draft.add_skills(line_skills);
                    current = Some(draft);
                }
                DateScan::Ambiguous { kind, span } => {
                    if let Some(done) = current.take() {
                        entries.push(done.finish());
                    }
                    debug!("Line {}: {} in '{}'", line.number, kind, line.text);
                    warnings.push(ExtractionWarning {
                        kind,
                        line: line.number,
                        text: line.text.to_string(),
                    });
                    let title = pending_title
                        .take()
                        .map(|(_, t)| t)
                        .unwrap_or_else(|| title_from_line(line.text, span));
                    let mut draft = EntryDraft {
                        title,
                        period: None,
                        confidence: Confidence::Low,
                        line: line.number,
                        skills: Vec::new(),
                        achievements: Vec::new(),
                    };
                    draft.add_skills(line_skills);
                    current = Some(draft);
                }
                DateScan::NoDate => {
                    let words = line.text.split_whitespace().count();
                    if words > MAX_TITLE_WORDS {
                        if let Some(draft) = current.as_mut() {
                            draft.achievements.push(line.text.to_string());
                            draft.add_skills(line_skills);
                        }
                    } else if pending_title.is_none() {
                        pending_title = Some((line.number, line.text.to_string()));
                    }
                }
            }
        }

        if let Some(done) = current.take() {
            entries.push(done.finish());
        }
        entries
    }

    fn skill_ids(&self, text: &str) -> Vec<SkillId> {
        let mut ids: Vec<SkillId> = Vec::new();
        for hit in self.matcher.find(text) {
            if !ids.contains(&hit.entry.id) {
                ids.push(hit.entry.id.clone());
            }
        }
        ids
    }

    fn extract_education(&self, doc: &SegmentedDocument<'_>) -> Vec<EducationEntry> {
        let mut entries: Vec<EducationEntry> = Vec::new();

        for section in &doc.sections {
            match section.kind {
                SectionKind::Education | SectionKind::Unsegmented => {
                    for line in &section.lines {
                        let text = bullet_content(line.text).unwrap_or(line.text);
                        match detect_degree(text) {
                            Some(found) => entries.push(EducationEntry {
                                level: found.level,
                                field: found.field,
                                institution: found.institution,
                                status: found.status,
                                confidence: Confidence::High,
                            }),
                            // "State University, 2018" on the line after the degree
                            None if section.kind == SectionKind::Education => {
                                if let Some(last) = entries.last_mut() {
                                    if last.institution.is_none() {
                                        last.institution = institution(text);
                                    }
                                    if last.status == CompletionStatus::Unknown {
                                        last.status = completion_status(text);
                                    }
                                }
                            }
                            None => {}
                        }
                    }
                }
                SectionKind::Certifications => {
                    for line in &section.lines {
                        let text = bullet_content(line.text).unwrap_or(line.text);
                        entries.push(EducationEntry {
                            level: DegreeLevel::Certificate,
                            field: Some(text.to_string()),
                            institution: None,
                            status: match completion_status(text) {
                                CompletionStatus::InProgress => CompletionStatus::InProgress,
                                _ => CompletionStatus::Completed,
                            },
                            confidence: Confidence::High,
                        });
                    }
                }
                _ => {}
            }
        }
        entries
    }
}

/// Evidence for `start..end` of the normalized text, located in the source.
fn evidence(normalized: &NormalizedText<'_>, start: usize, end: usize, section: &SectionKind) -> EvidenceSpan {
    let range = normalized.source_range(start, end);
    EvidenceSpan {
        text: normalized.source()[range.clone()].to_string(),
        start: range.start,
        end: range.end,
        section: section.clone(),
    }
}

/// Years figures inside the list item that contains `position`.
fn item_figures(line: &str, figures: &[(usize, f32)], position: usize) -> Vec<(usize, f32)> {
    split_list_items(line)
        .into_iter()
        .map(|(start, item)| (start, start + item.len()))
        .find(|(start, end)| (*start..*end).contains(&position))
        .map(|(start, end)| figures.iter().copied().filter(|(pos, _)| (start..end).contains(pos)).collect())
        .unwrap_or_default()
}

/// Strip parentheticals and a leading `Label:` from a list item.
fn clean_item(item: &str) -> &str {
    let without_paren = item.split('(').next().unwrap_or(item);
    let without_label = match without_paren.find(':') {
        Some(idx) => &without_paren[idx + 1..],
        None => without_paren,
    };
    without_label.trim().trim_end_matches('.').trim()
}

/// Title from a dated line: the text before the first separator once the
/// dates are cut out ("Data Analyst, Acme, 2019 - 2021" -> "Data Analyst").
fn title_from_line(line: &str, span: (usize, usize)) -> String {
    let remainder = format!("{} {}", &line[..span.0], &line[span.1..]);
    let remainder = remainder.trim().trim_matches(|c: char| matches!(c, '(' | ')' | '|' | ',' | '-' | ' '));
    // Byte offsets found in `lower` index `remainder`
    let lower = remainder.to_ascii_lowercase();

    let mut end = remainder.len();
    for separator in ["|", ",", " at ", "@", " - ", "("] {
        if let Some(idx) = lower.find(separator) {
            end = end.min(idx);
        }
    }
    remainder[..end].trim().to_string()
}

/// Largest "N years of experience" claim in the text.
fn stated_years(text: &str) -> Option<f32> {
    STATED_YEARS_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<f32>().ok())
        .filter(|years| *years > 0.0 && *years <= 50.0)
        .fold(None, |best: Option<f32>, y| Some(best.map_or(y, |b| b.max(y))))
}
