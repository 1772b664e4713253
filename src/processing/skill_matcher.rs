//! Dictionary scan of free text against the skill taxonomy

use crate::error::{CvEvaluatorError, Result};
use crate::processing::text_processor::is_word_bounded;
use crate::taxonomy::{SkillEntry, SkillMatch, SkillTaxonomy};
use aho_corasick::{AhoCorasick, MatchKind as AcMatchKind};
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

/// Surface forms this short must match with their original casing ("R", "Go").
const CASE_SENSITIVE_MAX_LEN: usize = 2;

#[derive(Debug, Clone)]
struct Pattern {
    entry: usize,
    originals: Vec<String>,
}

/// One skill occurrence in scanned text.
#[derive(Debug, Clone, Copy)]
pub struct SkillHit<'t, 's> {
    pub entry: &'t SkillEntry,
    pub start: usize,
    pub end: usize,
    pub text: &'s str,
}

pub struct SkillMatcher {
    taxonomy: Arc<SkillTaxonomy>,
    automaton: AhoCorasick,
    patterns: Vec<Pattern>,
}

impl SkillMatcher {
    pub fn new(taxonomy: Arc<SkillTaxonomy>) -> Result<Self> {
        let mut by_form: HashMap<String, usize> = HashMap::new();
        let mut forms: Vec<String> = Vec::new();
        let mut patterns: Vec<Pattern> = Vec::new();

        for (index, entry) in taxonomy.entries().iter().enumerate() {
            for form in entry.surface_forms() {
                let form = form.trim();
                if form.is_empty() {
                    continue;
                }
                let lower = form.to_lowercase();
                match by_form.get(&lower) {
                    Some(&slot) => patterns[slot].originals.push(form.to_string()),
                    None => {
                        by_form.insert(lower.clone(), patterns.len());
                        forms.push(lower);
                        patterns.push(Pattern {
                            entry: index,
                            originals: vec![form.to_string()],
                        });
                    }
                }
            }
        }

        let automaton = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(AcMatchKind::LeftmostLongest)
            .build(&forms)
            .map_err(|e| CvEvaluatorError::Configuration(format!("Failed to build skill matcher: {}", e)))?;

        debug!("Skill matcher built with {} surface forms", forms.len());

        Ok(Self {
            taxonomy,
            automaton,
            patterns,
        })
    }

    pub fn taxonomy(&self) -> &SkillTaxonomy {
        &self.taxonomy
    }

    /// Word-bounded, non-overlapping skill occurrences in `text`.
    pub fn find<'s>(&self, text: &'s str) -> Vec<SkillHit<'_, 's>> {
        self.automaton
            .find_iter(text)
            .filter_map(|m| {
                let (start, end) = (m.start(), m.end());
                let pattern = &self.patterns[m.pattern().as_usize()];
                let matched = &text[start..end];

                if !is_word_bounded(text, start, end) {
                    return None;
                }
                if matched.chars().count() <= CASE_SENSITIVE_MAX_LEN {
                    if !pattern.originals.iter().any(|o| o == matched) {
                        return None;
                    }
                    // "C-level", "R&D", "Go-to"
                    if matches!(text[end..].chars().next(), Some('-' | '&' | '\'')) {
                        return None;
                    }
                }

                Some(SkillHit {
                    entry: &self.taxonomy.entries()[pattern.entry],
                    start,
                    end,
                    text: matched,
                })
            })
            .collect()
    }

    /// Resolve a standalone term (exact, normalized or fuzzy).
    pub fn resolve(&self, term: &str) -> Option<SkillMatch<'_>> {
        self.taxonomy.normalize(term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::similarity::JaroWinkler;

    fn matcher() -> SkillMatcher {
        let taxonomy = SkillTaxonomy::builtin(Arc::new(JaroWinkler), 0.9).unwrap();
        SkillMatcher::new(Arc::new(taxonomy)).unwrap()
    }

    fn ids(matcher: &SkillMatcher, text: &str) -> Vec<String> {
        matcher.find(text).iter().map(|h| h.entry.id.to_string()).collect()
    }

    #[test]
    fn test_finds_skills_case_insensitively() {
        let m = matcher();
        assert_eq!(ids(&m, "python, SQL and tableau"), vec!["python", "sql", "tableau"]);
    }

    #[test]
    fn test_longest_match_wins() {
        let m = matcher();
        assert_eq!(ids(&m, "Built apps in React Native"), vec!["react_native"]);
        assert_eq!(ids(&m, "JavaScript and Java"), vec!["javascript", "java"]);
        assert_eq!(ids(&m, "C++ and C#"), vec!["cpp", "csharp"]);
    }

    #[test]
    fn test_word_boundaries() {
        let m = matcher();
        assert!(ids(&m, "We trust our sprint process").is_empty());
        assert_eq!(ids(&m, "Node.js services"), vec!["nodejs"]);
    }

    #[test]
    fn test_short_forms_are_case_sensitive() {
        let m = matcher();
        assert_eq!(ids(&m, "Statistics in R and Go"), vec!["r", "go"]);
        assert!(ids(&m, "let us go to the r&d lab").is_empty());
        assert!(ids(&m, "R&D budget").is_empty());
    }

    #[test]
    fn test_hit_offsets() {
        let m = matcher();
        let text = "Expert in Kubernetes";
        let hit = m.find(text)[0];
        assert_eq!(&text[hit.start..hit.end], "Kubernetes");
        assert_eq!(hit.text, "Kubernetes");
    }
}
