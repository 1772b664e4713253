//! Skill taxonomy: canonical skills, their synonyms, and the normalizer
//! that maps raw phrases onto them.

pub mod builtin;
pub mod market;
pub mod similarity;

use crate::error::{CvEvaluatorError, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

pub use market::{DemandTable, MarketDemand};
pub use similarity::Similarity;

/// Canonical, lowercase skill identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillId(String);

impl SkillId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SkillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillCategory {
    ProgrammingLanguage,
    Framework,
    Database,
    Cloud,
    Tool,
    DataScience,
    Web,
    Mobile,
    DevOps,
    Soft,
}

impl SkillCategory {
    /// Demand weight used when neither the entry nor the market table has one.
    pub fn default_demand(&self) -> f32 {
        match self {
            SkillCategory::ProgrammingLanguage => 1.0,
            SkillCategory::Cloud | SkillCategory::DataScience => 0.9,
            SkillCategory::Database | SkillCategory::DevOps => 0.85,
            SkillCategory::Framework => 0.8,
            SkillCategory::Mobile => 0.75,
            SkillCategory::Web => 0.7,
            SkillCategory::Tool => 0.6,
            SkillCategory::Soft => 0.4,
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        let key = name.trim().to_lowercase().replace([' ', '-'], "_");
        match key.as_str() {
            "programming_language" | "programming_languages" | "language" => Some(SkillCategory::ProgrammingLanguage),
            "framework" | "frameworks" => Some(SkillCategory::Framework),
            "database" | "databases" => Some(SkillCategory::Database),
            "cloud" | "cloud_platforms" => Some(SkillCategory::Cloud),
            "tool" | "tools" => Some(SkillCategory::Tool),
            "data_science" => Some(SkillCategory::DataScience),
            "web" | "web_technologies" => Some(SkillCategory::Web),
            "mobile" | "mobile_development" => Some(SkillCategory::Mobile),
            "devops" => Some(SkillCategory::DevOps),
            "soft" | "soft_skills" => Some(SkillCategory::Soft),
            _ => None,
        }
    }
}

impl fmt::Display for SkillCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SkillCategory::ProgrammingLanguage => "Programming Languages",
            SkillCategory::Framework => "Frameworks",
            SkillCategory::Database => "Databases",
            SkillCategory::Cloud => "Cloud Platforms",
            SkillCategory::Tool => "Tools & Software",
            SkillCategory::DataScience => "Data Science",
            SkillCategory::Web => "Web Technologies",
            SkillCategory::Mobile => "Mobile Development",
            SkillCategory::DevOps => "DevOps",
            SkillCategory::Soft => "Soft Skills",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillEntry {
    pub id: SkillId,
    pub name: String,
    pub category: SkillCategory,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demand: Option<f32>,
}

impl SkillEntry {
    pub fn new(id: &str, name: &str, category: SkillCategory, synonyms: &[&str]) -> Self {
        Self {
            id: SkillId::new(id),
            name: name.to_string(),
            category,
            synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
            demand: None,
        }
    }

    pub fn with_demand(mut self, demand: f32) -> Self {
        self.demand = Some(demand);
        self
    }

    /// Name and synonyms, as written. These are what the text scanner looks for.
    pub fn surface_forms(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.synonyms.iter().map(|s| s.as_str()))
    }

    pub fn is_soft(&self) -> bool {
        self.category == SkillCategory::Soft
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchKind {
    Exact,
    Normalized,
    Fuzzy,
}

#[derive(Debug, Clone, Copy)]
pub struct SkillMatch<'t> {
    pub entry: &'t SkillEntry,
    pub confidence: f32,
    pub kind: MatchKind,
}

#[derive(Debug, Deserialize)]
struct TaxonomyFile {
    skills: Vec<SkillEntry>,
}

/// Case- and punctuation-insensitive lookup key. `+` and `#` survive so
/// C, C++ and C# stay distinct.
pub fn normalize_key(raw: &str) -> String {
    let mapped: String = raw
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '+' || c == '#' {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect::<String>()
        .to_lowercase();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Read-only skill vocabulary. Built once, shared behind an `Arc`.
pub struct SkillTaxonomy {
    entries: Vec<SkillEntry>,
    exact: HashMap<String, usize>,
    normalized: HashMap<String, usize>,
    similarity: Arc<dyn Similarity>,
    fuzzy_floor: f32,
}

impl fmt::Debug for SkillTaxonomy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkillTaxonomy")
            .field("entries", &self.entries.len())
            .field("similarity", &self.similarity.name())
            .field("fuzzy_floor", &self.fuzzy_floor)
            .finish()
    }
}

impl SkillTaxonomy {
    pub fn new(entries: Vec<SkillEntry>, similarity: Arc<dyn Similarity>, fuzzy_floor: f32) -> Result<Self> {
        if entries.is_empty() {
            return Err(CvEvaluatorError::Configuration("Skill taxonomy is empty".to_string()));
        }
        if !(fuzzy_floor > 0.0 && fuzzy_floor <= 1.0) {
            return Err(CvEvaluatorError::Configuration(format!(
                "Fuzzy similarity floor must be in (0, 1], got {}",
                fuzzy_floor
            )));
        }

        let mut ids: HashMap<SkillId, usize> = HashMap::new();
        let mut exact = HashMap::new();
        let mut normalized: HashMap<String, usize> = HashMap::new();

        let entries: Vec<SkillEntry> = entries
            .into_iter()
            .map(|mut e| {
                e.id = SkillId::new(e.id.as_str());
                e
            })
            .collect();

        for (index, entry) in entries.iter().enumerate() {
            if entry.id.as_str().is_empty() {
                return Err(CvEvaluatorError::Configuration(format!(
                    "Skill '{}' has an empty identifier",
                    entry.name
                )));
            }
            if let Some(demand) = entry.demand {
                if !(0.0..=1.0).contains(&demand) {
                    return Err(CvEvaluatorError::Configuration(format!(
                        "Skill '{}' has demand {} outside [0, 1]",
                        entry.id, demand
                    )));
                }
            }
            if let Some(previous) = ids.insert(entry.id.clone(), index) {
                return Err(CvEvaluatorError::Configuration(format!(
                    "Skill identifier '{}' is declared twice (entries {} and {})",
                    entry.id, previous, index
                )));
            }

            let forms = std::iter::once(entry.id.as_str()).chain(entry.surface_forms());
            for form in forms {
                let key = normalize_key(form);
                if key.is_empty() {
                    continue;
                }
                match normalized.get(&key) {
                    Some(&owner) if owner != index => {
                        return Err(CvEvaluatorError::Configuration(format!(
                            "Surface form '{}' maps to both '{}' and '{}'",
                            form, entries[owner].id, entry.id
                        )));
                    }
                    Some(_) => {}
                    None => {
                        normalized.insert(key, index);
                    }
                }
                exact.entry(form.trim().to_string()).or_insert(index);
            }
        }

        debug!("Skill taxonomy ready: {} skills, {} lookup keys", entries.len(), normalized.len());

        Ok(Self {
            entries,
            exact,
            normalized,
            similarity,
            fuzzy_floor,
        })
    }

    pub fn builtin(similarity: Arc<dyn Similarity>, fuzzy_floor: f32) -> Result<Self> {
        Self::new(builtin::builtin_entries(), similarity, fuzzy_floor)
    }

    /// Load a `[[skills]]` TOML vocabulary. Any failure is a configuration error.
    pub fn load(path: &Path, similarity: Arc<dyn Similarity>, fuzzy_floor: f32) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CvEvaluatorError::Configuration(format!("Failed to read taxonomy {}: {}", path.display(), e))
        })?;
        let file: TaxonomyFile = toml::from_str(&content).map_err(|e| {
            CvEvaluatorError::Configuration(format!("Failed to parse taxonomy {}: {}", path.display(), e))
        })?;
        Self::new(file.skills, similarity, fuzzy_floor)
    }

    /// Map a raw phrase to a canonical skill: exact, then normalized, then fuzzy.
    pub fn normalize(&self, raw: &str) -> Option<SkillMatch<'_>> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        if let Some(&index) = self.exact.get(trimmed) {
            return Some(SkillMatch {
                entry: &self.entries[index],
                confidence: 1.0,
                kind: MatchKind::Exact,
            });
        }

        let key = normalize_key(trimmed);
        if key.is_empty() {
            return None;
        }
        if let Some(&index) = self.normalized.get(&key) {
            return Some(SkillMatch {
                entry: &self.entries[index],
                confidence: 0.95,
                kind: MatchKind::Normalized,
            });
        }

        self.fuzzy_match(&key)
    }

    fn fuzzy_match(&self, key: &str) -> Option<SkillMatch<'_>> {
        if key.chars().count() < 4 {
            return None;
        }

        let mut best: Option<(usize, f32)> = None;
        for (index, entry) in self.entries.iter().enumerate() {
            for form in entry.surface_forms() {
                let candidate = normalize_key(form);
                if candidate.chars().count() < 3 {
                    continue;
                }
                let score = self.similarity.similarity(key, &candidate);
                if score >= self.fuzzy_floor && best.map_or(true, |(_, s)| score > s) {
                    best = Some((index, score));
                }
            }
        }

        best.map(|(index, score)| {
            debug!("Fuzzy matched '{}' to '{}' ({:.3})", key, self.entries[index].id, score);
            SkillMatch {
                entry: &self.entries[index],
                confidence: score,
                kind: MatchKind::Fuzzy,
            }
        })
    }

    pub fn get(&self, id: &SkillId) -> Option<&SkillEntry> {
        self.entries.iter().find(|e| &e.id == id)
    }

    pub fn entries(&self) -> &[SkillEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn similarity_name(&self) -> &'static str {
        self.similarity.name()
    }
}

#[cfg(test)]
mod tests {
    use super::similarity::JaroWinkler;
    use super::*;
    use std::io::Write;

    fn taxonomy() -> SkillTaxonomy {
        SkillTaxonomy::builtin(Arc::new(JaroWinkler), 0.9).unwrap()
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("  Node.JS "), "node js");
        assert_eq!(normalize_key("C++"), "c++");
        assert_eq!(normalize_key("C#"), "c#");
        assert_eq!(normalize_key("CI/CD"), "ci cd");
    }

    #[test]
    fn test_exact_and_synonym_matches() {
        let tax = taxonomy();

        let m = tax.normalize("Python").unwrap();
        assert_eq!(m.entry.id.as_str(), "python");
        assert_eq!(m.kind, MatchKind::Exact);
        assert_eq!(m.confidence, 1.0);

        for synonym in ["py", "python3"] {
            assert_eq!(tax.normalize(synonym).unwrap().entry.id.as_str(), "python");
        }
        assert_eq!(tax.normalize("golang").unwrap().entry.id.as_str(), "go");
    }

    #[test]
    fn test_case_and_punctuation_insensitive_match() {
        let tax = taxonomy();
        let m = tax.normalize("NODE.JS").unwrap();
        assert_eq!(m.entry.id.as_str(), "nodejs");
        assert_eq!(m.kind, MatchKind::Normalized);
        assert!(m.confidence < 1.0);
    }

    #[test]
    fn test_fuzzy_match_and_unknown() {
        let tax = taxonomy();
        let m = tax.normalize("Pyhton").unwrap();
        assert_eq!(m.entry.id.as_str(), "python");
        assert_eq!(m.kind, MatchKind::Fuzzy);
        assert!(m.confidence >= 0.9 && m.confidence < 1.0);

        assert!(tax.normalize("basket weaving").is_none());
        assert!(tax.normalize("zz").is_none());
        assert!(tax.normalize("   ").is_none());
    }

    #[test]
    fn test_shared_surface_form_is_rejected() {
        let entries = vec![
            SkillEntry::new("python", "Python", SkillCategory::ProgrammingLanguage, &["py"]),
            SkillEntry::new("pytest", "pytest", SkillCategory::Tool, &["Py"]),
        ];
        let err = SkillTaxonomy::new(entries, Arc::new(JaroWinkler), 0.9).unwrap_err();
        assert!(matches!(err, CvEvaluatorError::Configuration(_)));
    }

    #[test]
    fn test_duplicate_identifier_is_rejected() {
        let entries = vec![
            SkillEntry::new("rust", "Rust", SkillCategory::ProgrammingLanguage, &[]),
            SkillEntry::new("RUST", "Rust lang", SkillCategory::ProgrammingLanguage, &[]),
        ];
        assert!(SkillTaxonomy::new(entries, Arc::new(JaroWinkler), 0.9).is_err());
    }

    #[test]
    fn test_load_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[[skills]]
id = "rust"
name = "Rust"
category = "programming_language"
synonyms = ["rustlang"]
demand = 0.95

[[skills]]
id = "tokio"
name = "Tokio"
category = "framework"
"#
        )
        .unwrap();

        let tax = SkillTaxonomy::load(file.path(), Arc::new(JaroWinkler), 0.9).unwrap();
        assert_eq!(tax.len(), 2);
        assert_eq!(tax.normalize("RustLang").unwrap().entry.id.as_str(), "rust");
        assert_eq!(tax.get(&SkillId::new("rust")).unwrap().demand, Some(0.95));
    }

    #[test]
    fn test_load_missing_file_is_configuration_error() {
        let err = SkillTaxonomy::load(Path::new("/nonexistent/taxonomy.toml"), Arc::new(JaroWinkler), 0.9).unwrap_err();
        assert!(matches!(err, CvEvaluatorError::Configuration(_)));
    }
}
