//! Market demand weights per skill

use super::{SkillId, SkillTaxonomy};
use crate::config::MarketConfig;
use crate::error::{CvEvaluatorError, Result};
use log::{debug, warn};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Read-only source of per-skill demand weights in `[0, 1]`.
pub trait MarketDemand: Send + Sync {
    fn demand_weight(&self, skill: &SkillId) -> f32;

    /// All known skills, highest demand first, ties by identifier.
    fn ranked(&self) -> Vec<(SkillId, f32)>;
}

#[derive(Debug, Deserialize)]
struct DemandFile {
    #[serde(default)]
    weights: BTreeMap<String, f32>,
}

#[derive(Debug, Clone)]
pub struct DemandTable {
    weights: BTreeMap<SkillId, f32>,
    default_weight: f32,
}

impl DemandTable {
    pub fn new(weights: BTreeMap<SkillId, f32>, default_weight: f32) -> Self {
        Self { weights, default_weight }
    }

    /// Entry demand where declared, category default otherwise.
    pub fn from_taxonomy(taxonomy: &SkillTaxonomy, default_weight: f32) -> Self {
        let weights = taxonomy
            .entries()
            .iter()
            .map(|e| (e.id.clone(), e.demand.unwrap_or_else(|| e.category.default_demand())))
            .collect();
        Self::new(weights, default_weight)
    }

    pub fn from_config(taxonomy: &SkillTaxonomy, config: &MarketConfig) -> Result<Self> {
        let table = Self::from_taxonomy(taxonomy, config.default_weight);
        match &config.path {
            Some(path) => {
                let overrides = Self::load_overrides(path)?;
                Ok(table.with_overrides(taxonomy, overrides))
            }
            None => Ok(table),
        }
    }

    /// Read a `[weights]` table of `skill = weight` pairs.
    pub fn load_overrides(path: &Path) -> Result<BTreeMap<String, f32>> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CvEvaluatorError::Configuration(format!("Failed to read market data {}: {}", path.display(), e))
        })?;
        let file: DemandFile = toml::from_str(&content).map_err(|e| {
            CvEvaluatorError::Configuration(format!("Failed to parse market data {}: {}", path.display(), e))
        })?;

        for (skill, weight) in &file.weights {
            if !(0.0..=1.0).contains(weight) {
                return Err(CvEvaluatorError::Configuration(format!(
                    "Demand weight for '{}' must be in [0, 1], got {}",
                    skill, weight
                )));
            }
        }
        Ok(file.weights)
    }

    /// Apply overrides keyed by any surface form the taxonomy resolves.
    pub fn with_overrides(mut self, taxonomy: &SkillTaxonomy, overrides: BTreeMap<String, f32>) -> Self {
        for (term, weight) in overrides {
            match taxonomy.normalize(&term) {
                Some(m) => {
                    debug!("Market weight for {} set to {}", m.entry.id, weight);
                    self.weights.insert(m.entry.id.clone(), weight);
                }
                None => warn!("Ignoring market weight for unknown skill '{}'", term),
            }
        }
        self
    }
}

impl MarketDemand for DemandTable {
    fn demand_weight(&self, skill: &SkillId) -> f32 {
        self.weights.get(skill).copied().unwrap_or(self.default_weight)
    }

    fn ranked(&self) -> Vec<(SkillId, f32)> {
        let mut ranked: Vec<(SkillId, f32)> = self.weights.iter().map(|(k, v)| (k.clone(), *v)).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::similarity::JaroWinkler;
    use std::io::Write;
    use std::sync::Arc;

    fn taxonomy() -> SkillTaxonomy {
        SkillTaxonomy::builtin(Arc::new(JaroWinkler), 0.9).unwrap()
    }

    #[test]
    fn test_weights_from_taxonomy() {
        let table = DemandTable::from_taxonomy(&taxonomy(), 0.5);
        assert_eq!(table.demand_weight(&SkillId::new("python")), 1.0);
        assert_eq!(table.demand_weight(&SkillId::new("leadership")), 0.4);
        assert_eq!(table.demand_weight(&SkillId::new("cobol")), 0.5);
    }

    #[test]
    fn test_ranked_is_sorted_and_deterministic() {
        let table = DemandTable::from_taxonomy(&taxonomy(), 0.5);
        let ranked = table.ranked();
        assert_eq!(ranked.len(), taxonomy().len());
        for pair in ranked.windows(2) {
            assert!(pair[0].1 > pair[1].1 || (pair[0].1 == pair[1].1 && pair[0].0 < pair[1].0));
        }
        assert_eq!(ranked, table.ranked());
    }

    #[test]
    fn test_overrides_from_file() {
        let tax = taxonomy();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[weights]\n\"C#\" = 0.3\npy = 0.7\nunknownthing = 0.9").unwrap();

        let config = MarketConfig {
            path: Some(file.path().to_path_buf()),
            default_weight: 0.5,
        };
        let table = DemandTable::from_config(&tax, &config).unwrap();
        assert_eq!(table.demand_weight(&SkillId::new("csharp")), 0.3);
        assert_eq!(table.demand_weight(&SkillId::new("python")), 0.7);
    }

    #[test]
    fn test_out_of_range_weight_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[weights]\npython = 1.5").unwrap();
        assert!(matches!(
            DemandTable::load_overrides(file.path()),
            Err(CvEvaluatorError::Configuration(_))
        ));
    }
}
