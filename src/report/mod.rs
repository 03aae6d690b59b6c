pub mod recommendations;

use std::{collections::BTreeMap, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{MetricSet, error::Result};

pub use recommendations::{CandidateSummary, RecommendationThresholds, recommend};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub results: BTreeMap<String, MetricSet>,
    pub scores: BTreeMap<String, f64>,
    pub best_method: String,
    pub improvement: f64,
    pub recommendations: Vec<String>,
    pub method_status: BTreeMap<String, bool>,
    #[serde(default)]
    pub evaluation_order: Vec<String>,
}

impl ComparisonReport {
    pub fn best_metrics(&self) -> Option<&MetricSet> {
        self.results.get(&self.best_method)
    }

    pub fn ranking(&self) -> Vec<&str> {
        let mut ranked: Vec<(&str, f64)> = self
            .evaluation_order
            .iter()
            .filter_map(|name| self.scores.get(name).map(|&score| (name.as_str(), score)))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.into_iter().map(|(name, _)| name).collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
