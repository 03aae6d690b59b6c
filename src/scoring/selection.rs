use serde::{Deserialize, Serialize};

use crate::MetricSet;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenaltyPolicy {
    pub ssim_floor: f64,
    pub ssim_factor: f64,
    pub edge_ceiling: f64,
    pub edge_factor: f64,
}

impl Default for PenaltyPolicy {
    fn default() -> Self {
        Self {
            ssim_floor: 0.92,
            ssim_factor: 10.0,
            edge_ceiling: 3.0,
            edge_factor: 2.0,
        }
    }
}

impl PenaltyPolicy {
    pub fn penalty(&self, metrics: &MetricSet) -> f64 {
        let mut penalty = 0.0;

        if metrics.ssim_background < self.ssim_floor {
            penalty += (self.ssim_floor - metrics.ssim_background) * self.ssim_factor;
        }
        if metrics.delta_e_edge > self.edge_ceiling {
            penalty += (metrics.delta_e_edge - self.edge_ceiling) * self.edge_factor;
        }

        penalty
    }

    pub fn score(&self, metrics: &MetricSet) -> f64 {
        metrics.overall_quality - self.penalty(metrics)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub scores: Vec<(String, f64)>,
    pub best_method: String,
    pub best_score: f64,
    pub improvement: f64,
}

pub struct SelectionPolicy {
    penalty: PenaltyPolicy,
}

impl SelectionPolicy {
    pub fn new(penalty: PenaltyPolicy) -> Self {
        Self { penalty }
    }

    // first maximum wins, so `evaluated` must be in canonical order
    pub fn select(&self, evaluated: &[(String, MetricSet)], original: &str) -> Option<Selection> {
        let scores: Vec<(String, f64)> = evaluated
            .iter()
            .map(|(name, metrics)| (name.clone(), self.penalty.score(metrics)))
            .collect();

        let mut best: Option<(&str, f64)> = None;
        for (name, score) in &scores {
            let improves = best.is_none_or(|(_, best_score)| *score > best_score);
            if improves {
                best = Some((name, *score));
            }
        }
        let (best_method, best_score) = best?;

        let original_score = scores
            .iter()
            .find(|(name, _)| name == original)
            .map(|(_, score)| *score)
            .unwrap_or(0.0);

        Some(Selection {
            best_method: best_method.to_string(),
            best_score,
            improvement: best_score - original_score,
            scores,
        })
    }
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self::new(PenaltyPolicy::default())
    }
}
