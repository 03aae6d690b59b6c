use serde::{Deserialize, Serialize};

use crate::MetricSet;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricWeights {
    pub ssim_background: f64,
    pub delta_e_background: f64,
    pub delta_e_edge: f64,
    pub style_consistency: f64,
    pub pose_accuracy: f64,
}

impl Default for MetricWeights {
    fn default() -> Self {
        Self {
            ssim_background: 0.3,
            delta_e_background: -0.1,
            delta_e_edge: -0.2,
            style_consistency: 0.2,
            pose_accuracy: 0.3,
        }
    }
}

impl MetricWeights {
    pub fn is_finite(&self) -> bool {
        [
            self.ssim_background,
            self.delta_e_background,
            self.delta_e_edge,
            self.style_consistency,
            self.pose_accuracy,
        ]
        .iter()
        .all(|w| w.is_finite())
    }
}

pub struct Aggregator {
    weights: MetricWeights,
    delta_e_scale: f64,
}

impl Aggregator {
    pub fn new(weights: MetricWeights, delta_e_scale: f64) -> Self {
        Self { weights, delta_e_scale }
    }

    pub fn delta_e_benefit(&self, delta_e: f64) -> f64 {
        let benefit = 1.0 - delta_e / self.delta_e_scale;
        if benefit.is_nan() { 0.0 } else { benefit.clamp(0.0, 1.0) }
    }

    pub fn overall_quality(&self, metrics: &MetricSet) -> f64 {
        let w = &self.weights;
        let score = w.ssim_background * metrics.ssim_background
            + w.delta_e_background * self.delta_e_benefit(metrics.delta_e_background)
            + w.delta_e_edge * self.delta_e_benefit(metrics.delta_e_edge)
            + w.style_consistency * metrics.style_consistency
            + w.pose_accuracy * metrics.pose_accuracy;

        if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) }
    }

    pub fn aggregate(&self, metrics: MetricSet) -> MetricSet {
        MetricSet {
            overall_quality: self.overall_quality(&metrics),
            ..metrics
        }
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(MetricWeights::default(), 10.0)
    }
}
