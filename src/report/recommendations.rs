use serde::{Deserialize, Serialize};

use crate::MetricSet;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationThresholds {
    pub improvement: f64,
    pub preservation: f64,
    pub style: f64,
    pub quality_floor: f64,
}

impl Default for RecommendationThresholds {
    fn default() -> Self {
        Self {
            improvement: 0.10,
            preservation: 0.95,
            style: 0.8,
            quality_floor: 0.7,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CandidateSummary<'a> {
    pub label: &'a str,
    pub metrics: &'a MetricSet,
}

pub fn recommend(
    thresholds: &RecommendationThresholds,
    best_method: &str,
    improvement: f64,
    original: &MetricSet,
    alternates: &[CandidateSummary<'_>],
) -> Vec<String> {
    let mut recommendations = Vec::new();

    if improvement > thresholds.improvement {
        recommendations.push(format!(
            "Use {} method for {:.1}% quality improvement",
            best_method,
            improvement * 100.0
        ));
    }

    for alternate in alternates {
        if alternate.metrics.ssim_background > thresholds.preservation {
            recommendations.push(format!(
                "{} shows excellent background preservation",
                alternate.label
            ));
        }
    }

    for alternate in alternates {
        if alternate.metrics.style_consistency > thresholds.style {
            recommendations.push(format!(
                "{} demonstrates strong style consistency",
                alternate.label
            ));
        }
    }

    if original.overall_quality < thresholds.quality_floor {
        recommendations.push("Consider adjusting prompt or generation parameters".to_string());
    }

    if recommendations.is_empty() {
        recommendations.push("Original generation provides optimal results".to_string());
    }

    recommendations
}
