use std::{
    collections::{BTreeMap, HashSet},
    fs,
    path::Path,
    sync::Arc,
};

use image::{DynamicImage, RgbImage};
use log::{debug, info, warn};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use serde::{Deserialize, Serialize};

use crate::{
    analysis::{
        MetricEngine,
        pose::{Keypoint, PoseAccuracyProvider, SimulatedPoseAccuracy},
    },
    error::{QualityError, Result},
    image_utils::{resize_gray_to, resize_rgb_to},
    mask::{RegionMask, SceneRegions},
    report::{CandidateSummary, ComparisonReport, RecommendationThresholds, recommend},
    scoring::{Aggregator, MetricWeights, PenaltyPolicy, SelectionPolicy},
};

pub mod analysis;
pub mod error;
pub mod image_utils;
pub mod mask;
pub mod pipeline;
pub mod report;
pub mod scoring;

pub const ORIGINAL_CANDIDATE: &str = "original";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    pub mask_threshold: u8,
    pub ring_width: u32,
    pub ssim_window: u32,
    pub histogram_bins: u32,
    pub delta_e_scale: f64,
    pub weights: MetricWeights,
    pub penalty: PenaltyPolicy,
    pub recommendations: RecommendationThresholds,
    pub parallel: bool,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            mask_threshold: 127,
            ring_width: 8,
            ssim_window: 7,
            histogram_bins: 32,
            delta_e_scale: 10.0,
            weights: MetricWeights::default(),
            penalty: PenaltyPolicy::default(),
            recommendations: RecommendationThresholds::default(),
            parallel: true,
        }
    }
}

impl QualityConfig {
    pub const MAX_RING_WIDTH: u32 = 1024;

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.mask_threshold == u8::MAX {
            return Err(QualityError::InvalidParameter(
                "mask threshold of 255 leaves no foreground".into(),
            ));
        }
        if self.ring_width > Self::MAX_RING_WIDTH {
            return Err(QualityError::InvalidParameter(format!(
                "ring width must be at most {}, got {}",
                Self::MAX_RING_WIDTH,
                self.ring_width
            )));
        }
        if self.histogram_bins == 0 || self.histogram_bins > 256 {
            return Err(QualityError::InvalidParameter(format!(
                "histogram bins must be in 1..=256, got {}",
                self.histogram_bins
            )));
        }
        if self.ssim_window < 3 || self.ssim_window % 2 == 0 {
            return Err(QualityError::InvalidParameter(format!(
                "SSIM window must be odd and at least 3, got {}",
                self.ssim_window
            )));
        }
        if !(self.delta_e_scale.is_finite() && self.delta_e_scale > 0.0) {
            return Err(QualityError::InvalidParameter(
                "delta E scale must be positive".into(),
            ));
        }
        if !self.weights.is_finite() {
            return Err(QualityError::InvalidParameter("metric weights must be finite".into()));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSet {
    pub ssim_background: f64,
    pub delta_e_background: f64,
    pub delta_e_edge: f64,
    pub style_consistency: f64,
    pub pose_accuracy: f64,
    pub overall_quality: f64,
}

impl MetricSet {
    pub const NAMES: [&'static str; 6] = [
        "ssim_background",
        "delta_e_background",
        "delta_e_edge",
        "style_consistency",
        "pose_accuracy",
        "overall_quality",
    ];

    pub fn get(&self, name: &str) -> Option<f64> {
        match name {
            "ssim_background" => Some(self.ssim_background),
            "delta_e_background" => Some(self.delta_e_background),
            "delta_e_edge" => Some(self.delta_e_edge),
            "style_consistency" => Some(self.style_consistency),
            "pose_accuracy" => Some(self.pose_accuracy),
            "overall_quality" => Some(self.overall_quality),
            _ => None,
        }
    }
}

// `image: None` marks a provider that failed to produce one.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub name: String,
    pub label: Option<String>,
    pub image: Option<DynamicImage>,
}

impl Candidate {
    pub fn new(name: impl Into<String>, image: DynamicImage) -> Self {
        Self { name: name.into(), label: None, image: Some(image) }
    }

    pub fn unavailable(name: impl Into<String>) -> Self {
        Self { name: name.into(), label: None, image: None }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn is_available(&self) -> bool {
        self.image.is_some()
    }

    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone)]
pub struct ComparisonRequest<'a> {
    reference: &'a DynamicImage,
    mask: &'a DynamicImage,
    original: Candidate,
    alternates: Vec<Candidate>,
    style_reference: Option<&'a DynamicImage>,
    keypoints: Option<&'a [Keypoint]>,
}

impl<'a> ComparisonRequest<'a> {
    pub fn new(
        reference: &'a DynamicImage,
        mask: &'a DynamicImage,
        original: impl Into<Option<DynamicImage>>,
    ) -> Self {
        Self {
            reference,
            mask,
            original: Candidate {
                name: ORIGINAL_CANDIDATE.to_string(),
                label: None,
                image: original.into(),
            },
            alternates: Vec::new(),
            style_reference: None,
            keypoints: None,
        }
    }

    pub fn with_alternate(mut self, candidate: Candidate) -> Self {
        self.alternates.push(candidate);
        self
    }

    pub fn with_style_reference(mut self, style: &'a DynamicImage) -> Self {
        self.style_reference = Some(style);
        self
    }

    pub fn with_keypoints(mut self, keypoints: &'a [Keypoint]) -> Self {
        self.keypoints = Some(keypoints);
        self
    }

    pub fn candidates(&self) -> impl Iterator<Item = &Candidate> {
        std::iter::once(&self.original).chain(&self.alternates)
    }
}

struct PreparedScene {
    reference: RgbImage,
    regions: SceneRegions,
    style: Option<RgbImage>,
}

pub struct QualityAssessor {
    config: QualityConfig,
    pose: Arc<dyn PoseAccuracyProvider>,
}

impl QualityAssessor {
    pub fn new() -> Self {
        Self {
            config: QualityConfig::default(),
            pose: Arc::new(SimulatedPoseAccuracy::default()),
        }
    }

    pub fn with_config(mut self, config: QualityConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_pose_provider(mut self, provider: Arc<dyn PoseAccuracyProvider>) -> Self {
        self.pose = provider;
        self
    }

    pub fn config(&self) -> &QualityConfig {
        &self.config
    }

    pub fn engine(&self) -> MetricEngine {
        MetricEngine::new(&self.config).with_pose_provider(Arc::clone(&self.pose))
    }

    fn aggregator(&self) -> Aggregator {
        Aggregator::new(self.config.weights, self.config.delta_e_scale)
    }

    pub fn assess(
        &self,
        reference: &DynamicImage,
        candidate: &DynamicImage,
        mask: &DynamicImage,
        style_reference: Option<&DynamicImage>,
        keypoints: Option<&[Keypoint]>,
    ) -> Result<MetricSet> {
        self.config.validate()?;
        let scene = self.prepare(reference, mask, style_reference)?;
        self.evaluate(&self.engine(), &self.aggregator(), &scene, "candidate", candidate, keypoints)
    }

    pub fn assess_paths<P: AsRef<Path>>(
        &self,
        scene: P,
        candidate: P,
        mask: P,
        style_reference: Option<P>,
        keypoints: Option<&[Keypoint]>,
    ) -> Result<MetricSet> {
        let reference = image::open(scene)?;
        let candidate = image::open(candidate)?;
        let mask = image::open(mask)?;
        let style = style_reference.map(image::open).transpose()?;

        self.assess(&reference, &candidate, &mask, style.as_ref(), keypoints)
    }

    pub fn compare(&self, request: &ComparisonRequest<'_>) -> Result<ComparisonReport> {
        self.config.validate()?;

        let mut seen = HashSet::new();
        let mut method_status = BTreeMap::new();
        for candidate in request.candidates() {
            if !seen.insert(candidate.name.as_str()) {
                return Err(QualityError::DuplicateCandidate(candidate.name.clone()));
            }
            if !candidate.is_available() {
                warn!("candidate '{}' has no image and is excluded", candidate.name);
            }
            method_status.insert(candidate.name.clone(), candidate.is_available());
        }

        if !request.original.is_available() {
            return Err(QualityError::PreconditionFailed(
                "the original candidate must have an image".into(),
            ));
        }

        let scene = self.prepare(request.reference, request.mask, request.style_reference)?;
        let engine = self.engine();
        let aggregator = self.aggregator();

        let available: Vec<(&str, &DynamicImage)> = request
            .candidates()
            .filter_map(|c| c.image.as_ref().map(|image| (c.name.as_str(), image)))
            .collect();

        let evaluate = |&(name, image): &(&str, &DynamicImage)| -> Result<(String, MetricSet)> {
            let metrics = self.evaluate(&engine, &aggregator, &scene, name, image, request.keypoints)?;
            Ok((name.to_string(), metrics))
        };

        let evaluated: Vec<(String, MetricSet)> = if self.config.parallel {
            available.par_iter().map(evaluate).collect::<Result<_>>()?
        } else {
            available.iter().map(evaluate).collect::<Result<_>>()?
        };

        let selection = SelectionPolicy::new(self.config.penalty)
            .select(&evaluated, ORIGINAL_CANDIDATE)
            .ok_or_else(|| QualityError::PreconditionFailed("no candidate could be evaluated".into()))?;

        info!(
            "best method: {} (score {:.3}, improvement {:.3})",
            selection.best_method, selection.best_score, selection.improvement
        );

        let results: BTreeMap<String, MetricSet> = evaluated.iter().cloned().collect();
        let original_metrics = results
            .get(ORIGINAL_CANDIDATE)
            .ok_or_else(|| QualityError::PreconditionFailed("original candidate was not evaluated".into()))?;

        let alternates: Vec<CandidateSummary<'_>> = request
            .alternates
            .iter()
            .filter_map(|c| {
                results.get(&c.name).map(|metrics| CandidateSummary { label: c.display_name(), metrics })
            })
            .collect();

        let recommendations = recommend(
            &self.config.recommendations,
            &selection.best_method,
            selection.improvement,
            original_metrics,
            &alternates,
        );

        Ok(ComparisonReport {
            scores: selection.scores.iter().cloned().collect(),
            evaluation_order: evaluated.into_iter().map(|(name, _)| name).collect(),
            best_method: selection.best_method,
            improvement: selection.improvement,
            recommendations,
            method_status,
            results,
        })
    }

    fn prepare(
        &self,
        reference: &DynamicImage,
        mask: &DynamicImage,
        style_reference: Option<&DynamicImage>,
    ) -> Result<PreparedScene> {
        let reference = reference.to_rgb8();
        let (width, height) = reference.dimensions();
        if width == 0 || height == 0 {
            return Err(QualityError::EmptyImage);
        }

        let mask = mask.to_luma8();
        if mask.width() == 0 || mask.height() == 0 {
            return Err(QualityError::InvalidParameter("mask has no pixels".into()));
        }
        if mask.dimensions() != (width, height) {
            debug!(
                "resampling mask from {:?} to {}x{}",
                mask.dimensions(),
                width,
                height
            );
        }
        let mask = resize_gray_to(&mask, width, height);
        let regions = RegionMask::from_gray(&mask, self.config.mask_threshold).regions(self.config.ring_width);

        Ok(PreparedScene {
            reference,
            regions,
            style: style_reference.map(|style| style.to_rgb8()),
        })
    }

    fn evaluate(
        &self,
        engine: &MetricEngine,
        aggregator: &Aggregator,
        scene: &PreparedScene,
        name: &str,
        image: &DynamicImage,
        keypoints: Option<&[Keypoint]>,
    ) -> Result<MetricSet> {
        let (width, height) = scene.reference.dimensions();
        let candidate = image.to_rgb8();
        if candidate.width() == 0 || candidate.height() == 0 {
            return Err(QualityError::InvalidParameter(format!("candidate '{name}' has no pixels")));
        }
        if candidate.dimensions() != (width, height) {
            debug!(
                "resampling candidate '{}' from {:?} to {}x{}",
                name,
                candidate.dimensions(),
                width,
                height
            );
        }
        let candidate = resize_rgb_to(&candidate, width, height);

        let raw = engine.measure(
            &scene.reference,
            &candidate,
            &scene.regions,
            scene.style.as_ref(),
            keypoints,
        );
        let metrics = aggregator.aggregate(raw);

        debug!(
            "{}: ssim_bg={:.4} dE_bg={:.3} dE_edge={:.3} style={:.3} pose={:.3} overall={:.3}",
            name,
            metrics.ssim_background,
            metrics.delta_e_background,
            metrics.delta_e_edge,
            metrics.style_consistency,
            metrics.pose_accuracy,
            metrics.overall_quality
        );

        Ok(metrics)
    }
}

impl Default for QualityAssessor {
    fn default() -> Self {
        Self::new()
    }
}
