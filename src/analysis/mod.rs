pub mod delta_e;
pub mod pose;
pub mod ssim;
pub mod style;

use std::sync::Arc;

use image::RgbImage;

use crate::{
    MetricSet, QualityConfig,
    analysis::{
        pose::{Keypoint, PoseAccuracyProvider, SimulatedPoseAccuracy},
        ssim::SsimAnalyzer,
        style::StyleAnalyzer,
    },
    mask::{Region, SceneRegions},
};

pub struct MetricEngine {
    ssim: SsimAnalyzer,
    style: StyleAnalyzer,
    pose: Arc<dyn PoseAccuracyProvider>,
}

impl MetricEngine {
    pub fn new(config: &QualityConfig) -> Self {
        Self {
            ssim: SsimAnalyzer::new(config.ssim_window),
            style: StyleAnalyzer::new(config.histogram_bins),
            pose: Arc::new(SimulatedPoseAccuracy::default()),
        }
    }

    pub fn with_pose_provider(mut self, provider: Arc<dyn PoseAccuracyProvider>) -> Self {
        self.pose = provider;
        self
    }

    pub fn pose_provider(&self) -> &dyn PoseAccuracyProvider {
        self.pose.as_ref()
    }

    pub fn background_structural_similarity(
        &self,
        reference: &RgbImage,
        generated: &RgbImage,
        background: &Region,
    ) -> f64 {
        self.ssim.similarity(reference, generated, background)
    }

    pub fn perceptual_color_difference(&self, reference: &RgbImage, generated: &RgbImage, region: &Region) -> f64 {
        delta_e::mean_delta_e(reference, generated, region)
    }

    pub fn style_consistency(
        &self,
        generated: &RgbImage,
        style_reference: Option<&RgbImage>,
        foreground: &Region,
    ) -> f64 {
        self.style.consistency(generated, style_reference, foreground)
    }

    // no keypoint list at all scores 0.0
    pub fn pose_accuracy(
        &self,
        reference: &RgbImage,
        generated: &RgbImage,
        keypoints: Option<&[Keypoint]>,
    ) -> f64 {
        match keypoints {
            None => 0.0,
            Some(points) => {
                let score = self.pose.pose_accuracy(reference, generated, points);
                if score.is_finite() { score.clamp(0.0, 1.0) } else { 0.0 }
            }
        }
    }

    pub fn measure(
        &self,
        reference: &RgbImage,
        generated: &RgbImage,
        regions: &SceneRegions,
        style_reference: Option<&RgbImage>,
        keypoints: Option<&[Keypoint]>,
    ) -> MetricSet {
        MetricSet {
            ssim_background: self.background_structural_similarity(reference, generated, &regions.background),
            delta_e_background: self.perceptual_color_difference(reference, generated, &regions.background),
            delta_e_edge: self.perceptual_color_difference(reference, generated, &regions.ring),
            style_consistency: self.style_consistency(generated, style_reference, &regions.foreground),
            pose_accuracy: self.pose_accuracy(reference, generated, keypoints),
            overall_quality: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use image::{GrayImage, Luma, Rgb};

    use super::*;
    use crate::{analysis::pose::FixedPoseAccuracy, mask::RegionMask};

    fn centered_square_mask() -> GrayImage {
        GrayImage::from_fn(100, 100, |x, y| {
            let inside = (30..70).contains(&x) && (30..70).contains(&y);
            Luma([if inside { 255 } else { 0 }])
        })
    }

    #[test]
    fn test_identity_gives_perfect_preservation() {
        let engine = MetricEngine::new(&QualityConfig::default());
        let scene = RgbImage::from_fn(100, 100, |x, y| Rgb([(x * 2) as u8, (y * 2) as u8, 90]));
        let regions = RegionMask::from_gray(&centered_square_mask(), 127).regions(8);

        let metrics = engine.measure(&scene, &scene, &regions, None, None);
        assert_eq!(metrics.ssim_background, 1.0);
        assert_eq!(metrics.delta_e_background, 0.0);
        assert_eq!(metrics.delta_e_edge, 0.0);
        assert_eq!(metrics.style_consistency, 0.0);
        assert_eq!(metrics.pose_accuracy, 0.0);
    }

    #[test]
    fn test_pose_provider_is_replaceable_and_clamped() {
        let image = RgbImage::new(2, 2);
        let points = [Keypoint { name: "nose".into(), x: 1.0, y: 1.0, confidence: 1.0 }];

        let engine = MetricEngine::new(&QualityConfig::default())
            .with_pose_provider(Arc::new(FixedPoseAccuracy(0.42)));
        assert_eq!(engine.pose_accuracy(&image, &image, Some(&points)), 0.42);
        assert_eq!(engine.pose_provider().name(), "fixed");

        let engine = engine.with_pose_provider(Arc::new(FixedPoseAccuracy(7.0)));
        assert_eq!(engine.pose_accuracy(&image, &image, Some(&points)), 1.0);
        assert_eq!(engine.pose_accuracy(&image, &image, None), 0.0);
    }

    #[test]
    fn test_delta_e_is_symmetric_over_region() {
        let engine = MetricEngine::new(&QualityConfig::default());
        let a = RgbImage::from_fn(16, 16, |x, y| Rgb([(x * 15) as u8, (y * 15) as u8, 40]));
        let b = RgbImage::from_fn(16, 16, |x, y| Rgb([(y * 12) as u8, 100, (x * 9) as u8]));
        let background = RegionMask::from_gray(&GrayImage::new(16, 16), 127).background();

        let ab = engine.perceptual_color_difference(&a, &b, &background);
        let ba = engine.perceptual_color_difference(&b, &a, &background);
        assert!((ab - ba).abs() < 1e-9);
        assert!(ab > 0.0);
    }
}
