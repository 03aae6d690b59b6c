use std::{
    fs,
    hash::{DefaultHasher, Hash, Hasher},
    path::Path,
};

use image::RgbImage;
use rand::{SeedableRng, distributions::Distribution};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use statrs::distribution::Normal;

use crate::error::Result;

pub const FULL_BODY_KEYPOINTS: usize = 17;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub name: String,
    pub x: f64,
    pub y: f64,
    #[serde(alias = "conf", default = "default_confidence")]
    pub confidence: f64,
}

fn default_confidence() -> f64 {
    1.0
}

// {"points": [...]} as written by the pose detector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseKeypoints {
    #[serde(default)]
    pub points: Vec<Keypoint>,
}

impl PoseKeypoints {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}

pub trait PoseAccuracyProvider: Send + Sync {
    fn pose_accuracy(&self, reference: &RgbImage, candidate: &RgbImage, keypoints: &[Keypoint]) -> f64;

    fn name(&self) -> &str;
}

// Skeleton coverage plus bounded gaussian noise, seeded from `seed` and the
// candidate's pixels.
#[derive(Debug, Clone)]
pub struct SimulatedPoseAccuracy {
    pub seed: u64,
    pub noise_std_dev: f64,
    pub noise_bound: f64,
}

impl Default for SimulatedPoseAccuracy {
    fn default() -> Self {
        Self {
            seed: 0x5EED_0017,
            noise_std_dev: 0.05,
            noise_bound: 0.1,
        }
    }
}

impl SimulatedPoseAccuracy {
    pub fn with_seed(seed: u64) -> Self {
        Self { seed, ..Self::default() }
    }

    pub fn without_noise() -> Self {
        Self { noise_std_dev: 0.0, ..Self::default() }
    }

    fn stream_seed(&self, candidate: &RgbImage, keypoints: &[Keypoint]) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.seed.hash(&mut hasher);
        candidate.dimensions().hash(&mut hasher);
        candidate.as_raw().hash(&mut hasher);
        keypoints.len().hash(&mut hasher);
        hasher.finish()
    }

    fn noise(&self, candidate: &RgbImage, keypoints: &[Keypoint]) -> f64 {
        let Ok(normal) = Normal::new(0.0, self.noise_std_dev) else {
            return 0.0;
        };
        let mut rng = Pcg32::seed_from_u64(self.stream_seed(candidate, keypoints));
        normal.sample(&mut rng).clamp(-self.noise_bound, self.noise_bound)
    }
}

impl PoseAccuracyProvider for SimulatedPoseAccuracy {
    fn pose_accuracy(&self, _reference: &RgbImage, candidate: &RgbImage, keypoints: &[Keypoint]) -> f64 {
        if keypoints.is_empty() {
            return 0.8;
        }

        let coverage = (keypoints.len() as f64 / FULL_BODY_KEYPOINTS as f64).min(1.0);
        let base = 0.7 + coverage * 0.2;

        (base + self.noise(candidate, keypoints)).clamp(0.0, 1.0)
    }

    fn name(&self) -> &str {
        "simulated"
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedPoseAccuracy(pub f64);

impl PoseAccuracyProvider for FixedPoseAccuracy {
    fn pose_accuracy(&self, _reference: &RgbImage, _candidate: &RgbImage, _keypoints: &[Keypoint]) -> f64 {
        self.0
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keypoints(count: usize) -> Vec<Keypoint> {
        (0..count)
            .map(|i| Keypoint {
                name: format!("kp_{i}"),
                x: i as f64,
                y: i as f64,
                confidence: 0.9,
            })
            .collect()
    }

    #[test]
    fn test_coverage_without_noise() {
        let image = RgbImage::new(1, 1);
        let provider = SimulatedPoseAccuracy::without_noise();

        assert!((provider.pose_accuracy(&image, &image, &keypoints(17)) - 0.9).abs() < 1e-12);
        assert!((provider.pose_accuracy(&image, &image, &keypoints(34)) - 0.9).abs() < 1e-12);
        assert!((provider.pose_accuracy(&image, &image, &keypoints(0)) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_seeded_noise_is_reproducible_and_bounded() {
        let image = RgbImage::new(1, 1);
        let a = SimulatedPoseAccuracy::with_seed(42);
        let b = SimulatedPoseAccuracy::with_seed(42);
        let points = keypoints(8);

        let score = a.pose_accuracy(&image, &image, &points);
        assert_eq!(score, b.pose_accuracy(&image, &image, &points));

        let base = 0.7 + (8.0 / 17.0) * 0.2;
        assert!((score - base).abs() <= 0.1 + 1e-12);
    }

    #[test]
    fn test_noise_differs_between_candidates() {
        let reference = RgbImage::new(4, 4);
        let provider = SimulatedPoseAccuracy::default();
        let points = keypoints(10);

        let scores: Vec<f64> = (0..4u8)
            .map(|shade| {
                let candidate = RgbImage::from_pixel(4, 4, image::Rgb([shade * 40, 10, 200]));
                provider.pose_accuracy(&reference, &candidate, &points)
            })
            .collect();

        assert!(scores.windows(2).any(|pair| pair[0] != pair[1]), "scores = {scores:?}");

        let again = RgbImage::from_pixel(4, 4, image::Rgb([40, 10, 200]));
        assert_eq!(provider.pose_accuracy(&reference, &again, &points), scores[1]);
    }

    #[test]
    fn test_keypoint_document_accepts_conf_alias() {
        let json = r#"{"points": [{"name": "nose", "x": 10, "y": 12.5, "conf": 0.4}, {"name": "neck", "x": 1, "y": 2}]}"#;
        let doc = PoseKeypoints::from_json_str(json).unwrap();

        assert_eq!(doc.points.len(), 2);
        assert_eq!(doc.points[0].confidence, 0.4);
        assert_eq!(doc.points[1].confidence, 1.0);
    }
}
