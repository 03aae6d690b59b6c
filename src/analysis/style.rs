use image::{Rgb, RgbImage};

use crate::mask::Region;

#[derive(Debug, Clone)]
pub struct ColorHistogram {
    bins: usize,
    counts: Vec<f64>,
}

impl ColorHistogram {
    pub fn new(bins: u32) -> Self {
        let bins = bins.clamp(1, 256) as usize;
        Self { bins, counts: vec![0.0; bins * bins * bins] }
    }

    pub fn from_pixels<'a, I>(bins: u32, pixels: I) -> Self
    where
        I: IntoIterator<Item = &'a Rgb<u8>>,
    {
        let mut histogram = Self::new(bins);
        for pixel in pixels {
            histogram.add(pixel);
        }
        histogram
    }

    pub fn add(&mut self, pixel: &Rgb<u8>) {
        let bin = |v: u8| v as usize * self.bins / 256;
        let index = (bin(pixel[0]) * self.bins + bin(pixel[1])) * self.bins + bin(pixel[2]);
        self.counts[index] += 1.0;
    }

    pub fn total(&self) -> f64 {
        self.counts.iter().sum()
    }

    pub fn normalize(&mut self) {
        let norm = self.counts.iter().map(|c| c * c).sum::<f64>().sqrt();
        if norm > 0.0 {
            self.counts.iter_mut().for_each(|c| *c /= norm);
        }
    }

    pub fn correlation(&self, other: &ColorHistogram) -> f64 {
        if self.counts.len() != other.counts.len() {
            return 0.0;
        }

        let len = self.counts.len() as f64;
        let mean_a = self.total() / len;
        let mean_b = other.total() / len;

        let mut covariance = 0.0;
        let mut var_a = 0.0;
        let mut var_b = 0.0;

        for (&a, &b) in self.counts.iter().zip(&other.counts) {
            let da = a - mean_a;
            let db = b - mean_b;
            covariance += da * db;
            var_a += da * da;
            var_b += db * db;
        }

        let denominator = (var_a * var_b).sqrt();
        if denominator <= f64::EPSILON {
            return 0.0;
        }

        covariance / denominator
    }
}

pub struct StyleAnalyzer {
    bins: u32,
}

impl StyleAnalyzer {
    pub fn new(bins: u32) -> Self {
        Self { bins }
    }

    pub fn consistency(
        &self,
        generated: &RgbImage,
        style_reference: Option<&RgbImage>,
        foreground: &Region,
    ) -> f64 {
        let Some(style_reference) = style_reference else {
            return 0.0;
        };
        if foreground.is_empty() {
            return 0.0;
        }

        let mut subject =
            ColorHistogram::from_pixels(self.bins, foreground.pixels().map(|(x, y)| generated.get_pixel(x, y)));
        let mut style = ColorHistogram::from_pixels(self.bins, style_reference.pixels());
        subject.normalize();
        style.normalize();

        subject.correlation(&style).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use image::{GrayImage, Luma};

    use super::*;
    use crate::mask::RegionMask;

    fn striped(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, _| match x % 3 {
            0 => Rgb([250, 10, 10]),
            1 => Rgb([10, 250, 10]),
            _ => Rgb([10, 10, 250]),
        })
    }

    fn all_foreground(width: u32, height: u32) -> Region {
        RegionMask::from_gray(&GrayImage::from_pixel(width, height, Luma([255])), 127).foreground()
    }

    #[test]
    fn test_bins_quantize_by_eight() {
        let mut histogram = ColorHistogram::new(32);
        histogram.add(&Rgb([7, 8, 255]));
        // r -> 0, g -> 1, b -> 31
        assert_eq!(histogram.counts[32 + 31], 1.0);
    }

    #[test]
    fn test_same_palette_correlates_fully() {
        let generated = striped(30, 10);
        let style = striped(60, 5);
        let score = StyleAnalyzer::new(32).consistency(&generated, Some(&style), &all_foreground(30, 10));
        assert!((score - 1.0).abs() < 1e-9, "score = {score}");
    }

    #[test]
    fn test_disjoint_palette_is_floored_at_zero() {
        let generated = RgbImage::from_pixel(10, 10, Rgb([0, 0, 0]));
        let style = RgbImage::from_pixel(10, 10, Rgb([255, 255, 255]));
        let score = StyleAnalyzer::new(32).consistency(&generated, Some(&style), &all_foreground(10, 10));
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_missing_inputs_score_zero() {
        let generated = striped(10, 10);
        let analyzer = StyleAnalyzer::new(32);
        assert_eq!(analyzer.consistency(&generated, None, &all_foreground(10, 10)), 0.0);

        let empty = RegionMask::from_gray(&GrayImage::new(10, 10), 127).foreground();
        assert_eq!(analyzer.consistency(&generated, Some(&generated), &empty), 0.0);
    }
}
