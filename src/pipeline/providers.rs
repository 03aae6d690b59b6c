use image::{DynamicImage, Rgb, RgbImage};
use palette::{FromColor, Hsv, Srgb, encoding};

use crate::{
    error::Result,
    pipeline::{CorrectionProvider, CorrectionRequest},
};

// Stand-in for a text-guided editor: scales HSV saturation of the original.
#[derive(Debug, Clone)]
pub struct SaturationBoost {
    name: String,
    label: String,
    factor: f64,
}

impl SaturationBoost {
    pub fn new(name: impl Into<String>, factor: f64) -> Self {
        let name = name.into();
        Self { label: name.clone(), name, factor }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn apply(&self, image: &RgbImage) -> RgbImage {
        let mut result = image.clone();
        for pixel in result.pixels_mut() {
            *pixel = scale_saturation(pixel, self.factor);
        }
        result
    }
}

impl Default for SaturationBoost {
    fn default() -> Self {
        Self::new("nano_banana", 1.1).with_label("Nano-Banana")
    }
}

impl CorrectionProvider for SaturationBoost {
    fn name(&self) -> &str {
        &self.name
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn correct(&self, request: &CorrectionRequest<'_>) -> Result<Option<DynamicImage>> {
        let corrected = self.apply(&request.original.to_rgb8());
        Ok(Some(DynamicImage::ImageRgb8(corrected)))
    }
}

fn scale_saturation(pixel: &Rgb<u8>, factor: f64) -> Rgb<u8> {
    let [r, g, b] = pixel.0.map(|c| c as f64 / 255.0);
    let mut hsv = Hsv::<encoding::Srgb, f64>::from_color(Srgb::new(r, g, b));
    if hsv.saturation <= 0.0 {
        return *pixel;
    }
    hsv.saturation = (hsv.saturation * factor).clamp(0.0, 1.0);

    let boosted: Srgb<f64> = Srgb::from_color(hsv);
    let to_u8 = |c: f64| (c * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgb([to_u8(boosted.red), to_u8(boosted.green), to_u8(boosted.blue)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_factor_preserves_colors() {
        for pixel in [Rgb([200, 40, 90]), Rgb([12, 250, 130]), Rgb([90, 90, 200])] {
            assert_eq!(scale_saturation(&pixel, 1.0), pixel);
        }
    }

    #[test]
    fn test_grays_are_untouched() {
        assert_eq!(scale_saturation(&Rgb([128, 128, 128]), 1.5), Rgb([128, 128, 128]));
        assert_eq!(scale_saturation(&Rgb([0, 0, 0]), 1.5), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_boost_spreads_channels() {
        let boosted = scale_saturation(&Rgb([200, 150, 150]), 1.5);
        assert_eq!(boosted[0], 200);
        assert!(boosted[1] < 150);
        assert_eq!(boosted[1], boosted[2]);
    }
}
