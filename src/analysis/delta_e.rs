use image::{Rgb, RgbImage};
use palette::{FromColor, LinSrgb, Srgb, color_difference::Ciede2000, white_point::D65};

use crate::mask::Region;

pub type Lab = palette::Lab<D65, f64>;

pub fn lab_from_rgb(pixel: &Rgb<u8>) -> Lab {
    let [r, g, b] = pixel.0.map(|c| c as f64 / 255.0);
    let linear: LinSrgb<f64> = Srgb::new(r, g, b).into_linear();
    Lab::from_color(linear)
}

pub fn pixel_delta_e(reference: &Rgb<u8>, generated: &Rgb<u8>) -> f64 {
    lab_from_rgb(reference).difference(lab_from_rgb(generated))
}

// NaN per-pixel values are skipped; an empty region yields 0.0.
pub fn mean_delta_e(reference: &RgbImage, generated: &RgbImage, region: &Region) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;

    for (x, y) in region.pixels() {
        let ref_pixel = reference.get_pixel(x, y);
        let gen_pixel = generated.get_pixel(x, y);
        if ref_pixel == gen_pixel {
            count += 1;
            continue;
        }

        let de = pixel_delta_e(ref_pixel, gen_pixel);
        if de.is_nan() {
            continue;
        }
        sum += de;
        count += 1;
    }

    if count == 0 {
        return 0.0;
    }

    sum / count as f64
}

#[cfg(test)]
mod tests {
    use image::{GrayImage, Luma};

    use super::*;
    use crate::mask::RegionMask;

    fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() < tolerance,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_white_maps_to_l100() {
        let lab = lab_from_rgb(&Rgb([255, 255, 255]));
        assert_close(lab.l, 100.0, 1e-3);
        assert_close(lab.a, 0.0, 1e-2);
        assert_close(lab.b, 0.0, 1e-2);
    }

    #[test]
    fn test_reference_pairs() {
        // Sharma, Wu & Dalal (2005) test data.
        let cases = [
            (Lab::new(50.0, 2.6772, -79.7751), Lab::new(50.0, 0.0, -82.7485), 2.0425),
            (Lab::new(50.0, 2.5, 0.0), Lab::new(73.0, 25.0, -18.0), 27.1492),
            (Lab::new(50.0, 2.5, 0.0), Lab::new(50.0, 0.0, -2.5), 4.3065),
            (Lab::new(2.0776, 0.0795, -1.1350), Lab::new(0.9033, -0.0636, -0.5514), 0.9082),
        ];

        for (lab1, lab2, expected) in cases {
            assert_close(lab1.difference(lab2), expected, 1e-3);
        }
    }

    #[test]
    fn test_symmetry() {
        let a = Rgb([200, 30, 90]);
        let b = Rgb([20, 180, 60]);
        assert_close(pixel_delta_e(&a, &b), pixel_delta_e(&b, &a), 1e-6);
        assert!(pixel_delta_e(&a, &b) > 10.0);
    }

    #[test]
    fn test_mean_over_region() {
        let reference = RgbImage::from_pixel(4, 4, Rgb([120, 120, 120]));
        let mut generated = reference.clone();
        generated.put_pixel(0, 0, Rgb([200, 40, 40]));

        let mask = GrayImage::from_fn(4, 4, |x, _| Luma([if x < 2 { 0 } else { 255 }]));
        let regions = RegionMask::from_gray(&mask, 127);

        let bg = mean_delta_e(&reference, &generated, &regions.background());
        let fg = mean_delta_e(&reference, &generated, &regions.foreground());
        let single = pixel_delta_e(&Rgb([120, 120, 120]), &Rgb([200, 40, 40]));

        assert_close(bg, single / 8.0, 1e-9);
        assert_eq!(fg, 0.0);
    }

    #[test]
    fn test_empty_region_is_zero() {
        let image = RgbImage::from_pixel(3, 3, Rgb([1, 2, 3]));
        let other = RgbImage::from_pixel(3, 3, Rgb([200, 2, 3]));
        let all_fg = RegionMask::from_gray(&GrayImage::from_pixel(3, 3, Luma([255])), 127);

        assert_eq!(mean_delta_e(&image, &other, &all_fg.background()), 0.0);
    }
}
