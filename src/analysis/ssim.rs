use image::RgbImage;
use ndarray::Array2;

use crate::{
    image_utils::{SummedArea, gray_to_array, rgb_to_gray},
    mask::Region,
};

const DYNAMIC_RANGE: f64 = 255.0;
const K1: f64 = 0.01;
const K2: f64 = 0.03;

// Local statistics of each window are taken over its region pixels only,
// and each window is weighted by how many region pixels it holds.
pub struct SsimAnalyzer {
    window_size: u32,
}

impl SsimAnalyzer {
    pub fn new(window_size: u32) -> Self {
        Self { window_size }
    }

    pub fn window_size(&self) -> u32 {
        self.window_size
    }

    pub fn similarity(&self, reference: &RgbImage, generated: &RgbImage, region: &Region) -> f64 {
        let size = self.window_size as usize;
        if region.len() < size * size {
            return 1.0;
        }

        let (width, height) = reference.dimensions();
        let (width, height) = (width as usize, height as usize);
        let Ok(inside) = Array2::from_shape_vec((height, width), region.indicator()) else {
            return 1.0;
        };

        let x = gray_to_array(&rgb_to_gray(reference)) * &inside;
        let y = gray_to_array(&rgb_to_gray(generated)) * &inside;

        let count = SummedArea::new(&inside);
        let sum_x = SummedArea::new(&x);
        let sum_y = SummedArea::new(&y);
        let sum_xx = SummedArea::new(&(&x * &x));
        let sum_yy = SummedArea::new(&(&y * &y));
        let sum_xy = SummedArea::new(&(&x * &y));

        let c1 = (K1 * DYNAMIC_RANGE).powi(2);
        let c2 = (K2 * DYNAMIC_RANGE).powi(2);

        // images narrower than the window get a clipped window
        let (win_w, win_h) = (size.min(width), size.min(height));

        let mut total = 0.0;
        let mut weight = 0.0;

        for ty in 0..=(height - win_h) {
            for tx in 0..=(width - win_w) {
                let n = count.rect_sum(tx, ty, win_w, win_h).round();
                if n < 2.0 {
                    continue;
                }

                let cov_norm = n / (n - 1.0);
                let mu_x = sum_x.rect_sum(tx, ty, win_w, win_h) / n;
                let mu_y = sum_y.rect_sum(tx, ty, win_w, win_h) / n;
                let var_x = cov_norm * (sum_xx.rect_sum(tx, ty, win_w, win_h) / n - mu_x * mu_x);
                let var_y = cov_norm * (sum_yy.rect_sum(tx, ty, win_w, win_h) / n - mu_y * mu_y);
                let cov = cov_norm * (sum_xy.rect_sum(tx, ty, win_w, win_h) / n - mu_x * mu_y);

                let numerator = (2.0 * mu_x * mu_y + c1) * (2.0 * cov + c2);
                let denominator = (mu_x * mu_x + mu_y * mu_y + c1) * (var_x + var_y + c2);

                total += n * (numerator / denominator);
                weight += n;
            }
        }

        // only reachable when every region pixel is isolated from the others
        if weight == 0.0 {
            return 1.0;
        }

        total / weight
    }
}
