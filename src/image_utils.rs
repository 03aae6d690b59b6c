use image::{GrayImage, Luma, RgbImage, imageops::{self, FilterType}};
use ndarray::Array2;

pub fn rgb_to_gray(image: &RgbImage) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut gray = GrayImage::new(width, height);

    for (x, y, pixel) in image.enumerate_pixels() {
        let lum =
            0.299 * pixel[0] as f64 + 0.587 * pixel[1] as f64 + 0.114 * pixel[2] as f64;
        gray.put_pixel(x, y, Luma([lum.round().clamp(0.0, 255.0) as u8]));
    }

    gray
}

pub fn gray_to_array(image: &GrayImage) -> Array2<f64> {
    let (width, height) = image.dimensions();
    let mut arr = Array2::zeros((height as usize, width as usize));

    for (x, y, pixel) in image.enumerate_pixels() {
        arr[[y as usize, x as usize]] = pixel[0] as f64;
    }

    arr
}

pub fn resize_rgb_to(image: &RgbImage, width: u32, height: u32) -> RgbImage {
    if image.dimensions() == (width, height) {
        return image.clone();
    }
    imageops::resize(image, width, height, FilterType::Triangle)
}

pub fn resize_gray_to(image: &GrayImage, width: u32, height: u32) -> GrayImage {
    if image.dimensions() == (width, height) {
        return image.clone();
    }
    imageops::resize(image, width, height, FilterType::Triangle)
}

// Zero row and column in front, so any rectangle sum is four lookups.
pub struct SummedArea {
    table: Array2<f64>,
}

impl SummedArea {
    pub fn new(values: &Array2<f64>) -> Self {
        let (height, width) = values.dim();
        let mut table = Array2::zeros((height + 1, width + 1));

        for y in 0..height {
            let mut row_sum = 0.0;
            for x in 0..width {
                row_sum += values[[y, x]];
                table[[y + 1, x + 1]] = table[[y, x + 1]] + row_sum;
            }
        }

        Self { table }
    }

    pub fn window_sum(&self, x: usize, y: usize, size: usize) -> f64 {
        self.rect_sum(x, y, size, size)
    }

    pub fn rect_sum(&self, x: usize, y: usize, width: usize, height: usize) -> f64 {
        let (x2, y2) = (x + width, y + height);
        self.table[[y2, x2]] - self.table[[y, x2]] - self.table[[y2, x]] + self.table[[y, x]]
    }
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;

    #[test]
    fn test_gray_uses_bt601_weights() {
        let mut rgb = RgbImage::new(1, 1);
        rgb.put_pixel(0, 0, Rgb([255, 0, 0]));
        assert_eq!(rgb_to_gray(&rgb).get_pixel(0, 0)[0], 76);
    }

    #[test]
    fn test_window_sum_matches_direct_sum() {
        let values = Array2::from_shape_fn((5, 6), |(y, x)| (y * 6 + x) as f64);
        let table = SummedArea::new(&values);

        let mut direct = 0.0;
        for y in 1..4 {
            for x in 2..5 {
                direct += values[[y, x]];
            }
        }

        assert_eq!(table.window_sum(2, 1, 3), direct);
        assert_eq!(table.rect_sum(0, 0, 6, 5), values.sum());
    }

    #[test]
    fn test_resize_is_noop_for_matching_size() {
        let gray = GrayImage::from_pixel(4, 3, Luma([9]));
        let resized = resize_gray_to(&gray, 4, 3);
        assert_eq!(resized, gray);

        let rgb = RgbImage::from_pixel(4, 3, Rgb([1, 2, 3]));
        assert_eq!(resize_rgb_to(&rgb, 8, 6).dimensions(), (8, 6));
    }
}
