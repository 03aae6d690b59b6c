use image::GrayImage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    width: u32,
    height: u32,
    selected: Vec<bool>,
    count: usize,
}

impl Region {
    fn from_selection(width: u32, height: u32, selected: Vec<bool>) -> Self {
        let count = selected.iter().filter(|&&s| s).count();
        Self { width, height, selected, count }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.selected[(y * self.width + x) as usize]
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let width = self.width;
        self.selected
            .iter()
            .enumerate()
            .filter(|&(_, &s)| s)
            .map(move |(i, _)| (i as u32 % width, i as u32 / width))
    }

    pub fn indicator(&self) -> Vec<f64> {
        self.selected.iter().map(|&s| if s { 1.0 } else { 0.0 }).collect()
    }
}

#[derive(Debug, Clone)]
pub struct SceneRegions {
    pub foreground: Region,
    pub background: Region,
    pub ring: Region,
}

#[derive(Debug, Clone)]
pub struct RegionMask {
    width: u32,
    height: u32,
    foreground: Vec<bool>,
}

impl RegionMask {
    pub fn from_gray(mask: &GrayImage, threshold: u8) -> Self {
        let (width, height) = mask.dimensions();
        let foreground = mask.pixels().map(|p| p[0] > threshold).collect();

        Self { width, height, foreground }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn foreground(&self) -> Region {
        Region::from_selection(self.width, self.height, self.foreground.clone())
    }

    pub fn background(&self) -> Region {
        let selected = self.foreground.iter().map(|&f| !f).collect();
        Region::from_selection(self.width, self.height, selected)
    }

    pub fn regions(&self, ring_width: u32) -> SceneRegions {
        SceneRegions {
            foreground: self.foreground(),
            background: self.background(),
            ring: self.boundary_ring(ring_width),
        }
    }

    // ellipse of side 2 * (width / 2) + 1; a width below 2 gives an empty ring
    pub fn boundary_ring(&self, width: u32) -> Region {
        let offsets = elliptical_offsets(width / 2);
        let dilated = self.morph(&offsets, true);
        let eroded = self.morph(&offsets, false);

        let selected = dilated
            .iter()
            .zip(&eroded)
            .map(|(&d, &e)| d && !e)
            .collect();

        Region::from_selection(self.width, self.height, selected)
    }

    // Out-of-image neighbours are skipped, so an all-foreground mask
    // survives erosion untouched.
    fn morph(&self, offsets: &[(i64, i64)], dilate: bool) -> Vec<bool> {
        let (width, height) = (self.width as i64, self.height as i64);
        let mut result = vec![false; self.foreground.len()];

        for y in 0..height {
            for x in 0..width {
                let mut hit = !dilate;

                for &(dx, dy) in offsets {
                    let nx = x + dx;
                    let ny = y + dy;

                    if nx < 0 || nx >= width || ny < 0 || ny >= height {
                        continue;
                    }

                    let value = self.foreground[(ny * width + nx) as usize];
                    if dilate && value {
                        hit = true;
                        break;
                    }
                    if !dilate && !value {
                        hit = false;
                        break;
                    }
                }

                result[(y * width + x) as usize] = hit;
            }
        }

        result
    }
}

fn elliptical_offsets(radius: u32) -> Vec<(i64, i64)> {
    let r = radius as i64;
    let mut offsets = Vec::new();

    for dy in -r..=r {
        let half_span = ((r * r - dy * dy) as f64).sqrt().round() as i64;
        for dx in -half_span..=half_span {
            offsets.push((dx, dy));
        }
    }

    offsets
}
