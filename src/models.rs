use imageproc::point::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-pixel region identifiers produced by the object separator.
///
/// `0` is background (or foreground that no seed reached), `-1` marks a
/// watershed ridge between two regions, and positive values are region IDs.
/// The map has no mutators; it is handed from the separator to the extractor
/// by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMap {
    width: u32,
    height: u32,
    labels: Vec<i32>,
}

impl LabelMap {
    pub const BACKGROUND: i32 = 0;
    pub const BOUNDARY: i32 = -1;

    /// Build a label map from a row-major label buffer.
    ///
    /// Returns `None` when the buffer length does not match the dimensions.
    pub fn from_raw(width: u32, height: u32, labels: Vec<i32>) -> Option<Self> {
        if labels.len() != width as usize * height as usize {
            return None;
        }
        Some(Self { width, height, labels })
    }

    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> i32) -> Self {
        let mut labels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                labels.push(f(x, y));
            }
        }
        Self { width, height, labels }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Label at `(x, y)`. Panics when out of bounds, like `ImageBuffer::get_pixel`.
    pub fn get(&self, x: u32, y: u32) -> i32 {
        assert!(x < self.width && y < self.height, "label ({x}, {y}) out of bounds");
        self.labels[y as usize * self.width as usize + x as usize]
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.labels
    }

    /// Distinct positive labels in ascending order.
    pub fn region_labels(&self) -> Vec<i32> {
        let mut ids: Vec<i32> = self.labels.iter().copied().filter(|&l| l > 0).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    pub fn region_count(&self) -> usize {
        self.region_labels().len()
    }

    pub fn boundary_pixel_count(&self) -> usize {
        self.labels.iter().filter(|&&l| l == Self::BOUNDARY).count()
    }
}

/// A single labelled region: extent, size and outer boundary curve.
#[derive(Debug, Clone)]
pub struct Region {
    pub label: i32,
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
    pub pixel_count: u32,
    /// Closed outer boundary in image coordinates.
    pub boundary: Vec<Point<i32>>,
}

impl Region {
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    pub fn area(&self) -> u32 {
        self.pixel_count
    }

    /// Length of the closed boundary polyline.
    pub fn perimeter(&self) -> f64 {
        let n = self.boundary.len();
        if n < 2 {
            return 0.0;
        }
        let mut length = 0.0;
        for i in 0..n {
            let p1 = self.boundary[i];
            let p2 = self.boundary[(i + 1) % n];
            let dx = (p1.x - p2.x) as f64;
            let dy = (p1.y - p2.y) as f64;
            length += (dx * dx + dy * dy).sqrt();
        }
        length
    }

    /// Height over width of the bounding box; 0 for a degenerate box.
    pub fn aspect_ratio(&self) -> f64 {
        let w = self.width() as f64;
        if w == 0.0 {
            return 0.0;
        }
        self.height() as f64 / w
    }

    pub fn is_reasonable_size(&self, min_area: u32, max_area: u32) -> bool {
        let area = self.area();
        min_area < area && area < max_area
    }

    pub fn is_elongated(&self, min_aspect_ratio: f64) -> bool {
        self.aspect_ratio() > min_aspect_ratio
    }
}

/// Structural class derived from the centromeric index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Telocentric,
    Acrocentric,
    Submetacentric,
    Metacentric,
}

impl Classification {
    /// Map a centromeric index onto the four fixed bands.
    ///
    /// `<= 0.125` telocentric, `<= 0.25` acrocentric, `<= 0.375`
    /// submetacentric, anything above metacentric.
    pub fn from_index(index: f64) -> Self {
        if index <= 0.125 {
            Classification::Telocentric
        } else if index <= 0.25 {
            Classification::Acrocentric
        } else if index <= 0.375 {
            Classification::Submetacentric
        } else {
            Classification::Metacentric
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Telocentric => "telocentric",
            Classification::Acrocentric => "acrocentric",
            Classification::Submetacentric => "submetacentric",
            Classification::Metacentric => "metacentric",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Measurements for one accepted chromosome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChromosomeRecord {
    pub id: u32,
    /// Bounding box origin in the input image.
    pub x: u32,
    pub y: u32,
    pub area: u32,
    pub perimeter: f64,
    pub bounding_width: u32,
    pub bounding_height: u32,
    pub aspect_ratio: f64,
    pub centromeric_index: f64,
    pub classification: Classification,
    /// Closed outer boundary as `(x, y)` pairs, for overlay renderers.
    pub boundary: Vec<(i32, i32)>,
}

/// Final pipeline output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub count: usize,
    pub records: Vec<ChromosomeRecord>,
}

impl DetectionResult {
    pub fn new(records: Vec<ChromosomeRecord>) -> Self {
        Self {
            count: records.len(),
            records,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
