use image::{DynamicImage, GrayImage, Luma};
use karyoscan::{DetectionConfig, DetectionPipeline, DetectionResult};
use tempfile::NamedTempFile;

pub const PAPER: u8 = 255;
pub const STAIN: u8 = 40;

/// Axis-aligned dark rectangle: top-left corner and size.
#[derive(Debug, Clone, Copy)]
pub struct Blob {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Blob {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }

    pub fn area(&self) -> u32 {
        self.width * self.height
    }
}

/// Dark blobs on a white background.
pub fn draw_blobs(width: u32, height: u32, blobs: &[Blob]) -> DynamicImage {
    let gray = GrayImage::from_fn(width, height, |x, y| {
        if blobs.iter().any(|b| b.contains(x, y)) {
            Luma([STAIN])
        } else {
            Luma([PAPER])
        }
    });
    DynamicImage::ImageLuma8(gray)
}

pub fn blank_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageLuma8(GrayImage::from_pixel(width, height, Luma([PAPER])))
}

/// `count` upright 8x20 blobs on a 10-column grid, well apart from each
/// other and from the frame.
pub fn blob_grid(count: u32) -> (DynamicImage, Vec<Blob>) {
    let columns = 10;
    let rows = count.div_ceil(columns).max(1);
    let blobs: Vec<Blob> = (0..count)
        .map(|i| Blob::new(12 + (i % columns) * 24, 12 + (i / columns) * 36, 8, 20))
        .collect();
    let img = draw_blobs(12 + columns * 24, 12 + rows * 36, &blobs);
    (img, blobs)
}

/// Saves an image to a temporary PNG and returns the temp file.
/// The file will be automatically cleaned up when dropped.
pub fn save_temp_png(img: &DynamicImage) -> NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("Failed to create temp image file");
    img.save_with_format(file.path(), image::ImageFormat::Png)
        .expect("Failed to save test image");
    file
}

pub fn detect(img: &DynamicImage, config: DetectionConfig) -> DetectionResult {
    DetectionPipeline::new()
        .with_config(config)
        .detect(img)
        .expect("detection should succeed")
}
