use image::{DynamicImage, GrayImage, ImageReader, Rgb, RgbImage};
use std::path::{Path, PathBuf};

use crate::config::DetectionConfig;
use crate::detection::DetectionPipeline;
use crate::error::{KaryoscanError, Result};
use crate::models::{DetectionResult, LabelMap};

/// Intermediate buffers of one pipeline run, in stage order.
#[derive(Debug, Clone)]
pub struct StageImages {
    /// Grayscale input before equalization (used for intensity profiles).
    pub gray: GrayImage,
    pub equalized: GrayImage,
    pub binary: GrayImage,
    pub cleaned: GrayImage,
    /// Watershed seeds ("sure foreground").
    pub seeds: GrayImage,
    pub labels: LabelMap,
}

/// Load and decode an image file.
pub fn load_image(path: impl AsRef<Path>) -> Result<DynamicImage> {
    let path = path.as_ref();
    let load_err = |source| KaryoscanError::Load {
        path: path.to_path_buf(),
        source,
    };

    ImageReader::open(path)
        .map_err(|e| load_err(image::ImageError::IoError(e)))?
        .with_guessed_format()
        .map_err(|e| load_err(image::ImageError::IoError(e)))?
        .decode()
        .map_err(load_err)
}

/// Load an image and run the detection pipeline on it.
pub fn analyze_path(path: impl AsRef<Path>, config: &DetectionConfig) -> Result<DetectionResult> {
    let img = load_image(path)?;
    DetectionPipeline::new().with_config(config.clone()).detect(&img)
}

/// Destination for intermediate stage images.
#[derive(Clone, Debug)]
pub struct DebugOutput {
    pub output_dir: PathBuf,
}

impl DebugOutput {
    /// The directory must be empty or non-existent; it is created if missing.
    pub fn new(output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(KaryoscanError::DebugDirNotEmpty(output_dir));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        Ok(Self { output_dir })
    }

    /// Write every stage buffer as a PNG and return the written paths.
    pub fn save(&self, stages: &StageImages) -> Result<Vec<PathBuf>> {
        let outputs = [
            ("gray.png", DynamicImage::ImageLuma8(stages.gray.clone())),
            ("equalized.png", DynamicImage::ImageLuma8(stages.equalized.clone())),
            ("binary.png", DynamicImage::ImageLuma8(stages.binary.clone())),
            ("cleaned.png", DynamicImage::ImageLuma8(stages.cleaned.clone())),
            ("sure_fg.png", DynamicImage::ImageLuma8(stages.seeds.clone())),
            ("labels.png", DynamicImage::ImageRgb8(colorize_labels(&stages.labels))),
        ];

        let mut written = Vec::with_capacity(outputs.len());
        for (name, img) in outputs {
            let path = self.output_dir.join(name);
            img.save(&path)?;
            log::debug!("Debug: saved {}", path.display());
            written.push(path);
        }
        Ok(written)
    }
}

/// False-colour rendering of a label map: black background, white ridges,
/// a stable colour per region.
pub fn colorize_labels(labels: &LabelMap) -> RgbImage {
    let (width, height) = labels.dimensions();
    RgbImage::from_fn(width, height, |x, y| match labels.get(x, y) {
        LabelMap::BACKGROUND => Rgb([0, 0, 0]),
        LabelMap::BOUNDARY => Rgb([255, 255, 255]),
        label => label_colour(label),
    })
}

fn label_colour(label: i32) -> Rgb<u8> {
    // Multiplicative hash keeps neighbouring IDs visually distinct.
    let h = (label as u32).wrapping_mul(2_654_435_761);
    Rgb([
        64 + (h >> 24) as u8 % 192,
        64 + (h >> 16) as u8 % 192,
        64 + (h >> 8) as u8 % 192,
    ])
}
