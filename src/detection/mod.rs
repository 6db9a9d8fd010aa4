pub mod preprocessing;
pub mod threshold;
pub mod morphology;
pub mod watershed;
pub mod contours;
pub mod classify;

use image::{DynamicImage, GrayImage};

use crate::config::DetectionConfig;
use crate::error::Result;
use crate::models::{DetectionResult, LabelMap};
use crate::pipeline::StageImages;

/// Main detection pipeline orchestrator
///
/// Runs the five stages strictly in order: equalize, binarize, clean,
/// separate, extract. Holds nothing but its configuration, so one instance
/// can be reused across images.
#[derive(Debug, Clone, Default)]
pub struct DetectionPipeline {
    pub config: DetectionConfig,
}

impl DetectionPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: DetectionConfig) -> Self {
        self.config = config;
        self
    }

    /// Run the full detection pipeline on an image
    pub fn detect(&self, img: &DynamicImage) -> Result<DetectionResult> {
        self.detect_traced(img).map(|(result, _)| result)
    }

    /// Run the pipeline and keep every intermediate buffer.
    pub fn detect_traced(&self, img: &DynamicImage) -> Result<(DetectionResult, StageImages)> {
        self.config.validate()?;
        let config = &self.config;

        log::debug!("Converting {}x{} image to grayscale", img.width(), img.height());
        let gray = preprocessing::to_grayscale(img);

        log::debug!(
            "Equalizing contrast ({}x{} tiles, clip limit {})",
            config.clahe_grid,
            config.clahe_grid,
            config.clahe_clip_limit
        );
        let equalized =
            preprocessing::equalize_adaptive(&gray, config.clahe_grid, config.clahe_clip_limit);

        let binary = threshold::binarize(&equalized);
        let foreground = threshold::foreground_count(&binary);
        log::debug!("Binarized: {} foreground pixels", foreground);

        let cleaned =
            morphology::clean_mask(&binary, config.open_iterations, config.close_iterations);

        let distance = watershed::distance_map(&cleaned);
        let seeds = watershed::sure_foreground(&distance, config.seed_fraction);
        let markers = watershed::label_seeds(&seeds);
        log::debug!("Found {} watershed seeds", markers.region_count());
        let labels = watershed::watershed(&cleaned, &distance, markers);

        let records = classify::extract_records(&labels, &gray, config);
        let result = DetectionResult::new(records);

        if foreground == 0 {
            log::warn!("No foreground pixels after binarization; nothing to detect");
        }
        log::info!("Detected {} chromosomes", result.count);

        let stages = StageImages {
            gray,
            equalized,
            binary,
            cleaned,
            seeds,
            labels,
        };
        Ok((result, stages))
    }

    /// Label map of an image without filtering (for debugging)
    pub fn get_label_map(&self, img: &DynamicImage) -> Result<LabelMap> {
        let cleaned = self.get_cleaned_mask(img)?;
        Ok(watershed::separate_objects(&cleaned, self.config.seed_fraction))
    }

    /// Cleaned binary mask of an image (for debugging)
    pub fn get_cleaned_mask(&self, img: &DynamicImage) -> Result<GrayImage> {
        self.config.validate()?;
        let config = &self.config;
        let gray = preprocessing::to_grayscale(img);
        let equalized =
            preprocessing::equalize_adaptive(&gray, config.clahe_grid, config.clahe_clip_limit);
        let binary = threshold::binarize(&equalized);
        Ok(morphology::clean_mask(
            &binary,
            config.open_iterations,
            config.close_iterations,
        ))
    }
}
