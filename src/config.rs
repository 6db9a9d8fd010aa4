use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{KaryoscanError, Result};

/// Tunable policy for every stage of the detection pipeline.
///
/// Missing fields in a JSON config fall back to the defaults below, so a
/// config file only needs to name the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Histogram clip limit for adaptive equalization (relative to a flat histogram).
    pub clahe_clip_limit: f32,
    /// Number of equalization tiles along each axis.
    pub clahe_grid: u32,
    /// Radius of the 3x3 opening, i.e. erosion/dilation repetitions.
    pub open_iterations: u8,
    /// Radius of the 3x3 closing.
    pub close_iterations: u8,
    /// Fraction of the maximum distance above which a pixel seeds the watershed.
    pub seed_fraction: f64,
    /// Regions must be strictly larger than this many pixels.
    pub min_area: u32,
    /// Regions must be strictly smaller than this many pixels.
    pub max_area: u32,
    /// Regions must satisfy `height / width > min_aspect_ratio`.
    pub min_aspect_ratio: f64,
    /// Records with `|z| >` this area z-score are flagged as outliers.
    pub outlier_z_threshold: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            clahe_clip_limit: 2.0,
            clahe_grid: 8,
            open_iterations: 1,
            close_iterations: 1,
            seed_fraction: 0.5,
            min_area: 30,
            max_area: 5000,
            min_aspect_ratio: 1.05,
            outlier_z_threshold: 2.0,
        }
    }
}

impl DetectionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_area(mut self, min_area: u32) -> Self {
        self.min_area = min_area;
        self
    }

    pub fn with_max_area(mut self, max_area: u32) -> Self {
        self.max_area = max_area;
        self
    }

    pub fn with_min_aspect_ratio(mut self, ratio: f64) -> Self {
        self.min_aspect_ratio = ratio;
        self
    }

    pub fn with_seed_fraction(mut self, fraction: f64) -> Self {
        self.seed_fraction = fraction;
        self
    }

    pub fn with_morphology(mut self, open_iterations: u8, close_iterations: u8) -> Self {
        self.open_iterations = open_iterations;
        self.close_iterations = close_iterations;
        self
    }

    /// Load a JSON config from disk and validate it.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Reject values no stage can work with.
    pub fn validate(&self) -> Result<()> {
        if self.min_area >= self.max_area {
            return Err(KaryoscanError::Config(format!(
                "min_area ({}) must be below max_area ({})",
                self.min_area, self.max_area
            )));
        }
        if !(self.seed_fraction > 0.0 && self.seed_fraction <= 1.0) {
            return Err(KaryoscanError::Config(format!(
                "seed_fraction must be in (0, 1], got {}",
                self.seed_fraction
            )));
        }
        if self.clahe_grid == 0 {
            return Err(KaryoscanError::Config("clahe_grid must be at least 1".into()));
        }
        let clip_ok = self.clahe_clip_limit.is_finite() && self.clahe_clip_limit > 0.0;
        if !clip_ok {
            return Err(KaryoscanError::Config(format!(
                "clahe_clip_limit must be a positive finite number, got {}",
                self.clahe_clip_limit
            )));
        }
        if !self.min_aspect_ratio.is_finite() || !self.outlier_z_threshold.is_finite() {
            return Err(KaryoscanError::Config(
                "min_aspect_ratio and outlier_z_threshold must be finite".into(),
            ));
        }
        Ok(())
    }
}
