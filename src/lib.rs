pub mod analysis;
pub mod config;
pub mod detection;
pub mod error;
pub mod models;
pub mod pipeline;

pub use analysis::{AreaScore, DetectionReport, KaryotypeAssessment, flag_outliers};
pub use config::DetectionConfig;
pub use detection::DetectionPipeline;
pub use error::{KaryoscanError, Result};
pub use models::{ChromosomeRecord, Classification, DetectionResult, LabelMap, Region};
pub use pipeline::{DebugOutput, StageImages, analyze_path, load_image};
