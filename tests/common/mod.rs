mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from karyoscan for tests
pub use karyoscan::{
    ChromosomeRecord, Classification, DetectionConfig, DetectionPipeline, DetectionReport,
    DetectionResult, KaryoscanError, KaryotypeAssessment, LabelMap,
};
