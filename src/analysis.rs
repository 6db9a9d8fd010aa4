//! Post-pipeline interpretation of a [`DetectionResult`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{ChromosomeRecord, DetectionResult};

/// Chromosome count of a normal human karyotype.
pub const NORMAL_CHROMOSOME_COUNT: usize = 46;

/// Three-way reading of the chromosome count against 46.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KaryotypeAssessment {
    Normal,
    DeletionOrLoss,
    DuplicationOrGain,
}

impl KaryotypeAssessment {
    pub fn from_count(count: usize) -> Self {
        use std::cmp::Ordering::*;
        match count.cmp(&NORMAL_CHROMOSOME_COUNT) {
            Equal => KaryotypeAssessment::Normal,
            Less => KaryotypeAssessment::DeletionOrLoss,
            Greater => KaryotypeAssessment::DuplicationOrGain,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            KaryotypeAssessment::Normal => "This appears to be a normal human karyotype.",
            KaryotypeAssessment::DeletionOrLoss => "This may indicate chromosomal deletion or loss.",
            KaryotypeAssessment::DuplicationOrGain => {
                "This may indicate chromosomal duplication or gain."
            }
        }
    }
}

impl fmt::Display for KaryotypeAssessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            KaryotypeAssessment::Normal => "normal",
            KaryotypeAssessment::DeletionOrLoss => "deletion/loss",
            KaryotypeAssessment::DuplicationOrGain => "duplication/gain",
        };
        f.write_str(label)
    }
}

/// Area z-score of one record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaScore {
    pub id: u32,
    pub area: u32,
    pub z_score: f64,
    pub flagged: bool,
}

/// Z-score every record's area against the sample mean and sample standard
/// deviation, flagging `|z| > z_threshold`.
///
/// With fewer than two records, or when all areas are equal, every score is
/// zero and nothing is flagged.
pub fn area_scores(records: &[ChromosomeRecord], z_threshold: f64) -> Vec<AreaScore> {
    let n = records.len();
    let (mean, std_dev) = if n >= 2 {
        let mean = records.iter().map(|r| r.area as f64).sum::<f64>() / n as f64;
        let variance = records
            .iter()
            .map(|r| {
                let d = r.area as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / (n - 1) as f64;
        (mean, variance.sqrt())
    } else {
        (0.0, 0.0)
    };

    records
        .iter()
        .map(|r| {
            let z_score = if std_dev > 0.0 {
                (r.area as f64 - mean) / std_dev
            } else {
                0.0
            };
            AreaScore {
                id: r.id,
                area: r.area,
                z_score,
                flagged: z_score.abs() > z_threshold,
            }
        })
        .collect()
}

/// Only the flagged scores.
pub fn flag_outliers(records: &[ChromosomeRecord], z_threshold: f64) -> Vec<AreaScore> {
    area_scores(records, z_threshold)
        .into_iter()
        .filter(|s| s.flagged)
        .collect()
}

/// Everything a report generator needs from one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionReport {
    pub result: DetectionResult,
    pub assessment: KaryotypeAssessment,
    pub area_scores: Vec<AreaScore>,
}

impl DetectionReport {
    pub fn new(result: DetectionResult, z_threshold: f64) -> Self {
        let assessment = KaryotypeAssessment::from_count(result.count);
        let area_scores = area_scores(&result.records, z_threshold);
        Self {
            result,
            assessment,
            area_scores,
        }
    }

    pub fn outliers(&self) -> impl Iterator<Item = &AreaScore> {
        self.area_scores.iter().filter(|s| s.flagged)
    }

    /// One-line summary, e.g. "Detected 46 chromosomes. This appears to be a
    /// normal human karyotype."
    pub fn summary(&self) -> String {
        format!(
            "Detected {} chromosomes. {}",
            self.result.count,
            self.assessment.description()
        )
    }
}
