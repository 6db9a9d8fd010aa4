use image::GrayImage;

use crate::config::DetectionConfig;
use crate::detection::contours::find_regions;
use crate::models::{ChromosomeRecord, Classification, LabelMap, Region};

/// Keep regions inside the area band that are taller than wide.
///
/// Degenerate boxes (zero width or height) are dropped here so nothing
/// downstream divides by zero.
pub fn filter_chromosomes(regions: &[Region], config: &DetectionConfig) -> Vec<Region> {
    regions
        .iter()
        .filter(|r| {
            let keep = r.width() > 0
                && r.height() > 0
                && r.is_reasonable_size(config.min_area, config.max_area)
                && r.is_elongated(config.min_aspect_ratio);
            log::trace!(
                "Region {}: area={}, aspect={:.2} -> {}",
                r.label,
                r.area(),
                r.aspect_ratio(),
                if keep { "kept" } else { "dropped" }
            );
            keep
        })
        .cloned()
        .collect()
}

/// Row sums of `gray` over the region's own pixels, one entry per bounding-box row.
pub fn intensity_profile(region: &Region, labels: &LabelMap, gray: &GrayImage) -> Vec<u64> {
    (region.min_y..=region.max_y)
        .map(|y| {
            (region.min_x..=region.max_x)
                .filter(|&x| labels.get(x, y) == region.label)
                .map(|x| gray.get_pixel(x, y)[0] as u64)
                .sum()
        })
        .collect()
}

/// Position of the darkest profile row as a fraction of the region height.
///
/// The first minimum wins on ties. The index is measured from the top edge
/// and is not folded about the midline, so a constriction in the lower half
/// reads above 0.5.
pub fn centromeric_index(profile: &[u64]) -> f64 {
    if profile.is_empty() {
        return 0.0;
    }
    let (row, _) = profile
        .iter()
        .enumerate()
        .fold((0, u64::MAX), |(best_row, best), (row, &sum)| {
            if sum < best { (row, sum) } else { (best_row, best) }
        });
    row as f64 / profile.len() as f64
}

/// Build records for every accepted region of `labels`.
///
/// IDs follow the bounding-box top-left corner (row first, then column), so
/// repeated runs number the same objects the same way.
pub fn extract_records(
    labels: &LabelMap,
    gray: &GrayImage,
    config: &DetectionConfig,
) -> Vec<ChromosomeRecord> {
    let regions = find_regions(labels);
    let mut accepted = filter_chromosomes(&regions, config);
    log::debug!(
        "Kept {} of {} regions (area {}..{}, aspect > {})",
        accepted.len(),
        regions.len(),
        config.min_area,
        config.max_area,
        config.min_aspect_ratio
    );

    accepted.sort_by_key(|r| (r.min_y, r.min_x, r.label));

    accepted
        .iter()
        .enumerate()
        .map(|(i, region)| {
            let profile = intensity_profile(region, labels, gray);
            let index = centromeric_index(&profile);
            ChromosomeRecord {
                id: i as u32 + 1,
                x: region.min_x,
                y: region.min_y,
                area: region.area(),
                perimeter: region.perimeter(),
                bounding_width: region.width(),
                bounding_height: region.height(),
                aspect_ratio: region.aspect_ratio(),
                centromeric_index: index,
                classification: Classification::from_index(index),
                boundary: region.boundary.iter().map(|p| (p.x, p.y)).collect(),
            }
        })
        .collect()
}
