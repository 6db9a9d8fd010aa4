use image::{GrayImage, Luma};
use imageproc::contours::{BorderType, find_contours};
use imageproc::point::Point;
use std::collections::BTreeMap;

use crate::detection::threshold::FOREGROUND;
use crate::models::{LabelMap, Region};

/// Collect one `Region` per positive label, in ascending label order.
pub fn find_regions(labels: &LabelMap) -> Vec<Region> {
    // label -> (min_x, min_y, max_x, max_y, count)
    let mut extents: BTreeMap<i32, (u32, u32, u32, u32, u32)> = BTreeMap::new();

    let (width, height) = labels.dimensions();
    for y in 0..height {
        for x in 0..width {
            let label = labels.get(x, y);
            if label <= 0 {
                continue; // Background and ridges
            }

            extents
                .entry(label)
                .and_modify(|(min_x, min_y, max_x, max_y, count)| {
                    *min_x = (*min_x).min(x);
                    *min_y = (*min_y).min(y);
                    *max_x = (*max_x).max(x);
                    *max_y = (*max_y).max(y);
                    *count += 1;
                })
                .or_insert((x, y, x, y, 1));
        }
    }

    extents
        .into_iter()
        .map(|(label, (min_x, min_y, max_x, max_y, count))| {
            let mut region = Region {
                label,
                min_x,
                min_y,
                max_x,
                max_y,
                pixel_count: count,
                boundary: Vec::new(),
            };
            region.boundary = trace_boundary(labels, &region);
            region
        })
        .collect()
}

/// Outer boundary of a region, traced on a padded crop of its bounding box
/// and shifted back to image coordinates.
fn trace_boundary(labels: &LabelMap, region: &Region) -> Vec<Point<i32>> {
    let crop = GrayImage::from_fn(region.width() + 2, region.height() + 2, |cx, cy| {
        let inside = cx >= 1
            && cy >= 1
            && cx <= region.width()
            && cy <= region.height()
            && labels.get(region.min_x + cx - 1, region.min_y + cy - 1) == region.label;
        Luma([if inside { FOREGROUND } else { 0 }])
    });

    let offset_x = region.min_x as i32 - 1;
    let offset_y = region.min_y as i32 - 1;

    find_contours::<i32>(&crop)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer)
        .max_by_key(|c| c.points.len())
        .map(|c| {
            c.points
                .into_iter()
                .map(|p| Point::new(p.x + offset_x, p.y + offset_y))
                .collect()
        })
        .unwrap_or_default()
}
