use image::{GrayImage, ImageBuffer, Luma};
use imageproc::distance_transform::euclidean_squared_distance_transform;
use imageproc::region_labelling::{Connectivity, connected_components};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::detection::threshold::{BACKGROUND, FOREGROUND};
use crate::models::LabelMap;

pub type DistanceMap = ImageBuffer<Luma<f64>, Vec<f64>>;

/// Split touching blobs of `mask` into separately labelled regions.
pub fn separate_objects(mask: &GrayImage, seed_fraction: f64) -> LabelMap {
    let distance = distance_map(mask);
    let seeds = sure_foreground(&distance, seed_fraction);
    let markers = label_seeds(&seeds);
    watershed(mask, &distance, markers)
}

/// Euclidean distance from every foreground pixel to the nearest background
/// pixel. Background pixels are 0; pixels beyond the image edge count as
/// background.
pub fn distance_map(mask: &GrayImage) -> DistanceMap {
    let (width, height) = mask.dimensions();

    // Inverted and padded by one pixel so the transform measures distance to
    // background, with the frame acting as background too.
    let mut background = GrayImage::from_pixel(width + 2, height + 2, Luma([FOREGROUND]));
    for (x, y, p) in mask.enumerate_pixels() {
        if p[0] != BACKGROUND {
            background.put_pixel(x + 1, y + 1, Luma([BACKGROUND]));
        }
    }

    let squared = euclidean_squared_distance_transform(&background);
    ImageBuffer::from_fn(width, height, |x, y| {
        Luma([squared.get_pixel(x + 1, y + 1)[0].sqrt()])
    })
}

/// Foreground pixels whose distance reaches `fraction` of the global maximum.
///
/// Background pixels (distance 0) never seed, whatever the fraction. Objects
/// too thin to reach the cut never get a seed and are dropped by the
/// watershed.
pub fn sure_foreground(distance: &DistanceMap, fraction: f64) -> GrayImage {
    let (width, height) = distance.dimensions();
    let max = distance.pixels().map(|p| p[0]).fold(0.0f64, f64::max);
    if max <= 0.0 {
        return GrayImage::new(width, height);
    }

    let cut = fraction * max;
    log::debug!("Distance max {:.2}, seed cut {:.2}", max, cut);

    ImageBuffer::from_fn(width, height, |x, y| {
        let d = distance.get_pixel(x, y)[0];
        if d > 0.0 && d >= cut {
            Luma([FOREGROUND])
        } else {
            Luma([BACKGROUND])
        }
    })
}

/// Give each 8-connected seed component its own positive marker.
pub fn label_seeds(seeds: &GrayImage) -> LabelMap {
    let labelled = connected_components(seeds, Connectivity::Eight, Luma([BACKGROUND]));
    LabelMap::from_fn(seeds.width(), seeds.height(), |x, y| {
        labelled.get_pixel(x, y)[0] as i32
    })
}

#[derive(Debug)]
struct FloodEntry {
    depth: f64,
    order: u64,
    index: usize,
}

impl PartialEq for FloodEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FloodEntry {}

impl Ord for FloodEntry {
    // Max-heap: deepest first, then first-queued first.
    fn cmp(&self, other: &Self) -> Ordering {
        self.depth
            .total_cmp(&other.depth)
            .then_with(|| other.order.cmp(&self.order))
    }
}

impl PartialOrd for FloodEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Marker-based watershed over the negated distance surface.
///
/// Flooding starts at the markers and proceeds through foreground pixels from
/// the object interiors outwards. A pixel whose labelled 4-neighbours agree
/// joins that label; one touching two different labels becomes a ridge
/// (`LabelMap::BOUNDARY`). Ridges do not propagate. Foreground pixels never
/// reached from a marker stay at `LabelMap::BACKGROUND`.
pub fn watershed(mask: &GrayImage, distance: &DistanceMap, markers: LabelMap) -> LabelMap {
    let (width, height) = mask.dimensions();
    assert_eq!(markers.dimensions(), (width, height), "marker size mismatch");

    let w = width as usize;
    let h = height as usize;
    let mut labels = markers.as_slice().to_vec();
    let is_foreground = |i: usize| mask.as_raw()[i] != BACKGROUND;
    let depth = |i: usize| distance.as_raw()[i];

    let mut queued = vec![false; labels.len()];
    let mut heap = BinaryHeap::new();
    let mut order = 0u64;

    let mut enqueue_neighbours = |i: usize,
                                  labels: &[i32],
                                  queued: &mut [bool],
                                  heap: &mut BinaryHeap<FloodEntry>| {
        for n in neighbours4(i, w, h).into_iter().flatten() {
            if !queued[n] && labels[n] == LabelMap::BACKGROUND && is_foreground(n) {
                queued[n] = true;
                heap.push(FloodEntry {
                    depth: depth(n),
                    order,
                    index: n,
                });
                order += 1;
            }
        }
    };

    for i in 0..labels.len() {
        if labels[i] > 0 {
            enqueue_neighbours(i, &labels, &mut queued, &mut heap);
        }
    }

    while let Some(FloodEntry { index, .. }) = heap.pop() {
        let mut label = LabelMap::BACKGROUND;
        for n in neighbours4(index, w, h).into_iter().flatten() {
            let l = labels[n];
            if l <= 0 {
                continue;
            }
            if label == LabelMap::BACKGROUND {
                label = l;
            } else if label != l {
                label = LabelMap::BOUNDARY;
                break;
            }
        }

        labels[index] = label;
        if label > 0 {
            enqueue_neighbours(index, &labels, &mut queued, &mut heap);
        }
    }

    let map = LabelMap::from_raw(width, height, labels)
        .expect("label buffer keeps the mask dimensions");
    log::debug!(
        "Watershed: {} regions, {} ridge pixels",
        map.region_count(),
        map.boundary_pixel_count()
    );
    map
}

fn neighbours4(i: usize, w: usize, h: usize) -> [Option<usize>; 4] {
    let x = i % w;
    let y = i / w;
    [
        (y > 0).then(|| i - w),
        (x > 0).then(|| i - 1),
        (x + 1 < w).then(|| i + 1),
        (y + 1 < h).then(|| i + w),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disc_mask(width: u32, height: u32, discs: &[(f64, f64, f64)]) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            let inside = discs.iter().any(|&(cx, cy, r)| {
                let dx = x as f64 - cx;
                let dy = y as f64 - cy;
                dx * dx + dy * dy <= r * r
            });
            Luma([if inside { FOREGROUND } else { BACKGROUND }])
        })
    }

    #[test]
    fn distance_grows_towards_the_interior() {
        let mut mask = GrayImage::new(11, 11);
        for y in 2..9 {
            for x in 2..9 {
                mask.put_pixel(x, y, Luma([FOREGROUND]));
            }
        }
        let distance = distance_map(&mask);
        assert_eq!(distance.get_pixel(0, 0)[0], 0.0);
        assert_eq!(distance.get_pixel(2, 5)[0], 1.0);
        assert_eq!(distance.get_pixel(5, 5)[0], 4.0);
    }

    #[test]
    fn frame_counts_as_background() {
        let mask = GrayImage::from_pixel(5, 5, Luma([FOREGROUND]));
        let distance = distance_map(&mask);
        assert_eq!(distance.get_pixel(0, 2)[0], 1.0);
        assert_eq!(distance.get_pixel(2, 2)[0], 3.0);
    }

    #[test]
    fn background_stays_unlabelled_for_any_fraction() {
        let mask = disc_mask(64, 40, &[(20.0, 20.0, 12.0), (42.0, 20.0, 12.0)]);
        for fraction in [0.0, 1e-9, 0.3, 0.5, 1.0] {
            let labels = separate_objects(&mask, fraction);
            assert!(labels.region_count() >= 1, "fraction {fraction}");
            for (x, y, p) in mask.enumerate_pixels() {
                if p[0] == BACKGROUND {
                    assert_eq!(
                        labels.get(x, y),
                        LabelMap::BACKGROUND,
                        "fraction {fraction} at ({x}, {y})"
                    );
                }
            }
        }
    }

    #[test]
    fn zero_fraction_seeds_only_foreground() {
        let mask = disc_mask(30, 30, &[(15.0, 15.0, 8.0)]);
        let seeds = sure_foreground(&distance_map(&mask), 0.0);
        assert_eq!(seeds, mask);
    }

    #[test]
    fn empty_mask_yields_no_regions() {
        let mask = GrayImage::new(20, 20);
        let labels = separate_objects(&mask, 0.5);
        assert_eq!(labels.region_count(), 0);
        assert!(labels.as_slice().iter().all(|&l| l == 0));
    }

    #[test]
    fn touching_discs_are_split_at_the_waist() {
        let mask = disc_mask(64, 40, &[(20.0, 20.0, 12.0), (42.0, 20.0, 12.0)]);
        let labels = separate_objects(&mask, 0.5);

        assert_eq!(labels.region_count(), 2);
        assert!(labels.boundary_pixel_count() > 0);
        let left = labels.get(20, 20);
        let right = labels.get(42, 20);
        assert!(left > 0 && right > 0);
        assert_ne!(left, right);
    }

    #[test]
    fn every_seeded_foreground_pixel_is_resolved() {
        let mask = disc_mask(64, 40, &[(20.0, 20.0, 12.0), (42.0, 20.0, 12.0)]);
        let labels = separate_objects(&mask, 0.5);
        for (x, y, p) in mask.enumerate_pixels() {
            let l = labels.get(x, y);
            if p[0] == BACKGROUND {
                assert_eq!(l, LabelMap::BACKGROUND);
            } else {
                assert_ne!(l, LabelMap::BACKGROUND, "unresolved pixel at ({x}, {y})");
            }
        }
    }

    #[test]
    fn high_seed_fraction_drops_thin_objects() {
        let mut mask = GrayImage::new(60, 60);
        for y in 5..45 {
            for x in 5..25 {
                mask.put_pixel(x, y, Luma([FOREGROUND]));
            }
        }
        for y in 10..16 {
            for x in 40..46 {
                mask.put_pixel(x, y, Luma([FOREGROUND]));
            }
        }

        assert_eq!(separate_objects(&mask, 0.2).region_count(), 2);

        let labels = separate_objects(&mask, 0.9);
        assert_eq!(labels.region_count(), 1);
        assert_eq!(labels.get(42, 12), LabelMap::BACKGROUND);
    }
}
