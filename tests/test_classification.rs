mod common;
use common::*;

use image::{GrayImage, Luma};
use karyoscan::detection::classify::extract_records;

const BACKGROUND_INTENSITY: u8 = 230;
const BODY_INTENSITY: u8 = 120;
const BAND_INTENSITY: u8 = 20;

/// A single 10x20 region labelled 1 at (5, 5), with one dark band row.
fn banded_region(band_row: u32) -> (LabelMap, GrayImage) {
    let inside = |x: u32, y: u32| (5..15).contains(&x) && (5..25).contains(&y);
    let labels = LabelMap::from_fn(30, 35, |x, y| if inside(x, y) { 1 } else { 0 });
    let gray = GrayImage::from_fn(30, 35, |x, y| {
        if !inside(x, y) {
            Luma([BACKGROUND_INTENSITY])
        } else if y == 5 + band_row {
            Luma([BAND_INTENSITY])
        } else {
            Luma([BODY_INTENSITY])
        }
    });
    (labels, gray)
}

#[test]
fn darkest_row_at_top_edge_is_telocentric() {
    let (labels, gray) = banded_region(0);
    let records = extract_records(&labels, &gray, &DetectionConfig::default());

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].centromeric_index, 0.0);
    assert_eq!(records[0].classification, Classification::Telocentric);
}

#[test]
fn centromere_bands_map_to_classes() {
    // Region height is 20, so the index is band_row / 20.
    let cases = [
        (2, Classification::Telocentric),    // 0.10
        (4, Classification::Acrocentric),    // 0.20
        (5, Classification::Acrocentric),    // 0.25
        (7, Classification::Submetacentric), // 0.35
        (9, Classification::Metacentric),    // 0.45
    ];
    for (row, expected) in cases {
        let (labels, gray) = banded_region(row);
        let records = extract_records(&labels, &gray, &DetectionConfig::default());
        assert_eq!(records[0].centromeric_index, row as f64 / 20.0);
        assert_eq!(records[0].classification, expected, "band row {row}");
    }
}

#[test]
fn lower_half_centromere_is_not_folded() {
    // Mirror images of each other: a symmetric index would classify both the same.
    let (labels, gray) = banded_region(1);
    let top = extract_records(&labels, &gray, &DetectionConfig::default()).remove(0);
    let (labels, gray) = banded_region(18);
    let bottom = extract_records(&labels, &gray, &DetectionConfig::default()).remove(0);

    assert_eq!(top.centromeric_index, 0.05);
    assert_eq!(top.classification, Classification::Telocentric);
    assert_eq!(bottom.centromeric_index, 0.9);
    assert_eq!(bottom.classification, Classification::Metacentric);
}

#[test]
fn bands_partition_the_unit_interval() {
    let mut previous = Classification::from_index(0.0);
    let mut transitions = Vec::new();
    for i in 0..=1000 {
        let index = i as f64 / 1000.0;
        let class = Classification::from_index(index);
        if class != previous {
            transitions.push((index, class));
            previous = class;
        }
    }

    assert_eq!(
        transitions,
        vec![
            (0.126, Classification::Acrocentric),
            (0.251, Classification::Submetacentric),
            (0.376, Classification::Metacentric),
        ]
    );
    assert_eq!(Classification::from_index(0.0), Classification::Telocentric);
    assert_eq!(Classification::from_index(0.125), Classification::Telocentric);
    assert_eq!(Classification::from_index(1.0), Classification::Metacentric);
}

#[test]
fn extractor_applies_area_and_aspect_filters() {
    let labels = LabelMap::from_fn(80, 60, |x, y| {
        match (x, y) {
            // 8x20 upright: kept
            (2..=9, 2..=21) => 1,
            // 3x4 speck: below min_area
            (20..=22, 2..=5) => 2,
            // 20x8 lying down: fails aspect
            (30..=49, 2..=9) => 3,
            // 6x6 square: aspect 1.0
            (60..=65, 2..=7) => 4,
            // 10x30 upright: kept
            (2..=11, 28..=57) => 5,
            _ => 0,
        }
    });
    let gray = GrayImage::from_pixel(80, 60, Luma([BODY_INTENSITY]));
    let records = extract_records(&labels, &gray, &DetectionConfig::default());

    let sizes: Vec<(u32, u32, u32)> = records
        .iter()
        .map(|r| (r.area, r.bounding_width, r.bounding_height))
        .collect();
    assert_eq!(sizes, vec![(160, 8, 20), (300, 10, 30)]);
    assert_eq!(records.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2]);
}
