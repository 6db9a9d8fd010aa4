use image::{GrayImage, Luma};
use imageproc::contrast::otsu_level;

pub const FOREGROUND: u8 = 255;
pub const BACKGROUND: u8 = 0;

/// Inverted Otsu binarization: pixels at or below the Otsu level become
/// foreground (255), brighter pixels background (0).
///
/// A single-valued image has no between-class variance, so the whole frame
/// is treated as background.
pub fn binarize(gray: &GrayImage) -> GrayImage {
    let (width, height) = gray.dimensions();
    let Some((min, max)) = intensity_range(gray) else {
        return GrayImage::new(width, height);
    };
    if min == max {
        return GrayImage::new(width, height);
    }

    let level = otsu_level(gray);
    log::debug!("Otsu level {} (intensity range {}..={})", level, min, max);

    let mut binary = gray.clone();
    for p in binary.pixels_mut() {
        *p = if p[0] <= level {
            Luma([FOREGROUND])
        } else {
            Luma([BACKGROUND])
        };
    }
    binary
}

pub fn foreground_count(mask: &GrayImage) -> usize {
    mask.pixels().filter(|p| p[0] != BACKGROUND).count()
}

fn intensity_range(gray: &GrayImage) -> Option<(u8, u8)> {
    gray.pixels().fold(None, |acc, p| {
        let v = p[0];
        Some(match acc {
            None => (v, v),
            Some((lo, hi)) => (lo.min(v), hi.max(v)),
        })
    })
}
