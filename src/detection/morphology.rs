use image::GrayImage;
use imageproc::distance_transform::Norm;
use imageproc::morphology::{close, open};

/// Opening then closing with a 3x3 square element.
///
/// Each iteration grows the element's radius by one pixel, which matches
/// repeating the erosion (or dilation) that many times.
pub fn clean_mask(mask: &GrayImage, open_iterations: u8, close_iterations: u8) -> GrayImage {
    let opened = if open_iterations > 0 {
        open(mask, Norm::LInf, open_iterations)
    } else {
        mask.clone()
    };

    if close_iterations > 0 {
        close(&opened, Norm::LInf, close_iterations)
    } else {
        opened
    }
}
