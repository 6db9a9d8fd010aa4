use image::{DynamicImage, GrayImage, ImageBuffer, Luma};

/// Convert image to grayscale
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Contrast-limited adaptive histogram equalization.
///
/// The image is split into a `grid x grid` layout of tiles. Each tile's
/// histogram is clipped at `clip_limit * tile_area / 256`, the clipped excess
/// is spread evenly over all bins, and every pixel is mapped through a
/// bilinear blend of the four nearest tile lookup tables.
pub fn equalize_adaptive(gray: &GrayImage, grid: u32, clip_limit: f32) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return gray.clone();
    }

    let grid = grid.max(1);
    let tile_w = width.div_ceil(grid);
    let tile_h = height.div_ceil(grid);
    let tiles_x = width.div_ceil(tile_w);
    let tiles_y = height.div_ceil(tile_h);

    let mut luts = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(width);
            let y1 = (y0 + tile_h).min(height);

            let mut hist = [0u32; 256];
            for y in y0..y1 {
                for x in x0..x1 {
                    hist[gray.get_pixel(x, y)[0] as usize] += 1;
                }
            }
            luts.push(tile_lut(&mut hist, (x1 - x0) * (y1 - y0), clip_limit));
        }
    }

    let lut_at = |tx: u32, ty: u32| &luts[(ty * tiles_x + tx) as usize];

    ImageBuffer::from_fn(width, height, |x, y| {
        let v = gray.get_pixel(x, y)[0] as usize;

        let fx = (x as f32 + 0.5) / tile_w as f32 - 0.5;
        let fy = (y as f32 + 0.5) / tile_h as f32 - 0.5;
        let (tx0, tx1, wx) = neighbour_tiles(fx, tiles_x);
        let (ty0, ty1, wy) = neighbour_tiles(fy, tiles_y);

        let top = (1.0 - wx) * lut_at(tx0, ty0)[v] as f32 + wx * lut_at(tx1, ty0)[v] as f32;
        let bottom = (1.0 - wx) * lut_at(tx0, ty1)[v] as f32 + wx * lut_at(tx1, ty1)[v] as f32;
        let mapped = (1.0 - wy) * top + wy * bottom;

        Luma([mapped.round().clamp(0.0, 255.0) as u8])
    })
}

/// Tile indices bracketing a fractional tile coordinate and the blend weight
/// of the second one.
fn neighbour_tiles(f: f32, tiles: u32) -> (u32, u32, f32) {
    let floor = f.floor();
    let last = tiles as i64 - 1;
    let t0 = (floor as i64).clamp(0, last) as u32;
    let t1 = (floor as i64 + 1).clamp(0, last) as u32;
    (t0, t1, f - floor)
}

/// Clip a tile histogram, redistribute the excess and turn it into a
/// cumulative lookup table. The full-scale level always maps to 255.
fn tile_lut(hist: &mut [u32; 256], area: u32, clip_limit: f32) -> [u8; 256] {
    let limit = ((clip_limit * area as f32 / 256.0) as u32).max(1);

    let mut excess = 0u32;
    for bin in hist.iter_mut() {
        if *bin > limit {
            excess += *bin - limit;
            *bin = limit;
        }
    }

    let share = excess / 256;
    let mut residual = excess % 256;
    for bin in hist.iter_mut() {
        *bin += share;
    }
    if residual > 0 {
        let step = (256 / residual).max(1) as usize;
        let mut i = 0;
        while residual > 0 && i < 256 {
            hist[i] += 1;
            residual -= 1;
            i += step;
        }
    }

    let scale = 255.0 / area.max(1) as f32;
    let mut lut = [0u8; 256];
    let mut cdf = 0u32;
    for (level, count) in hist.iter().enumerate() {
        cdf += count;
        lut[level] = (cdf as f32 * scale).round().min(255.0) as u8;
    }
    lut
}
