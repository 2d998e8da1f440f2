use common_types::Palette;

use crate::octree::OctreeQuantizer;

/// Cap on palette-training samples taken from a single frame at the
/// default quality. Tunable, not a contract.
pub const MAX_TRAINING_SAMPLES: usize = 50_000;

const DEFAULT_QUALITY: usize = 10;

/// Pixel stride used when feeding one frame into the quantizer.
///
/// At the default quality a frame contributes at most ~50k samples; higher
/// quality values sample more coarsely, lower values more densely. Small
/// frames always sample every pixel.
pub fn sampling_stride(pixel_count: usize, quality: u8) -> usize {
    let quality = quality.clamp(1, 30) as usize;
    let target = MAX_TRAINING_SAMPLES * DEFAULT_QUALITY / quality;
    (pixel_count / target).max(1)
}

/// Feed a frame's pixels into the octree at the given stride.
pub fn sample_frame(octree: &mut OctreeQuantizer, rgba: &[u8], stride: usize) {
    for px in rgba.chunks_exact(4).step_by(stride.max(1)) {
        octree.add_color(px[0], px[1], px[2]);
    }
}

/// Map one RGBA frame onto the shared palette, one index byte per pixel.
pub fn index_frame(
    rgba: &[u8],
    width: usize,
    height: usize,
    palette: &Palette,
    dither: bool,
) -> Vec<u8> {
    if dither {
        dither_frame(rgba, width, height, palette)
    } else {
        rgba.chunks_exact(4)
            .map(|px| palette.nearest(px[0], px[1], px[2]))
            .collect()
    }
}

/// Floyd-Steinberg error diffusion against the shared palette.
///
/// Two per-row error buffers (current and next) are swapped at the start of
/// each scanline and the fresh next-row buffer is zeroed afterwards, so
/// accumulated error is always consumed before it is cleared.
fn dither_frame(rgba: &[u8], width: usize, height: usize, palette: &Palette) -> Vec<u8> {
    let mut indices = vec![0u8; width * height];
    let mut curr_err = vec![0f32; width * 3];
    let mut next_err = vec![0f32; width * 3];

    for y in 0..height {
        std::mem::swap(&mut curr_err, &mut next_err);
        next_err.fill(0.0);

        for x in 0..width {
            let i = y * width + x;
            let px = &rgba[i * 4..i * 4 + 4];

            // True color plus accumulated error, clamped to channel range
            let r = (px[0] as f32 + curr_err[x * 3]).clamp(0.0, 255.0);
            let g = (px[1] as f32 + curr_err[x * 3 + 1]).clamp(0.0, 255.0);
            let b = (px[2] as f32 + curr_err[x * 3 + 2]).clamp(0.0, 255.0);

            let index = palette.nearest(r.round() as u8, g.round() as u8, b.round() as u8);
            indices[i] = index;

            let chosen = palette.colors()[index as usize];
            let er = r - chosen[0] as f32;
            let eg = g - chosen[1] as f32;
            let eb = b - chosen[2] as f32;

            // Right: 7/16
            if x + 1 < width {
                curr_err[(x + 1) * 3] += er * 7.0 / 16.0;
                curr_err[(x + 1) * 3 + 1] += eg * 7.0 / 16.0;
                curr_err[(x + 1) * 3 + 2] += eb * 7.0 / 16.0;
            }
            if y + 1 < height {
                // Lower-left: 3/16
                if x > 0 {
                    next_err[(x - 1) * 3] += er * 3.0 / 16.0;
                    next_err[(x - 1) * 3 + 1] += eg * 3.0 / 16.0;
                    next_err[(x - 1) * 3 + 2] += eb * 3.0 / 16.0;
                }
                // Lower: 5/16
                next_err[x * 3] += er * 5.0 / 16.0;
                next_err[x * 3 + 1] += eg * 5.0 / 16.0;
                next_err[x * 3 + 2] += eb * 5.0 / 16.0;
                // Lower-right: 1/16
                if x + 1 < width {
                    next_err[(x + 1) * 3] += er * 1.0 / 16.0;
                    next_err[(x + 1) * 3 + 1] += eg * 1.0 / 16.0;
                    next_err[(x + 1) * 3 + 2] += eb * 1.0 / 16.0;
                }
            }
        }
    }

    indices
}
