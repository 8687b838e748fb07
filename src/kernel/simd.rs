//! SIMD numerator kernel using the `wide` crate.
//!
//! The template row loop is vectorized 8 samples at a time with `f32x8`;
//! the tail of each row falls back to scalar accumulation.

use crate::kernel::Kernel;
use crate::template::TemplatePlan;
use crate::ImageView;
use wide::f32x8;

const LANES: usize = 8;

/// Load 8 u8 values and convert to f32x8.
#[inline]
fn load_u8x8_as_f32x8(slice: &[u8]) -> f32x8 {
    let mut lanes = [0.0f32; LANES];
    for (lane, &v) in lanes.iter_mut().zip(&slice[..LANES]) {
        *lane = v as f32;
    }
    f32x8::from(lanes)
}

/// Load 8 f32 values into f32x8.
#[inline]
fn load_f32x8(slice: &[f32]) -> f32x8 {
    let mut lanes = [0.0f32; LANES];
    lanes.copy_from_slice(&slice[..LANES]);
    f32x8::from(lanes)
}

/// Horizontal sum of f32x8.
#[inline]
fn hsum(v: f32x8) -> f32 {
    v.to_array().iter().sum()
}

/// SIMD-accelerated numerator kernel.
pub struct DotSimd;

impl Kernel for DotSimd {
    fn dot_at(image: ImageView<'_, u8>, plan: &TemplatePlan, x: usize, y: usize) -> f32 {
        let tpl_width = plan.width();
        let t_prime = plan.zero_mean();
        let simd_end = tpl_width / LANES * LANES;

        let mut dot_vec = f32x8::ZERO;
        let mut dot_tail = 0.0f32;

        for ty in 0..plan.height() {
            let Some(img_row) = image.row(y + ty) else {
                return 0.0;
            };
            let window = &img_row[x..x + tpl_width];
            let tpl_row = &t_prime[ty * tpl_width..(ty + 1) * tpl_width];

            let mut tx = 0;
            while tx < simd_end {
                dot_vec += load_f32x8(&tpl_row[tx..]) * load_u8x8_as_f32x8(&window[tx..]);
                tx += LANES;
            }
            for (&value, &t) in window[simd_end..].iter().zip(&tpl_row[simd_end..]) {
                dot_tail += t * value as f32;
            }
        }

        hsum(dot_vec) + dot_tail
    }
}
