//! Scalar reference kernel.

use crate::kernel::Kernel;
use crate::template::TemplatePlan;
use crate::ImageView;

/// Scalar numerator kernel; the reference every accelerated path must match.
pub struct DotScalar;

impl Kernel for DotScalar {
    fn dot_at(image: ImageView<'_, u8>, plan: &TemplatePlan, x: usize, y: usize) -> f32 {
        let tpl_width = plan.width();
        let t_prime = plan.zero_mean();

        let mut dot = 0.0f32;
        for ty in 0..plan.height() {
            let Some(img_row) = image.row(y + ty) else {
                return 0.0;
            };
            let window = &img_row[x..x + tpl_width];
            let tpl_row = &t_prime[ty * tpl_width..(ty + 1) * tpl_width];
            for (&value, &t) in window.iter().zip(tpl_row) {
                dot += t * value as f32;
            }
        }
        dot
    }
}
