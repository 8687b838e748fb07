//! Correlation kernels.
//!
//! A kernel evaluates the correlation numerator `sum(t'(u, v) * I(x + u, y + v))`
//! for one placement, where `t'` is the zero-mean template. Window means and
//! variances come from integral images in the scorer, so the kernel is the
//! only part that touches every template sample. Large templates skip the
//! per-placement kernels and take every numerator at once from [`fft`].

use crate::template::TemplatePlan;
use crate::ImageView;

/// Kernel trait for per-placement numerator evaluation.
pub trait Kernel {
    /// Computes the numerator with the template's top-left corner at `(x, y)`.
    ///
    /// The caller guarantees the placement lies inside the image.
    fn dot_at(image: ImageView<'_, u8>, plan: &TemplatePlan, x: usize, y: usize) -> f32;
}

pub mod fft;
pub mod scalar;

#[cfg(feature = "simd")]
pub mod simd;

#[cfg(feature = "rayon")]
pub mod rayon;
