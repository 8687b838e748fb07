//! Low-level building blocks for custom scoring pipelines.
//!
//! These items expose the precomputed template plan, the kernel trait and the
//! raw scorer for callers who want a correlation surface rather than a
//! detection. Most users should prefer [`crate::Detector`] or [`crate::Session`].

pub use crate::candidate::nms::{suppress_overlaps, CandidateBox};
pub use crate::image::resize::{resize_area, scaled_size, truncated_size};
pub use crate::kernel::fft::SpectralCorrelator;
pub use crate::kernel::scalar::DotScalar;
#[cfg(feature = "simd")]
pub use crate::kernel::simd::DotSimd;
pub use crate::kernel::Kernel;
pub use crate::search::scan::{
    score_surface, score_surface_with_kernel, score_surface_with_plan, CorrelationSurface,
    FrameScorer, DIRECT_MAX_SAMPLES,
};
pub use crate::template::TemplatePlan;
