//! TallyMatch is the detection core of a camera-driven object tally.
//!
//! A reference patch (the template) is cut from a live frame; later frames
//! are searched for it with the normalized correlation coefficient. Three
//! detectors build on the same scorer: best match at native size, best match
//! over a scale grid, and every separated match above a threshold (pruned by
//! greedy non-maximum suppression). [`Session`] ties the detectors to the
//! persisted template and tally.
//!
//! Large templates are correlated in the frequency domain with `rustfft`;
//! small ones are scored per placement. Scoring is single-threaded by
//! default; the `rayon` feature fills the correlation surface row-parallel
//! and `simd` vectorizes the per-placement kernel. Every path produces the
//! same detections as the scalar reference.

mod candidate;
pub mod capture;
#[cfg(feature = "draw")]
pub mod draw;
pub mod image;
pub mod kernel;
pub mod lowlevel;
pub mod search;
pub mod session;
pub mod source;
pub mod store;
pub mod template;
mod trace;
pub mod util;

pub use capture::{CaptureOutcome, CaptureState, PointerEvent, RoiSelector};
pub use crate::image::resize::{fit_within, resize_image};
pub use crate::image::{Image, ImageView, OwnedImage, PixelLayout};
pub use search::scan::{score_surface, CorrelationSurface};
pub use search::{
    calculate_match_percentage, detect_multi_scale, detect_multiple, detect_single, DetectConfig,
    Detection, Detector, InstanceOrder, MultiParams, Point, ScaledDetection,
};
pub use session::{FrameReport, Session};
pub use source::{FrameSource, QueueSource};
pub use store::{CountStore, MemoryCountStore, MemoryTemplateStore, TemplateStore};
pub use template::{Roi, Template};
pub use util::{TallyMatchError, TallyMatchResult};

#[cfg(feature = "image-io")]
pub use crate::image::io::{load_gray_image, load_image, save_image};
#[cfg(feature = "image-io")]
pub use source::DirectorySource;
#[cfg(feature = "image-io")]
pub use store::{FileCountStore, FileTemplateStore};
