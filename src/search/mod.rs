//! Template detectors built on the correlation scorer.
//!
//! - [`single`]: best match at native size, shrinking oversized templates.
//! - [`multiscale`]: best match over a linear grid of template scales.
//! - [`multi`]: every placement above a threshold, pruned by greedy NMS.
//!
//! All detectors treat an absent template as an idle state and return
//! `Ok(None)`. Geometry that cannot be scored is reported as an error before
//! reaching the scorer.

pub(crate) mod multi;
pub(crate) mod multiscale;
pub mod scan;
pub(crate) mod single;

pub use multi::detect_multiple;
pub use multiscale::detect_multi_scale;
pub use single::detect_single;

use crate::candidate::nms::CandidateBox;
use crate::image::Image;
use crate::util::{TallyMatchError, TallyMatchResult};

/// Pixel coordinate in frame space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: usize,
    pub y: usize,
}

impl Point {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// One located match.
///
/// `bottom_right` is always `top_left` plus the size of the exact template
/// (possibly resized) whose score produced the location.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    pub top_left: Point,
    pub bottom_right: Point,
    /// Normalized similarity in `[-1, 1]`.
    pub score: f32,
}

impl Detection {
    pub(crate) fn at(x: usize, y: usize, width: usize, height: usize, score: f32) -> Self {
        Self {
            top_left: Point::new(x, y),
            bottom_right: Point::new(x + width, y + height),
            score,
        }
    }

    pub fn width(&self) -> usize {
        self.bottom_right.x - self.top_left.x
    }

    pub fn height(&self) -> usize {
        self.bottom_right.y - self.top_left.y
    }

    pub(crate) fn to_box(self) -> CandidateBox {
        CandidateBox {
            x: self.top_left.x,
            y: self.top_left.y,
            width: self.width(),
            height: self.height(),
            score: self.score,
        }
    }

    pub(crate) fn from_box(b: CandidateBox) -> Self {
        Self::at(b.x, b.y, b.width, b.height, b.score)
    }
}

/// Best match across scales together with the winning scale factor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaledDetection {
    pub detection: Detection,
    /// Multiplier applied to the template's native size.
    pub scale: f64,
}

/// Ordering of multi-instance results before truncation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InstanceOrder {
    /// Keep the order the pipeline produced: row-major scan order without
    /// suppression, NMS pick order with it. The first N are not necessarily
    /// the N best.
    #[default]
    ScanOrder,
    /// Sort survivors by descending score (ties by row, then column) so the
    /// first N are the N best.
    ScoreDesc,
}

/// Configuration for detector calls.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectConfig {
    /// Minimum acceptable score for multi-scale and multi-instance search,
    /// and the "object present" cut-off for the single-scale overlay.
    pub threshold: f32,
    /// Scale factors `(low, high)` relative to the template's native size.
    pub scale_range: (f64, f64),
    /// Number of linearly spaced scales, endpoints included.
    pub scale_steps: usize,
    /// Maximum multi-instance results.
    pub max_detections: usize,
    /// Run greedy NMS over multi-instance candidates.
    pub nms: bool,
    /// Area-normalized overlap above which NMS discards a candidate.
    pub overlap_threshold: f32,
    /// Result ordering before truncation.
    pub order: InstanceOrder,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            threshold: 0.98,
            scale_range: (0.5, 1.5),
            scale_steps: 20,
            max_detections: 5,
            nms: true,
            overlap_threshold: 0.3,
            order: InstanceOrder::ScanOrder,
        }
    }
}

/// Parameters for [`detect_multiple`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MultiParams {
    pub threshold: f32,
    pub max_detections: usize,
    pub nms: bool,
    pub overlap_threshold: f32,
    pub order: InstanceOrder,
}

impl From<&DetectConfig> for MultiParams {
    fn from(cfg: &DetectConfig) -> Self {
        Self {
            threshold: cfg.threshold,
            max_detections: cfg.max_detections,
            nms: cfg.nms,
            overlap_threshold: cfg.overlap_threshold,
            order: cfg.order,
        }
    }
}

pub(crate) fn check_threshold(threshold: f32) -> TallyMatchResult<()> {
    if threshold.is_nan() {
        return Err(TallyMatchError::InvalidInput("threshold is NaN"));
    }
    Ok(())
}

/// Detector facade bundling a [`DetectConfig`].
#[derive(Clone, Debug, Default)]
pub struct Detector {
    cfg: DetectConfig,
}

impl Detector {
    /// Creates a detector with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, cfg: DetectConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &DetectConfig {
        &self.cfg
    }

    /// Mutable access, e.g. for a threshold slider.
    pub fn config_mut(&mut self) -> &mut DetectConfig {
        &mut self.cfg
    }

    /// Best match at native template size.
    pub fn detect(
        &self,
        frame: &Image,
        template: Option<&Image>,
    ) -> TallyMatchResult<Option<Detection>> {
        detect_single(frame, template)
    }

    /// Best match over the configured scale grid.
    pub fn detect_multi_scale(
        &self,
        frame: &Image,
        template: Option<&Image>,
    ) -> TallyMatchResult<Option<ScaledDetection>> {
        detect_multi_scale(
            frame,
            template,
            self.cfg.threshold,
            self.cfg.scale_range,
            self.cfg.scale_steps,
        )
    }

    /// All separated matches above the configured threshold.
    pub fn detect_multiple(
        &self,
        frame: &Image,
        template: Option<&Image>,
    ) -> TallyMatchResult<Option<Vec<Detection>>> {
        detect_multiple(frame, template, MultiParams::from(&self.cfg))
    }
}

/// Score as a percentage, `0.0` when nothing was detected.
pub fn calculate_match_percentage(detection: Option<&Detection>) -> f32 {
    detection.map_or(0.0, |d| d.score * 100.0)
}
