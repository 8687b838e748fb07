//! Captured templates and their originating regions.

use crate::image::Image;
use crate::util::{TallyMatchError, TallyMatchResult};

mod plan;

pub use plan::TemplatePlan;

/// Axis-aligned region `(x1, y1)`-`(x2, y2)` in frame pixel coordinates.
///
/// `x2`/`y2` are exclusive, so the region covers `x2 - x1` columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Roi {
    pub x1: usize,
    pub y1: usize,
    pub x2: usize,
    pub y2: usize,
}

impl Roi {
    /// Builds a region from two arbitrary corners, normalising their order
    /// and clamping them to a `frame_w x frame_h` frame.
    ///
    /// Fails with `InvalidRoi` when the clamped region has no area.
    pub fn from_corners(
        a: (i64, i64),
        b: (i64, i64),
        frame_w: usize,
        frame_h: usize,
    ) -> TallyMatchResult<Self> {
        if a.0 == b.0 || a.1 == b.1 {
            return Err(TallyMatchError::InvalidRoi {
                reason: "zero-area selection",
            });
        }
        let clamp = |v: i64, max: usize| v.clamp(0, max as i64) as usize;
        let x1 = clamp(a.0.min(b.0), frame_w);
        let x2 = clamp(a.0.max(b.0), frame_w);
        let y1 = clamp(a.1.min(b.1), frame_h);
        let y2 = clamp(a.1.max(b.1), frame_h);
        if x2 <= x1 || y2 <= y1 {
            return Err(TallyMatchError::InvalidRoi {
                reason: "selection lies outside the frame",
            });
        }
        Ok(Self { x1, y1, x2, y2 })
    }

    /// Validates persisted coordinates `[x1, y1, x2, y2]`.
    pub fn from_coords(coords: [i64; 4]) -> TallyMatchResult<Self> {
        let [x1, y1, x2, y2] = coords;
        if x1 < 0 || y1 < 0 || x2 <= x1 || y2 <= y1 {
            return Err(TallyMatchError::InvalidRoi {
                reason: "malformed stored coordinates",
            });
        }
        Ok(Self {
            x1: x1 as usize,
            y1: y1 as usize,
            x2: x2 as usize,
            y2: y2 as usize,
        })
    }

    /// Returns `[x1, y1, x2, y2]`.
    pub fn coords(&self) -> [usize; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    pub fn width(&self) -> usize {
        self.x2 - self.x1
    }

    pub fn height(&self) -> usize {
        self.y2 - self.y1
    }
}

/// A reference patch plus the region of the frame it was cut from.
///
/// Immutable after creation; a new capture replaces it wholesale.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    image: Image,
    roi: Roi,
}

impl Template {
    /// Pairs an already-cropped patch with its region.
    pub fn new(image: Image, roi: Roi) -> Self {
        Self { image, roi }
    }

    /// Cuts `roi` out of `frame`.
    pub fn capture(frame: &Image, roi: Roi) -> TallyMatchResult<Self> {
        let image = frame.crop(roi.x1, roi.y1, roi.width(), roi.height())?;
        Ok(Self { image, roi })
    }

    /// Returns the patch pixels.
    pub fn image(&self) -> &Image {
        &self.image
    }

    /// Returns the originating region.
    pub fn roi(&self) -> Roi {
        self.roi
    }
}
