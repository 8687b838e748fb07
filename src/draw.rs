//! Frame annotation for displaying detector output.
//!
//! Available with the `draw` feature. Text needs a font; without one the
//! label is still returned so callers can print it instead.

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::image::io::to_rgb_image;
use crate::image::Image;
use crate::search::Detection;
use crate::template::Roi;
use crate::util::{TallyMatchError, TallyMatchResult};

/// Colours and sizes used by [`Annotator`].
#[derive(Clone, Debug, PartialEq)]
pub struct DrawConfig {
    pub box_color: [u8; 3],
    pub box_thickness: u32,
    /// Template region colour while the object is absent.
    pub roi_absent_color: [u8; 3],
    /// Template region colour once the score clears the threshold.
    pub roi_present_color: [u8; 3],
    pub label_color: [u8; 3],
    pub label_origin: (i32, i32),
    pub font_px: f32,
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self {
            box_color: [0, 255, 0],
            box_thickness: 2,
            roi_absent_color: [255, 0, 0],
            roi_present_color: [0, 255, 0],
            label_color: [0, 255, 0],
            label_origin: (10, 10),
            font_px: 24.0,
        }
    }
}

/// Template region overlay, coloured by the current match state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoiOverlay {
    pub roi: Roi,
    pub threshold: f32,
}

/// An annotated frame plus the label that was (or would have been) drawn.
#[derive(Clone, Debug)]
pub struct Annotated {
    pub image: RgbImage,
    pub label: String,
}

/// Label text for a detection result.
pub fn match_label(detection: Option<&Detection>) -> String {
    match detection {
        Some(det) => format!("Match: {:.2}", det.score),
        None => "No match found".to_string(),
    }
}

/// Draws boxes, labels and the template region onto frames.
#[derive(Clone, Debug, Default)]
pub struct Annotator {
    cfg: DrawConfig,
    font: Option<FontArc>,
}

impl Annotator {
    pub fn new(cfg: DrawConfig) -> Self {
        Self { cfg, font: None }
    }

    /// Enables text rendering with a TrueType/OpenType font.
    pub fn with_font_bytes(mut self, bytes: Vec<u8>) -> TallyMatchResult<Self> {
        let font = FontArc::try_from_vec(bytes).map_err(|e| TallyMatchError::ImageIo {
            reason: format!("font: {e}"),
        })?;
        self.font = Some(font);
        Ok(self)
    }

    pub fn config(&self) -> &DrawConfig {
        &self.cfg
    }

    /// Annotates the best single match.
    pub fn annotate(
        &self,
        frame: &Image,
        detection: Option<&Detection>,
        overlay: Option<RoiOverlay>,
    ) -> TallyMatchResult<Annotated> {
        let mut image = to_rgb_image(frame)?;
        if let Some(overlay) = overlay {
            let present = detection.is_some_and(|d| d.score > overlay.threshold);
            let color = if present {
                self.cfg.roi_present_color
            } else {
                self.cfg.roi_absent_color
            };
            let r = overlay.roi;
            self.draw_box(&mut image, r.x1, r.y1, r.width(), r.height(), color);
        }
        if let Some(det) = detection {
            self.draw_detection(&mut image, det);
        }
        let label = match_label(detection);
        self.draw_label(&mut image, &label);
        Ok(Annotated { image, label })
    }

    /// Annotates every multi-instance match; the label reports the count.
    pub fn annotate_all(
        &self,
        frame: &Image,
        detections: &[Detection],
    ) -> TallyMatchResult<Annotated> {
        let mut image = to_rgb_image(frame)?;
        for det in detections {
            self.draw_detection(&mut image, det);
        }
        let label = if detections.is_empty() {
            match_label(None)
        } else {
            format!("Matches: {}", detections.len())
        };
        self.draw_label(&mut image, &label);
        Ok(Annotated { image, label })
    }

    fn draw_detection(&self, image: &mut RgbImage, det: &Detection) {
        self.draw_box(
            image,
            det.top_left.x,
            det.top_left.y,
            det.width(),
            det.height(),
            self.cfg.box_color,
        );
    }

    // Thickness grows inward, one hollow rectangle per pixel.
    fn draw_box(
        &self,
        image: &mut RgbImage,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        color: [u8; 3],
    ) {
        let max_w = (image.width() as usize).saturating_sub(x);
        let max_h = (image.height() as usize).saturating_sub(y);
        let width = width.min(max_w) as u32;
        let height = height.min(max_h) as u32;
        for inset in 0..self.cfg.box_thickness {
            let w = width.saturating_sub(2 * inset);
            let h = height.saturating_sub(2 * inset);
            if w == 0 || h == 0 {
                break;
            }
            let rect = Rect::at((x as u32 + inset) as i32, (y as u32 + inset) as i32).of_size(w, h);
            draw_hollow_rect_mut(image, rect, Rgb(color));
        }
    }

    fn draw_label(&self, image: &mut RgbImage, label: &str) {
        let Some(font) = &self.font else {
            return;
        };
        let (x, y) = self.cfg.label_origin;
        draw_text_mut(
            image,
            Rgb(self.cfg.label_color),
            x,
            y,
            PxScale::from(self.cfg.font_px),
            font,
            label,
        );
    }
}
