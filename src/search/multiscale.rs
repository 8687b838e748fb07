//! Best match over a discrete grid of template scales.

use crate::image::resize::{resize_area, scaled_size};
use crate::image::Image;
use crate::search::scan::FrameScorer;
use crate::search::{check_threshold, Detection, ScaledDetection};
use crate::trace::{trace_event, trace_span};
use crate::util::math::linspace;
use crate::util::{TallyMatchError, TallyMatchResult};

/// Searches `steps` linearly spaced scales in `scale_range` (endpoints
/// included) and returns the best match scoring at least `threshold`.
///
/// Scales whose resized template would not fit the frame, or would collapse
/// to zero size, are skipped. The running best is replaced only by a strictly
/// higher score, so on a tie the smaller (earlier) scale wins. Returns
/// `Ok(None)` when no template is available or no scale clears the threshold.
pub fn detect_multi_scale(
    frame: &Image,
    template: Option<&Image>,
    threshold: f32,
    scale_range: (f64, f64),
    steps: usize,
) -> TallyMatchResult<Option<ScaledDetection>> {
    let Some(template) = template else {
        return Ok(None);
    };
    check_threshold(threshold)?;
    let (low, high) = scale_range;
    if !(low.is_finite() && high.is_finite() && low > 0.0 && high >= low) {
        return Err(TallyMatchError::InvalidInput(
            "scale range must be finite with 0 < low <= high",
        ));
    }
    if steps == 0 {
        return Err(TallyMatchError::InvalidInput("scale steps must be positive"));
    }
    let _span = trace_span!("detect_multi_scale", low = low, high = high, steps = steps).entered();

    let frame_gray = frame.to_gray();
    let tpl_gray = template.to_gray();

    let scorer = FrameScorer::new(frame_gray.view());
    let mut best: Option<ScaledDetection> = None;
    let mut skipped = 0usize;
    for scale in linspace(low, high, steps) {
        let Some((w, h)) = scaled_size(tpl_gray.width(), tpl_gray.height(), scale) else {
            skipped += 1;
            continue;
        };
        if w > frame_gray.width() || h > frame_gray.height() {
            skipped += 1;
            continue;
        }

        let resized = resize_area(tpl_gray.view(), w, h)?;
        let surface = scorer.score_template(resized.view())?;
        let max_val = surface.max_value();
        let improves = best.map_or(true, |b| max_val > b.detection.score);
        if max_val >= threshold && improves {
            let (x, y) = surface.argmax();
            best = Some(ScaledDetection {
                detection: Detection::at(x, y, w, h, max_val),
                scale,
            });
        }
    }

    trace_event!(
        "multi_scale_done",
        skipped = skipped,
        found = best.is_some(),
        scale = best.map_or(0.0, |b| b.scale)
    );
    Ok(best)
}
