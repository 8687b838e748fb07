//! Multiple non-overlapping matches in one frame.

use crate::candidate::nms::suppress_overlaps;
use crate::image::Image;
use crate::search::scan::score_surface;
use crate::search::single::fit_template;
use crate::search::{check_threshold, Detection, InstanceOrder, MultiParams};
use crate::trace::{trace_event, trace_span};
use crate::util::TallyMatchResult;

/// Collects every placement scoring at least `params.threshold`, optionally
/// prunes overlaps with greedy NMS, and returns at most
/// `params.max_detections` matches.
///
/// With [`InstanceOrder::ScanOrder`] the truncation keeps the first entries in
/// pipeline order (row-major scan order, or NMS pick order when suppression is
/// on), not the highest scores. [`InstanceOrder::ScoreDesc`] sorts survivors
/// by score first. Oversized templates are shrunk exactly as in
/// [`detect_single`](crate::search::detect_single).
///
/// Returns `Ok(None)` when no template is available and `Ok(Some(vec![]))`
/// when no placement clears the threshold.
pub fn detect_multiple(
    frame: &Image,
    template: Option<&Image>,
    params: MultiParams,
) -> TallyMatchResult<Option<Vec<Detection>>> {
    let Some(template) = template else {
        return Ok(None);
    };
    check_threshold(params.threshold)?;
    let _span = trace_span!(
        "detect_multiple",
        threshold = params.threshold,
        max = params.max_detections,
        nms = params.nms
    )
    .entered();

    let fitted = fit_template(template, frame.width(), frame.height())?;
    let frame_gray = frame.to_gray();
    let tpl_gray = fitted.to_gray();
    let (tpl_w, tpl_h) = (tpl_gray.width(), tpl_gray.height());

    let surface = score_surface(frame_gray.view(), tpl_gray.view())?;
    let raw: Vec<Detection> = surface
        .cells_at_least(params.threshold)
        .map(|(x, y, score)| Detection::at(x, y, tpl_w, tpl_h, score))
        .collect();
    let raw_count = raw.len();

    let mut kept = if params.nms {
        let boxes: Vec<_> = raw.into_iter().map(Detection::to_box).collect();
        suppress_overlaps(&boxes, params.overlap_threshold)
            .into_iter()
            .map(Detection::from_box)
            .collect()
    } else {
        raw
    };

    if params.order == InstanceOrder::ScoreDesc {
        kept.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.top_left.y.cmp(&b.top_left.y))
                .then_with(|| a.top_left.x.cmp(&b.top_left.x))
        });
    }
    kept.truncate(params.max_detections);

    trace_event!("multiple_done", raw = raw_count, kept = kept.len());
    Ok(Some(kept))
}
