//! Best match at the template's native size.

use crate::image::resize::{resize_image, truncated_size};
use crate::image::Image;
use crate::search::scan::score_surface;
use crate::search::Detection;
use crate::trace::{trace_event, trace_span};
use crate::util::math::fit_scale;
use crate::util::{TallyMatchError, TallyMatchResult};
use std::borrow::Cow;

/// Shrinks `template` uniformly so it fits a `frame_w x frame_h` frame.
///
/// Templates that already fit are borrowed unchanged. The fitted size is the
/// truncated product of each side and `min(frame_h / h, frame_w / w)`.
pub(crate) fn fit_template(
    template: &Image,
    frame_w: usize,
    frame_h: usize,
) -> TallyMatchResult<Cow<'_, Image>> {
    if template.width() <= frame_w && template.height() <= frame_h {
        return Ok(Cow::Borrowed(template));
    }
    let scale = fit_scale(frame_w, frame_h, template.width(), template.height());
    let (w, h) = truncated_size(template.width(), template.height(), scale).ok_or(
        TallyMatchError::InvalidTemplateSize {
            tpl_width: template.width(),
            tpl_height: template.height(),
            img_width: frame_w,
            img_height: frame_h,
        },
    )?;
    trace_event!("template_fitted", scale = scale, width = w, height = h);
    Ok(Cow::Owned(resize_image(template, w.min(frame_w), h.min(frame_h))?))
}

/// Locates the best match of `template` in `frame`.
///
/// Oversized templates are shrunk with area averaging before scoring. Both
/// images are reduced to grayscale. Returns `Ok(None)` when no template is
/// available.
pub fn detect_single(
    frame: &Image,
    template: Option<&Image>,
) -> TallyMatchResult<Option<Detection>> {
    let Some(template) = template else {
        return Ok(None);
    };
    let _span = trace_span!("detect_single").entered();

    let fitted = fit_template(template, frame.width(), frame.height())?;
    let frame_gray = frame.to_gray();
    let tpl_gray = fitted.to_gray();

    let surface = score_surface(frame_gray.view(), tpl_gray.view())?;
    let (x, y) = surface.argmax();
    let detection = Detection::at(
        x,
        y,
        tpl_gray.width(),
        tpl_gray.height(),
        surface.max_value(),
    );
    trace_event!("single_best", x = x, y = y, score = detection.score);
    Ok(Some(detection))
}

#[cfg(test)]
mod tests {
    use super::{detect_single, fit_template};
    use crate::image::{Image, PixelLayout};

    #[test]
    fn absent_template_is_idle() {
        let frame = Image::filled(10, 10, PixelLayout::Gray, &[0]).unwrap();
        assert_eq!(detect_single(&frame, None).unwrap(), None);
    }

    #[test]
    fn fitting_preserves_aspect_ratio() {
        let tpl = Image::filled(60, 30, PixelLayout::Bgr, &[1, 2, 3]).unwrap();
        let fitted = fit_template(&tpl, 20, 20).unwrap();
        assert_eq!((fitted.width(), fitted.height()), (20, 10));
    }

    #[test]
    fn small_template_is_borrowed() {
        let tpl = Image::filled(5, 5, PixelLayout::Gray, &[7]).unwrap();
        let fitted = fit_template(&tpl, 20, 20).unwrap();
        assert!(matches!(fitted, std::borrow::Cow::Borrowed(_)));
    }

    #[test]
    fn collapsing_template_is_rejected() {
        let tpl = Image::filled(400, 1, PixelLayout::Gray, &[7]).unwrap();
        assert!(fit_template(&tpl, 10, 10).is_err());
    }
}
