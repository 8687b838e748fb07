//! Numeric helpers for scale grids and luminance.

/// Returns `steps` evenly spaced values over `[low, high]`, endpoints included.
///
/// A single step yields `[low]`; zero steps yield an empty grid.
pub(crate) fn linspace(low: f64, high: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![low],
        _ => {
            let step = (high - low) / (steps - 1) as f64;
            (0..steps)
                .map(|i| if i + 1 == steps { high } else { low + step * i as f64 })
                .collect()
        }
    }
}

/// Largest uniform factor that makes a `tpl_w x tpl_h` patch fit inside
/// `img_w x img_h`. Values below 1.0 mean the patch must shrink.
pub(crate) fn fit_scale(img_w: usize, img_h: usize, tpl_w: usize, tpl_h: usize) -> f64 {
    let sy = img_h as f64 / tpl_h as f64;
    let sx = img_w as f64 / tpl_w as f64;
    sy.min(sx)
}

/// Rec. 601 luma with round-to-nearest, matching the usual BGR->GRAY reduction.
#[inline]
pub(crate) fn luma(r: u8, g: u8, b: u8) -> u8 {
    let y = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
    y.round().clamp(0.0, 255.0) as u8
}
