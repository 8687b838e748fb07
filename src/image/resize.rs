//! Template resampling.
//!
//! Shrinking uses area averaging: every destination pixel is the mean of the
//! source footprint it covers, with fractional weights at the footprint
//! edges, which suppresses aliasing. Enlarging (any axis with a factor above
//! 1) falls back to bilinear sampling with half-pixel centres. Both filters
//! are separable and share the same tap tables.

use crate::image::{Image, ImageView, OwnedImage};
use crate::util::{TallyMatchError, TallyMatchResult};

/// Source taps contributing to one destination coordinate.
type Taps = Vec<(usize, f32)>;

fn area_taps(src_len: usize, dst_len: usize) -> Vec<Taps> {
    let scale = src_len as f64 / dst_len as f64;
    (0..dst_len)
        .map(|d| {
            let start = d as f64 * scale;
            let end = ((d + 1) as f64 * scale).min(src_len as f64);
            let first = start.floor() as usize;
            let last = (end.ceil() as usize).min(src_len);
            let mut taps = Vec::with_capacity(last - first);
            for s in first..last {
                let overlap = (end.min(s as f64 + 1.0) - start.max(s as f64)).max(0.0);
                if overlap > 0.0 {
                    taps.push((s, (overlap / scale) as f32));
                }
            }
            taps
        })
        .collect()
}

fn linear_taps(src_len: usize, dst_len: usize) -> Vec<Taps> {
    let scale = src_len as f64 / dst_len as f64;
    let max = (src_len - 1) as f64;
    (0..dst_len)
        .map(|d| {
            let pos = ((d as f64 + 0.5) * scale - 0.5).clamp(0.0, max);
            let s0 = pos.floor() as usize;
            let s1 = (s0 + 1).min(src_len - 1);
            let frac = (pos - s0 as f64) as f32;
            if s1 == s0 || frac == 0.0 {
                vec![(s0, 1.0)]
            } else {
                vec![(s0, 1.0 - frac), (s1, frac)]
            }
        })
        .collect()
}

/// Resamples an interleaved buffer whose rows start every `stride` bytes.
fn resample(
    src: &[u8],
    src_w: usize,
    src_h: usize,
    stride: usize,
    channels: usize,
    dst_w: usize,
    dst_h: usize,
) -> Vec<u8> {
    let shrinking = src_w >= dst_w && src_h >= dst_h;
    let (x_taps, y_taps) = if shrinking {
        (area_taps(src_w, dst_w), area_taps(src_h, dst_h))
    } else {
        (linear_taps(src_w, dst_w), linear_taps(src_h, dst_h))
    };

    let mut out = Vec::with_capacity(dst_w * dst_h * channels);
    let mut acc = vec![0.0f32; channels];
    for ty in &y_taps {
        for tx in &x_taps {
            acc.iter_mut().for_each(|a| *a = 0.0);
            for &(sy, wy) in ty {
                let row = &src[sy * stride..];
                for &(sx, wx) in tx {
                    let w = wy * wx;
                    let base = sx * channels;
                    for (c, a) in acc.iter_mut().enumerate() {
                        *a += w * row[base + c] as f32;
                    }
                }
            }
            out.extend(acc.iter().map(|a| a.round().clamp(0.0, 255.0) as u8));
        }
    }
    out
}

fn check_target(dst_w: usize, dst_h: usize) -> TallyMatchResult<()> {
    if dst_w == 0 || dst_h == 0 {
        return Err(TallyMatchError::InvalidDimensions {
            width: dst_w,
            height: dst_h,
        });
    }
    Ok(())
}

/// Resizes a grayscale view to `dst_w x dst_h`.
pub fn resize_area(
    src: ImageView<'_, u8>,
    dst_w: usize,
    dst_h: usize,
) -> TallyMatchResult<OwnedImage> {
    check_target(dst_w, dst_h)?;
    let data = resample(
        src.as_slice(),
        src.width(),
        src.height(),
        src.stride(),
        1,
        dst_w,
        dst_h,
    );
    OwnedImage::new(data, dst_w, dst_h)
}

/// Resizes a multi-channel image to `dst_w x dst_h`.
pub fn resize_image(src: &Image, dst_w: usize, dst_h: usize) -> TallyMatchResult<Image> {
    check_target(dst_w, dst_h)?;
    let channels = src.channels();
    let data = resample(
        src.as_bytes(),
        src.width(),
        src.height(),
        src.width() * channels,
        channels,
        dst_w,
        dst_h,
    );
    Image::new(data, dst_w, dst_h, src.layout())
}

/// Size of a `width x height` patch scaled by `scale`, rounded to the nearest
/// pixel. Returns `None` when either side collapses to zero.
pub fn scaled_size(width: usize, height: usize, scale: f64) -> Option<(usize, usize)> {
    let w = (width as f64 * scale).round();
    let h = (height as f64 * scale).round();
    if !(w >= 1.0 && h >= 1.0) {
        return None;
    }
    Some((w as usize, h as usize))
}

/// Size after truncating `width x height` scaled by `scale`, the convention
/// used when shrinking a patch to fit a frame. Returns `None` on collapse.
///
/// Products within `1e-9` of an integer are snapped up first, so a ratio such
/// as `20 / 60` maps 60 back to exactly 20.
pub fn truncated_size(width: usize, height: usize, scale: f64) -> Option<(usize, usize)> {
    const SNAP: f64 = 1e-9;
    let w = (width as f64 * scale + SNAP).floor();
    let h = (height as f64 * scale + SNAP).floor();
    if !(w >= 1.0 && h >= 1.0) {
        return None;
    }
    Some((w as usize, h as usize))
}

/// Shrinks `image` to fit inside `max_w x max_h`, preserving aspect ratio.
///
/// Images already inside the bounds are returned as a clone.
pub fn fit_within(image: &Image, max_w: usize, max_h: usize) -> TallyMatchResult<Image> {
    if image.width() <= max_w && image.height() <= max_h {
        return Ok(image.clone());
    }
    let scale = (max_w as f64 / image.width() as f64).min(max_h as f64 / image.height() as f64);
    let (w, h) = truncated_size(image.width(), image.height(), scale)
        .ok_or(TallyMatchError::InvalidInput("display bounds collapse the image"))?;
    resize_image(image, w, h)
}
