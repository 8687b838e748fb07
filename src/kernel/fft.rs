//! Frequency-domain numerator for whole correlation surfaces.
//!
//! The numerator `sum(t'(u, v) * I(x + u, y + v))` of every placement is one
//! cross-correlation, computed as `IFFT(FFT(I) * conj(FFT(t')))`. Buffers are
//! padded to a 2-3-5 smooth size at least as large as the frame; since valid
//! placements never reach past the frame edge, the circular wrap-around of the
//! transform only touches cells that are discarded.
//!
//! The frame spectrum depends only on the frame, so one [`SpectralCorrelator`]
//! serves every template scale scored against the same frame.

use crate::template::TemplatePlan;
use crate::util::{TallyMatchError, TallyMatchResult};
use crate::ImageView;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

type C64 = Complex<f64>;

/// Smallest `m >= n` whose only prime factors are 2, 3 and 5.
pub(crate) fn next_fast_len(n: usize) -> usize {
    let mut m = n.max(1);
    loop {
        let mut r = m;
        for p in [2, 3, 5] {
            while r % p == 0 {
                r /= p;
            }
        }
        if r == 1 {
            return m;
        }
        m += 1;
    }
}

/// Runs `fft` over every `len`-sample chunk of `buf`.
fn process_chunks(fft: &Arc<dyn Fft<f64>>, buf: &mut [C64], len: usize) {
    #[cfg(feature = "rayon")]
    buf.par_chunks_mut(len).for_each(|chunk| fft.process(chunk));
    #[cfg(not(feature = "rayon"))]
    {
        let _ = len;
        fft.process(buf);
    }
}

/// `rows x cols` row-major into `cols x rows` row-major.
fn transpose(src: &[C64], rows: usize, cols: usize) -> Vec<C64> {
    let mut dst = vec![C64::default(); src.len()];
    for r in 0..rows {
        for c in 0..cols {
            dst[c * rows + r] = src[r * cols + c];
        }
    }
    dst
}

/// Cached frame spectrum plus the transform plans sized for it.
pub struct SpectralCorrelator {
    width: usize,
    height: usize,
    pad_w: usize,
    pad_h: usize,
    row_fwd: Arc<dyn Fft<f64>>,
    row_inv: Arc<dyn Fft<f64>>,
    col_fwd: Arc<dyn Fft<f64>>,
    col_inv: Arc<dyn Fft<f64>>,
    /// Frame spectrum, stored column-major (`pad_w x pad_h`).
    spectrum: Vec<C64>,
}

impl SpectralCorrelator {
    /// Transforms `image` once; later calls only transform templates.
    pub fn new(image: ImageView<'_, u8>) -> Self {
        let (width, height) = (image.width(), image.height());
        let pad_w = next_fast_len(width);
        let pad_h = next_fast_len(height);

        let mut planner = FftPlanner::<f64>::new();
        let mut correlator = Self {
            width,
            height,
            pad_w,
            pad_h,
            row_fwd: planner.plan_fft_forward(pad_w),
            row_inv: planner.plan_fft_inverse(pad_w),
            col_fwd: planner.plan_fft_forward(pad_h),
            col_inv: planner.plan_fft_inverse(pad_h),
            spectrum: Vec::new(),
        };

        let mut buf = vec![C64::default(); pad_w * pad_h];
        for y in 0..height {
            if let Some(row) = image.row(y) {
                let dst = &mut buf[y * pad_w..y * pad_w + width];
                for (d, &v) in dst.iter_mut().zip(row) {
                    d.re = f64::from(v);
                }
            }
        }
        correlator.spectrum = correlator.forward(buf);
        correlator
    }

    /// Size of the frame this correlator was built for.
    pub fn frame_size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Padded transform size `(width, height)`.
    pub fn padded_size(&self) -> (usize, usize) {
        (self.pad_w, self.pad_h)
    }

    fn forward(&self, mut buf: Vec<C64>) -> Vec<C64> {
        process_chunks(&self.row_fwd, &mut buf, self.pad_w);
        let mut cols = transpose(&buf, self.pad_h, self.pad_w);
        process_chunks(&self.col_fwd, &mut cols, self.pad_h);
        cols
    }

    fn inverse(&self, mut cols: Vec<C64>) -> Vec<C64> {
        process_chunks(&self.col_inv, &mut cols, self.pad_h);
        let mut buf = transpose(&cols, self.pad_w, self.pad_h);
        process_chunks(&self.row_inv, &mut buf, self.pad_w);
        buf
    }

    /// Numerators for every valid placement of `plan`, row-major with
    /// `(W - w + 1)` cells per row.
    pub fn correlate(&self, plan: &TemplatePlan) -> TallyMatchResult<Vec<f64>> {
        let (tw, th) = (plan.width(), plan.height());
        if tw > self.width || th > self.height {
            return Err(TallyMatchError::InvalidTemplateSize {
                tpl_width: tw,
                tpl_height: th,
                img_width: self.width,
                img_height: self.height,
            });
        }

        let mut buf = vec![C64::default(); self.pad_w * self.pad_h];
        for (ty, src) in plan.zero_mean().chunks_exact(tw).enumerate() {
            let dst = &mut buf[ty * self.pad_w..ty * self.pad_w + tw];
            for (d, &t) in dst.iter_mut().zip(src) {
                d.re = f64::from(t);
            }
        }
        let mut product = self.forward(buf);
        for (p, &s) in product.iter_mut().zip(&self.spectrum) {
            *p = s * p.conj();
        }
        let full = self.inverse(product);

        let out_w = self.width - tw + 1;
        let out_h = self.height - th + 1;
        let norm = 1.0 / (self.pad_w * self.pad_h) as f64;
        let mut out = Vec::with_capacity(out_w * out_h);
        for y in 0..out_h {
            let row = &full[y * self.pad_w..y * self.pad_w + out_w];
            out.extend(row.iter().map(|c| c.re * norm));
        }
        Ok(out)
    }
}
