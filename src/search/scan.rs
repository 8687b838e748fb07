//! Dense normalized cross-correlation over every valid placement.
//!
//! For a search image `S` (`H x W`) and template `T` (`h x w`) the surface has
//! `(H - h + 1) x (W - w + 1)` cells. Each cell holds the correlation
//! coefficient
//!
//! ```text
//! sum(t' * s') / sqrt(sum(t'^2) * sum(s'^2))
//! ```
//!
//! where `t'` and `s'` are the template and the co-located window with their
//! means removed. Window moments come from integral images. The numerator
//! comes from a per-placement [`Kernel`] for small templates and from one
//! frequency-domain cross-correlation ([`SpectralCorrelator`]) otherwise.
//!
//! Cells whose window has no variance score `0.0`. A template with no
//! variance has no defined coefficient; it is scored by intensity agreement
//! `1 - rms(S - T) / 255` instead, which is `1.0` only on an exact copy.

use crate::image::integral::IntegralImage;
use crate::kernel::fft::SpectralCorrelator;
use crate::kernel::Kernel;
use crate::template::TemplatePlan;
use crate::trace::{trace_event, trace_span};
use crate::util::{TallyMatchError, TallyMatchResult};
use crate::ImageView;
use std::cell::OnceCell;

#[cfg(not(feature = "simd"))]
pub(crate) use crate::kernel::scalar::DotScalar as ActiveKernel;
#[cfg(feature = "simd")]
pub(crate) use crate::kernel::simd::DotSimd as ActiveKernel;

/// Scores for every template placement plus the location of the maximum.
#[derive(Clone, Debug)]
pub struct CorrelationSurface {
    width: usize,
    height: usize,
    tpl_width: usize,
    tpl_height: usize,
    scores: Vec<f32>,
    best_x: usize,
    best_y: usize,
    best_score: f32,
}

impl CorrelationSurface {
    fn from_scores(
        width: usize,
        height: usize,
        tpl_width: usize,
        tpl_height: usize,
        scores: Vec<f32>,
    ) -> Self {
        // First maximum in row-major order wins.
        let mut best_idx = 0usize;
        let mut best_score = f32::NEG_INFINITY;
        for (idx, &score) in scores.iter().enumerate() {
            if score > best_score {
                best_score = score;
                best_idx = idx;
            }
        }
        Self {
            width,
            height,
            tpl_width,
            tpl_height,
            scores,
            best_x: best_idx % width,
            best_y: best_idx / width,
            best_score,
        }
    }

    /// Number of horizontal placements (`W - w + 1`).
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of vertical placements (`H - h + 1`).
    pub fn height(&self) -> usize {
        self.height
    }

    /// Size of the template that produced this surface.
    pub fn template_size(&self) -> (usize, usize) {
        (self.tpl_width, self.tpl_height)
    }

    /// Row-major scores.
    pub fn scores(&self) -> &[f32] {
        &self.scores
    }

    /// Score with the template's top-left corner at `(x, y)`.
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.scores.get(y * self.width + x).copied()
    }

    /// Top-left corner of the best placement.
    pub fn argmax(&self) -> (usize, usize) {
        (self.best_x, self.best_y)
    }

    /// Score at [`argmax`](Self::argmax).
    pub fn max_value(&self) -> f32 {
        self.best_score
    }

    /// Iterates `(x, y, score)` over cells scoring at least `threshold`, in
    /// row-major order.
    pub fn cells_at_least(&self, threshold: f32) -> impl Iterator<Item = (usize, usize, f32)> + '_ {
        let width = self.width;
        self.scores
            .iter()
            .enumerate()
            .filter(move |&(_, &score)| score >= threshold)
            .map(move |(idx, &score)| (idx % width, idx / width, score))
    }
}

/// Per-call constants shared by every cell.
struct ScanContext<'a> {
    image: ImageView<'a, u8>,
    integral: &'a IntegralImage,
    plan: &'a TemplatePlan,
    n: u64,
    energy_t: f64,
    flat_value: Option<u64>,
}

impl<'a> ScanContext<'a> {
    fn new(image: ImageView<'a, u8>, integral: &'a IntegralImage, plan: &'a TemplatePlan) -> Self {
        let n = plan.len() as u64;
        let flat_value = plan.is_flat().then(|| plan.sum() / n);
        Self {
            image,
            integral,
            plan,
            n,
            energy_t: plan.energy(),
            flat_value,
        }
    }

    /// Scores one placement; `dot` yields the numerator and is only called
    /// when the template and the window both have variance.
    #[inline]
    fn cell(&self, x: usize, y: usize, dot: impl FnOnce() -> f64) -> f32 {
        let stats = self
            .integral
            .window(x, y, self.plan.width(), self.plan.height());

        if let Some(t) = self.flat_value {
            // sum((s - t)^2) = sum_sq - 2 t sum + n t^2, exact in integers.
            let sse = (i128::from(stats.sum_sq) + i128::from(self.n) * i128::from(t * t)
                - 2 * i128::from(t) * i128::from(stats.sum))
            .max(0);
            let rms = (sse as f64 / self.n as f64).sqrt();
            return (1.0 - rms / 255.0) as f32;
        }

        let var_scaled = stats.scaled_variance(self.n);
        if var_scaled == 0 {
            return 0.0;
        }
        let energy_i = var_scaled as f64 / self.n as f64;
        let score = dot() / (self.energy_t * energy_i).sqrt();
        if score.is_finite() {
            score.clamp(-1.0, 1.0) as f32
        } else {
            0.0
        }
    }

    /// Fills one surface row (placements with top edge at `y`) with a
    /// per-placement kernel.
    fn fill_row<K: Kernel>(&self, y: usize, out: &mut [f32]) {
        for (x, slot) in out.iter_mut().enumerate() {
            *slot = self.cell(x, y, || K::dot_at(self.image, self.plan, x, y) as f64);
        }
    }

    /// Fills one surface row from precomputed numerators for that row.
    fn fill_row_from(&self, y: usize, out: &mut [f32], numerators: &[f64]) {
        for (x, (slot, &dot)) in out.iter_mut().zip(numerators).enumerate() {
            *slot = self.cell(x, y, || dot);
        }
    }
}

fn fill_rows<F>(scores: &mut [f32], width: usize, fill: F)
where
    F: Fn(usize, &mut [f32]) + Sync + Send,
{
    #[cfg(feature = "rayon")]
    crate::kernel::rayon::fill_rows_par(scores, width, fill);
    #[cfg(not(feature = "rayon"))]
    for (y, row) in scores.chunks_mut(width).enumerate() {
        fill(y, row);
    }
}

fn check_fits(image: ImageView<'_, u8>, plan: &TemplatePlan) -> TallyMatchResult<()> {
    if plan.width() > image.width() || plan.height() > image.height() {
        return Err(TallyMatchError::InvalidTemplateSize {
            tpl_width: plan.width(),
            tpl_height: plan.height(),
            img_width: image.width(),
            img_height: image.height(),
        });
    }
    Ok(())
}

/// Templates with at most this many samples are scored per placement; larger
/// ones go through the frame spectrum.
pub const DIRECT_MAX_SAMPLES: usize = 64;

/// Scores any number of templates against one frame.
///
/// The integral image is built once per frame and the frame spectrum on the
/// first template large enough to need it, so scoring several scales of the
/// same template against one frame only transforms the frame once.
pub struct FrameScorer<'a> {
    image: ImageView<'a, u8>,
    integral: IntegralImage,
    spectrum: OnceCell<SpectralCorrelator>,
}

impl<'a> FrameScorer<'a> {
    /// Prepares `image` for scoring.
    pub fn new(image: ImageView<'a, u8>) -> Self {
        Self {
            image,
            integral: IntegralImage::new(image),
            spectrum: OnceCell::new(),
        }
    }

    /// Scores a grayscale template view.
    pub fn score_template(&self, tpl: ImageView<'_, u8>) -> TallyMatchResult<CorrelationSurface> {
        let plan = TemplatePlan::from_view(tpl)?;
        self.score(&plan)
    }

    /// Scores a precomputed template plan.
    pub fn score(&self, plan: &TemplatePlan) -> TallyMatchResult<CorrelationSurface> {
        let image = self.image;
        check_fits(image, plan)?;
        let spectral = !plan.is_flat() && plan.len() > DIRECT_MAX_SAMPLES;
        let _span = trace_span!(
            "score_surface",
            img_w = image.width(),
            img_h = image.height(),
            tpl_w = plan.width(),
            tpl_h = plan.height(),
            spectral = spectral
        )
        .entered();

        let width = image.width() - plan.width() + 1;
        let height = image.height() - plan.height() + 1;
        let ctx = ScanContext::new(image, &self.integral, plan);
        let mut scores = vec![0.0f32; width * height];

        if spectral {
            let numerators = self
                .spectrum
                .get_or_init(|| SpectralCorrelator::new(image))
                .correlate(plan)?;
            fill_rows(&mut scores, width, |y, row| {
                ctx.fill_row_from(y, row, &numerators[y * width..(y + 1) * width]);
            });
        } else {
            fill_rows(&mut scores, width, |y, row| {
                ctx.fill_row::<ActiveKernel>(y, row);
            });
        }

        let surface =
            CorrelationSurface::from_scores(width, height, plan.width(), plan.height(), scores);
        trace_event!(
            "surface_best",
            x = surface.best_x,
            y = surface.best_y,
            score = surface.best_score
        );
        Ok(surface)
    }
}

/// Scores a grayscale template against a grayscale search image.
///
/// Fails with `InvalidTemplateSize` when the template does not fit; the
/// detectors resize templates beforehand so this never reaches them.
pub fn score_surface(
    image: ImageView<'_, u8>,
    tpl: ImageView<'_, u8>,
) -> TallyMatchResult<CorrelationSurface> {
    let plan = TemplatePlan::from_view(tpl)?;
    score_surface_with_plan(image, &plan)
}

/// Scores a precomputed template plan against a grayscale search image.
pub fn score_surface_with_plan(
    image: ImageView<'_, u8>,
    plan: &TemplatePlan,
) -> TallyMatchResult<CorrelationSurface> {
    FrameScorer::new(image).score(plan)
}

/// Scores the full surface with an explicit per-placement kernel on the
/// calling thread.
///
/// Used to cross-check the accelerated paths against the scalar reference.
pub fn score_surface_with_kernel<K: Kernel>(
    image: ImageView<'_, u8>,
    plan: &TemplatePlan,
) -> TallyMatchResult<CorrelationSurface> {
    check_fits(image, plan)?;
    let width = image.width() - plan.width() + 1;
    let height = image.height() - plan.height() + 1;
    let integral = IntegralImage::new(image);
    let ctx = ScanContext::new(image, &integral, plan);
    let mut scores = vec![0.0f32; width * height];
    for (y, row) in scores.chunks_mut(width).enumerate() {
        ctx.fill_row::<K>(y, row);
    }
    Ok(CorrelationSurface::from_scores(
        width,
        height,
        plan.width(),
        plan.height(),
        scores,
    ))
}
