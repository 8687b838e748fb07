//! Template plan precomputation for normalized correlation.

use crate::image::ImageView;
use crate::util::{TallyMatchError, TallyMatchResult};

/// Precomputed statistics and zero-mean buffer for one template at one scale.
pub struct TemplatePlan {
    width: usize,
    height: usize,
    sum: u64,
    sum_sq: u64,
    mean: f32,
    zero_mean: Vec<f32>,
}

impl TemplatePlan {
    /// Builds a plan from a grayscale template view.
    pub fn from_view(tpl: ImageView<'_, u8>) -> TallyMatchResult<Self> {
        let width = tpl.width();
        let height = tpl.height();
        let count = width
            .checked_mul(height)
            .ok_or(TallyMatchError::InvalidDimensions { width, height })?;

        let mut samples = Vec::with_capacity(count);
        for y in 0..height {
            let row = tpl.row(y).ok_or(TallyMatchError::BufferTooSmall {
                needed: y * tpl.stride() + width,
                got: tpl.as_slice().len(),
            })?;
            samples.extend_from_slice(row);
        }

        let sum: u64 = samples.iter().map(|&v| u64::from(v)).sum();
        let sum_sq: u64 = samples.iter().map(|&v| u64::from(v) * u64::from(v)).sum();
        let mean = (sum as f64 / count as f64) as f32;
        let zero_mean = samples.iter().map(|&v| v as f32 - mean).collect();

        Ok(Self {
            width,
            height,
            sum,
            sum_sq,
            mean,
            zero_mean,
        })
    }

    /// Returns the template width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the template height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of template samples.
    pub fn len(&self) -> usize {
        self.zero_mean.len()
    }

    /// Always false; plans are built from non-empty views.
    pub fn is_empty(&self) -> bool {
        self.zero_mean.is_empty()
    }

    /// Returns the mean intensity of the template.
    pub fn mean(&self) -> f32 {
        self.mean
    }

    /// Returns the zero-mean template buffer in row-major order.
    pub fn zero_mean(&self) -> &[f32] {
        &self.zero_mean
    }

    pub(crate) fn sum(&self) -> u64 {
        self.sum
    }

    /// `n * sum_sq - sum^2`; zero exactly when every sample is equal.
    pub(crate) fn scaled_variance(&self) -> u128 {
        let n = self.len() as u128;
        (n * u128::from(self.sum_sq)).saturating_sub(u128::from(self.sum) * u128::from(self.sum))
    }

    /// True when the template has no intensity variation, which leaves the
    /// correlation coefficient undefined.
    pub fn is_flat(&self) -> bool {
        self.scaled_variance() == 0
    }

    /// Sum of squared deviations from the mean.
    pub fn energy(&self) -> f64 {
        self.scaled_variance() as f64 / self.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::TemplatePlan;
    use crate::image::OwnedImage;

    #[test]
    fn plan_matches_known_stats() {
        let tpl = OwnedImage::new(vec![0u8, 1, 2, 3], 2, 2).unwrap();
        let plan = TemplatePlan::from_view(tpl.view()).unwrap();
        assert!((plan.mean() - 1.5).abs() < 1e-6);
        assert!((plan.energy() - 5.0).abs() < 1e-12);
        let expected = [-1.5f32, -0.5, 0.5, 1.5];
        for (value, want) in plan.zero_mean().iter().zip(expected.iter()) {
            assert!((value - want).abs() < 1e-6);
        }
        assert!(!plan.is_flat());
    }

    #[test]
    fn uniform_template_is_flat() {
        let tpl = OwnedImage::filled(3, 3, 42).unwrap();
        let plan = TemplatePlan::from_view(tpl.view()).unwrap();
        assert!(plan.is_flat());
        assert_eq!(plan.energy(), 0.0);
    }
}
