//! Summed-area tables for O(1) window statistics.

use crate::image::ImageView;

/// Integral images of the samples and of their squares.
///
/// Both tables have `(width + 1) * (height + 1)` entries with a zero first row
/// and column, so any window sum is four lookups. Entries are exact integers.
pub(crate) struct IntegralImage {
    width: usize,
    sum: Vec<u64>,
    sum_sq: Vec<u64>,
}

/// Exact first and second moments of one window.
#[derive(Clone, Copy, Debug)]
pub(crate) struct WindowStats {
    pub(crate) sum: u64,
    pub(crate) sum_sq: u64,
}

impl IntegralImage {
    pub(crate) fn new(image: ImageView<'_, u8>) -> Self {
        let width = image.width();
        let height = image.height();
        let cols = width + 1;
        let mut sum = vec![0u64; cols * (height + 1)];
        let mut sum_sq = vec![0u64; cols * (height + 1)];

        for y in 0..height {
            let row = image.row(y).unwrap_or(&[]);
            let mut row_sum = 0u64;
            let mut row_sq = 0u64;
            for (x, &value) in row.iter().enumerate() {
                let v = u64::from(value);
                row_sum += v;
                row_sq += v * v;
                let idx = (y + 1) * cols + x + 1;
                sum[idx] = sum[idx - cols] + row_sum;
                sum_sq[idx] = sum_sq[idx - cols] + row_sq;
            }
        }

        Self { width, sum, sum_sq }
    }

    /// Statistics of the `w x h` window with top-left corner `(x, y)`.
    ///
    /// The caller guarantees the window lies inside the image.
    #[inline]
    pub(crate) fn window(&self, x: usize, y: usize, w: usize, h: usize) -> WindowStats {
        let cols = self.width + 1;
        let a = y * cols + x;
        let b = a + w;
        let c = (y + h) * cols + x;
        let d = c + w;
        WindowStats {
            sum: self.sum[d] + self.sum[a] - self.sum[b] - self.sum[c],
            sum_sq: self.sum_sq[d] + self.sum_sq[a] - self.sum_sq[b] - self.sum_sq[c],
        }
    }
}

impl WindowStats {
    /// `n * sum_sq - sum^2`, i.e. `n^2` times the population variance.
    /// Exact, so a flat window yields exactly zero.
    #[inline]
    pub(crate) fn scaled_variance(&self, n: u64) -> u128 {
        let n_sq = u128::from(n) * u128::from(self.sum_sq);
        let sq = u128::from(self.sum) * u128::from(self.sum);
        n_sq.saturating_sub(sq)
    }
}
