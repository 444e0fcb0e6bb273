/*!
 * Column Window & Statistics Surface
 * Lag/lead, cumulative and rolling windows, ranking, and moments
 *
 * Rolling and fill operations run on the float NaN-for-null convention:
 * a nullable column first materializes its nulls as NaN, the kernel runs,
 * and the result carries NaN where the window was incomplete or the input
 * was null. Ranking and moments are valid-element computations.
 */

use super::Column;
use crate::core::bitmap::bit_get;
use crate::core::errors::Result;
use crate::core::types::{Float, Native};
use crate::simd::{cond, stats, window};

impl Column {
    /// Float data with null slots materialized as NaN
    fn float_values<T: Float>(&self) -> Result<Vec<T>> {
        let data = self.values::<T>()?;
        let mut out = data.to_vec();
        if let Some(bm) = self.validity() {
            for (i, slot) in out.iter_mut().enumerate() {
                if !bit_get(bm, i) {
                    *slot = T::nan();
                }
            }
        }
        Ok(out)
    }

    /// 0/1 mask of null elements
    pub fn is_null_mask(&self) -> Column {
        let mut mask = vec![0u8; self.len()];
        if let Some(bm) = self.validity() {
            for (i, m) in mask.iter_mut().enumerate() {
                *m = u8::from(!bit_get(bm, i));
            }
        }
        Column::from_mask(mask)
    }

    /// Replace nulls (and float NaNs) with a scalar; the result has no
    /// validity bitmap
    pub fn fill_null<T: Float>(&self, fill: T) -> Result<Column> {
        let data = self.float_values::<T>()?;
        let mut out = vec![T::default(); data.len()];
        cond::fill_null(&data, fill, &mut out);
        Ok(Column::from_vec(out))
    }

    /// Carry the last non-null value forward
    pub fn forward_fill<T: Float>(&self) -> Result<Column> {
        let data = self.float_values::<T>()?;
        let mut out = vec![T::default(); data.len()];
        cond::forward_fill(&data, &mut out);
        Ok(Column::from_vec(out))
    }

    /// Carry the next non-null value backward
    pub fn backward_fill<T: Float>(&self) -> Result<Column> {
        let data = self.float_values::<T>()?;
        let mut out = vec![T::default(); data.len()];
        cond::backward_fill(&data, &mut out);
        Ok(Column::from_vec(out))
    }

    /// Element-wise first non-null of (self, other)
    pub fn coalesce<T: Float>(&self, other: &Column) -> Result<Column> {
        let a = self.float_values::<T>()?;
        let b = other.float_values::<T>()?;
        let mut out = vec![T::default(); a.len()];
        cond::coalesce(&a, &b, &mut out);
        Ok(Column::from_vec(out))
    }

    /// Shift forward by `periods`, filling the head with `fill`
    pub fn lag<T: Native>(&self, periods: usize, fill: T) -> Result<Column> {
        let data = self.values::<T>()?;
        let mut out = vec![T::default(); data.len()];
        window::lag(data, periods, fill, &mut out);
        Ok(Column::from_vec(out))
    }

    /// Shift backward by `periods`, filling the tail with `fill`
    pub fn lead<T: Native>(&self, periods: usize, fill: T) -> Result<Column> {
        let data = self.values::<T>()?;
        let mut out = vec![T::default(); data.len()];
        window::lead(data, periods, fill, &mut out);
        Ok(Column::from_vec(out))
    }

    pub fn cum_sum<T: Native>(&self) -> Result<Column> {
        let data = self.values::<T>()?;
        let mut out = vec![T::default(); data.len()];
        window::cum_sum(data, &mut out);
        Ok(Column::from_vec(out))
    }

    pub fn cum_min<T: Native>(&self) -> Result<Column> {
        let data = self.values::<T>()?;
        let mut out = vec![T::default(); data.len()];
        window::cum_min(data, &mut out);
        Ok(Column::from_vec(out))
    }

    pub fn cum_max<T: Native>(&self) -> Result<Column> {
        let data = self.values::<T>()?;
        let mut out = vec![T::default(); data.len()];
        window::cum_max(data, &mut out);
        Ok(Column::from_vec(out))
    }

    /// Trailing-window sum; NaN until the window fills
    pub fn rolling_sum<T: Float>(&self, window_len: usize) -> Result<Column> {
        let data = self.float_values::<T>()?;
        let mut out = vec![T::default(); data.len()];
        window::rolling_sum(&data, window_len, &mut out);
        Ok(Column::from_vec(out))
    }

    pub fn rolling_mean<T: Float>(&self, window_len: usize) -> Result<Column> {
        let data = self.float_values::<T>()?;
        let mut out = vec![T::default(); data.len()];
        window::rolling_mean(&data, window_len, &mut out);
        Ok(Column::from_vec(out))
    }

    /// Rolling sample standard deviation over f64 data
    pub fn rolling_std(&self, window_len: usize) -> Result<Column> {
        let data = self.float_values::<f64>()?;
        let mut out = vec![0.0f64; data.len()];
        window::rolling_std(&data, window_len, &mut out);
        Ok(Column::from_vec(out))
    }

    pub fn rolling_min<T: Float>(&self, window_len: usize) -> Result<Column> {
        let data = self.float_values::<T>()?;
        let mut out = vec![T::default(); data.len()];
        window::rolling_min(&data, window_len, &mut out);
        Ok(Column::from_vec(out))
    }

    pub fn rolling_max<T: Float>(&self, window_len: usize) -> Result<Column> {
        let data = self.float_values::<T>()?;
        let mut out = vec![T::default(); data.len()];
        window::rolling_max(&data, window_len, &mut out);
        Ok(Column::from_vec(out))
    }

    /// Difference against the value `periods` back; NaN head
    pub fn diff<T: Float>(&self, periods: usize) -> Result<Column> {
        let data = self.float_values::<T>()?;
        let mut out = vec![T::default(); data.len()];
        window::diff(&data, periods, &mut out);
        Ok(Column::from_vec(out))
    }

    /// Fractional change against the value `periods` back
    pub fn pct_change<T: Float>(&self, periods: usize) -> Result<Column> {
        let data = self.float_values::<T>()?;
        let mut out = vec![T::default(); data.len()];
        window::pct_change(&data, periods, &mut out);
        Ok(Column::from_vec(out))
    }

    /// 1-based rank; ties share the minimum rank
    pub fn rank<T: Native>(&self) -> Result<Vec<u32>> {
        let data = self.values::<T>()?;
        let mut out = vec![0u32; data.len()];
        window::rank(data, &mut out);
        Ok(out)
    }

    /// 1-based dense rank without gaps
    pub fn dense_rank<T: Native>(&self) -> Result<Vec<u32>> {
        let data = self.values::<T>()?;
        let mut out = vec![0u32; data.len()];
        window::dense_rank(data, &mut out);
        Ok(out)
    }

    /// 1-based row number, optionally restarting per partition id
    pub fn row_number(&self, partitions: Option<&[u32]>) -> Vec<u32> {
        let mut out = vec![0u32; self.len()];
        window::row_number(self.len(), partitions, &mut out);
        out
    }

    // =========================================================================
    // Moments and quantiles
    // =========================================================================

    /// Sample variance over valid elements
    pub fn variance<T: Native>(&self) -> Result<f64> {
        Ok(stats::variance(&self.valid_f64::<T>()?))
    }

    pub fn std_dev<T: Native>(&self) -> Result<f64> {
        Ok(stats::std_dev(&self.valid_f64::<T>()?))
    }

    pub fn skewness<T: Native>(&self) -> Result<f64> {
        Ok(stats::skewness(&self.valid_f64::<T>()?))
    }

    pub fn kurtosis<T: Native>(&self) -> Result<f64> {
        Ok(stats::kurtosis(&self.valid_f64::<T>()?))
    }

    pub fn median<T: Native>(&self) -> Result<f64> {
        Ok(stats::median(&self.valid_f64::<T>()?))
    }

    /// Quantile `q` in [0,1] with linear interpolation
    pub fn quantile<T: Native>(&self, q: f64) -> Result<f64> {
        Ok(stats::quantile(&self.valid_f64::<T>()?, q))
    }

    /// Pearson correlation between two columns' valid rows (rows where
    /// either side is null are dropped pairwise)
    pub fn correlation<T: Native>(&self, other: &Column) -> Result<f64> {
        let a = self.values::<T>()?;
        let b = other.values::<T>()?;
        if a.len() != b.len() {
            return Ok(f64::NAN);
        }
        let mut xs = Vec::with_capacity(a.len());
        let mut ys = Vec::with_capacity(a.len());
        for i in 0..a.len() {
            if self.is_valid(i) && other.is_valid(i) {
                xs.push(a[i].to_f64());
                ys.push(b[i].to_f64());
            }
        }
        Ok(stats::correlation(&xs, &ys))
    }

    /// Valid elements widened to f64
    fn valid_f64<T: Native>(&self) -> Result<Vec<f64>> {
        let data = self.values::<T>()?;
        Ok(match self.validity() {
            None => data.iter().map(|v| v.to_f64()).collect(),
            Some(bm) => data
                .iter()
                .enumerate()
                .filter(|(i, _)| bit_get(bm, *i))
                .map(|(_, v)| v.to_f64())
                .collect(),
        })
    }
}
