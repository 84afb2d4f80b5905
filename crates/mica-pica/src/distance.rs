//! Sampling-based distances between two curves.
//!
//! Each curve is sampled at `N` equidistant positions spanning its own range.
//! The distance folds the pointwise differences into a single value; the fold
//! can be undone ([`Distance::unfinalize`]) so PICA can replace the samples of
//! one interval without resampling the whole curve.

use std::ops::Range;

use mica_curve::{precision, Curve};

use crate::decomposition::IntervalDecomposition;
use crate::error::AlignError;

/// How pointwise differences are folded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Mean of `|a - b|`.
    MeanAbsolute,
    /// Square root of the mean of `(a - b)^2`.
    RootMeanSquare,
}

/// Which quantity is sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Basis {
    /// The interpolated y-value.
    Value,
    /// The derivative of the interpolant.
    Slope,
}

/// A distance function over `samples` equidistant positions.
///
/// # Defaults
///
/// There is no default sample count; the CLI uses 500.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Distance {
    metric: Metric,
    basis: Basis,
    samples: usize,
}

impl Distance {
    /// Create a distance function.
    ///
    /// # Errors
    ///
    /// Returns [`AlignError::InvalidSampleCount`] if `samples < 2`.
    pub fn new(metric: Metric, basis: Basis, samples: usize) -> Result<Self, AlignError> {
        if samples < 2 {
            return Err(AlignError::InvalidSampleCount { samples });
        }
        Ok(Self {
            metric,
            basis,
            samples,
        })
    }

    /// Mean absolute difference of y-values.
    ///
    /// # Errors
    ///
    /// Returns [`AlignError::InvalidSampleCount`] if `samples < 2`.
    pub fn mean_absolute(samples: usize) -> Result<Self, AlignError> {
        Self::new(Metric::MeanAbsolute, Basis::Value, samples)
    }

    /// Root mean square difference of y-values.
    ///
    /// # Errors
    ///
    /// Returns [`AlignError::InvalidSampleCount`] if `samples < 2`.
    pub fn rms(samples: usize) -> Result<Self, AlignError> {
        Self::new(Metric::RootMeanSquare, Basis::Value, samples)
    }

    /// Mean absolute difference of slopes.
    ///
    /// # Errors
    ///
    /// Returns [`AlignError::InvalidSampleCount`] if `samples < 2`.
    pub fn slope_mean_absolute(samples: usize) -> Result<Self, AlignError> {
        Self::new(Metric::MeanAbsolute, Basis::Slope, samples)
    }

    /// Root mean square difference of slopes.
    ///
    /// # Errors
    ///
    /// Returns [`AlignError::InvalidSampleCount`] if `samples < 2`.
    pub fn slope_rms(samples: usize) -> Result<Self, AlignError> {
        Self::new(Metric::RootMeanSquare, Basis::Slope, samples)
    }

    /// Return how sample differences are aggregated.
    #[must_use]
    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Return whether values or slopes are compared.
    #[must_use]
    pub fn basis(&self) -> Basis {
        self.basis
    }

    /// Return the number of sample positions per curve.
    #[must_use]
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Pointwise contribution of one sample pair.
    #[must_use]
    pub fn point(&self, a: f64, b: f64) -> f64 {
        match self.metric {
            Metric::MeanAbsolute => (a - b).abs(),
            Metric::RootMeanSquare => (a - b) * (a - b),
        }
    }

    /// Fold a sum of `n` pointwise contributions into a distance.
    #[must_use]
    pub fn finalize(&self, sum: f64, n: usize) -> f64 {
        let mean = sum / n as f64;
        match self.metric {
            Metric::MeanAbsolute => mean,
            Metric::RootMeanSquare => mean.sqrt(),
        }
    }

    /// Recover the sum of `n` pointwise contributions from a distance.
    #[must_use]
    pub fn unfinalize(&self, value: f64, n: usize) -> f64 {
        match self.metric {
            Metric::MeanAbsolute => value * n as f64,
            Metric::RootMeanSquare => value * value * n as f64,
        }
    }

    /// Position of sample `k` on `curve`; the first and last are pinned to the
    /// curve's extremes.
    #[must_use]
    pub fn sample_position(&self, curve: &Curve, k: usize) -> f64 {
        let last = self.samples - 1;
        if k == 0 {
            return curve.x_min();
        }
        if k >= last {
            return curve.x_max();
        }
        let step = curve.length() / last as f64;
        (curve.x_min() + step * k as f64).min(curve.x_max())
    }

    /// Distance between two curves over all samples.
    ///
    /// # Errors
    ///
    /// Returns [`AlignError::Curve`] if a sample cannot be evaluated.
    pub fn distance(&self, a: &Curve, b: &Curve) -> Result<f64, AlignError> {
        let sum = self.partial_sum(a, b, 0..self.samples)?;
        Ok(self.finalize(sum, self.samples))
    }

    /// Sum of pointwise contributions for the sample indices in `range`.
    ///
    /// # Errors
    ///
    /// Returns [`AlignError::Curve`] if a sample cannot be evaluated.
    pub fn partial_sum(&self, a: &Curve, b: &Curve, range: Range<usize>) -> Result<f64, AlignError> {
        let mut sum = 0.0;
        for k in range {
            let va = self.sample(a, k)?;
            let vb = self.sample(b, k)?;
            sum += self.point(va, vb);
        }
        Ok(sum)
    }

    /// Sample indices that fall into interval `i` of `d`.
    ///
    /// An interval owns the samples from its left boundary (inclusive, within
    /// the precision tolerance) up to its right boundary; the last interval
    /// also owns the final sample.
    ///
    /// # Errors
    ///
    /// Returns [`AlignError::IntervalOutOfBounds`] if `i >= d.size()`.
    pub fn sample_range(&self, d: &IntervalDecomposition, i: usize) -> Result<Range<usize>, AlignError> {
        let (lo, hi) = d.interval_bounds(i)?;
        let curve = d.curve();
        let start = if i == 0 { 0 } else { self.first_sample_from(curve, lo) };
        let end = if i + 1 == d.size() {
            self.samples
        } else {
            self.first_sample_from(curve, hi)
        };
        Ok(start..end.max(start))
    }

    fn first_sample_from(&self, curve: &Curve, x: f64) -> usize {
        let eps = precision::epsilon(curve.length());
        let step = curve.length() / (self.samples - 1) as f64;
        let k = ((x - curve.x_min() - eps) / step).ceil();
        if k <= 0.0 {
            0
        } else {
            (k as usize).min(self.samples)
        }
    }

    fn sample(&self, curve: &Curve, k: usize) -> Result<f64, AlignError> {
        let x = self.sample_position(curve, k);
        let v = match self.basis {
            Basis::Value => curve.value(x)?,
            Basis::Slope => curve.slope(x)?,
        };
        Ok(v)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mica_curve::{AnnotatedCurve, Category};

    use super::*;

    fn curve(y: Vec<f64>) -> Curve {
        Curve::new("c", y).unwrap()
    }

    #[test]
    fn rejects_single_sample() {
        assert!(matches!(
            Distance::rms(1),
            Err(AlignError::InvalidSampleCount { samples: 1 })
        ));
    }

    #[test]
    fn three_sample_example() {
        let d = Distance::mean_absolute(3).unwrap();
        let v = d
            .distance(&curve(vec![0.0, 1.0, 0.0]), &curve(vec![0.0, 2.0, 0.0]))
            .unwrap();
        assert!((v - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn rms_of_constant_offset() {
        let d = Distance::rms(7).unwrap();
        let v = d
            .distance(&curve(vec![1.0, 1.0, 1.0]), &curve(vec![3.0, 3.0, 3.0]))
            .unwrap();
        assert!((v - 2.0).abs() < 1e-12);
    }

    #[test]
    fn slope_basis_ignores_offset() {
        let d = Distance::slope_mean_absolute(11).unwrap();
        let v = d
            .distance(&curve(vec![0.0, 1.0, 2.0]), &curve(vec![5.0, 6.0, 7.0]))
            .unwrap();
        assert!(v.abs() < 1e-12);
    }

    #[test]
    fn fold_unfold_inverse() {
        for d in [Distance::mean_absolute(5).unwrap(), Distance::slope_rms(5).unwrap()] {
            let value = d.finalize(12.5, 5);
            assert!((d.unfinalize(value, 5) - 12.5).abs() < 1e-12);
        }
    }

    #[test]
    fn curves_of_different_length_sample_their_own_range() {
        let d = Distance::mean_absolute(5).unwrap();
        let a = Curve::with_x("a", vec![0.0, 4.0], vec![0.0, 4.0]).unwrap();
        let b = Curve::with_x("b", vec![10.0, 12.0], vec![0.0, 4.0]).unwrap();
        assert_eq!(d.sample_position(&b, 4), 12.0);
        assert!(d.distance(&a, &b).unwrap().abs() < 1e-12);
    }

    #[test]
    fn sample_ranges_partition_all_samples() {
        let mut c = AnnotatedCurve::new("c", vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        c.set_manual(2, Category::Split).unwrap();
        c.set_manual(5, Category::Split).unwrap();
        let dec = IntervalDecomposition::new(Arc::new(c));
        let d = Distance::mean_absolute(13).unwrap();

        let ranges: Vec<_> = (0..dec.size())
            .map(|i| d.sample_range(&dec, i).unwrap())
            .collect();
        assert_eq!(ranges, vec![0..4, 4..10, 10..13]);
    }

    #[test]
    fn partial_sums_add_up() {
        let mut c = AnnotatedCurve::new("c", vec![0.0, 2.0, 1.0, 3.0, 0.5]).unwrap();
        c.set_manual(2, Category::Split).unwrap();
        let dec = IntervalDecomposition::new(Arc::new(c));
        let other = curve(vec![1.0, 1.0, 1.0, 1.0, 1.0]);
        let d = Distance::rms(9).unwrap();

        let total = d.partial_sum(dec.curve(), &other, 0..9).unwrap();
        let parts: f64 = (0..dec.size())
            .map(|i| {
                let r = d.sample_range(&dec, i).unwrap();
                d.partial_sum(dec.curve(), &other, r).unwrap()
            })
            .sum();
        assert!((total - parts).abs() < 1e-12);
    }
}
