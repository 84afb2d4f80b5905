//! Curve geometry with a piecewise-linear interpolant and its derivative.

use std::sync::OnceLock;

use crate::error::CurveError;

/// Quantities derived from the coordinates, computed on first use.
#[derive(Debug, Clone)]
struct Derived {
    y_min: f64,
    y_max: f64,
    slopes: Vec<f64>,
    slope_min: f64,
    slope_max: f64,
}

/// A named sequence of `(x, y)` coordinates with strictly increasing x.
///
/// Values and slopes between coordinates follow the piecewise-linear
/// interpolant. Derived quantities (y range, per-point slopes) are cached and
/// dropped whenever the geometry is handed out for mutation.
#[derive(Debug, Clone)]
pub struct Curve {
    name: String,
    x: Vec<f64>,
    y: Vec<f64>,
    derived: OnceLock<Derived>,
}

impl Curve {
    /// Create a curve from y-values sampled at `x = 0, 1, ..., n-1`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`CurveError::TooFewPoints`] | fewer than 2 values |
    /// | [`CurveError::NonFiniteValue`] | any value is NaN or infinite |
    pub fn new(name: impl Into<String>, y: Vec<f64>) -> Result<Self, CurveError> {
        let x = (0..y.len()).map(|i| i as f64).collect();
        Self::with_x(name, x, y)
    }

    /// Create a curve from paired x- and y-values.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`CurveError::LengthMismatch`] | `x.len() != y.len()` |
    /// | [`CurveError::TooFewPoints`] | fewer than 2 coordinates |
    /// | [`CurveError::NonFiniteValue`] | any coordinate is NaN or infinite |
    /// | [`CurveError::NotIncreasing`] | x is not strictly increasing |
    pub fn with_x(name: impl Into<String>, x: Vec<f64>, y: Vec<f64>) -> Result<Self, CurveError> {
        if x.len() != y.len() {
            return Err(CurveError::LengthMismatch {
                x_len: x.len(),
                y_len: y.len(),
            });
        }
        validate(&x, &y)?;
        Ok(Self {
            name: name.into(),
            x,
            y,
            derived: OnceLock::new(),
        })
    }

    /// Return the curve name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replace the curve name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Return the number of coordinates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Always `false`: a valid curve has at least two coordinates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Return the x-coordinates.
    #[must_use]
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// Return the y-coordinates.
    #[must_use]
    pub fn y(&self) -> &[f64] {
        &self.y
    }

    /// Smallest x.
    #[must_use]
    pub fn x_min(&self) -> f64 {
        self.x[0]
    }

    /// Largest x.
    #[must_use]
    pub fn x_max(&self) -> f64 {
        self.x[self.x.len() - 1]
    }

    /// Extent of the curve along x.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.x_max() - self.x_min()
    }

    /// Smallest y.
    #[must_use]
    pub fn y_min(&self) -> f64 {
        self.derived().y_min
    }

    /// Largest y.
    #[must_use]
    pub fn y_max(&self) -> f64 {
        self.derived().y_max
    }

    /// Slope of the interpolant at every coordinate.
    #[must_use]
    pub fn slopes(&self) -> &[f64] {
        &self.derived().slopes
    }

    /// Smallest per-point slope.
    #[must_use]
    pub fn slope_min(&self) -> f64 {
        self.derived().slope_min
    }

    /// Largest per-point slope.
    #[must_use]
    pub fn slope_max(&self) -> f64 {
        self.derived().slope_max
    }

    /// Evaluate the interpolant at `x`.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::OutOfRange`] if `x` lies outside `[x_min, x_max]`.
    pub fn value(&self, x: f64) -> Result<f64, CurveError> {
        let k = self.segment(x)?;
        let (x0, x1) = (self.x[k], self.x[k + 1]);
        if x == x1 {
            return Ok(self.y[k + 1]);
        }
        let t = (x - x0) / (x1 - x0);
        Ok(self.y[k] + t * (self.y[k + 1] - self.y[k]))
    }

    /// Evaluate the derivative of the interpolant at `x`.
    ///
    /// At a coordinate the slope of the segment to its right is used; at the
    /// last coordinate, the slope of the last segment.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::OutOfRange`] if `x` lies outside `[x_min, x_max]`.
    pub fn slope(&self, x: f64) -> Result<f64, CurveError> {
        let k = self.segment(x)?;
        Ok(self.segment_slope(k))
    }

    /// Return the index of the coordinate nearest to `x`.
    ///
    /// Equidistant positions resolve to the lower index. Positions outside the
    /// curve clamp to the first or last coordinate.
    #[must_use]
    pub fn closest_point(&self, x: f64) -> usize {
        let last = self.x.len() - 1;
        if x <= self.x[0] {
            return 0;
        }
        if x >= self.x[last] {
            return last;
        }
        let hi = self.x.partition_point(|&v| v < x);
        let lo = hi - 1;
        if x - self.x[lo] <= self.x[hi] - x {
            lo
        } else {
            hi
        }
    }

    /// Sample `n` equidistant y-values across the curve.
    ///
    /// The first and last samples are the curve's first and last y exactly.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::InvalidSampleCount`] if `n < 2`.
    pub fn resample(&self, n: usize) -> Result<Vec<f64>, CurveError> {
        if n < 2 {
            return Err(CurveError::InvalidSampleCount { n });
        }
        let x0 = self.x_min();
        let step = self.length() / (n - 1) as f64;
        let mut out = Vec::with_capacity(n);
        out.push(self.y[0]);
        for i in 1..n - 1 {
            out.push(self.value(x0 + step * i as f64)?);
        }
        out.push(self.y[self.y.len() - 1]);
        Ok(out)
    }

    /// Borrow the coordinate buffers for in-place mutation.
    ///
    /// Cached derived values are dropped immediately. Callers must finish
    /// with [`geometry_changed`][Self::geometry_changed] so the new geometry
    /// is re-validated.
    pub fn geometry_mut(&mut self) -> (&mut [f64], &mut [f64]) {
        self.derived = OnceLock::new();
        (&mut self.x, &mut self.y)
    }

    /// Signal that coordinates were mutated: drop caches and re-validate.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`CurveError::NonFiniteValue`] | a coordinate became non-finite |
    /// | [`CurveError::NotIncreasing`] | x is no longer strictly increasing |
    pub fn geometry_changed(&mut self) -> Result<(), CurveError> {
        self.derived = OnceLock::new();
        validate(&self.x, &self.y)
    }

    /// Overwrite this curve with another curve's geometry, reusing buffers.
    pub fn copy_from(&mut self, other: &Curve) {
        self.name.clone_from(&other.name);
        self.x.clone_from(&other.x);
        self.y.clone_from(&other.y);
        self.derived = OnceLock::new();
    }

    /// Consume the curve and return its `(name, x, y)` parts.
    #[must_use]
    pub fn into_parts(self) -> (String, Vec<f64>, Vec<f64>) {
        (self.name, self.x, self.y)
    }

    fn segment(&self, x: f64) -> Result<usize, CurveError> {
        let (min, max) = (self.x_min(), self.x_max());
        if !(x >= min && x <= max) {
            return Err(CurveError::OutOfRange { x, min, max });
        }
        let k = self.x.partition_point(|&v| v <= x);
        Ok((k - 1).min(self.x.len() - 2))
    }

    fn segment_slope(&self, k: usize) -> f64 {
        (self.y[k + 1] - self.y[k]) / (self.x[k + 1] - self.x[k])
    }

    fn derived(&self) -> &Derived {
        self.derived.get_or_init(|| {
            let n = self.x.len();
            let slopes: Vec<f64> = (0..n)
                .map(|i| self.segment_slope(i.min(n - 2)))
                .collect();
            let (y_min, y_max) = min_max(&self.y);
            let (slope_min, slope_max) = min_max(&slopes);
            Derived {
                y_min,
                y_max,
                slopes,
                slope_min,
                slope_max,
            }
        })
    }
}

impl PartialEq for Curve {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.len() == other.len()
            && self.length() == other.length()
            && self.x == other.x
            && self.y == other.y
    }
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

fn validate(x: &[f64], y: &[f64]) -> Result<(), CurveError> {
    if x.len() < 2 {
        return Err(CurveError::TooFewPoints { len: x.len() });
    }
    if let Some(index) = x
        .iter()
        .zip(y)
        .position(|(a, b)| !a.is_finite() || !b.is_finite())
    {
        return Err(CurveError::NonFiniteValue { index });
    }
    if let Some(w) = x.windows(2).position(|w| w[1] <= w[0]) {
        return Err(CurveError::NotIncreasing { index: w + 1 });
    }
    Ok(())
}
