//! Deformable landmark-delimited working copies of annotated curves.

use std::sync::Arc;

use mica_curve::{precision, AnnotatedCurve, Category, Curve, Landmark};

use crate::error::AlignError;

/// A curve split into intervals by an ordered list of boundary landmarks.
///
/// The source curve is shared and never modified. The decomposition owns a
/// separate copy of the coordinates which the alignment warps in place;
/// cloning a decomposition copies that buffer.
///
/// Invariant: at least two boundaries, strictly increasing in both
/// coordinate index and x. The first boundary is the first coordinate and the
/// last boundary is the last coordinate.
#[derive(Debug, Clone)]
pub struct IntervalDecomposition {
    source: Arc<AnnotatedCurve>,
    curve: Curve,
    boundaries: Vec<Landmark>,
}

impl IntervalDecomposition {
    /// Decompose a curve at its start, its split landmarks and its end.
    #[must_use]
    pub fn new(source: Arc<AnnotatedCurve>) -> Self {
        let n = source.len();
        let annotation = source.annotation();
        let mut boundaries = Vec::with_capacity(2);
        boundaries.push(Landmark::new(0, annotation[0]));
        boundaries.extend(
            source
                .filtered_landmarks()
                .iter()
                .filter(|l| l.category() == Category::Split)
                .copied(),
        );
        boundaries.push(Landmark::new(n - 1, annotation[n - 1]));
        Self {
            curve: source.curve().clone(),
            source,
            boundaries,
        }
    }

    /// Decompose a curve at explicit interior boundary coordinates.
    ///
    /// The first and last coordinates are always boundaries. Each boundary
    /// takes the annotation type found at its index.
    ///
    /// # Errors
    ///
    /// Returns [`AlignError::UnorderedBoundary`] if `interior` is not strictly
    /// increasing or names an endpoint.
    pub fn with_boundaries(source: Arc<AnnotatedCurve>, interior: &[usize]) -> Result<Self, AlignError> {
        let n = source.len();
        let annotation = source.annotation();
        let mut boundaries = Vec::with_capacity(interior.len() + 2);
        boundaries.push(Landmark::new(0, annotation[0]));
        let mut previous = 0;
        for &index in interior {
            if index <= previous || index >= n - 1 {
                return Err(AlignError::UnorderedBoundary { index });
            }
            boundaries.push(Landmark::new(index, annotation[index]));
            previous = index;
        }
        boundaries.push(Landmark::new(n - 1, annotation[n - 1]));
        Ok(Self {
            curve: source.curve().clone(),
            source,
            boundaries,
        })
    }

    /// Decompose a curve and rescale it to `length`, keeping its start in place.
    ///
    /// # Errors
    ///
    /// Returns [`AlignError::InvalidLength`] if `length` is not positive and finite.
    pub fn with_length(source: Arc<AnnotatedCurve>, length: f64) -> Result<Self, AlignError> {
        let mut d = Self::new(source);
        d.rescale(length)?;
        Ok(d)
    }

    /// Copy this decomposition, rescaled to `length`.
    ///
    /// # Errors
    ///
    /// Returns [`AlignError::InvalidLength`] if `length` is not positive and finite.
    pub fn rescaled(&self, length: f64) -> Result<Self, AlignError> {
        let mut d = self.clone();
        d.rescale(length)?;
        Ok(d)
    }

    /// Return the immutable source curve.
    #[must_use]
    pub fn source(&self) -> &Arc<AnnotatedCurve> {
        &self.source
    }

    /// Return the warped working geometry.
    #[must_use]
    pub fn curve(&self) -> &Curve {
        &self.curve
    }

    /// Return the source curve's name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.source.name()
    }

    /// Return the number of intervals.
    #[must_use]
    pub fn size(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Return the boundary landmarks in order.
    #[must_use]
    pub fn boundaries(&self) -> &[Landmark] {
        &self.boundaries
    }

    /// Return the x-position of every boundary.
    #[must_use]
    pub fn boundary_positions(&self) -> Vec<f64> {
        let x = self.curve.x();
        self.boundaries.iter().map(|b| x[b.index]).collect()
    }

    /// First x of the working geometry.
    #[must_use]
    pub fn x_start(&self) -> f64 {
        self.curve.x_min()
    }

    /// Last x of the working geometry.
    #[must_use]
    pub fn x_end(&self) -> f64 {
        self.curve.x_max()
    }

    /// Total length of the working geometry.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.curve.length()
    }

    /// Return the coordinate indices `(start, end)` delimiting interval `i`.
    ///
    /// # Errors
    ///
    /// Returns [`AlignError::IntervalOutOfBounds`] if `i >= size()`.
    pub fn interval(&self, i: usize) -> Result<(usize, usize), AlignError> {
        if i >= self.size() {
            return Err(AlignError::IntervalOutOfBounds {
                interval: i,
                size: self.size(),
            });
        }
        Ok((self.boundaries[i].index, self.boundaries[i + 1].index))
    }

    /// Return the x-extent `(start, end)` of interval `i`.
    ///
    /// # Errors
    ///
    /// Returns [`AlignError::IntervalOutOfBounds`] if `i >= size()`.
    pub fn interval_bounds(&self, i: usize) -> Result<(f64, f64), AlignError> {
        let (s, e) = self.interval(i)?;
        let x = self.curve.x();
        Ok((x[s], x[e]))
    }

    /// Return the length of interval `i`.
    ///
    /// # Errors
    ///
    /// Returns [`AlignError::IntervalOutOfBounds`] if `i >= size()`.
    pub fn interval_length(&self, i: usize) -> Result<f64, AlignError> {
        let (lo, hi) = self.interval_bounds(i)?;
        Ok(hi - lo)
    }

    /// Return the filtered source landmarks strictly inside interval `i`.
    ///
    /// # Errors
    ///
    /// Returns [`AlignError::IntervalOutOfBounds`] if `i >= size()`.
    pub fn interior_landmarks(&self, i: usize) -> Result<Vec<Landmark>, AlignError> {
        let (s, e) = self.interval(i)?;
        Ok(self
            .source
            .filtered_landmarks()
            .iter()
            .filter(|l| l.index > s && l.index < e)
            .copied()
            .collect())
    }

    /// Return the index of the interval containing `x`.
    ///
    /// Scans the intervals left to right, accumulating their lengths. Each
    /// interval owns its left end; the last interval also owns the curve's
    /// right end. Returns `None` outside the curve (beyond the precision
    /// tolerance).
    #[must_use]
    pub fn interval_of(&self, x: f64) -> Option<usize> {
        let eps = precision::epsilon(self.length());
        if x < self.x_start() - eps || x > self.x_end() + eps {
            return None;
        }
        let positions = self.boundary_positions();
        let mut end = self.x_start();
        for i in 0..self.size() - 1 {
            end += positions[i + 1] - positions[i];
            if x < end {
                return Some(i);
            }
        }
        Some(self.size() - 1)
    }

    /// Return true if both decompositions have the same interval count and
    /// pairwise alignable boundary types.
    #[must_use]
    pub fn is_compatible(&self, other: &Self) -> bool {
        self.size() == other.size()
            && self
                .boundaries
                .iter()
                .zip(&other.boundaries)
                .all(|(a, b)| a.kind.alignable(b.kind))
    }

    /// Rescale interior x of interval `i` by `factor`, anchored at its left boundary.
    ///
    /// The boundaries do not move. Call
    /// [`geometry_changed`][Self::geometry_changed] once all warps are done.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`AlignError::IntervalOutOfBounds`] | `i >= size()` |
    /// | [`AlignError::InvalidParameter`] | `factor` is not positive and finite |
    pub fn warp_left(&mut self, i: usize, factor: f64) -> Result<(), AlignError> {
        let (s, e) = self.interval(i)?;
        check_factor(factor)?;
        let (x, _) = self.curve.geometry_mut();
        let anchor = x[s];
        for v in &mut x[s + 1..e] {
            *v = anchor + (*v - anchor) * factor;
        }
        Ok(())
    }

    /// Rescale interior x of interval `i` by `factor`, anchored at its right boundary.
    ///
    /// The boundaries do not move. Call
    /// [`geometry_changed`][Self::geometry_changed] once all warps are done.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`AlignError::IntervalOutOfBounds`] | `i >= size()` |
    /// | [`AlignError::InvalidParameter`] | `factor` is not positive and finite |
    pub fn warp_right(&mut self, i: usize, factor: f64) -> Result<(), AlignError> {
        let (s, e) = self.interval(i)?;
        check_factor(factor)?;
        let (x, _) = self.curve.geometry_mut();
        let anchor = x[e];
        for v in &mut x[s + 1..e] {
            *v = anchor - (anchor - *v) * factor;
        }
        Ok(())
    }

    /// Re-validate the working geometry after warps and drop cached slopes.
    ///
    /// # Errors
    ///
    /// Returns [`AlignError::Curve`] if a warp broke the strictly increasing x.
    pub fn geometry_changed(&mut self) -> Result<(), AlignError> {
        self.curve.geometry_changed()?;
        Ok(())
    }

    /// Set the length of interval `i`, moving every later coordinate along.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`AlignError::IntervalOutOfBounds`] | `i >= size()` |
    /// | [`AlignError::InvalidLength`] | `length` is not positive and finite |
    pub fn resize_interval(&mut self, i: usize, length: f64) -> Result<(), AlignError> {
        let (s, e) = self.interval(i)?;
        check_length(length)?;
        let (x, _) = self.curve.geometry_mut();
        let anchor = x[s];
        let old = x[e] - anchor;
        let factor = length / old;
        for v in &mut x[s + 1..e] {
            *v = anchor + (*v - anchor) * factor;
        }
        let end = anchor + length;
        let delta = end - x[e];
        x[e] = end;
        for v in &mut x[e + 1..] {
            *v += delta;
        }
        self.geometry_changed()
    }

    /// Rescale the whole curve to `length`, keeping its start in place.
    ///
    /// # Errors
    ///
    /// Returns [`AlignError::InvalidLength`] if `length` is not positive and finite.
    pub fn rescale(&mut self, length: f64) -> Result<(), AlignError> {
        check_length(length)?;
        let (x, _) = self.curve.geometry_mut();
        let anchor = x[0];
        let factor = length / (x[x.len() - 1] - anchor);
        let last = x.len() - 1;
        for v in &mut x[1..last] {
            *v = anchor + (*v - anchor) * factor;
        }
        x[last] = anchor + length;
        self.geometry_changed()
    }

    /// Translate the whole curve by `dx`.
    ///
    /// # Errors
    ///
    /// Returns [`AlignError::Curve`] if the shift produced non-finite coordinates.
    pub fn shift(&mut self, dx: f64) -> Result<(), AlignError> {
        let (x, _) = self.curve.geometry_mut();
        for v in x.iter_mut() {
            *v += dx;
        }
        self.geometry_changed()
    }

    /// Move every x through `map`, which must be strictly increasing.
    ///
    /// # Errors
    ///
    /// Returns [`AlignError::Curve`] if the mapped coordinates are not
    /// strictly increasing or not finite.
    pub fn transform(&mut self, mut map: impl FnMut(f64) -> f64) -> Result<(), AlignError> {
        let (x, _) = self.curve.geometry_mut();
        for v in x.iter_mut() {
            *v = map(*v);
        }
        self.geometry_changed()
    }

    /// Insert `landmark` as a new boundary inside interval `i`.
    ///
    /// The landmark must be one of the source curve's filtered landmarks and
    /// lie strictly inside the interval. It is moved to `rel_pos` of the
    /// interval's length; the two resulting sub-intervals are warped
    /// independently, the left one anchored at the interval start and the
    /// right one anchored at the interval end.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`AlignError::IntervalOutOfBounds`] | `i >= size()` |
    /// | [`AlignError::InvalidRelativePosition`] | `rel_pos` is not in `(0, 1)` |
    /// | [`AlignError::UnknownLandmark`] | `landmark` is not a filtered landmark of the source |
    /// | [`AlignError::NotInterior`] | `landmark` is not strictly inside interval `i` |
    /// | [`AlignError::Curve`] | the warped x is no longer strictly increasing; nothing is changed |
    pub fn decompose(
        &mut self,
        i: usize,
        landmark: Landmark,
        rel_pos: f64,
    ) -> Result<(), AlignError> {
        let (lo, hi) = self.interval_bounds(i)?;
        if !(rel_pos > 0.0 && rel_pos < 1.0) {
            return Err(AlignError::InvalidRelativePosition { value: rel_pos });
        }
        if !self.source.filtered_landmarks().contains(&landmark) {
            return Err(AlignError::UnknownLandmark {
                index: landmark.index,
                curve: self.name().to_string(),
            });
        }
        self.insert_boundary(i, landmark, lo + rel_pos * (hi - lo))
    }

    /// Overwrite this decomposition with `other`, rescaled to `length`.
    ///
    /// Reuses the existing buffers, so repeated try-and-discard steps do not
    /// allocate once the buffers are large enough.
    ///
    /// # Errors
    ///
    /// Returns [`AlignError::InvalidLength`] if a rescale is needed and
    /// `length` is not positive and finite.
    pub fn copy_from(&mut self, other: &Self, length: f64) -> Result<(), AlignError> {
        if !Arc::ptr_eq(&self.source, &other.source) {
            self.source = Arc::clone(&other.source);
        }
        self.curve.copy_from(&other.curve);
        self.boundaries.clone_from(&other.boundaries);
        if !precision::same_position(self.length(), length, length) {
            self.rescale(length)?;
        }
        Ok(())
    }

    fn insert_boundary(&mut self, i: usize, landmark: Landmark, target: f64) -> Result<(), AlignError> {
        let (s, e) = self.interval(i)?;
        let m = landmark.index;
        if m <= s || m >= e {
            return Err(AlignError::NotInterior {
                index: m,
                interval: i,
            });
        }
        let x = self.curve.x();
        let (lo, hi, old) = (x[s], x[e], x[m]);
        if !(target > lo && target < hi) {
            return Err(AlignError::InvalidRelativePosition {
                value: (target - lo) / (hi - lo),
            });
        }

        // restored if re-validation fails, so a rejected split changes nothing
        let saved = x[s..=e].to_vec();
        self.boundaries.insert(i + 1, landmark);
        let placed = self.place_boundary(i, m, target, (lo, hi, old));
        if placed.is_err() {
            self.boundaries.remove(i + 1);
            let (x, _) = self.curve.geometry_mut();
            x[s..=e].copy_from_slice(&saved);
        }
        placed
    }

    /// Warp intervals `i` and `i + 1` so that the new boundary at coordinate `m` lands on `target`.
    fn place_boundary(
        &mut self,
        i: usize,
        m: usize,
        target: f64,
        (lo, hi, old): (f64, f64, f64),
    ) -> Result<(), AlignError> {
        self.warp_left(i, (target - lo) / (old - lo))?;
        self.warp_right(i + 1, (hi - target) / (hi - old))?;
        let (x, _) = self.curve.geometry_mut();
        x[m] = target;
        self.geometry_changed()
    }
}

fn check_factor(factor: f64) -> Result<(), AlignError> {
    if factor.is_finite() && factor > 0.0 {
        Ok(())
    } else {
        Err(AlignError::InvalidParameter {
            name: "warp factor",
            value: factor,
        })
    }
}

fn check_length(length: f64) -> Result<(), AlignError> {
    if length.is_finite() && length > 0.0 {
        Ok(())
    } else {
        Err(AlignError::InvalidLength { length })
    }
}
