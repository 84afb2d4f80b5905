//! Annotation filters that thin out the landmark list of a curve.
//!
//! Filters are shared between curves behind an `Arc`. Each carries a
//! threshold in `[0, 1]` and a version counter that is bumped whenever the
//! threshold changes; curves compare the counter at read time to decide
//! whether their memoized landmark list is stale.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::curve::Curve;
use crate::error::CurveError;
use crate::landmark::Landmark;

/// A threshold-driven transformation of a curve's landmark list.
pub trait AnnotationFilter: fmt::Debug + Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Current threshold in `[0, 1]`.
    fn threshold(&self) -> f64;

    /// Change the threshold.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::InvalidThreshold`] if `value` lies outside `[0, 1]`.
    fn set_threshold(&self, value: f64) -> Result<(), CurveError>;

    /// Counter bumped on every parameter change.
    fn version(&self) -> u64;

    /// Transform `landmarks`, which belong to `curve`.
    ///
    /// Implementations only remove entries from the given list; they never
    /// re-derive landmarks from the curve's annotation.
    fn apply(&self, curve: &Curve, landmarks: Vec<Landmark>) -> Vec<Landmark>;
}

/// Return true if both handles point at the same filter instance.
#[must_use]
pub fn same_filter(a: &Arc<dyn AnnotationFilter>, b: &Arc<dyn AnnotationFilter>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Threshold storage shared by the concrete filters.
#[derive(Debug)]
struct Threshold {
    bits: AtomicU64,
    version: AtomicU64,
}

impl Threshold {
    fn new(value: f64) -> Result<Self, CurveError> {
        check_threshold(value)?;
        Ok(Self {
            bits: AtomicU64::new(value.to_bits()),
            version: AtomicU64::new(0),
        })
    }

    fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }

    fn set(&self, value: f64) -> Result<(), CurveError> {
        check_threshold(value)?;
        let old = self.bits.swap(value.to_bits(), Ordering::AcqRel);
        if old != value.to_bits() {
            self.version.fetch_add(1, Ordering::AcqRel);
        }
        Ok(())
    }

    fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }
}

fn check_threshold(value: f64) -> Result<(), CurveError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(CurveError::InvalidThreshold { value })
    }
}

/// Removes pairs of neighbouring opposite extrema with a small amplitude.
///
/// Repeatedly picks the neighbouring automatic maximum/minimum pair with the
/// smallest `|Δy|`. While that difference is at most `threshold` times the
/// curve's y-range, both extrema and every automatic inflection between them
/// are dropped.
#[derive(Debug)]
pub struct ExtremaFilter {
    threshold: Threshold,
}

impl ExtremaFilter {
    /// Create an extrema filter.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::InvalidThreshold`] if `threshold` lies outside `[0, 1]`.
    pub fn new(threshold: f64) -> Result<Self, CurveError> {
        Ok(Self {
            threshold: Threshold::new(threshold)?,
        })
    }

    /// Find the closest neighbouring opposite pair as positions in `landmarks`.
    fn weakest_pair(curve: &Curve, landmarks: &[Landmark]) -> Option<(f64, usize, usize)> {
        let y = curve.y();
        let anchors: Vec<usize> = landmarks
            .iter()
            .enumerate()
            .filter(|(_, l)| !l.category().is_inflection())
            .map(|(pos, _)| pos)
            .collect();

        let mut best: Option<(f64, usize, usize)> = None;
        for w in anchors.windows(2) {
            let (a, b) = (landmarks[w[0]], landmarks[w[1]]);
            if a.kind.is_manual() || b.kind.is_manual() {
                continue;
            }
            if !a.category().is_extremum() || !a.kind.opposite(b.kind) {
                continue;
            }
            let diff = (y[a.index] - y[b.index]).abs();
            if best.map_or(true, |(d, _, _)| diff < d) {
                best = Some((diff, w[0], w[1]));
            }
        }
        best
    }
}

impl AnnotationFilter for ExtremaFilter {
    fn name(&self) -> &'static str {
        "extrema"
    }

    fn threshold(&self) -> f64 {
        self.threshold.get()
    }

    fn set_threshold(&self, value: f64) -> Result<(), CurveError> {
        self.threshold.set(value)
    }

    fn version(&self) -> u64 {
        self.threshold.version()
    }

    fn apply(&self, curve: &Curve, mut landmarks: Vec<Landmark>) -> Vec<Landmark> {
        let limit = self.threshold() * (curve.y_max() - curve.y_min());
        while let Some((diff, first, last)) = Self::weakest_pair(curve, &landmarks) {
            if diff > limit {
                break;
            }
            let mut pos = 0;
            landmarks.retain(|l| {
                let keep = pos < first
                    || pos > last
                    || (pos != first && pos != last && l.kind.is_manual());
                pos += 1;
                keep
            });
        }
        landmarks
    }
}

/// Removes flat inflection points.
///
/// Every automatic inflection whose `|slope|` is at most `threshold` times the
/// curve's largest absolute slope is dropped.
#[derive(Debug)]
pub struct InflectionFilter {
    threshold: Threshold,
}

impl InflectionFilter {
    /// Create an inflection filter.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::InvalidThreshold`] if `threshold` lies outside `[0, 1]`.
    pub fn new(threshold: f64) -> Result<Self, CurveError> {
        Ok(Self {
            threshold: Threshold::new(threshold)?,
        })
    }
}

impl AnnotationFilter for InflectionFilter {
    fn name(&self) -> &'static str {
        "inflection"
    }

    fn threshold(&self) -> f64 {
        self.threshold.get()
    }

    fn set_threshold(&self, value: f64) -> Result<(), CurveError> {
        self.threshold.set(value)
    }

    fn version(&self) -> u64 {
        self.threshold.version()
    }

    fn apply(&self, curve: &Curve, mut landmarks: Vec<Landmark>) -> Vec<Landmark> {
        let steepest = curve.slope_max().abs().max(curve.slope_min().abs());
        let limit = self.threshold() * steepest;
        let slopes = curve.slopes();
        landmarks.retain(|l| {
            l.kind.is_manual()
                || !l.category().is_inflection()
                || slopes[l.index].abs() > limit
        });
        landmarks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::{Category, LandmarkType};

    fn lm(index: usize, category: Category) -> Landmark {
        Landmark::new(index, LandmarkType::automatic(category))
    }

    /// y = [0, 3, 1, 2, 0]: maxima at 1 and 3, minimum at 2.
    fn wiggle() -> (Curve, Vec<Landmark>) {
        let curve = Curve::new("w", vec![0.0, 3.0, 1.0, 2.0, 0.0]).unwrap();
        let landmarks = vec![
            lm(0, Category::Start),
            lm(1, Category::Maximum),
            lm(2, Category::Minimum),
            lm(3, Category::Maximum),
            lm(4, Category::End),
        ];
        (curve, landmarks)
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        assert!(matches!(
            ExtremaFilter::new(1.5),
            Err(CurveError::InvalidThreshold { .. })
        ));
        let f = InflectionFilter::new(0.5).unwrap();
        assert!(f.set_threshold(-0.1).is_err());
        assert_eq!(f.threshold(), 0.5);
    }

    #[test]
    fn version_bumps_on_change_only() {
        let f = ExtremaFilter::new(0.2).unwrap();
        assert_eq!(f.version(), 0);
        f.set_threshold(0.2).unwrap();
        assert_eq!(f.version(), 0);
        f.set_threshold(0.3).unwrap();
        assert_eq!(f.version(), 1);
    }

    #[test]
    fn extrema_threshold_zero_keeps_everything() {
        let (curve, landmarks) = wiggle();
        let f = ExtremaFilter::new(0.0).unwrap();
        assert_eq!(f.apply(&curve, landmarks.clone()), landmarks);
    }

    #[test]
    fn extrema_threshold_one_removes_small_pairs() {
        let (curve, landmarks) = wiggle();
        let f = ExtremaFilter::new(1.0).unwrap();
        let out = f.apply(&curve, landmarks);
        let indices: Vec<usize> = out.iter().map(|l| l.index).collect();
        assert_eq!(indices, vec![0, 1, 4]);
    }

    #[test]
    fn extrema_partial_threshold() {
        // range 3; pair (2,3) has |dy| = 1 <= 0.34 * 3, pair (1,2) has 2.
        let (curve, landmarks) = wiggle();
        let f = ExtremaFilter::new(0.34).unwrap();
        let out = f.apply(&curve, landmarks);
        let indices: Vec<usize> = out.iter().map(|l| l.index).collect();
        assert_eq!(indices, vec![0, 1, 4]);
    }

    #[test]
    fn extrema_removes_inflections_between_pair() {
        let curve = Curve::new("c", vec![0.0, 4.0, 3.5, 3.0, 3.5, 4.0, 0.0]).unwrap();
        let landmarks = vec![
            lm(0, Category::Start),
            lm(1, Category::Maximum),
            lm(2, Category::InflectionDescending),
            lm(3, Category::Minimum),
            lm(4, Category::InflectionAscending),
            lm(5, Category::Maximum),
            lm(6, Category::End),
        ];
        let f = ExtremaFilter::new(0.5).unwrap();
        let out = f.apply(&curve, landmarks);
        let indices: Vec<usize> = out.iter().map(|l| l.index).collect();
        // Both pairs have |dy| = 1; the first one wins the tie.
        assert_eq!(indices, vec![0, 4, 5, 6]);
    }

    #[test]
    fn extrema_keeps_manual_landmarks() {
        let curve = Curve::new("c", vec![0.0, 3.0, 1.0, 2.0, 0.0]).unwrap();
        let landmarks = vec![
            lm(0, Category::Start),
            Landmark::new(1, LandmarkType::manual(Category::Maximum)),
            lm(2, Category::Minimum),
            lm(3, Category::Maximum),
            lm(4, Category::End),
        ];
        let f = ExtremaFilter::new(1.0).unwrap();
        let out = f.apply(&curve, landmarks);
        let indices: Vec<usize> = out.iter().map(|l| l.index).collect();
        assert_eq!(indices, vec![0, 1, 4]);
    }

    #[test]
    fn inflection_filter_drops_flat_inflections() {
        // slopes: [1, 3, 1, 1] -> max |slope| = 3
        let curve = Curve::new("c", vec![0.0, 1.0, 4.0, 5.0]).unwrap();
        let landmarks = vec![
            lm(0, Category::Start),
            lm(1, Category::InflectionAscending),
            lm(2, Category::InflectionAscending),
            lm(3, Category::End),
        ];
        let f = InflectionFilter::new(0.5).unwrap();
        let out = f.apply(&curve, landmarks.clone());
        let indices: Vec<usize> = out.iter().map(|l| l.index).collect();
        assert_eq!(indices, vec![0, 1, 3]);

        let none = InflectionFilter::new(0.0).unwrap();
        assert_eq!(none.apply(&curve, landmarks).len(), 4);
    }
}
