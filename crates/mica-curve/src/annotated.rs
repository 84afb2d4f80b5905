//! Curves annotated with one landmark type per coordinate.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::curve::Curve;
use crate::error::CurveError;
use crate::filter::{same_filter, AnnotationFilter};
use crate::landmark::{Category, Landmark, LandmarkType};

/// Snapshot of everything the filtered landmark list depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Stamp {
    edits: u64,
    filter_versions: Vec<u64>,
}

#[derive(Debug)]
struct Memo {
    stamp: Stamp,
    landmarks: Arc<[Landmark]>,
}

/// A [`Curve`] with a landmark type for every coordinate.
///
/// The first coordinate is always [`Category::Start`] and the last
/// [`Category::End`]. Automatic landmarks are derived on construction and on
/// every edit; manual landmarks are never altered by that derivation.
///
/// The list of filtered landmarks is memoized. It is rebuilt lazily when an
/// edit, a filter registration or a filter parameter change has bumped one of
/// the version counters it was built from.
pub struct AnnotatedCurve {
    curve: Curve,
    annotation: Vec<LandmarkType>,
    filters: Vec<Arc<dyn AnnotationFilter>>,
    edits: u64,
    memo: Mutex<Option<Memo>>,
}

impl AnnotatedCurve {
    /// Annotate a curve sampled at `x = 0, 1, ..., n-1`.
    ///
    /// # Errors
    ///
    /// Forwards the validation errors of [`Curve::new`].
    pub fn new(name: impl Into<String>, y: Vec<f64>) -> Result<Self, CurveError> {
        Ok(Self::from_curve(Curve::new(name, y)?))
    }

    /// Annotate a curve from paired coordinates.
    ///
    /// # Errors
    ///
    /// Forwards the validation errors of [`Curve::with_x`].
    pub fn with_x(name: impl Into<String>, x: Vec<f64>, y: Vec<f64>) -> Result<Self, CurveError> {
        Ok(Self::from_curve(Curve::with_x(name, x, y)?))
    }

    /// Annotate an existing curve.
    #[must_use]
    pub fn from_curve(curve: Curve) -> Self {
        let mut annotated = Self {
            annotation: vec![LandmarkType::POINT; curve.len()],
            curve,
            filters: Vec::new(),
            edits: 0,
            memo: Mutex::new(None),
        };
        annotated.annotate();
        annotated
    }

    /// Annotate a curve after placing the given manual landmarks.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`CurveError::IndexOutOfBounds`] | an index is past the end |
    /// | [`CurveError::ReservedLandmark`] | an index is an endpoint or the category is start/end |
    pub fn with_manual_landmarks(
        curve: Curve,
        manual: impl IntoIterator<Item = (usize, Category)>,
    ) -> Result<Self, CurveError> {
        let mut annotation = vec![LandmarkType::POINT; curve.len()];
        for (index, category) in manual {
            check_editable(index, category, curve.len())?;
            annotation[index] = LandmarkType::manual(category);
        }
        let mut annotated = Self {
            annotation,
            curve,
            filters: Vec::new(),
            edits: 0,
            memo: Mutex::new(None),
        };
        annotated.annotate();
        Ok(annotated)
    }

    /// Return the underlying curve.
    #[must_use]
    pub fn curve(&self) -> &Curve {
        &self.curve
    }

    /// Return the curve name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.curve.name()
    }

    /// Return the number of coordinates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.curve.len()
    }

    /// Always `false`: a valid curve has at least two coordinates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.curve.is_empty()
    }

    /// Return the landmark type of every coordinate.
    #[must_use]
    pub fn annotation(&self) -> &[LandmarkType] {
        &self.annotation
    }

    /// Return every coordinate that is not a plain point, before filtering.
    #[must_use]
    pub fn landmarks(&self) -> Vec<Landmark> {
        self.annotation
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.is_point())
            .map(|(i, &t)| Landmark::new(i, t))
            .collect()
    }

    /// Return the landmarks that survive every registered filter, in index order.
    ///
    /// The list is memoized and rebuilt only when the curve or one of its
    /// filters changed since it was last computed.
    #[must_use]
    pub fn filtered_landmarks(&self) -> Arc<[Landmark]> {
        let stamp = self.stamp();
        let mut memo = self.memo.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(m) = memo.as_ref() {
            if m.stamp == stamp {
                return Arc::clone(&m.landmarks);
            }
        }
        let mut landmarks = self.landmarks();
        for filter in &self.filters {
            landmarks = filter.apply(&self.curve, landmarks);
        }
        debug!(
            curve = self.name(),
            n_landmarks = landmarks.len(),
            n_filters = self.filters.len(),
            "filtered landmarks rebuilt"
        );
        let landmarks: Arc<[Landmark]> = landmarks.into();
        *memo = Some(Memo {
            stamp,
            landmarks: Arc::clone(&landmarks),
        });
        landmarks
    }

    /// Return the registered filters in application order.
    #[must_use]
    pub fn filters(&self) -> &[Arc<dyn AnnotationFilter>] {
        &self.filters
    }

    /// Append a filter. Registering the same instance twice is a no-op.
    pub fn add_filter(&mut self, filter: Arc<dyn AnnotationFilter>) {
        if self.filters.iter().any(|f| same_filter(f, &filter)) {
            return;
        }
        self.filters.push(filter);
        self.edits += 1;
    }

    /// Remove a filter instance. Returns true if it was registered.
    pub fn remove_filter(&mut self, filter: &Arc<dyn AnnotationFilter>) -> bool {
        let before = self.filters.len();
        self.filters.retain(|f| !same_filter(f, filter));
        let removed = self.filters.len() != before;
        if removed {
            self.edits += 1;
        }
        removed
    }

    /// Place a manual landmark and re-derive the automatic ones.
    ///
    /// Assigning [`Category::Point`] clears a manual landmark.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`CurveError::IndexOutOfBounds`] | `index` is past the end |
    /// | [`CurveError::ReservedLandmark`] | `index` is an endpoint or `category` is start/end |
    pub fn set_manual(&mut self, index: usize, category: Category) -> Result<(), CurveError> {
        check_editable(index, category, self.len())?;
        self.annotation[index] = LandmarkType::manual(category);
        self.reannotate();
        Ok(())
    }

    /// Remove a manual landmark, if any, and re-derive the automatic ones.
    ///
    /// # Errors
    ///
    /// Same conditions as [`set_manual`][Self::set_manual].
    pub fn clear_manual(&mut self, index: usize) -> Result<(), CurveError> {
        self.set_manual(index, Category::Point)
    }

    /// Recompute all automatic landmarks, keeping manual ones.
    pub fn reannotate(&mut self) {
        self.annotate();
        self.edits += 1;
    }

    fn stamp(&self) -> Stamp {
        Stamp {
            edits: self.edits,
            filter_versions: self.filters.iter().map(|f| f.version()).collect(),
        }
    }

    fn annotate(&mut self) {
        let n = self.annotation.len();
        for t in &mut self.annotation {
            if !t.is_manual() {
                *t = LandmarkType::POINT;
            }
        }
        self.annotation[0] = LandmarkType::automatic(Category::Start);
        self.annotation[n - 1] = LandmarkType::automatic(Category::End);

        mark_extrema(
            &mut self.annotation,
            self.curve.y(),
            Category::Maximum,
            Category::Minimum,
        );
        mark_extrema(
            &mut self.annotation,
            self.curve.slopes(),
            Category::SlopeMaximum,
            Category::SlopeMinimum,
        );
        relabel_inflections(&mut self.annotation, self.curve.slopes());
    }
}

fn check_editable(index: usize, category: Category, len: usize) -> Result<(), CurveError> {
    if index >= len {
        return Err(CurveError::IndexOutOfBounds { index, len });
    }
    if index == 0 || index == len - 1 || matches!(category, Category::Start | Category::End) {
        return Err(CurveError::ReservedLandmark { index });
    }
    Ok(())
}

/// Mark local extrema of `values`, scanning from the back.
///
/// A flat run counts as one extremum when the values on both sides of it are
/// strictly lower (maximum) or strictly higher (minimum). The landmark goes to
/// the middle of the run, rounded toward the earlier index. Coordinates that
/// already carry a landmark are left alone.
fn mark_extrema(annotation: &mut [LandmarkType], values: &[f64], max: Category, min: Category) {
    let n = values.len();
    if n < 3 {
        return;
    }
    let mut i = n - 2;
    while i >= 1 {
        let v = values[i];
        let mut lo = i;
        while lo > 0 && values[lo - 1] == v {
            lo -= 1;
        }
        let mut hi = i;
        while hi + 1 < n && values[hi + 1] == v {
            hi += 1;
        }
        if lo >= 1 && hi + 1 < n {
            let (left, right) = (values[lo - 1], values[hi + 1]);
            let category = if left < v && right < v {
                Some(max)
            } else if left > v && right > v {
                Some(min)
            } else {
                None
            };
            if let Some(category) = category {
                let mid = (lo + hi) / 2;
                if annotation[mid].is_point() {
                    annotation[mid] = LandmarkType::automatic(category);
                }
            }
        }
        if lo < 2 {
            break;
        }
        i = lo - 1;
    }
}

/// Turn slope extrema into inflections where the slope sign agrees, demote the rest.
fn relabel_inflections(annotation: &mut [LandmarkType], slopes: &[f64]) {
    for (t, &slope) in annotation.iter_mut().zip(slopes) {
        if t.is_manual() {
            continue;
        }
        *t = match t.category() {
            Category::SlopeMaximum if slope > 0.0 => {
                LandmarkType::automatic(Category::InflectionAscending)
            }
            Category::SlopeMinimum if slope < 0.0 => {
                LandmarkType::automatic(Category::InflectionDescending)
            }
            Category::SlopeMaximum | Category::SlopeMinimum => LandmarkType::POINT,
            _ => *t,
        };
    }
}

impl Clone for AnnotatedCurve {
    fn clone(&self) -> Self {
        Self {
            curve: self.curve.clone(),
            annotation: self.annotation.clone(),
            filters: self.filters.clone(),
            edits: self.edits,
            memo: Mutex::new(None),
        }
    }
}

impl fmt::Debug for AnnotatedCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotatedCurve")
            .field("name", &self.name())
            .field("len", &self.len())
            .field("landmarks", &self.landmarks())
            .field("filters", &self.filters)
            .finish()
    }
}
