//! Landmark taxonomy: category, provenance and the comparison rules over them.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

/// Structural role of a coordinate.
///
/// Declaration order is the category rank used by [`LandmarkType`]'s ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Plain coordinate without structural meaning.
    Point,
    /// Local minimum of the slope that is not an inflection.
    SlopeMinimum,
    /// Local maximum of the slope that is not an inflection.
    SlopeMaximum,
    /// Steepest point of a descending flank.
    InflectionDescending,
    /// Steepest point of an ascending flank.
    InflectionAscending,
    /// Local minimum of y.
    Minimum,
    /// Local maximum of y.
    Maximum,
    /// First coordinate of a curve.
    Start,
    /// Last coordinate of a curve.
    End,
    /// Explicit interval boundary.
    Split,
}

impl Category {
    /// Return true for start, end and split, the categories that delimit intervals.
    #[must_use]
    pub fn is_boundary(self) -> bool {
        matches!(self, Self::Start | Self::End | Self::Split)
    }

    /// Return true for the two inflection categories.
    #[must_use]
    pub fn is_inflection(self) -> bool {
        matches!(self, Self::InflectionAscending | Self::InflectionDescending)
    }

    /// Return true for y-extrema.
    #[must_use]
    pub fn is_extremum(self) -> bool {
        matches!(self, Self::Minimum | Self::Maximum)
    }

    /// Return true for slope-extrema.
    #[must_use]
    pub fn is_slope_extremum(self) -> bool {
        matches!(self, Self::SlopeMinimum | Self::SlopeMaximum)
    }
}

/// Whether a landmark was derived automatically or placed by a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Derived by automatic classification; may be recomputed.
    Automatic,
    /// Placed explicitly; never altered by automatic classification.
    Manual,
}

/// A landmark category together with its provenance.
///
/// Ordering: every manual type ranks above every automatic type. Among manual
/// types the higher category wins; among automatic types the order is
/// reversed so the rarer category wins. [`Category::Point`] is always
/// automatic and therefore the greatest automatic type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LandmarkType {
    category: Category,
    provenance: Provenance,
}

impl LandmarkType {
    /// The default type of an unclassified coordinate.
    pub const POINT: Self = Self {
        category: Category::Point,
        provenance: Provenance::Automatic,
    };

    /// Create a type with explicit provenance. A point is always automatic.
    #[must_use]
    pub fn new(category: Category, provenance: Provenance) -> Self {
        let provenance = if category == Category::Point {
            Provenance::Automatic
        } else {
            provenance
        };
        Self {
            category,
            provenance,
        }
    }

    /// Create an automatically derived type.
    #[must_use]
    pub fn automatic(category: Category) -> Self {
        Self::new(category, Provenance::Automatic)
    }

    /// Create a manually placed type.
    #[must_use]
    pub fn manual(category: Category) -> Self {
        Self::new(category, Provenance::Manual)
    }

    /// Return the category.
    #[must_use]
    pub fn category(self) -> Category {
        self.category
    }

    /// Return the provenance.
    #[must_use]
    pub fn provenance(self) -> Provenance {
        self.provenance
    }

    /// Return true for manually placed types.
    #[must_use]
    pub fn is_manual(self) -> bool {
        self.provenance == Provenance::Manual
    }

    /// Return true if this is the default point type.
    #[must_use]
    pub fn is_point(self) -> bool {
        self.category == Category::Point
    }

    /// Two types are alignable when they share a category, whatever their provenance.
    #[must_use]
    pub fn alignable(self, other: Self) -> bool {
        self.category == other.category
    }

    /// True only for maximum/minimum and slope-maximum/slope-minimum pairs.
    #[must_use]
    pub fn opposite(self, other: Self) -> bool {
        use Category::{Maximum, Minimum, SlopeMaximum, SlopeMinimum};
        matches!(
            (self.category, other.category),
            (Maximum, Minimum) | (Minimum, Maximum) | (SlopeMaximum, SlopeMinimum) | (SlopeMinimum, SlopeMaximum)
        )
    }
}

impl Default for LandmarkType {
    fn default() -> Self {
        Self::POINT
    }
}

impl Ord for LandmarkType {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.provenance, other.provenance) {
            (Provenance::Manual, Provenance::Manual) => self.category.cmp(&other.category),
            (Provenance::Automatic, Provenance::Automatic) => other.category.cmp(&self.category),
            (Provenance::Manual, Provenance::Automatic) => Ordering::Greater,
            (Provenance::Automatic, Provenance::Manual) => Ordering::Less,
        }
    }
}

impl PartialOrd for LandmarkType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for LandmarkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.provenance {
            Provenance::Automatic => "",
            Provenance::Manual => "*",
        };
        write!(f, "{:?}{tag}", self.category)
    }
}

/// A classified coordinate: the index into a curve and its landmark type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Landmark {
    /// Coordinate index.
    pub index: usize,
    /// Landmark type at that coordinate.
    pub kind: LandmarkType,
}

impl Landmark {
    /// Create a landmark.
    #[must_use]
    pub fn new(index: usize, kind: LandmarkType) -> Self {
        Self { index, kind }
    }

    /// Return the landmark category.
    #[must_use]
    pub fn category(&self) -> Category {
        self.kind.category()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Category; 10] = [
        Category::Point,
        Category::SlopeMinimum,
        Category::SlopeMaximum,
        Category::InflectionDescending,
        Category::InflectionAscending,
        Category::Minimum,
        Category::Maximum,
        Category::Start,
        Category::End,
        Category::Split,
    ];

    fn all_types() -> Vec<LandmarkType> {
        ALL.iter()
            .flat_map(|&c| [LandmarkType::automatic(c), LandmarkType::manual(c)])
            .collect()
    }

    #[test]
    fn alignable_is_reflexive_and_symmetric() {
        let types = all_types();
        for &a in &types {
            assert!(a.alignable(a));
            for &b in &types {
                assert_eq!(a.alignable(b), b.alignable(a));
            }
        }
    }

    #[test]
    fn alignable_across_provenance() {
        let auto = LandmarkType::automatic(Category::Maximum);
        let manual = LandmarkType::manual(Category::Maximum);
        assert!(auto.alignable(manual));
        assert!(!auto.alignable(LandmarkType::automatic(Category::Minimum)));
    }

    #[test]
    fn opposite_pairs_only() {
        let max = LandmarkType::automatic(Category::Maximum);
        let min = LandmarkType::manual(Category::Minimum);
        let smax = LandmarkType::automatic(Category::SlopeMaximum);
        let smin = LandmarkType::automatic(Category::SlopeMinimum);
        assert!(max.opposite(min));
        assert!(min.opposite(max));
        assert!(smax.opposite(smin));
        assert!(!max.opposite(smin));
        assert!(!max.opposite(max));
    }

    #[test]
    fn manual_outranks_automatic() {
        let manual_point_like = LandmarkType::manual(Category::SlopeMinimum);
        let auto_split = LandmarkType::automatic(Category::Split);
        assert!(manual_point_like > auto_split);
        assert!(manual_point_like > LandmarkType::POINT);
    }

    #[test]
    fn automatic_order_is_reversed() {
        let split = LandmarkType::automatic(Category::Split);
        let max = LandmarkType::automatic(Category::Maximum);
        assert!(split < max);
        assert!(max < LandmarkType::POINT);
        let m_split = LandmarkType::manual(Category::Split);
        let m_max = LandmarkType::manual(Category::Maximum);
        assert!(m_split > m_max);
    }

    #[test]
    fn point_is_never_manual() {
        assert_eq!(LandmarkType::manual(Category::Point), LandmarkType::POINT);
    }

    #[test]
    fn display_marks_manual() {
        assert_eq!(LandmarkType::manual(Category::Split).to_string(), "Split*");
        assert_eq!(LandmarkType::automatic(Category::Maximum).to_string(), "Maximum");
    }
}
