//! Domain types for mica-io.

use mica_curve::Curve;

use crate::IoError;

/// A validated run name for output file naming.
///
/// Must match `[a-zA-Z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunName(String);

impl RunName {
    /// Parse and validate a run name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidRunName`] if the name is empty or contains
    /// characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: String) -> Result<Self, IoError> {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(IoError::InvalidRunName { name });
        }
        Ok(Self(name))
    }

    /// Return the run name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RunName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Curves read from one CSV file, in row order.
///
/// Each curve carries its row's name and is sampled at `x = 0, 1, ..., n-1`.
#[derive(Debug)]
pub struct Dataset {
    /// Validated curves in the same order as the CSV rows.
    pub curves: Vec<Curve>,
}

impl Dataset {
    /// Return the curve names in row order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.curves.iter().map(Curve::name).collect()
    }

    /// Return the number of curves.
    #[must_use]
    pub fn len(&self) -> usize {
        self.curves.len()
    }

    /// Return true if the dataset holds no curves.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }
}
