//! Consensus curves of mutually compatible decompositions.
//!
//! The consensus lives on the union of the members' x-grids (each member
//! shifted to start at 0), takes the mean of the members' interpolants at
//! every grid position, and starts at the members' mean start. Its interval
//! boundaries are copied from the first member; every other landmark is
//! derived afresh from the averaged shape.

use std::sync::Arc;

use tracing::{debug, instrument};

use mica_curve::{precision, same_filter, AnnotatedCurve, Curve};
use mica_pica::{AlignError, IntervalDecomposition};

use crate::error::MicaError;

/// Synthesize the consensus of `members`.
///
/// A single member is returned unchanged. Only annotation filters shared by
/// every member are attached to the consensus curve.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`MicaError::EmptyInput`] | `members` is empty |
/// | [`MicaError::Incompatible`] | a member does not match the first member's intervals |
/// | [`MicaError::Align`] | a boundary of the first member has no grid point within tolerance |
#[instrument(skip(members), fields(members = members.len()))]
pub fn consensus(members: &[IntervalDecomposition]) -> Result<IntervalDecomposition, MicaError> {
    let (first, rest) = members.split_first().ok_or(MicaError::EmptyInput)?;
    check_compatible(first, members)?;
    if rest.is_empty() {
        return Ok(first.clone());
    }

    let grid = union_grid(members);
    let start = members.iter().map(IntervalDecomposition::x_start).sum::<f64>() / members.len() as f64;
    let mut y = Vec::with_capacity(grid.len());
    for &g in &grid {
        let mut sum = 0.0;
        for m in members {
            sum += m.curve().value((m.x_start() + g).min(m.x_end()))?;
        }
        y.push(sum / members.len() as f64);
    }
    let x: Vec<f64> = grid.iter().map(|g| g + start).collect();
    let curve = Curve::with_x("consensus", x, y)?;

    let eps = precision::epsilon(curve.length());
    let mut interior = Vec::with_capacity(first.size() - 1);
    let mut manual = Vec::with_capacity(first.size() - 1);
    for b in &first.boundaries()[1..first.size()] {
        let target = first.curve().x()[b.index] - first.x_start() + start;
        let index = curve.closest_point(target);
        if (curve.x()[index] - target).abs() > eps {
            return Err(AlignError::PositionNotFound {
                curve: first.name().to_string(),
                x: target,
            }
            .into());
        }
        interior.push(index);
        manual.push((index, b.category()));
    }

    let mut annotated = AnnotatedCurve::with_manual_landmarks(curve, manual)?;
    for filter in first.source().filters() {
        let shared = rest
            .iter()
            .all(|m| m.source().filters().iter().any(|f| same_filter(f, filter)));
        if shared {
            annotated.add_filter(Arc::clone(filter));
        }
    }

    let result = IntervalDecomposition::with_boundaries(Arc::new(annotated), &interior)?;
    check_compatible(&result, members)?;
    debug!(
        points = result.curve().len(),
        intervals = result.size(),
        "consensus built"
    );
    Ok(result)
}

fn check_compatible(
    target: &IntervalDecomposition,
    members: &[IntervalDecomposition],
) -> Result<(), MicaError> {
    match members.iter().position(|m| !target.is_compatible(m)) {
        Some(index) => Err(MicaError::Incompatible { index }),
        None => Ok(()),
    }
}

/// Merge the members' x-positions, each relative to its own start.
///
/// The first member's positions are kept as they are; a position from any
/// other member is added only if no grid position lies within tolerance.
fn union_grid(members: &[IntervalDecomposition]) -> Vec<f64> {
    let first = &members[0];
    let mut grid: Vec<f64> = first.curve().x().iter().map(|x| x - first.x_start()).collect();
    let eps = precision::epsilon(first.length());
    for m in &members[1..] {
        for x in m.curve().x() {
            let g = x - m.x_start();
            let pos = grid.partition_point(|&v| v < g);
            let near_right = pos < grid.len() && grid[pos] - g <= eps;
            let near_left = pos > 0 && g - grid[pos - 1] <= eps;
            if !near_left && !near_right {
                grid.insert(pos, g);
            }
        }
    }
    grid
}
