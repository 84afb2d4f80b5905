//! PICA: greedy pairwise interval alignment.
//!
//! Both decompositions are first warped onto common interval lengths and a
//! common start. The search then walks the intervals left to right and tries
//! every alignable pair of interior landmarks, one from each curve. The best
//! candidate is committed when it strictly lowers the distance, and the same
//! interval index (now the left half of the split) is examined again.
//! Otherwise the search moves on to the next interval.

use tracing::{debug, info, instrument};

use mica_curve::Landmark;

use crate::bail_if_cancelled;
use crate::config::PicaConfig;
use crate::control::{CancelToken, Outcome};
use crate::decomposition::IntervalDecomposition;
use crate::error::AlignError;
use crate::result::PairwiseAlignment;

/// Largest relative deviation from the target length tolerated after the global warp.
const MAX_LENGTH_DRIFT: f64 = 0.01;

/// A landmark pair evaluated for one interval.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    first: Landmark,
    second: Landmark,
    rel_pos: f64,
    distance: f64,
    score: f64,
}

/// Inputs of one search that do not change between intervals.
struct Search<'a> {
    config: &'a PicaConfig,
    original_first: &'a IntervalDecomposition,
    original_second: &'a IntervalDecomposition,
    first_weight: f64,
    second_weight: f64,
    cancel: &'a CancelToken,
}

#[instrument(
    skip(first, second, config, cancel),
    fields(first_curve = first.name(), second_curve = second.name(), intervals = first.size())
)]
pub(crate) fn align(
    first: &IntervalDecomposition,
    first_weight: f64,
    second: &IntervalDecomposition,
    second_weight: f64,
    config: &PicaConfig,
    cancel: &CancelToken,
) -> Result<Outcome<PairwiseAlignment>, AlignError> {
    config.validate()?;
    check_weights(first_weight, second_weight)?;
    if !first.is_compatible(second) {
        return Err(AlignError::Incompatible {
            left: first.size(),
            right: second.size(),
        });
    }
    bail_if_cancelled!(cancel);

    let (mut a, mut b) = global_warp(first, first_weight, second, second_weight)?;
    let metric = config.distance;
    let mut distance = metric.distance(a.curve(), b.curve())?;
    let min_length = config.min_rel_interval_length * a.length();
    debug!(distance, "global warp complete");

    let search = Search {
        config,
        original_first: first,
        original_second: second,
        first_weight,
        second_weight,
        cancel,
    };
    let mut scratch = (a.clone(), b.clone());
    let mut splits = 0;
    let mut i = 0;
    while i < a.size() {
        bail_if_cancelled!(cancel);
        if a.interval_length(i)? <= min_length {
            i += 1;
            continue;
        }
        let best = match search.interval(&a, &b, i, distance, &mut scratch)? {
            Outcome::Completed(best) => best,
            Outcome::Cancelled => return Ok(Outcome::Cancelled),
        };
        match best {
            Some(c) if c.score < distance => {
                a.decompose(i, c.first, c.rel_pos)?;
                b.decompose(i, c.second, c.rel_pos)?;
                distance = c.distance;
                splits += 1;
                debug!(
                    interval = i,
                    first = c.first.index,
                    second = c.second.index,
                    rel_pos = c.rel_pos,
                    distance,
                    "split committed"
                );
            }
            _ => i += 1,
        }
    }

    info!(distance, splits, intervals = a.size(), "pairwise alignment complete");
    Ok(Outcome::Completed(PairwiseAlignment {
        first: a,
        second: b,
        distance,
        splits,
    }))
}

impl Search<'_> {
    /// Evaluate every alignable landmark pair inside interval `i` and return
    /// the one with the lowest score.
    fn interval(
        &self,
        a: &IntervalDecomposition,
        b: &IntervalDecomposition,
        i: usize,
        current: f64,
        scratch: &mut (IntervalDecomposition, IntervalDecomposition),
    ) -> Result<Outcome<Option<Candidate>>, AlignError> {
        let first_landmarks = a.interior_landmarks(i)?;
        let second_landmarks = b.interior_landmarks(i)?;
        if first_landmarks.is_empty() || second_landmarks.is_empty() {
            return Ok(Outcome::Completed(None));
        }

        let metric = self.config.distance;
        let n = metric.samples();
        let range = metric.sample_range(a, i)?;
        let untouched = metric.unfinalize(current, n)
            - metric.partial_sum(a.curve(), b.curve(), range.clone())?;
        let (a_lo, a_hi) = a.interval_bounds(i)?;
        let (b_lo, b_hi) = b.interval_bounds(i)?;
        let total_weight = self.first_weight + self.second_weight;

        let mut best: Option<Candidate> = None;
        for &p in &first_landmarks {
            for &q in &second_landmarks {
                bail_if_cancelled!(self.cancel);
                if !p.kind.alignable(q.kind) {
                    continue;
                }
                let rel_a = (a.curve().x()[p.index] - a_lo) / (a_hi - a_lo);
                let rel_b = (b.curve().x()[q.index] - b_lo) / (b_hi - b_lo);
                let rel_pos = (self.first_weight * rel_a + self.second_weight * rel_b) / total_weight;

                let target_a = a_lo + rel_pos * (a_hi - a_lo);
                let target_b = b_lo + rel_pos * (b_hi - b_lo);
                if relative_shift(self.original_first, a, p.index, target_a) > self.config.max_rel_x_shift
                    || relative_shift(self.original_second, b, q.index, target_b)
                        > self.config.max_rel_x_shift
                {
                    continue;
                }
                let warp = distortion(a, i, p.index, target_a)?.max(distortion(b, i, q.index, target_b)?);
                if warp > self.config.max_distortion_ratio {
                    continue;
                }

                let (sa, sb) = &mut *scratch;
                sa.copy_from(a, a.length())?;
                sb.copy_from(b, b.length())?;
                sa.decompose(i, p, rel_pos)?;
                sb.decompose(i, q, rel_pos)?;
                let sum = untouched + metric.partial_sum(sa.curve(), sb.curve(), range.clone())?;
                let distance = metric.finalize(sum.max(0.0), n);
                let score = distance * (self.config.warp_penalty * warp).max(1.0);

                if best.map_or(true, |c| score < c.score) {
                    best = Some(Candidate {
                        first: p,
                        second: q,
                        rel_pos,
                        distance,
                        score,
                    });
                }
            }
        }
        Ok(Outcome::Completed(best))
    }
}

/// Copy both inputs and give each interval the weighted mean of the two
/// input lengths, then move both onto the weighted mean start.
fn global_warp(
    first: &IntervalDecomposition,
    first_weight: f64,
    second: &IntervalDecomposition,
    second_weight: f64,
) -> Result<(IntervalDecomposition, IntervalDecomposition), AlignError> {
    let total_weight = first_weight + second_weight;
    let mut a = first.clone();
    let mut b = second.clone();
    let mut target_length = 0.0;
    for i in 0..a.size() {
        let target = (first_weight * first.interval_length(i)?
            + second_weight * second.interval_length(i)?)
            / total_weight;
        a.resize_interval(i, target)?;
        b.resize_interval(i, target)?;
        target_length += target;
    }

    let start = (first_weight * first.x_start() + second_weight * second.x_start()) / total_weight;
    a.shift(start - a.x_start())?;
    b.shift(start - b.x_start())?;

    for d in [&a, &b] {
        if (d.length() - target_length).abs() > MAX_LENGTH_DRIFT * target_length {
            return Err(AlignError::LengthDrift {
                curve: d.name().to_string(),
                expected: target_length,
                actual: d.length(),
            });
        }
    }
    Ok((a, b))
}

fn check_weights(first: f64, second: f64) -> Result<(), AlignError> {
    let valid = |w: f64| w.is_finite() && w >= 0.0;
    if valid(first) && valid(second) && first + second > 0.0 {
        Ok(())
    } else {
        Err(AlignError::InvalidWeights { first, second })
    }
}

/// Distance between the landmark's relative position in the unaligned input
/// and its relative position once moved to `target`.
fn relative_shift(
    original: &IntervalDecomposition,
    current: &IntervalDecomposition,
    index: usize,
    target: f64,
) -> f64 {
    let before = (original.curve().x()[index] - original.x_start()) / original.length();
    let after = (target - current.x_start()) / current.length();
    (after - before).abs()
}

/// Largest stretch or compression applied to either sub-interval when the
/// landmark at `index` moves to `target`.
fn distortion(
    d: &IntervalDecomposition,
    i: usize,
    index: usize,
    target: f64,
) -> Result<f64, AlignError> {
    let (lo, hi) = d.interval_bounds(i)?;
    let x = d.curve().x()[index];
    let ratio = |f: f64| f.max(1.0 / f);
    Ok(ratio((target - lo) / (x - lo)).max(ratio((hi - target) / (hi - x))))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mica_curve::AnnotatedCurve;

    use super::*;
    use crate::distance::Distance;

    fn decomposition(name: &str, x: Vec<f64>, y: Vec<f64>) -> IntervalDecomposition {
        IntervalDecomposition::new(Arc::new(AnnotatedCurve::with_x(name, x, y).unwrap()))
    }

    fn config(samples: usize) -> PicaConfig {
        PicaConfig::new(Distance::mean_absolute(samples).unwrap())
    }

    #[test]
    fn peaks_of_different_height() {
        let a = decomposition("y1", vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 0.0]);
        let b = decomposition("y2", vec![0.0, 1.0, 2.0], vec![0.0, 2.0, 0.0]);
        let result = config(3)
            .align(&a, 1.0, &b, 1.0, &CancelToken::new())
            .unwrap()
            .completed()
            .unwrap();
        assert!((result.distance() - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(result.splits(), 0);
        assert_eq!(result.first().size(), 1);
    }

    #[test]
    fn identical_curves_need_no_split() {
        let x: Vec<f64> = (0..9).map(f64::from).collect();
        let y = vec![0.0, 1.0, 3.0, 1.0, 0.0, 1.0, 2.0, 1.0, 0.0];
        let a = decomposition("a", x.clone(), y.clone());
        let b = decomposition("b", x, y);
        let result = config(50)
            .align(&a, 1.0, &b, 1.0, &CancelToken::new())
            .unwrap()
            .completed()
            .unwrap();
        assert!(result.distance().abs() < 1e-12);
        assert_eq!(result.splits(), 0);
    }

    #[test]
    fn shifted_peak_is_split_and_matched() {
        let x: Vec<f64> = (0..11).map(f64::from).collect();
        let a = decomposition(
            "a",
            x.clone(),
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 3.0, 2.0, 1.0, 0.0, 0.0, 0.0],
        );
        let b = decomposition(
            "b",
            x,
            vec![0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 4.0, 3.0, 2.0, 1.0, 0.0],
        );
        let cfg = config(101).with_max_rel_x_shift(0.5);
        let before = cfg.distance().distance(a.curve(), b.curve()).unwrap();
        let result = cfg
            .align(&a, 1.0, &b, 1.0, &CancelToken::new())
            .unwrap()
            .completed()
            .unwrap();
        assert!(result.splits() >= 1);
        assert!(result.distance() < before);
        assert!(result.first().is_compatible(result.second()));
        let pa = result.first().boundary_positions();
        let pb = result.second().boundary_positions();
        for (u, v) in pa.iter().zip(&pb) {
            assert!((u - v).abs() < 1e-9);
        }
    }

    #[test]
    fn shift_limit_blocks_far_landmarks() {
        let x: Vec<f64> = (0..11).map(f64::from).collect();
        let a = decomposition(
            "a",
            x.clone(),
            vec![0.0, 4.0, 3.0, 2.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        );
        let b = decomposition(
            "b",
            x,
            vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 4.0, 0.0],
        );
        let result = config(101)
            .with_max_rel_x_shift(0.1)
            .align(&a, 1.0, &b, 1.0, &CancelToken::new())
            .unwrap()
            .completed()
            .unwrap();
        assert_eq!(result.splits(), 0);
    }

    #[test]
    fn distortion_limit_blocks_stretching_splits() {
        let x: Vec<f64> = (0..11).map(f64::from).collect();
        let a = decomposition(
            "a",
            x.clone(),
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 3.0, 2.0, 1.0, 0.0, 0.0, 0.0],
        );
        let b = decomposition(
            "b",
            x,
            vec![0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 4.0, 3.0, 2.0, 1.0, 0.0],
        );
        let cfg = config(101).with_max_rel_x_shift(0.5);
        let cancel = CancelToken::new();

        // matching the peaks moves each by one unit, a stretch of at least 1.2
        let tight = cfg
            .clone()
            .with_max_distortion_ratio(1.1)
            .align(&a, 1.0, &b, 1.0, &cancel)
            .unwrap()
            .completed()
            .unwrap();
        assert_eq!(tight.splits(), 0);
        assert_eq!(tight.first().size(), 1);

        let loose = cfg.align(&a, 1.0, &b, 1.0, &cancel).unwrap().completed().unwrap();
        assert!(loose.splits() >= 1);
        assert!(loose.distance() < tight.distance());
    }

    #[test]
    fn global_warp_uses_weights() {
        let a = decomposition("a", vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 0.0]);
        let b = decomposition("b", vec![10.0, 13.0, 16.0], vec![0.0, 1.0, 0.0]);
        let result = config(5)
            .align(&a, 0.0, &b, 1.0, &CancelToken::new())
            .unwrap()
            .completed()
            .unwrap();
        assert!((result.first().length() - 6.0).abs() < 1e-12);
        assert!((result.first().x_start() - 10.0).abs() < 1e-12);
        assert_eq!(result.second().curve().x(), b.curve().x());
    }

    #[test]
    fn rejects_invalid_input() {
        let a = decomposition("a", vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 0.0]);
        let b = decomposition("b", vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 0.0]);
        let cancel = CancelToken::new();
        assert!(matches!(
            config(5).align(&a, 0.0, &b, 0.0, &cancel),
            Err(AlignError::InvalidWeights { .. })
        ));
        assert!(matches!(
            config(5).align(&a, -1.0, &b, 1.0, &cancel),
            Err(AlignError::InvalidWeights { .. })
        ));

        let mut split = AnnotatedCurve::with_x("s", vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 0.0]).unwrap();
        split.set_manual(1, mica_curve::Category::Split).unwrap();
        let c = IntervalDecomposition::new(Arc::new(split));
        assert!(matches!(
            config(5).align(&a, 1.0, &c, 1.0, &cancel),
            Err(AlignError::Incompatible { left: 1, right: 2 })
        ));
    }

    #[test]
    fn cancelled_before_start() {
        let a = decomposition("a", vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 0.0]);
        let cancel = CancelToken::new();
        cancel.cancel();
        let outcome = config(5).align(&a, 1.0, &a, 1.0, &cancel).unwrap();
        assert!(outcome.is_cancelled());
    }

    #[test]
    fn penalty_scales_score() {
        let x: Vec<f64> = (0..11).map(f64::from).collect();
        let a = decomposition(
            "a",
            x.clone(),
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 3.0, 2.0, 1.0, 0.0, 0.0, 0.0],
        );
        let b = decomposition(
            "b",
            x,
            vec![0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 4.0, 3.0, 2.0, 1.0, 0.0],
        );
        let result = config(101)
            .with_max_rel_x_shift(0.5)
            .with_warp_penalty(1000.0)
            .align(&a, 1.0, &b, 1.0, &CancelToken::new())
            .unwrap()
            .completed()
            .unwrap();
        assert_eq!(result.splits(), 0);
    }
}
