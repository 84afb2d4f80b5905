//! Accuracy regression tests for mica-progressive.
//!
//! These tests run full progressive alignments on small synthetic sets and
//! check the structural guarantees of the result: member order, consensus
//! compatibility, shared boundary positions and reference pinning.

use std::sync::Arc;

use mica_curve::{AnnotatedCurve, Category};
use mica_pica::{CancelToken, Distance, IntervalDecomposition, PicaConfig};
use mica_progressive::{consensus, AlignmentNode, MicaConfig, MicaError};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn wave(name: &str, n: usize, phase: f64, x_scale: f64) -> Arc<AnnotatedCurve> {
    let x: Vec<f64> = (0..n).map(|i| i as f64 * x_scale).collect();
    let y: Vec<f64> = (0..n).map(|i| (i as f64 * 0.2 + phase).sin()).collect();
    Arc::new(AnnotatedCurve::with_x(name, x, y).expect("valid wave"))
}

fn config() -> MicaConfig {
    MicaConfig::new(PicaConfig::new(Distance::mean_absolute(200).unwrap()))
}

fn run(curves: &[Arc<AnnotatedCurve>]) -> AlignmentNode {
    config()
        .align(curves, &CancelToken::new())
        .expect("alignment succeeds")
        .completed()
        .expect("not cancelled")
}

fn triangle(name: &str, peak: usize) -> Arc<AnnotatedCurve> {
    let y: Vec<f64> = (0..11)
        .map(|k| (4.0 - (k as f64 - peak as f64).abs()).max(0.0))
        .collect();
    Arc::new(AnnotatedCurve::new(name, y).expect("valid triangle"))
}

/// Splits committed by every fusion in the subtree.
fn committed_splits(node: &AlignmentNode) -> usize {
    match node.children() {
        Some((left, right)) => {
            let own = node.alignment().map_or(0, |a| a.splits());
            own + committed_splits(left) + committed_splits(right)
        }
        None => 0,
    }
}

fn assert_shared_boundaries(root: &AlignmentNode) {
    let reference = root.members()[0].boundary_positions();
    let tol = 1e-6 * root.members()[0].length();
    for m in root.members() {
        let positions = m.boundary_positions();
        assert_eq!(positions.len(), reference.len(), "{}", m.name());
        for (u, v) in positions.iter().zip(&reference) {
            assert!((u - v).abs() < tol, "{}: {u} vs {v}", m.name());
        }
    }
}

// ---------------------------------------------------------------------------
// a) members come back in input order with a compatible consensus
// ---------------------------------------------------------------------------

#[test]
fn members_in_input_order() {
    let curves: Vec<_> = ["a", "b", "c", "d"]
        .iter()
        .enumerate()
        .map(|(i, name)| wave(name, 50, i as f64 * 0.15, 1.0))
        .collect();
    let root = run(&curves);

    assert_eq!(root.input_indices(), &[0, 1, 2, 3]);
    let names: Vec<&str> = root.members().iter().map(IntervalDecomposition::name).collect();
    assert_eq!(names, vec!["a", "b", "c", "d"]);
    for m in root.members() {
        assert!(root.consensus().is_compatible(m));
    }
    assert_shared_boundaries(&root);
    assert!(committed_splits(&root) > 0);
}

#[test]
fn fused_nodes_stay_compatible_after_splits() {
    let curves = vec![triangle("p4", 4), triangle("p6", 6), triangle("p5", 5)];
    let pica = PicaConfig::new(Distance::mean_absolute(101).unwrap()).with_max_rel_x_shift(0.5);
    let config = MicaConfig::new(pica);
    let root = config
        .align(&curves, &CancelToken::new())
        .expect("fusion keeps interval structure")
        .completed()
        .expect("not cancelled");

    let (left, right) = root.children().unwrap();
    let inner = if left.is_leaf() { right } else { left };
    assert!(!inner.is_leaf());
    assert!(inner.alignment().unwrap().splits() > 0);

    // members keep their own single interval; the splits only shaped the warp
    for m in root.members() {
        assert_eq!(m.size(), 1, "{}", m.name());
        assert!(root.consensus().is_compatible(m));
    }
    assert_eq!(root.consensus().size(), 1);
    assert_eq!(root.input_indices(), &[0, 1, 2]);
    assert_shared_boundaries(&root);
}

// ---------------------------------------------------------------------------
// b) guide tree names every curve once
// ---------------------------------------------------------------------------

#[test]
fn guide_tree_covers_all_curves() {
    let mut rng = ChaCha8Rng::seed_from_u64(21);
    let curves: Vec<_> = (0..5)
        .map(|i| wave(&format!("c{i}"), 40, rng.gen_range(0.0..0.4), 1.0))
        .collect();
    let root = run(&curves);
    let tree = root.guide_tree();

    for i in 0..5 {
        assert_eq!(tree.matches(&format!("c{i}")).count(), 1, "{tree}");
    }
    assert_eq!(tree.matches('(').count(), 4);
    assert!(root.alignment().is_some());
    let (left, right) = root.children().unwrap();
    assert_eq!(left.members().len() + right.members().len(), 5);
}

// ---------------------------------------------------------------------------
// c) consensus of identical curves
// ---------------------------------------------------------------------------

#[test]
fn consensus_of_identical_curves_equals_input() {
    let a = wave("a", 30, 0.3, 0.5);
    let b = wave("b", 30, 0.3, 0.5);
    let c = consensus(&[IntervalDecomposition::new(a.clone()), IntervalDecomposition::new(b)]).unwrap();
    assert_eq!(c.curve().len(), a.len());
    for (u, v) in c.curve().x().iter().zip(a.curve().x()) {
        assert!((u - v).abs() < 1e-9);
    }
    for (u, v) in c.curve().y().iter().zip(a.curve().y()) {
        assert!((u - v).abs() < 1e-9);
    }

    let root = run(&[a.clone(), wave("b", 30, 0.3, 0.5)]);
    for (u, v) in root.consensus().curve().y().iter().zip(a.curve().y()) {
        assert!((u - v).abs() < 1e-9);
    }
}

// ---------------------------------------------------------------------------
// d) reference curve fixes the common length and start
// ---------------------------------------------------------------------------

#[test]
fn reference_fixes_length_and_start() {
    let curves = vec![
        wave("a", 40, 0.0, 1.0),
        wave("ref", 40, 0.2, 2.0),
        wave("c", 40, 0.1, 0.5),
    ];
    let root = config()
        .align_to_reference(1, &curves, &CancelToken::new())
        .unwrap()
        .completed()
        .unwrap();
    assert!(root.is_reference());
    let length = curves[1].curve().length();
    for m in root.members() {
        assert!((m.length() - length).abs() < 1e-6 * length, "{}", m.name());
        assert!(m.x_start().abs() < 1e-9, "{}", m.name());
    }
    assert_shared_boundaries(&root);
}

// ---------------------------------------------------------------------------
// e) input validation, single curves and cancellation
// ---------------------------------------------------------------------------

#[test]
fn rejects_bad_input() {
    let cancel = CancelToken::new();
    assert!(matches!(
        config().align(&[], &cancel),
        Err(MicaError::EmptyInput)
    ));
    let curves = vec![wave("a", 20, 0.0, 1.0), wave("b", 20, 0.1, 1.0)];
    assert!(matches!(
        config().align_to_reference(2, &curves, &cancel),
        Err(MicaError::InvalidReference { index: 2, len: 2 })
    ));

    let mut split = AnnotatedCurve::new("s", vec![0.0, 1.0, 2.0, 3.0]).unwrap();
    split.set_manual(1, Category::Split).unwrap();
    let mixed = vec![wave("a", 20, 0.0, 1.0), Arc::new(split)];
    assert!(matches!(
        config().align(&mixed, &cancel),
        Err(MicaError::Incompatible { index: 1 })
    ));
}

#[test]
fn single_curve_is_a_leaf() {
    let root = run(&[wave("only", 20, 0.0, 1.0)]);
    assert!(root.is_leaf());
    assert_eq!(root.guide_tree(), "only");
    assert_eq!(root.members().len(), 1);
}

#[test]
fn cancelled_run_returns_nothing() {
    let curves = vec![wave("a", 20, 0.0, 1.0), wave("b", 20, 0.1, 1.0)];
    let cancel = CancelToken::new();
    cancel.cancel();
    let outcome = config().align(&curves, &cancel).unwrap();
    assert!(outcome.is_cancelled());
}

// ---------------------------------------------------------------------------
// f) manual splits are kept as boundaries
// ---------------------------------------------------------------------------

#[test]
fn manual_splits_survive_alignment() {
    let mut curves = Vec::new();
    for (i, name) in ["a", "b", "c"].iter().enumerate() {
        let y: Vec<f64> = (0..30).map(|k| (k as f64 * 0.25 + i as f64 * 0.1).sin()).collect();
        let mut c = AnnotatedCurve::new(*name, y).unwrap();
        c.set_manual(10 + i, Category::Split).unwrap();
        curves.push(Arc::new(c));
    }
    let root = run(&curves);
    for (m, i) in root.members().iter().zip(0..) {
        assert!(m.boundaries().iter().any(|b| b.index == 10 + i));
    }
    assert_shared_boundaries(&root);
}
