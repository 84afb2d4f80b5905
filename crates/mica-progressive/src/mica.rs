//! MICA: progressive multiple curve alignment.
//!
//! Every input starts as a leaf. PICA distances between the consensus curves
//! of all node pairs are cached; the closest pair is fused repeatedly until a
//! single node remains. Fusing moves each member of both nodes through the
//! warp their consensus received in the pairwise alignment. Boundaries the
//! alignment inserted only shape that warp; members keep their own interval
//! structure, so a fused node stays compatible with every remaining node.

use std::collections::BTreeMap;

use tracing::{debug, info, instrument};

use mica_pica::{
    bail_if_cancelled, CancelToken, IntervalDecomposition, Outcome, PairwiseAlignment, PicaConfig,
};

use crate::consensus::consensus;
use crate::error::MicaError;
use crate::node::AlignmentNode;

/// Cached pairwise alignments keyed by `(lower id, higher id)`.
type DistanceCache = BTreeMap<(usize, usize), PairwiseAlignment>;

#[instrument(skip(decompositions, config, cancel), fields(curves = decompositions.len()))]
pub(crate) fn align(
    decompositions: Vec<IntervalDecomposition>,
    reference: Option<usize>,
    config: &PicaConfig,
    cancel: &CancelToken,
) -> Result<Outcome<AlignmentNode>, MicaError> {
    let first = decompositions.first().ok_or(MicaError::EmptyInput)?;
    if let Some(index) = reference.filter(|&r| r >= decompositions.len()) {
        return Err(MicaError::InvalidReference {
            index,
            len: decompositions.len(),
        });
    }
    if let Some(index) = decompositions.iter().position(|d| !first.is_compatible(d)) {
        return Err(MicaError::Incompatible { index });
    }

    let mut nodes: BTreeMap<usize, AlignmentNode> = decompositions
        .into_iter()
        .enumerate()
        .map(|(i, d)| (i, AlignmentNode::leaf(i, d, reference == Some(i))))
        .collect();
    let mut next_id = nodes.len();

    let mut cache = DistanceCache::new();
    let ids: Vec<usize> = nodes.keys().copied().collect();
    for (k, &i) in ids.iter().enumerate() {
        for &j in &ids[k + 1..] {
            bail_if_cancelled!(cancel);
            match pair(&nodes[&i], &nodes[&j], config, cancel)? {
                Outcome::Completed(alignment) => {
                    cache.insert((i, j), alignment);
                }
                Outcome::Cancelled => return Ok(Outcome::Cancelled),
            }
        }
    }

    while nodes.len() > 1 {
        bail_if_cancelled!(cancel);
        let Some(((i, j), alignment)) = closest_pair(&cache).and_then(|key| cache.remove_entry(&key))
        else {
            break;
        };
        let (left, right) = take_pair(&mut nodes, i, j)?;
        cache.retain(|&(a, b), _| a != i && a != j && b != i && b != j);

        let distance = alignment.distance();
        let fused = fuse(left, right, alignment)?;
        debug!(
            left = i,
            right = j,
            id = next_id,
            distance,
            members = fused.members.len(),
            "nodes fused"
        );

        for (&k, other) in &nodes {
            bail_if_cancelled!(cancel);
            match pair(other, &fused, config, cancel)? {
                Outcome::Completed(alignment) => {
                    cache.insert((k, next_id), alignment);
                }
                Outcome::Cancelled => return Ok(Outcome::Cancelled),
            }
        }
        nodes.insert(next_id, fused);
        next_id += 1;
    }

    let Some(mut root) = nodes.into_values().next() else {
        return Err(MicaError::EmptyInput);
    };
    let mut ordered: Vec<(usize, IntervalDecomposition)> =
        root.inputs.drain(..).zip(root.members.drain(..)).collect();
    ordered.sort_by_key(|(input, _)| *input);
    (root.inputs, root.members) = ordered.into_iter().unzip();

    info!(guide_tree = %root, "progressive alignment complete");
    Ok(Outcome::Completed(root))
}

/// Align the consensus curves of two nodes, weighted by member count.
///
/// A node holding the reference curve dictates interval lengths: the other
/// side gets weight 0.
fn pair(
    a: &AlignmentNode,
    b: &AlignmentNode,
    config: &PicaConfig,
    cancel: &CancelToken,
) -> Result<Outcome<PairwiseAlignment>, MicaError> {
    let mut first_weight = a.members.len() as f64;
    let mut second_weight = b.members.len() as f64;
    if a.is_reference {
        second_weight = 0.0;
    } else if b.is_reference {
        first_weight = 0.0;
    }
    Ok(config.align(&a.consensus, first_weight, &b.consensus, second_weight, cancel)?)
}

/// Remove nodes `i` and `j` from the live set.
fn take_pair(
    nodes: &mut BTreeMap<usize, AlignmentNode>,
    i: usize,
    j: usize,
) -> Result<(AlignmentNode, AlignmentNode), MicaError> {
    let left = nodes.remove(&i).ok_or(MicaError::UnknownNode { id: i })?;
    let right = nodes.remove(&j).ok_or(MicaError::UnknownNode { id: j })?;
    Ok((left, right))
}

/// Return the cached pair with the smallest distance; ties go to the lowest key.
fn closest_pair(cache: &DistanceCache) -> Option<(usize, usize)> {
    let mut best: Option<((usize, usize), f64)> = None;
    for (&key, alignment) in cache {
        if best.map_or(true, |(_, d)| alignment.distance() < d) {
            best = Some((key, alignment.distance()));
        }
    }
    best.map(|(key, _)| key)
}

fn fuse(
    left: AlignmentNode,
    right: AlignmentNode,
    alignment: PairwiseAlignment,
) -> Result<AlignmentNode, MicaError> {
    let mut inputs = left.inputs.clone();
    inputs.extend_from_slice(&right.inputs);
    let mut members = Vec::with_capacity(inputs.len());
    for m in &left.members {
        members.push(reposition(m, &left.consensus, alignment.first())?);
    }
    for m in &right.members {
        members.push(reposition(m, &right.consensus, alignment.second())?);
    }
    let consensus = consensus(&members)?;
    let is_reference = left.is_reference || right.is_reference;
    Ok(AlignmentNode {
        inputs,
        members,
        consensus,
        children: Some(Box::new((left, right))),
        alignment: Some(alignment),
        is_reference,
    })
}

/// Apply the warp that took a consensus from `before` to `after` to one of
/// its members.
///
/// Only x moves; the member's boundary list is left as it is.
fn reposition(
    member: &IntervalDecomposition,
    before: &IntervalDecomposition,
    after: &IntervalDecomposition,
) -> Result<IntervalDecomposition, MicaError> {
    let from = before.curve().x();
    let to = after.curve().x();
    let mut m = member.clone();
    m.transform(|x| remap(from, to, x))?;
    Ok(m)
}

/// Piecewise-linear map sending `from[k]` to `to[k]`, extended linearly past both ends.
fn remap(from: &[f64], to: &[f64], x: f64) -> f64 {
    let n = from.len();
    let k = from.partition_point(|&v| v <= x).clamp(1, n - 1) - 1;
    let t = (x - from[k]) / (from[k + 1] - from[k]);
    to[k] + t * (to[k + 1] - to[k])
}
