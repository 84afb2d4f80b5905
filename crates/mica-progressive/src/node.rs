//! Nodes of the progressive alignment guide tree.

use std::fmt;

use mica_pica::{IntervalDecomposition, PairwiseAlignment};

/// A set of mutually compatible decompositions and their consensus.
///
/// Leaves hold one input curve. An internal node records the two nodes it
/// was fused from and the pairwise alignment of their consensus curves.
/// Nodes are never modified once built, so the consensus is computed once,
/// when the node is created, rather than on first access.
#[derive(Debug, Clone)]
pub struct AlignmentNode {
    pub(crate) inputs: Vec<usize>,
    pub(crate) members: Vec<IntervalDecomposition>,
    pub(crate) consensus: IntervalDecomposition,
    pub(crate) children: Option<Box<(AlignmentNode, AlignmentNode)>>,
    pub(crate) alignment: Option<PairwiseAlignment>,
    pub(crate) is_reference: bool,
}

impl AlignmentNode {
    pub(crate) fn leaf(input: usize, member: IntervalDecomposition, is_reference: bool) -> Self {
        Self {
            inputs: vec![input],
            consensus: member.clone(),
            members: vec![member],
            children: None,
            alignment: None,
            is_reference,
        }
    }

    /// Return the aligned member decompositions.
    #[must_use]
    pub fn members(&self) -> &[IntervalDecomposition] {
        &self.members
    }

    /// Return the input position of every member, parallel to [`members`][Self::members].
    #[must_use]
    pub fn input_indices(&self) -> &[usize] {
        &self.inputs
    }

    /// Return the consensus of all members.
    #[must_use]
    pub fn consensus(&self) -> &IntervalDecomposition {
        &self.consensus
    }

    /// Return the alignment that fused the two children, if any.
    #[must_use]
    pub fn alignment(&self) -> Option<&PairwiseAlignment> {
        self.alignment.as_ref()
    }

    /// Return the `(left, right)` children, or `None` for a leaf.
    #[must_use]
    pub fn children(&self) -> Option<(&AlignmentNode, &AlignmentNode)> {
        self.children.as_deref().map(|(l, r)| (l, r))
    }

    /// Return true if the node holds exactly one input curve.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Return true if the reference curve is one of the members.
    #[must_use]
    pub fn is_reference(&self) -> bool {
        self.is_reference
    }

    /// Return the parenthesized guide tree, e.g. `((a,b),c)`.
    #[must_use]
    pub fn guide_tree(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for AlignmentNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.children() {
            Some((left, right)) => write!(f, "({left},{right})"),
            None => {
                let names: Vec<&str> = self.members.iter().map(IntervalDecomposition::name).collect();
                f.write_str(&names.join(","))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mica_curve::AnnotatedCurve;

    use super::*;

    fn leaf(name: &str, input: usize) -> AlignmentNode {
        let source = Arc::new(AnnotatedCurve::new(name, vec![0.0, 1.0, 0.0]).unwrap());
        AlignmentNode::leaf(input, IntervalDecomposition::new(source), false)
    }

    #[test]
    fn leaf_guide_tree_is_name() {
        let node = leaf("a", 0);
        assert!(node.is_leaf());
        assert_eq!(node.guide_tree(), "a");
        assert_eq!(node.input_indices(), &[0]);
        assert!(node.alignment().is_none());
    }

    #[test]
    fn nested_guide_tree() {
        let ab = AlignmentNode {
            inputs: vec![0, 1],
            members: vec![],
            consensus: leaf("x", 9).consensus,
            children: Some(Box::new((leaf("a", 0), leaf("b", 1)))),
            alignment: None,
            is_reference: false,
        };
        let root = AlignmentNode {
            inputs: vec![0, 1, 2],
            members: vec![],
            consensus: leaf("y", 9).consensus,
            children: Some(Box::new((ab, leaf("c", 2)))),
            alignment: None,
            is_reference: false,
        };
        assert_eq!(root.guide_tree(), "((a,b),c)");
        let (left, _) = root.children().unwrap();
        assert_eq!(left.to_string(), "(a,b)");
    }
}
