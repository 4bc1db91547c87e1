//! Vertex identifier for the generic graph layer.

use std::fmt;

/// A strongly-typed identifier for a vertex of a graph.
///
/// `NodeId` wraps a dense `usize` index so that per-vertex analysis results can be
/// stored in plain vectors. Domain graphs convert their own identifiers into
/// `NodeId` at the trait boundary; for the control flow graph a block's
/// [`BlockId`](crate::cfg::BlockId) index is its `NodeId` index.
///
/// # Examples
///
/// ```rust
/// use smxscope::utils::graph::NodeId;
///
/// let node = NodeId::new(5);
/// assert_eq!(node.index(), 5);
/// assert_eq!(format!("{node}"), "n5");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Creates a new `NodeId` from a raw index value.
    #[must_use]
    #[inline]
    pub const fn new(index: usize) -> Self {
        NodeId(index)
    }

    /// Returns the raw index value of this node identifier.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}
