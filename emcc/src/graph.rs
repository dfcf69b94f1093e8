//! Nodes, edges, component labels and every order they are sorted by.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use emcc_storage::SortOrder;

/// A node identifier.
///
/// Both `MIN_NODE` and `MAX_NODE` are reserved sentinels, and the top bit
/// is claimed by the edge-stream encoding, so real identifiers live in
/// `1 ..= (1 << 63) - 2`.
pub type Node = u64;

/// Reserved lower sentinel; no edge may carry it.
pub const MIN_NODE: Node = 0;

/// Reserved upper sentinel; no edge may carry it.
pub const MAX_NODE: Node = Node::MAX;

/// An undirected edge, stored as an ordered pair.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Edge {
    /// Source endpoint.
    pub u: Node,
    /// Target endpoint.
    pub v: Node,
}

/// The least edge under every order used here.
pub const MIN_EDGE: Edge = Edge {
    u: MIN_NODE,
    v: MIN_NODE,
};

/// The greatest edge under every order used here.
pub const MAX_EDGE: Edge = Edge {
    u: MAX_NODE,
    v: MAX_NODE,
};

impl Edge {
    /// An edge from `u` to `v`.
    #[inline]
    pub fn new(u: Node, v: Node) -> Self {
        Edge { u, v }
    }

    /// `true` iff both endpoints coincide.
    #[inline]
    pub fn is_self_loop(&self) -> bool {
        self.u == self.v
    }

    /// The same edge oriented smaller-to-larger.
    #[inline]
    pub fn normalized(&self) -> Edge {
        Edge {
            u: self.u.min(self.v),
            v: self.u.max(self.v),
        }
    }

    /// The edge with its endpoints swapped.
    #[inline]
    pub fn reversed(&self) -> Edge {
        Edge {
            u: self.v,
            v: self.u,
        }
    }

    /// Endpoints as an orientation-blind `(min, max)` key.
    #[inline]
    pub fn unordered(&self) -> (Node, Node) {
        (self.u.min(self.v), self.u.max(self.v))
    }
}

/// `true` iff neither endpoint is a reserved sentinel.
#[inline]
pub fn valid_edge(e: &Edge) -> bool {
    e.u > MIN_NODE && e.u < MAX_NODE && e.v > MIN_NODE && e.v < MAX_NODE
}

/// A node labelled with its component representative.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct NodeComponent {
    /// The labelled node.
    pub node: Node,
    /// Its representative.
    pub comp: Node,
}

impl NodeComponent {
    /// A `(node, representative)` pair.
    #[inline]
    pub fn new(node: Node, comp: Node) -> Self {
        NodeComponent { node, comp }
    }
}

/// An edge tagged with a scan position.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct RankedEdge {
    /// Source endpoint.
    pub u: Node,
    /// Target endpoint.
    pub v: Node,
    /// The position this edge is shipped to.
    pub rank: u64,
}

/// A node paired with a scan position.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct NodePos {
    /// The node.
    pub node: Node,
    /// Its position.
    pub pos: u64,
}

/// Nodes ascending.
pub struct NodeAsc;

impl SortOrder<Node> for NodeAsc {
    #[inline]
    fn cmp(a: &Node, b: &Node) -> Ordering {
        a.cmp(b)
    }
    fn min_value() -> Node {
        MIN_NODE
    }
    fn max_value() -> Node {
        MAX_NODE
    }
}

/// Edges in lexicographic `(u, v)` order.
pub struct EdgeLex;

impl SortOrder<Edge> for EdgeLex {
    #[inline]
    fn cmp(a: &Edge, b: &Edge) -> Ordering {
        (a.u, a.v).cmp(&(b.u, b.v))
    }
    fn min_value() -> Edge {
        MIN_EDGE
    }
    fn max_value() -> Edge {
        MAX_EDGE
    }
}

/// Edges in reversed lexicographic order, greatest first.
pub struct EdgeLexDesc;

impl SortOrder<Edge> for EdgeLexDesc {
    #[inline]
    fn cmp(a: &Edge, b: &Edge) -> Ordering {
        (b.u, b.v).cmp(&(a.u, a.v))
    }
    fn min_value() -> Edge {
        MAX_EDGE
    }
    fn max_value() -> Edge {
        MIN_EDGE
    }
}

/// Edges by `(v, u)`, i.e. grouped by target.
pub struct EdgeByTarget;

impl SortOrder<Edge> for EdgeByTarget {
    #[inline]
    fn cmp(a: &Edge, b: &Edge) -> Ordering {
        (a.v, a.u).cmp(&(b.v, b.u))
    }
    fn min_value() -> Edge {
        MIN_EDGE
    }
    fn max_value() -> Edge {
        MAX_EDGE
    }
}

/// Edges by their orientation-blind `(min, max)` key.
pub struct EdgeUnordered;

impl SortOrder<Edge> for EdgeUnordered {
    #[inline]
    fn cmp(a: &Edge, b: &Edge) -> Ordering {
        a.unordered().cmp(&b.unordered())
    }
    fn min_value() -> Edge {
        MIN_EDGE
    }
    fn max_value() -> Edge {
        MAX_EDGE
    }
}

/// The reverse of [`EdgeUnordered`]; as a priority-queue order it pops the
/// least unordered edge first.
pub struct EdgeUnorderedDesc;

impl SortOrder<Edge> for EdgeUnorderedDesc {
    #[inline]
    fn cmp(a: &Edge, b: &Edge) -> Ordering {
        b.unordered().cmp(&a.unordered())
    }
    fn min_value() -> Edge {
        MAX_EDGE
    }
    fn max_value() -> Edge {
        MIN_EDGE
    }
}

/// The contraction queue order: the greatest element carries the minimum
/// source and, within a source, the maximum target.
///
/// Popping greatest-first therefore yields the smallest unfinished source
/// with its farthest known neighbor on top, which is the invariant the
/// Sibeyn contraction is built on.
pub struct MinSourceMaxTarget;

impl SortOrder<Edge> for MinSourceMaxTarget {
    #[inline]
    fn cmp(a: &Edge, b: &Edge) -> Ordering {
        (b.u, a.v).cmp(&(a.u, b.v))
    }
    fn min_value() -> Edge {
        Edge {
            u: MAX_NODE,
            v: MIN_NODE,
        }
    }
    fn max_value() -> Edge {
        Edge {
            u: MIN_NODE,
            v: MAX_NODE,
        }
    }
}

/// Component labels by `(node, comp)`.
pub struct ByNode;

impl SortOrder<NodeComponent> for ByNode {
    #[inline]
    fn cmp(a: &NodeComponent, b: &NodeComponent) -> Ordering {
        (a.node, a.comp).cmp(&(b.node, b.comp))
    }
    fn min_value() -> NodeComponent {
        NodeComponent::new(MIN_NODE, MIN_NODE)
    }
    fn max_value() -> NodeComponent {
        NodeComponent::new(MAX_NODE, MAX_NODE)
    }
}

/// Component labels by `(comp, node)`, the merge order.
pub struct ByComponent;

impl SortOrder<NodeComponent> for ByComponent {
    #[inline]
    fn cmp(a: &NodeComponent, b: &NodeComponent) -> Ordering {
        (a.comp, a.node).cmp(&(b.comp, b.node))
    }
    fn min_value() -> NodeComponent {
        NodeComponent::new(MIN_NODE, MIN_NODE)
    }
    fn max_value() -> NodeComponent {
        NodeComponent::new(MAX_NODE, MAX_NODE)
    }
}

/// Ranked edges by `(rank, u, v)`.
pub struct ByRank;

impl SortOrder<RankedEdge> for ByRank {
    #[inline]
    fn cmp(a: &RankedEdge, b: &RankedEdge) -> Ordering {
        (a.rank, a.u, a.v).cmp(&(b.rank, b.u, b.v))
    }
    fn min_value() -> RankedEdge {
        RankedEdge {
            u: MIN_NODE,
            v: MIN_NODE,
            rank: 0,
        }
    }
    fn max_value() -> RankedEdge {
        RankedEdge {
            u: MAX_NODE,
            v: MAX_NODE,
            rank: u64::MAX,
        }
    }
}

/// Node/position pairs by `(node, pos)`.
pub struct NodePosAsc;

impl SortOrder<NodePos> for NodePosAsc {
    #[inline]
    fn cmp(a: &NodePos, b: &NodePos) -> Ordering {
        (a.node, a.pos).cmp(&(b.node, b.pos))
    }
    fn min_value() -> NodePos {
        NodePos {
            node: MIN_NODE,
            pos: 0,
        }
    }
    fn max_value() -> NodePos {
        NodePos {
            node: MAX_NODE,
            pos: u64::MAX,
        }
    }
}
