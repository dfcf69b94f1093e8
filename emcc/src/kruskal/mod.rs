//! Semi-external union-find base cases.
//!
//! When the node set of a subproblem fits in memory, connected components
//! reduce to a single scan of the edge set through a union-find with path
//! compression and union by height. External node identifiers are remapped
//! to dense indices on first contact, so the arrays grow with the nodes
//! actually seen.

pub mod bounded;
mod shift_map;

pub use bounded::BoundedIntervalKruskal;
pub use shift_map::SimpleShiftMap;

use std::collections::HashMap;
use std::io;

use emcc_storage::{Pushable, Streamer};

use crate::graph::{Edge, Node, NodeComponent, MAX_NODE};

/// Words of memory per mapped node, covering parent, height, remap entries
/// and allocator slack. The semi-external gate is computed against this.
pub const MEMORY_OVERHEAD_FACTOR: u64 = 8;

/// Union-find over dense indices with an external-ID remap.
struct UnionFind {
    id_map: HashMap<Node, u32>,
    reverse: Vec<Node>,
    parent: Vec<u32>,
    height: Vec<u8>,
    unions: u64,
}

impl UnionFind {
    fn new() -> Self {
        UnionFind {
            id_map: HashMap::new(),
            reverse: Vec::new(),
            parent: Vec::new(),
            height: Vec::new(),
            unions: 0,
        }
    }

    /// The dense index of `u`, allocating one on first contact.
    fn use_map(&mut self, u: Node) -> u32 {
        match self.id_map.get(&u) {
            Some(&index) => index,
            None => {
                let index = self.reverse.len() as u32;
                self.id_map.insert(u, index);
                self.reverse.push(u);
                self.parent.push(index);
                self.height.push(0);
                index
            }
        }
    }

    /// The root of `u`'s tree, compressing the visited path.
    fn find(&mut self, u: u32) -> u32 {
        let mut root = u;
        while self.parent[root as usize] != root {
            root = self.parent[root as usize];
        }
        let mut cursor = u;
        while self.parent[cursor as usize] != cursor {
            let next = self.parent[cursor as usize];
            self.parent[cursor as usize] = root;
            cursor = next;
        }
        root
    }

    /// Joins the trees of `u` and `v`; `false` iff they were joined already.
    fn union(&mut self, u: u32, v: u32) -> bool {
        let root_u = self.find(u);
        let root_v = self.find(v);
        if root_u == root_v {
            return false;
        }
        if self.height[root_u as usize] < self.height[root_v as usize] {
            self.parent[root_u as usize] = root_v;
        } else {
            self.parent[root_v as usize] = root_u;
        }
        if self.height[root_u as usize] == self.height[root_v as usize] {
            self.height[root_u as usize] += 1;
        }
        true
    }

    fn add_edge(&mut self, edge: Edge) {
        let u = self.use_map(edge.u);
        let v = self.use_map(edge.v);
        if self.union(u, v) {
            self.unions += 1;
        }
    }

    fn nodes(&self) -> u64 {
        self.reverse.len() as u64
    }

    fn components(&self) -> u64 {
        self.nodes() - self.unions
    }

    /// Emits `(node, representative)` for every mapped node.
    fn emit(&mut self, out: &mut impl Pushable<NodeComponent>) -> io::Result<()> {
        for index in 0..self.reverse.len() as u32 {
            let node = self.reverse[index as usize];
            let root = self.find(index);
            let rep = self.reverse[root as usize];
            out.push(NodeComponent::new(node, rep))?;
        }
        Ok(())
    }
}

/// The base case over whole edge streams.
pub struct StreamKruskal {
    inner: UnionFind,
}

impl Default for StreamKruskal {
    fn default() -> Self {
        StreamKruskal::new()
    }
}

impl StreamKruskal {
    /// An empty instance.
    pub fn new() -> Self {
        StreamKruskal {
            inner: UnionFind::new(),
        }
    }

    /// Unions every edge of `edges`; may be called for several streams.
    pub fn consume<S: Streamer<Item = Edge>>(&mut self, edges: &mut S) -> io::Result<()> {
        while !edges.empty() {
            self.inner.add_edge(edges.peek());
            edges.advance()?;
        }
        Ok(())
    }

    /// Emits the component map for everything consumed so far.
    pub fn finish(&mut self, out: &mut impl Pushable<NodeComponent>) -> io::Result<()> {
        self.inner.emit(out)
    }

    /// Nodes seen.
    pub fn nodes(&self) -> u64 {
        self.inner.nodes()
    }

    /// Components found.
    pub fn components(&self) -> u64 {
        self.inner.components()
    }
}

/// The base case fed one edge at a time, so upstream relabelling can pipe
/// straight into it without materializing the edge set.
pub struct PipelinedKruskal {
    inner: UnionFind,
}

impl Default for PipelinedKruskal {
    fn default() -> Self {
        PipelinedKruskal::new()
    }
}

impl PipelinedKruskal {
    /// An empty instance.
    pub fn new() -> Self {
        PipelinedKruskal {
            inner: UnionFind::new(),
        }
    }

    /// Unions one edge.
    pub fn push(&mut self, edge: Edge) {
        self.inner.add_edge(edge);
    }

    /// Emits the component map for everything pushed so far.
    pub fn finish(&mut self, out: &mut impl Pushable<NodeComponent>) -> io::Result<()> {
        self.inner.emit(out)
    }

    /// The first node ever pushed, or `MAX_NODE` if none.
    pub fn first_inserted_node(&self) -> Node {
        self.inner.reverse.first().copied().unwrap_or(MAX_NODE)
    }

    /// Nodes seen.
    pub fn nodes(&self) -> u64 {
        self.inner.nodes()
    }

    /// Components found.
    pub fn components(&self) -> u64 {
        self.inner.components()
    }
}

impl Pushable<Edge> for PipelinedKruskal {
    fn push(&mut self, item: Edge) -> io::Result<()> {
        PipelinedKruskal::push(self, item);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ByNode, EdgeLex};
    use emcc_storage::{ExternalSorter, Limits};

    fn labels(sorter: &mut ExternalSorter<NodeComponent, ByNode>) -> Vec<(u64, u64)> {
        let mut result = Vec::new();
        while !Streamer::empty(sorter) {
            let entry = sorter.peek();
            result.push((entry.node, entry.comp));
            sorter.advance().unwrap();
        }
        result
    }

    #[test]
    fn two_triangles() {
        let limits = Limits::default();
        let mut edges = ExternalSorter::<Edge, EdgeLex>::new(&limits);
        for (u, v) in [(1, 2), (1, 3), (2, 3), (4, 5), (4, 6), (5, 6)] {
            edges.push(Edge::new(u, v)).unwrap();
        }
        edges.sort().unwrap();

        let mut kruskal = StreamKruskal::new();
        kruskal.consume(&mut edges).unwrap();
        assert_eq!(kruskal.nodes(), 6);
        assert_eq!(kruskal.components(), 2);

        let mut out = ExternalSorter::<NodeComponent, ByNode>::new(&limits);
        kruskal.finish(&mut out).unwrap();
        out.sort().unwrap();
        let labels = labels(&mut out);
        assert_eq!(labels.len(), 6);
        let first = labels[0].1;
        let second = labels[3].1;
        assert!(labels[..3].iter().all(|&(_, c)| c == first));
        assert!(labels[3..].iter().all(|&(_, c)| c == second));
        assert_ne!(first, second);
    }

    #[test]
    fn duplicate_edges_are_harmless() {
        let mut kruskal = PipelinedKruskal::new();
        for _ in 0..3 {
            kruskal.push(Edge::new(1, 2));
        }
        kruskal.push(Edge::new(2, 3));
        assert_eq!(kruskal.nodes(), 3);
        assert_eq!(kruskal.components(), 1);
        assert_eq!(kruskal.first_inserted_node(), 1);
    }
}
