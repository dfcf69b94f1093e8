//! Union-find over one contiguous node interval.

use crate::graph::{Edge, Node};
use crate::kruskal::SimpleShiftMap;

/// Words of memory per node of the interval.
pub const MEMORY_OVERHEAD_FACTOR: u64 = 4;

/// Kruskal's base case over a borrowed [`SimpleShiftMap`] of parents.
///
/// The caller owns the parent map and keeps it after
/// [`finalize`](BoundedIntervalKruskal::finalize), at which point every
/// present key is compressed directly to its root; heights live only for
/// the lifetime of the run.
pub struct BoundedIntervalKruskal<'a> {
    interval_min: Node,
    interval_max: Node,
    parent: &'a mut SimpleShiftMap<Node>,
    height: SimpleShiftMap<u8>,
}

impl<'a> BoundedIntervalKruskal<'a> {
    /// A run over `[interval_min, interval_max]` recording into `parent`.
    pub fn new(parent: &'a mut SimpleShiftMap<Node>, interval_min: Node, interval_max: Node) -> Self {
        BoundedIntervalKruskal {
            interval_min,
            interval_max,
            parent,
            height: SimpleShiftMap::new(interval_min, interval_max),
        }
    }

    /// Unions one edge; both endpoints must lie in the interval.
    pub fn push(&mut self, edge: Edge) {
        self.union(edge.u, edge.v);
    }

    /// Compresses every present key to its root.
    pub fn finalize(&mut self) {
        for key in self.interval_min..=self.interval_max {
            if self.parent.contains(key) {
                let root = self.find(key);
                self.parent.insert(key, root);
            }
        }
    }

    fn find(&mut self, u: Node) -> Node {
        if !self.parent.contains(u) {
            self.parent.insert(u, u);
            self.height.insert(u, 0);
            return u;
        }
        let mut root = u;
        while self.parent.get(root, root) != root {
            root = self.parent.get(root, root);
        }
        let mut cursor = u;
        while self.parent.get(cursor, cursor) != cursor {
            let next = self.parent.get(cursor, cursor);
            self.parent.insert(cursor, root);
            cursor = next;
        }
        root
    }

    fn union(&mut self, u: Node, v: Node) -> bool {
        let root_u = self.find(u);
        let root_v = self.find(v);
        if root_u == root_v {
            return false;
        }
        if self.height.get(root_u, 0) < self.height.get(root_v, 0) {
            self.parent.insert(root_u, root_v);
        } else {
            self.parent.insert(root_v, root_u);
        }
        if self.height.get(root_u, 0) == self.height.get(root_v, 0) {
            *self.height.slot(root_u) += 1;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_collapses_to_one_root() {
        let mut parent = SimpleShiftMap::new(1, 6);
        {
            let mut kruskal = BoundedIntervalKruskal::new(&mut parent, 1, 6);
            for u in 1..6 {
                kruskal.push(Edge::new(u, u + 1));
            }
            kruskal.finalize();
        }
        let root = parent.get(1, 0);
        for u in 1..=6 {
            assert_eq!(parent.get(u, 0), root);
        }
    }

    #[test]
    fn disjoint_pairs_stay_disjoint() {
        let mut parent = SimpleShiftMap::new(1, 4);
        {
            let mut kruskal = BoundedIntervalKruskal::new(&mut parent, 1, 4);
            kruskal.push(Edge::new(1, 2));
            kruskal.push(Edge::new(3, 4));
            kruskal.finalize();
        }
        assert_eq!(parent.get(1, 0), parent.get(2, 0));
        assert_eq!(parent.get(3, 0), parent.get(4, 0));
        assert_ne!(parent.get(1, 0), parent.get(3, 0));
    }
}
