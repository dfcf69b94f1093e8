//! The bundled Sibeyn variant: local Kruskal per node-ID interval.

use std::io;

use emcc_storage::{BlockedSequence, ExternalPq, ExternalSorter, Limits, Streamer};

use crate::graph::{Edge, EdgeByTarget, EdgeLex, Node, NodeComponent};
use crate::kruskal::{BoundedIntervalKruskal, SimpleShiftMap};
use crate::stream::UniqueFilter;

/// An ordered partition of `[1, max_id]` into equal-width intervals, each
/// backed by two append sequences: edges inside the interval, and edges
/// leaving it toward a later one.
pub struct EquiRangedBundles {
    width: Node,
    intra: Vec<BlockedSequence<Edge>>,
    inter: Vec<BlockedSequence<Edge>>,
}

impl EquiRangedBundles {
    /// A partition of `[1, max_id]` into roughly `num_bundles` intervals.
    pub fn new(max_id: Node, num_bundles: usize, limits: &Limits) -> Self {
        assert!(max_id >= 1 && num_bundles >= 1);
        let width = (max_id / num_bundles as Node).max(1);
        let count = (max_id + width - 1) / width;
        let mut intra = Vec::with_capacity(count as usize);
        let mut inter = Vec::with_capacity(count as usize);
        for _ in 0..count {
            intra.push(BlockedSequence::new(limits));
            inter.push(BlockedSequence::new(limits));
        }
        EquiRangedBundles { width, intra, inter }
    }

    /// The number of intervals.
    pub fn num_bundles(&self) -> usize {
        self.intra.len()
    }

    /// The interval index of node `u`.
    pub fn bundle_of(&self, u: Node) -> usize {
        debug_assert!(u >= 1);
        ((u - 1) / self.width) as usize
    }

    /// The smallest node of interval `bundle`.
    pub fn lower_boundary(&self, bundle: usize) -> Node {
        bundle as Node * self.width + 1
    }

    /// The largest node of interval `bundle`.
    pub fn upper_boundary(&self, bundle: usize) -> Node {
        (bundle as Node + 1) * self.width
    }

    /// Interval width in nodes.
    pub fn width(&self) -> Node {
        self.width
    }

    /// Routes an edge to its source interval's intra or inter sequence.
    pub fn push(&mut self, edge: Edge) -> io::Result<()> {
        debug_assert!(edge.u <= edge.v);
        let source = self.bundle_of(edge.u);
        if source == self.bundle_of(edge.v) {
            self.intra[source].push(edge)
        } else {
            self.inter[source].push(edge)
        }
    }
}

/// Connected components by bundle-local Kruskal runs joined through one
/// external priority queue of tree edges.
///
/// Each interval is solved with a [`BoundedIntervalKruskal`] over a dense
/// shift map, its outgoing edges fold into per-component maxima, and
/// signals re-enter later intervals (optionally minimized into paths).
/// Afterwards the instance streams `(node, root)` pairs in decreasing node
/// order, forwarding each group's root to its smaller members through the
/// queue.
pub struct SibeynWithBundles {
    tree_pq: ExternalPq<Edge, EdgeLex>,
    current: Option<NodeComponent>,
}

impl SibeynWithBundles {
    /// Runs the bundled computation over a consumed edge stream.
    ///
    /// `max_id` bounds the node range; `num_bundles` is chosen by the
    /// caller so one interval's shift map fits memory
    /// (`width · 4 · sizeof(Node)` bytes, see
    /// [`crate::kruskal::bounded::MEMORY_OVERHEAD_FACTOR`]). With
    /// `minimize` set, signal
    /// clusters sharing a maximum and an origin interval are rewritten
    /// into a path through that interval instead of parallel signals.
    pub fn new<S>(
        edges: &mut S,
        max_id: Node,
        num_bundles: usize,
        minimize: bool,
        limits: &Limits,
    ) -> io::Result<Self>
    where
        S: Streamer<Item = Edge>,
    {
        let mut bundles = EquiRangedBundles::new(max_id, num_bundles, limits);
        while !edges.empty() {
            let edge = edges.peek();
            debug_assert!(edge.u <= edge.v);
            bundles.push(edge)?;
            edges.advance()?;
        }

        let mut engine = SibeynWithBundles {
            tree_pq: ExternalPq::new(limits),
            current: None,
        };
        for bundle in 0..bundles.num_bundles() {
            engine.process_bundle(&mut bundles, bundle, minimize, limits)?;
        }
        engine.step()?;
        Ok(engine)
    }

    fn process_bundle(
        &mut self,
        bundles: &mut EquiRangedBundles,
        bundle: usize,
        minimize: bool,
        limits: &Limits,
    ) -> io::Result<()> {
        let lower = bundles.lower_boundary(bundle);
        let upper = bundles.upper_boundary(bundle);

        // Solve the interval-local subgraph.
        let mut components = SimpleShiftMap::<Node>::new(lower, upper);
        {
            let mut kruskal = BoundedIntervalKruskal::new(&mut components, lower, upper);
            let mut intra = std::mem::replace(&mut bundles.intra[bundle], BlockedSequence::new(limits));
            let mut scan = intra.stream()?;
            while !scan.empty() {
                kruskal.push(scan.peek());
                scan.advance()?;
            }
            kruskal.finalize();
        }

        // Per-component maximum over the outgoing edges.
        let mut maximas = SimpleShiftMap::<Node>::new(lower, upper);
        let mut inter = std::mem::replace(&mut bundles.inter[bundle], BlockedSequence::new(limits));
        if bundle + 1 < bundles.num_bundles() {
            let mut scan = inter.stream()?;
            while !scan.empty() {
                let edge = scan.peek();
                debug_assert!(lower <= edge.u && edge.u <= upper && upper < edge.v);
                let comp = components.get(edge.u, edge.u);
                maximas.insert_or_max(comp, edge.v);
                scan.advance()?;
            }

            if minimize && inter.len() > 1 {
                // Group the signals by maximum, sources ascending; clusters
                // within one origin interval become a path through it.
                let mut signals = ExternalSorter::<Edge, EdgeByTarget>::new(limits);
                let mut scan = inter.stream()?;
                while !scan.empty() {
                    let edge = scan.peek();
                    let comp = components.get(edge.u, edge.u);
                    let max = maximas.get(comp, comp);
                    debug_assert!(edge.v <= max);
                    if edge.v != max {
                        signals.push(Edge::new(edge.v, max))?;
                    }
                    scan.advance()?;
                }
                signals.sort()?;
                if !Streamer::empty(&signals) {
                    let mut unique = UniqueFilter::new(&mut signals);
                    let first = unique.peek();
                    let mut previous_source = first.u;
                    let mut previous_bundle = bundles.bundle_of(first.u);
                    let mut previous_max = first.v;
                    unique.advance()?;
                    while !unique.empty() {
                        let signal = unique.peek();
                        let source_bundle = bundles.bundle_of(signal.u);
                        if signal.v == previous_max && source_bundle == previous_bundle {
                            // Same maximum, same interval: chain instead.
                            bundles.push(Edge::new(previous_source, signal.u))?;
                        } else {
                            bundles.push(Edge::new(previous_source, previous_max))?;
                        }
                        previous_source = signal.u;
                        previous_bundle = source_bundle;
                        previous_max = signal.v;
                        unique.advance()?;
                    }
                    bundles.push(Edge::new(previous_source, previous_max))?;
                }
            } else {
                let mut scan = inter.stream()?;
                while !scan.empty() {
                    let edge = scan.peek();
                    let comp = components.get(edge.u, edge.u);
                    let max = maximas.get(comp, comp);
                    if edge.v != max {
                        bundles.push(Edge::new(edge.v, max))?;
                    }
                    scan.advance()?;
                }
            }
        } else {
            debug_assert!(inter.is_empty());
        }
        inter.reset();

        // Tree edges downward: every present node hangs off its
        // component's maximum, roots as self-loops.
        let mut node = upper;
        loop {
            if components.contains(node) || maximas.contains(node) {
                let comp = components.get(node, node);
                maximas.insert_or_max(comp, node);
                let max = maximas.get(comp, comp);
                self.tree_pq.push(Edge::new(max, node))?;
            }
            if node == lower {
                break;
            }
            node -= 1;
        }
        Ok(())
    }

    /// Pops the next source group, forwarding its root downward.
    fn step(&mut self) -> io::Result<()> {
        if self.tree_pq.empty() {
            self.current = None;
            return Ok(());
        }
        let top = *self.tree_pq.top();
        let source = top.u;
        let root = top.v;
        self.current = Some(NodeComponent::new(source, root));
        while !self.tree_pq.empty() && self.tree_pq.top().u == source {
            let entry = self.tree_pq.pop()?;
            if entry.u > entry.v {
                self.tree_pq.push(Edge::new(entry.v, root))?;
            }
        }
        Ok(())
    }
}

impl Streamer for SibeynWithBundles {
    type Item = NodeComponent;

    fn empty(&self) -> bool {
        self.current.is_none()
    }

    fn peek(&self) -> NodeComponent {
        match self.current {
            Some(entry) => entry,
            None => panic!("peek past the end of the bundle output"),
        }
    }

    fn advance(&mut self) -> io::Result<()> {
        assert!(!self.empty());
        self.step()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EdgeStream;
    use std::collections::BTreeMap;

    fn solve(edges: &[(u64, u64)], max_id: u64, num_bundles: usize, minimize: bool) -> BTreeMap<u64, u64> {
        let limits = Limits::default();
        let mut stream = EdgeStream::new(&limits);
        for &(u, v) in edges {
            stream.push(Edge::new(u, v)).unwrap();
        }
        stream.consume().unwrap();
        let mut engine =
            SibeynWithBundles::new(&mut stream, max_id, num_bundles, minimize, &limits).unwrap();
        let mut map = BTreeMap::new();
        while !engine.empty() {
            let entry = engine.peek();
            map.insert(entry.node, entry.comp);
            engine.advance().unwrap();
        }
        map
    }

    #[test]
    fn grid_is_one_component() {
        // The canonical 3x3 grid, nodes 1..=9, twelve edges.
        let edges = [
            (1, 2),
            (1, 4),
            (2, 3),
            (2, 5),
            (3, 6),
            (4, 5),
            (4, 7),
            (5, 6),
            (5, 8),
            (6, 9),
            (7, 8),
            (8, 9),
        ];
        for bundles in [1, 2, 4] {
            for minimize in [false, true] {
                let map = solve(&edges, 9, bundles, minimize);
                assert_eq!(map.len(), 9, "bundles {}", bundles);
                let root = map[&1];
                assert!(map.values().all(|&c| c == root), "bundles {}", bundles);
            }
        }
    }

    #[test]
    fn disjoint_pairs_across_bundles() {
        let edges = [(1, 6), (2, 7), (3, 8)];
        for minimize in [false, true] {
            let map = solve(&edges, 8, 4, minimize);
            assert_eq!(map[&1], map[&6]);
            assert_eq!(map[&2], map[&7]);
            assert_eq!(map[&3], map[&8]);
            assert_ne!(map[&1], map[&2]);
            assert_ne!(map[&2], map[&3]);
            assert_eq!(map.len(), 6);
        }
    }

    #[test]
    fn matching_of_six_maps_to_pair_maxima() {
        let map = solve(&[(1, 2), (3, 4), (5, 6)], 6, 3, true);
        assert_eq!(map.len(), 6);
        assert_eq!(map[&1], 2);
        assert_eq!(map[&2], 2);
        assert_eq!(map[&3], 4);
        assert_eq!(map[&5], 6);
    }
}
