//! Priority-queue contraction of the smallest-ID nodes.

use std::io;

use emcc_storage::{BlockedSequence, ExternalPq, Limits, Pushable, Streamer};

use crate::graph::{Edge, MinSourceMaxTarget, NodeComponent, MAX_NODE, MIN_NODE};
use crate::kruskal::PipelinedKruskal;
use crate::stream::{EdgeStream, OrientReverse};
use crate::tfp;

/// Contracts up to `goal` smallest-ID sources of a sorted edge stream.
///
/// The queue is keyed so its top carries the minimum unfinished source with
/// the maximum target. For each current source the input neighbors (already
/// grouped) and the queued signals are gathered; the farthest of them
/// becomes the tree parent, the tree edge `(u, v*)` is pushed, and every
/// other neighbor `w` is re-linked by a signal `(w, v*)`, skipping
/// self-loops. Signals always name sources above the current one, so the
/// queue drains front-to-back.
///
/// Whatever the pass did not consume — the remaining input and the
/// remaining signals, each deduplicated within itself but not across the
/// two — is flushed into `leftover`. Returns the number of contracted
/// sources, which falls short of `goal` only when the input runs dry.
pub fn run_sibeyn<I, T, L>(
    input: &mut I,
    goal: u64,
    tree: &mut T,
    leftover: &mut L,
    limits: &Limits,
) -> io::Result<u64>
where
    I: Streamer<Item = Edge>,
    T: Pushable<Edge> + ?Sized,
    L: Pushable<Edge> + ?Sized,
{
    let mut pq = ExternalPq::<Edge, MinSourceMaxTarget>::new(limits);
    let mut neighbors = BlockedSequence::<u64>::new(limits);
    let mut contracted = 0u64;

    while contracted < goal && (!pq.empty() || !input.empty()) {
        let source_input = if input.empty() { MAX_NODE } else { input.peek().u };
        let source_signal = if pq.empty() { MAX_NODE } else { pq.top().u };
        let source = source_input.min(source_signal);
        debug_assert!(source < MAX_NODE);

        // Gather the input neighborhood; targets arrive ascending, so the
        // last one is the input-side contraction candidate.
        neighbors.reset();
        let mut candidate_input = MIN_NODE;
        while !input.empty() && input.peek().u == source {
            let target = input.peek().v;
            debug_assert!(source <= target);
            neighbors.push(target)?;
            candidate_input = candidate_input.max(target);
            input.advance()?;
        }

        // The first queued signal for this source has the highest target.
        let candidate_signal = if !pq.empty() && pq.top().u == source {
            pq.top().v
        } else {
            MIN_NODE
        };

        let target = candidate_input.max(candidate_signal);
        tree.push(Edge::new(source, target))?;

        // Re-link the input neighborhood.
        let mut input_neighbors = neighbors.stream()?;
        while !input_neighbors.empty() {
            let w = input_neighbors.peek();
            if w != target {
                debug_assert!(source < w && w < target);
                pq.push(Edge::new(w, target))?;
            }
            input_neighbors.advance()?;
        }

        // Re-link the queued signals, deduplicating consecutive equals.
        let mut previous = MAX_NODE;
        while !pq.empty() && pq.top().u == source {
            let w = pq.pop()?.v;
            if w == previous {
                continue;
            }
            previous = w;
            if w != target {
                pq.push(Edge::new(w, target))?;
            }
        }

        contracted += 1;
    }
    neighbors.reset();

    // Leftovers: unprocessed input first, then the surviving signals.
    while !input.empty() {
        leftover.push(input.peek())?;
        input.advance()?;
    }
    let mut previous = Edge::new(MIN_NODE, MAX_NODE);
    while !pq.empty() {
        let signal = pq.pop()?;
        debug_assert!(signal.u <= signal.v);
        if signal != previous {
            leftover.push(signal)?;
            previous = signal;
        }
    }
    Ok(contracted)
}

/// Fully external contraction: contracted edges out, star mapping out.
///
/// The leftover edge set lands unsorted in `contracted_edges` (the caller
/// sorts); the tree is replayed through time-forward processing to produce
/// the star mapping of every contracted node.
pub fn contract_fully_external<I, E, M>(
    input: &mut I,
    goal: u64,
    contracted_edges: &mut E,
    star_mapping: &mut M,
    limits: &Limits,
) -> io::Result<u64>
where
    I: Streamer<Item = Edge>,
    E: Pushable<Edge> + ?Sized,
    M: Pushable<NodeComponent> + ?Sized,
{
    let mut tree = EdgeStream::new(limits);
    let contracted = run_sibeyn(input, goal, &mut tree, contracted_edges, limits)?;
    tree.consume()?;
    let mut reversed = OrientReverse::new(&mut tree);
    tfp::assign_roots(&mut reversed, star_mapping, limits)?;
    Ok(contracted)
}

/// Semi-external contraction: the leftover edges are piped straight into a
/// pipelined Kruskal instead of being materialized.
pub fn contract_semi_external<I, M>(
    input: &mut I,
    goal: u64,
    star_mapping: &mut M,
    kruskal: &mut PipelinedKruskal,
    limits: &Limits,
) -> io::Result<u64>
where
    I: Streamer<Item = Edge>,
    M: Pushable<NodeComponent> + ?Sized,
{
    let mut tree = EdgeStream::new(limits);
    let contracted = run_sibeyn(input, goal, &mut tree, kruskal, limits)?;
    tree.consume()?;
    let mut reversed = OrientReverse::new(&mut tree);
    tfp::assign_roots(&mut reversed, star_mapping, limits)?;
    Ok(contracted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ByNode, EdgeLex};
    use emcc_storage::ExternalSorter;
    use std::collections::BTreeMap;

    fn edge_stream(edges: &[(u64, u64)]) -> EdgeStream {
        let limits = Limits::default();
        let mut stream = EdgeStream::new(&limits);
        for &(u, v) in edges {
            stream.push(Edge::new(u, v)).unwrap();
        }
        stream.consume().unwrap();
        stream
    }

    #[test]
    fn path_contracts_front_to_back() {
        let limits = Limits::default();
        let mut input = edge_stream(&[(1, 2), (2, 3), (3, 4), (4, 5)]);
        let mut tree = EdgeStream::new(&limits);
        let mut leftover = Vec::new();
        struct Sink<'a>(&'a mut Vec<Edge>);
        impl Pushable<Edge> for Sink<'_> {
            fn push(&mut self, item: Edge) -> io::Result<()> {
                self.0.push(item);
                Ok(())
            }
        }
        let contracted =
            run_sibeyn(&mut input, 2, &mut tree, &mut Sink(&mut leftover), &limits).unwrap();
        assert_eq!(contracted, 2);
        tree.consume().unwrap();
        assert_eq!(tree.peek(), Edge::new(1, 2));
        tree.advance().unwrap();
        assert_eq!(tree.peek(), Edge::new(2, 3));
        // The rest of the path survives untouched.
        assert!(leftover.contains(&Edge::new(3, 4)));
        assert!(leftover.contains(&Edge::new(4, 5)));
    }

    #[test]
    fn full_contraction_labels_whole_component() {
        let limits = Limits::default();
        // A star around 1 plus an unrelated pair far away.
        let mut input = edge_stream(&[(1, 2), (1, 3), (1, 4), (8, 9)]);
        let mut contracted_edges = ExternalSorter::<Edge, EdgeLex>::new(&limits);
        let mut map = ExternalSorter::<NodeComponent, ByNode>::new(&limits);
        contract_fully_external(&mut input, 10, &mut contracted_edges, &mut map, &limits)
            .unwrap();
        map.sort().unwrap();
        let mut labels = BTreeMap::new();
        while !Streamer::empty(&map) {
            let entry = map.peek();
            labels.insert(entry.node, entry.comp);
            map.advance().unwrap();
        }
        // Everything hanging off 1 ends at the same root, 8 and 9 at theirs.
        let star_root = labels[&1];
        assert_eq!(labels[&2], star_root);
        assert_eq!(labels[&3], star_root);
        assert_eq!(labels[&4], star_root);
        assert_eq!(labels[&8], labels[&9]);
        contracted_edges.sort().unwrap();
        assert!(Streamer::empty(&contracted_edges));
    }
}
