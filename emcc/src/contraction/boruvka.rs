//! One fully external Borůvka phase.
//!
//! Every node picks its minimum neighbor, which partitions the graph into
//! pseudo-trees: pointer trees whose root pair chose each other. The root
//! is fixed deterministically as the larger endpoint of the mutual pair,
//! and representative labels flow root-to-leaves by a rank-and-ship scan:
//! each pointer edge is assigned its position in the unordered-sorted edge
//! list, the child's outgoing edges are shipped to that position, and a
//! priority queue keyed by the unordered edge (least first) always holds
//! the pending label for exactly the next scanned edge.

use std::io;

use emcc_storage::{
    BlockedSequence, ExternalPq, ExternalSorter, Limits, Pushable, Rewind, SortOrder, Streamer,
};

use crate::graph::{
    ByComponent, ByNode, ByRank, Edge, EdgeLex, EdgeUnordered, EdgeUnorderedDesc, Node, NodeAsc,
    NodeComponent, NodePos, NodePosAsc, RankedEdge, EdgeByTarget, MAX_NODE,
};
use crate::relabel;
use crate::stream::UniqueFilter;

/// A pending "your representative is `rep`" message, prioritized by the
/// pointer edge it travels along.
#[derive(Copy, Clone, PartialEq, Eq, Debug, serde::Serialize, serde::Deserialize)]
struct ReprMsg {
    target: Node,
    rep: Node,
    prio: Edge,
}

/// Messages ordered so the least unordered priority edge pops first.
struct ByPrio;

impl SortOrder<ReprMsg> for ByPrio {
    fn cmp(a: &ReprMsg, b: &ReprMsg) -> std::cmp::Ordering {
        EdgeUnorderedDesc::cmp(&a.prio, &b.prio)
    }
    fn min_value() -> ReprMsg {
        ReprMsg {
            target: MAX_NODE,
            rep: MAX_NODE,
            prio: EdgeUnorderedDesc::min_value(),
        }
    }
    fn max_value() -> ReprMsg {
        ReprMsg {
            target: 0,
            rep: 0,
            prio: EdgeUnorderedDesc::max_value(),
        }
    }
}

/// Runs one Borůvka phase over a sorted, rewindable edge stream.
///
/// `contracted_edges` receives the input relabelled through the computed
/// map (normalized, self-loops dropped, still to be sorted by the caller);
/// `star_mapping` receives `(node, representative)` for every node of the
/// input. Returns the number of pseudo-trees, an upper bound on the nodes
/// of the contracted graph.
pub fn contract_fully_external<I, E, M>(
    input: &mut I,
    contracted_edges: &mut E,
    star_mapping: &mut M,
    limits: &Limits,
) -> io::Result<u64>
where
    I: Streamer<Item = Edge> + Rewind,
    E: Pushable<Edge> + ?Sized,
    M: Pushable<NodeComponent> + ?Sized,
{
    assert!(!input.empty());

    // Symmetrize and sort, so each node's first listed target is minimal.
    let mut bidirected = ExternalSorter::<Edge, EdgeLex>::new(limits);
    while !input.empty() {
        let edge = input.peek();
        bidirected.push(edge)?;
        bidirected.push(edge.reversed())?;
        input.advance()?;
    }
    bidirected.sort()?;

    // One pointer edge (chosen, chooser) per node.
    let mut pointers = ExternalSorter::<Edge, EdgeUnordered>::new(limits);
    let mut last_source = MAX_NODE;
    while !Streamer::empty(&bidirected) {
        let edge = bidirected.peek();
        if edge.u != last_source {
            pointers.push(Edge::new(edge.v, edge.u))?;
            last_source = edge.u;
        }
        bidirected.advance()?;
    }
    bidirected.clear();
    pointers.sort()?;

    // Mutual pairs root a pseudo-tree at their larger endpoint; the pair
    // collapses to the single edge (root, other), so the root's subtree
    // hangs off an edge keyed by the root. Everything else passes through.
    let mut forest = BlockedSequence::<Edge>::new(limits);
    let mut forest_lex = ExternalSorter::<Edge, EdgeLex>::new(limits);
    let mut roots = ExternalSorter::<Node, NodeAsc>::new(limits);
    let mut pending: Option<Edge> = None;
    while !Streamer::empty(&pointers) {
        let edge = pointers.peek();
        match pending {
            Some(previous) if previous.unordered() == edge.unordered() => {
                let (other, root) = previous.unordered();
                roots.push(root)?;
                let collapsed = Edge::new(root, other);
                forest.push(collapsed)?;
                forest_lex.push(collapsed)?;
                pending = None;
            }
            Some(previous) => {
                forest.push(previous)?;
                forest_lex.push(previous)?;
                pending = Some(edge);
            }
            None => pending = Some(edge),
        }
        pointers.advance()?;
    }
    if let Some(previous) = pending {
        forest.push(previous)?;
        forest_lex.push(previous)?;
    }
    pointers.clear();
    roots.sort()?;
    forest_lex.sort()?;
    let tree_count = roots.len();
    debug_assert!(tree_count > 0);

    // Ship every node's outgoing pointer edges to the position where the
    // node learns its representative.
    let mut positions = ExternalSorter::<NodePos, NodePosAsc>::new(limits);
    {
        let mut scan = forest.stream()?;
        let mut pos = 0u64;
        while !scan.empty() {
            positions.push(NodePos {
                node: scan.peek().v,
                pos,
            })?;
            pos += 1;
            scan.advance()?;
        }
    }
    positions.sort()?;

    let mut shipped = ExternalSorter::<RankedEdge, ByRank>::new(limits);
    while !Streamer::empty(&positions) {
        let NodePos { node, pos } = positions.peek();
        while !Streamer::empty(&forest_lex) && forest_lex.peek().u < node {
            forest_lex.advance()?;
        }
        while !Streamer::empty(&forest_lex) && forest_lex.peek().u == node {
            let edge = forest_lex.peek();
            shipped.push(RankedEdge {
                u: edge.u,
                v: edge.v,
                rank: pos,
            })?;
            forest_lex.advance()?;
        }
        positions.advance()?;
    }
    positions.clear();
    shipped.sort()?;

    // Seed the label queue with the children of every root, then scan the
    // forest in unordered order: the queue top labels the current edge's
    // chooser, whose own children are shipped right behind it.
    let mut labels = ExternalSorter::<NodeComponent, ByNode>::new(limits);
    let mut pq = ExternalPq::<ReprMsg, ByPrio>::new(limits);
    forest_lex.rewind()?;
    while !Streamer::empty(&roots) {
        let root = roots.peek();
        labels.push(NodeComponent::new(root, root))?;
        while !Streamer::empty(&forest_lex) && forest_lex.peek().u < root {
            forest_lex.advance()?;
        }
        debug_assert!(!Streamer::empty(&forest_lex) && forest_lex.peek().u == root);
        while !Streamer::empty(&forest_lex) && forest_lex.peek().u == root {
            let edge = forest_lex.peek();
            pq.push(ReprMsg {
                target: edge.v,
                rep: root,
                prio: edge,
            })?;
            forest_lex.advance()?;
        }
        roots.advance()?;
    }
    forest_lex.clear();
    roots.clear();

    {
        let mut scan = forest.stream()?;
        let mut rank = 0u64;
        while !scan.empty() {
            let edge = scan.peek();
            let message = pq.pop()?;
            debug_assert_eq!(message.prio.unordered(), edge.unordered());
            labels.push(NodeComponent::new(message.target, message.rep))?;
            while !Streamer::empty(&shipped) && shipped.peek().rank == rank {
                let child = shipped.peek();
                pq.push(ReprMsg {
                    target: child.v,
                    rep: message.rep,
                    prio: Edge::new(child.u, child.v),
                })?;
                shipped.advance()?;
            }
            rank += 1;
            scan.advance()?;
        }
    }
    debug_assert!(pq.empty());
    shipped.clear();
    forest.reset();
    labels.sort()?;

    // Relabel the original edges through the fresh map, and emit the map.
    input.rewind()?;
    let mut by_target = ExternalSorter::<Edge, EdgeByTarget>::new(limits);
    relabel::relabel_sources(&mut labels, input, &mut by_target)?;
    by_target.sort()?;
    labels.rewind()?;
    {
        let mut updated = UniqueFilter::new(&mut by_target);
        relabel::relabel_targets(&mut labels, &mut updated, contracted_edges)?;
    }
    by_target.clear();

    labels.rewind()?;
    while !Streamer::empty(&labels) {
        star_mapping.push(labels.peek())?;
        labels.advance()?;
    }
    Ok(tree_count)
}

/// Chains up to three Borůvka phases, composing the maps and stopping as
/// soon as the edge set empties; expected contraction is one eighth.
pub fn contract_kkt<I, E, M>(
    input: &mut I,
    contracted_edges: &mut E,
    star_mapping: &mut M,
    limits: &Limits,
) -> io::Result<u64>
where
    I: Streamer<Item = Edge> + Rewind,
    E: Pushable<Edge> + ?Sized,
    M: Pushable<NodeComponent> + ?Sized,
{
    if input.empty() {
        return Ok(0);
    }

    let mut first_edges = ExternalSorter::<Edge, EdgeLex>::new(limits);
    let mut first_map = ExternalSorter::<NodeComponent, ByNode>::new(limits);
    let mut bound = contract_fully_external(input, &mut first_edges, &mut first_map, limits)?;
    first_edges.sort()?;
    first_map.sort()?;

    if Streamer::empty(&first_edges) {
        emcc_storage::stream_into(&mut first_map, star_mapping)?;
        return Ok(bound);
    }

    let mut second_edges = ExternalSorter::<Edge, EdgeLex>::new(limits);
    let mut second_map = ExternalSorter::<NodeComponent, ByNode>::new(limits);
    {
        let mut unique = UniqueFilter::new(&mut first_edges);
        bound = contract_fully_external(&mut unique, &mut second_edges, &mut second_map, limits)?;
    }
    second_edges.sort()?;
    second_map.sort()?;

    // Re-sort the first map by representative for merging.
    let mut first_by_comp = ExternalSorter::<NodeComponent, ByComponent>::new(limits);
    emcc_storage::stream_into(&mut first_map, &mut first_by_comp)?;
    first_by_comp.sort()?;
    first_map.clear();

    if Streamer::empty(&second_edges) {
        crate::merger::merge_components(&mut first_by_comp, &mut second_map, star_mapping)?;
        return Ok(bound);
    }

    let mut third_map = ExternalSorter::<NodeComponent, ByNode>::new(limits);
    {
        let mut unique = UniqueFilter::new(&mut second_edges);
        bound = contract_fully_external(&mut unique, contracted_edges, &mut third_map, limits)?;
    }
    third_map.sort()?;

    let mut second_by_comp = ExternalSorter::<NodeComponent, ByComponent>::new(limits);
    emcc_storage::stream_into(&mut second_map, &mut second_by_comp)?;
    second_by_comp.sort()?;
    second_map.clear();

    let mut second_third = ExternalSorter::<NodeComponent, ByNode>::new(limits);
    crate::merger::merge_components(&mut second_by_comp, &mut third_map, &mut second_third)?;
    second_third.sort()?;

    crate::merger::merge_components(&mut first_by_comp, &mut second_third, star_mapping)?;
    Ok(bound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EdgeStream;
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

    fn run(edges: &[(u64, u64)]) -> (Vec<Edge>, BTreeMap<u64, u64>, u64) {
        let limits = Limits::default();
        let mut input = edge_stream(edges);
        let mut out = ExternalSorter::<Edge, EdgeLex>::new(&limits);
        let mut map = ExternalSorter::<NodeComponent, ByNode>::new(&limits);
        let bound = contract_fully_external(&mut input, &mut out, &mut map, &limits).unwrap();
        out.sort().unwrap();
        map.sort().unwrap();
        let mut edges_out = Vec::new();
        while !Streamer::empty(&out) {
            edges_out.push(out.peek());
            out.advance().unwrap();
        }
        let mut labels = BTreeMap::new();
        while !Streamer::empty(&map) {
            let entry = map.peek();
            labels.insert(entry.node, entry.comp);
            map.advance().unwrap();
        }
        (edges_out, labels, bound)
    }

    #[test]
    fn matching_contracts_to_nothing() {
        let (edges, labels, bound) = run(&[(1, 2), (3, 4), (5, 6)]);
        assert!(edges.is_empty());
        assert_eq!(bound, 3);
        assert_eq!(labels.len(), 6);
        // The larger endpoint of each pair is the deterministic root.
        assert_eq!(labels[&1], 2);
        assert_eq!(labels[&2], 2);
        assert_eq!(labels[&3], 4);
        assert_eq!(labels[&5], 6);
    }

    #[test]
    fn path_contracts_to_single_component() {
        let (edges, labels, _) = run(&[(1, 2), (2, 3), (3, 4), (4, 5)]);
        assert!(edges.is_empty());
        let root = labels[&1];
        assert!(labels.values().all(|&c| c == root));
        assert_eq!(labels.len(), 5);
    }

    #[test]
    fn two_pseudo_trees_keep_their_bridge() {
        // {1,2,3,9} chain onto the mutual pair {1,2}; {7,8} form their own
        // pair. The surviving edges join the two representatives.
        let (edges, labels, bound) = run(&[
            (1, 2),
            (1, 3),
            (2, 3),
            (2, 9),
            (7, 8),
            (7, 9),
            (8, 9),
        ]);
        assert_eq!(bound, 2);
        let left = labels[&1];
        let right = labels[&7];
        assert_ne!(left, right);
        assert_eq!(left, 2);
        assert_eq!(right, 8);
        assert_eq!(labels[&3], left);
        assert_eq!(labels[&9], left);
        assert_eq!(labels[&8], right);
        assert_eq!(edges, vec![Edge::new(2, 8)]);
    }

    #[test]
    fn kkt_chain_on_long_path() {
        let limits = Limits::default();
        let pairs: Vec<(u64, u64)> = (1..64).map(|u| (u, u + 1)).collect();
        let mut input = edge_stream(&pairs);
        let mut out = ExternalSorter::<Edge, EdgeLex>::new(&limits);
        let mut map = ExternalSorter::<NodeComponent, ByNode>::new(&limits);
        contract_kkt(&mut input, &mut out, &mut map, &limits).unwrap();
        map.sort().unwrap();
        let mut labels: BTreeMap<u64, u64> = BTreeMap::new();
        while !Streamer::empty(&map) {
            let entry = map.peek();
            labels.entry(entry.node).or_insert(entry.comp);
            map.advance().unwrap();
        }
        assert_eq!(labels.len(), 64);
    }

    #[test]
    fn kkt_merges_maps_across_phases() {
        // Phase one collapses the two pseudo-trees, phase two joins their
        // representatives through the surviving bridge edge.
        let limits = Limits::default();
        let mut input = edge_stream(&[(1, 2), (1, 3), (2, 3), (2, 9), (7, 8), (7, 9), (8, 9)]);
        let mut out = ExternalSorter::<Edge, EdgeLex>::new(&limits);
        let mut map = ExternalSorter::<NodeComponent, ByNode>::new(&limits);
        contract_kkt(&mut input, &mut out, &mut map, &limits).unwrap();
        map.sort().unwrap();
        let mut labels: BTreeMap<u64, u64> = BTreeMap::new();
        while !Streamer::empty(&map) {
            let entry = map.peek();
            labels.entry(entry.node).or_insert(entry.comp);
            map.advance().unwrap();
        }
        let root = labels[&1];
        assert_eq!(labels.len(), 6);
        assert!(labels.values().all(|&c| c == root));
    }
}
