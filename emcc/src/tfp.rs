//! Time-forward processing: propagating roots along contraction trees.

use std::io;

use emcc_storage::{ExternalPq, ExternalSorter, Limits, Pushable, Streamer};

use crate::graph::{Edge, EdgeLex, EdgeLexDesc, NodeComponent, MAX_NODE};

/// Assigns every node of a contraction tree its root.
///
/// `tree` must yield the tree edges oriented larger-to-smaller (parent
/// first); they are re-sorted by decreasing source internally. A priority
/// queue keyed lexicographically carries "your root is r" signals backwards
/// through the scan: popping greatest-first, signals above the current
/// source belong to already-labelled leaves and are dropped, a signal
/// matching the current source names its root, and a source with no signal
/// is a root and is emitted mapped to itself.
///
/// The assignments are delivered sorted by node.
pub fn assign_roots<T, P>(tree: &mut T, out: &mut P, limits: &Limits) -> io::Result<()>
where
    T: Streamer<Item = Edge>,
    P: Pushable<NodeComponent> + ?Sized,
{
    let mut tree_desc = ExternalSorter::<Edge, EdgeLexDesc>::new(limits);
    emcc_storage::stream_into(tree, &mut tree_desc)?;
    tree_desc.sort()?;

    let mut pq = ExternalPq::<Edge, EdgeLex>::new(limits);
    let mut star_sorter = ExternalSorter::<Edge, EdgeLex>::new(limits);
    let mut current_node = MAX_NODE;
    let mut current_root = MAX_NODE;
    while !Streamer::empty(&tree_desc) {
        let edge = tree_desc.peek();
        if edge.u != current_node {
            current_node = edge.u;
            current_root = edge.u;
            while !pq.empty() && pq.top().u > edge.u {
                // Signal for a node that already received its star.
                pq.pop()?;
            }
            if !pq.empty() && pq.top().u == edge.u {
                current_root = pq.pop()?.v;
            }
            if current_node == current_root {
                out.push(NodeComponent::new(current_node, current_node))?;
            }
        }
        let assignment = Edge::new(edge.v, current_root);
        star_sorter.push(assignment)?;
        pq.push(assignment)?;
        tree_desc.advance()?;
    }

    star_sorter.sort()?;
    while !Streamer::empty(&star_sorter) {
        let star = star_sorter.peek();
        out.push(NodeComponent::new(star.u, star.v))?;
        star_sorter.advance()?;
    }
    Ok(())
}

/// Like [`assign_roots`], seeded with the stars of a base case.
///
/// The seeds are both echoed into the output and planted in the signal
/// queue, so a tree joining a seeded node inherits that node's root. Tree
/// sources without seed or signal keep themselves as root but are not
/// re-emitted; their labels come from the seeds or from the edges naming
/// them as children. Assignments are pushed unsorted, as the engine hands
/// them to a sorter anyway.
pub fn assign_roots_with_stars<T, S, P>(
    tree: &mut T,
    stars: &mut S,
    out: &mut P,
    limits: &Limits,
) -> io::Result<()>
where
    T: Streamer<Item = Edge>,
    S: Streamer<Item = NodeComponent>,
    P: Pushable<NodeComponent> + ?Sized,
{
    let mut pq = ExternalPq::<Edge, EdgeLex>::new(limits);
    while !stars.empty() {
        let seed = stars.peek();
        pq.push(Edge::new(seed.node, seed.comp))?;
        out.push(seed)?;
        stars.advance()?;
    }

    let mut tree_desc = ExternalSorter::<Edge, EdgeLexDesc>::new(limits);
    emcc_storage::stream_into(tree, &mut tree_desc)?;
    tree_desc.sort()?;

    let mut current_node = MAX_NODE;
    let mut current_root = MAX_NODE;
    while !Streamer::empty(&tree_desc) {
        let edge = tree_desc.peek();
        if edge.u != current_node {
            current_node = edge.u;
            current_root = edge.u;
            while !pq.empty() && pq.top().u > edge.u {
                pq.pop()?;
            }
            if !pq.empty() && pq.top().u == edge.u {
                current_root = pq.pop()?.v;
            }
        }
        let assignment = Edge::new(edge.v, current_root);
        out.push(NodeComponent::new(assignment.u, assignment.v))?;
        pq.push(assignment)?;
        tree_desc.advance()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ByNode;
    use crate::stream::OrientReverse;
    use crate::EdgeStream;
    use std::collections::BTreeMap;

    fn tree_stream(edges: &[(u64, u64)]) -> EdgeStream {
        let limits = Limits::default();
        let mut stream = EdgeStream::new(&limits);
        for &(u, v) in edges {
            stream.push(Edge::new(u, v)).unwrap();
        }
        stream.consume().unwrap();
        stream
    }

    fn roots_of(tree: &[(u64, u64)]) -> BTreeMap<u64, u64> {
        let limits = Limits::default();
        let mut stream = tree_stream(tree);
        let mut reversed = OrientReverse::new(&mut stream);
        let mut out = ExternalSorter::<NodeComponent, ByNode>::new(&limits);
        assign_roots(&mut reversed, &mut out, &limits).unwrap();
        out.sort().unwrap();
        let mut map = BTreeMap::new();
        while !Streamer::empty(&out) {
            let entry = out.peek();
            map.insert(entry.node, entry.comp);
            out.advance().unwrap();
        }
        map
    }

    #[test]
    fn chain_propagates_to_one_root() {
        // Contraction tree of a path: 1 -> 2 -> 3 -> 4.
        let map = roots_of(&[(1, 2), (2, 3), (3, 4)]);
        assert_eq!(map.len(), 4);
        for node in 1..=4 {
            assert_eq!(map[&node], 4);
        }
    }

    #[test]
    fn two_trees_get_two_roots() {
        let map = roots_of(&[(1, 5), (2, 5), (3, 7), (4, 7)]);
        assert_eq!(map[&1], 5);
        assert_eq!(map[&2], 5);
        assert_eq!(map[&5], 5);
        assert_eq!(map[&3], 7);
        assert_eq!(map[&4], 7);
        assert_eq!(map[&7], 7);
        // One star per distinct node of the tree.
        assert_eq!(map.len(), 6);
    }

    #[test]
    fn seeds_override_fresh_roots() {
        let limits = Limits::default();
        // Tree edge 3 -> 9; the base case already mapped 9 to 4.
        let mut stream = tree_stream(&[(3, 9)]);
        let mut reversed = OrientReverse::new(&mut stream);
        let mut seeds = ExternalSorter::<NodeComponent, ByNode>::new(&limits);
        seeds.push(NodeComponent::new(9, 4)).unwrap();
        seeds.sort().unwrap();

        let mut out = ExternalSorter::<NodeComponent, ByNode>::new(&limits);
        assign_roots_with_stars(&mut reversed, &mut seeds, &mut out, &limits).unwrap();
        out.sort().unwrap();
        let mut map = BTreeMap::new();
        while !Streamer::empty(&out) {
            let entry = out.peek();
            map.insert(entry.node, entry.comp);
            out.advance().unwrap();
        }
        assert_eq!(map[&9], 4);
        assert_eq!(map[&3], 4);
    }
}
