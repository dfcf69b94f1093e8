//! Randomized star contraction.

use std::io;

use rand::rngs::SmallRng;

use emcc_storage::{ExternalSorter, Limits, Pushable, Rewind, Streamer};

use crate::graph::{Edge, EdgeByTarget, Node, NodeAsc, NodeComponent, MAX_NODE};
use crate::kruskal::PipelinedKruskal;
use crate::stream::{HitFilter, RandomNeighborPerSource, Split, UniqueFilter};

/// One phase of star contraction over a sorted, rewindable edge stream.
///
/// Each source draws one uniformly random out-neighbor and keeps it with
/// probability one half; a sampled edge whose source is itself some sampled
/// edge's target is dropped, which breaks every chain down to single-hop
/// stars. Survivor edges `(leaf, center)` become the star mapping, centers
/// mapping to themselves, and the input is relabelled through it: sources
/// first, then targets after a by-target sort, normalized, self-loops
/// dropped, duplicates tolerated.
///
/// Returns an upper bound on the surviving node count; in the limit a
/// quarter of the nodes disappear per phase.
pub fn contract_fully_external<I, E, M>(
    input: &mut I,
    contracted_edges: &mut E,
    star_mapping: &mut M,
    rng: &mut SmallRng,
    limits: &Limits,
) -> io::Result<u64>
where
    I: Streamer<Item = Edge> + Rewind,
    E: Pushable<Edge> + ?Sized,
    M: Pushable<NodeComponent> + ?Sized,
{
    contract(input, contracted_edges, star_mapping, rng, limits)
}

/// The semi-external flavor: relabelled edges are pushed straight into a
/// pipelined Kruskal instead of a materialized edge set.
pub fn contract_semi_external<I, M>(
    input: &mut I,
    star_mapping: &mut M,
    kruskal: &mut PipelinedKruskal,
    rng: &mut SmallRng,
    limits: &Limits,
) -> io::Result<u64>
where
    I: Streamer<Item = Edge> + Rewind,
    M: Pushable<NodeComponent> + ?Sized,
{
    contract(input, kruskal, star_mapping, rng, limits)
}

fn contract<I, E, M>(
    input: &mut I,
    contracted_edges: &mut E,
    star_mapping: &mut M,
    rng: &mut SmallRng,
    limits: &Limits,
) -> io::Result<u64>
where
    I: Streamer<Item = Edge> + Rewind,
    E: Pushable<Edge> + ?Sized,
    M: Pushable<NodeComponent> + ?Sized,
{
    // One random out-edge per source, buffered for replay.
    let mut sampled = RandomNeighborPerSource::new(input, 0.5, rng, limits)?;
    let mut node_bound = sampled.num_sources();

    // Collect the sampled targets on the side.
    let mut targets = ExternalSorter::<Node, NodeAsc>::new(limits);
    {
        let mut split = Split::new(&mut sampled, &mut targets, |edge: &Edge| edge.v);
        while !split.empty() {
            split.advance()?;
        }
    }
    sampled.rewind()?;
    targets.sort()?;

    // Break paths: a sampled edge whose source is also a sampled target
    // would chain two hops, so it is dropped.
    let mut targets_unique = UniqueFilter::new(&mut targets);
    let mut star_edges = HitFilter::new(
        &mut sampled,
        &mut targets_unique,
        |edge: &Edge, node: &Node| edge.u <= *node,
        |edge: &Edge, node: &Node| edge.u == *node,
    )?;

    // Pass 1: rewrite sources, emitting the star mapping on the way.
    input.rewind()?;
    let mut by_target = ExternalSorter::<Edge, EdgeByTarget>::new(limits);
    while !input.empty() {
        let edge = input.peek();
        while !star_edges.empty() && star_edges.peek().u < edge.u {
            let star = star_edges.peek();
            star_mapping.push(NodeComponent::new(star.u, star.v))?;
            star_mapping.push(NodeComponent::new(star.v, star.v))?;
            star_edges.advance()?;
        }
        if !star_edges.empty() && star_edges.peek().u == edge.u {
            let center = star_edges.peek().v;
            if center != edge.v {
                by_target.push(Edge::new(center, edge.v))?;
            }
        } else {
            by_target.push(edge)?;
        }
        input.advance()?;
    }
    while !star_edges.empty() {
        let star = star_edges.peek();
        star_mapping.push(NodeComponent::new(star.u, star.v))?;
        star_mapping.push(NodeComponent::new(star.v, star.v))?;
        star_edges.advance()?;
    }
    by_target.sort()?;

    // Pass 2: rewrite targets and hand the edges on.
    star_edges.rewind()?;
    let mut previous_target = MAX_NODE;
    while !Streamer::empty(&by_target) {
        let edge = by_target.peek();
        node_bound += (previous_target != edge.v) as u64;
        previous_target = edge.v;

        while !star_edges.empty() && star_edges.peek().u < edge.v {
            star_edges.advance()?;
        }
        if !star_edges.empty() && star_edges.peek().u == edge.v {
            let center = star_edges.peek().v;
            if center != edge.u {
                contracted_edges.push(Edge::new(edge.u, center).normalized())?;
            }
        } else {
            contracted_edges.push(edge.normalized())?;
        }
        by_target.advance()?;
    }
    Ok(node_bound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ByNode, EdgeLex};
    use crate::stream::checks::only_stars;
    use crate::EdgeStream;
    use rand::SeedableRng;
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

    /// In-memory oracle components of an edge list.
    fn oracle(edges: &[(u64, u64)]) -> BTreeMap<u64, u64> {
        let mut parent = BTreeMap::new();
        fn find(parent: &mut BTreeMap<u64, u64>, u: u64) -> u64 {
            let p = *parent.entry(u).or_insert(u);
            if p == u {
                u
            } else {
                let root = find(parent, p);
                parent.insert(u, root);
                root
            }
        }
        for &(u, v) in edges {
            let ru = find(&mut parent, u);
            let rv = find(&mut parent, v);
            if ru != rv {
                parent.insert(ru, rv);
            }
        }
        let keys: Vec<u64> = parent.keys().copied().collect();
        keys.into_iter()
            .map(|u| {
                let root = find(&mut parent, u);
                (u, root)
            })
            .collect()
    }

    #[test]
    fn contraction_preserves_components() {
        let limits = Limits::default();
        let edges = [
            (1u64, 2u64),
            (1, 4),
            (2, 3),
            (5, 6),
            (6, 7),
            (8, 9),
            (9, 10),
            (10, 11),
        ];
        for seed in 0..10 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let mut input = edge_stream(&edges);
            let mut contracted = ExternalSorter::<Edge, EdgeLex>::new(&limits);
            let mut map = ExternalSorter::<NodeComponent, ByNode>::new(&limits);
            contract_fully_external(&mut input, &mut contracted, &mut map, &mut rng, &limits)
                .unwrap();
            contracted.sort().unwrap();
            map.sort().unwrap();

            // The star map must have star shape.
            let mut unique_map = ExternalSorter::<NodeComponent, ByNode>::new(&limits);
            {
                let mut unique = UniqueFilter::new(&mut map);
                emcc_storage::stream_into(&mut unique, &mut unique_map).unwrap();
            }
            unique_map.sort().unwrap();
            assert!(only_stars(&mut unique_map, &limits).unwrap());

            // Contracting by the stars and re-adding the star edges keeps
            // the component structure intact.
            let mut combined: Vec<(u64, u64)> = Vec::new();
            while !Streamer::empty(&contracted) {
                let e = contracted.peek();
                combined.push((e.u, e.v));
                contracted.advance().unwrap();
            }
            unique_map.rewind().unwrap();
            while !Streamer::empty(&unique_map) {
                let entry = unique_map.peek();
                combined.push((entry.node, entry.comp));
                unique_map.advance().unwrap();
            }
            let lifted = oracle(&combined);
            let original = oracle(&edges);
            // Same partition on the original node set.
            for &(u, v) in &edges {
                assert_eq!(
                    original[&u] == original[&v],
                    lifted[&u] == lifted[&v],
                    "seed {}",
                    seed
                );
            }
            for &(u, _) in &edges {
                for &(w, _) in &edges {
                    assert_eq!(
                        original[&u] == original[&w],
                        lifted[&u] == lifted[&w],
                        "seed {}",
                        seed
                    );
                }
            }
        }
    }
}
