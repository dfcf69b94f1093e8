//! Rewriting edge endpoints through a star mapping.
//!
//! Relabelling is a pair of merge scans: sources against a node-sorted map,
//! then targets after re-sorting the edges by target. The two public
//! pipelines differ deliberately: [`contract_by_stars`] normalizes the
//! rewritten edges and drops self-loops and duplicates, which is what edge
//! sets entering a recursion need, while [`relabel_by_stars`] preserves
//! orientation and self-loops, which consumers of oriented tree edges rely
//! on.

use std::io;

use emcc_storage::{ExternalSorter, Limits, Pushable, Rewind, Streamer};

use crate::graph::{Edge, EdgeByTarget, EdgeLex, NodeComponent};
use crate::stream::UniqueFilter;

/// Rewrites edge sources through a node-sorted component map.
///
/// Both inputs are consumed in one linear scan; rewritten edges that became
/// self-loops are dropped. The output arrives grouped for the follow-up
/// target pass, so `out` is typically a by-target sorter.
pub fn relabel_sources<M, E, P>(map: &mut M, edges: &mut E, out: &mut P) -> io::Result<()>
where
    M: Streamer<Item = NodeComponent>,
    E: Streamer<Item = Edge>,
    P: Pushable<Edge> + ?Sized,
{
    relabel_sources_inner(map, edges, out, |_| Ok(()))
}

/// Like [`relabel_sources`], additionally echoing every map entry into
/// `echo`; the recursive engine uses this to obtain the same map sorted a
/// second way without an extra pass.
pub fn relabel_sources_echo<M, E, P, Q>(
    map: &mut M,
    edges: &mut E,
    out: &mut P,
    echo: &mut Q,
) -> io::Result<()>
where
    M: Streamer<Item = NodeComponent>,
    E: Streamer<Item = Edge>,
    P: Pushable<Edge> + ?Sized,
    Q: Pushable<NodeComponent> + ?Sized,
{
    relabel_sources_inner(map, edges, out, |entry| echo.push(entry))
}

fn relabel_sources_inner<M, E, P>(
    map: &mut M,
    edges: &mut E,
    out: &mut P,
    mut note: impl FnMut(NodeComponent) -> io::Result<()>,
) -> io::Result<()>
where
    M: Streamer<Item = NodeComponent>,
    E: Streamer<Item = Edge>,
    P: Pushable<Edge> + ?Sized,
{
    let mut map = UniqueFilter::new(map);
    while !map.empty() {
        let entry = map.peek();
        note(entry)?;
        while !edges.empty() {
            let edge = edges.peek();
            if edge.u < entry.node {
                out.push(edge)?;
            } else if edge.u == entry.node {
                if entry.comp == edge.v {
                    // The rewrite would close a self-loop.
                    edges.advance()?;
                    continue;
                }
                out.push(Edge::new(entry.comp, edge.v))?;
            } else {
                break;
            }
            edges.advance()?;
        }
        map.advance()?;
    }
    while !edges.empty() {
        out.push(edges.peek())?;
        edges.advance()?;
    }
    Ok(())
}

/// Rewrites edge targets through a node-sorted component map, emitting
/// normalized edges and dropping rewritten self-loops.
///
/// `edges` must arrive sorted by target, typically out of the by-target
/// sorter that [`relabel_sources`] filled.
pub fn relabel_targets<M, E, P>(map: &mut M, edges: &mut E, out: &mut P) -> io::Result<()>
where
    M: Streamer<Item = NodeComponent>,
    E: Streamer<Item = Edge>,
    P: Pushable<Edge> + ?Sized,
{
    let mut map = UniqueFilter::new(map);
    while !map.empty() {
        let entry = map.peek();
        while !edges.empty() {
            let edge = edges.peek();
            if edge.v < entry.node {
                debug_assert!(!edge.is_self_loop());
                out.push(edge.normalized())?;
            } else if edge.v == entry.node {
                if entry.comp == edge.u {
                    edges.advance()?;
                    continue;
                }
                out.push(Edge::new(edge.u, entry.comp).normalized())?;
            } else {
                break;
            }
            edges.advance()?;
        }
        map.advance()?;
    }
    while !edges.empty() {
        out.push(edges.peek().normalized())?;
        edges.advance()?;
    }
    Ok(())
}

/// Rewrites both endpoints of `edges` through the star map `stars`,
/// normalizing, dropping self-loops and deduplicating: the contraction of
/// the edge set by the stars.
pub fn contract_by_stars<E, S, P>(
    edges: &mut E,
    stars: &mut S,
    out: &mut P,
    limits: &Limits,
) -> io::Result<()>
where
    E: Streamer<Item = Edge>,
    S: Streamer<Item = NodeComponent> + Rewind,
    P: Pushable<Edge> + ?Sized,
{
    rewrite_by_stars(edges, stars, out, limits, true)
}

/// Rewrites both endpoints of `edges` through the star map `stars`,
/// keeping orientation and self-loops; only duplicates are suppressed.
///
/// Relabelling a star map by a coarser star map goes through here, and the
/// preserved orientation is what keeps tree edges consumable afterwards.
pub fn relabel_by_stars<E, S, P>(
    edges: &mut E,
    stars: &mut S,
    out: &mut P,
    limits: &Limits,
) -> io::Result<()>
where
    E: Streamer<Item = Edge>,
    S: Streamer<Item = NodeComponent> + Rewind,
    P: Pushable<Edge> + ?Sized,
{
    rewrite_by_stars(edges, stars, out, limits, false)
}

fn rewrite_by_stars<E, S, P>(
    edges: &mut E,
    stars: &mut S,
    out: &mut P,
    limits: &Limits,
    normalize: bool,
) -> io::Result<()>
where
    E: Streamer<Item = Edge>,
    S: Streamer<Item = NodeComponent> + Rewind,
    P: Pushable<Edge> + ?Sized,
{
    // Pass 1: sources, collecting into a by-target sorter.
    let mut by_target = ExternalSorter::<Edge, EdgeByTarget>::new(limits);
    while !edges.empty() {
        let edge = edges.peek();
        while !stars.empty() && stars.peek().node < edge.u {
            stars.advance()?;
        }
        if !stars.empty() && stars.peek().node == edge.u {
            by_target.push(Edge::new(stars.peek().comp, edge.v))?;
        } else {
            by_target.push(edge)?;
        }
        edges.advance()?;
    }
    by_target.sort()?;

    // Pass 2: targets, deduplicating through a lexicographic sorter.
    stars.rewind()?;
    let mut rewritten = ExternalSorter::<Edge, EdgeLex>::new(limits);
    {
        let mut unique = UniqueFilter::new(&mut by_target);
        while !unique.empty() {
            let edge = unique.peek();
            while !stars.empty() && stars.peek().node < edge.v {
                stars.advance()?;
            }
            let mut rewritten_edge = edge;
            if !stars.empty() && stars.peek().node == edge.v {
                rewritten_edge = Edge::new(edge.u, stars.peek().comp);
            }
            if normalize {
                rewritten_edge = rewritten_edge.normalized();
                if !rewritten_edge.is_self_loop() {
                    rewritten.push(rewritten_edge)?;
                }
            } else {
                rewritten.push(rewritten_edge)?;
            }
            unique.advance()?;
        }
    }
    rewritten.sort()?;
    let mut unique = UniqueFilter::new(&mut rewritten);
    emcc_storage::stream_into(&mut unique, out)?;
    stars.rewind()?;
    Ok(())
}
