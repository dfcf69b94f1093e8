//! Boolean predicates for the structural stream invariants.
//!
//! These rewind their arguments after checking, so they can be sprinkled
//! into debug assertions without disturbing a pipeline.

use std::io;

use emcc_storage::{ExternalSorter, Limits, Rewind, SortOrder, Streamer};

use crate::graph::{Edge, NodeAsc, NodeComponent, MIN_NODE};
use crate::stream::UniqueFilter;

/// `true` iff `stream` is sorted under `O`, allowing equal neighbors.
pub fn is_sorted<S, O>(stream: &mut S) -> io::Result<bool>
where
    S: Streamer<Item = Edge> + Rewind,
    O: SortOrder<Edge>,
{
    let mut previous = O::min_value();
    let mut sorted = true;
    while !stream.empty() {
        let edge = stream.peek();
        if O::less(&edge, &previous) {
            sorted = false;
            break;
        }
        previous = edge;
        stream.advance()?;
    }
    stream.rewind()?;
    Ok(sorted)
}

/// `true` iff the two sorted edge streams share no source.
pub fn disjoint_sources<A, B>(first: &mut A, second: &mut B) -> io::Result<bool>
where
    A: Streamer<Item = Edge> + Rewind,
    B: Streamer<Item = Edge> + Rewind,
{
    let mut disjoint = true;
    while !first.empty() && !second.empty() {
        let a = first.peek();
        let b = second.peek();
        if a.u == b.u {
            disjoint = false;
            break;
        } else if (a.u, a.v) <= (b.u, b.v) {
            first.advance()?;
        } else {
            second.advance()?;
        }
    }
    first.rewind()?;
    second.rewind()?;
    Ok(disjoint)
}

/// `true` iff a node-sorted component map has star shape: keys are unique,
/// every representative is one of the keys, and representatives map to
/// themselves.
pub fn only_stars<S>(map: &mut S, limits: &Limits) -> io::Result<bool>
where
    S: Streamer<Item = NodeComponent> + Rewind,
{
    // Collect the representatives, then scan both sorted sets in lockstep.
    let mut reps = ExternalSorter::<u64, NodeAsc>::new(limits);
    let mut previous = MIN_NODE;
    let mut shape = true;
    let mut first = true;
    while !map.empty() {
        let entry = map.peek();
        if !first && entry.node <= previous {
            shape = false;
            break;
        }
        first = false;
        previous = entry.node;
        reps.push(entry.comp)?;
        map.advance()?;
    }
    map.rewind()?;
    if !shape {
        return Ok(false);
    }

    reps.sort()?;
    let mut reps_unique = UniqueFilter::new(&mut reps);
    while !reps_unique.empty() {
        let rep = reps_unique.peek();
        while !map.empty() && map.peek().node < rep {
            map.advance()?;
        }
        if map.empty() || map.peek().node != rep || map.peek().comp != rep {
            shape = false;
            break;
        }
        reps_unique.advance()?;
    }
    map.rewind()?;
    Ok(shape)
}
