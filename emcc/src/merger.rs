//! Composition of two star mappings over a shared intermediate universe.

use std::io;

use emcc_storage::{Pushable, Streamer};

use crate::graph::NodeComponent;
use crate::stream::UniqueFilter;

/// Merges the map `left`, sorted by representative, with the map `right`,
/// sorted by node, into their composition.
///
/// For a left entry `(u, v)` whose representative `v` appears as a node of
/// some right entry `(v, w)`, the output contains `(u, w)`; left entries
/// whose representative the right map does not mention pass through
/// unchanged, and every right entry is emitted as well. Both inputs are
/// deduplicated on the fly; the caller sorts the pushed output.
pub fn merge_components<L, R, P>(left: &mut L, right: &mut R, out: &mut P) -> io::Result<()>
where
    L: Streamer<Item = NodeComponent>,
    R: Streamer<Item = NodeComponent>,
    P: Pushable<NodeComponent> + ?Sized,
{
    let mut left = UniqueFilter::new(left);
    let mut right = UniqueFilter::new(right);

    while !right.empty() {
        let refine = right.peek();
        out.push(refine)?;
        while !left.empty() {
            let entry = left.peek();
            if entry.comp < refine.node {
                out.push(entry)?;
            } else if entry.comp == refine.node {
                out.push(NodeComponent::new(entry.node, refine.comp))?;
            } else {
                break;
            }
            left.advance()?;
        }
        right.advance()?;
    }

    while !left.empty() {
        out.push(left.peek())?;
        left.advance()?;
    }
    Ok(())
}
