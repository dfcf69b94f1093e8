//! A pass-through adapter with a side output.

use std::io;

use emcc_storage::{Pushable, Rewind, Streamer};

/// Forwards its input unchanged while pushing a projection of every element
/// into a sink.
///
/// The side output happens exactly once per element, as the element is
/// advanced past on the first pass; after a [`rewind`](Rewind::rewind) the
/// adapter replays without touching the sink again.
pub struct Split<'a, S, P, F> {
    inner: &'a mut S,
    sink: &'a mut P,
    project: F,
    replaying: bool,
}

impl<'a, S, P, F, T> Split<'a, S, P, F>
where
    S: Streamer,
    P: Pushable<T>,
    F: Fn(&S::Item) -> T,
{
    /// Wraps `inner`, mirroring `project(element)` into `sink`.
    pub fn new(inner: &'a mut S, sink: &'a mut P, project: F) -> Self {
        Split {
            inner,
            sink,
            project,
            replaying: false,
        }
    }
}

impl<S, P, F, T> Streamer for Split<'_, S, P, F>
where
    S: Streamer,
    P: Pushable<T>,
    F: Fn(&S::Item) -> T,
{
    type Item = S::Item;

    fn empty(&self) -> bool {
        self.inner.empty()
    }

    fn peek(&self) -> S::Item {
        self.inner.peek()
    }

    fn advance(&mut self) -> io::Result<()> {
        if !self.replaying {
            self.sink.push((self.project)(&self.inner.peek()))?;
        }
        self.inner.advance()
    }
}

impl<S, P, F, T> Rewind for Split<'_, S, P, F>
where
    S: Streamer + Rewind,
    P: Pushable<T>,
    F: Fn(&S::Item) -> T,
{
    fn rewind(&mut self) -> io::Result<()> {
        self.inner.rewind()?;
        self.replaying = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, EdgeLex, Node, NodeAsc};
    use emcc_storage::{ExternalSorter, Limits};

    #[test]
    fn side_output_pushed_once() {
        let limits = Limits::default();
        let mut edges = ExternalSorter::<Edge, EdgeLex>::new(&limits);
        for edge in [Edge::new(1, 4), Edge::new(2, 3)] {
            edges.push(edge).unwrap();
        }
        edges.sort().unwrap();
        let mut targets = ExternalSorter::<Node, NodeAsc>::new(&limits);

        let mut split = Split::new(&mut edges, &mut targets, |e: &Edge| e.v);
        while !split.empty() {
            split.advance().unwrap();
        }
        split.rewind().unwrap();
        let mut replayed = 0;
        while !split.empty() {
            replayed += 1;
            split.advance().unwrap();
        }
        assert_eq!(replayed, 2);

        targets.sort().unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets.peek(), 3);
    }
}
