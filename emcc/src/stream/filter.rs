//! Deduplicating and subtracting stream adapters.

use std::io;

use emcc_storage::{Rewind, Streamer};

/// Drops consecutive equal elements of a sorted stream.
///
/// The adapter is positioned on the first element of each run of equals;
/// advancing skips the rest of the run. Order is otherwise preserved.
pub struct UniqueFilter<'a, S> {
    inner: &'a mut S,
}

impl<'a, S> UniqueFilter<'a, S>
where
    S: Streamer,
    S::Item: PartialEq,
{
    /// Wraps `inner`, which must already be positioned at its start.
    pub fn new(inner: &'a mut S) -> Self {
        UniqueFilter { inner }
    }
}

impl<S> Streamer for UniqueFilter<'_, S>
where
    S: Streamer,
    S::Item: PartialEq,
{
    type Item = S::Item;

    fn empty(&self) -> bool {
        self.inner.empty()
    }

    fn peek(&self) -> S::Item {
        self.inner.peek()
    }

    fn advance(&mut self) -> io::Result<()> {
        let previous = self.inner.peek();
        loop {
            self.inner.advance()?;
            if self.inner.empty() || self.inner.peek() != previous {
                return Ok(());
            }
        }
    }
}

impl<S> Rewind for UniqueFilter<'_, S>
where
    S: Streamer + Rewind,
    S::Item: PartialEq,
{
    fn rewind(&mut self) -> io::Result<()> {
        self.inner.rewind()
    }
}

/// Drops runs of elements equivalent under a caller-supplied predicate,
/// keeping the first of each run.
pub struct ConsecutiveFilter<'a, S, F> {
    inner: &'a mut S,
    same: F,
}

impl<'a, S, F> ConsecutiveFilter<'a, S, F>
where
    S: Streamer,
    F: Fn(&S::Item, &S::Item) -> bool,
{
    /// Wraps `inner` with the equivalence `same`.
    pub fn new(inner: &'a mut S, same: F) -> Self {
        ConsecutiveFilter { inner, same }
    }
}

impl<S, F> Streamer for ConsecutiveFilter<'_, S, F>
where
    S: Streamer,
    F: Fn(&S::Item, &S::Item) -> bool,
{
    type Item = S::Item;

    fn empty(&self) -> bool {
        self.inner.empty()
    }

    fn peek(&self) -> S::Item {
        self.inner.peek()
    }

    fn advance(&mut self) -> io::Result<()> {
        let previous = self.inner.peek();
        loop {
            self.inner.advance()?;
            if self.inner.empty() || !(self.same)(&previous, &self.inner.peek()) {
                return Ok(());
            }
        }
    }
}

impl<S, F> Rewind for ConsecutiveFilter<'_, S, F>
where
    S: Streamer + Rewind,
    F: Fn(&S::Item, &S::Item) -> bool,
{
    fn rewind(&mut self) -> io::Result<()> {
        self.inner.rewind()
    }
}

/// Subtracts a sorted hit list from a sorted stream in one linear scan.
///
/// `less_equal` and `equal` relate stream elements to hits; both streams
/// must be sorted consistently with them. An element is suppressed iff some
/// hit tests `equal` against it.
pub struct HitFilter<'a, S, H, LE, EQ> {
    input: &'a mut S,
    hits: &'a mut H,
    less_equal: LE,
    equal: EQ,
}

impl<'a, S, H, LE, EQ> HitFilter<'a, S, H, LE, EQ>
where
    S: Streamer,
    H: Streamer,
    LE: Fn(&S::Item, &H::Item) -> bool,
    EQ: Fn(&S::Item, &H::Item) -> bool,
{
    /// Wraps `input`, suppressing elements matched by `hits`.
    pub fn new(input: &'a mut S, hits: &'a mut H, less_equal: LE, equal: EQ) -> io::Result<Self> {
        let mut filter = HitFilter {
            input,
            hits,
            less_equal,
            equal,
        };
        filter.settle()?;
        Ok(filter)
    }

    /// Advances past suppressed elements until the front is emittable.
    fn settle(&mut self) -> io::Result<()> {
        while !self.input.empty() {
            let current = self.input.peek();
            while !self.hits.empty() && !(self.less_equal)(&current, &self.hits.peek()) {
                self.hits.advance()?;
            }
            if !self.hits.empty() && (self.equal)(&current, &self.hits.peek()) {
                self.input.advance()?;
                continue;
            }
            break;
        }
        Ok(())
    }
}

impl<S, H, LE, EQ> Streamer for HitFilter<'_, S, H, LE, EQ>
where
    S: Streamer,
    H: Streamer,
    LE: Fn(&S::Item, &H::Item) -> bool,
    EQ: Fn(&S::Item, &H::Item) -> bool,
{
    type Item = S::Item;

    fn empty(&self) -> bool {
        self.input.empty()
    }

    fn peek(&self) -> S::Item {
        self.input.peek()
    }

    fn advance(&mut self) -> io::Result<()> {
        self.input.advance()?;
        self.settle()
    }
}

impl<S, H, LE, EQ> Rewind for HitFilter<'_, S, H, LE, EQ>
where
    S: Streamer + Rewind,
    H: Streamer + Rewind,
    LE: Fn(&S::Item, &H::Item) -> bool,
    EQ: Fn(&S::Item, &H::Item) -> bool,
{
    fn rewind(&mut self) -> io::Result<()> {
        self.input.rewind()?;
        self.hits.rewind()?;
        self.settle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, EdgeLex, NodeAsc};
    use emcc_storage::{ExternalSorter, Limits};

    fn drain<S: Streamer>(stream: &mut S) -> Vec<S::Item> {
        let mut result = Vec::new();
        while !stream.empty() {
            result.push(stream.peek());
            stream.advance().unwrap();
        }
        result
    }

    #[test]
    fn unique_drops_runs() {
        let limits = Limits::default();
        let mut sorter = ExternalSorter::<u64, crate::graph::NodeAsc>::new(&limits);
        for value in [1u64, 1, 2, 3, 3, 3, 9] {
            sorter.push(value).unwrap();
        }
        sorter.sort().unwrap();
        let mut unique = UniqueFilter::new(&mut sorter);
        assert_eq!(drain(&mut unique), vec![1, 2, 3, 9]);
    }

    #[test]
    fn consecutive_filter_keeps_first_of_run() {
        let limits = Limits::default();
        let mut sorter = ExternalSorter::<Edge, EdgeLex>::new(&limits);
        for edge in [Edge::new(1, 2), Edge::new(2, 1), Edge::new(2, 3)] {
            sorter.push(edge).unwrap();
        }
        sorter.sort().unwrap();
        // Orientation-blind equivalence: (1,2) and (2,1) form one run.
        let mut filtered =
            ConsecutiveFilter::new(&mut sorter, |a: &Edge, b: &Edge| a.unordered() == b.unordered());
        assert_eq!(drain(&mut filtered), vec![Edge::new(1, 2), Edge::new(2, 3)]);
    }

    #[test]
    fn hit_filter_subtracts() {
        let limits = Limits::default();
        let mut edges = ExternalSorter::<Edge, EdgeLex>::new(&limits);
        for edge in [Edge::new(1, 4), Edge::new(2, 5), Edge::new(4, 6)] {
            edges.push(edge).unwrap();
        }
        edges.sort().unwrap();
        let mut hits = ExternalSorter::<u64, NodeAsc>::new(&limits);
        for node in [2u64, 3] {
            hits.push(node).unwrap();
        }
        hits.sort().unwrap();

        let mut filtered = HitFilter::new(
            &mut edges,
            &mut hits,
            |e: &Edge, n: &u64| e.u <= *n,
            |e: &Edge, n: &u64| e.u == *n,
        )
        .unwrap();
        assert_eq!(drain(&mut filtered), vec![Edge::new(1, 4), Edge::new(4, 6)]);
    }
}
