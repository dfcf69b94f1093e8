//! Two-way merges of sorted streams.

use std::io;
use std::marker::PhantomData;

use emcc_storage::{Rewind, SortOrder, Streamer};

/// Merges two streams sorted under `O`, preserving duplicates.
///
/// The merge is stable in the sense that on ties the left stream wins.
pub struct Merge2<'a, A, B, O> {
    left: &'a mut A,
    right: &'a mut B,
    from_left: bool,
    _order: PhantomData<O>,
}

impl<'a, A, B, O> Merge2<'a, A, B, O>
where
    A: Streamer,
    B: Streamer<Item = A::Item>,
    O: SortOrder<A::Item>,
{
    /// Merges `left` and `right`.
    pub fn new(left: &'a mut A, right: &'a mut B) -> Self {
        let mut merge = Merge2 {
            left,
            right,
            from_left: true,
            _order: PhantomData,
        };
        merge.choose();
        merge
    }

    fn choose(&mut self) {
        self.from_left = if self.left.empty() {
            false
        } else if self.right.empty() {
            true
        } else {
            !O::less(&self.right.peek(), &self.left.peek())
        };
    }

}

impl<A, B, O> Streamer for Merge2<'_, A, B, O>
where
    A: Streamer,
    B: Streamer<Item = A::Item>,
    O: SortOrder<A::Item>,
{
    type Item = A::Item;

    fn empty(&self) -> bool {
        self.left.empty() && self.right.empty()
    }

    fn peek(&self) -> A::Item {
        if self.from_left {
            self.left.peek()
        } else {
            self.right.peek()
        }
    }

    fn advance(&mut self) -> io::Result<()> {
        if self.from_left {
            self.left.advance()?;
        } else {
            self.right.advance()?;
        }
        self.choose();
        Ok(())
    }
}

impl<A, B, O> Rewind for Merge2<'_, A, B, O>
where
    A: Streamer + Rewind,
    B: Streamer<Item = A::Item> + Rewind,
    O: SortOrder<A::Item>,
{
    fn rewind(&mut self) -> io::Result<()> {
        self.left.rewind()?;
        self.right.rewind()?;
        self.choose();
        Ok(())
    }
}

/// Merges two sorted streams, dropping elements present in both.
///
/// Only cross-stream duplicates are suppressed; runs within one stream
/// pass through untouched.
pub struct MergeUnique2<'a, A, B, O> {
    left: &'a mut A,
    right: &'a mut B,
    from_left: bool,
    _order: PhantomData<O>,
}

impl<'a, A, B, O> MergeUnique2<'a, A, B, O>
where
    A: Streamer,
    B: Streamer<Item = A::Item>,
    A::Item: PartialEq,
    O: SortOrder<A::Item>,
{
    /// Merges `left` and `right` with cross-stream deduplication.
    pub fn new(left: &'a mut A, right: &'a mut B) -> io::Result<Self> {
        let mut merge = MergeUnique2 {
            left,
            right,
            from_left: true,
            _order: PhantomData,
        };
        merge.choose()?;
        Ok(merge)
    }

    fn choose(&mut self) -> io::Result<()> {
        while !self.left.empty() && !self.right.empty() {
            if self.left.peek() == self.right.peek() {
                self.left.advance()?;
            } else {
                self.from_left = O::less(&self.left.peek(), &self.right.peek());
                return Ok(());
            }
        }
        self.from_left = !self.left.empty();
        Ok(())
    }
}

impl<A, B, O> Streamer for MergeUnique2<'_, A, B, O>
where
    A: Streamer,
    B: Streamer<Item = A::Item>,
    A::Item: PartialEq,
    O: SortOrder<A::Item>,
{
    type Item = A::Item;

    fn empty(&self) -> bool {
        self.left.empty() && self.right.empty()
    }

    fn peek(&self) -> A::Item {
        if self.from_left {
            self.left.peek()
        } else {
            self.right.peek()
        }
    }

    fn advance(&mut self) -> io::Result<()> {
        if self.from_left {
            self.left.advance()?;
        } else {
            self.right.advance()?;
        }
        self.choose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeAsc;
    use emcc_storage::{ExternalSorter, Limits};

    fn sorted(values: &[u64]) -> ExternalSorter<u64, NodeAsc> {
        let limits = Limits::default();
        let mut sorter = ExternalSorter::new(&limits);
        for &value in values {
            sorter.push(value).unwrap();
        }
        sorter.sort().unwrap();
        sorter
    }

    fn drain<S: Streamer>(stream: &mut S) -> Vec<S::Item> {
        let mut result = Vec::new();
        while !stream.empty() {
            result.push(stream.peek());
            stream.advance().unwrap();
        }
        result
    }

    #[test]
    fn merge_preserves_duplicates() {
        let mut left = sorted(&[1, 3, 3, 7]);
        let mut right = sorted(&[2, 3, 8]);
        let mut merge = Merge2::<_, _, NodeAsc>::new(&mut left, &mut right);
        assert_eq!(drain(&mut merge), vec![1, 2, 3, 3, 3, 7, 8]);
    }

    #[test]
    fn merge_unique_drops_cross_duplicates() {
        let mut left = sorted(&[1, 3, 5]);
        let mut right = sorted(&[3, 5, 6]);
        let mut merge = MergeUnique2::<_, _, NodeAsc>::new(&mut left, &mut right).unwrap();
        assert_eq!(drain(&mut merge), vec![1, 3, 5, 6]);
    }
}
