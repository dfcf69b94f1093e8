//! An external priority queue over spilled sorted runs.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::io;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::spill::{SpillReader, SpillWriter};
use crate::{Limits, Pushable, SortOrder};

/// Wraps a record so the std binary heap orders it by `O`.
struct Ranked<T, O> {
    item: T,
    _order: PhantomData<O>,
}

impl<T, O: SortOrder<T>> Ranked<T, O> {
    fn new(item: T) -> Self {
        Ranked {
            item,
            _order: PhantomData,
        }
    }
}

impl<T, O: SortOrder<T>> PartialEq for Ranked<T, O> {
    fn eq(&self, other: &Self) -> bool {
        O::cmp(&self.item, &other.item) == Ordering::Equal
    }
}

impl<T, O: SortOrder<T>> Eq for Ranked<T, O> {}

impl<T, O: SortOrder<T>> PartialOrd for Ranked<T, O> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T, O: SortOrder<T>> Ord for Ranked<T, O> {
    fn cmp(&self, other: &Self) -> Ordering {
        O::cmp(&self.item, &other.item)
    }
}

/// One spilled run, written descending so sequential reads pop in order.
///
/// The writer is dropped as soon as the reader exists; the open handle keeps
/// the unlinked file readable until the run is exhausted.
struct Run<T> {
    reader: SpillReader<T>,
    head: Option<T>,
}

/// A priority queue that pops the `O`-greatest element first.
///
/// Pushes land in an in-memory heap bounded by [`Limits::pq_bytes`]; on
/// overflow the heap is drained into a descending sorted run on disk.
/// Popping compares the heap top against the run heads, so pushes and pops
/// interleave freely. The greatest-first convention is what the contraction
/// orders rely on: the Sibeyn order places the minimum source with the
/// maximum target on top.
pub struct ExternalPq<T, O> {
    limits: Limits,
    capacity: usize,
    heap: BinaryHeap<Ranked<T, O>>,
    runs: Vec<Run<T>>,
    len: u64,
}

impl<T, O> ExternalPq<T, O>
where
    T: Copy + Serialize + DeserializeOwned,
    O: SortOrder<T>,
{
    /// An empty queue.
    pub fn new(limits: &Limits) -> Self {
        let capacity = Limits::items_for(limits.pq_bytes, std::mem::size_of::<T>());
        ExternalPq {
            limits: limits.clone(),
            capacity,
            heap: BinaryHeap::new(),
            runs: Vec::new(),
            len: 0,
        }
    }

    /// The number of queued elements.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// `true` iff nothing is queued.
    pub fn empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts an element.
    pub fn push(&mut self, item: T) -> io::Result<()> {
        if self.heap.len() >= self.capacity {
            self.spill_run()?;
        }
        self.heap.push(Ranked::new(item));
        self.len += 1;
        Ok(())
    }

    fn spill_run(&mut self) -> io::Result<()> {
        let half_pool = (self.limits.pool_bytes / 2).max(64);
        let mut writer: SpillWriter<T> = SpillWriter::create(&self.limits.spill_dir, half_pool)?;
        // Greatest first, so the run head is always the next candidate.
        while let Some(ranked) = self.heap.pop() {
            writer.push(&ranked.item)?;
        }
        let mut reader = writer.reader(half_pool)?;
        let head = reader.next()?;
        self.runs.push(Run { reader, head });
        Ok(())
    }

    /// The index of the run whose head beats the in-memory heap, if any.
    fn best_run(&self) -> Option<usize> {
        let mut best: Option<(usize, &T)> = None;
        for (index, run) in self.runs.iter().enumerate() {
            if let Some(ref head) = run.head {
                match best {
                    Some((_, current)) if O::cmp(head, current) != Ordering::Greater => {}
                    _ => best = Some((index, head)),
                }
            }
        }
        if let (Some((_, best_head)), Some(top)) = (best, self.heap.peek()) {
            if O::cmp(&top.item, best_head) != Ordering::Less {
                return None;
            }
        }
        best.map(|(index, _)| index)
    }

    /// The greatest queued element. Requires `!self.empty()`.
    pub fn top(&self) -> &T {
        assert!(!self.empty(), "top of an empty priority queue");
        match self.best_run() {
            Some(index) => match self.runs[index].head {
                Some(ref head) => head,
                None => unreachable!(),
            },
            None => match self.heap.peek() {
                Some(ranked) => &ranked.item,
                None => unreachable!(),
            },
        }
    }

    /// Removes and returns the greatest queued element.
    pub fn pop(&mut self) -> io::Result<T> {
        assert!(!self.empty(), "pop of an empty priority queue");
        self.len -= 1;
        match self.best_run() {
            Some(index) => {
                let run = &mut self.runs[index];
                let item = match run.head.take() {
                    Some(item) => item,
                    None => unreachable!(),
                };
                run.head = run.reader.next()?;
                if run.head.is_none() {
                    self.runs.swap_remove(index);
                }
                Ok(item)
            }
            None => match self.heap.pop() {
                Some(ranked) => Ok(ranked.item),
                None => unreachable!(),
            },
        }
    }
}

impl<T, O> Pushable<T> for ExternalPq<T, O>
where
    T: Copy + Serialize + DeserializeOwned,
    O: SortOrder<T>,
{
    fn push(&mut self, item: T) -> io::Result<()> {
        ExternalPq::push(self, item)
    }
}
