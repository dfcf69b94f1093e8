//! Push, sort, consume: an external merge sorter.

use std::io;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use smallvec::SmallVec;

use crate::spill::{SpillReader, SpillWriter};
use crate::{Limits, Pushable, Rewind, SortOrder, Streamer};

enum Phase {
    Filling,
    Draining,
}

/// One spilled sorted run, kept so the sorter can be rewound.
struct Run<T> {
    writer: SpillWriter<T>,
}

/// A cursor over either a spilled run or the final in-memory run.
struct Cursor<T> {
    head: Option<T>,
    source: Source<T>,
}

enum Source<T> {
    Spill(SpillReader<T>),
    Memory(usize),
}

/// A three-phase external sorter: `push` records, `sort` (or `sort_reuse`),
/// then consume the stream ascending in `O`, with `rewind` available until
/// the sorter is cleared.
///
/// Records fill an in-memory buffer sized from [`Limits::sorter_bytes`];
/// when the buffer overflows it is sorted and spilled as a run. The final
/// buffer stays in memory, so small inputs never touch the disk. Reading
/// merges all runs with a small cursor set.
///
/// [`clear`](ExternalSorter::clear) releases the runs and returns to the
/// filling phase, which is how one sorter allocation is recycled across
/// recursion levels.
pub struct ExternalSorter<T, O> {
    limits: Limits,
    capacity: usize,
    buffer: Vec<T>,
    runs: Vec<Run<T>>,
    cursors: SmallVec<[Cursor<T>; 8]>,
    total: u64,
    phase: Phase,
    _order: PhantomData<O>,
}

impl<T, O> ExternalSorter<T, O>
where
    T: Copy + Serialize + DeserializeOwned,
    O: SortOrder<T>,
{
    /// An empty sorter in the filling phase.
    pub fn new(limits: &Limits) -> Self {
        let capacity = Limits::items_for(limits.sorter_bytes, std::mem::size_of::<T>());
        ExternalSorter {
            limits: limits.clone(),
            capacity,
            buffer: Vec::new(),
            runs: Vec::new(),
            cursors: SmallVec::new(),
            total: 0,
            phase: Phase::Filling,
            _order: PhantomData,
        }
    }

    /// Accepts one record. Only valid while filling.
    pub fn push(&mut self, item: T) -> io::Result<()> {
        assert!(
            matches!(self.phase, Phase::Filling),
            "push on a sorter in its read phase"
        );
        self.buffer.push(item);
        self.total += 1;
        if self.buffer.len() >= self.capacity {
            self.spill_run()?;
        }
        Ok(())
    }

    /// The number of records pushed since the last clear.
    pub fn len(&self) -> u64 {
        self.total
    }

    /// `true` in the read phase once all records have been consumed, and
    /// `true` in the filling phase only for a record-less sorter.
    pub fn empty(&self) -> bool {
        match self.phase {
            Phase::Filling => self.total == 0,
            Phase::Draining => self.cursors.iter().all(|c| c.head.is_none()),
        }
    }

    fn spill_run(&mut self) -> io::Result<()> {
        self.buffer.sort_by(O::cmp);
        let mut writer: SpillWriter<T> =
            SpillWriter::create(&self.limits.spill_dir, self.limits.block_bytes)?;
        for item in &self.buffer {
            writer.push(item)?;
        }
        self.buffer.clear();
        self.runs.push(Run { writer });
        Ok(())
    }

    /// Ends the filling phase and makes the sorted stream consumable.
    pub fn sort(&mut self) -> io::Result<()> {
        assert!(
            matches!(self.phase, Phase::Filling),
            "sort on a sorter in its read phase"
        );
        self.buffer.sort_by(O::cmp);
        self.phase = Phase::Draining;
        self.open_cursors()
    }

    /// Like [`sort`](ExternalSorter::sort), keeping the runs so the stream
    /// can be rewound and consumed repeatedly.
    pub fn sort_reuse(&mut self) -> io::Result<()> {
        self.sort()
    }

    /// Releases all runs and buffers and returns to the filling phase.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.runs.clear();
        self.cursors.clear();
        self.total = 0;
        self.phase = Phase::Filling;
    }

    fn open_cursors(&mut self) -> io::Result<()> {
        self.cursors.clear();
        for run in &mut self.runs {
            let mut reader = run.writer.reader(self.limits.block_bytes)?;
            let head = reader.next()?;
            self.cursors.push(Cursor {
                head,
                source: Source::Spill(reader),
            });
        }
        let head = self.buffer.first().copied();
        self.cursors.push(Cursor {
            head,
            source: Source::Memory(0),
        });
        Ok(())
    }

    /// The index of the cursor holding the least head, if any.
    fn least(&self) -> Option<usize> {
        let mut best: Option<(usize, &T)> = None;
        for (index, cursor) in self.cursors.iter().enumerate() {
            if let Some(ref head) = cursor.head {
                match best {
                    Some((_, current)) if !O::less(head, current) => {}
                    _ => best = Some((index, head)),
                }
            }
        }
        best.map(|(index, _)| index)
    }
}

impl<T, O> Streamer for ExternalSorter<T, O>
where
    T: Copy + Serialize + DeserializeOwned,
    O: SortOrder<T>,
{
    type Item = T;

    fn empty(&self) -> bool {
        ExternalSorter::empty(self)
    }

    fn peek(&self) -> T {
        assert!(
            matches!(self.phase, Phase::Draining),
            "peek on a sorter in its filling phase"
        );
        match self.least().and_then(|index| self.cursors[index].head) {
            Some(item) => item,
            None => panic!("peek past the end of a sorted stream"),
        }
    }

    fn advance(&mut self) -> io::Result<()> {
        let index = match self.least() {
            Some(index) => index,
            None => panic!("advance past the end of a sorted stream"),
        };
        let cursor = &mut self.cursors[index];
        cursor.head = match cursor.source {
            Source::Spill(ref mut reader) => reader.next()?,
            Source::Memory(ref mut position) => {
                *position += 1;
                self.buffer.get(*position).copied()
            }
        };
        Ok(())
    }
}

impl<T, O> Rewind for ExternalSorter<T, O>
where
    T: Copy + Serialize + DeserializeOwned,
    O: SortOrder<T>,
{
    fn rewind(&mut self) -> io::Result<()> {
        assert!(
            matches!(self.phase, Phase::Draining),
            "rewind on a sorter in its filling phase"
        );
        self.open_cursors()
    }
}

impl<T, O> Pushable<T> for ExternalSorter<T, O>
where
    T: Copy + Serialize + DeserializeOwned,
    O: SortOrder<T>,
{
    fn push(&mut self, item: T) -> io::Result<()> {
        ExternalSorter::push(self, item)
    }
}
