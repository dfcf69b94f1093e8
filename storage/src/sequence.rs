//! An append-only, rewindable external sequence.

use std::io;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::spill::{SpillReader, SpillWriter};
use crate::{Limits, Pushable, Streamer};

/// An unbounded sequence of records written through to a spill file.
///
/// Writing and reading do not overlap: records are appended with [`push`],
/// and [`stream`] flushes the write buffer and hands out an independent
/// forward reader. Any number of readers may be opened, which is how
/// multi-pass consumers rewind. [`reset`] discards the contents and the
/// backing file.
///
/// [`push`]: BlockedSequence::push
/// [`stream`]: BlockedSequence::stream
/// [`reset`]: BlockedSequence::reset
pub struct BlockedSequence<T> {
    writer: Option<SpillWriter<T>>,
    limits: Limits,
    _marker: PhantomData<T>,
}

impl<T: Copy + Serialize + DeserializeOwned> BlockedSequence<T> {
    /// An empty sequence; no file is created until the first push.
    pub fn new(limits: &Limits) -> Self {
        BlockedSequence {
            writer: None,
            limits: limits.clone(),
            _marker: PhantomData,
        }
    }

    /// Appends one record.
    pub fn push(&mut self, item: T) -> io::Result<()> {
        let writer = match self.writer {
            Some(ref mut writer) => writer,
            None => self.writer.insert(SpillWriter::create(
                &self.limits.spill_dir,
                self.limits.block_bytes,
            )?),
        };
        writer.push(&item)
    }

    /// The number of records appended so far.
    pub fn len(&self) -> u64 {
        self.writer.as_ref().map_or(0, SpillWriter::len)
    }

    /// `true` if nothing has been appended.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Opens a forward reader over everything appended so far.
    pub fn stream(&mut self) -> io::Result<SequenceStream<T>> {
        let reader = match self.writer.as_mut() {
            Some(writer) => Some(writer.reader(self.limits.block_bytes)?),
            None => None,
        };
        let mut stream = SequenceStream {
            reader,
            current: None,
        };
        stream.refill()?;
        Ok(stream)
    }

    /// Discards all records and releases the backing file.
    pub fn reset(&mut self) {
        self.writer = None;
    }
}

impl<T: Copy + Serialize + DeserializeOwned> Pushable<T> for BlockedSequence<T> {
    fn push(&mut self, item: T) -> io::Result<()> {
        BlockedSequence::push(self, item)
    }
}

/// A forward reader over a [`BlockedSequence`], owning its file handle.
pub struct SequenceStream<T> {
    reader: Option<SpillReader<T>>,
    current: Option<T>,
}

impl<T: Copy + Serialize + DeserializeOwned> SequenceStream<T> {
    fn refill(&mut self) -> io::Result<()> {
        self.current = match self.reader.as_mut() {
            Some(reader) => reader.next()?,
            None => None,
        };
        Ok(())
    }
}

impl<T: Copy + Serialize + DeserializeOwned> Streamer for SequenceStream<T> {
    type Item = T;

    fn empty(&self) -> bool {
        self.current.is_none()
    }

    fn peek(&self) -> T {
        match self.current {
            Some(item) => item,
            None => panic!("peek past the end of a sequence stream"),
        }
    }

    fn advance(&mut self) -> io::Result<()> {
        assert!(!self.empty());
        self.refill()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_read_rewind() {
        let limits = Limits::uniform(256);
        let mut sequence = BlockedSequence::new(&limits);
        for value in 0..500u64 {
            sequence.push(value * 3).unwrap();
        }
        assert_eq!(sequence.len(), 500);

        for _ in 0..2 {
            let mut stream = sequence.stream().unwrap();
            let mut expected = 0u64;
            while !stream.empty() {
                assert_eq!(stream.peek(), expected * 3);
                stream.advance().unwrap();
                expected += 1;
            }
            assert_eq!(expected, 500);
        }
    }

    #[test]
    fn empty_sequence_streams_empty() {
        let limits = Limits::default();
        let mut sequence = BlockedSequence::<u64>::new(&limits);
        let stream = sequence.stream().unwrap();
        assert!(stream.empty());
    }

    #[test]
    fn reset_releases_contents() {
        let limits = Limits::uniform(128);
        let mut sequence = BlockedSequence::new(&limits);
        sequence.push(1u64).unwrap();
        sequence.reset();
        assert_eq!(sequence.len(), 0);
        assert!(sequence.stream().unwrap().empty());
    }
}
