//! Spill files: uniquely named temporaries holding bincode-framed records.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;
use serde::Serialize;

static SPILL_SEQ: AtomicU64 = AtomicU64::new(0);

/// Converts a bincode failure into the I/O error it wraps, or a data error.
fn codec_error(error: bincode::Error) -> io::Error {
    match *error {
        bincode::ErrorKind::Io(e) => e,
        other => io::Error::new(io::ErrorKind::InvalidData, other),
    }
}

/// A uniquely named temporary file, removed from the filesystem on drop.
///
/// Readers hold their own open handles, so on the platforms we target they
/// stay valid even if the owner is dropped first.
struct Spill {
    path: PathBuf,
}

impl Spill {
    fn create(dir: &Path) -> io::Result<(Spill, File)> {
        let seq = SPILL_SEQ.fetch_add(1, Ordering::Relaxed);
        let path = dir.join(format!("emcc-{}-{}.spill", std::process::id(), seq));
        let file = OpenOptions::new().write(true).create_new(true).open(&path)?;
        Ok((Spill { path }, file))
    }
}

impl Drop for Spill {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Appends records of type `T` to a spill file.
pub(crate) struct SpillWriter<T> {
    spill: Spill,
    writer: BufWriter<File>,
    len: u64,
    _marker: PhantomData<T>,
}

impl<T: Serialize + DeserializeOwned> SpillWriter<T> {
    /// Creates an empty spill in `dir` with a `buffer`-byte write buffer.
    pub fn create(dir: &Path, buffer: usize) -> io::Result<Self> {
        let (spill, file) = Spill::create(dir)?;
        Ok(SpillWriter {
            spill,
            writer: BufWriter::with_capacity(buffer, file),
            len: 0,
            _marker: PhantomData,
        })
    }

    pub fn push(&mut self, item: &T) -> io::Result<()> {
        bincode::serialize_into(&mut self.writer, item).map_err(codec_error)?;
        self.len += 1;
        Ok(())
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    /// Flushes and opens an independent reader over the records so far.
    ///
    /// Multiple readers may coexist; each owns its own handle and cursor.
    pub fn reader(&mut self, buffer: usize) -> io::Result<SpillReader<T>> {
        self.writer.flush()?;
        let file = File::open(&self.spill.path)?;
        Ok(SpillReader {
            reader: BufReader::with_capacity(buffer, file),
            remaining: self.len,
            _marker: PhantomData,
        })
    }
}

/// Sequentially decodes the records of one spill file.
pub(crate) struct SpillReader<T> {
    reader: BufReader<File>,
    remaining: u64,
    _marker: PhantomData<T>,
}

impl<T: Serialize + DeserializeOwned> SpillReader<T> {
    /// The next record, or `None` past the end.
    pub fn next(&mut self) -> io::Result<Option<T>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        let item = bincode::deserialize_from(&mut self.reader).map_err(codec_error)?;
        self.remaining -= 1;
        Ok(Some(item))
    }
}

#[cfg(test)]
mod tests {
    use super::SpillWriter;

    #[test]
    fn roundtrip() {
        let dir = std::env::temp_dir();
        let mut writer = SpillWriter::<u64>::create(&dir, 128).unwrap();
        for value in 0..1000u64 {
            writer.push(&value).unwrap();
        }
        assert_eq!(writer.len(), 1000);

        let mut reader = writer.reader(128).unwrap();
        for value in 0..1000u64 {
            assert_eq!(reader.next().unwrap(), Some(value));
        }
        assert_eq!(reader.next().unwrap(), None);
    }

    #[test]
    fn readers_are_independent() {
        let dir = std::env::temp_dir();
        let mut writer = SpillWriter::<u64>::create(&dir, 64).unwrap();
        for value in 0..10u64 {
            writer.push(&value).unwrap();
        }
        let mut first = writer.reader(64).unwrap();
        let mut second = writer.reader(64).unwrap();
        assert_eq!(first.next().unwrap(), Some(0));
        assert_eq!(first.next().unwrap(), Some(1));
        assert_eq!(second.next().unwrap(), Some(0));
    }
}
