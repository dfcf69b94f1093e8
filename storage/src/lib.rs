//! External-memory containers for streamed graph processing.
//!
//! Everything in this crate moves data through append-only spill files in a
//! configurable temporary directory: [`BlockedSequence`] is a rewindable
//! forward sequence, [`ExternalSorter`] sorts by spilling sorted runs and
//! merging them back, and [`ExternalPq`] is a priority queue whose insertion
//! buffer overflows into sorted runs as well.
//!
//! All three are driven through the same pull interface, [`Streamer`], and
//! are parameterized by a total order implementing [`SortOrder`]. Memory use
//! is governed by a single [`Limits`] record threaded through constructors;
//! there is no process-global configuration.
//!
//! Every operation that may touch the disk returns `std::io::Result` and the
//! callers are expected to propagate failures; there are no retries. Misuse
//! (reading a container that is still being written, peeking past the end)
//! is a programming error and asserts.

#![forbid(missing_docs)]

mod limits;
mod order;
mod pq;
mod sequence;
mod sorter;
mod spill;
mod stream;

pub use limits::Limits;
pub use order::{Natural, SortOrder};
pub use pq::ExternalPq;
pub use sequence::{BlockedSequence, SequenceStream};
pub use sorter::ExternalSorter;
pub use stream::{stream_into, Pushable, Rewind, Streamer};
