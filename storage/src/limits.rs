//! Memory budgets for the external containers.

use std::path::PathBuf;

const MIB: usize = 1 << 20;

/// Memory budgets and spill placement, threaded through every constructor.
///
/// The defaults mirror a single-machine setup with a generous sorting
/// budget: 512 MiB per sorter, 512 MiB of priority-queue insertion buffer
/// backed by a 128 MiB read/write pool, and 2 MiB blocks for buffered file
/// access. Tests shrink these numbers aggressively to force spills.
#[derive(Clone, Debug)]
pub struct Limits {
    /// In-memory buffer per [`crate::ExternalSorter`], in bytes.
    pub sorter_bytes: usize,
    /// In-memory insertion buffer per [`crate::ExternalPq`], in bytes.
    pub pq_bytes: usize,
    /// Buffered-I/O pool per priority queue, half writing and half reading.
    pub pool_bytes: usize,
    /// Buffer size for sequential file access (one "block").
    pub block_bytes: usize,
    /// Directory receiving spill files.
    pub spill_dir: PathBuf,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            sorter_bytes: 512 * MIB,
            pq_bytes: 512 * MIB,
            pool_bytes: 128 * MIB,
            block_bytes: 2 * MIB,
            spill_dir: std::env::temp_dir(),
        }
    }
}

impl Limits {
    /// A budget where every buffer is `bytes` large.
    ///
    /// Mostly useful in tests, where a few hundred bytes force every
    /// container onto its spill path.
    pub fn uniform(bytes: usize) -> Self {
        Limits {
            sorter_bytes: bytes,
            pq_bytes: bytes,
            pool_bytes: bytes,
            block_bytes: bytes.max(64),
            spill_dir: std::env::temp_dir(),
        }
    }

    /// How many items of size `item` fit into `bytes`, never less than 64.
    ///
    /// The floor keeps degenerate budgets functional; correctness never
    /// depends on the buffer size.
    pub(crate) fn items_for(bytes: usize, item: usize) -> usize {
        (bytes / item.max(1)).max(64)
    }
}
