//! The contraction and sampling policies, variants 0 through 9.

/// A policy decides, per recursion level, whether to contract, how many
/// nodes to aim for, and how aggressively to sample.
///
/// All three questions receive the current node bound `n`, edge count `m`,
/// recursion `level` and the memory budget `m_nodes` expressed as the
/// number of nodes the semi-external base case can hold.
///
/// The table:
///
/// - `0`: always contract `n/2` and sample with one bit (probability 1/2),
///   the classic Karger–Klein–Tarjan setup;
/// - `1`..`5`: contract `n/2` on every level past the first, sampling with
///   the fixed number of bits the variant names;
/// - `6`/`7`: contract only while the graph is sparse (`m/n` below 4
///   respectively 8), aim for `n - m/threshold` nodes, and sample with
///   `max(1, ⌊log₂(m/n)⌋)` bits;
/// - `8`/`9`: like 6/7 with the density threshold relaxed toward 2 as the
///   node set outgrows memory.
#[derive(Copy, Clone, Debug)]
pub struct Policy {
    variant: u8,
}

/// The number of defined policy variants.
pub const NUM_VARIANTS: u8 = 10;

impl Policy {
    /// The policy of the given `variant`; panics above 9.
    pub fn variant(variant: u8) -> Self {
        assert!(variant < NUM_VARIANTS, "unknown policy variant");
        Policy { variant }
    }

    /// Whether this level should run a contraction at all.
    pub fn should_contract(&self, n: u64, m: u64, level: usize, m_nodes: u64) -> bool {
        match self.variant {
            0 => true,
            1..=5 => level > 0,
            6 => density(n, m) < 4,
            7 => density(n, m) < 8,
            8 => density(n, m) < threshold(n, m_nodes, 4, 2.0),
            _ => density(n, m) < threshold(n, m_nodes, 8, 6.0),
        }
    }

    /// How many nodes the contraction should remove.
    pub fn contract_count(&self, n: u64, m: u64, _level: usize, m_nodes: u64) -> u64 {
        match self.variant {
            0..=5 => n / 2,
            6 => n.saturating_sub(m / 4),
            7 => n.saturating_sub(m / 8),
            8 => n.saturating_sub(m / threshold(n, m_nodes, 4, 2.0).max(1)),
            _ => n.saturating_sub(m / threshold(n, m_nodes, 8, 6.0).max(1)),
        }
    }

    /// The sampling probability as a power of two: `p = 2^-bits`.
    pub fn sample_bits(&self, n: u64, m: u64, _level: usize, _m_nodes: u64) -> u32 {
        match self.variant {
            0 => 1,
            1..=5 => self.variant as u32,
            _ => nearest_power_reciprocal(n, m),
        }
    }
}

/// Integer edge density `m/n`, guarding the empty node bound.
fn density(n: u64, m: u64) -> u64 {
    m / n.max(1)
}

/// `max(1, ⌊log₂(m/n)⌋)`, clamped into the coin's valid bit range.
fn nearest_power_reciprocal(n: u64, m: u64) -> u32 {
    let ratio = m as f64 / n.max(1) as f64;
    let bits = ratio.log2().floor();
    if bits >= 1.0 {
        (bits as u32).min(63)
    } else {
        1
    }
}

/// The adaptive density threshold: `min(cap, 2·(1 + c·M/n))`, sliding from
/// `cap` at `n = c·M` toward 2 as `n` outgrows memory.
fn threshold(n: u64, m_nodes: u64, cap: u64, c: f64) -> u64 {
    let relaxed = 2.0 * (1.0 + c * m_nodes as f64 / n.max(1) as f64);
    cap.min(relaxed as u64)
}
