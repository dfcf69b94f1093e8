//! Seeded coins for edge sampling.

use rand::RngCore;

/// A Bernoulli coin with success probability `2^-k`, batch-extracted from
/// 64-bit words: a flip succeeds iff the next `k` bits are all set.
pub struct PowerOfTwoCoin {
    power: u32,
    bits_left: u32,
    word: u64,
    mask: u64,
}

impl PowerOfTwoCoin {
    /// A coin succeeding with probability `2^-power`; `power` in `1..64`.
    pub fn new(power: u32) -> Self {
        assert!(power >= 1 && power < 64);
        PowerOfTwoCoin {
            power,
            bits_left: 0,
            word: 0,
            mask: (1u64 << power) - 1,
        }
    }

    /// Flips the coin.
    pub fn flip(&mut self, rng: &mut impl RngCore) -> bool {
        if self.bits_left < self.power {
            self.word = rng.next_u64();
            self.bits_left = 64;
        }
        let hit = self.word & self.mask == self.mask;
        self.word >>= self.power;
        self.bits_left -= self.power;
        hit
    }

    /// The success probability.
    pub fn probability(&self) -> f64 {
        1.0 / (1u64 << self.power) as f64
    }
}

/// A plain Bernoulli coin with arbitrary success probability.
pub struct WeightedCoin {
    p: f64,
}

impl WeightedCoin {
    /// A coin succeeding with probability `p` in `[0, 1]`.
    pub fn new(p: f64) -> Self {
        assert!((0.0..=1.0).contains(&p));
        WeightedCoin { p }
    }

    /// Flips the coin.
    pub fn flip(&self, rng: &mut impl rand::Rng) -> bool {
        rng.gen_bool(self.p)
    }

    /// The success probability.
    pub fn probability(&self) -> f64 {
        self.p
    }
}
