//! Reservoir sampling of one out-edge per source.

use std::io;

use rand::rngs::SmallRng;
use rand::Rng;

use emcc_storage::{BlockedSequence, Limits, Rewind, SequenceStream, Streamer};

use crate::graph::Edge;
use crate::stream::WeightedCoin;

/// Chooses at most one edge per source from a source-sorted edge stream.
///
/// Each source is kept with probability `p`; for a kept source the edge is
/// drawn uniformly from its neighborhood by reservoir sampling (the `c`-th
/// candidate replaces the running choice with probability `1/c`). The
/// input is consumed in a single pass at construction and the choices are
/// buffered in an internal sequence, so the adapter can be replayed any
/// number of times with [`rewind`](Rewind::rewind).
pub struct RandomNeighborPerSource {
    replay: BlockedSequence<Edge>,
    reader: SequenceStream<Edge>,
    kept_sources: u64,
    skipped_sources: u64,
}

impl RandomNeighborPerSource {
    /// Samples `input`, keeping each source with probability `p`.
    pub fn new<S>(input: &mut S, p: f64, rng: &mut SmallRng, limits: &Limits) -> io::Result<Self>
    where
        S: Streamer<Item = Edge>,
    {
        let keep = WeightedCoin::new(p);
        let mut replay = BlockedSequence::new(limits);
        let mut kept_sources = 0;
        let mut skipped_sources = 0;
        while !input.empty() {
            let source = input.peek().u;
            if keep.flip(rng) {
                kept_sources += 1;
                let mut choice = input.peek();
                let mut count = 1u64;
                input.advance()?;
                while !input.empty() && input.peek().u == source {
                    count += 1;
                    if rng.gen_range(0..count) == 0 {
                        choice = input.peek();
                    }
                    input.advance()?;
                }
                replay.push(choice)?;
            } else {
                skipped_sources += 1;
                while !input.empty() && input.peek().u == source {
                    input.advance()?;
                }
            }
        }
        let reader = replay.stream()?;
        Ok(RandomNeighborPerSource {
            replay,
            reader,
            kept_sources,
            skipped_sources,
        })
    }

    /// The number of chosen edges.
    pub fn len(&self) -> u64 {
        self.replay.len()
    }

    /// `true` iff no source was kept.
    pub fn is_empty(&self) -> bool {
        self.replay.is_empty()
    }

    /// Distinct sources seen in the input.
    pub fn num_sources(&self) -> u64 {
        self.kept_sources + self.skipped_sources
    }

    /// Sources whose coin came up heads.
    pub fn num_kept_sources(&self) -> u64 {
        self.kept_sources
    }
}

impl Streamer for RandomNeighborPerSource {
    type Item = Edge;

    fn empty(&self) -> bool {
        self.reader.empty()
    }

    fn peek(&self) -> Edge {
        self.reader.peek()
    }

    fn advance(&mut self) -> io::Result<()> {
        self.reader.advance()
    }
}

impl Rewind for RandomNeighborPerSource {
    fn rewind(&mut self) -> io::Result<()> {
        self.reader = self.replay.stream()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EdgeLex;
    use emcc_storage::ExternalSorter;
    use rand::SeedableRng;

    #[test]
    fn one_edge_per_kept_source() {
        let limits = Limits::default();
        let mut rng = SmallRng::seed_from_u64(99);
        let mut edges = ExternalSorter::<Edge, EdgeLex>::new(&limits);
        for u in 1..100u64 {
            for v in (u + 1)..(u + 5) {
                edges.push(Edge::new(u, v)).unwrap();
            }
        }
        edges.sort().unwrap();

        let mut sampled =
            RandomNeighborPerSource::new(&mut edges, 1.0, &mut rng, &limits).unwrap();
        assert_eq!(sampled.num_sources(), 99);
        assert_eq!(sampled.len(), 99);
        let mut last_source = 0;
        while !sampled.empty() {
            let edge = sampled.peek();
            assert!(edge.u > last_source, "at most one edge per source");
            assert!(edge.v > edge.u && edge.v < edge.u + 5);
            last_source = edge.u;
            sampled.advance().unwrap();
        }
    }

    #[test]
    fn reservoir_is_roughly_uniform() {
        let limits = Limits::default();
        let mut rng = SmallRng::seed_from_u64(5);
        let degree = 8u64;
        let trials = 20_000u64;
        let mut counts = vec![0u64; degree as usize];
        for _ in 0..trials {
            let mut edges = ExternalSorter::<Edge, EdgeLex>::new(&limits);
            for v in 0..degree {
                edges.push(Edge::new(1, 10 + v)).unwrap();
            }
            edges.sort().unwrap();
            let mut sampled =
                RandomNeighborPerSource::new(&mut edges, 1.0, &mut rng, &limits).unwrap();
            counts[(sampled.peek().v - 10) as usize] += 1;
        }
        // Each neighbor should land near trials/degree; allow 4 sigma.
        let p = 1.0 / degree as f64;
        let stddev = (trials as f64 * p * (1.0 - p)).sqrt();
        for &count in &counts {
            assert!((count as f64 - trials as f64 * p).abs() < 4.0 * stddev);
        }
    }

    #[test]
    fn rewind_replays_choices() {
        let limits = Limits::default();
        let mut rng = SmallRng::seed_from_u64(17);
        let mut edges = ExternalSorter::<Edge, EdgeLex>::new(&limits);
        for u in 1..50u64 {
            edges.push(Edge::new(u, u + 1)).unwrap();
            edges.push(Edge::new(u, u + 2)).unwrap();
        }
        edges.sort().unwrap();
        let mut sampled =
            RandomNeighborPerSource::new(&mut edges, 0.5, &mut rng, &limits).unwrap();
        let mut first = Vec::new();
        while !sampled.empty() {
            first.push(sampled.peek());
            sampled.advance().unwrap();
        }
        sampled.rewind().unwrap();
        let mut second = Vec::new();
        while !sampled.empty() {
            second.push(sampled.peek());
            sampled.advance().unwrap();
        }
        assert_eq!(first, second);
    }
}
