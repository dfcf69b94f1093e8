//! Node-contraction strategies and their capability set.

pub mod boruvka;
pub mod sibeyn;
pub mod star;

use std::io;

use rand::rngs::SmallRng;

use emcc_storage::{ExternalSorter, Limits, Rewind, Streamer};

use crate::graph::{ByComponent, Edge, EdgeLex, NodeComponent};
use crate::kruskal::PipelinedKruskal;

/// The contraction strategy the engine commits to at construction.
///
/// Every variant shrinks the node set and reports the affected nodes as a
/// star mapping; they differ in cost, contraction rate and in whether they
/// can skip materializing the contracted edge set.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ContractionKind {
    /// Priority-queue contraction of the smallest-ID nodes.
    Sibeyn,
    /// One minimum-neighbor forest phase.
    Boruvka,
    /// Randomized star contraction.
    Star,
    /// Up to three chained Borůvka phases.
    Kkt,
}

impl ContractionKind {
    /// Whether the strategy can deliver its result as a map only, piping
    /// leftover edges into a base case instead of materializing them.
    pub fn supports_only_map_return(self) -> bool {
        matches!(self, ContractionKind::Sibeyn | ContractionKind::Star)
    }

    /// An upper bound on the fraction of nodes surviving one application.
    pub fn expected_contraction_ratio(self) -> f64 {
        match self {
            ContractionKind::Sibeyn => 0.5,
            ContractionKind::Boruvka => 0.5,
            ContractionKind::Star => 0.75,
            ContractionKind::Kkt => 0.125,
        }
    }

    /// Contracts `input`, materializing the contracted edge set (unsorted,
    /// to be sorted by the caller) and the star mapping of the removed
    /// nodes.
    pub fn fully_external<I>(
        self,
        input: &mut I,
        goal: u64,
        contracted_edges: &mut ExternalSorter<Edge, EdgeLex>,
        star_mapping: &mut ExternalSorter<NodeComponent, ByComponent>,
        rng: &mut SmallRng,
        limits: &Limits,
    ) -> io::Result<()>
    where
        I: Streamer<Item = Edge> + Rewind,
    {
        match self {
            ContractionKind::Sibeyn => {
                sibeyn::contract_fully_external(
                    input,
                    goal,
                    contracted_edges,
                    star_mapping,
                    limits,
                )?;
            }
            ContractionKind::Boruvka => {
                boruvka::contract_fully_external(input, contracted_edges, star_mapping, limits)?;
            }
            ContractionKind::Star => {
                star::contract_fully_external(input, contracted_edges, star_mapping, rng, limits)?;
            }
            ContractionKind::Kkt => {
                boruvka::contract_kkt(input, contracted_edges, star_mapping, limits)?;
            }
        }
        Ok(())
    }

    /// Contracts `input` with the leftover edges piped into `kruskal`.
    ///
    /// Only valid for strategies with
    /// [`supports_only_map_return`](ContractionKind::supports_only_map_return).
    pub fn semi_external<I>(
        self,
        input: &mut I,
        goal: u64,
        star_mapping: &mut ExternalSorter<NodeComponent, ByComponent>,
        kruskal: &mut PipelinedKruskal,
        rng: &mut SmallRng,
        limits: &Limits,
    ) -> io::Result<()>
    where
        I: Streamer<Item = Edge> + Rewind,
    {
        match self {
            ContractionKind::Sibeyn => {
                sibeyn::contract_semi_external(input, goal, star_mapping, kruskal, limits)?;
            }
            ContractionKind::Star => {
                star::contract_semi_external(input, star_mapping, kruskal, rng, limits)?;
            }
            ContractionKind::Boruvka | ContractionKind::Kkt => {
                panic!("contraction strategy cannot return a map only");
            }
        }
        Ok(())
    }
}
