//! Connected components of graphs far larger than main memory.
//!
//! The input is a sorted stream of undirected edges; the output is a star
//! mapping assigning every node its component representative. Everything in
//! between is expressed as composable pull-streams over the external
//! containers of `emcc_storage`: contraction strategies shrink the node
//! set, a recursive subproblem manager samples and splits the edge set
//! until a semi-external union-find can finish, and time-forward processing
//! replays contraction trees to hand every node its root.
//!
//! The crate is organized bottom-up:
//!
//! - [`graph`]: records and the orders they are sorted by;
//! - [`stream`]: the edge container and the adapter algebra;
//! - [`kruskal`]: semi-external union-find base cases;
//! - [`relabel`], [`merger`], [`tfp`]: star-map plumbing;
//! - [`contraction`]: Sibeyn, Borůvka, star and KKT contraction;
//! - [`manager`]: the recursive engine;
//! - [`bundles`]: the bundled Sibeyn variant;
//! - [`policy`], [`io`]: run policies and edge-file formats.

#![forbid(missing_docs)]

pub mod bundles;
pub mod contraction;
pub mod graph;
pub mod io;
pub mod kruskal;
pub mod manager;
pub mod merger;
pub mod policy;
pub mod relabel;
pub mod stream;
pub mod tfp;

pub use graph::{Edge, Node, NodeComponent, MAX_NODE, MIN_NODE};
pub use manager::{ComponentMap, SubproblemManager};
pub use stream::EdgeStream;
