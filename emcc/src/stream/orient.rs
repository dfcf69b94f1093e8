//! Pure per-edge orientation maps.

use std::io;

use emcc_storage::{Rewind, Streamer};

use crate::graph::Edge;

/// Presents every edge oriented larger-to-smaller.
///
/// Contraction trees are stored smaller-to-larger; time-forward processing
/// wants the opposite orientation, and this adapter flips on the fly.
pub struct OrientReverse<'a, S> {
    inner: &'a mut S,
}

impl<'a, S: Streamer<Item = Edge>> OrientReverse<'a, S> {
    /// Wraps `inner`.
    pub fn new(inner: &'a mut S) -> Self {
        OrientReverse { inner }
    }
}

impl<S: Streamer<Item = Edge>> Streamer for OrientReverse<'_, S> {
    type Item = Edge;

    fn empty(&self) -> bool {
        self.inner.empty()
    }

    fn peek(&self) -> Edge {
        let edge = self.inner.peek();
        if edge.u < edge.v {
            edge.reversed()
        } else {
            edge
        }
    }

    fn advance(&mut self) -> io::Result<()> {
        self.inner.advance()
    }
}

impl<S: Streamer<Item = Edge> + Rewind> Rewind for OrientReverse<'_, S> {
    fn rewind(&mut self) -> io::Result<()> {
        self.inner.rewind()
    }
}

/// Presents every edge oriented smaller-to-larger.
pub struct OrientNormal<'a, S> {
    inner: &'a mut S,
}

impl<'a, S: Streamer<Item = Edge>> OrientNormal<'a, S> {
    /// Wraps `inner`.
    pub fn new(inner: &'a mut S) -> Self {
        OrientNormal { inner }
    }
}

impl<S: Streamer<Item = Edge>> Streamer for OrientNormal<'_, S> {
    type Item = Edge;

    fn empty(&self) -> bool {
        self.inner.empty()
    }

    fn peek(&self) -> Edge {
        self.inner.peek().normalized()
    }

    fn advance(&mut self) -> io::Result<()> {
        self.inner.advance()
    }
}

impl<S: Streamer<Item = Edge> + Rewind> Rewind for OrientNormal<'_, S> {
    fn rewind(&mut self) -> io::Result<()> {
        self.inner.rewind()
    }
}
