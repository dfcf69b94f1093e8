//! A dense direct-address map over a contiguous key range.

use crate::graph::Node;

/// Maps keys from `[min_key, max_key]` to values through a value array and
/// a presence bitmap; four words per key all told, which is what makes the
/// bundled variant's per-bundle base case so cheap.
pub struct SimpleShiftMap<V> {
    min_key: Node,
    max_key: Node,
    len: usize,
    data: Vec<V>,
    filled: Vec<bool>,
}

impl<V: Copy + Default> SimpleShiftMap<V> {
    /// An empty map over the inclusive range `[min_key, max_key]`.
    pub fn new(min_key: Node, max_key: Node) -> Self {
        assert!(min_key <= max_key);
        let width = (max_key - min_key + 1) as usize;
        SimpleShiftMap {
            min_key,
            max_key,
            len: 0,
            data: vec![V::default(); width],
            filled: vec![false; width],
        }
    }

    /// `true` iff `key` lies inside the range.
    pub fn valid_key(&self, key: Node) -> bool {
        self.min_key <= key && key <= self.max_key
    }

    #[inline]
    fn index(&self, key: Node) -> usize {
        (key - self.min_key) as usize
    }

    /// `true` iff `key` has been assigned.
    pub fn contains(&self, key: Node) -> bool {
        self.valid_key(key) && self.filled[self.index(key)]
    }

    /// The value under `key`, or `fallback` if absent.
    pub fn get(&self, key: Node, fallback: V) -> V {
        if self.contains(key) {
            self.data[self.index(key)]
        } else {
            fallback
        }
    }

    /// Assigns `value` to `key`.
    pub fn insert(&mut self, key: Node, value: V) {
        assert!(self.valid_key(key));
        let index = self.index(key);
        self.data[index] = value;
        if !self.filled[index] {
            self.filled[index] = true;
            self.len += 1;
        }
    }

    /// A mutable slot for `key`, inserting the default when absent.
    pub fn slot(&mut self, key: Node) -> &mut V {
        assert!(self.valid_key(key));
        let index = self.index(key);
        if !self.filled[index] {
            self.filled[index] = true;
            self.len += 1;
            self.data[index] = V::default();
        }
        &mut self.data[index]
    }

    /// The number of assigned keys.
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` iff no key is assigned.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<V: Copy + Default + Ord> SimpleShiftMap<V> {
    /// Assigns `value`, or the maximum of `value` and the present one.
    pub fn insert_or_max(&mut self, key: Node, value: V) {
        assert!(self.valid_key(key));
        let index = self.index(key);
        if !self.filled[index] {
            self.filled[index] = true;
            self.len += 1;
            self.data[index] = value;
        } else {
            self.data[index] = self.data[index].max(value);
        }
    }
}
