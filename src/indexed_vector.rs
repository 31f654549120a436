// Copyright (C) 2016-2018 ERGO-Code
// Copyright (C) 2022-2023 Richard Lincoln

use std::ops::Index;

/// Sparse vector held as a dense value array plus a list of the positions
/// that may be nonzero.
///
/// In the default (unpacked) mode `elements[i]` is the value at position `i`.
/// In packed mode `elements[k]` is the value at position `indices[k]` for
/// `k < len()`.
///
/// Every position not named in the index list holds exactly zero. A listed
/// position may hold [`TINY_ELEMENT`](crate::TINY_ELEMENT).
#[derive(Debug, Clone, Default)]
pub struct IndexedVector {
    pub(crate) elements: Vec<f64>,
    pub(crate) indices: Vec<usize>,
    pub(crate) nnz: usize,
    pub(crate) packed: bool,
}

impl IndexedVector {
    pub fn new(capacity: usize) -> Self {
        Self {
            elements: vec![0.0; capacity],
            indices: vec![0; capacity],
            nnz: 0,
            packed: false,
        }
    }

    /// Unpacked vector holding the nonzeros of `dense`.
    pub fn from_dense(dense: &[f64]) -> Self {
        let mut v = Self::new(dense.len());
        for (i, &x) in dense.iter().enumerate() {
            if x != 0.0 {
                v.insert(i, x);
            }
        }
        v
    }

    pub fn capacity(&self) -> usize {
        self.elements.len()
    }

    /// Number of listed positions.
    pub fn len(&self) -> usize {
        self.nnz
    }

    pub fn is_empty(&self) -> bool {
        self.nnz == 0
    }

    pub fn packed(&self) -> bool {
        self.packed
    }

    /// Switch between packed and unpacked storage. The vector must be empty.
    pub fn set_packed(&mut self, packed: bool) {
        assert!(self.nnz == 0, "cannot change mode of a nonempty vector");
        self.packed = packed;
    }

    /// Listed positions.
    pub fn indices(&self) -> &[usize] {
        &self.indices[..self.nnz]
    }

    /// The value array (dense in unpacked mode, compact in packed mode).
    pub fn elements(&self) -> &[f64] {
        &self.elements
    }

    /// Value at position `i`, in either mode.
    pub fn get(&self, i: usize) -> f64 {
        if self.packed {
            self.indices()
                .iter()
                .position(|&j| j == i)
                .map_or(0.0, |k| self.elements[k])
        } else {
            self.elements[i]
        }
    }

    /// Append a new entry. `i` must not be listed already.
    pub fn insert(&mut self, i: usize, value: f64) {
        debug_assert!(!self.indices().contains(&i));
        self.indices[self.nnz] = i;
        if self.packed {
            self.elements[self.nnz] = value;
        } else {
            self.elements[i] = value;
        }
        self.nnz += 1;
    }

    /// Zero the listed entries and empty the list.
    pub fn clear(&mut self) {
        if self.packed {
            for x in &mut self.elements[..self.nnz] {
                *x = 0.0;
            }
        } else {
            for &i in &self.indices[..self.nnz] {
                self.elements[i] = 0.0;
            }
        }
        self.nnz = 0;
    }

    /// Scatter into a dense array of length `n`.
    pub fn to_dense(&self, n: usize) -> Vec<f64> {
        let mut x = vec![0.0; n];
        for (k, &i) in self.indices().iter().enumerate() {
            x[i] = if self.packed {
                self.elements[k]
            } else {
                self.elements[i]
            };
        }
        x
    }

    /// True if the vector holds nothing at all.
    pub fn is_clean(&self) -> bool {
        self.nnz == 0 && self.elements.iter().all(|&x| x == 0.0)
    }

    /// True if no position outside the index list is nonzero and no
    /// position is listed twice.
    pub fn is_consistent(&self) -> bool {
        if self.nnz > self.capacity() {
            return false;
        }
        let mut listed = vec![false; self.capacity()];
        for &i in self.indices() {
            if listed[i] {
                return false;
            }
            listed[i] = true;
        }
        if self.packed {
            self.elements[self.nnz..].iter().all(|&x| x == 0.0)
        } else {
            self.elements
                .iter()
                .zip(&listed)
                .all(|(&x, &l)| l || x == 0.0)
        }
    }
}

impl Index<usize> for IndexedVector {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        &self.elements[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_only_touches_listed() {
        let mut v = IndexedVector::new(6);
        v.insert(4, 2.0);
        v.insert(1, -3.0);
        assert_eq!(v.indices(), &[4, 1]);
        assert!(v.is_consistent());
        v.clear();
        assert!(v.is_clean());
    }

    #[test]
    fn packed_storage() {
        let mut v = IndexedVector::new(5);
        v.set_packed(true);
        v.insert(3, 1.5);
        v.insert(0, 2.5);
        assert_eq!(v.elements()[0], 1.5);
        assert_eq!(v.get(0), 2.5);
        assert_eq!(v.to_dense(5), vec![2.5, 0.0, 0.0, 1.5, 0.0]);
        v.clear();
        assert!(v.is_clean());
    }

    #[test]
    fn residue_is_detected() {
        let mut v = IndexedVector::from_dense(&[0.0, 1.0, 0.0]);
        v.elements[2] = 4.0;
        assert!(!v.is_consistent());
    }
}
