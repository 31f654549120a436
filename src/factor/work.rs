// Copyright (C) 2016-2018 ERGO-Code
// Copyright (C) 2022-2023 Richard Lincoln

use crate::factor::def::CHECK_SHIFT;

/// Scratch for the sparse solves. Sized for the largest index that can occur
/// and reused across calls. Every routine leaves `mark` and `bitmap` zero.
#[derive(Debug, Clone)]
pub(crate) struct SparseWork {
    pub(crate) stack: Vec<usize>,
    pub(crate) list: Vec<usize>,
    pub(crate) next: Vec<usize>,
    pub(crate) mark: Vec<u8>,
    pub(crate) bitmap: Vec<u8>,
}

impl SparseWork {
    pub(crate) fn new(n: usize) -> Self {
        Self {
            stack: vec![0; n],
            list: vec![0; n],
            next: vec![0; n],
            mark: vec![0; n],
            bitmap: vec![0; (n >> CHECK_SHIFT) + 1],
        }
    }

    pub(crate) fn is_clean(&self) -> bool {
        self.mark.iter().all(|&m| m == 0) && self.bitmap.iter().all(|&b| b == 0)
    }

    /// Compute the set of nodes reachable from `roots` by depth first search.
    ///
    /// Node `j` has neighbours `edges(j)`. On return `list[..n]` holds the
    /// reach in the order in which the search finished the nodes, so every
    /// node comes after all nodes reachable from it; `n` is the return value.
    pub(crate) fn reach<'a, F>(&mut self, roots: &[usize], edges: F) -> usize
    where
        F: Fn(usize) -> &'a [usize],
    {
        let mut n = 0;
        // adapted from T. Davis, CSPARSE
        for &root in roots {
            if self.mark[root] != 0 {
                continue;
            }
            self.mark[root] = 1;
            self.stack[0] = root;
            self.next[0] = 0;
            let mut depth = 1;
            while depth > 0 {
                let j = self.stack[depth - 1];
                let adjacent = edges(j);
                let p = self.next[depth - 1];
                if p < adjacent.len() {
                    self.next[depth - 1] = p + 1;
                    let i = adjacent[p];
                    if self.mark[i] == 0 {
                        // start dfs at node i
                        self.mark[i] = 1;
                        self.stack[depth] = i;
                        self.next[depth] = 0;
                        depth += 1;
                    }
                } else {
                    // node j is done
                    self.list[n] = j;
                    n += 1;
                    depth -= 1;
                }
            }
        }
        for &j in &self.list[..n] {
            self.mark[j] = 0;
        }
        n
    }
}
