// Copyright (C) 2016-2018 ERGO-Code
// Copyright (C) 2022-2023 Richard Lincoln

use log::trace;

use crate::factor::def::{choose_u_strategy, UStrategy, BITS_PER_CHECK, CHECK_SHIFT};
use crate::{Factorization, IndexedVector};

// Columns of U as needed by the backward solve.
struct UColumns<'a> {
    begin: &'a [usize],
    end: &'a [usize],
    index: &'a [usize],
    value: &'a [f64],
    pivot_region: &'a [f64],
    number_slacks: usize,
    slack_value: f64,
    tolerance: f64,
}

impl UColumns<'_> {
    // Finish position i of the solution: take its value off the right-hand
    // side, subtract its column and scale by the pivot. `touch` sees every
    // position that is updated. Returns true if position i is nonzero.
    #[inline]
    fn eliminate<F: FnMut(usize)>(&self, i: usize, x: &mut [f64], mut touch: F) -> bool {
        let pivot = x[i];
        if pivot == 0.0 {
            return false;
        }
        x[i] = 0.0;
        if pivot.abs() <= self.tolerance {
            return false;
        }
        if i < self.number_slacks {
            x[i] = pivot * self.slack_value;
        } else {
            for p in self.begin[i]..self.end[i] {
                let row = self.index[p];
                x[row] -= self.value[p] * pivot;
                touch(row);
            }
            x[i] = pivot * self.pivot_region[i];
        }
        true
    }
}

impl Factorization {
    pub(crate) fn choose_u(&self, nnz: usize) -> UStrategy {
        if self.work.is_none() {
            return UStrategy::Densish;
        }
        if let Some(strategy) = self.forced_u {
            return strategy;
        }
        choose_u_strategy(
            nnz,
            self.sparse_threshold,
            self.sparse_threshold2,
            self.stats.ftran_average_after_r,
            self.stats.ftran_average_after_u,
        )
    }

    /// Solve with U in place.
    ///
    /// All strategies process the positions in decreasing order with the same
    /// arithmetic, so they give identical results, index order included.
    pub(crate) fn update_column_u(&mut self, region: &mut IndexedVector) {
        let strategy = self.choose_u(region.nnz);
        self.update_column_u_with(region, strategy);
    }

    pub(crate) fn update_column_u_with(&mut self, region: &mut IndexedVector, strategy: UStrategy) {
        let nnz = region.nnz;
        if nnz == 0 {
            return;
        }
        let number_u = self.number_rows_extra;
        let u = UColumns {
            begin: &self.u_cols.begin,
            end: &self.u_cols.end,
            index: &self.u_index,
            value: &self.u_value,
            pivot_region: &self.pivot_region,
            number_slacks: self.number_slacks,
            slack_value: self.slack_value,
            tolerance: self.zero_tolerance,
        };
        let x = &mut region.elements;
        trace!("ftran U: {:?}, nnz = {}", strategy, nnz);

        let mut put = 0;
        match (strategy, self.work.as_mut()) {
            (UStrategy::Sparse, Some(work)) => {
                let n = work.reach(&region.indices[..nnz], |j| &u.index[u.begin[j]..u.end[j]]);
                let list = &mut work.list[..n];
                list.sort_unstable_by(|a, b| b.cmp(a));
                for &i in list.iter() {
                    if u.eliminate(i, x, |_| {}) {
                        region.indices[put] = i;
                        put += 1;
                    }
                }
            }
            (UStrategy::Bitmap, Some(work)) => {
                let bitmap = &mut work.bitmap;
                let mut last = 0;
                for &i in &region.indices[..nnz] {
                    bitmap[i >> CHECK_SHIFT] |= 1 << (i & (BITS_PER_CHECK - 1));
                    last = last.max(i >> CHECK_SHIFT);
                }
                for block in (0..=last).rev() {
                    if bitmap[block] == 0 {
                        continue;
                    }
                    let first = block << CHECK_SHIFT;
                    let end = (first + BITS_PER_CHECK).min(number_u);
                    for i in (first..end).rev() {
                        let found = u.eliminate(i, x, |row| {
                            bitmap[row >> CHECK_SHIFT] |= 1 << (row & (BITS_PER_CHECK - 1));
                        });
                        if found {
                            region.indices[put] = i;
                            put += 1;
                        }
                    }
                    bitmap[block] = 0;
                }
            }
            _ => {
                for i in (0..number_u).rev() {
                    if u.eliminate(i, x, |_| {}) {
                        region.indices[put] = i;
                        put += 1;
                    }
                }
            }
        }
        region.nnz = put;
    }

    /// Solve with Uᵗ in place.
    pub(crate) fn update_column_transpose_u(&mut self, region: &mut IndexedVector) {
        let nnz = region.nnz;
        if nnz == 0 {
            return;
        }
        let number_u = self.number_rows_extra;
        let tolerance = self.zero_tolerance;
        let (begin, end) = (&self.u_rows.begin, &self.u_rows.end);
        let (column, convert) = (&self.u_col_index, &self.u_convert);
        let value = &self.u_value;
        let x = &mut region.elements;

        // columns are stored divided by their pivot
        for &i in &region.indices[..nnz] {
            x[i] *= self.pivot_region[i];
        }

        let mut put = 0;
        let mut step = |i: usize, x: &mut [f64], indices: &mut [usize]| {
            let pivot = x[i];
            if pivot == 0.0 {
                return;
            }
            if pivot.abs() > tolerance {
                for s in begin[i]..end[i] {
                    x[column[s]] -= value[convert[s]] * pivot;
                }
                indices[put] = i;
                put += 1;
            } else {
                x[i] = 0.0;
            }
        };

        match self.work.as_mut() {
            Some(work) if nnz < self.sparse_threshold => {
                trace!("btran U: sparse, nnz = {}", nnz);
                let n = work.reach(&region.indices[..nnz], |i| &column[begin[i]..end[i]]);
                let list = &mut work.list[..n];
                list.sort_unstable();
                for &i in list.iter() {
                    step(i, x, &mut region.indices);
                }
            }
            _ => {
                let first = region.indices[..nnz].iter().copied().min().unwrap_or(number_u);
                for i in first..number_u {
                    step(i, x, &mut region.indices);
                }
            }
        }
        region.nnz = put;
    }
}
