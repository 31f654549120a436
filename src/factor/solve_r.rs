// Copyright (C) 2016-2018 ERGO-Code
// Copyright (C) 2022-2023 Richard Lincoln

use log::trace;

use crate::factor::def::{choose_r_strategy, RCostInput, RStrategy};
use crate::{Factorization, IndexedVector, TINY_ELEMENT};

impl Factorization {
    /// Number of Forrest–Tomlin etas.
    pub(crate) fn number_r(&self) -> usize {
        if self.forrest_tomlin {
            self.number_pivots
        } else {
            0
        }
    }

    pub(crate) fn choose_r(&self, nnz: usize, staging: bool) -> RStrategy {
        let has_row_copy = self.r_rows.is_some();
        let has_scratch = self.work.is_some();
        match self.forced_r {
            Some(RStrategy::Marked) if has_row_copy && has_scratch => RStrategy::Marked,
            Some(RStrategy::RowCopy) if has_row_copy => RStrategy::RowCopy,
            Some(_) => RStrategy::DotProduct,
            None => {
                let input = RCostInput {
                    nnz,
                    number_pivots: self.number_pivots,
                    number_rows: self.number_rows,
                    number_rows_extra: self.number_rows_extra,
                    size_r: self.r_size(),
                    has_row_copy,
                    has_scratch,
                    staging,
                };
                choose_r_strategy(&input, &self.weights)
            }
        }
    }

    /// Apply the Forrest–Tomlin etas in place. Each eta moves the value of the
    /// position it retired to its new position, less a combination of other
    /// positions.
    pub(crate) fn update_column_r(&mut self, region: &mut IndexedVector, staging: bool) {
        let number_r = self.number_r();
        if number_r == 0 {
            return;
        }
        let strategy = self.choose_r(region.nnz, staging);
        trace!("ftran R: {:?}, nnz = {}", strategy, region.nnz);

        let m = self.number_rows;
        let extra = self.number_rows_extra;
        let tolerance = self.zero_tolerance;
        let permute = &self.permute;
        let x = &mut region.elements;
        let indices = &mut region.indices;
        let mut nnz = region.nnz;

        match (strategy, self.r_rows.as_ref(), self.work.as_mut()) {
            (RStrategy::Marked, Some(rows), Some(work)) => {
                let mark = &mut work.mark;
                // rows that will be moved
                for k in m..extra {
                    mark[permute[k]] = 1;
                }
                let mut put = 0;
                for p in 0..nnz {
                    let i = indices[p];
                    if mark[i] == 0 {
                        indices[put] = i;
                        put += 1;
                    }
                    let pivot = x[i];
                    for q in rows.file.range(i) {
                        x[rows.index[q]] -= rows.value[q] * pivot;
                    }
                }
                nnz = put;
                for k in m..extra {
                    let i = permute[k];
                    let pivot = x[i] + x[k];
                    x[i] = 0.0;
                    if pivot.abs() > tolerance {
                        x[k] = pivot;
                        if mark[k] == 0 {
                            indices[nnz] = k;
                            nnz += 1;
                        }
                        for q in rows.file.range(k) {
                            x[rows.index[q]] -= rows.value[q] * pivot;
                        }
                    } else {
                        x[k] = 0.0;
                    }
                    mark[i] = 0;
                }
            }
            (RStrategy::RowCopy, Some(rows), _) => {
                for p in 0..nnz {
                    let i = indices[p];
                    let pivot = x[i];
                    for q in rows.file.range(i) {
                        x[rows.index[q]] -= rows.value[q] * pivot;
                    }
                }
                for k in m..extra {
                    let i = permute[k];
                    let pivot = x[i] + x[k];
                    x[i] = 0.0;
                    if pivot.abs() > tolerance {
                        x[k] = pivot;
                        indices[nnz] = k;
                        nnz += 1;
                        for q in rows.file.range(k) {
                            x[rows.index[q]] -= rows.value[q] * pivot;
                        }
                    } else {
                        x[k] = 0.0;
                    }
                }
                nnz = pack_down(x, indices, nnz);
            }
            _ => {
                let (start, index, value) = (&self.r_start, &self.r_index, &self.r_value);
                for (t, k) in (m..extra).enumerate() {
                    let i = permute[k];
                    let mut pivot = x[i];
                    x[i] = 0.0;
                    for p in start[t]..start[t + 1] {
                        pivot -= value[p] * x[index[p]];
                    }
                    if pivot.abs() > tolerance {
                        x[k] = pivot;
                        indices[nnz] = k;
                        nnz += 1;
                    } else {
                        x[k] = 0.0;
                    }
                }
                nnz = pack_down(x, indices, nnz);
            }
        }
        region.nnz = nnz;
    }

    /// Apply the transposed Forrest–Tomlin etas in place, last to first.
    ///
    /// When the count is small the index list is kept exact. Otherwise it is
    /// given up and `region.nnz` is set to `number_rows + 1`, which tells the
    /// solve with Lᵗ to rebuild it.
    pub(crate) fn update_column_transpose_r(&mut self, region: &mut IndexedVector) {
        let m = self.number_rows;
        if self.number_r() == 0 || region.nnz == 0 {
            return;
        }
        let nnz = region.nnz;
        let sparse = nnz <= m
            && (nnz < (self.sparse_threshold << 2) || self.l_elements() == 0);
        match self.work.as_mut() {
            Some(work) if sparse => {
                trace!("btran R: sparse, nnz = {}", nnz);
                let n = transpose_r_sparse(
                    region,
                    &mut work.stack,
                    m,
                    self.number_rows_extra,
                    &self.permute,
                    (&self.r_start[..], &self.r_index[..], &self.r_value[..]),
                    self.zero_tolerance,
                );
                region.nnz = n;
                if self.stats.collect {
                    self.stats.btran_count_after_r += n as f64;
                }
            }
            _ => {
                trace!("btran R: densish, nnz = {}", nnz);
                let x = &mut region.elements;
                for (t, k) in (m..self.number_rows_extra).enumerate().rev() {
                    let put = self.permute[k];
                    let pivot = x[k];
                    x[k] = 0.0;
                    if pivot != 0.0 {
                        for p in self.r_start[t]..self.r_start[t + 1] {
                            x[self.r_index[p]] -= self.r_value[p] * pivot;
                        }
                        x[put] = pivot;
                    }
                }
                if self.stats.collect {
                    self.stats.btran_count_after_r += (nnz << 1).min(m) as f64;
                }
                region.nnz = m + 1;
            }
        }
    }
}

// `spare[i]` is the place of position i in the index list.
fn transpose_r_sparse(
    region: &mut IndexedVector,
    spare: &mut [usize],
    m: usize,
    extra: usize,
    permute: &[usize],
    (start, index, value): (&[usize], &[usize], &[f64]),
    tolerance: f64,
) -> usize {
    let x = &mut region.elements;
    let indices = &mut region.indices;
    let mut nnz = region.nnz;
    for (p, &i) in indices[..nnz].iter().enumerate() {
        spare[i] = p;
    }
    for (t, k) in (m..extra).enumerate().rev() {
        let put = permute[k];
        let pivot = x[k];
        x[k] = 0.0;
        if pivot == 0.0 {
            continue;
        }
        for p in start[t]..start[t + 1] {
            let i = index[p];
            let old = x[i];
            let new = old - value[p] * pivot;
            if old != 0.0 {
                x[i] = if new != 0.0 { new } else { TINY_ELEMENT };
            } else if new.abs() > tolerance {
                x[i] = new;
                spare[i] = nnz;
                indices[nnz] = i;
                nnz += 1;
            }
        }
        x[put] = pivot;
        // the retired position takes over the list entry
        let place = spare[k];
        indices[place] = put;
        spare[put] = place;
    }
    nnz
}

// Drop listed positions that hold exact zeros.
fn pack_down(x: &[f64], indices: &mut [usize], nnz: usize) -> usize {
    let mut put = 0;
    for p in 0..nnz {
        let i = indices[p];
        if x[i] != 0.0 {
            indices[put] = i;
            put += 1;
        }
    }
    put
}
