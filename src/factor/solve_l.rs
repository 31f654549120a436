// Copyright (C) 2016-2018 ERGO-Code
// Copyright (C) 2022-2023 Richard Lincoln

use log::trace;

use crate::{Factorization, IndexedVector};

impl Factorization {
    /// Solve with L in place. The nonzeros of `region` are at positions below
    /// `number_rows` and stay there.
    pub(crate) fn update_column_l(&mut self, region: &mut IndexedVector) {
        let nnz = region.nnz;
        if nnz == 0 || self.l_elements() == 0 {
            return;
        }
        let m = self.number_rows;
        let tolerance = self.zero_tolerance;
        let (start, index, value) = (&self.l_start, &self.l_index, &self.l_value);
        let x = &mut region.elements;

        match self.work.as_mut() {
            Some(work) if nnz < self.sparse_threshold => {
                trace!("ftran L: sparse, nnz = {}", nnz);
                let n = work.reach(&region.indices[..nnz], |j| &index[start[j]..start[j + 1]]);
                let list = &mut work.list[..n];
                list.sort_unstable();
                let mut put = 0;
                for &j in list.iter() {
                    let pivot = x[j];
                    if pivot == 0.0 {
                        continue;
                    }
                    if pivot.abs() > tolerance {
                        for p in start[j]..start[j + 1] {
                            x[index[p]] -= value[p] * pivot;
                        }
                        region.indices[put] = j;
                        put += 1;
                    } else {
                        x[j] = 0.0;
                    }
                }
                region.nnz = put;
            }
            _ => {
                let first = region.indices[..nnz].iter().copied().min().unwrap_or(m);
                let mut put = 0;
                for j in first..m {
                    let pivot = x[j];
                    if pivot == 0.0 {
                        continue;
                    }
                    if pivot.abs() > tolerance {
                        for p in start[j]..start[j + 1] {
                            x[index[p]] -= value[p] * pivot;
                        }
                        region.indices[put] = j;
                        put += 1;
                    } else {
                        x[j] = 0.0;
                    }
                }
                region.nnz = put;
            }
        }
    }

    /// Solve with Lᵗ in place. `region.nnz` may exceed `number_rows`, in which
    /// case the index list is rebuilt.
    pub(crate) fn update_column_transpose_l(&mut self, region: &mut IndexedVector) {
        let m = self.number_rows;
        let nnz = region.nnz;
        if nnz == 0 {
            return;
        }
        let tolerance = self.zero_tolerance;
        let x = &mut region.elements;

        match (self.work.as_mut(), self.l_rows.as_ref()) {
            (Some(work), Some(rows)) if nnz <= m && nnz < self.sparse_threshold => {
                trace!("btran L: sparse, nnz = {}", nnz);
                let n = work.reach(&region.indices[..nnz], |i| &rows.index[rows.row(i)]);
                let list = &mut work.list[..n];
                list.sort_unstable_by(|a, b| b.cmp(a));
                let mut put = 0;
                for &i in list.iter() {
                    let pivot = x[i];
                    if pivot == 0.0 {
                        continue;
                    }
                    if pivot.abs() > tolerance {
                        for p in rows.row(i) {
                            x[rows.index[p]] -= rows.value[p] * pivot;
                        }
                        region.indices[put] = i;
                        put += 1;
                    } else {
                        x[i] = 0.0;
                    }
                }
                region.nnz = put;
            }
            _ => {
                let (start, index, value) = (&self.l_start, &self.l_index, &self.l_value);
                let mut put = 0;
                for i in (0..m).rev() {
                    let mut pivot = x[i];
                    for p in start[i]..start[i + 1] {
                        pivot -= value[p] * x[index[p]];
                    }
                    if pivot.abs() > tolerance {
                        x[i] = pivot;
                        region.indices[put] = i;
                        put += 1;
                    } else {
                        x[i] = 0.0;
                    }
                }
                region.nnz = put;
            }
        }
    }
}
