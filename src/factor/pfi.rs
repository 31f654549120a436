// Copyright (C) 2016-2018 ERGO-Code
// Copyright (C) 2022-2023 Richard Lincoln

use log::debug;

use crate::factor::def::{PFI_FIRST_SINGULAR, PFI_MARGINAL, PFI_SINGULAR};
use crate::{Factorization, IndexedVector, Status, TINY_ELEMENT};

impl Factorization {
    fn pfi_range(&self, t: usize) -> std::ops::Range<usize> {
        self.pfi_start[t]..self.pfi_start[t + 1]
    }

    /// Apply the PFI etas in place, first to last.
    pub(crate) fn update_column_pfi(&self, region: &mut IndexedVector) {
        let tolerance = self.zero_tolerance;
        let x = &mut region.elements;
        let indices = &mut region.indices;
        let mut nnz = region.nnz;

        for t in 0..self.number_pivots {
            let pivot_row = self.pfi_pivot[t];
            let pivot = x[pivot_row];
            if pivot == 0.0 {
                continue;
            }
            if pivot.abs() > tolerance {
                for p in self.pfi_range(t) {
                    let i = self.u_index[p];
                    let old = x[i];
                    let new = old - pivot * self.u_value[p];
                    if old == 0.0 {
                        if new.abs() > tolerance {
                            x[i] = new;
                            indices[nnz] = i;
                            nnz += 1;
                        }
                    } else if new.abs() > tolerance {
                        x[i] = new;
                    } else {
                        x[i] = TINY_ELEMENT;
                    }
                }
                x[pivot_row] = pivot * self.pfi_pivot_region[t];
            } else {
                x[pivot_row] = TINY_ELEMENT;
            }
        }
        region.nnz = nnz;
    }

    /// Apply the transposed PFI etas in place, last to first.
    pub(crate) fn update_column_transpose_pfi(&self, region: &mut IndexedVector) {
        let tolerance = self.zero_tolerance;
        let x = &mut region.elements;
        let indices = &mut region.indices;
        let mut nnz = region.nnz;

        for t in (0..self.number_pivots).rev() {
            let pivot_row = self.pfi_pivot[t];
            let mut pivot = x[pivot_row] * self.pfi_pivot_region[t];
            for p in self.pfi_range(t) {
                pivot -= self.u_value[p] * x[self.u_index[p]];
            }
            if pivot.abs() > tolerance {
                if x[pivot_row] == 0.0 {
                    indices[nnz] = pivot_row;
                    nnz += 1;
                }
                x[pivot_row] = pivot;
            } else if x[pivot_row] != 0.0 {
                x[pivot_row] = TINY_ELEMENT;
            }
        }
        region.nnz = nnz;
    }

    /// Purpose:
    ///
    ///     Replace the column of the basis at position `pivot_row` by a new
    ///     column, appending one eta to the PFI chain.
    ///
    /// Arguments:
    ///
    ///     region
    ///
    ///         The new column after `update_column()`, in basis positions,
    ///         packed or unpacked. Not modified.
    ///
    ///     pivot_row
    ///
    ///         Basis position of the leaving column.
    ///
    ///     alpha
    ///
    ///         Entry `pivot_row` of the updated column.
    ///
    /// Return:
    ///
    ///     OK                    the eta was appended
    ///     WarningMarginalPivot  appended, but |alpha| is small
    ///     ErrorSingularUpdate   |alpha| is too small; nothing changed
    ///     ErrorNoRoom           the U file is full; nothing changed
    ///     ErrorMaximumPivots    refactorize first; nothing changed
    pub fn replace_column_pfi(
        &mut self,
        region: &IndexedVector,
        pivot_row: usize,
        alpha: f64,
    ) -> Status {
        debug_assert!(!self.forrest_tomlin);
        let t = self.number_pivots;
        if t == 0 {
            self.pfi_start[0] = self.u_cols.used();
        }
        let start = self.pfi_start[t];
        let nnz = region.nnz;

        if t >= self.pivot_limit() {
            debug!("PFI update rejected: {} pivots", t);
            return Status::ErrorMaximumPivots;
        }
        if start + nnz > self.u_index.len() {
            debug!("PFI update rejected: no room for {} entries", nnz);
            return Status::ErrorNoRoom;
        }
        let magnitude = alpha.abs();
        let mut status = Status::OK;
        if t > 0 {
            if magnitude <= PFI_SINGULAR {
                debug!("PFI update rejected: singular pivot {:e}", alpha);
                return Status::ErrorSingularUpdate;
            }
            if magnitude < PFI_MARGINAL {
                status = Status::WarningMarginalPivot;
            }
        } else if magnitude <= PFI_FIRST_SINGULAR {
            debug!("PFI update rejected: singular pivot {:e}", alpha);
            return Status::ErrorSingularUpdate;
        }

        let multiplier = 1.0 / alpha;
        let tolerance = self.zero_tolerance;
        let mut put = start;
        for (k, &i) in region.indices().iter().enumerate() {
            if i == pivot_row {
                continue;
            }
            let value = if region.packed {
                region.elements[k]
            } else {
                region.elements[i]
            };
            if value.abs() > tolerance {
                self.u_index[put] = self.pivot_column[i];
                self.u_value[put] = value * multiplier;
                put += 1;
            }
        }
        if t == 0 {
            // columns of U must not grow into the etas
            self.u_cols.set_limit(start);
        }
        self.pfi_pivot[t] = self.pivot_column[pivot_row];
        self.pfi_pivot_region[t] = multiplier;
        self.pfi_start[t + 1] = put;
        self.number_pivots += 1;

        #[cfg(feature = "debug_extra")]
        self.assert_consistent();

        status
    }
}
