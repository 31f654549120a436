// Copyright (C) 2016-2018 ERGO-Code
// Copyright (C) 2022-2023 Richard Lincoln

use log::trace;

use crate::{ColumnUpdate, Factorization, IndexedVector};

impl Factorization {
    /// Purpose:
    ///
    ///     Solve B·x = b with the current factorization.
    ///
    /// Arguments:
    ///
    ///     region
    ///
    ///         Scratch vector of capacity at least `number_rows_extra()`
    ///         plus the remaining pivots. Must be unpacked and zero on
    ///         entry. Zero on return unless `no_permute` is set.
    ///
    ///     rhs
    ///
    ///         On entry the right-hand side b indexed by original row, packed
    ///         or unpacked. On return the solution x indexed by basis
    ///         position, in the same mode. Entries at or below the zero
    ///         tolerance are dropped.
    ///
    ///     no_permute
    ///
    ///         If set, b is already in `region` in pivot order and x is left
    ///         there in pivot order; `rhs` is not accessed.
    ///
    /// Return:
    ///
    ///     Number of nonzeros in the solution.
    pub fn update_column(
        &mut self,
        region: &mut IndexedVector,
        rhs: &mut IndexedVector,
        no_permute: bool,
    ) -> usize {
        debug_assert!(!region.packed);
        if !no_permute {
            scatter(rhs, region, &self.permute);
        }
        self.ftran(region, false);
        if no_permute {
            return region.nnz;
        }
        gather(region, rhs, &self.pivot_column_back, self.zero_tolerance)
    }

    /// Purpose:
    ///
    ///     Solve B·x = b like `update_column()` and stage the partially
    ///     transformed column as spike for `replace_column_ft()`.
    ///
    /// Return:
    ///
    ///     Appended(nnz)
    ///
    ///         The spike was staged.
    ///
    ///     NotAppended(nnz)
    ///
    ///         The solve was done, but there is no room for the spike, the
    ///         pivot limit is reached or the PFI scheme is active. A
    ///         following `replace_column_ft()` returns ErrorNoRoom.
    pub fn update_column_ft(
        &mut self,
        region: &mut IndexedVector,
        rhs: &mut IndexedVector,
    ) -> ColumnUpdate {
        debug_assert!(!region.packed);
        let staging = self.prepare_staging();
        scatter(rhs, region, &self.permute);
        self.ftran(region, staging);
        let nnz = gather(region, rhs, &self.pivot_column_back, self.zero_tolerance);
        if staging {
            ColumnUpdate::Appended(nnz)
        } else {
            trace!("ftran: spike not staged");
            ColumnUpdate::NotAppended(nnz)
        }
    }

    /// Purpose:
    ///
    ///     Solve Bᵗ·y = c with the current factorization.
    ///
    /// Arguments:
    ///
    ///     region
    ///
    ///         Scratch vector as for `update_column()`. Zero on return.
    ///
    ///     rhs
    ///
    ///         On entry c indexed by basis position, on return y indexed by
    ///         original row. Packed or unpacked.
    ///
    /// Return:
    ///
    ///     Number of nonzeros in the solution.
    pub fn update_column_transpose(
        &mut self,
        region: &mut IndexedVector,
        rhs: &mut IndexedVector,
    ) -> usize {
        debug_assert!(!region.packed);
        scatter(rhs, region, &self.pivot_column);
        let collect = self.stats.collect;
        if collect {
            self.stats.number_btran_counts += 1;
            self.stats.btran_count_input += region.nnz as f64;
        }
        if !self.forrest_tomlin {
            self.update_column_transpose_pfi(region);
        }
        self.update_column_transpose_u(region);
        if collect {
            self.stats.btran_count_after_u += region.nnz as f64;
            if self.number_r() == 0 {
                self.stats.btran_count_after_r += region.nnz as f64;
            }
        }
        self.update_column_transpose_r(region);
        self.update_column_transpose_l(region);
        if collect {
            self.stats.btran_count_after_l += region.nnz as f64;
        }
        let nnz = gather(region, rhs, &self.permute_back, self.zero_tolerance);
        self.check_scratch();
        nnz
    }

    // L, R (or PFI) and U on a vector in pivot order.
    fn ftran(&mut self, region: &mut IndexedVector, staging: bool) {
        let collect = self.stats.collect;
        if collect {
            self.stats.number_ftran_counts += 1;
            self.stats.ftran_count_input += region.nnz as f64;
        }
        self.update_column_l(region);
        if collect {
            self.stats.ftran_count_after_l += region.nnz as f64;
        }
        self.update_column_r(region, staging);
        if staging {
            self.stage_spike(region);
        }
        if collect {
            self.stats.ftran_count_after_r += region.nnz as f64;
        }
        self.update_column_u(region);
        if collect {
            self.stats.ftran_count_after_u += region.nnz as f64;
        }
        if !self.forrest_tomlin {
            self.update_column_pfi(region);
        }
        self.check_scratch();
    }

    // Make sure the column file can take a spike of any length behind its
    // last line. Compresses the file once if necessary.
    fn prepare_staging(&mut self) -> bool {
        self.ft_staged = false;
        if !self.forrest_tomlin
            || self.number_rows_extra >= self.maximum_rows_extra
            || self.number_pivots >= self.pivot_limit()
        {
            return false;
        }
        let m = self.number_rows;
        if self.u_cols.free() < m {
            self.compress_columns(0.0, 0);
        }
        self.u_cols.free() >= m
    }

    // Copy the vector into the free space of the column file as column
    // `number_rows_extra`. The column is not linked into the file.
    fn stage_spike(&mut self, region: &IndexedVector) {
        let k = self.number_rows_extra;
        let start = self.u_cols.used();
        let mut put = start;
        for &i in region.indices() {
            self.u_index[put] = i;
            self.u_value[put] = region.elements[i];
            put += 1;
        }
        self.u_cols.begin[k] = start;
        self.u_cols.end[k] = put;
        self.ft_staged = true;
    }

    #[inline]
    fn check_scratch(&self) {
        #[cfg(feature = "debug")]
        if let Some(work) = &self.work {
            assert!(work.is_clean());
        }
    }
}

// Move the entries of `from` into the empty, unpacked `to`, renumbered by
// `map`. `from` is left empty.
fn scatter(from: &mut IndexedVector, to: &mut IndexedVector, map: &[usize]) {
    debug_assert_eq!(to.nnz, 0);
    let nnz = from.nnz;
    for k in 0..nnz {
        let i = from.indices[k];
        let slot = if from.packed { k } else { i };
        let value = std::mem::take(&mut from.elements[slot]);
        let j = map[i];
        to.elements[j] = value;
        to.indices[k] = j;
    }
    to.nnz = nnz;
    from.nnz = 0;
}

// Move the entries of the unpacked `from` into the empty `to`, renumbered by
// `map` and dropping values at or below `tolerance`. `from` is left zero.
fn gather(
    from: &mut IndexedVector,
    to: &mut IndexedVector,
    map: &[usize],
    tolerance: f64,
) -> usize {
    debug_assert_eq!(to.nnz, 0);
    let mut put = 0;
    for k in 0..from.nnz {
        let i = from.indices[k];
        let value = std::mem::take(&mut from.elements[i]);
        if value.abs() > tolerance {
            let j = map[i];
            to.indices[put] = j;
            if to.packed {
                to.elements[put] = value;
            } else {
                to.elements[j] = value;
            }
            put += 1;
        }
    }
    from.nnz = 0;
    to.nnz = put;
    put
}
