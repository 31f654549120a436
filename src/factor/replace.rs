// Copyright (C) 2016-2018 ERGO-Code
// Copyright (C) 2022-2023 Richard Lincoln

use std::ops::Range;

use log::{debug, warn};

use crate::factor::def::{FT_REJECT_ERROR, FT_SINGULAR, FT_WARN_ERROR};
use crate::factor::file::LineFile;
use crate::factor::space::make_room;
use crate::{FactorError, Factorization, IndexedVector, Status};

impl Factorization {
    /// Purpose:
    ///
    ///     Replace the column of the basis at position `pivot_row` by the
    ///     column whose spike was staged by the last `update_column_ft()`.
    ///
    ///     Row r = pivot position of `pivot_row` is eliminated from U by a new
    ///     row eta appended to R. Column r and row r leave U and the spike
    ///     enters as last column with pivot position `number_rows_extra()`.
    ///
    /// Arguments:
    ///
    ///     region
    ///
    ///         Scratch vector as for `update_column()`. Zero on entry and on
    ///         return.
    ///
    ///     pivot_row
    ///
    ///         Basis position of the leaving column.
    ///
    ///     pivot_check
    ///
    ///         Entry `pivot_row` of the solution returned by
    ///         `update_column_ft()`. The new pivot is checked against it.
    ///
    /// Return:
    ///
    ///     OK                    the update was done
    ///     WarningMarginalPivot  done, but the new pivot differs from
    ///                           `pivot_check` by more than 1e-5 relative
    ///     ErrorSingularUpdate   the new pivot is zero or differs by more than
    ///                           1e-1 relative; nothing changed
    ///     ErrorNoRoom           no spike is staged or a file is full; nothing
    ///                           changed
    ///     ErrorMaximumPivots    refactorize first; nothing changed
    pub fn replace_column_ft(
        &mut self,
        region: &mut IndexedVector,
        pivot_row: usize,
        pivot_check: f64,
    ) -> Status {
        debug_assert!(region.is_empty() && !region.packed);
        let t = self.number_pivots;
        if t >= self.pivot_limit() {
            debug!("Forrest-Tomlin update rejected: {} pivots", t);
            return Status::ErrorMaximumPivots;
        }
        if !self.forrest_tomlin || !self.ft_staged {
            debug!("Forrest-Tomlin update rejected: no spike staged");
            return Status::ErrorNoRoom;
        }
        let r = self.pivot_column[pivot_row];
        let k = self.number_rows_extra;
        let spike = self.u_cols.range(k);

        // Row r of U, solved with the rows below it, gives the multipliers.
        // Stored values are divided by their column pivot, which the solve
        // with Uᵗ multiplies back in.
        for s in self.u_rows.range(r) {
            let c = self.u_col_index[s];
            region.insert(c, self.u_value[self.u_convert[s]] / self.pivot_region[c]);
        }
        self.update_column_transpose_u(region);

        let mut new_pivot = 0.0;
        for p in spike.clone() {
            let i = self.u_index[p];
            if i == r {
                new_pivot += self.u_value[p];
            } else {
                new_pivot -= region.elements[i] * self.u_value[p];
            }
        }
        let expected = pivot_check / self.pivot_region[r];
        let error = (new_pivot - expected).abs() / (1.0 + new_pivot.abs());
        if new_pivot.abs() <= FT_SINGULAR || error > FT_REJECT_ERROR {
            debug!(
                "Forrest-Tomlin update rejected: pivot {:e}, expected {:e}",
                new_pivot, expected
            );
            region.clear();
            return Status::ErrorSingularUpdate;
        }
        let status = if error > FT_WARN_ERROR {
            Status::WarningMarginalPivot
        } else {
            Status::OK
        };

        if !self.room_for_update(region, r, spike.clone()) {
            debug!("Forrest-Tomlin update rejected: no room");
            region.clear();
            return Status::ErrorNoRoom;
        }

        // Remove column r and row r from U.
        for p in self.u_cols.range(r) {
            let i = self.u_index[p];
            self.remove_from_row(i, r);
        }
        self.u_cols.release(r);
        for s in self.u_rows.range(r) {
            let c = self.u_col_index[s];
            let p = self.u_convert[s];
            self.remove_from_column(c, p);
        }
        self.u_rows.release(r);

        // The spike becomes column k.
        let tolerance = self.zero_tolerance;
        let scale = 1.0 / new_pivot;
        let mut put = spike.start;
        for p in spike.clone() {
            let i = self.u_index[p];
            let value = self.u_value[p];
            if i != r && value.abs() > tolerance {
                self.u_index[put] = i;
                self.u_value[put] = value * scale;
                put += 1;
            }
        }
        debug_assert_eq!(spike.start, self.u_cols.used());
        self.u_cols.place(k, put - spike.start, 0);
        for p in self.u_cols.range(k) {
            let i = self.u_index[p];
            debug_assert!(self.u_rows.room(i) >= 1);
            let s = self.u_rows.end[i];
            self.u_col_index[s] = k;
            self.u_convert[s] = p;
            self.u_rows.end[i] = s + 1;
        }

        // The row eta.
        let mut q = self.r_start[t];
        for &c in region.indices() {
            self.r_index[q] = c;
            self.r_value[q] = region.elements[c];
            q += 1;
        }
        self.r_start[t + 1] = q;
        if let Some(rows) = self.r_rows.as_mut() {
            for &c in region.indices() {
                debug_assert!(rows.file.room(c) >= 1);
                rows.push(c, k, region.elements[c]);
            }
        }
        region.clear();

        self.permute[k] = r;
        self.pivot_column[pivot_row] = k;
        self.pivot_column_back[k] = pivot_row;
        self.pivot_region[k] = scale;
        self.pivot_region[r] = 0.0;
        self.number_rows_extra = k + 1;
        self.number_pivots = t + 1;
        self.ft_staged = false;

        #[cfg(feature = "debug_extra")]
        self.assert_consistent();

        status
    }

    // Every row of the spike and every line of the row copy of R named by a
    // multiplier gains one entry. Make room for them before anything is
    // changed. Lines are only moved, so a false return leaves the factors
    // as they were.
    fn room_for_update(
        &mut self,
        multipliers: &IndexedVector,
        r: usize,
        spike: Range<usize>,
    ) -> bool {
        if self.r_start[self.number_pivots] + multipliers.nnz > self.r_index.len() {
            return false;
        }
        let tolerance = self.zero_tolerance;
        let rows: Vec<usize> = spike
            .filter(|&p| self.u_index[p] != r && self.u_value[p].abs() > tolerance)
            .map(|p| self.u_index[p])
            .collect();
        let (pad, stretch) = (self.pad, self.stretch);
        let file = &mut self.u_rows;
        if !make_room(file, &rows, 1, pad, stretch, &mut self.u_col_index, &mut self.u_convert) {
            return false;
        }
        if let Some(copy) = self.r_rows.as_mut() {
            let lines = multipliers.indices();
            let file = &mut copy.file;
            if !make_room(file, lines, 1, pad, stretch, &mut copy.index, &mut copy.value) {
                return false;
            }
        }
        true
    }

    /// Purpose:
    ///
    ///     Give row `which_row` of U the entries `values` in the pivot
    ///     positions `columns`. The row must be a singleton: its column holds
    ///     no entries and its pivot is ±1. Any entries the row had before are
    ///     removed.
    ///
    ///     Values are unscaled entries of U. Each column must be an active
    ///     pivot position after `which_row` that is not a slack.
    ///
    /// Return:
    ///
    ///     Ok(Status::OK)
    ///
    ///         The row was replaced.
    ///
    ///     Ok(Status::ErrorNoRoom)
    ///
    ///         A file is full. Nothing changed.
    ///
    ///     Err(FactorError)
    ///
    ///         The row or a column is not admissible. Nothing changed.
    pub fn replace_row(
        &mut self,
        which_row: usize,
        columns: &[usize],
        values: &[f64],
    ) -> Result<Status, FactorError> {
        if columns.len() != values.len() {
            return Err(FactorError::Dimension(format!(
                "{} columns but {} values",
                columns.len(),
                values.len()
            )));
        }
        self.check_singleton_row(which_row)?;
        let admissible = |c: usize| {
            c > which_row
                && c < self.number_rows_extra
                && c >= self.number_slacks
                && self.pivot_region[c] != 0.0
        };
        let repeated = columns.iter().enumerate().any(|(k, c)| columns[..k].contains(c));
        if repeated || !columns.iter().all(|&c| admissible(c)) {
            return Err(FactorError::InvalidRowReplacement(which_row));
        }
        if columns.is_empty() {
            return Ok(Status::OK);
        }

        let old: Vec<usize> = self
            .u_rows
            .range(which_row)
            .map(|s| self.u_col_index[s])
            .collect();
        if !old.is_empty()
            && (old.len() != columns.len() || old.iter().any(|c| !columns.contains(c)))
        {
            warn!(
                "row {}: pattern {:?} replaced by {:?}",
                which_row, old, columns
            );
        }

        // Room first: the row reuses its own slots, and only columns not in
        // the old pattern grow.
        let grow = columns.len().saturating_sub(old.len());
        let (pad, stretch) = (self.pad, self.stretch);
        let file = &mut self.u_rows;
        if grow > 0
            && !make_room(
                file,
                &[which_row],
                grow,
                pad,
                stretch,
                &mut self.u_col_index,
                &mut self.u_convert,
            )
        {
            debug!("row {}: no room in row file", which_row);
            return Ok(Status::ErrorNoRoom);
        }
        let added: Vec<usize> = columns
            .iter()
            .copied()
            .filter(|c| !old.contains(c))
            .collect();
        if !self.reserve_columns(&added) {
            debug!("row {}: no room in column file", which_row);
            return Ok(Status::ErrorNoRoom);
        }

        for s in self.u_rows.range(which_row) {
            let c = self.u_col_index[s];
            let p = self.u_convert[s];
            self.remove_from_column(c, p);
        }
        self.u_rows.end[which_row] = self.u_rows.begin[which_row];
        debug_assert!(self.u_rows.room(which_row) >= columns.len());
        for (&c, &value) in columns.iter().zip(values) {
            debug_assert!(self.u_cols.room(c) >= 1);
            let p = self.u_cols.end[c];
            self.u_index[p] = which_row;
            self.u_value[p] = value * self.pivot_region[c];
            self.u_cols.end[c] = p + 1;
            let s = self.u_rows.end[which_row];
            self.u_col_index[s] = c;
            self.u_convert[s] = p;
            self.u_rows.end[which_row] = s + 1;
        }

        #[cfg(feature = "debug_extra")]
        self.assert_consistent();

        Ok(Status::OK)
    }

    /// Remove all entries of U in the given rows. Each row must be a
    /// singleton as for `replace_row()`. The row file is rebuilt.
    pub fn empty_rows(&mut self, rows: &[usize]) -> Result<(), FactorError> {
        let number_u = self.number_rows_extra;
        let mut delete = vec![false; number_u];
        for &i in rows {
            self.check_singleton_row(i)?;
            delete[i] = true;
        }
        for j in 0..number_u {
            let mut put = self.u_cols.begin[j];
            for p in self.u_cols.range(j) {
                if !delete[self.u_index[p]] {
                    self.u_index[put] = self.u_index[p];
                    self.u_value[put] = self.u_value[p];
                    put += 1;
                }
            }
            self.u_cols.end[j] = put;
        }
        self.build_row_file();

        #[cfg(feature = "debug_extra")]
        self.assert_consistent();

        Ok(())
    }

    fn check_singleton_row(&self, i: usize) -> Result<(), FactorError> {
        if i < self.number_rows_extra
            && self.u_cols.len(i) == 0
            && self.pivot_region[i].abs() == 1.0
        {
            Ok(())
        } else {
            Err(FactorError::InvalidRowReplacement(i))
        }
    }

    /// Lay out the row file of U from the column file, with room behind each
    /// row if it fits. Retired positions get no line.
    pub(crate) fn build_row_file(&mut self) {
        let number_u = self.number_rows_extra;
        let area = self.u_col_index.len();
        let mut count = vec![0; number_u];
        for j in 0..number_u {
            for p in self.u_cols.range(j) {
                count[self.u_index[p]] += 1;
            }
        }
        let room = self.padding(&count, area, self.number_rows);
        let mut rows = LineFile::new(self.maximum_rows_extra, area);
        for i in 0..number_u {
            if self.pivot_region[i] != 0.0 {
                rows.place(i, count[i], room(count[i]));
            }
        }
        let mut fill = rows.begin.clone();
        for j in 0..number_u {
            for p in self.u_cols.range(j) {
                let i = self.u_index[p];
                self.u_col_index[fill[i]] = j;
                self.u_convert[fill[i]] = p;
                fill[i] += 1;
            }
        }
        self.u_rows = rows;
    }
}
