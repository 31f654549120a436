// Copyright (C) 2016-2018 ERGO-Code
// Copyright (C) 2022-2023 Richard Lincoln

use log::trace;

use crate::factor::file::LineFile;
use crate::factor::sparse::LineCopy;
use crate::Factorization;

/// Give each of `lines` room for `grow` more entries. Lines short of room
/// are moved to the end of the file if they all fit there, with `pad +
/// stretch·len` extra room if that fits too. Otherwise the file is packed
/// with exactly the room needed behind each. Returns false, with no line
/// moved, if the entries do not fit into the file at all.
pub(crate) fn make_room<A: Copy, B: Copy>(
    file: &mut LineFile,
    lines: &[usize],
    grow: usize,
    pad: usize,
    stretch: f64,
    a: &mut [A],
    b: &mut [B],
) -> bool {
    let short: Vec<usize> = lines
        .iter()
        .copied()
        .filter(|&line| file.room(line) < grow)
        .collect();
    let padded = |len: usize| grow + pad + (stretch * (len + grow) as f64) as usize;
    let exact: usize = short.iter().map(|&line| file.len(line) + grow).sum();
    if exact <= file.free() {
        let with_pad: usize = short
            .iter()
            .map(|&line| file.len(line) + padded(file.len(line)))
            .sum();
        let padding = with_pad <= file.free();
        for &line in &short {
            let extra = if padding { padded(file.len(line)) } else { grow };
            file.reappend(line, extra, a, b);
        }
        return true;
    }
    if file.entries() + lines.len() * grow > file.limit() {
        return false;
    }
    let mut room = vec![0; file.nlines()];
    for &line in lines {
        room[line] = grow;
    }
    file.compress_with_room(a, b, &room);
    trace!("packed line file with room for {} lines", lines.len());
    true
}

impl Factorization {
    /// Pack the column file of U and repair the cross reference. Any staged
    /// spike is lost.
    pub(crate) fn compress_columns(&mut self, stretch: f64, pad: usize) {
        let old_begin = self
            .u_cols
            .compress(&mut self.u_index, &mut self.u_value, stretch, pad);
        for i in self.u_rows.lines() {
            for s in self.u_rows.range(i) {
                let j = self.u_col_index[s];
                self.u_convert[s] = self.u_convert[s] - old_begin[j] + self.u_cols.begin[j];
            }
        }
        self.ft_staged = false;
        trace!("compressed U columns: {} used", self.u_cols.used());
    }

    /// Give each of `columns` of U room for one more entry. Moved columns
    /// get their cross reference repaired. Returns false, with nothing
    /// moved, if the column file is too small. Any staged spike is lost.
    pub(crate) fn reserve_columns(&mut self, columns: &[usize]) -> bool {
        let old_begin = self.u_cols.begin.clone();
        let (pad, stretch) = (self.pad, self.stretch);
        let file = &mut self.u_cols;
        if !make_room(file, columns, 1, pad, stretch, &mut self.u_index, &mut self.u_value) {
            return false;
        }
        if self.u_cols.begin != old_begin {
            self.ft_staged = false;
            for i in self.u_rows.lines() {
                for s in self.u_rows.range(i) {
                    let j = self.u_col_index[s];
                    self.u_convert[s] = self.u_convert[s] - old_begin[j] + self.u_cols.begin[j];
                }
            }
        }
        true
    }

    /// Slot of column `j` in row `i` of the row file.
    pub(crate) fn row_slot(&self, i: usize, j: usize) -> Option<usize> {
        self.u_rows.range(i).find(|&s| self.u_col_index[s] == j)
    }

    /// Delete the entry of column `j` in row `i` from the row file.
    pub(crate) fn remove_from_row(&mut self, i: usize, j: usize) {
        if let Some(s) = self.row_slot(i, j) {
            let last = self.u_rows.end[i] - 1;
            self.u_col_index[s] = self.u_col_index[last];
            self.u_convert[s] = self.u_convert[last];
            self.u_rows.end[i] = last;
        }
    }

    /// Delete the entry in column file slot `p` of column `j`, moving the
    /// last entry of the column into its place.
    pub(crate) fn remove_from_column(&mut self, j: usize, p: usize) {
        let last = self.u_cols.end[j] - 1;
        if p != last {
            let i = self.u_index[last];
            self.u_index[p] = i;
            self.u_value[p] = self.u_value[last];
            if let Some(s) = self.row_slot(i, j) {
                self.u_convert[s] = p;
            }
        }
        self.u_cols.end[j] = last;
    }
}

impl LineCopy {
    pub(crate) fn push(&mut self, line: usize, index: usize, value: f64) {
        let put = self.file.end[line];
        self.index[put] = index;
        self.value[put] = value;
        self.file.end[line] = put + 1;
    }
}
