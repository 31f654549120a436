// Copyright (C) 2016-2018 ERGO-Code
// Copyright (C) 2022-2023 Richard Lincoln

use log::debug;

use crate::factor::def::auto_thresholds;
use crate::factor::file::LineFile;
use crate::factor::work::SparseWork;
use crate::Factorization;

/// Static row copy of L.
#[derive(Debug, Clone, Default)]
pub(crate) struct RowCopy {
    pub(crate) start: Vec<usize>,
    pub(crate) index: Vec<usize>,
    pub(crate) value: Vec<f64>,
}

impl RowCopy {
    pub(crate) fn row(&self, i: usize) -> std::ops::Range<usize> {
        self.start[i]..self.start[i + 1]
    }
}

/// Row copy of R that grows with every update. Line `c` holds `(k, value)`
/// for each eta `k` with an entry in row `c`.
#[derive(Debug, Clone, Default)]
pub(crate) struct LineCopy {
    pub(crate) file: LineFile,
    pub(crate) index: Vec<usize>,
    pub(crate) value: Vec<f64>,
}

impl Factorization {
    /// Sparse threshold. 0 means the sparse mode is off.
    pub fn sparse_threshold(&self) -> usize {
        self.sparse_threshold
    }

    /// Upper threshold of the bitmap band.
    pub fn sparse_threshold2(&self) -> usize {
        self.sparse_threshold2
    }

    /// True if the row copies and scratch for the sparse solves exist.
    pub fn is_sparse(&self) -> bool {
        self.work.is_some()
    }

    /// Set the sparse threshold.
    ///
    /// 0 turns the sparse mode off and frees its structures. With the sparse
    /// mode on, a positive value replaces both thresholds. With it off, a value
    /// above 1 is used as threshold and 1 picks one from the dimension; the
    /// sparse mode is then switched on if the threshold is positive.
    pub fn set_sparse_threshold(&mut self, value: usize) {
        if value > 0 && self.sparse_threshold > 0 {
            self.sparse_threshold = value;
            self.sparse_threshold2 = value;
        } else if value == 0 && self.sparse_threshold > 0 {
            self.sparse_threshold = 0;
            self.sparse_threshold2 = 0;
            self.l_rows = None;
            self.r_rows = None;
            self.work = None;
        } else if value > 0 && self.sparse_threshold == 0 {
            self.sparse_threshold = if value > 1 { value } else { 0 };
            self.sparse_threshold2 = self.sparse_threshold;
            self.go_sparse();
        }
    }

    /// Choose thresholds and build the structures of the sparse mode.
    ///
    /// With no threshold set, one is chosen from the dimension: none up to 300
    /// rows, else a capped fraction of the rows, with a quarter of the rows as
    /// bitmap bound.
    pub(crate) fn go_sparse(&mut self) {
        if self.sparse_threshold == 0 {
            let (t, t2) = auto_thresholds(self.number_rows);
            self.sparse_threshold = t;
            self.sparse_threshold2 = t2;
        } else {
            self.sparse_threshold2 = self.sparse_threshold;
        }
        if self.sparse_threshold == 0 || self.number_rows == 0 {
            return;
        }
        self.build_sparse();
        debug!(
            "sparse mode: threshold = {}, threshold2 = {}",
            self.sparse_threshold, self.sparse_threshold2
        );
    }

    pub(crate) fn build_sparse(&mut self) {
        self.work = Some(SparseWork::new(self.maximum_rows_extra));
        self.l_rows = Some(self.l_row_copy());
        if self.r_rows.is_none() {
            self.r_rows = Some(self.r_row_copy());
        }
    }

    // Row copy of L by counting sort. Columns are inserted last to first so
    // every row lists its columns in increasing order.
    fn l_row_copy(&self) -> RowCopy {
        let m = self.number_rows;
        let nz = self.l_start[m];
        let mut start = vec![0; m + 1];
        for &i in &self.l_index[..nz] {
            start[i] += 1;
        }
        // convert counts to ends
        let mut count = 0;
        for s in start.iter_mut().take(m) {
            count += *s;
            *s = count;
        }
        start[m] = count;
        let mut index = vec![0; nz];
        let mut value = vec![0.0; nz];
        for j in (0..m).rev() {
            for p in self.l_start[j]..self.l_start[j + 1] {
                let i = self.l_index[p];
                start[i] -= 1;
                index[start[i]] = j;
                value[start[i]] = self.l_value[p];
            }
        }
        RowCopy {
            start,
            index,
            value,
        }
    }

    fn r_row_copy(&self) -> LineCopy {
        let m = self.number_rows;
        let area = self.r_index.len();
        let mut count = vec![0; self.maximum_rows_extra];
        let size = self.r_size();
        for &c in &self.r_index[..size] {
            count[c] += 1;
        }
        let mut file = LineFile::new(self.maximum_rows_extra, area);
        for (c, &n) in count.iter().enumerate() {
            if n > 0 {
                file.place(c, n, 0);
            }
        }
        let mut index = vec![0; area];
        let mut value = vec![0.0; area];
        let mut fill = file.begin.clone();
        if self.forrest_tomlin {
            for t in 0..self.number_pivots {
                for p in self.r_start[t]..self.r_start[t + 1] {
                    let c = self.r_index[p];
                    index[fill[c]] = m + t;
                    value[fill[c]] = self.r_value[p];
                    fill[c] += 1;
                }
            }
        }
        LineCopy { file, index, value }
    }
}
