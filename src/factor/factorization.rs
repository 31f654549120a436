// Copyright (C) 2016-2018 ERGO-Code
// Copyright (C) 2022-2023 Richard Lincoln

use log::debug;

use crate::factor::def::{CostWeights, RStrategy, UStrategy};
use crate::factor::file::LineFile;
use crate::factor::sparse::{LineCopy, RowCopy};
use crate::factor::stats::FactorStats;
use crate::factor::work::SparseWork;
use crate::factor::FactorData;
use crate::FactorError;

/// Factorization `B = L·R⁻¹·U` (Forrest–Tomlin) or `B = L·U·E₁⋯Eₖ` (PFI) of a
/// square basis matrix, updated in place as basis columns are exchanged.
///
/// Indices `0..number_rows` are the pivot positions of the loaded factors.
/// Each Forrest–Tomlin update retires one position and appends a new one, so
/// positions run up to `number_rows_extra`.
#[derive(Debug)]
pub struct Factorization {
    pub(crate) pivot_tolerance: f64,
    pub(crate) zero_tolerance: f64,
    pub(crate) slack_value: f64,
    pub(crate) maximum_pivots: usize,
    pub(crate) sparse_threshold: usize,
    pub(crate) sparse_threshold2: usize,
    pub(crate) forrest_tomlin: bool,
    pub(crate) weights: CostWeights,

    /// Length of the U files, or 0 to size them from the loaded factors.
    /// Default: 0
    pub u_mem: usize,
    /// Length of the R file, or 0 to size it from the loaded factors.
    /// Default: 0
    pub r_mem: usize,
    /// Automatic sizing reserves `area_factor * (nz + m) + m` elements.
    /// Default: 3.0
    pub area_factor: f64,
    /// When a line of a file is moved, `pad + stretch * nz` elements room are
    /// left behind it for later fill-in. Default: 4
    pub pad: usize,
    /// Default: 0.3
    pub stretch: f64,

    pub(crate) number_rows: usize,
    pub(crate) number_slacks: usize,
    pub(crate) number_rows_extra: usize,
    pub(crate) maximum_rows_extra: usize,
    pub(crate) number_pivots: usize,

    // L by columns, strictly lower triangular
    pub(crate) l_start: Vec<usize>,
    pub(crate) l_index: Vec<usize>,
    pub(crate) l_value: Vec<f64>,
    pub(crate) l_rows: Option<RowCopy>,

    // U by columns (scaled by the pivot) and by rows; u_convert maps a
    // row file slot to the column file slot holding its value
    pub(crate) u_cols: LineFile,
    pub(crate) u_index: Vec<usize>,
    pub(crate) u_value: Vec<f64>,
    pub(crate) u_rows: LineFile,
    pub(crate) u_col_index: Vec<usize>,
    pub(crate) u_convert: Vec<usize>,
    pub(crate) pivot_region: Vec<f64>,

    // R etas, one column per Forrest–Tomlin update, and their row copy
    pub(crate) r_start: Vec<usize>,
    pub(crate) r_index: Vec<usize>,
    pub(crate) r_value: Vec<f64>,
    pub(crate) r_rows: Option<LineCopy>,

    // PFI etas; entries live in u_index/u_value behind the column file
    pub(crate) pfi_start: Vec<usize>,
    pub(crate) pfi_pivot: Vec<usize>,
    pub(crate) pfi_pivot_region: Vec<f64>,

    // permute[r] is the position of original row r; for k >= number_rows,
    // permute[k] is the position retired by update k.
    pub(crate) permute: Vec<usize>,
    pub(crate) permute_back: Vec<usize>,
    // basis position <-> pivot position
    pub(crate) pivot_column: Vec<usize>,
    pub(crate) pivot_column_back: Vec<usize>,

    pub(crate) work: Option<SparseWork>,
    /// The column file holds a spike behind its last line.
    pub(crate) ft_staged: bool,
    pub(crate) stats: FactorStats,
    pub(crate) forced_u: Option<UStrategy>,
    pub(crate) forced_r: Option<RStrategy>,
}

impl Default for Factorization {
    fn default() -> Self {
        Self {
            pivot_tolerance: 0.1,
            zero_tolerance: 1.0e-13,
            slack_value: 1.0,
            maximum_pivots: 200,
            sparse_threshold: 0,
            sparse_threshold2: 0,
            forrest_tomlin: true,
            weights: CostWeights::default(),
            u_mem: 0,
            r_mem: 0,
            area_factor: 3.0,
            pad: 4,
            stretch: 0.3,
            number_rows: 0,
            number_slacks: 0,
            number_rows_extra: 0,
            maximum_rows_extra: 0,
            number_pivots: 0,
            l_start: vec![0],
            l_index: Vec::new(),
            l_value: Vec::new(),
            l_rows: None,
            u_cols: LineFile::new(0, 0),
            u_index: Vec::new(),
            u_value: Vec::new(),
            u_rows: LineFile::new(0, 0),
            u_col_index: Vec::new(),
            u_convert: Vec::new(),
            pivot_region: Vec::new(),
            r_start: vec![0],
            r_index: Vec::new(),
            r_value: Vec::new(),
            r_rows: None,
            pfi_start: vec![0],
            pfi_pivot: Vec::new(),
            pfi_pivot_region: Vec::new(),
            permute: Vec::new(),
            permute_back: Vec::new(),
            pivot_column: Vec::new(),
            pivot_column_back: Vec::new(),
            work: None,
            ft_staged: false,
            stats: FactorStats {
                collect: true,
                ..Default::default()
            },
            forced_u: None,
            forced_r: None,
        }
    }
}

impl Clone for Factorization {
    /// Deep copy. Every file keeps its length so that later updates run
    /// out of room exactly when they would in `self`. The row copy of
    /// L and the scratch are rebuilt.
    fn clone(&self) -> Self {
        let mut copy = Self {
            pivot_tolerance: self.pivot_tolerance,
            zero_tolerance: self.zero_tolerance,
            slack_value: self.slack_value,
            maximum_pivots: self.maximum_pivots,
            sparse_threshold: self.sparse_threshold,
            sparse_threshold2: self.sparse_threshold2,
            forrest_tomlin: self.forrest_tomlin,
            weights: self.weights,
            u_mem: self.u_mem,
            r_mem: self.r_mem,
            area_factor: self.area_factor,
            pad: self.pad,
            stretch: self.stretch,
            number_rows: self.number_rows,
            number_slacks: self.number_slacks,
            number_rows_extra: self.number_rows_extra,
            maximum_rows_extra: self.maximum_rows_extra,
            number_pivots: self.number_pivots,
            l_start: self.l_start.clone(),
            l_index: self.l_index.clone(),
            l_value: self.l_value.clone(),
            l_rows: None,
            u_cols: self.u_cols.clone(),
            u_index: self.u_index.clone(),
            u_value: self.u_value.clone(),
            u_rows: self.u_rows.clone(),
            u_col_index: self.u_col_index.clone(),
            u_convert: self.u_convert.clone(),
            pivot_region: self.pivot_region.clone(),
            r_start: self.r_start.clone(),
            r_index: self.r_index.clone(),
            r_value: self.r_value.clone(),
            r_rows: self.r_rows.clone(),
            pfi_start: self.pfi_start.clone(),
            pfi_pivot: self.pfi_pivot.clone(),
            pfi_pivot_region: self.pfi_pivot_region.clone(),
            permute: self.permute.clone(),
            permute_back: self.permute_back.clone(),
            pivot_column: self.pivot_column.clone(),
            pivot_column_back: self.pivot_column_back.clone(),
            work: None,
            ft_staged: self.ft_staged,
            stats: self.stats.clone(),
            forced_u: self.forced_u,
            forced_r: self.forced_r,
        };
        if self.work.is_some() {
            copy.build_sparse();
        }
        copy
    }
}

impl Factorization {
    pub fn new() -> Self {
        Self::default()
    }

    /// Purpose:
    ///
    ///     Take over the factors of a new basis. All updates are discarded,
    ///     statistics are rolled into averages and the sparse mode is set up
    ///     for the new dimension.
    ///
    /// Return:
    ///
    ///     Ok(())
    ///
    ///         The factors were loaded.
    ///
    ///     Err(FactorError)
    ///
    ///         `data` is malformed, or `u_mem`/`r_mem` are set too small.
    ///         The previous factors are left in place.
    pub fn load(&mut self, data: &FactorData) -> Result<(), FactorError> {
        data.validate(self.slack_value)?;
        let m = data.number_rows;
        let capacity = self.maximum_pivots;
        let max_extra = m + capacity;

        let u_nz = data.u_len();
        let l_nz = data.l_len();
        let u_area = area(self.u_mem, u_nz, u_nz, m, self.area_factor, "U")?;
        let r_area = area(self.r_mem, 0, l_nz, m, self.area_factor, "R")?;

        // U by columns, scaled
        let mut col_count = vec![0; m];
        for j in 0..m {
            col_count[j] = data.u_start[j + 1] - data.u_start[j];
        }
        let room = self.padding(&col_count, u_area, m);
        let mut u_cols = LineFile::new(max_extra, u_area);
        let mut u_index = vec![0; u_area];
        let mut u_value = vec![0.0; u_area];
        let mut pivot_region = vec![0.0; max_extra];
        for j in 0..m {
            let put = u_cols.used();
            let pivot = data.u_pivot[j];
            for (k, p) in (data.u_start[j]..data.u_start[j + 1]).enumerate() {
                u_index[put + k] = data.u_index[p];
                u_value[put + k] = data.u_value[p] / pivot;
            }
            u_cols.place(j, col_count[j], room(col_count[j]));
            pivot_region[j] = 1.0 / pivot;
        }

        let mut permute = vec![0; max_extra];
        permute[..m].copy_from_slice(&data.permute);
        let mut permute_back = vec![0; m];
        for (r, &i) in data.permute.iter().enumerate() {
            permute_back[i] = r;
        }
        let mut pivot_column_back = vec![0; max_extra];
        pivot_column_back[..m].copy_from_slice(&data.pivot_column_back);
        let mut pivot_column = vec![0; m];
        for (j, &pos) in data.pivot_column_back.iter().enumerate() {
            pivot_column[pos] = j;
        }

        self.number_rows = m;
        self.number_slacks = data.number_slacks;
        self.number_rows_extra = m;
        self.maximum_rows_extra = max_extra;
        self.number_pivots = 0;

        self.l_start = data.l_start.clone();
        self.l_index = data.l_index[..l_nz].to_vec();
        self.l_value = data.l_value[..l_nz].to_vec();
        self.l_rows = None;

        self.u_cols = u_cols;
        self.u_index = u_index;
        self.u_value = u_value;
        self.u_col_index = vec![0; u_area];
        self.u_convert = vec![0; u_area];
        self.pivot_region = pivot_region;
        self.build_row_file();

        self.r_start = vec![0; capacity + 1];
        self.r_index = vec![0; r_area];
        self.r_value = vec![0.0; r_area];
        self.r_rows = None;

        self.pfi_start = vec![0; capacity + 1];
        self.pfi_pivot = vec![0; capacity];
        self.pfi_pivot_region = vec![0.0; capacity];

        self.permute = permute;
        self.permute_back = permute_back;
        self.pivot_column = pivot_column;
        self.pivot_column_back = pivot_column_back;

        self.work = None;
        self.ft_staged = false;
        self.stats.roll();

        debug!(
            "loaded factors: m = {}, slacks = {}, nnz(L) = {}, nnz(U) = {}, U area = {}, R area = {}",
            m, self.number_slacks, l_nz, u_nz, u_area, r_area
        );

        self.go_sparse();

        #[cfg(feature = "debug_extra")]
        self.assert_consistent();

        Ok(())
    }

    // Room left behind each line when the padded layout fits into `area`
    // with a full column to spare.
    pub(crate) fn padding(&self, counts: &[usize], area: usize, m: usize) -> impl Fn(usize) -> usize {
        let (pad, stretch) = (self.pad, self.stretch);
        let room = move |nz: usize| pad + (stretch * nz as f64) as usize;
        let padded: usize = counts.iter().map(|&nz| nz + room(nz)).sum();
        let fits = padded + m <= area;
        move |nz| if fits { room(nz) } else { 0 }
    }

    pub fn number_rows(&self) -> usize {
        self.number_rows
    }

    /// One past the largest pivot position in use.
    pub fn number_rows_extra(&self) -> usize {
        self.number_rows_extra
    }

    /// Largest number of pivot positions, `number_rows() + maximum_pivots()`
    /// at the time of loading. Scratch vectors need this capacity.
    pub fn maximum_rows_extra(&self) -> usize {
        self.maximum_rows_extra
    }

    /// Number of updates since the factors were loaded.
    pub fn number_pivots(&self) -> usize {
        self.number_pivots
    }

    pub fn number_slacks(&self) -> usize {
        self.number_slacks
    }

    pub(crate) fn pivot_limit(&self) -> usize {
        self.maximum_pivots
            .min(self.maximum_rows_extra - self.number_rows)
    }

    /// Nonzeros in L.
    pub fn l_elements(&self) -> usize {
        self.l_start[self.number_rows]
    }

    /// Nonzeros in U, not counting the diagonal.
    pub fn u_elements(&self) -> usize {
        (0..self.number_rows_extra)
            .map(|j| self.u_cols.len(j))
            .sum()
    }

    /// Length of the U files. The entries of U and a staged spike must fit.
    pub fn u_capacity(&self) -> usize {
        self.u_cols.limit()
    }

    /// Nonzeros in the Forrest–Tomlin etas.
    pub fn r_elements(&self) -> usize {
        self.r_size()
    }

    pub(crate) fn r_size(&self) -> usize {
        if self.forrest_tomlin {
            self.r_start[self.number_pivots]
        } else {
            0
        }
    }

    /// Nonzeros in the PFI etas.
    pub fn pfi_elements(&self) -> usize {
        if self.forrest_tomlin {
            0
        } else {
            self.pfi_start[self.number_pivots] - self.pfi_start[0]
        }
    }

    /// Pivot tolerance handed to the decomposition. Default: 0.1
    pub fn pivot_tolerance(&self) -> f64 {
        self.pivot_tolerance
    }

    pub fn set_pivot_tolerance(&mut self, value: f64) -> Result<(), FactorError> {
        if value > 0.0 && value <= 1.0 {
            self.pivot_tolerance = value;
            Ok(())
        } else {
            Err(FactorError::InvalidParameter {
                name: "pivot_tolerance",
                value,
            })
        }
    }

    /// Values with magnitude at or below this are treated as zero.
    /// Default: 1e-13
    pub fn zero_tolerance(&self) -> f64 {
        self.zero_tolerance
    }

    pub fn set_zero_tolerance(&mut self, value: f64) -> Result<(), FactorError> {
        if value > 0.0 && value < 1.0 {
            self.zero_tolerance = value;
            Ok(())
        } else {
            Err(FactorError::InvalidParameter {
                name: "zero_tolerance",
                value,
            })
        }
    }

    /// Diagonal of a slack column, +1 or -1. Default: +1
    pub fn slack_value(&self) -> f64 {
        self.slack_value
    }

    /// Set the slack value to +1 for `value >= 0` and to -1 otherwise.
    ///
    /// Takes effect at the next load: loaded factors keep their slack
    /// pivots, and the slack columns of the next factors must match.
    pub fn set_slack_value(&mut self, value: f64) {
        self.slack_value = if value >= 0.0 { 1.0 } else { -1.0 };
    }

    /// Updates allowed before refactorization. Default: 200
    ///
    /// Files are sized for this value when factors are loaded; raising it
    /// takes effect at the next load.
    pub fn maximum_pivots(&self) -> usize {
        self.maximum_pivots
    }

    pub fn set_maximum_pivots(&mut self, value: usize) -> Result<(), FactorError> {
        if value > 0 {
            self.maximum_pivots = value;
            Ok(())
        } else {
            Err(FactorError::InvalidParameter {
                name: "maximum_pivots",
                value: value as f64,
            })
        }
    }

    /// True if updates use Forrest–Tomlin, false for PFI. Default: true
    pub fn forrest_tomlin(&self) -> bool {
        self.forrest_tomlin
    }

    pub fn set_forrest_tomlin(&mut self, value: bool) -> Result<(), FactorError> {
        if self.number_pivots > 0 && value != self.forrest_tomlin {
            return Err(FactorError::PivotsPending(self.number_pivots));
        }
        self.forrest_tomlin = value;
        self.ft_staged = false;
        Ok(())
    }

    pub fn cost_weights(&self) -> &CostWeights {
        &self.weights
    }

    pub fn set_cost_weights(&mut self, weights: CostWeights) {
        self.weights = weights;
    }

    /// Bypass the cost model for U in forward solves. A sparse or bitmap
    /// choice falls back to the dense scan when the sparse mode is off.
    pub fn force_u_strategy(&mut self, strategy: Option<UStrategy>) {
        self.forced_u = strategy;
    }

    /// Bypass the cost model for R. A choice whose structures are missing
    /// falls back to the dot product form.
    pub fn force_r_strategy(&mut self, strategy: Option<RStrategy>) {
        self.forced_r = strategy;
    }

    pub fn stats(&self) -> &FactorStats {
        &self.stats
    }

    /// Zero all counts and averages and stop collecting.
    pub fn reset_statistics(&mut self) {
        self.stats.reset();
    }

    pub fn set_collect_statistics(&mut self, collect: bool) {
        self.stats.collect = collect;
    }
}

// File length: `mem` if set, else sized from `nz_hint`. Must hold `need`.
fn area(
    mem: usize,
    need: usize,
    nz_hint: usize,
    m: usize,
    factor: f64,
    what: &'static str,
) -> Result<usize, FactorError> {
    if mem == 0 {
        return Ok(((factor * (nz_hint + m) as f64) as usize + m).max(need));
    }
    if mem < need {
        return Err(FactorError::InsufficientMemory {
            what,
            need,
            have: mem,
        });
    }
    Ok(mem)
}
