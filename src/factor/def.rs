// Copyright (C) 2016-2018 ERGO-Code
// Copyright (C) 2022-2023 Richard Lincoln

/// Rows covered by one byte of the U bitmap.
pub(crate) const BITS_PER_CHECK: usize = 8;
pub(crate) const CHECK_SHIFT: usize = 3;

/// Cost attributed to a strategy that cannot run.
pub(crate) const COST_UNAVAILABLE: f64 = 1.0e100;

// PFI pivot acceptance. The first pivot after loading has no marginal band.
pub(crate) const PFI_FIRST_SINGULAR: f64 = 1.0e-8;
pub(crate) const PFI_SINGULAR: f64 = 1.0e-7;
pub(crate) const PFI_MARGINAL: f64 = 1.0e-5;

// Forrest–Tomlin pivot acceptance.
pub(crate) const FT_SINGULAR: f64 = 1.0e-8;
pub(crate) const FT_REJECT_ERROR: f64 = 1.0e-1;
pub(crate) const FT_WARN_ERROR: f64 = 1.0e-5;

/// Algorithm used to apply U in a forward solve.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UStrategy {
    /// Depth first search from the nonzeros; touches the reachable columns only.
    Sparse,
    /// Reverse scan that skips blocks of eight rows flagged zero in a bitmap.
    Bitmap,
    /// Reverse scan over every column.
    Densish,
}

/// Algorithm used to apply the Forrest–Tomlin row etas R in a forward solve.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RStrategy {
    /// Push through the row copy of R, marking rows that are about to move.
    Marked,
    /// Push through the row copy of R without marks; zeros packed out after.
    RowCopy,
    /// One dot product per eta over the column copy of R.
    DotProduct,
}

/// Empirical per-operation weights of the R cost model. They only rank the
/// strategies against each other.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CostWeights {
    /// Setting or clearing a mark.
    pub set_mark: f64,
    /// Starting the push from one nonzero.
    pub test1: f64,
    /// Testing an eta's pivot for zero.
    pub test_pivot: f64,
    /// Starting one dot product.
    pub start_dot: f64,
    /// Final scan, per nonzero.
    pub final_scan: f64,
}

impl Default for CostWeights {
    fn default() -> Self {
        Self {
            set_mark: 0.1,
            test1: 1.0,
            test_pivot: 2.0,
            start_dot: 2.0,
            final_scan: 1.0,
        }
    }
}

/// Inputs of the R cost model.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RCostInput {
    /// Nonzeros entering R.
    pub nnz: usize,
    pub number_pivots: usize,
    pub number_rows: usize,
    pub number_rows_extra: usize,
    /// Number of elements stored in R.
    pub size_r: usize,
    pub has_row_copy: bool,
    pub has_scratch: bool,
    /// The result is also being staged as a Forrest–Tomlin spike.
    pub staging: bool,
}

/// Estimated cost of each [`RStrategy`], in enumeration order.
pub fn r_strategy_costs(input: &RCostInput, weights: &CostWeights) -> [f64; 3] {
    let nnz = input.nnz as f64;
    let pivots = input.number_pivots as f64;
    let size_r = input.size_r as f64;
    let average_r = size_r / input.number_rows_extra.max(1) as f64;
    let final_scan = nnz * weights.final_scan;

    let mut t1 =
        pivots * (weights.test_pivot + nnz / input.number_rows.max(1) as f64 * average_r);
    t1 += nnz * (weights.test1 + average_r);
    let mut t0 = t1 + (nnz + pivots) * weights.set_mark;
    t1 += nnz * final_scan;
    let t2 = size_r + pivots * weights.start_dot + nnz * final_scan;

    if !input.has_row_copy {
        t0 = COST_UNAVAILABLE;
        t1 = COST_UNAVAILABLE;
    } else if !input.has_scratch {
        t0 = COST_UNAVAILABLE;
    }
    if input.staging {
        t1 += final_scan;
    }
    [t0, t1, t2]
}

/// Cheapest R strategy. Ties go to the earlier strategy.
pub fn choose_r_strategy(input: &RCostInput, weights: &CostWeights) -> RStrategy {
    let costs = r_strategy_costs(input, weights);
    let strategies = [RStrategy::Marked, RStrategy::RowCopy, RStrategy::DotProduct];
    let mut best = COST_UNAVAILABLE;
    let mut choice = RStrategy::DotProduct;
    for (&cost, &strategy) in costs.iter().zip(&strategies) {
        if cost < best {
            best = cost;
            choice = strategy;
        }
    }
    choice
}

/// U strategy for a forward solve with `nnz` nonzeros entering U.
///
/// With a zero `threshold` the dense scan is always used. Once averages have
/// been collected the predicted output count decides, with `threshold2`
/// bounding the bitmap band; before that only sparse and dense are chosen.
pub fn choose_u_strategy(
    nnz: usize,
    threshold: usize,
    threshold2: usize,
    average_after_r: f64,
    average_after_u: f64,
) -> UStrategy {
    if threshold == 0 {
        return UStrategy::Densish;
    }
    if average_after_r != 0.0 {
        let guess = (nnz as f64 * average_after_u) as usize;
        if guess < threshold {
            UStrategy::Sparse
        } else if guess < threshold2 {
            UStrategy::Bitmap
        } else {
            UStrategy::Densish
        }
    } else if nnz < threshold {
        UStrategy::Sparse
    } else {
        UStrategy::Densish
    }
}

/// Default sparse thresholds `(threshold, threshold2)` for `m` rows.
pub(crate) fn auto_thresholds(m: usize) -> (usize, usize) {
    if m > 300 {
        let t = if m < 10000 {
            (m / 6).min(500)
        } else {
            (m / 8).min(1000)
        };
        (t, m >> 2)
    } else {
        (0, 0)
    }
}
