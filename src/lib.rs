// Copyright (C) 2016-2018 ERGO-Code
// Copyright (C) 2022-2023 Richard Lincoln

//! Update kernel for a sparse LU factorization of a simplex basis.
//!
//! A [`Factorization`] holds `B = L·U` together with the updates accumulated
//! since the factors were loaded, either as a Forrest–Tomlin row-eta file `R`
//! or as a product-form-of-inverse (PFI) eta chain. It solves `B·x = b`
//! ([`Factorization::update_column`]) and `Bᵗ·y = c`
//! ([`Factorization::update_column_transpose`]) for sparse right-hand sides and
//! folds accepted pivots into the factors without refactorizing.

mod error;
mod factor;
mod indexed_vector;

pub use error::FactorError;
pub use factor::{
    choose_r_strategy, choose_u_strategy, r_strategy_costs, CostWeights, FactorData, FactorStats,
    Factorization, RCostInput, RStrategy, UStrategy,
};
pub use indexed_vector::IndexedVector;

/// Value stored in place of an entry that cancelled during elimination but
/// must stay in the index list. It is nonzero, so the slot keeps its place in
/// the sparsity pattern, and far below any zero tolerance, so it never survives
/// the final drop on output.
pub const TINY_ELEMENT: f64 = 1.0e-50;

/// Outcome of a pivot operation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Status {
    OK,
    /// The pivot was accepted but is small enough to be suspect.
    WarningMarginalPivot,
    /// The pivot was rejected as numerically singular. Nothing was modified.
    ErrorSingularUpdate,
    /// Not enough room in the factor files.
    ErrorNoRoom,
    /// The number of updates reached the limit. Refactorize.
    ErrorMaximumPivots,
}

impl Status {
    /// Numeric return code: 0, 1, 2, 3 or 5.
    pub fn code(self) -> i32 {
        match self {
            Status::OK => 0,
            Status::WarningMarginalPivot => 1,
            Status::ErrorSingularUpdate => 2,
            Status::ErrorNoRoom => 3,
            Status::ErrorMaximumPivots => 5,
        }
    }

    /// True if the pivot was taken into the factorization.
    pub fn accepted(self) -> bool {
        matches!(self, Status::OK | Status::WarningMarginalPivot)
    }
}

/// Result of [`Factorization::update_column_ft`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ColumnUpdate {
    /// The spike was staged for a Forrest–Tomlin update.
    Appended(usize),
    /// Solved, but nothing was staged (no room, or the PFI scheme is active).
    NotAppended(usize),
}

impl ColumnUpdate {
    /// Number of nonzeros in the solution.
    pub fn nonzeros(self) -> usize {
        match self {
            ColumnUpdate::Appended(n) | ColumnUpdate::NotAppended(n) => n,
        }
    }

    pub fn appended(self) -> bool {
        matches!(self, ColumnUpdate::Appended(_))
    }

    /// The count, negated when nothing was staged.
    pub fn as_signed(self) -> i64 {
        match self {
            ColumnUpdate::Appended(n) => n as i64,
            ColumnUpdate::NotAppended(n) => -(n as i64),
        }
    }
}
