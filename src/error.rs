// Copyright (C) 2016-2018 ERGO-Code
// Copyright (C) 2022-2023 Richard Lincoln

use thiserror::Error;

/// Errors from loading factors or changing parameters.
///
/// Expected outcomes of pivot operations are reported through
/// [`Status`](crate::Status) instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FactorError {
    #[error("dimension mismatch: {0}")]
    Dimension(String),

    #[error("{factor} entry at row {row}, column {column} is on the wrong side of the diagonal")]
    NotTriangular {
        factor: &'static str,
        row: usize,
        column: usize,
    },

    #[error("zero pivot in column {0}")]
    ZeroPivot(usize),

    #[error("{0} is not a permutation")]
    InvalidPermutation(&'static str),

    #[error("slack column {0} must be empty with pivot equal to the slack value")]
    InvalidSlack(usize),

    #[error("{what} needs {need} elements but only {have} are available")]
    InsufficientMemory {
        what: &'static str,
        need: usize,
        have: usize,
    },

    #[error("invalid value {value} for parameter {name}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("row {0} cannot be replaced: it must be a unit-pivot singleton")]
    InvalidRowReplacement(usize),

    #[error("operation not allowed with {0} pending pivots")]
    PivotsPending(usize),

    #[error("inconsistent factorization: {0}")]
    Inconsistent(String),
}
