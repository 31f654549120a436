// Copyright (C) 2016-2018 ERGO-Code
// Copyright (C) 2022-2023 Richard Lincoln

use crate::{FactorError, Factorization};

impl Factorization {
    /// Search the factors for broken invariants: a row file entry that
    /// does not point at the matching column file entry, a column file
    /// entry missing from the row file, an entry on or below the diagonal,
    /// an entry in a retired position, inconsistent permutations, or
    /// scratch that was not cleared. Returns `FactorError::Inconsistent`
    /// describing the first defect found.
    pub fn check_consistency(&self) -> Result<(), FactorError> {
        let number_u = self.number_rows_extra;
        let active = |i: usize| i < number_u && self.pivot_region[i] != 0.0;

        let mut row_entries = 0;
        for i in 0..number_u {
            if !active(i) && self.u_rows.len(i) > 0 {
                return Err(FactorError::Inconsistent(format!("retired row {} has entries", i)));
            }
            for s in self.u_rows.range(i) {
                let j = self.u_col_index[s];
                let p = self.u_convert[s];
                if !self.u_cols.range(j).contains(&p) || self.u_index[p] != i {
                    return Err(FactorError::Inconsistent(format!(
                        "row {} column {}: bad cross reference", i, j
                    )));
                }
                row_entries += 1;
            }
        }
        let mut column_entries = 0;
        for j in 0..number_u {
            if !active(j) && self.u_cols.len(j) > 0 {
                return Err(FactorError::Inconsistent(format!("retired column {} has entries", j)));
            }
            for p in self.u_cols.range(j) {
                let i = self.u_index[p];
                if i >= j || !active(i) {
                    return Err(FactorError::Inconsistent(format!(
                        "entry ({}, {}) outside the triangle", i, j
                    )));
                }
            }
            column_entries += self.u_cols.len(j);
        }
        if row_entries != column_entries {
            return Err(FactorError::Inconsistent(format!(
                "{} entries by rows, {} by columns",
                row_entries, column_entries
            )));
        }

        let m = self.number_rows;
        for r in 0..m {
            if self.permute_back[self.permute[r]] != r {
                return Err(FactorError::Inconsistent(format!("row permutation broken at {}", r)));
            }
        }
        for pos in 0..m {
            let k = self.pivot_column[pos];
            if !active(k) || self.pivot_column_back[k] != pos {
                return Err(FactorError::Inconsistent(format!(
                    "column map broken at basis position {}", pos
                )));
            }
        }
        for k in m..number_u {
            if active(self.permute[k]) {
                return Err(FactorError::Inconsistent(format!(
                    "update {} retired an active position", k - m
                )));
            }
        }

        if let Some(work) = &self.work {
            if !work.is_clean() {
                return Err(FactorError::Inconsistent("scratch not cleared".to_string()));
            }
        }
        Ok(())
    }

    #[cfg(feature = "debug_extra")]
    pub(crate) fn assert_consistent(&self) {
        if let Err(defect) = self.check_consistency() {
            panic!("{}", defect);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{FactorData, FactorError, Factorization};

    #[test]
    fn broken_permutation_is_reported() {
        let mut f = Factorization::new();
        f.load(&FactorData::slack_basis(3, 1.0)).unwrap();
        assert_eq!(f.check_consistency(), Ok(()));
        f.permute_back.swap(0, 1);
        assert!(matches!(
            f.check_consistency(),
            Err(FactorError::Inconsistent(_))
        ));
    }
}
