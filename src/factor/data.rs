// Copyright (C) 2016-2018 ERGO-Code
// Copyright (C) 2022-2023 Richard Lincoln

use crate::FactorError;

/// Triangular factors of a basis `B` as produced by an LU decomposition.
///
/// Row `r` of `B` is row `permute[r]` of the factors, and column `j` of the
/// factors is basis position `pivot_column_back[j]`, so that
///
/// ```text
/// B[r][pivot_column_back[j]] = (L·U)[permute[r]][j].
/// ```
///
/// `L` is unit lower triangular and stored by columns without its diagonal
/// (`l_start` has `number_rows + 1` entries). `U` is upper triangular, stored by
/// columns without its diagonal, which is held in `u_pivot`. The first
/// `number_slacks` columns of `U` must be empty with pivot equal to the slack
/// value of the factorization they are loaded into.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FactorData {
    pub number_rows: usize,
    pub number_slacks: usize,

    pub l_start: Vec<usize>,
    pub l_index: Vec<usize>,
    pub l_value: Vec<f64>,

    pub u_start: Vec<usize>,
    pub u_index: Vec<usize>,
    pub u_value: Vec<f64>,
    pub u_pivot: Vec<f64>,

    pub permute: Vec<usize>,
    pub pivot_column_back: Vec<usize>,
}

impl FactorData {
    /// Factors of the basis made of `m` slack columns, `B = sign·I`.
    pub fn slack_basis(m: usize, slack_value: f64) -> Self {
        let sign = if slack_value >= 0.0 { 1.0 } else { -1.0 };
        Self {
            number_rows: m,
            number_slacks: m,
            l_start: vec![0; m + 1],
            u_start: vec![0; m + 1],
            u_pivot: vec![sign; m],
            permute: (0..m).collect(),
            pivot_column_back: (0..m).collect(),
            ..Default::default()
        }
    }

    pub(crate) fn validate(&self, slack_value: f64) -> Result<(), FactorError> {
        let m = self.number_rows;
        if m == 0 {
            return Err(FactorError::Dimension("number_rows must be positive".into()));
        }
        if self.number_slacks > m {
            return Err(FactorError::Dimension(format!(
                "{} slacks for {} rows",
                self.number_slacks, m
            )));
        }
        check_columns("L", m, &self.l_start, &self.l_index, &self.l_value)?;
        check_columns("U", m, &self.u_start, &self.u_index, &self.u_value)?;
        if self.u_pivot.len() != m {
            return Err(FactorError::Dimension(format!(
                "u_pivot has {} entries, expected {}",
                self.u_pivot.len(),
                m
            )));
        }

        for j in 0..m {
            for p in self.l_start[j]..self.l_start[j + 1] {
                if self.l_index[p] <= j {
                    return Err(FactorError::NotTriangular {
                        factor: "L",
                        row: self.l_index[p],
                        column: j,
                    });
                }
            }
            for p in self.u_start[j]..self.u_start[j + 1] {
                if self.u_index[p] >= j {
                    return Err(FactorError::NotTriangular {
                        factor: "U",
                        row: self.u_index[p],
                        column: j,
                    });
                }
            }
            if self.u_pivot[j] == 0.0 || !self.u_pivot[j].is_finite() {
                return Err(FactorError::ZeroPivot(j));
            }
        }
        for j in 0..self.number_slacks {
            if self.u_start[j + 1] != self.u_start[j] || self.u_pivot[j] != slack_value {
                return Err(FactorError::InvalidSlack(j));
            }
        }

        check_permutation("permute", m, &self.permute)?;
        check_permutation("pivot_column_back", m, &self.pivot_column_back)?;
        Ok(())
    }

    pub(crate) fn l_len(&self) -> usize {
        self.l_start[self.number_rows]
    }

    pub(crate) fn u_len(&self) -> usize {
        self.u_start[self.number_rows]
    }
}

fn check_columns(
    name: &'static str,
    m: usize,
    start: &[usize],
    index: &[usize],
    value: &[f64],
) -> Result<(), FactorError> {
    if start.len() != m + 1 {
        return Err(FactorError::Dimension(format!(
            "{} start has {} entries, expected {}",
            name,
            start.len(),
            m + 1
        )));
    }
    if start[0] != 0 || start.windows(2).any(|w| w[0] > w[1]) {
        return Err(FactorError::Dimension(format!("{} start is not monotone", name)));
    }
    let nz = start[m];
    if index.len() < nz || value.len() < nz {
        return Err(FactorError::Dimension(format!(
            "{} holds {} entries but index/value have {}/{}",
            name,
            nz,
            index.len(),
            value.len()
        )));
    }
    if index[..nz].iter().any(|&i| i >= m) {
        return Err(FactorError::Dimension(format!("{} row index out of range", name)));
    }
    Ok(())
}

fn check_permutation(name: &'static str, m: usize, perm: &[usize]) -> Result<(), FactorError> {
    if perm.len() != m {
        return Err(FactorError::Dimension(format!(
            "{} has {} entries, expected {}",
            name,
            perm.len(),
            m
        )));
    }
    let mut seen = vec![false; m];
    for &i in perm {
        if i >= m || seen[i] {
            return Err(FactorError::InvalidPermutation(name));
        }
        seen[i] = true;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slack_basis_is_valid() {
        let data = FactorData::slack_basis(4, -2.0);
        assert_eq!(data.u_pivot, vec![-1.0; 4]);
        assert!(data.validate(-1.0).is_ok());
        assert_eq!(data.validate(1.0), Err(FactorError::InvalidSlack(0)));
    }

    #[test]
    fn rejects_bad_structure() {
        let mut data = FactorData::slack_basis(3, 1.0);
        data.number_slacks = 0;
        data.u_start = vec![0, 0, 1, 1];
        data.u_index = vec![2];
        data.u_value = vec![1.0];
        assert_eq!(
            data.validate(1.0),
            Err(FactorError::NotTriangular {
                factor: "U",
                row: 2,
                column: 1
            })
        );

        let mut data = FactorData::slack_basis(3, 1.0);
        data.permute = vec![0, 0, 1];
        assert_eq!(
            data.validate(1.0),
            Err(FactorError::InvalidPermutation("permute"))
        );
    }
}
