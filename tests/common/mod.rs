// Copyright (C) 2016-2018 ERGO-Code
// Copyright (C) 2022-2023 Richard Lincoln

#![allow(dead_code)]

use basis_lu::{FactorData, Factorization, IndexedVector};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Dense matrix by rows.
pub type Dense = Vec<Vec<f64>>;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Random sparse basis with `per_column` off-diagonal entries per column.
/// Column j has a dominant entry in row `rows[j]`, so any column can be
/// exchanged for one that is dominant in the same row without losing
/// regularity. Returns the matrix and `rows`.
pub fn random_basis(m: usize, per_column: usize, seed: u64) -> (Dense, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut rows: Vec<usize> = (0..m).collect();
    rows.shuffle(&mut rng);
    let mut b = vec![vec![0.0; m]; m];
    for j in 0..m {
        let column = random_column(&mut rng, m, rows[j], per_column);
        for i in 0..m {
            b[i][j] = column[i];
        }
    }
    (b, rows)
}

/// Column with an entry of magnitude above `per_column + 1` in row
/// `dominant` and at most `per_column` entries in (-1, 1) elsewhere.
pub fn random_column(rng: &mut StdRng, m: usize, dominant: usize, per_column: usize) -> Vec<f64> {
    let mut column = vec![0.0; m];
    let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
    for _ in 0..per_column {
        let i = rng.gen_range(0..m);
        column[i] = rng.gen_range(-1.0..1.0);
    }
    column[dominant] = sign * (per_column as f64 + 1.0 + rng.gen_range(0.5..2.0));
    column
}

pub fn random_sparse_vector(rng: &mut StdRng, m: usize, nnz: usize) -> Vec<f64> {
    let mut x = vec![0.0; m];
    for _ in 0..nnz {
        x[rng.gen_range(0..m)] = rng.gen_range(-2.0..2.0);
    }
    x
}

/// Dense LU factorization with partial pivoting of `b` with its columns
/// taken in the order `columns`.
pub fn factorize_with_columns(b: &Dense, columns: &[usize]) -> FactorData {
    let m = b.len();
    let mut a: Dense = (0..m)
        .map(|i| columns.iter().map(|&j| b[i][j]).collect())
        .collect();
    let mut order: Vec<usize> = (0..m).collect();
    for k in 0..m {
        let mut p = k;
        for i in k + 1..m {
            if a[order[i]][k].abs() > a[order[p]][k].abs() {
                p = i;
            }
        }
        order.swap(k, p);
        let pivot_row = a[order[k]].clone();
        for i in k + 1..m {
            let row = &mut a[order[i]];
            let l = row[k] / pivot_row[k];
            row[k] = l;
            if l != 0.0 {
                for j in k + 1..m {
                    row[j] -= l * pivot_row[j];
                }
            }
        }
    }

    let mut data = FactorData {
        number_rows: m,
        l_start: vec![0],
        u_start: vec![0],
        permute: vec![0; m],
        pivot_column_back: columns.to_vec(),
        ..Default::default()
    };
    for j in 0..m {
        for i in j + 1..m {
            let value = a[order[i]][j];
            if value != 0.0 {
                data.l_index.push(i);
                data.l_value.push(value);
            }
        }
        data.l_start.push(data.l_index.len());
        for i in 0..j {
            let value = a[order[i]][j];
            if value != 0.0 {
                data.u_index.push(i);
                data.u_value.push(value);
            }
        }
        data.u_start.push(data.u_index.len());
        data.u_pivot.push(a[order[j]][j]);
    }
    for (i, &r) in order.iter().enumerate() {
        data.permute[r] = i;
    }
    data.number_slacks = (0..m)
        .take_while(|&j| data.u_start[j + 1] == data.u_start[j] && data.u_pivot[j] == 1.0)
        .count();
    data
}

pub fn factorize(b: &Dense) -> FactorData {
    let columns: Vec<usize> = (0..b.len()).collect();
    factorize_with_columns(b, &columns)
}

pub fn load(b: &Dense) -> Factorization {
    let mut f = Factorization::new();
    f.load(&factorize(b)).unwrap();
    f
}

pub fn transpose(b: &Dense) -> Dense {
    let m = b.len();
    (0..m).map(|j| (0..m).map(|i| b[i][j]).collect()).collect()
}

/// Solve b·x = rhs by Gaussian elimination with partial pivoting.
pub fn dense_solve(b: &Dense, rhs: &[f64]) -> Vec<f64> {
    let m = b.len();
    let mut a: Dense = b
        .iter()
        .zip(rhs)
        .map(|(row, &r)| {
            let mut row = row.clone();
            row.push(r);
            row
        })
        .collect();
    for k in 0..m {
        let p = (k..m)
            .max_by(|&x, &y| a[x][k].abs().total_cmp(&a[y][k].abs()))
            .unwrap();
        a.swap(k, p);
        for i in k + 1..m {
            let l = a[i][k] / a[k][k];
            if l != 0.0 {
                for j in k..=m {
                    a[i][j] -= l * a[k][j];
                }
            }
        }
    }
    let mut x = vec![0.0; m];
    for k in (0..m).rev() {
        let mut s = a[k][m];
        for j in k + 1..m {
            s -= a[k][j] * x[j];
        }
        x[k] = s / a[k][k];
    }
    x
}

pub fn dense_solve_transpose(b: &Dense, rhs: &[f64]) -> Vec<f64> {
    dense_solve(&transpose(b), rhs)
}

/// Forward solve through the public interface. Checks that the scratch is
/// left clean and the result is a consistent sparse vector.
pub fn ftran(f: &mut Factorization, b: &[f64], packed: bool) -> Vec<f64> {
    let mut region = IndexedVector::new(f.maximum_rows_extra());
    let mut rhs = sparse(b, packed);
    f.update_column(&mut region, &mut rhs, false);
    assert!(region.is_clean(), "scratch left dirty");
    assert!(rhs.is_consistent());
    assert_eq!(rhs.packed(), packed);
    rhs.to_dense(b.len())
}

pub fn btran(f: &mut Factorization, c: &[f64], packed: bool) -> Vec<f64> {
    let mut region = IndexedVector::new(f.maximum_rows_extra());
    let mut rhs = sparse(c, packed);
    f.update_column_transpose(&mut region, &mut rhs);
    assert!(region.is_clean(), "scratch left dirty");
    assert!(rhs.is_consistent());
    rhs.to_dense(c.len())
}

pub fn sparse(x: &[f64], packed: bool) -> IndexedVector {
    let mut v = IndexedVector::new(x.len());
    v.set_packed(packed);
    for (i, &value) in x.iter().enumerate() {
        if value != 0.0 {
            v.insert(i, value);
        }
    }
    v
}

pub fn assert_close(actual: &[f64], expected: &[f64], tolerance: f64) {
    assert_eq!(actual.len(), expected.len());
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            (a - e).abs() <= tolerance * (1.0 + e.abs()),
            "entry {}: {} vs {}",
            i,
            a,
            e
        );
    }
}

/// Exchange column `position` of `b` for `column` with a Forrest–Tomlin
/// update of `f`. Returns the status.
pub fn exchange_ft(
    f: &mut Factorization,
    b: &mut Dense,
    position: usize,
    column: &[f64],
) -> basis_lu::Status {
    let mut region = IndexedVector::new(f.maximum_rows_extra());
    let mut rhs = sparse(column, false);
    let update = f.update_column_ft(&mut region, &mut rhs);
    assert!(region.is_clean());
    assert!(update.appended());
    let alpha = rhs[position];
    let status = f.replace_column_ft(&mut region, position, alpha);
    assert!(region.is_clean());
    if status.accepted() {
        for (i, row) in b.iter_mut().enumerate() {
            row[position] = column[i];
        }
    }
    status
}

/// Exchange column `position` of `b` for `column` with a PFI update.
pub fn exchange_pfi(
    f: &mut Factorization,
    b: &mut Dense,
    position: usize,
    column: &[f64],
) -> basis_lu::Status {
    let mut region = IndexedVector::new(f.maximum_rows_extra());
    let mut rhs = sparse(column, false);
    f.update_column(&mut region, &mut rhs, false);
    let alpha = rhs[position];
    let status = f.replace_column_pfi(&rhs, position, alpha);
    if status.accepted() {
        for (i, row) in b.iter_mut().enumerate() {
            row[position] = column[i];
        }
    }
    status
}
