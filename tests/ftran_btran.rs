// Copyright (C) 2016-2018 ERGO-Code
// Copyright (C) 2022-2023 Richard Lincoln

mod common;

use basis_lu::{FactorData, Factorization, IndexedVector};
use common::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

#[test]
fn random_basis_matches_dense_solves() {
    init_logging();
    let m = 30;
    let (b, _) = random_basis(m, 3, 7);
    let mut f = load(&b);
    assert!(f.check_consistency().is_ok());
    let mut rng = StdRng::seed_from_u64(8);
    for trial in 0..10 {
        let packed = trial % 2 == 1;
        let rhs = random_sparse_vector(&mut rng, m, 1 + trial);
        let x = ftran(&mut f, &rhs, packed);
        assert_close(&x, &dense_solve(&b, &rhs), 1e-10);
        let y = btran(&mut f, &rhs, packed);
        assert_close(&y, &dense_solve_transpose(&b, &rhs), 1e-10);
    }
}

#[test]
fn permuted_columns_map_to_basis_positions() {
    let m = 12;
    let (b, _) = random_basis(m, 2, 21);
    let mut columns: Vec<usize> = (0..m).collect();
    columns.shuffle(&mut StdRng::seed_from_u64(22));
    let mut f = Factorization::new();
    f.load(&factorize_with_columns(&b, &columns)).unwrap();

    for k in 0..m {
        let mut e = vec![0.0; m];
        e[k] = 1.0;
        assert_close(&ftran(&mut f, &e, false), &dense_solve(&b, &e), 1e-10);
        assert_close(
            &btran(&mut f, &e, true),
            &dense_solve_transpose(&b, &e),
            1e-10,
        );
    }
}

#[test]
fn solves_in_sparse_mode() {
    let m = 80;
    let (b, _) = random_basis(m, 2, 3);
    let mut f = load(&b);
    assert!(!f.is_sparse());
    f.set_sparse_threshold(20);
    assert!(f.is_sparse());
    assert_eq!(f.sparse_threshold(), 20);

    let mut rng = StdRng::seed_from_u64(4);
    for nnz in [1, 3, 10, 40] {
        let rhs = random_sparse_vector(&mut rng, m, nnz);
        assert_close(&ftran(&mut f, &rhs, false), &dense_solve(&b, &rhs), 1e-10);
        assert_close(
            &btran(&mut f, &rhs, false),
            &dense_solve_transpose(&b, &rhs),
            1e-10,
        );
    }
    assert!(f.check_consistency().is_ok());
}

#[test]
fn signed_permutation_round_trip() {
    let m = 9;
    let mut rng = StdRng::seed_from_u64(5);
    let mut data = FactorData::slack_basis(m, -1.0);
    data.permute.shuffle(&mut rng);
    data.pivot_column_back.shuffle(&mut rng);

    let mut f = Factorization::new();
    f.set_slack_value(-1.0);
    f.load(&data).unwrap();
    assert_eq!(f.number_slacks(), m);

    // B[r][pivot_column_back[j]] = -1 where j = permute[r]
    let mut b = vec![vec![0.0; m]; m];
    for r in 0..m {
        b[r][data.pivot_column_back[data.permute[r]]] = -1.0;
    }

    for trial in 0..5 {
        let rhs = random_sparse_vector(&mut rng, m, 2 + trial);
        let x = ftran(&mut f, &rhs, false);
        assert_close(&x, &dense_solve(&b, &rhs), 0.0);
        let back = btran(&mut f, &x, false);
        for (a, e) in back.iter().zip(&rhs) {
            assert!((a - e).abs() <= f.zero_tolerance());
        }
    }
}

#[test]
fn no_permute_leaves_result_in_pivot_order() {
    let m = 6;
    let (b, _) = random_basis(m, 2, 11);
    let data = factorize(&b);
    let mut f = Factorization::new();
    f.load(&data).unwrap();

    let mut rhs = vec![0.0; m];
    rhs[4] = 1.5;
    let expected = dense_solve(&b, &rhs);

    let mut region = IndexedVector::new(f.maximum_rows_extra());
    region.insert(data.permute[4], 1.5);
    let mut unused = IndexedVector::new(m);
    let nnz = f.update_column(&mut region, &mut unused, true);
    assert_eq!(nnz, region.len());
    for j in 0..m {
        let value = region[j];
        assert!((value - expected[data.pivot_column_back[j]]).abs() < 1e-10);
    }
    assert!(unused.is_clean());
}

#[test]
fn five_by_five_unit_solve() {
    init_logging();
    let b = vec![
        vec![4.0, 0.0, 0.0, 1.0, 0.0],
        vec![0.0, 4.0, 0.0, 0.0, 1.0],
        vec![1.0, 0.0, 4.0, 0.0, 0.0],
        vec![0.0, 1.0, 0.0, 4.0, 0.0],
        vec![0.0, 0.0, 1.0, 0.0, 4.0],
    ];
    let mut f = load(&b);
    let rhs = [0.0, 0.0, 1.0, 0.0, 0.0];
    assert_close(&ftran(&mut f, &rhs, false), &dense_solve(&b, &rhs), 1e-10);
}

#[test]
fn zero_right_hand_side() {
    let (b, _) = random_basis(5, 1, 1);
    let mut f = load(&b);
    assert_eq!(ftran(&mut f, &[0.0; 5], false), vec![0.0; 5]);
    assert_eq!(btran(&mut f, &[0.0; 5], true), vec![0.0; 5]);
}
