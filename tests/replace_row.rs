// Copyright (C) 2016-2018 ERGO-Code
// Copyright (C) 2022-2023 Richard Lincoln

mod common;

use basis_lu::{FactorError, Factorization, Status};
use common::*;

fn diagonal() -> Dense {
    let d = [1.0, 1.0, 2.0, 3.0, 4.0];
    let mut b = vec![vec![0.0; 5]; 5];
    for (i, &x) in d.iter().enumerate() {
        b[i][i] = x;
    }
    b
}

fn check_solves(f: &mut Factorization, b: &Dense) {
    for rhs in [
        [1.0, 0.0, 0.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0, 1.0],
        [1.0, 2.0, 3.0, 4.0, 5.0],
    ] {
        assert_close(&ftran(f, &rhs, false), &dense_solve(b, &rhs), 1e-14);
        assert_close(
            &btran(f, &rhs, false),
            &dense_solve_transpose(b, &rhs),
            1e-14,
        );
    }
}

#[test]
fn slack_row_takes_new_entries() {
    init_logging();
    let mut b = diagonal();
    let mut f = load(&b);
    assert_eq!(f.number_slacks(), 2);

    let status = f.replace_row(0, &[2, 4], &[1.0, 5.0]).unwrap();
    assert_eq!(status, Status::OK);
    assert_eq!(f.u_elements(), 2);
    assert!(f.check_consistency().is_ok());
    b[0][2] = 1.0;
    b[0][4] = 5.0;
    check_solves(&mut f, &b);

    // same pattern again, new values
    let status = f.replace_row(0, &[4, 2], &[-1.0, 0.5]).unwrap();
    assert_eq!(status, Status::OK);
    assert_eq!(f.u_elements(), 2);
    b[0][2] = 0.5;
    b[0][4] = -1.0;
    check_solves(&mut f, &b);
}

#[test]
fn pattern_change_replaces_old_entries() {
    let mut b = diagonal();
    let mut f = load(&b);
    f.replace_row(1, &[2, 3], &[1.0, 1.0]).unwrap();
    let status = f.replace_row(1, &[4], &[2.0]).unwrap();
    assert_eq!(status, Status::OK);
    assert_eq!(f.u_elements(), 1);
    assert!(f.check_consistency().is_ok());
    b[1][4] = 2.0;
    check_solves(&mut f, &b);
}

#[test]
fn inadmissible_rows_and_columns() {
    let b = diagonal();
    let mut f = load(&b);
    // row 2 has pivot 2
    assert!(matches!(
        f.replace_row(2, &[3], &[1.0]),
        Err(FactorError::InvalidRowReplacement(2))
    ));
    // slack columns and columns before the row are not allowed
    assert!(f.replace_row(1, &[0], &[1.0]).is_err());
    assert!(f.replace_row(0, &[1], &[1.0]).is_err());
    assert!(f.replace_row(0, &[5], &[1.0]).is_err());
    assert!(matches!(
        f.replace_row(0, &[2, 3], &[1.0]),
        Err(FactorError::Dimension(_))
    ));
    assert_eq!(f.u_elements(), 0);
    assert_eq!(f.replace_row(0, &[], &[]).unwrap(), Status::OK);
}

#[test]
fn full_files() {
    let b = diagonal();
    let mut f = Factorization::new();
    f.u_mem = 3;
    f.pad = 0;
    f.stretch = 0.0;
    f.load(&factorize(&b)).unwrap();

    assert_eq!(f.replace_row(0, &[2, 4], &[1.0, 5.0]).unwrap(), Status::OK);
    let status = f.replace_row(1, &[2, 3, 4], &[1.0, 1.0, 1.0]).unwrap();
    assert_eq!(status, Status::ErrorNoRoom);
    assert_eq!(status.code(), 3);
}

#[test]
fn no_room_leaves_the_row_intact() {
    let mut b = diagonal();
    let mut f = Factorization::new();
    f.u_mem = 4;
    f.pad = 0;
    f.stretch = 0.0;
    f.load(&factorize(&b)).unwrap();

    assert_eq!(f.replace_row(0, &[2, 4], &[1.0, 5.0]).unwrap(), Status::OK);
    assert_eq!(f.replace_row(1, &[3], &[7.0]).unwrap(), Status::OK);
    b[0][2] = 1.0;
    b[0][4] = 5.0;
    b[1][3] = 7.0;
    check_solves(&mut f, &b);

    // three entries in the row would need five in the file
    let status = f.replace_row(1, &[2, 3, 4], &[1.0, 1.0, 1.0]).unwrap();
    assert_eq!(status, Status::ErrorNoRoom);
    assert_eq!(f.u_elements(), 3);
    assert!(f.check_consistency().is_ok());
    check_solves(&mut f, &b);

    // the same number of entries fits
    assert_eq!(f.replace_row(1, &[4], &[-2.0]).unwrap(), Status::OK);
    b[1][3] = 0.0;
    b[1][4] = -2.0;
    check_solves(&mut f, &b);
}

#[test]
fn repeated_columns_are_refused() {
    let b = diagonal();
    let mut f = load(&b);
    assert!(matches!(
        f.replace_row(0, &[3, 3], &[1.0, 2.0]),
        Err(FactorError::InvalidRowReplacement(0))
    ));
    assert_eq!(f.u_elements(), 0);
}

#[test]
fn empty_rows_removes_entries() {
    let mut b = diagonal();
    let mut f = load(&b);
    f.replace_row(0, &[2, 4], &[1.0, 5.0]).unwrap();
    f.replace_row(1, &[3], &[7.0]).unwrap();
    assert_eq!(f.u_elements(), 3);

    f.empty_rows(&[0]).unwrap();
    assert_eq!(f.u_elements(), 1);
    assert!(f.check_consistency().is_ok());
    b[1][3] = 7.0;
    check_solves(&mut f, &b);

    assert!(f.empty_rows(&[3]).is_err());
}
