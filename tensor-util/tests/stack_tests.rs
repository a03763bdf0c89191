use approx::assert_abs_diff_eq;
use ndarray::prelude::*;
use tensor_util::stack::{
    invert_sym, invert_sym_stack, stack_diagonals, symmetrize_inplace, Exec, TensorError,
};

#[test]
fn inverts_small_spd_matrix() -> anyhow::Result<()> {
    let a = array![[4.0, 1.0], [1.0, 3.0]];
    let (inv, ln_det) = invert_sym(a.view())?;

    // det(a) = 11, inv(a) = [[3, -1], [-1, 4]] / 11
    assert_abs_diff_eq!(inv[[0, 0]], 3. / 11., epsilon = 1e-12);
    assert_abs_diff_eq!(inv[[0, 1]], -1. / 11., epsilon = 1e-12);
    assert_abs_diff_eq!(inv[[1, 0]], -1. / 11., epsilon = 1e-12);
    assert_abs_diff_eq!(inv[[1, 1]], 4. / 11., epsilon = 1e-12);
    assert_abs_diff_eq!(ln_det, -(11_f64.ln()), epsilon = 1e-12);

    Ok(())
}

#[test]
fn inverse_of_inverse_recovers_input() -> anyhow::Result<()> {
    let a = array![[5.0, 1.0, 0.5], [1.0, 4.0, 1.0], [0.5, 1.0, 3.0]];
    let (inv, ln_det_inv) = invert_sym(a.view())?;
    let (back, ln_det_back) = invert_sym(inv.view())?;

    assert_abs_diff_eq!(back, a, epsilon = 1e-9);
    assert_abs_diff_eq!(ln_det_back, -ln_det_inv, epsilon = 1e-9);

    Ok(())
}

#[test]
fn stack_inversion_matches_slicewise() -> anyhow::Result<()> {
    let mut stack = Array3::<f64>::zeros((2, 2, 3));
    stack
        .index_axis_mut(Axis(2), 0)
        .assign(&array![[4.0, 1.0], [1.0, 3.0]]);
    stack
        .index_axis_mut(Axis(2), 1)
        .assign(&array![[2.0, 0.0], [0.0, 5.0]]);
    stack
        .index_axis_mut(Axis(2), 2)
        .assign(&array![[10.0, -2.0], [-2.0, 7.0]]);

    let (inv_serial, ld_serial) = invert_sym_stack(stack.view(), Exec::Serial)?;
    let (inv_par, ld_par) = invert_sym_stack(stack.view(), Exec::Parallel)?;

    assert_abs_diff_eq!(inv_serial, inv_par, epsilon = 1e-12);
    assert_abs_diff_eq!(ld_serial, ld_par, epsilon = 1e-12);

    // slices stay independent
    for k in 0..3 {
        let (inv_k, ld_k) = invert_sym(stack.index_axis(Axis(2), k))?;
        assert_abs_diff_eq!(
            inv_serial.index_axis(Axis(2), k).to_owned(),
            inv_k,
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(ld_serial[k], ld_k, epsilon = 1e-12);
    }

    Ok(())
}

#[test]
fn singular_matrix_is_reconditioned() -> anyhow::Result<()> {
    // rank one, so the plain factorization fails and the ridge kicks in
    let a = array![[1.0, 1.0], [1.0, 1.0]];
    let (inv, ln_det) = invert_sym(a.view())?;

    assert!(inv.iter().all(|x| x.is_finite()));
    assert!(ln_det.is_finite());

    Ok(())
}

#[test]
fn negative_definite_matrix_is_degenerate() {
    let a = array![[-1.0, 0.0], [0.0, -1.0]];
    assert!(matches!(
        invert_sym(a.view()),
        Err(TensorError::DegenerateMatrix { .. })
    ));
}

#[test]
fn symmetrization_averages_off_diagonal() {
    let mut a = array![[1.0, 2.0], [4.0, 1.0]];
    symmetrize_inplace(&mut a);
    assert_abs_diff_eq!(a[[0, 1]], 3.0);
    assert_abs_diff_eq!(a[[1, 0]], 3.0);
}

#[test]
fn diagonals_collected_row_per_slice() {
    let mut stack = Array3::<f64>::zeros((2, 2, 3));
    for k in 0..3 {
        stack[[0, 0, k]] = k as f64;
        stack[[1, 1, k]] = 10.0 + k as f64;
    }
    let diag = stack_diagonals(stack.view());
    assert_eq!(diag.dim(), (3, 2));
    assert_abs_diff_eq!(diag[[0, 0]], 0.0);
    assert_abs_diff_eq!(diag[[2, 1]], 12.0);
}
