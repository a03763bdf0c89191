//! Batched symmetric matrix routines over `ndarray` stacks.
//!
//! A stack is a `(d, d, n)` array whose trailing axis indexes `n`
//! independent `d x d` matrices. Every routine here treats the slices
//! independently; batch entries never mix.

use ndarray::prelude::*;
use ndarray_linalg::cholesky::{Cholesky, UPLO};
use ndarray_linalg::solve::Inverse;
use rayon::prelude::*;
use thiserror::Error;

/// Execution strategy for batched routines, fixed once per run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exec {
    Serial,
    Parallel,
}

#[derive(Error, Debug)]
pub enum TensorError {
    #[error(
        "degenerate matrix: Cholesky failed after {attempts} re-conditioning attempts (last ridge {ridge:.3e})"
    )]
    DegenerateMatrix { attempts: usize, ridge: f64 },

    #[error("linear algebra backend: {0}")]
    Lapack(#[from] ndarray_linalg::error::LinalgError),
}

/// number of escalating ridge bumps before giving up
const MAX_RECONDITION: usize = 4;
/// first ridge, relative to the largest diagonal entry
const RIDGE0: f64 = 1e-8;
const RIDGE_GROWTH: f64 = 100.;

/// Average out the asymmetry accumulated by floating point updates
pub fn symmetrize_inplace(mat: &mut Array2<f64>) {
    let nn = mat.nrows();
    for i in 0..nn {
        for j in (i + 1)..nn {
            let avg = 0.5 * (mat[[i, j]] + mat[[j, i]]);
            mat[[i, j]] = avg;
            mat[[j, i]] = avg;
        }
    }
}

/// Invert a symmetric positive definite matrix.
///
/// Returns `(inverse, ln_det)` where `ln_det` is the log determinant of
/// the returned inverse. The input is symmetrized first and checked by a
/// Cholesky factorization; on failure the diagonal is re-conditioned with
/// an escalating ridge before trying again.
pub fn invert_sym(mat: ArrayView2<f64>) -> Result<(Array2<f64>, f64), TensorError> {
    debug_assert_eq!(mat.nrows(), mat.ncols());

    let mut sym = mat.to_owned();
    symmetrize_inplace(&mut sym);

    let scale = sym.diag().fold(f64::EPSILON, |acc, &x| acc.max(x.abs()));
    let mut ridge = 0_f64;

    for _attempt in 0..=MAX_RECONDITION {
        let mut work = sym.clone();
        if ridge > 0. {
            let mut diag = work.diag_mut();
            diag += ridge;
        }

        if let Ok(chol) = work.cholesky(UPLO::Lower) {
            let ln_det: f64 = 2. * chol.diag().mapv(f64::ln).sum();
            if let Ok(mut inv) = work.inv() {
                symmetrize_inplace(&mut inv);
                return Ok((inv, -ln_det));
            }
        }

        ridge = if ridge > 0. {
            ridge * RIDGE_GROWTH
        } else {
            RIDGE0 * scale
        };
    }

    Err(TensorError::DegenerateMatrix {
        attempts: MAX_RECONDITION,
        ridge,
    })
}

/// Invert every `d x d` slice along the trailing axis of a stack.
///
/// Returns the stack of inverses together with the log determinant of
/// each inverse. Slices are independent, so `Exec::Parallel` fans them
/// out over the rayon pool.
pub fn invert_sym_stack(
    stack: ArrayView3<f64>,
    exec: Exec,
) -> Result<(Array3<f64>, Array1<f64>), TensorError> {
    let dd = stack.len_of(Axis(0));
    let nn = stack.len_of(Axis(2));
    debug_assert_eq!(stack.len_of(Axis(1)), dd);

    let each: Vec<(Array2<f64>, f64)> = match exec {
        Exec::Parallel => (0..nn)
            .into_par_iter()
            .map(|k| invert_sym(stack.index_axis(Axis(2), k)))
            .collect::<Result<_, _>>()?,
        Exec::Serial => (0..nn)
            .map(|k| invert_sym(stack.index_axis(Axis(2), k)))
            .collect::<Result<_, _>>()?,
    };

    let mut inv_ddn = Array3::<f64>::zeros((dd, dd, nn));
    let mut ln_det_n = Array1::<f64>::zeros(nn);
    for (k, (inv, ln_det)) in each.into_iter().enumerate() {
        inv_ddn.index_axis_mut(Axis(2), k).assign(&inv);
        ln_det_n[k] = ln_det;
    }

    Ok((inv_ddn, ln_det_n))
}

/// Collect the diagonal of each slice into the rows of an `n x d` matrix
pub fn stack_diagonals(stack: ArrayView3<f64>) -> Array2<f64> {
    let dd = stack.len_of(Axis(0));
    let nn = stack.len_of(Axis(2));
    let mut out = Array2::<f64>::zeros((nn, dd));
    for k in 0..nn {
        out.row_mut(k).assign(&stack.index_axis(Axis(2), k).diag());
    }
    out
}
