//! Dense symmetric linear solves for the damped normal equations.

use pricer_core::types::SolverError;

/// Solve `A x = b` for symmetric positive-definite `A` by Cholesky factorisation.
///
/// Only the lower triangle of `a` is read. Fails with
/// [`SolverError::SingularMatrix`] if `A` is not numerically positive
/// definite or the solution is not finite.
pub(crate) fn solve_symmetric(a: &[Vec<f64>], b: &[f64]) -> Result<Vec<f64>, SolverError> {
    let n = b.len();
    if n == 0 || a.len() != n {
        return Err(SolverError::dimension_mismatch("normal equations", n, a.len()));
    }

    // A = L L^T
    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }

            if i == j {
                if sum <= 0.0 || sum.is_nan() {
                    return Err(SolverError::SingularMatrix);
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    // L y = b
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * y[j];
        }
        y[i] = sum / l[i][i];
    }

    // L^T x = y
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }

    if x.iter().all(|v| v.is_finite()) {
        Ok(x)
    } else {
        Err(SolverError::SingularMatrix)
    }
}
