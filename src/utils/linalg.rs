//! Log-determinant of symmetric positive semi-definite matrices.

use ndarray::Array2;

/// Ridge added to the diagonal so that rank-deficient information matrices
/// still compare meaningfully (more rank always wins).
const RIDGE: f64 = 1e-6;

/// Compute `ln det(A + ridge * I)` for a symmetric PSD matrix via Cholesky.
///
/// Returns `f64::NEG_INFINITY` if the factorization breaks down, which only
/// happens for matrices that are not PSD.
///
/// # Panics
///
/// Panics if `a` is not square.
#[must_use]
pub fn log_det_psd(a: &Array2<f64>) -> f64 {
    ridge_cholesky(a).map_or(f64::NEG_INFINITY, |(_, log_det)| log_det)
}

/// Inverse of `A + ridge * I` together with its `ln det`.
///
/// `None` if `a` is not PSD.
///
/// # Panics
///
/// Panics if `a` is not square.
#[must_use]
pub fn ridge_inverse(a: &Array2<f64>) -> Option<(Array2<f64>, f64)> {
    let (l, log_det) = ridge_cholesky(a)?;
    let n = l.nrows();

    // L⁻¹ by forward substitution, then A⁻¹ = L⁻ᵀ L⁻¹.
    let mut l_inv = Array2::<f64>::zeros((n, n));
    for j in 0..n {
        l_inv[[j, j]] = 1.0 / l[[j, j]];
        for i in (j + 1)..n {
            let mut s = 0.0;
            for k in j..i {
                s += l[[i, k]] * l_inv[[k, j]];
            }
            l_inv[[i, j]] = -s / l[[i, i]];
        }
    }
    Some((l_inv.t().dot(&l_inv), log_det))
}

/// `ln |det A|` of a small general matrix by LU with partial pivoting.
///
/// Returns `f64::NEG_INFINITY` for a singular matrix or a non-positive
/// determinant.
#[must_use]
pub fn log_det_lu(mut a: Array2<f64>) -> f64 {
    let n = a.nrows();
    debug_assert_eq!(n, a.ncols());
    let mut log_det = 0.0;
    let mut negative = false;

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&x, &y| a[[x, col]].abs().total_cmp(&a[[y, col]].abs()))
            .unwrap_or(col);
        let p = a[[pivot, col]];
        if p == 0.0 || !p.is_finite() {
            return f64::NEG_INFINITY;
        }
        if pivot != col {
            for j in 0..n {
                a.swap([pivot, j], [col, j]);
            }
            negative = !negative;
        }
        if p < 0.0 {
            negative = !negative;
        }
        log_det += p.abs().ln();

        for i in (col + 1)..n {
            let factor = a[[i, col]] / p;
            if factor != 0.0 {
                for j in col..n {
                    a[[i, j]] -= factor * a[[col, j]];
                }
            }
        }
    }

    if negative {
        f64::NEG_INFINITY
    } else {
        log_det
    }
}

/// Lower Cholesky factor of `A + ridge * I` and its `ln det`.
fn ridge_cholesky(a: &Array2<f64>) -> Option<(Array2<f64>, f64)> {
    let n = a.nrows();
    assert_eq!(n, a.ncols(), "log-determinant requires a square matrix");

    let mut l = Array2::<f64>::zeros((n, n));
    let mut log_det = 0.0;

    for j in 0..n {
        let mut diag = a[[j, j]] + RIDGE;
        for k in 0..j {
            diag -= l[[j, k]] * l[[j, k]];
        }
        if diag <= 0.0 {
            return None;
        }
        let ljj = diag.sqrt();
        l[[j, j]] = ljj;
        log_det += 2.0 * ljj.ln();

        for i in (j + 1)..n {
            let mut s = a[[i, j]];
            for k in 0..j {
                s -= l[[i, k]] * l[[j, k]];
            }
            l[[i, j]] = s / ljj;
        }
    }

    Some((l, log_det))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_log_det_diagonal() {
        let a = array![[2.0, 0.0], [0.0, 3.0]];
        assert!((log_det_psd(&a) - 6.0f64.ln()).abs() < 1e-5);
    }

    #[test]
    fn test_log_det_full() {
        // det = 4*3 - 2*2 = 8
        let a = array![[4.0, 2.0], [2.0, 3.0]];
        assert!((log_det_psd(&a) - 8.0f64.ln()).abs() < 1e-5);
    }

    #[test]
    fn test_singular_is_finite_but_small() {
        let a = array![[1.0, 1.0], [1.0, 1.0]];
        let singular = log_det_psd(&a);
        let full = log_det_psd(&array![[1.0, 0.0], [0.0, 1.0]]);
        assert!(singular.is_finite());
        assert!(singular < full - 5.0);
    }

    #[test]
    fn test_ridge_inverse() {
        let a = array![[4.0, 2.0], [2.0, 3.0]];
        let (inv, log_det) = ridge_inverse(&a).unwrap();
        let product = (&a + &(Array2::<f64>::eye(2) * RIDGE)).dot(&inv);
        for i in 0..2 {
            for j in 0..2 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((product[[i, j]] - expected).abs() < 1e-9);
            }
        }
        assert!((log_det - log_det_psd(&a)).abs() < 1e-12);
        assert!(ridge_inverse(&array![[-1.0, 0.0], [0.0, 1.0]]).is_none());
    }

    #[test]
    fn test_log_det_lu() {
        // Needs a row swap; det = 0*1 - 2*3 = -6 < 0.
        assert_eq!(log_det_lu(array![[0.0, 2.0], [3.0, 1.0]]), f64::NEG_INFINITY);
        // det = 2*3 - 1*4 = 2, not symmetric.
        assert!((log_det_lu(array![[2.0, 1.0], [4.0, 3.0]]) - 2.0f64.ln()).abs() < 1e-12);
        assert_eq!(log_det_lu(array![[1.0, 2.0], [2.0, 4.0]]), f64::NEG_INFINITY);
        assert_eq!(log_det_lu(Array2::zeros((0, 0))), 0.0);
    }

    #[test]
    fn test_not_psd() {
        let a = array![[-1.0, 0.0], [0.0, 1.0]];
        assert_eq!(log_det_psd(&a), f64::NEG_INFINITY);
    }
}
