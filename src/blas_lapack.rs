//! Raw LAPACK/BLAS bindings behind a per-scalar trait.
//!
//! The dense matrix type needs a handful of routines that have no
//! high-level counterpart in `ndarray-linalg`: pivoted LU, the pivot
//! swap, triangular solves on either side, and the explicit inverse.
//! They are wrapped here once per scalar type; callers receive the raw
//! `info` code and decide what a failure means.
//!
//! All buffers are column-major with the leading dimension passed
//! explicitly, exactly as the Fortran interfaces expect.

use crate::types::{c32, c64};

pub trait LapackProxy: Sized + Copy {
    /// LU factorization with partial pivoting (GETRF).
    fn getrf(m: i32, n: i32, a: &mut [Self], lda: i32, ipiv: &mut [i32]) -> i32;

    /// Solve with a GETRF factorization (GETRS).
    #[allow(clippy::too_many_arguments)]
    fn getrs(
        trans: u8,
        n: i32,
        nrhs: i32,
        a: &[Self],
        lda: i32,
        ipiv: &[i32],
        b: &mut [Self],
        ldb: i32,
    ) -> i32;

    /// Explicit inverse from a GETRF factorization (GETRI), including
    /// the workspace size query.
    fn getri(n: i32, a: &mut [Self], lda: i32, ipiv: &[i32]) -> i32;

    /// Cholesky factorization (POTRF).
    fn potrf(uplo: u8, n: i32, a: &mut [Self], lda: i32) -> i32;

    /// Row interchanges recorded by GETRF (LASWP).
    fn laswp(n: i32, a: &mut [Self], lda: i32, k1: i32, k2: i32, ipiv: &[i32]);

    /// Triangular solve with multiple right-hand sides (TRSM).
    #[allow(clippy::too_many_arguments)]
    fn trsm(
        side: u8,
        uplo: u8,
        transa: u8,
        diag: u8,
        m: i32,
        n: i32,
        alpha: Self,
        a: &[Self],
        lda: i32,
        b: &mut [Self],
        ldb: i32,
    );
}

macro_rules! lapack_proxy_impl {
    ($scalar:ty, $getrf:ident, $getrs:ident, $getri:ident, $potrf:ident,
     $laswp:ident, $trsm:ident, $lwork_of:expr) => {
        impl LapackProxy for $scalar {
            fn getrf(m: i32, n: i32, a: &mut [Self], lda: i32, ipiv: &mut [i32]) -> i32 {
                let mut info = 0;
                unsafe {
                    lapack::$getrf(m, n, a, lda, ipiv, &mut info);
                }
                info
            }

            fn getrs(
                trans: u8,
                n: i32,
                nrhs: i32,
                a: &[Self],
                lda: i32,
                ipiv: &[i32],
                b: &mut [Self],
                ldb: i32,
            ) -> i32 {
                let mut info = 0;
                unsafe {
                    lapack::$getrs(trans, n, nrhs, a, lda, ipiv, b, ldb, &mut info);
                }
                info
            }

            fn getri(n: i32, a: &mut [Self], lda: i32, ipiv: &[i32]) -> i32 {
                let mut info = 0;
                // Workspace query first, then the real call.
                let mut work_query = [<$scalar>::default(); 1];
                unsafe {
                    lapack::$getri(n, a, lda, ipiv, &mut work_query, -1, &mut info);
                }
                if info != 0 {
                    return info;
                }
                let lwork = $lwork_of(work_query[0]).max(1);
                let mut work = vec![<$scalar>::default(); lwork as usize];
                unsafe {
                    lapack::$getri(n, a, lda, ipiv, &mut work, lwork, &mut info);
                }
                info
            }

            fn potrf(uplo: u8, n: i32, a: &mut [Self], lda: i32) -> i32 {
                let mut info = 0;
                unsafe {
                    lapack::$potrf(uplo, n, a, lda, &mut info);
                }
                info
            }

            fn laswp(n: i32, a: &mut [Self], lda: i32, k1: i32, k2: i32, ipiv: &[i32]) {
                unsafe {
                    lapack::$laswp(n, a, lda, k1, k2, ipiv, 1);
                }
            }

            fn trsm(
                side: u8,
                uplo: u8,
                transa: u8,
                diag: u8,
                m: i32,
                n: i32,
                alpha: Self,
                a: &[Self],
                lda: i32,
                b: &mut [Self],
                ldb: i32,
            ) {
                unsafe {
                    blas::$trsm(side, uplo, transa, diag, m, n, alpha, a, lda, b, ldb);
                }
            }
        }
    };
}

lapack_proxy_impl!(f32, sgetrf, sgetrs, sgetri, spotrf, slaswp, strsm, |w: f32| w as i32);
lapack_proxy_impl!(f64, dgetrf, dgetrs, dgetri, dpotrf, dlaswp, dtrsm, |w: f64| w as i32);
lapack_proxy_impl!(c32, cgetrf, cgetrs, cgetri, cpotrf, claswp, ctrsm, |w: c32| w.re as i32);
lapack_proxy_impl!(c64, zgetrf, zgetrs, zgetri, zpotrf, zlaswp, ztrsm, |w: c64| w.re as i32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_getrf_identity_has_trivial_pivots() {
        // Column-major 3x3 identity.
        let mut a = vec![0.0f64; 9];
        a[0] = 1.0;
        a[4] = 1.0;
        a[8] = 1.0;
        let mut ipiv = vec![0i32; 3];
        let info = f64::getrf(3, 3, &mut a, 3, &mut ipiv);
        assert_eq!(info, 0);
        assert_eq!(ipiv, vec![1, 2, 3]);
    }

    #[test]
    fn test_trsm_solves_lower_system() {
        // L = [[2, 0], [1, 1]] column-major, solve L x = b for two rhs.
        let l = vec![2.0f64, 1.0, 0.0, 1.0];
        let mut b = vec![2.0f64, 3.0, 4.0, 4.0];
        f64::trsm(b'L', b'L', b'N', b'N', 2, 2, 1.0, &l, 2, &mut b, 2);
        assert_eq!(b, vec![1.0, 2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_getri_inverts_diagonal() {
        let mut a = vec![2.0f64, 0.0, 0.0, 4.0];
        let mut ipiv = vec![0i32; 2];
        assert_eq!(f64::getrf(2, 2, &mut a, 2, &mut ipiv), 0);
        assert_eq!(f64::getri(2, &mut a, 2, &ipiv), 0);
        assert_eq!(a, vec![0.5, 0.0, 0.0, 0.25]);
    }
}
