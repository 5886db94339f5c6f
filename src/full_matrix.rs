//! Dense column-major matrix with the factorizations and solves used by
//! the compression kernels.
//!
//! `FullMatrix` keeps its elements in a column-major `Array2` so that the
//! LAPACK routines can work on the storage directly (leading dimension =
//! row count). On top of plain storage it remembers what has been done to
//! the matrix: triangular flags after a factorization, the LU pivot
//! vector, and the separately stored LDLᵀ diagonal.
//!
//! Every primitive reports its floating point work to the global counter
//! with the per-scalar operation weights.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::mem::size_of;
use std::path::Path;

use ndarray::{s, Array1, Array2, ArrayView1, Axis, CowArray, Ix2, ShapeBuilder};
use num_traits::Float;

use crate::flops::increment_flops;
use crate::types::{squared_norm, CompressionError, CompressionScalar, Result};

/// Dense column-major matrix.
///
/// The element storage is public; it is kept column-major by every
/// constructor and method of this type, and the LAPACK entry points rely
/// on that layout.
#[derive(Clone, Debug)]
pub struct FullMatrix<A: CompressionScalar> {
    pub data: Array2<A>,
    tri_upper: bool,
    tri_lower: bool,
    /// Pivot vector recorded by `lu_decomposition`.
    pivots: Option<Vec<i32>>,
    /// Diagonal recorded by `ldlt_decomposition`.
    diagonal: Option<Array1<A>>,
}

impl<A: CompressionScalar> FullMatrix<A> {
    /// Allocate a zero-initialized `rows`×`cols` matrix.
    pub fn new(rows: usize, cols: usize) -> Self {
        FullMatrix {
            data: Array2::zeros((rows, cols).f()),
            tri_upper: false,
            tri_lower: false,
            pivots: None,
            diagonal: None,
        }
    }

    /// Adopt an existing array, converting to column-major if needed.
    pub fn from_array(arr: Array2<A>) -> Self {
        let data = if arr.t().is_standard_layout() {
            arr
        } else {
            let mut copy = Array2::zeros(arr.raw_dim().f());
            copy.assign(&arr);
            copy
        };
        FullMatrix {
            data,
            tri_upper: false,
            tri_lower: false,
            pivots: None,
            diagonal: None,
        }
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    pub fn is_tri_upper(&self) -> bool {
        self.tri_upper
    }

    pub fn is_tri_lower(&self) -> bool {
        self.tri_lower
    }

    pub fn diagonal(&self) -> Option<&Array1<A>> {
        self.diagonal.as_ref()
    }

    /// Zero all elements, and the stored diagonal if present.
    pub fn clear(&mut self) {
        self.data.fill(A::zero());
        if let Some(diag) = &mut self.diagonal {
            diag.fill(A::zero());
        }
    }

    /// Number of elements with magnitude below 1e-16.
    pub fn stored_zeros(&self) -> usize {
        let threshold = A::real(1e-16);
        self.data.iter().filter(|x| x.abs() < threshold).count()
    }

    /// Multiply every element (and the stored diagonal) by `alpha`.
    pub fn scale(&mut self, alpha: A) {
        increment_flops(A::MUL_OPS * (self.rows() as u64) * (self.cols() as u64));
        if alpha == A::zero() {
            self.clear();
            return;
        }
        self.data.mapv_inplace(|x| x * alpha);
        if let Some(diag) = &mut self.diagonal {
            diag.mapv_inplace(|x| x * alpha);
        }
    }

    /// Transpose in place and flip the triangular flags.
    ///
    /// Square matrices are transposed by swapping, rectangular ones
    /// through a temporary buffer.
    pub fn transpose(&mut self) {
        let (rows, cols) = self.data.dim();
        if rows == cols {
            for col in 0..cols {
                for row in 0..col {
                    self.data.swap([row, col], [col, row]);
                }
            }
        } else {
            let mut transposed = Array2::zeros((cols, rows).f());
            transposed.assign(&self.data.t());
            self.data = transposed;
        }
        std::mem::swap(&mut self.tri_upper, &mut self.tri_lower);
    }

    /// Return a new matrix holding the (plain, not conjugated) transpose.
    pub fn copy_and_transpose(&self) -> Self {
        let (rows, cols) = self.data.dim();
        let mut result = FullMatrix::new(cols, rows);
        result.data.assign(&self.data.t());
        result
    }

    /// `self ← alpha·op(a)·op(b) + beta·self` with `op` selected by the
    /// BLAS transpose flags `b'N'`, `b'T'`, `b'C'`.
    pub fn gemm(&mut self, trans_a: u8, trans_b: u8, alpha: A, a: &Self, b: &Self, beta: A) {
        let va = op_view(&a.data, trans_a);
        let vb = op_view(&b.data, trans_b);
        let (m, k) = va.dim();
        let n = vb.ncols();
        assert_eq!(self.rows(), m);
        assert_eq!(self.cols(), n);
        assert_eq!(k, vb.nrows());
        increment_flops((A::ADD_OPS + A::MUL_OPS) * (m as u64) * (n as u64) * (k as u64));

        let product = va.dot(&vb);
        if beta == A::zero() {
            self.data.fill(A::zero());
        } else if beta != A::one() {
            self.data.mapv_inplace(|x| x * beta);
        }
        self.data.scaled_add(alpha, &product);
    }

    /// `y ← alpha·op(self)·x + beta·y`.
    pub fn gemv(&self, trans: u8, alpha: A, x: ArrayView1<A>, beta: A, y: &mut Array1<A>) {
        let va = op_view(&self.data, trans);
        assert_eq!(va.ncols(), x.len());
        assert_eq!(va.nrows(), y.len());
        increment_flops(
            (A::ADD_OPS + A::MUL_OPS) * (self.rows() as u64) * (self.cols() as u64),
        );

        let product = va.dot(&x);
        if beta == A::zero() {
            y.fill(A::zero());
        } else if beta != A::one() {
            y.mapv_inplace(|v| v * beta);
        }
        y.scaled_add(alpha, &product);
    }

    /// Multiply by a diagonal matrix, from the left or the right,
    /// optionally inverting the diagonal first.
    ///
    /// Inversion is guarded: a zero diagonal entry is an error.
    pub fn multiply_with_diag(&mut self, d: ArrayView1<A>, inverse: bool, left: bool) -> Result<()> {
        if left {
            assert_eq!(self.rows(), d.len());
        } else {
            assert_eq!(self.cols(), d.len());
        }
        increment_flops(A::MUL_OPS * (self.rows() as u64) * (self.cols() as u64));

        if left {
            // Invert once up front instead of once per column.
            let mut diag = Vec::with_capacity(d.len());
            for &v in d.iter() {
                if inverse {
                    if v == A::zero() {
                        return Err(CompressionError::ZeroPivot("diagonal multiply"));
                    }
                    diag.push(A::one() / v);
                } else {
                    diag.push(v);
                }
            }
            for mut col in self.data.axis_iter_mut(Axis(1)) {
                for (x, &v) in col.iter_mut().zip(diag.iter()) {
                    *x = *x * v;
                }
            }
        } else {
            for (j, mut col) in self.data.axis_iter_mut(Axis(1)).enumerate() {
                let v = if inverse {
                    if d[j] == A::zero() {
                        return Err(CompressionError::ZeroPivot("diagonal multiply"));
                    }
                    A::one() / d[j]
                } else {
                    d[j]
                };
                col.mapv_inplace(|x| x * v);
            }
        }
        Ok(())
    }

    /// LDLᵀ factorization with the diagonal stored separately.
    ///
    /// On success the matrix holds the unit lower factor L, and
    /// `diagonal()` returns D.
    pub fn ldlt_decomposition(&mut self) -> Result<()> {
        if self.rows() == 0 || self.cols() == 0 {
            return Ok(());
        }
        assert_eq!(self.rows(), self.cols());
        let n = self.rows();

        // Auxiliary column to avoid recomputing L(j,k)·D(k) products,
        // see the LDLt variant in the reference factorization papers.
        let mut v = vec![A::zero(); n];
        for j in 0..n {
            for i in 0..j {
                v[i] = self.data[[j, i]] * self.data[[i, i]];
            }
            v[j] = self.data[[j, j]];
            for i in 0..j {
                v[j] = v[j] - self.data[[j, i]] * v[i];
            }
            self.data[[j, j]] = v[j];
            for i in 0..j {
                for k in j + 1..n {
                    self.data[[k, j]] = self.data[[k, j]] - self.data[[k, i]] * v[i];
                }
            }
            if j + 1 < n && v[j] == A::zero() {
                return Err(CompressionError::ZeroPivot("LDLt factorization"));
            }
            for k in j + 1..n {
                self.data[[k, j]] = self.data[[k, j]] / v[j];
            }
        }

        let mut diagonal = Array1::zeros(n);
        for i in 0..n {
            diagonal[i] = self.data[[i, i]];
            self.data[[i, i]] = A::one();
            for j in i + 1..n {
                self.data[[i, j]] = A::zero();
            }
        }
        self.diagonal = Some(diagonal);
        self.tri_lower = true;
        Ok(())
    }

    /// Cholesky factorization via POTRF; the strict upper triangle is
    /// zeroed so that the matrix holds exactly L.
    pub fn llt_decomposition(&mut self) -> Result<()> {
        if self.rows() == 0 || self.cols() == 0 {
            return Ok(());
        }
        assert_eq!(self.rows(), self.cols());
        let n = self.rows() as u64;
        let n2 = n * n;
        let n3 = n2 * n;
        increment_flops(
            A::ADD_OPS * (n3 / 6 - n / 6) + A::MUL_OPS * (n3 / 6 + n2 / 2 + n / 3),
        );

        let rows = self.rows() as i32;
        let info = A::potrf(b'L', rows, self.fortran_slice_mut(), rows);
        if info != 0 {
            return Err(CompressionError::Lapack {
                routine: "potrf",
                info,
            });
        }
        self.tri_lower = true;
        for j in 0..self.cols() {
            for i in 0..j {
                self.data[[i, j]] = A::zero();
            }
        }
        Ok(())
    }

    /// Pivoted LU factorization via GETRF; the pivot vector is kept for
    /// the subsequent solves.
    pub fn lu_decomposition(&mut self) -> Result<()> {
        if self.rows() == 0 || self.cols() == 0 {
            return Ok(());
        }
        // Signed arithmetic: the textbook op-count polynomials go
        // negative for degenerate shapes.
        let (m, n) = (self.rows() as i64, self.cols() as i64);
        let muls = m * n * n / 2 - n * n * n / 6 + m * n / 2 - n * n / 2 + 2 * n / 3;
        let adds = m * n * n / 2 - n * n * n / 6 + m * n / 2 + n / 6;
        increment_flops(
            (A::ADD_OPS as i64 * adds + A::MUL_OPS as i64 * muls).max(0) as u64,
        );

        let mut pivots = vec![0i32; self.rows()];
        let (rows, cols) = (self.rows() as i32, self.cols() as i32);
        let info = A::getrf(rows, cols, self.fortran_slice_mut(), rows, &mut pivots);
        if info != 0 {
            return Err(CompressionError::Lapack {
                routine: "getrf",
                info,
            });
        }
        self.pivots = Some(pivots);
        Ok(())
    }

    /// Solve `L·X = B` in place, applying the recorded row interchanges
    /// first when the factor came out of GETRF.
    pub fn solve_lower_triangular_left(&self, x: &mut Self, unitriangular: bool) {
        if x.rows() == 0 || x.cols() == 0 {
            return;
        }
        let m = self.rows() as u64;
        let n = x.cols() as u64;
        increment_flops(A::ADD_OPS * (n * m * (m - 1) / 2) + A::MUL_OPS * (n * m * (m + 1) / 2));

        let rows = self.rows() as i32;
        let (x_rows, x_cols) = (x.rows() as i32, x.cols() as i32);
        if let Some(pivots) = &self.pivots {
            A::laswp(x_cols, x.fortran_slice_mut(), x_rows, 1, rows, pivots);
        }
        A::trsm(
            b'L',
            b'L',
            b'N',
            if unitriangular { b'U' } else { b'N' },
            x_rows,
            x_cols,
            A::one(),
            self.fortran_slice(),
            rows,
            x.fortran_slice_mut(),
            x_rows,
        );
    }

    /// Solve `X·U = B` in place. With `lower_stored`, the upper factor
    /// is read as the transpose of a lower-stored matrix.
    pub fn solve_upper_triangular_right(&self, x: &mut Self, unitriangular: bool, lower_stored: bool) {
        if x.rows() == 0 || x.cols() == 0 {
            return;
        }
        let m = self.rows() as u64;
        let n = x.cols() as u64;
        increment_flops(A::ADD_OPS * (n * m * (m - 1) / 2) + A::MUL_OPS * (n * m * (m + 1) / 2));

        let (x_rows, x_cols) = (x.rows() as i32, x.cols() as i32);
        A::trsm(
            b'R',
            if lower_stored { b'L' } else { b'U' },
            if lower_stored { b'T' } else { b'N' },
            if unitriangular { b'U' } else { b'N' },
            x_rows,
            x_cols,
            A::one(),
            self.fortran_slice(),
            self.rows() as i32,
            x.fortran_slice_mut(),
            x_rows,
        );
    }

    /// Solve `U·X = B` in place, with the same `lower_stored` reading as
    /// [`solve_upper_triangular_right`](Self::solve_upper_triangular_right).
    pub fn solve_upper_triangular_left(&self, x: &mut Self, unitriangular: bool, lower_stored: bool) {
        if x.rows() == 0 || x.cols() == 0 {
            return;
        }
        let m = self.rows() as u64;
        let n = x.cols() as u64;
        increment_flops(A::ADD_OPS * (n * m * (n - 1) / 2) + A::MUL_OPS * (n * m * (n + 1) / 2));

        let (x_rows, x_cols) = (x.rows() as i32, x.cols() as i32);
        A::trsm(
            b'L',
            if lower_stored { b'L' } else { b'U' },
            if lower_stored { b'T' } else { b'N' },
            if unitriangular { b'U' } else { b'N' },
            x_rows,
            x_cols,
            A::one(),
            self.fortran_slice(),
            self.rows() as i32,
            x.fortran_slice_mut(),
            x_rows,
        );
    }

    /// Solve `self·X = B` in place using the recorded LU factorization.
    pub fn solve(&self, x: &mut Self) -> Result<()> {
        if x.rows() == 0 || x.cols() == 0 {
            return Ok(());
        }
        let pivots = self
            .pivots
            .as_ref()
            .ok_or(CompressionError::NotFactorized)?;
        let n = self.rows() as u64;
        let nrhs = x.cols() as u64;
        increment_flops(A::ADD_OPS * (n * n * nrhs) + A::MUL_OPS * ((n * n - n) * nrhs));

        let (x_rows, x_cols) = (x.rows() as i32, x.cols() as i32);
        let info = A::getrs(
            b'N',
            self.rows() as i32,
            x_cols,
            self.fortran_slice(),
            self.rows() as i32,
            pivots,
            x.fortran_slice_mut(),
            x_rows,
        );
        if info != 0 {
            return Err(CompressionError::Lapack {
                routine: "getrs",
                info,
            });
        }
        Ok(())
    }

    /// Replace the matrix by its inverse (GETRF followed by GETRI).
    pub fn inverse(&mut self) -> Result<()> {
        assert_eq!(self.rows(), self.cols());
        let n = self.rows() as i64;
        // getrf
        increment_flops(
            (A::ADD_OPS as i64 * (n * n * n / 2 - n * n * n / 6 - n * n / 2 + n / 6)
                + A::MUL_OPS as i64 * (n * n * n / 2 - n * n * n / 6 + 2 * n / 3))
                .max(0) as u64,
        );
        // getri
        increment_flops(
            (A::ADD_OPS as i64 * (2 * n * n * n / 3 - 3 * n * n / 2 + 5 * n / 6)
                + A::MUL_OPS as i64 * (2 * n * n * n / 3 + n * n / 2 + 5 * n / 6))
                .max(0) as u64,
        );

        let rows = self.rows() as i32;
        let mut pivots = vec![0i32; self.rows()];
        let info = A::getrf(rows, rows, self.fortran_slice_mut(), rows, &mut pivots);
        if info != 0 {
            return Err(CompressionError::Lapack {
                routine: "getrf",
                info,
            });
        }
        let info = A::getri(rows, self.fortran_slice_mut(), rows, &pivots);
        if info != 0 {
            return Err(CompressionError::Lapack {
                routine: "getri",
                info,
            });
        }
        Ok(())
    }

    /// Copy `a` into this matrix at the given offset.
    pub fn copy_matrix_at_offset(&mut self, a: &Self, row_offset: usize, col_offset: usize) {
        assert!(row_offset + a.rows() <= self.rows());
        assert!(col_offset + a.cols() <= self.cols());

        // Whole-matrix copies go through one contiguous memcpy.
        if row_offset == 0
            && col_offset == 0
            && a.rows() == self.rows()
            && a.cols() == self.cols()
        {
            self.fortran_slice_mut().copy_from_slice(a.fortran_slice());
            return;
        }
        self.data
            .slice_mut(s![
                row_offset..row_offset + a.rows(),
                col_offset..col_offset + a.cols()
            ])
            .assign(&a.data);
    }

    /// `self ← self + alpha·a`.
    pub fn axpy(&mut self, alpha: A, a: &Self) {
        assert_eq!(self.rows(), a.rows());
        assert_eq!(self.cols(), a.cols());
        let size = (self.rows() as u64) * (self.cols() as u64);
        increment_flops(
            A::ADD_OPS * size + if alpha == A::one() { 0 } else { A::MUL_OPS * size },
        );
        self.data.scaled_add(alpha, &a.data);
    }

    /// Squared Frobenius norm, accumulated in double precision.
    pub fn norm_sqr(&self) -> f64 {
        self.data.iter().map(|&x| squared_norm(x)).sum()
    }

    /// Frobenius norm.
    pub fn norm(&self) -> f64 {
        self.norm_sqr().sqrt()
    }

    /// Error out if any element holds a NaN in its real or imaginary part.
    pub fn check_nan(&self) -> Result<()> {
        for &x in self.data.iter() {
            if x.re().is_nan() || x.im().is_nan() {
                return Err(CompressionError::NanDetected);
            }
        }
        Ok(())
    }

    /// Write the matrix in the dump format: five native-endian `i32`s
    /// (type code, rows, cols, element size, 0) followed by the elements
    /// in column-major order.
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        let header = [
            A::TYPE_CODE,
            self.rows() as i32,
            self.cols() as i32,
            size_of::<A>() as i32,
            0,
        ];
        for value in header {
            writer.write_all(&value.to_ne_bytes())?;
        }
        let mut payload = Vec::with_capacity(self.rows() * self.cols() * size_of::<A>());
        for col in self.data.axis_iter(Axis(1)) {
            for &x in col {
                x.append_ne_bytes(&mut payload);
            }
        }
        writer.write_all(&payload)?;
        Ok(())
    }

    /// Read a matrix written by [`to_file`](Self::to_file), verifying
    /// the scalar type against the header.
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut bytes = Vec::new();
        File::open(path)?.read_to_end(&mut bytes)?;
        if bytes.len() < 5 * size_of::<i32>() {
            return Err(CompressionError::CorruptDump);
        }
        let header: Vec<i32> = (0..5).map(|i| read_i32(&bytes, i * 4)).collect();
        let elem_size = size_of::<A>();
        if header[0] != A::TYPE_CODE
            || header[1] < 0
            || header[2] < 0
            || header[3] != elem_size as i32
        {
            return Err(CompressionError::CorruptDump);
        }
        let rows = header[1] as usize;
        let cols = header[2] as usize;
        if bytes.len() != 5 * size_of::<i32>() + rows * cols * elem_size {
            return Err(CompressionError::CorruptDump);
        }

        let mut result = FullMatrix::new(rows, cols);
        let mut offset = 5 * size_of::<i32>();
        for j in 0..cols {
            for i in 0..rows {
                result.data[[i, j]] = A::from_ne_bytes(&bytes[offset..offset + elem_size]);
                offset += elem_size;
            }
        }
        Ok(result)
    }

    fn fortran_slice(&self) -> &[A] {
        self.data
            .as_slice_memory_order()
            .expect("dense storage is contiguous")
    }

    fn fortran_slice_mut(&mut self) -> &mut [A] {
        self.data
            .as_slice_memory_order_mut()
            .expect("dense storage is contiguous")
    }
}

/// View a matrix through a BLAS transpose flag.
fn op_view<A: CompressionScalar>(m: &Array2<A>, trans: u8) -> CowArray<'_, A, Ix2> {
    match trans {
        b'N' => m.view().into(),
        b'T' => m.t().into(),
        _ => m.t().mapv(|x| x.conj()).into(),
    }
}

fn read_i32(bytes: &[u8], offset: usize) -> i32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[offset..offset + 4]);
    i32::from_ne_bytes(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::RelDiff;
    use crate::random_matrix::RandomMatrix;
    use crate::types::{c32, c64, Scalar};
    use ndarray::array;
    use num_traits::{One, Zero};

    fn example_matrix() -> FullMatrix<f64> {
        FullMatrix::from_array(array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]])
    }

    #[test]
    fn test_transpose_is_an_involution() {
        let original = example_matrix();
        let mut m = original.clone();
        m.transpose();
        assert_eq!(m.rows(), 3);
        assert_eq!(m.data[[2, 1]], 6.0);
        m.transpose();
        assert_eq!(m.data, original.data);
    }

    #[test]
    fn test_transpose_flips_triangular_flags() {
        let mut m = FullMatrix::<f64>::from_array(array![[4.0, 2.0], [2.0, 2.0]]);
        m.llt_decomposition().unwrap();
        assert!(m.is_tri_lower());
        m.transpose();
        assert!(m.is_tri_upper());
        assert!(!m.is_tri_lower());
        m.transpose();
        assert!(m.is_tri_lower());
    }

    #[test]
    fn test_copy_and_transpose_leaves_original_untouched() {
        let m = example_matrix();
        let t = m.copy_and_transpose();
        assert_eq!((t.rows(), t.cols()), (3, 2));
        assert_eq!(t.data[[2, 0]], 3.0);
        assert_eq!(m.data[[0, 2]], 3.0);
    }

    #[test]
    fn test_scale_and_clear() {
        let mut m = example_matrix();
        m.scale(2.0);
        assert_eq!(m.data[[1, 2]], 12.0);
        m.scale(0.0);
        assert_eq!(m.norm_sqr(), 0.0);

        let mut l = FullMatrix::<f64>::from_array(array![[2.0, -1.0], [-1.0, 2.0]]);
        l.ldlt_decomposition().unwrap();
        l.clear();
        assert_eq!(l.norm_sqr(), 0.0);
        assert_eq!(l.diagonal().unwrap().sum(), 0.0);
    }

    #[test]
    fn test_gemm_with_transpose_flags() {
        let a = example_matrix();
        let b = example_matrix();
        // c = a * b^T is 2x2.
        let mut c = FullMatrix::<f64>::new(2, 2);
        c.gemm(b'N', b'T', 1.0, &a, &b, 0.0);
        assert_eq!(c.data, array![[14.0, 32.0], [32.0, 77.0]]);

        // accumulate: c = 2 * a^T * a - c with c = ones.
        let mut c = FullMatrix::<f64>::new(3, 3);
        c.data.fill(1.0);
        c.gemm(b'T', b'N', 2.0, &a, &a, -1.0);
        assert_eq!(c.data[[0, 0]], 2.0 * 17.0 - 1.0);
    }

    #[test]
    fn test_gemv_matches_gemm() {
        let a = example_matrix();
        let x = array![1.0, -1.0, 2.0];
        let mut y = Array1::zeros(2);
        a.gemv(b'N', 1.0, x.view(), 0.0, &mut y);
        assert_eq!(y, array![5.0, 11.0]);
    }

    #[test]
    fn test_multiply_with_diag_inverse_guards_zero() {
        let mut m = example_matrix();
        let d = array![1.0, 0.0];
        let result = m.multiply_with_diag(d.view(), true, true);
        assert!(matches!(result, Err(CompressionError::ZeroPivot(_))));

        let d = array![2.0, 4.0];
        m.multiply_with_diag(d.view(), true, true).unwrap();
        assert_eq!(m.data[[0, 0]], 0.5);
        assert_eq!(m.data[[1, 0]], 1.0);
    }

    #[test]
    fn test_llt_reconstructs_spd_matrix() {
        let spd = array![[4.0, 2.0, 0.0], [2.0, 5.0, 1.0], [0.0, 1.0, 3.0]];
        let mut l = FullMatrix::<f64>::from_array(spd.clone());
        l.llt_decomposition().unwrap();
        assert!(l.is_tri_lower());
        assert_eq!(l.data[[0, 2]], 0.0);

        let mut reconstructed = FullMatrix::<f64>::new(3, 3);
        reconstructed.gemm(b'N', b'T', 1.0, &l, &l, 0.0);
        assert!(f64::rel_diff(&reconstructed.data, &spd) < 1e-14);
    }

    #[test]
    fn test_ldlt_reconstructs_symmetric_matrix() {
        let sym = array![[2.0, -1.0, 0.0], [-1.0, 2.0, -1.0], [0.0, -1.0, 2.0]];
        let mut l = FullMatrix::<f64>::from_array(sym.clone());
        l.ldlt_decomposition().unwrap();
        assert!(l.is_tri_lower());
        assert_eq!(l.data[[0, 0]], 1.0);
        let d = l.diagonal().unwrap().clone();

        let mut ld = l.clone();
        ld.multiply_with_diag(d.view(), false, false).unwrap();
        let mut reconstructed = FullMatrix::<f64>::new(3, 3);
        reconstructed.gemm(b'N', b'T', 1.0, &ld, &l, 0.0);
        assert!(f64::rel_diff(&reconstructed.data, &sym) < 1e-14);
    }

    macro_rules! lu_solve_round_trip_tests {
        ($($name:ident: $scalar:ty, $dim:expr, $tol:expr,)*) => {
            $(
            #[test]
            fn $name() {
                let n = $dim;
                let mut rng = rand::thread_rng();
                let mut arr = <$scalar>::random_gaussian((n, n), &mut rng);
                // Diagonal dominance keeps the system well conditioned.
                let shift = <$scalar>::from_real(<$scalar as Scalar>::real(n));
                for i in 0..n {
                    arr[[i, i]] = arr[[i, i]] + shift;
                }
                let original = FullMatrix::<$scalar>::from_array(arr);

                let mut factored = original.clone();
                factored.lu_decomposition().unwrap();
                let mut x = FullMatrix::<$scalar>::new(n, n);
                for i in 0..n {
                    x.data[[i, i]] = <$scalar>::one();
                }
                factored.solve(&mut x).unwrap();

                // original * x should give back the identity.
                let mut product = FullMatrix::<$scalar>::new(n, n);
                product.gemm(b'N', b'N', <$scalar>::one(), &original, &x, <$scalar>::zero());
                let mut identity = Array2::<$scalar>::zeros((n, n).f());
                for i in 0..n {
                    identity[[i, i]] = <$scalar>::one();
                }
                assert!(<$scalar>::rel_diff(&product.data, &identity) < $tol);
            }
            )*
        };
    }

    lu_solve_round_trip_tests! {
        test_lu_solve_round_trip_f32: f32, 12, 1E-4,
        test_lu_solve_round_trip_f64: f64, 12, 1E-12,
        test_lu_solve_round_trip_c32: c32, 12, 1E-4,
        test_lu_solve_round_trip_c64: c64, 12, 1E-12,
    }

    #[test]
    fn test_triangular_solves_against_lu() {
        // Solve L (U x) = P b in two triangular steps and compare with getrs.
        let arr = array![[4.0, 3.0, 1.0], [6.0, 3.0, 1.0], [8.0, 4.0, 5.0]];
        let mut factored = FullMatrix::<f64>::from_array(arr.clone());
        factored.lu_decomposition().unwrap();

        let b = array![[1.0], [2.0], [3.0]];
        let mut via_getrs = FullMatrix::<f64>::from_array(b.clone());
        factored.solve(&mut via_getrs).unwrap();

        let mut via_trsm = FullMatrix::<f64>::from_array(b);
        factored.solve_lower_triangular_left(&mut via_trsm, true);
        factored.solve_upper_triangular_left(&mut via_trsm, false, false);
        assert!(f64::rel_diff(&via_trsm.data, &via_getrs.data) < 1e-13);
    }

    #[test]
    fn test_lower_stored_right_solve_uses_transpose() {
        // With lowerStored, X·Lᵀ = B is solved using the lower factor.
        let l = FullMatrix::<f64>::from_array(array![[2.0, 0.0], [1.0, 3.0]]);
        let mut x = FullMatrix::<f64>::from_array(array![[2.0, 7.0], [4.0, 9.0]]);
        l.solve_upper_triangular_right(&mut x, false, true);

        let mut product = FullMatrix::<f64>::new(2, 2);
        product.gemm(b'N', b'T', 1.0, &x, &l, 0.0);
        assert!(f64::rel_diff(&product.data, &array![[2.0, 7.0], [4.0, 9.0]]) < 1e-14);
    }

    #[test]
    fn test_inverse_of_small_matrix() {
        let arr = array![[4.0, 7.0], [2.0, 6.0]];
        let mut inv = FullMatrix::<f64>::from_array(arr.clone());
        inv.inverse().unwrap();
        let original = FullMatrix::<f64>::from_array(arr);
        let mut product = FullMatrix::<f64>::new(2, 2);
        product.gemm(b'N', b'N', 1.0, &original, &inv, 0.0);
        assert!(f64::rel_diff(&product.data, &Array2::eye(2)) < 1e-13);
    }

    #[test]
    fn test_copy_at_offset_and_axpy() {
        let small = FullMatrix::<f64>::from_array(array![[1.0, 2.0], [3.0, 4.0]]);
        let mut big = FullMatrix::<f64>::new(3, 3);
        big.copy_matrix_at_offset(&small, 1, 1);
        assert_eq!(big.data[[1, 1]], 1.0);
        assert_eq!(big.data[[2, 2]], 4.0);
        assert_eq!(big.data[[0, 0]], 0.0);

        let mut accum = FullMatrix::<f64>::new(2, 2);
        accum.data.fill(1.0);
        accum.axpy(-2.0, &small);
        assert_eq!(accum.data[[1, 0]], 1.0 - 2.0 * 3.0);
    }

    #[test]
    fn test_norm_sqr_uses_conjugated_dot() {
        let m = FullMatrix::<c64>::from_array(array![
            [c64::new(1.0, 1.0), c64::new(0.0, 2.0)],
            [c64::new(-1.0, 0.0), c64::new(3.0, -4.0)]
        ]);
        assert_eq!(m.norm_sqr(), 2.0 + 4.0 + 1.0 + 25.0);
    }

    #[test]
    fn test_check_nan_recurses_into_components() {
        let mut m = FullMatrix::<c64>::new(2, 2);
        m.check_nan().unwrap();
        m.data[[1, 0]] = c64::new(0.0, f64::NAN);
        assert!(matches!(m.check_nan(), Err(CompressionError::NanDetected)));
    }

    #[test]
    fn test_stored_zeros() {
        let m = example_matrix();
        assert_eq!(m.stored_zeros(), 0);
        let z = FullMatrix::<f64>::new(3, 2);
        assert_eq!(z.stored_zeros(), 6);
    }

    macro_rules! dump_round_trip_tests {
        ($($name:ident: $scalar:ty,)*) => {
            $(
            #[test]
            fn $name() {
                let mut rng = rand::thread_rng();
                let arr = <$scalar>::random_gaussian((5, 3), &mut rng);
                let m = FullMatrix::<$scalar>::from_array(arr);
                let path = std::env::temp_dir().join(format!(
                    "hmat_dump_{}_{}",
                    <$scalar>::TYPE_CODE,
                    std::process::id()
                ));
                m.to_file(&path).unwrap();
                let back = FullMatrix::<$scalar>::from_file(&path).unwrap();
                std::fs::remove_file(&path).unwrap();
                assert_eq!(m.data, back.data);
            }
            )*
        };
    }

    dump_round_trip_tests! {
        test_dump_round_trip_f32: f32,
        test_dump_round_trip_f64: f64,
        test_dump_round_trip_c32: c32,
        test_dump_round_trip_c64: c64,
    }

    #[test]
    fn test_from_file_rejects_wrong_scalar() {
        let m = example_matrix();
        let path = std::env::temp_dir().join(format!("hmat_dump_mismatch_{}", std::process::id()));
        m.to_file(&path).unwrap();
        let result = FullMatrix::<f32>::from_file(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(CompressionError::CorruptDump)));
    }
}
