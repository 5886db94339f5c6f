//! Rank-k factorization of a block.

use crate::cluster::IndexSet;
use crate::full_matrix::FullMatrix;
use crate::types::CompressionScalar;
use crate::CompressionMethod;

/// A block stored as `A·Bᵀ` with `A` of shape r×k and `B` of shape c×k.
///
/// A numerically zero block is rank 0: both operands are `None` and the
/// method tag is [`CompressionMethod::NoCompression`].
pub struct RkMatrix<A: CompressionScalar> {
    pub a: Option<FullMatrix<A>>,
    pub b: Option<FullMatrix<A>>,
    pub rows: IndexSet,
    pub cols: IndexSet,
    pub method: CompressionMethod,
}

impl<A: CompressionScalar> RkMatrix<A> {
    pub fn new(
        a: FullMatrix<A>,
        b: FullMatrix<A>,
        rows: IndexSet,
        cols: IndexSet,
        method: CompressionMethod,
    ) -> Self {
        assert_eq!(a.rows(), rows.size);
        assert_eq!(b.rows(), cols.size);
        assert_eq!(a.cols(), b.cols());
        RkMatrix {
            a: Some(a),
            b: Some(b),
            rows,
            cols,
            method,
        }
    }

    /// Rank-0 representation of a numerically zero block.
    pub fn zero(rows: IndexSet, cols: IndexSet) -> Self {
        RkMatrix {
            a: None,
            b: None,
            rows,
            cols,
            method: CompressionMethod::NoCompression,
        }
    }

    pub fn rank(&self) -> usize {
        self.a.as_ref().map_or(0, |a| a.cols())
    }

    /// Reconstruct the dense block `A·Bᵀ`.
    pub fn eval(&self) -> FullMatrix<A> {
        let mut full = FullMatrix::new(self.rows.size, self.cols.size);
        if let (Some(a), Some(b)) = (&self.a, &self.b) {
            full.gemm(b'N', b'T', A::one(), a, b, A::zero());
        }
        full
    }

    /// Block identity, used in log lines and dump file names.
    pub fn description(&self) -> String {
        format!("{}x{}", self.rows.description(), self.cols.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_eval_reconstructs_rank_one_product() {
        let a = FullMatrix::<f64>::from_array(array![[1.0], [2.0], [3.0]]);
        let b = FullMatrix::<f64>::from_array(array![[4.0], [5.0]]);
        let rk = RkMatrix::new(
            a,
            b,
            IndexSet::new(0, 3),
            IndexSet::new(0, 2),
            CompressionMethod::AcaFull,
        );
        assert_eq!(rk.rank(), 1);
        let full = rk.eval();
        assert_eq!(full.data, array![[4.0, 5.0], [8.0, 10.0], [12.0, 15.0]]);
    }

    #[test]
    fn test_zero_block_has_rank_zero_and_zero_eval() {
        let rk = RkMatrix::<f64>::zero(IndexSet::new(2, 4), IndexSet::new(0, 5));
        assert_eq!(rk.rank(), 0);
        assert_eq!(rk.method, CompressionMethod::NoCompression);
        let full = rk.eval();
        assert_eq!(full.rows(), 4);
        assert_eq!(full.cols(), 5);
        assert_eq!(full.norm_sqr(), 0.0);
        assert_eq!(rk.description(), "2_4x0_5");
    }
}
