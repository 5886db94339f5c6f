//! The block oracle contract.
//!
//! The compression core never sees the operator it approximates; it only
//! talks to an [`AssemblyFunction`] able to evaluate rows, columns, or a
//! whole block for a pair of clusters. `prepare_block` lets the oracle
//! precompute whatever it wants for a block and hand back hints (sparsity
//! predicates, an opaque payload); `release_block` is its paired cleanup
//! and is called exactly once per prepared block.

use std::any::Any;

use ndarray::Array1;

use crate::cluster::ClusterData;
use crate::full_matrix::FullMatrix;
use crate::types::CompressionScalar;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockType {
    Dense,
    Sparse,
    Null,
}

/// Per-block hints returned by `prepare_block`.
pub struct BlockInfo {
    pub block_type: BlockType,
    /// Opaque payload owned by the oracle, released via `release_block`.
    pub user_data: Option<Box<dyn Any>>,
    /// Present iff the block is sparse: rows known to be zero.
    pub is_null_row: Option<Box<dyn Fn(usize) -> bool>>,
    /// Present iff the block is sparse: columns known to be zero.
    pub is_null_col: Option<Box<dyn Fn(usize) -> bool>>,
}

impl BlockInfo {
    pub fn dense() -> Self {
        BlockInfo {
            block_type: BlockType::Dense,
            user_data: None,
            is_null_row: None,
            is_null_col: None,
        }
    }

    pub fn null() -> Self {
        BlockInfo {
            block_type: BlockType::Null,
            ..BlockInfo::dense()
        }
    }

    pub fn sparse(
        is_null_row: Box<dyn Fn(usize) -> bool>,
        is_null_col: Box<dyn Fn(usize) -> bool>,
    ) -> Self {
        BlockInfo {
            block_type: BlockType::Sparse,
            user_data: None,
            is_null_row: Some(is_null_row),
            is_null_col: Some(is_null_col),
        }
    }

    /// Row `index` is known to be zero from the sparsity hints.
    pub fn row_is_null(&self, index: usize) -> bool {
        self.block_type == BlockType::Sparse
            && self.is_null_row.as_ref().map_or(false, |p| p(index))
    }

    /// Column `index` is known to be zero from the sparsity hints.
    pub fn col_is_null(&self, index: usize) -> bool {
        self.block_type == BlockType::Sparse
            && self.is_null_col.as_ref().map_or(false, |p| p(index))
    }
}

/// User-supplied evaluator for blocks of the implicit matrix.
///
/// Row and column indices are local to the block; the cluster data maps
/// them to global degrees of freedom. `out` buffers are zeroed by the
/// caller before the call.
pub trait AssemblyFunction<A: CompressionScalar> {
    fn prepare_block(&self, rows: &ClusterData, cols: &ClusterData) -> BlockInfo {
        let _ = (rows, cols);
        BlockInfo::dense()
    }

    fn get_row(
        &self,
        rows: &ClusterData,
        cols: &ClusterData,
        index: usize,
        info: &BlockInfo,
        out: &mut Array1<A>,
    );

    fn get_col(
        &self,
        rows: &ClusterData,
        cols: &ClusterData,
        index: usize,
        info: &BlockInfo,
        out: &mut Array1<A>,
    );

    fn assemble(&self, rows: &ClusterData, cols: &ClusterData, info: &BlockInfo) -> FullMatrix<A>;

    fn release_block(&self, info: &mut BlockInfo) {
        let _ = info;
    }
}

/// Oracle built from a pointwise element evaluator over global indices.
pub struct SimpleAssemblyFunction<F> {
    get_element: F,
}

impl<F> SimpleAssemblyFunction<F> {
    pub fn new(get_element: F) -> Self {
        SimpleAssemblyFunction { get_element }
    }
}

impl<A, F> AssemblyFunction<A> for SimpleAssemblyFunction<F>
where
    A: CompressionScalar,
    F: Fn(usize, usize) -> A,
{
    fn get_row(
        &self,
        rows: &ClusterData,
        cols: &ClusterData,
        index: usize,
        _info: &BlockInfo,
        out: &mut Array1<A>,
    ) {
        let i = rows.global_index(index);
        for (out_elem, &j) in out.iter_mut().zip(cols.indices()) {
            *out_elem = (self.get_element)(i, j);
        }
    }

    fn get_col(
        &self,
        rows: &ClusterData,
        cols: &ClusterData,
        index: usize,
        _info: &BlockInfo,
        out: &mut Array1<A>,
    ) {
        let j = cols.global_index(index);
        for (out_elem, &i) in out.iter_mut().zip(rows.indices()) {
            *out_elem = (self.get_element)(i, j);
        }
    }

    fn assemble(&self, rows: &ClusterData, cols: &ClusterData, _info: &BlockInfo) -> FullMatrix<A> {
        let mut result = FullMatrix::new(rows.size(), cols.size());
        for (local_j, &j) in cols.indices().iter().enumerate() {
            for (local_i, &i) in rows.indices().iter().enumerate() {
                result.data[[local_i, local_j]] = (self.get_element)(i, j);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    #[test]
    fn test_simple_function_rows_cols_and_assembly_agree() {
        let f = SimpleAssemblyFunction::new(|i, j| (i as f64 + 1.0) * (j as f64 + 2.0));
        let rows = ClusterData::contiguous(0, 4);
        let cols = ClusterData::contiguous(0, 3);
        let info = BlockInfo::dense();

        let full = f.assemble(&rows, &cols, &info);
        let mut row = Array1::zeros(3);
        f.get_row(&rows, &cols, 2, &info, &mut row);
        let mut col = Array1::zeros(4);
        f.get_col(&rows, &cols, 1, &info, &mut col);

        for j in 0..3 {
            assert_eq!(row[j], full.data[[2, j]]);
        }
        for i in 0..4 {
            assert_eq!(col[i], full.data[[i, 1]]);
        }
    }

    #[test]
    fn test_simple_function_respects_cluster_indices() {
        let f = SimpleAssemblyFunction::new(|i, j| (10 * i + j) as f64);
        let rows = ClusterData::new(0, vec![5, 7], vec![[0.0; 3]; 2]);
        let cols = ClusterData::new(0, vec![1, 3], vec![[0.0; 3]; 2]);
        let full = f.assemble(&rows, &cols, &BlockInfo::dense());
        assert_eq!(full.data[[0, 0]], 51.0);
        assert_eq!(full.data[[1, 1]], 73.0);
    }

    #[test]
    fn test_sparse_hints() {
        let info = BlockInfo::sparse(Box::new(|i| i == 1), Box::new(|_| false));
        assert!(info.row_is_null(1));
        assert!(!info.row_is_null(0));
        assert!(!info.col_is_null(1));
        assert!(!BlockInfo::dense().row_is_null(0));
    }
}
