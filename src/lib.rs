//! Low-rank block compression for hierarchical matrices.
//!
//! Given a rectangular index block of an implicitly defined matrix and
//! an oracle able to evaluate its rows, columns, or the whole block,
//! this crate produces a rank-k factorization `A·Bᵀ` within a relative
//! Frobenius tolerance. Four strategies are available: full SVD
//! truncation and three flavors of adaptive cross approximation. The
//! admissibility predicates decide which blocks of an H-matrix are
//! worth compressing in the first place.

pub mod admissibility;
pub mod assembly;
pub mod blas_lapack;
pub mod cluster;
pub mod compression;
pub mod flops;
pub mod full_matrix;
pub mod helpers;
pub mod random_matrix;
pub mod rk_matrix;
pub mod settings;
pub mod types;
pub mod vector;

/// How a block was, or should be, compressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompressionMethod {
    /// Full SVD truncation.
    Svd,
    /// Adaptive cross approximation on the assembled block.
    AcaFull,
    /// Adaptive cross approximation without assembling the block.
    AcaPartial,
    /// ACA with dual reference-vector pivoting.
    AcaPlus,
    /// Tag carried by rank-0 results; not a selectable algorithm.
    NoCompression,
}

pub use admissibility::{
    AdmissibilityCondition, StandardAdmissibilityCondition, TallSkinnyAdmissibilityCondition,
};
pub use assembly::{AssemblyFunction, BlockInfo, BlockType, SimpleAssemblyFunction};
pub use cluster::{AxisAlignedBoundingBox, ClusterData, ClusterTree, IndexSet};
pub use compression::{compress, compress_matrix};
pub use full_matrix::FullMatrix;
pub use rk_matrix::RkMatrix;
pub use settings::CompressionSettings;
pub use types::{c32, c64, CompressionError, CompressionScalar, Result, Scalar};
pub use vector::VectorOps;
