//! Helper operations on 1-D arrays.
//!
//! The cross approximation kernels work on rows and columns as plain
//! `ndarray` vectors. This module adds the few operations they need on
//! top of `ndarray`: the conjugated dot product, the squared norm in
//! double precision, and pivot search by absolute magnitude.

use ndarray::{ArrayBase, ArrayView1, Data, Ix1};

use crate::types::{squared_norm, Scalar};

pub trait VectorOps {
    type A: Scalar;

    /// Conjugated dot product `Σ conj(xᵢ)·yᵢ`.
    ///
    /// For real scalars this is the ordinary dot product. The complex
    /// convention matters: the norm estimates of the cross
    /// approximation loops rely on `real(dot(a, a))` being `‖a‖²`.
    fn dot_c(&self, other: ArrayView1<Self::A>) -> Self::A;

    /// Squared l2 norm, accumulated in `f64`.
    fn norm_sqr(&self) -> f64;

    /// First index holding the entry of largest squared magnitude.
    ///
    /// Returns 0 for an empty vector.
    fn absolute_max_index(&self) -> usize;

    /// True when the entry of largest magnitude is exactly zero.
    fn is_zero(&self) -> bool;
}

impl<A, S> VectorOps for ArrayBase<S, Ix1>
where
    A: Scalar,
    S: Data<Elem = A>,
{
    type A = A;

    fn dot_c(&self, other: ArrayView1<A>) -> A {
        self.mapv(|x| x.conj()).dot(&other)
    }

    fn norm_sqr(&self) -> f64 {
        self.iter().map(|&x| squared_norm(x)).sum()
    }

    fn absolute_max_index(&self) -> usize {
        let mut index = 0;
        let mut max_norm = f64::MIN;
        for (i, &x) in self.iter().enumerate() {
            let norm = squared_norm(x);
            if norm > max_norm {
                index = i;
                max_norm = norm;
            }
        }
        index
    }

    fn is_zero(&self) -> bool {
        if self.is_empty() {
            return true;
        }
        self[self.absolute_max_index()] == A::zero()
    }
}
