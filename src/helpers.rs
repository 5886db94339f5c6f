//! Small helpers shared by the test suites.

use ndarray::{ArrayBase, Data, Ix2};
use ndarray_linalg::OperationNorm;

use crate::types::{c32, c64, Scalar};

/// Relative Frobenius norm difference between two matrices.
pub trait RelDiff {
    type A: Scalar;

    fn rel_diff<S1, S2>(
        first: &ArrayBase<S1, Ix2>,
        second: &ArrayBase<S2, Ix2>,
    ) -> <Self::A as Scalar>::Real
    where
        S1: Data<Elem = Self::A>,
        S2: Data<Elem = Self::A>;
}

macro_rules! rel_diff_impl {
    ($scalar:ty) => {
        impl RelDiff for $scalar {
            type A = $scalar;

            fn rel_diff<S1, S2>(
                first: &ArrayBase<S1, Ix2>,
                second: &ArrayBase<S2, Ix2>,
            ) -> <Self::A as Scalar>::Real
            where
                S1: Data<Elem = Self::A>,
                S2: Data<Elem = Self::A>,
            {
                let diff = first.to_owned() - second;
                diff.opnorm_fro().unwrap() / second.to_owned().opnorm_fro().unwrap()
            }
        }
    };
}

rel_diff_impl!(f32);
rel_diff_impl!(f64);
rel_diff_impl!(c32);
rel_diff_impl!(c64);
