//! Generation of random matrices for the test suites.

use ndarray::Array2;
use num::complex::Complex;
use num::traits::cast::cast;
use num::Float;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::types::Scalar;

pub trait RandomMatrix
where
    Self: Scalar,
{
    /// Generate a matrix with independent standard Gaussian entries.
    fn random_gaussian<R: Rng>(dimension: (usize, usize), rng: &mut R) -> Array2<Self>;

    /// Generate a random matrix of rank at most `rank`.
    ///
    /// The matrix is a sum of Gaussian outer products with weights
    /// decaying by a factor of ten per term, so truncation thresholds
    /// between the terms select a predictable rank.
    fn random_low_rank<R: Rng>(
        dimension: (usize, usize),
        rank: usize,
        rng: &mut R,
    ) -> Array2<Self> {
        let mut result = Array2::<Self>::zeros(dimension);
        for term in 0..rank {
            let u = Self::random_gaussian((dimension.0, 1), rng);
            let v = Self::random_gaussian((1, dimension.1), rng);
            let weight = Self::from_real(Self::real(0.1f64.powi(term as i32)));
            result.scaled_add(weight, &u.dot(&v));
        }
        result
    }
}

impl RandomMatrix for f32 {
    fn random_gaussian<R: Rng>(dimension: (usize, usize), rng: &mut R) -> Array2<f32> {
        random_gaussian_real::<f32, R>(dimension, rng)
    }
}

impl RandomMatrix for f64 {
    fn random_gaussian<R: Rng>(dimension: (usize, usize), rng: &mut R) -> Array2<f64> {
        random_gaussian_real::<f64, R>(dimension, rng)
    }
}

impl RandomMatrix for Complex<f32> {
    fn random_gaussian<R: Rng>(dimension: (usize, usize), rng: &mut R) -> Array2<Complex<f32>> {
        random_gaussian_complex::<f32, R>(dimension, rng)
    }
}

impl RandomMatrix for Complex<f64> {
    fn random_gaussian<R: Rng>(dimension: (usize, usize), rng: &mut R) -> Array2<Complex<f64>> {
        random_gaussian_complex::<f64, R>(dimension, rng)
    }
}

fn random_gaussian_real<T: Float, R: Rng>(dimension: (usize, usize), rng: &mut R) -> Array2<T> {
    let normal = Normal::new(0.0, 1.0).unwrap();
    let mut mat = Array2::<T>::zeros(dimension);
    mat.map_inplace(|item| *item = cast::<f64, T>(normal.sample(rng)).unwrap());
    mat
}

fn random_gaussian_complex<T: Float, R: Rng>(
    dimension: (usize, usize),
    rng: &mut R,
) -> Array2<Complex<T>> {
    let normal = Normal::new(0.0, 1.0).unwrap();
    let mut mat = Array2::<Complex<T>>::zeros(dimension);
    mat.map_inplace(|item| {
        let re = cast::<f64, T>(normal.sample(rng)).unwrap();
        let im = cast::<f64, T>(normal.sample(rng)).unwrap();
        *item = Complex::new(re, im);
    });
    mat
}
