//! Scalar trait and error definitions shared by the whole crate.

use ndarray_linalg::error::LinalgError;
use thiserror::Error;

use crate::blas_lapack::LapackProxy;

pub use ndarray_linalg::{c32, c64, Lapack, Scalar};

#[derive(Error, Debug)]
pub enum CompressionError {
    /// A LAPACK routine returned a non-zero info code.
    #[error("LAPACK routine {routine} failed with info = {info}")]
    Lapack { routine: &'static str, info: i32 },
    /// The SVD driver failed.
    #[error("linear algebra error")]
    Linalg(#[from] LinalgError),
    /// A diagonal entry that must be invertible was exactly zero.
    #[error("division by zero in {0}")]
    ZeroPivot(&'static str),
    /// A NaN showed up while validating a compressed block.
    #[error("NaN encountered during compression validation")]
    NanDetected,
    /// `compress` was called with `CompressionMethod::NoCompression`.
    #[error("no compression method selected")]
    NoMethod,
    /// A solve was requested on a matrix that was never LU-factorized.
    #[error("matrix was not factorized before solve")]
    NotFactorized,
    /// A matrix dump has a wrong header or truncated payload.
    #[error("matrix dump is corrupt or was written for another scalar type")]
    CorruptDump,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CompressionError>;

/// Element types the compression kernels operate on.
///
/// Extends the `ndarray-linalg` scalar machinery with the constants the
/// dense primitives need: a stable type tag for matrix dumps, the raw
/// byte encoding used by the dump format, and the per-element operation
/// weights fed to the flop counter (a complex multiply costs four real
/// multiplies and two real adds).
pub trait CompressionScalar: Scalar + Lapack + LapackProxy {
    /// Type tag stored in matrix dump headers.
    const TYPE_CODE: i32;
    /// Real multiplies per scalar multiply.
    const MUL_OPS: u64;
    /// Real adds per scalar add.
    const ADD_OPS: u64;

    /// Append this element's native-endian bytes to `out`.
    fn append_ne_bytes(&self, out: &mut Vec<u8>);
    /// Decode an element from `size_of::<Self>()` native-endian bytes.
    fn from_ne_bytes(bytes: &[u8]) -> Self;
}

macro_rules! compression_scalar_real_impl {
    ($scalar:ty, $code:expr, $bytes:expr) => {
        impl CompressionScalar for $scalar {
            const TYPE_CODE: i32 = $code;
            const MUL_OPS: u64 = 1;
            const ADD_OPS: u64 = 1;

            fn append_ne_bytes(&self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_ne_bytes());
            }

            fn from_ne_bytes(bytes: &[u8]) -> Self {
                let mut buf = [0u8; $bytes];
                buf.copy_from_slice(bytes);
                <$scalar>::from_ne_bytes(buf)
            }
        }
    };
}

macro_rules! compression_scalar_complex_impl {
    ($scalar:ty, $real:ty, $code:expr, $bytes:expr) => {
        impl CompressionScalar for $scalar {
            const TYPE_CODE: i32 = $code;
            const MUL_OPS: u64 = 4;
            const ADD_OPS: u64 = 2;

            fn append_ne_bytes(&self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.re.to_ne_bytes());
                out.extend_from_slice(&self.im.to_ne_bytes());
            }

            fn from_ne_bytes(bytes: &[u8]) -> Self {
                let mut buf = [0u8; $bytes];
                buf.copy_from_slice(&bytes[..$bytes]);
                let re = <$real>::from_ne_bytes(buf);
                buf.copy_from_slice(&bytes[$bytes..]);
                let im = <$real>::from_ne_bytes(buf);
                Self::new(re, im)
            }
        }
    };
}

compression_scalar_real_impl!(f32, 0, 4);
compression_scalar_real_impl!(f64, 1, 8);
compression_scalar_complex_impl!(c32, f32, 2, 4);
compression_scalar_complex_impl!(c64, f64, 3, 8);

/// Squared magnitude of a scalar, accumulated in double precision.
///
/// Norm bookkeeping is done in `f64` for every element type so that the
/// single-precision kernels keep usable stopping criteria.
#[inline]
pub fn squared_norm<A: Scalar>(x: A) -> f64 {
    use num_traits::ToPrimitive;
    x.square().to_f64().unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_squared_norm_real() {
        assert_eq!(squared_norm(-3.0f64), 9.0);
        assert_eq!(squared_norm(0.5f32), 0.25);
    }

    #[test]
    fn test_squared_norm_complex() {
        assert_eq!(squared_norm(c64::new(3.0, 4.0)), 25.0);
        assert_eq!(squared_norm(c32::new(0.0, 2.0)), 4.0);
    }

    #[test]
    fn test_element_bytes_round_trip() {
        let x = c32::new(1.5, -2.25);
        let mut buf = Vec::new();
        x.append_ne_bytes(&mut buf);
        assert_eq!(buf.len(), std::mem::size_of::<c32>());
        assert_eq!(<c32 as CompressionScalar>::from_ne_bytes(&buf), x);

        let y = -7.0f64;
        let mut buf = Vec::new();
        y.append_ne_bytes(&mut buf);
        assert_eq!(<f64 as CompressionScalar>::from_ne_bytes(&buf), y);
    }

    #[test]
    fn test_type_codes_are_distinct() {
        let codes = [
            f32::TYPE_CODE,
            f64::TYPE_CODE,
            c32::TYPE_CODE,
            c64::TYPE_CODE,
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in codes.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }
}
