//! Approximation settings threaded through the compression driver.

use std::path::PathBuf;

/// Tolerances, rank caps, and validation toggles for one compression.
///
/// A value of this type is passed explicitly to every driver call; there
/// is no global configuration.
#[derive(Clone, Debug)]
pub struct CompressionSettings {
    /// Target relative Frobenius tolerance ε.
    pub assembly_epsilon: f64,
    /// Rank cap for the methods that honor one; 0 means unbounded.
    pub k: usize,
    /// Re-assemble each compressed block and measure the true error.
    pub validate_compression: bool,
    /// Relative error above which a validation miss is reported.
    pub validation_error_threshold: f64,
    /// Run the compression a second time on a miss (debugger bait).
    pub validation_re_run: bool,
    /// Dump the block and its approximation to disk on a miss.
    pub validation_dump: bool,
    /// Directory receiving validation dumps.
    pub validation_dump_dir: PathBuf,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        CompressionSettings {
            assembly_epsilon: 1e-4,
            k: 0,
            validate_compression: false,
            validation_error_threshold: 1e-3,
            validation_re_run: false,
            validation_dump: false,
            validation_dump_dir: PathBuf::from("."),
        }
    }
}

impl CompressionSettings {
    pub fn with_epsilon(epsilon: f64) -> Self {
        CompressionSettings {
            assembly_epsilon: epsilon,
            ..CompressionSettings::default()
        }
    }

    /// Number of singular values to keep: the smallest k such that the
    /// tail energy satisfies `Σ_{i≥k} σᵢ² ≤ ε²·Σ σᵢ²`.
    ///
    /// The singular values must be sorted in descending order, as LAPACK
    /// returns them.
    pub fn find_k(&self, sigma: &[f64]) -> usize {
        let epsilon = self.assembly_epsilon;
        let total: f64 = sigma.iter().map(|s| s * s).sum();
        let mut tail = total;
        for (k, s) in sigma.iter().enumerate() {
            if tail <= epsilon * epsilon * total {
                return k;
            }
            tail -= s * s;
        }
        sigma.len()
    }
}
