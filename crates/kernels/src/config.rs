//! Kernel problem descriptors.

use crate::error::KernelError;
use serde::{Deserialize, Serialize};

/// A 2D separable Gaussian blur over `width * height` samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlurProblem {
    pub width: usize,
    pub height: usize,
    pub sigma_x: f32,
    pub sigma_y: f32,
}

impl BlurProblem {
    pub fn new(width: usize, height: usize, sigma_x: f32, sigma_y: f32) -> Self {
        Self {
            width,
            height,
            sigma_x,
            sigma_y,
        }
    }

    pub fn validate(&self) -> Result<(), KernelError> {
        if self.width == 0 || self.height == 0 {
            return Err(KernelError::shape(
                &[self.width, self.height],
                "blur requires non-empty 2D input",
            ));
        }
        for sigma in [self.sigma_x, self.sigma_y] {
            if !sigma.is_finite() || sigma <= 0.0 {
                return Err(KernelError::InvalidSigma(sigma));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A min/max reduction over `len` samples in spans of `work_group_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReduceProblem {
    pub len: usize,
    pub work_group_size: usize,
}

impl ReduceProblem {
    pub fn new(len: usize, work_group_size: usize) -> Self {
        Self {
            len,
            work_group_size,
        }
    }

    pub fn validate(&self) -> Result<(), KernelError> {
        if self.len == 0 {
            return Err(KernelError::EmptyInput);
        }
        if self.work_group_size == 0 {
            return Err(KernelError::InvalidWorkGroup(
                self.work_group_size,
                "must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of partial (min, max) pairs stage one produces.
    pub fn num_groups(&self) -> usize {
        self.len.div_ceil(self.work_group_size)
    }
}

/// Normalized Gaussian taps for one separable pass.
///
/// Radius covers three standard deviations, so the truncated tail holds
/// well under the 1e-4 tolerance the reductions are verified at.
pub fn gaussian_taps(sigma: f32) -> Vec<f32> {
    let radius = ((3.0 * sigma).ceil() as usize).max(1);
    let inv_two_sigma_sq = 1.0 / (2.0 * sigma * sigma);

    let mut taps = Vec::with_capacity(2 * radius + 1);
    for offset in -(radius as isize)..=(radius as isize) {
        let d = offset as f32;
        taps.push((-d * d * inv_two_sigma_sq).exp());
    }

    let sum: f32 = taps.iter().sum();
    for tap in &mut taps {
        *tap /= sum;
    }
    taps
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn taps_are_normalized_and_symmetric() {
        let taps = gaussian_taps(4.0);
        assert_eq!(taps.len(), 2 * 12 + 1);
        assert_abs_diff_eq!(taps.iter().sum::<f32>(), 1.0, epsilon = 1e-6);
        for i in 0..taps.len() / 2 {
            assert_abs_diff_eq!(taps[i], taps[taps.len() - 1 - i], epsilon = 1e-7);
        }
    }

    #[test]
    fn tiny_sigma_still_yields_a_kernel() {
        let taps = gaussian_taps(0.1);
        assert_eq!(taps.len(), 3);
        assert!(taps[1] > taps[0]);
    }

    #[test]
    fn blur_problem_rejects_bad_sigma() {
        assert!(BlurProblem::new(8, 8, 0.0, 1.0).validate().is_err());
        assert!(BlurProblem::new(8, 8, 1.0, f32::NAN).validate().is_err());
        assert!(BlurProblem::new(8, 8, 4.0, 4.0).validate().is_ok());
    }

    #[test]
    fn reduce_problem_counts_groups() {
        let problem = ReduceProblem::new(2048 * 2048 + 1, 128);
        assert_eq!(problem.num_groups(), (2048 * 2048) / 128 + 1);
        assert!(problem.validate().is_ok());
        assert!(ReduceProblem::new(0, 128).validate().is_err());
        assert!(ReduceProblem::new(16, 0).validate().is_err());
    }
}
