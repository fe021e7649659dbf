//! Min/max reduction kernels.

use crate::config::ReduceProblem;
use crate::error::KernelError;
use rayon::prelude::*;
use std::sync::Arc;

/// Result of a min/max reduction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMax {
    pub min: f32,
    pub max: f32,
}

impl MinMax {
    pub const IDENTITY: MinMax = MinMax {
        min: f32::INFINITY,
        max: f32::NEG_INFINITY,
    };

    pub fn fold(self, value: f32) -> MinMax {
        MinMax {
            min: self.min.min(value),
            max: self.max.max(value),
        }
    }

    pub fn merge(self, other: MinMax) -> MinMax {
        MinMax {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn to_array(self) -> [f32; 2] {
        [self.min, self.max]
    }
}

/// A min/max reduction implementation over a flat f32 slice.
pub trait ReduceKernel: Send + Sync {
    fn name(&self) -> &'static str;
    fn supports(&self, problem: &ReduceProblem) -> bool;
    fn run(&self, problem: &ReduceProblem, data: &[f32]) -> Result<MinMax, KernelError>;
}

pub type DynReduceKernel = Arc<dyn ReduceKernel>;

fn check_input(problem: &ReduceProblem, data: &[f32]) -> Result<(), KernelError> {
    problem.validate()?;
    if data.len() != problem.len {
        return Err(KernelError::mismatch(format!(
            "reduction input has {} elements, problem expects {}",
            data.len(),
            problem.len
        )));
    }
    Ok(())
}

/// Sequential fold over the whole input.
#[derive(Default)]
pub struct ReferenceMinMax;

impl ReferenceMinMax {
    pub fn new() -> Self {
        Self
    }
}

impl ReduceKernel for ReferenceMinMax {
    fn name(&self) -> &'static str {
        "reference"
    }

    fn supports(&self, _problem: &ReduceProblem) -> bool {
        true
    }

    fn run(&self, problem: &ReduceProblem, data: &[f32]) -> Result<MinMax, KernelError> {
        check_input(problem, data)?;
        Ok(data.iter().copied().fold(MinMax::IDENTITY, MinMax::fold))
    }
}

/// Two-stage reduction: spans of `work_group_size` elements collapse into
/// partial (min, max) pairs in parallel, then the partials are merged.
/// Mirrors the structure of the GPU shared-memory reduction so both paths
/// produce the same partial layout.
#[derive(Default)]
pub struct WorkgroupMinMax;

impl WorkgroupMinMax {
    pub fn new() -> Self {
        Self
    }
}

impl ReduceKernel for WorkgroupMinMax {
    fn name(&self) -> &'static str {
        "workgroup"
    }

    fn supports(&self, _problem: &ReduceProblem) -> bool {
        true
    }

    fn run(&self, problem: &ReduceProblem, data: &[f32]) -> Result<MinMax, KernelError> {
        check_input(problem, data)?;

        let partials: Vec<MinMax> = data
            .par_chunks(problem.work_group_size)
            .map(|span| span.iter().copied().fold(MinMax::IDENTITY, MinMax::fold))
            .collect();

        Ok(partials
            .into_iter()
            .fold(MinMax::IDENTITY, |acc, pair| acc.merge(pair)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn harmonic_series(len: usize) -> Vec<f32> {
        (0..len).map(|i| 1.0 / (1.0 + i as f32)).collect()
    }

    #[test]
    fn reference_finds_extremes() {
        let data = harmonic_series(1000);
        let problem = ReduceProblem::new(data.len(), 128);
        let result = ReferenceMinMax::new().run(&problem, &data).expect("reduce");
        assert_abs_diff_eq!(result.max, 1.0);
        assert_abs_diff_eq!(result.min, 1.0 / 1000.0, epsilon = 1e-7);
    }

    #[test]
    fn workgroup_matches_reference_on_uneven_span() {
        // Length is one past a span boundary, leaving a single-element tail.
        let data = harmonic_series(128 * 37 + 1);
        let problem = ReduceProblem::new(data.len(), 128);

        let reference = ReferenceMinMax::new().run(&problem, &data).expect("reduce");
        let workgroup = WorkgroupMinMax::new().run(&problem, &data).expect("reduce");

        assert_abs_diff_eq!(reference.min, workgroup.min);
        assert_abs_diff_eq!(reference.max, workgroup.max);
    }

    #[test]
    fn single_element_returns_itself_twice() {
        let problem = ReduceProblem::new(1, 128);
        let result = WorkgroupMinMax::new()
            .run(&problem, &[0.25])
            .expect("reduce");
        assert_eq!(result.to_array(), [0.25, 0.25]);
    }

    #[test]
    fn negative_values_are_handled() {
        let data = vec![3.0, -7.5, 0.0, 12.25, -1.0];
        let problem = ReduceProblem::new(data.len(), 2);
        let result = WorkgroupMinMax::new().run(&problem, &data).expect("reduce");
        assert_eq!(result.to_array(), [-7.5, 12.25]);
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let problem = ReduceProblem::new(8, 4);
        let err = ReferenceMinMax::new()
            .run(&problem, &[1.0, 2.0])
            .expect_err("mismatch");
        assert!(matches!(err, KernelError::OperandMismatch(_)));
    }
}
