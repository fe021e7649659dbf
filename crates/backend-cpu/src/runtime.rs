//! CPU runtime entrypoints.

use crate::planner::CpuPlanner;
use anyhow::Result;
use lucid_kernels::config::{BlurProblem, ReduceProblem};
use lucid_kernels::minmax::MinMax;
use ndarray::{Array2, ArrayView2};
use tracing::info;

pub struct CpuExecutor {
    planner: CpuPlanner,
}

impl CpuExecutor {
    pub fn new(planner: CpuPlanner) -> Self {
        Self { planner }
    }

    pub fn execute_blur(
        &self,
        problem: BlurProblem,
        src: ArrayView2<'_, f32>,
    ) -> Result<Array2<f32>> {
        let plan = self.planner.plan_blur(problem)?;
        info!(
            kernel = plan.kernel.name(),
            width = problem.width,
            height = problem.height,
            sigma_x = problem.sigma_x,
            sigma_y = problem.sigma_y,
            "executing blur plan"
        );
        Ok(plan.kernel.run(&plan.problem, src)?)
    }

    pub fn execute_min_max(&self, problem: ReduceProblem, data: &[f32]) -> Result<MinMax> {
        let plan = self.planner.plan_min_max(problem)?;
        info!(
            kernel = plan.kernel.name(),
            len = problem.len,
            work_group_size = problem.work_group_size,
            "executing min/max plan"
        );
        Ok(plan.kernel.run(&plan.problem, data)?)
    }

    pub fn planner(&self) -> &CpuPlanner {
        &self.planner
    }

    pub fn planner_mut(&mut self) -> &mut CpuPlanner {
        &mut self.planner
    }
}

impl Default for CpuExecutor {
    fn default() -> Self {
        Self::new(CpuPlanner::with_default_kernels())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::Array2;

    #[test]
    fn executor_blurs_and_reduces() {
        let executor = CpuExecutor::default();

        let src = Array2::from_elem((16, 16), 3.0f32);
        let out = executor
            .execute_blur(BlurProblem::new(16, 16, 2.0, 2.0), src.view())
            .expect("blur");
        assert_abs_diff_eq!(out[(8, 8)], 3.0, epsilon = 1e-4);

        let data: Vec<f32> = (0..1000).map(|i| 1.0 / (1.0 + i as f32)).collect();
        let result = executor
            .execute_min_max(ReduceProblem::new(data.len(), 128), &data)
            .expect("reduce");
        assert_abs_diff_eq!(result.max, 1.0);
        assert_abs_diff_eq!(result.min, 1.0 / 1000.0, epsilon = 1e-7);
    }
}
