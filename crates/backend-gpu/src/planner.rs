//! GPU planning logic.

use anyhow::Result;
use lucid_kernels::config::{BlurProblem, ReduceProblem};
use lucid_kernels::error::KernelError;

/// Hard cap on the shared-memory reduction width.
pub const MAX_WORKGROUP_SIZE: usize = 256;

/// Upper bound on workgroups per dispatch; invocations grid-stride past it.
pub const MAX_DISPATCH_GROUPS: usize = 32768;

#[derive(Debug, Clone, Copy)]
pub struct GpuBlurPlan {
    pub problem: BlurProblem,
    pub workgroup: (u32, u32),
}

#[derive(Debug, Clone, Copy)]
pub struct GpuReducePlan {
    pub problem: ReduceProblem,
    /// Requested size rounded up to a power of two for the tree reduction.
    pub workgroup_size: u32,
    pub num_groups: u32,
}

pub struct GpuPlanner;

impl GpuPlanner {
    pub fn new() -> Self {
        Self
    }

    pub fn plan_blur(&self, problem: BlurProblem) -> Result<GpuBlurPlan> {
        problem.validate()?;
        Ok(GpuBlurPlan {
            problem,
            workgroup: (16, 16),
        })
    }

    pub fn plan_min_max(&self, problem: ReduceProblem) -> Result<GpuReducePlan> {
        problem.validate()?;
        if problem.work_group_size > MAX_WORKGROUP_SIZE {
            return Err(KernelError::InvalidWorkGroup(
                problem.work_group_size,
                format!("GPU reduction supports at most {MAX_WORKGROUP_SIZE}"),
            )
            .into());
        }

        let workgroup_size = problem.work_group_size.next_power_of_two();
        let num_groups = problem
            .len
            .div_ceil(workgroup_size)
            .min(MAX_DISPATCH_GROUPS);

        Ok(GpuReducePlan {
            problem,
            workgroup_size: workgroup_size as u32,
            num_groups: num_groups as u32,
        })
    }
}

impl Default for GpuPlanner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduce_plan_rounds_workgroup_to_power_of_two() {
        let planner = GpuPlanner::new();
        let plan = planner
            .plan_min_max(ReduceProblem::new(4096, 100))
            .expect("plan");
        assert_eq!(plan.workgroup_size, 128);
        assert_eq!(plan.num_groups, 32);
    }

    #[test]
    fn reduce_plan_caps_dispatch_groups() {
        let planner = GpuPlanner::new();
        let plan = planner
            .plan_min_max(ReduceProblem::new(64 * 1024 * 1024, 1))
            .expect("plan");
        assert!(plan.num_groups as usize <= MAX_DISPATCH_GROUPS);
    }

    #[test]
    fn oversized_workgroup_is_rejected() {
        let planner = GpuPlanner::new();
        assert!(planner.plan_min_max(ReduceProblem::new(1024, 512)).is_err());
    }
}
