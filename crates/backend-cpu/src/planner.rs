//! Planning logic for CPU execution.

use anyhow::{anyhow, Result};
use lucid_kernels::blur::DynBlurKernel;
use lucid_kernels::config::{BlurProblem, ReduceProblem};
use lucid_kernels::minmax::DynReduceKernel;
use lucid_kernels::registry::KernelRegistry;

/// Below this element count the parallel kernels lose to thread overhead.
const PARALLEL_THRESHOLD: usize = 64 * 64;

pub struct CpuBlurPlan {
    pub problem: BlurProblem,
    pub kernel: DynBlurKernel,
}

pub struct CpuReducePlan {
    pub problem: ReduceProblem,
    pub kernel: DynReduceKernel,
}

pub struct CpuPlanner {
    registry: KernelRegistry,
}

impl CpuPlanner {
    pub fn new(registry: KernelRegistry) -> Self {
        Self { registry }
    }

    pub fn with_default_kernels() -> Self {
        Self::new(KernelRegistry::with_default_kernels())
    }

    pub fn plan_blur(&self, problem: BlurProblem) -> Result<CpuBlurPlan> {
        problem.validate()?;

        let preferred = if problem.len() >= PARALLEL_THRESHOLD {
            "parallel"
        } else {
            "reference"
        };

        let kernel = self
            .registry
            .find_blur_kernel(preferred)
            .or_else(|| {
                self.registry
                    .blur_kernels()
                    .iter()
                    .find(|kernel| kernel.supports(&problem))
                    .cloned()
            })
            .ok_or_else(|| {
                anyhow!(
                    "no registered blur kernel supports {}x{}",
                    problem.width,
                    problem.height
                )
            })?;

        Ok(CpuBlurPlan { problem, kernel })
    }

    pub fn plan_min_max(&self, problem: ReduceProblem) -> Result<CpuReducePlan> {
        problem.validate()?;

        let preferred = if problem.len >= PARALLEL_THRESHOLD {
            "workgroup"
        } else {
            "reference"
        };

        let kernel = self
            .registry
            .find_reduce_kernel(preferred)
            .or_else(|| {
                self.registry
                    .reduce_kernels()
                    .iter()
                    .find(|kernel| kernel.supports(&problem))
                    .cloned()
            })
            .ok_or_else(|| {
                anyhow!(
                    "no registered reduce kernel supports len={} workgroup={}",
                    problem.len,
                    problem.work_group_size
                )
            })?;

        Ok(CpuReducePlan { problem, kernel })
    }

    pub fn registry(&self) -> &KernelRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut KernelRegistry {
        &mut self.registry
    }
}
