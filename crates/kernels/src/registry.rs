//! Kernel registry for lookup and discovery.
//!
//! The registry is the program set an executor is bound to; the host-side
//! analogue of a compiled kernel-source module.

use crate::blur::{BlurKernel, DynBlurKernel, ParallelBlur, ReferenceBlur};
use crate::minmax::{DynReduceKernel, ReduceKernel, ReferenceMinMax, WorkgroupMinMax};
use std::sync::Arc;

#[derive(Default, Clone)]
pub struct KernelRegistry {
    blur_kernels: Vec<DynBlurKernel>,
    reduce_kernels: Vec<DynReduceKernel>,
}

impl KernelRegistry {
    pub fn new() -> Self {
        Self {
            blur_kernels: Vec::new(),
            reduce_kernels: Vec::new(),
        }
    }

    pub fn with_default_kernels() -> Self {
        let mut registry = Self::new();
        registry.register_blur_kernel(ReferenceBlur::new());
        registry.register_blur_kernel(ParallelBlur::new());
        registry.register_reduce_kernel(ReferenceMinMax::new());
        registry.register_reduce_kernel(WorkgroupMinMax::new());
        registry
    }

    pub fn register_blur_kernel<K>(&mut self, kernel: K)
    where
        K: BlurKernel + 'static,
    {
        self.blur_kernels.push(Arc::new(kernel));
    }

    pub fn register_reduce_kernel<K>(&mut self, kernel: K)
    where
        K: ReduceKernel + 'static,
    {
        self.reduce_kernels.push(Arc::new(kernel));
    }

    pub fn blur_kernels(&self) -> &[DynBlurKernel] {
        &self.blur_kernels
    }

    pub fn reduce_kernels(&self) -> &[DynReduceKernel] {
        &self.reduce_kernels
    }

    pub fn find_blur_kernel(&self, name: &str) -> Option<DynBlurKernel> {
        self.blur_kernels
            .iter()
            .find(|kernel| kernel.name() == name)
            .map(Arc::clone)
    }

    pub fn find_reduce_kernel(&self, name: &str) -> Option<DynReduceKernel> {
        self.reduce_kernels
            .iter()
            .find(|kernel| kernel.name() == name)
            .map(Arc::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_carries_both_kernel_families() {
        let registry = KernelRegistry::with_default_kernels();
        assert_eq!(registry.blur_kernels().len(), 2);
        assert_eq!(registry.reduce_kernels().len(), 2);
        assert!(registry.find_blur_kernel("parallel").is_some());
        assert!(registry.find_reduce_kernel("workgroup").is_some());
        assert!(registry.find_reduce_kernel("missing").is_none());
    }
}
