//! Kernel executor: op dispatch over a context's device.

use crate::context::Context;
use anyhow::{anyhow, Result};
use lucid_backend_cpu::CpuExecutor;
use lucid_backend_gpu::{GpuExecutor, GpuPlanner};
use lucid_core::{
    BackendKind, Buffer, ChannelDataType, DeviceInfo, HostAccess, Image, KernelAccess,
    MemAllocMode, NativeType,
};
use lucid_kernels::config::{BlurProblem, ReduceProblem};
use lucid_kernels::error::KernelError;
use ndarray::ArrayView2;
use tracing::info;

/// Dispatches kernel ops for one context, routing to the CPU kernels or
/// the wgpu runtime depending on the context's device.
///
/// The executor snapshots the context's device at construction; it holds
/// no borrow, so executor and context can be released in either order.
pub struct KernelExecutor {
    device: DeviceInfo,
    cpu: CpuExecutor,
    gpu: Option<GpuExecutor>,
}

impl KernelExecutor {
    pub fn new(context: &Context) -> Result<Self> {
        let device = context.device().clone();
        let gpu = match context.backend_kind() {
            BackendKind::Gpu => Some(GpuExecutor::for_device(
                GpuPlanner::new(),
                Some(&device.name),
            )?),
            BackendKind::Cpu => None,
        };
        info!(device = %device.name, backend = %device.backend, "kernel executor bound");
        Ok(Self {
            device,
            cpu: CpuExecutor::default(),
            gpu,
        })
    }

    pub fn device(&self) -> &DeviceInfo {
        &self.device
    }

    /// A zeroed buffer with the same shape, type, and access as the template.
    pub fn create_buffer_like(&self, template: &Buffer) -> Result<Buffer> {
        Buffer::like(template)
    }

    /// A single-channel read-write buffer with best-fit allocation.
    pub fn create_buffer(&self, dims: &[usize], native_type: NativeType) -> Result<Buffer> {
        Buffer::new(
            MemAllocMode::Best,
            HostAccess::ReadWrite,
            KernelAccess::ReadWrite,
            1,
            native_type,
            dims,
        )
    }

    pub fn create_image(
        &self,
        dims: &[usize],
        channel_data_type: ChannelDataType,
    ) -> Result<Image> {
        Image::new(dims, channel_data_type)
    }

    /// Separable Gaussian blur from `src` into `dst`. Both operands must be
    /// single-channel 2D memory objects of identical shape and type.
    pub fn blur(&self, src: &Buffer, dst: &mut Buffer, sigma_x: f32, sigma_y: f32) -> Result<()> {
        if src.dims() != dst.dims()
            || src.native_type() != dst.native_type()
            || src.channels() != dst.channels()
        {
            return Err(KernelError::mismatch(format!(
                "blur operands disagree: src {:?} {:?} x{} vs dst {:?} {:?} x{}",
                src.dims(),
                src.native_type(),
                src.channels(),
                dst.dims(),
                dst.native_type(),
                dst.channels(),
            ))
            .into());
        }
        if src.dims().len() != 2 || src.channels() != 1 {
            return Err(KernelError::shape(
                src.dims(),
                "blur requires a single-channel 2D memory object",
            )
            .into());
        }

        let problem = BlurProblem::new(src.width(), src.height(), sigma_x, sigma_y);
        let samples = src.to_f32_vec();
        let blurred = self.blur_samples(problem, &samples)?;
        dst.fill_from_f32(&blurred)
    }

    /// Blur an image into another image; same operand rules as [`blur`].
    ///
    /// [`blur`]: KernelExecutor::blur
    pub fn blur_image(
        &self,
        src: &Image,
        dst: &mut Image,
        sigma_x: f32,
        sigma_y: f32,
    ) -> Result<()> {
        if src.dims() != dst.dims() || src.channel_data_type() != dst.channel_data_type() {
            return Err(KernelError::mismatch(format!(
                "blur operands disagree: src {:?} {:?} vs dst {:?} {:?}",
                src.dims(),
                src.channel_data_type(),
                dst.dims(),
                dst.channel_data_type(),
            ))
            .into());
        }
        if src.dims().len() != 2 {
            return Err(KernelError::shape(src.dims(), "blur requires a 2D image").into());
        }

        let problem = BlurProblem::new(src.width(), src.height(), sigma_x, sigma_y);
        let samples = src.to_f32_vec();
        let blurred = self.blur_samples(problem, &samples)?;
        dst.fill_from_f32(&blurred)
    }

    /// Min/max reduction over a buffer; returns `[min, max]`.
    pub fn min_max(&self, buffer: &Buffer, work_group_size: usize) -> Result<[f32; 2]> {
        let samples = buffer.to_f32_vec();
        self.min_max_samples(&samples, work_group_size)
    }

    /// Min/max reduction over an image's `width * height * depth` samples.
    pub fn min_max_image(&self, image: &Image, work_group_size: usize) -> Result<[f32; 2]> {
        let samples = image.to_f32_vec();
        self.min_max_samples(&samples, work_group_size)
    }

    /// Release the executor. Equivalent to dropping.
    pub fn close(self) {}

    fn blur_samples(&self, problem: BlurProblem, samples: &[f32]) -> Result<Vec<f32>> {
        match &self.gpu {
            Some(gpu) => gpu.execute_blur(problem, samples),
            None => {
                let src = ArrayView2::from_shape((problem.height, problem.width), samples)
                    .map_err(|err| anyhow!("failed to shape blur input: {err}"))?;
                let out = self.cpu.execute_blur(problem, src)?;
                Ok(out.into_raw_vec())
            }
        }
    }

    fn min_max_samples(&self, samples: &[f32], work_group_size: usize) -> Result<[f32; 2]> {
        let problem = ReduceProblem::new(samples.len(), work_group_size);
        let result = match &self.gpu {
            Some(gpu) => gpu.execute_min_max(problem, samples)?,
            None => self.cpu.execute_min_max(problem, samples)?,
        };
        Ok(result.to_array())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Backend, Lucid};
    use approx::assert_abs_diff_eq;
    use lucid_core::{HostAccess, KernelAccess, MemAllocMode};

    fn cpu_executor() -> (Context, KernelExecutor) {
        let lucid = Lucid::new(Backend::cpu());
        let context = lucid.cpu_device().create_context().expect("context");
        let executor = KernelExecutor::new(&context).expect("executor");
        (context, executor)
    }

    #[test]
    fn blur_rejects_mismatched_operands() {
        let (context, executor) = cpu_executor();
        let src = context
            .create_buffer(
                MemAllocMode::Best,
                HostAccess::ReadWrite,
                KernelAccess::ReadWrite,
                1,
                NativeType::U16,
                &[32, 32],
            )
            .expect("src");
        let mut dst = executor
            .create_buffer(&[32, 16], NativeType::U16)
            .expect("dst");

        let err = executor.blur(&src, &mut dst, 2.0, 2.0).expect_err("shape");
        assert!(err.to_string().contains("operand mismatch"));
    }

    #[test]
    fn blur_rejects_non_2d_input() {
        let (_context, executor) = cpu_executor();
        let src = executor
            .create_buffer(&[64], NativeType::F32)
            .expect("src");
        let mut dst = executor.create_buffer_like(&src).expect("dst");
        assert!(executor.blur(&src, &mut dst, 2.0, 2.0).is_err());
    }

    #[test]
    fn blur_of_constant_u16_is_identity() {
        let (_context, executor) = cpu_executor();
        let mut src = executor
            .create_buffer(&[64, 64], NativeType::U16)
            .expect("src");
        src.fill_from(&vec![500u16; 64 * 64]).expect("fill");
        let mut dst = executor.create_buffer_like(&src).expect("dst");

        executor.blur(&src, &mut dst, 4.0, 4.0).expect("blur");

        let mut out = vec![0u16; 64 * 64];
        dst.copy_to(&mut out).expect("copy");
        assert!(out.iter().all(|&v| v == 500));
    }

    #[test]
    fn blur_image_of_constant_u16_is_identity() {
        let (context, executor) = cpu_executor();
        let mut src = context
            .create_image(&[64, 64], ChannelDataType::UnsignedInt16)
            .expect("src");
        src.fill_from(&vec![500u16; 64 * 64]).expect("fill");
        let mut dst = executor
            .create_image(&[64, 64], ChannelDataType::UnsignedInt16)
            .expect("dst");

        executor.blur_image(&src, &mut dst, 4.0, 4.0).expect("blur");

        let mut out = vec![0u16; 64 * 64];
        dst.copy_to(&mut out).expect("copy");
        assert!(out.iter().all(|&v| v == 500));
    }

    #[test]
    fn blur_image_rejects_mismatched_operands() {
        let (context, executor) = cpu_executor();
        let src = context
            .create_image(&[32, 32], ChannelDataType::Float)
            .expect("src");
        let mut dst = executor
            .create_image(&[32, 32], ChannelDataType::UnsignedInt16)
            .expect("dst");

        let err = executor
            .blur_image(&src, &mut dst, 2.0, 2.0)
            .expect_err("mismatch");
        assert!(err.to_string().contains("operand mismatch"));
    }

    #[test]
    fn blur_image_rejects_non_2d_input() {
        let (_context, executor) = cpu_executor();
        let src = executor
            .create_image(&[64], ChannelDataType::Float)
            .expect("src");
        let mut dst = executor
            .create_image(&[64], ChannelDataType::Float)
            .expect("dst");
        assert!(executor.blur_image(&src, &mut dst, 2.0, 2.0).is_err());
    }

    #[test]
    fn min_max_over_buffer_and_image_agree() {
        let (context, executor) = cpu_executor();
        let values: Vec<f32> = (0..256 * 256).map(|i| 1.0 / (1.0 + i as f32)).collect();

        let mut buffer = executor
            .create_buffer(&[256 * 256], NativeType::F32)
            .expect("buffer");
        buffer.fill_from(&values).expect("fill");

        let mut image = context
            .create_image(&[256, 256], ChannelDataType::Float)
            .expect("image");
        image.fill_from(&values).expect("fill");

        let from_buffer = executor.min_max(&buffer, 128).expect("reduce");
        let from_image = executor.min_max_image(&image, 128).expect("reduce");

        assert_abs_diff_eq!(from_buffer[0], from_image[0]);
        assert_abs_diff_eq!(from_buffer[1], from_image[1]);
        assert_abs_diff_eq!(from_buffer[1], 1.0);
    }

    #[test]
    fn min_max_rejects_empty_work_group() {
        let (_context, executor) = cpu_executor();
        let buffer = executor
            .create_buffer(&[16], NativeType::F32)
            .expect("buffer");
        assert!(executor.min_max(&buffer, 0).is_err());
    }
}
