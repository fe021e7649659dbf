//! Compute contexts.

use anyhow::Result;
use lucid_core::{
    BackendKind, Buffer, ChannelDataType, DeviceInfo, HostAccess, Image, KernelAccess,
    MemAllocMode, NativeType,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info};

/// A session bound to one device. Allocates memory objects and tracks the
/// bytes handed out; released deterministically with [`Context::close`] or
/// by dropping.
pub struct Context {
    device: DeviceInfo,
    allocated_bytes: AtomicUsize,
}

impl Context {
    pub(crate) fn new(device: DeviceInfo) -> Result<Self> {
        info!(device = %device.name, backend = %device.backend, "opening context");
        Ok(Self {
            device,
            allocated_bytes: AtomicUsize::new(0),
        })
    }

    pub fn device(&self) -> &DeviceInfo {
        &self.device
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.device.backend
    }

    pub fn allocated_bytes(&self) -> usize {
        self.allocated_bytes.load(Ordering::Relaxed)
    }

    pub fn create_buffer(
        &self,
        alloc_mode: MemAllocMode,
        host_access: HostAccess,
        kernel_access: KernelAccess,
        channels: usize,
        native_type: NativeType,
        dims: &[usize],
    ) -> Result<Buffer> {
        let buffer = Buffer::new(
            alloc_mode,
            host_access,
            kernel_access,
            channels,
            native_type,
            dims,
        )?;
        self.allocated_bytes
            .fetch_add(buffer.size_bytes(), Ordering::Relaxed);
        debug!(
            bytes = buffer.size_bytes(),
            dims = ?dims,
            ty = ?native_type,
            "allocated buffer"
        );
        Ok(buffer)
    }

    pub fn create_image(
        &self,
        dims: &[usize],
        channel_data_type: ChannelDataType,
    ) -> Result<Image> {
        let image = Image::new(dims, channel_data_type)?;
        self.allocated_bytes
            .fetch_add(image.size_bytes(), Ordering::Relaxed);
        debug!(
            bytes = image.size_bytes(),
            dims = ?dims,
            ty = ?channel_data_type,
            "allocated image"
        );
        Ok(image)
    }

    /// Release the context. Equivalent to dropping, but explicit at call
    /// sites that manage resource lifetimes by hand.
    pub fn close(self) {}
}

impl Drop for Context {
    fn drop(&mut self) {
        debug!(
            device = %self.device.name,
            allocated_bytes = self.allocated_bytes(),
            "closing context"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu_context() -> Context {
        Context::new(DeviceInfo::host_cpu()).expect("context")
    }

    #[test]
    fn context_tracks_allocations() {
        let context = cpu_context();
        let _buffer = context
            .create_buffer(
                MemAllocMode::Best,
                HostAccess::ReadWrite,
                KernelAccess::ReadWrite,
                1,
                NativeType::U16,
                &[1024, 1024],
            )
            .expect("buffer");
        assert_eq!(context.allocated_bytes(), 1024 * 1024 * 2);

        let _image = context
            .create_image(&[64, 64], ChannelDataType::Float)
            .expect("image");
        assert_eq!(context.allocated_bytes(), 1024 * 1024 * 2 + 64 * 64 * 4);
    }

    #[test]
    fn zero_axis_allocation_fails() {
        let context = cpu_context();
        assert!(context
            .create_buffer(
                MemAllocMode::Best,
                HostAccess::ReadWrite,
                KernelAccess::ReadWrite,
                1,
                NativeType::F32,
                &[0, 4],
            )
            .is_err());
        assert!(context.create_image(&[], ChannelDataType::Float).is_err());
    }
}
