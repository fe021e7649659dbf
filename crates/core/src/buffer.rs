//! Linear memory objects.

use crate::convert::{bytes_to_f32, write_f32s};
use crate::types::{
    element_count, validate_dims, HostAccess, KernelAccess, MemAllocMode, NativeType,
};
use anyhow::{ensure, Result};
use bytemuck::Pod;

/// A linear memory object with a 1-3 axis shape and a fixed element type.
///
/// Backing storage lives on the host; GPU backends upload at dispatch and
/// read results back, so a buffer stays valid across contexts and devices.
#[derive(Debug, Clone)]
pub struct Buffer {
    dims: Vec<usize>,
    channels: usize,
    native_type: NativeType,
    alloc_mode: MemAllocMode,
    host_access: HostAccess,
    kernel_access: KernelAccess,
    data: Vec<u8>,
}

impl Buffer {
    pub fn new(
        alloc_mode: MemAllocMode,
        host_access: HostAccess,
        kernel_access: KernelAccess,
        channels: usize,
        native_type: NativeType,
        dims: &[usize],
    ) -> Result<Self> {
        validate_dims(dims)?;
        ensure!(channels >= 1, "channel count must be at least 1");

        let length = element_count(dims) * channels;
        Ok(Self {
            dims: dims.to_vec(),
            channels,
            native_type,
            alloc_mode,
            host_access,
            kernel_access,
            data: vec![0u8; length * native_type.element_size_bytes()],
        })
    }

    /// A new zeroed buffer with the same shape, type, and access modes.
    pub fn like(other: &Buffer) -> Result<Self> {
        Self::new(
            other.alloc_mode,
            other.host_access,
            other.kernel_access,
            other.channels,
            other.native_type,
            &other.dims,
        )
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn width(&self) -> usize {
        self.dims[0]
    }

    pub fn height(&self) -> usize {
        self.dims.get(1).copied().unwrap_or(1)
    }

    pub fn depth(&self) -> usize {
        self.dims.get(2).copied().unwrap_or(1)
    }

    /// Total number of elements, channels included.
    pub fn length(&self) -> usize {
        element_count(&self.dims) * self.channels
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn native_type(&self) -> NativeType {
        self.native_type
    }

    pub fn alloc_mode(&self) -> MemAllocMode {
        self.alloc_mode
    }

    pub fn host_access(&self) -> HostAccess {
        self.host_access
    }

    pub fn kernel_access(&self) -> KernelAccess {
        self.kernel_access
    }

    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Copy host values into the buffer. The element type and count must
    /// match the buffer exactly.
    pub fn fill_from<T: Pod>(&mut self, src: &[T]) -> Result<()> {
        ensure!(
            self.host_access.allows_write(),
            "host access {:?} forbids writing",
            self.host_access
        );
        ensure!(
            std::mem::size_of::<T>() == self.native_type.element_size_bytes(),
            "element size {} does not match {:?}",
            std::mem::size_of::<T>(),
            self.native_type
        );
        ensure!(
            src.len() == self.length(),
            "source has {} elements, buffer holds {}",
            src.len(),
            self.length()
        );
        self.data.copy_from_slice(bytemuck::cast_slice(src));
        Ok(())
    }

    /// Copy the buffer contents out to host memory.
    pub fn copy_to<T: Pod>(&self, dst: &mut [T]) -> Result<()> {
        ensure!(
            self.host_access.allows_read(),
            "host access {:?} forbids reading",
            self.host_access
        );
        ensure!(
            std::mem::size_of::<T>() == self.native_type.element_size_bytes(),
            "element size {} does not match {:?}",
            std::mem::size_of::<T>(),
            self.native_type
        );
        ensure!(
            dst.len() == self.length(),
            "destination has {} elements, buffer holds {}",
            dst.len(),
            self.length()
        );
        bytemuck::cast_slice_mut(dst).copy_from_slice(&self.data);
        Ok(())
    }

    /// Converting read used by the kernel ops; f32 regardless of storage.
    pub fn to_f32_vec(&self) -> Vec<f32> {
        bytes_to_f32(&self.data, self.native_type)
    }

    /// Converting write; integer element types round and saturate.
    pub fn fill_from_f32(&mut self, values: &[f32]) -> Result<()> {
        ensure!(
            values.len() == self.length(),
            "source has {} samples, buffer holds {}",
            values.len(),
            self.length()
        );
        write_f32s(&mut self.data, self.native_type, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn test_buffer(ty: NativeType, dims: &[usize]) -> Buffer {
        Buffer::new(
            MemAllocMode::Best,
            HostAccess::ReadWrite,
            KernelAccess::ReadWrite,
            1,
            ty,
            dims,
        )
        .expect("buffer")
    }

    #[test]
    fn length_includes_channels() {
        let buffer = Buffer::new(
            MemAllocMode::Best,
            HostAccess::ReadWrite,
            KernelAccess::ReadWrite,
            3,
            NativeType::U8,
            &[16, 8],
        )
        .expect("buffer");
        assert_eq!(buffer.length(), 16 * 8 * 3);
        assert_eq!(buffer.size_bytes(), 16 * 8 * 3);
    }

    #[test]
    fn fill_and_copy_round_trip() {
        let mut buffer = test_buffer(NativeType::U16, &[4, 2]);
        let values: Vec<u16> = (0..8).map(|i| i * 100).collect();
        buffer.fill_from(&values).expect("fill");

        let mut out = vec![0u16; 8];
        buffer.copy_to(&mut out).expect("copy");
        assert_eq!(out, values);
    }

    #[test]
    fn fill_rejects_wrong_element_type() {
        let mut buffer = test_buffer(NativeType::U16, &[4]);
        assert!(buffer.fill_from(&[1.0f32, 2.0, 3.0, 4.0]).is_err());
    }

    #[test]
    fn fill_rejects_wrong_length() {
        let mut buffer = test_buffer(NativeType::F32, &[4]);
        assert!(buffer.fill_from(&[1.0f32, 2.0]).is_err());
    }

    #[test]
    fn host_access_modes_are_enforced() {
        let mut buffer = Buffer::new(
            MemAllocMode::Best,
            HostAccess::ReadOnly,
            KernelAccess::ReadWrite,
            1,
            NativeType::F32,
            &[4],
        )
        .expect("buffer");
        assert!(buffer.fill_from(&[0.0f32; 4]).is_err());

        let mut out = vec![0.0f32; 4];
        assert!(buffer.copy_to(&mut out).is_ok());
    }

    #[test]
    fn f32_view_converts_integer_storage() {
        let mut buffer = test_buffer(NativeType::U16, &[3]);
        buffer.fill_from(&[1u16, 2, 3]).expect("fill");
        let samples = buffer.to_f32_vec();
        assert_abs_diff_eq!(samples[0], 1.0);
        assert_abs_diff_eq!(samples[2], 3.0);
    }

    #[test]
    fn like_preserves_shape_and_type() {
        let buffer = test_buffer(NativeType::U16, &[1024, 1024]);
        let twin = Buffer::like(&buffer).expect("like");
        assert_eq!(twin.dims(), buffer.dims());
        assert_eq!(twin.native_type(), buffer.native_type());
        assert_eq!(twin.length(), buffer.length());
    }
}
