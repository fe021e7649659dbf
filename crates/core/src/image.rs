//! Multi-dimensional image memory objects.

use crate::convert::{bytes_to_f32, write_f32s};
use crate::types::{element_count, validate_dims, ChannelDataType, NativeType};
use anyhow::{ensure, Result};
use bytemuck::Pod;

/// A texture-like memory object: a 1-3 axis shape with one channel of a
/// fixed channel data type. Like [`crate::Buffer`], the backing storage is
/// host-side and GPU backends upload at dispatch.
#[derive(Debug, Clone)]
pub struct Image {
    dims: Vec<usize>,
    channel_data_type: ChannelDataType,
    data: Vec<u8>,
}

impl Image {
    pub fn new(dims: &[usize], channel_data_type: ChannelDataType) -> Result<Self> {
        validate_dims(dims)?;
        let length = element_count(dims);
        Ok(Self {
            dims: dims.to_vec(),
            channel_data_type,
            data: vec![0u8; length * channel_data_type.element_size_bytes()],
        })
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

    pub fn length(&self) -> usize {
        element_count(&self.dims)
    }

    pub fn channel_data_type(&self) -> ChannelDataType {
        self.channel_data_type
    }

    pub fn native_type(&self) -> NativeType {
        self.channel_data_type.native_type()
    }

    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    pub fn fill_from<T: Pod>(&mut self, src: &[T]) -> Result<()> {
        ensure!(
            std::mem::size_of::<T>() == self.channel_data_type.element_size_bytes(),
            "element size {} does not match {:?}",
            std::mem::size_of::<T>(),
            self.channel_data_type
        );
        ensure!(
            src.len() == self.length(),
            "source has {} elements, image holds {}",
            src.len(),
            self.length()
        );
        self.data.copy_from_slice(bytemuck::cast_slice(src));
        Ok(())
    }

    pub fn copy_to<T: Pod>(&self, dst: &mut [T]) -> Result<()> {
        ensure!(
            std::mem::size_of::<T>() == self.channel_data_type.element_size_bytes(),
            "element size {} does not match {:?}",
            std::mem::size_of::<T>(),
            self.channel_data_type
        );
        ensure!(
            dst.len() == self.length(),
            "destination has {} elements, image holds {}",
            dst.len(),
            self.length()
        );
        bytemuck::cast_slice_mut(dst).copy_from_slice(&self.data);
        Ok(())
    }

    pub fn to_f32_vec(&self) -> Vec<f32> {
        bytes_to_f32(&self.data, self.native_type())
    }

    pub fn fill_from_f32(&mut self, values: &[f32]) -> Result<()> {
        ensure!(
            values.len() == self.length(),
            "source has {} samples, image holds {}",
            values.len(),
            self.length()
        );
        let native_type = self.native_type();
        write_f32s(&mut self.data, native_type, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_default_to_one() {
        let image = Image::new(&[64], ChannelDataType::Float).expect("image");
        assert_eq!(image.width(), 64);
        assert_eq!(image.height(), 1);
        assert_eq!(image.depth(), 1);
        assert_eq!(image.length(), 64);
    }

    #[test]
    fn float_image_round_trips() {
        let mut image = Image::new(&[4, 4], ChannelDataType::Float).expect("image");
        let values: Vec<f32> = (0..16).map(|i| 1.0 / (1.0 + i as f32)).collect();
        image.fill_from(&values).expect("fill");

        let mut out = vec![0.0f32; 16];
        image.copy_to(&mut out).expect("copy");
        assert_eq!(out, values);
    }

    #[test]
    fn u16_image_uses_two_byte_storage() {
        let image = Image::new(&[8, 8], ChannelDataType::UnsignedInt16).expect("image");
        assert_eq!(image.size_bytes(), 8 * 8 * 2);
        assert_eq!(image.native_type(), NativeType::U16);
    }
}
