//! Memory object descriptors and element types.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// How backing memory for a buffer should be allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MemAllocMode {
    /// Let the backend choose the placement.
    #[default]
    Best,
    HostVisible,
    DeviceLocal,
}

/// What the host side is allowed to do with a memory object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HostAccess {
    ReadOnly,
    WriteOnly,
    ReadWrite,
    NoAccess,
}

impl HostAccess {
    pub fn allows_write(&self) -> bool {
        matches!(self, HostAccess::WriteOnly | HostAccess::ReadWrite)
    }

    pub fn allows_read(&self) -> bool {
        matches!(self, HostAccess::ReadOnly | HostAccess::ReadWrite)
    }
}

/// What kernels are allowed to do with a memory object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KernelAccess {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

/// Element type of a linear buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NativeType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
}

impl NativeType {
    pub fn element_size_bytes(&self) -> usize {
        match self {
            NativeType::I8 | NativeType::U8 => 1,
            NativeType::I16 | NativeType::U16 => 2,
            NativeType::I32 | NativeType::U32 | NativeType::F32 => 4,
        }
    }

    pub fn is_integer(&self) -> bool {
        !matches!(self, NativeType::F32)
    }
}

/// Per-channel storage type of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelDataType {
    UnsignedInt8,
    UnsignedInt16,
    SignedInt32,
    Float,
}

impl ChannelDataType {
    pub fn native_type(&self) -> NativeType {
        match self {
            ChannelDataType::UnsignedInt8 => NativeType::U8,
            ChannelDataType::UnsignedInt16 => NativeType::U16,
            ChannelDataType::SignedInt32 => NativeType::I32,
            ChannelDataType::Float => NativeType::F32,
        }
    }

    pub fn element_size_bytes(&self) -> usize {
        self.native_type().element_size_bytes()
    }
}

/// Maximum number of axes a memory object may have.
pub const MAX_DIMENSIONS: usize = 3;

pub fn validate_dims(dims: &[usize]) -> Result<()> {
    if dims.is_empty() || dims.len() > MAX_DIMENSIONS {
        bail!(
            "dimension vector must have 1 to {} axes, got {}",
            MAX_DIMENSIONS,
            dims.len()
        );
    }
    if dims.iter().any(|&d| d == 0) {
        bail!("dimension vector {:?} contains a zero axis", dims);
    }
    Ok(())
}

pub fn element_count(dims: &[usize]) -> usize {
    dims.iter().product()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dims_validation_rejects_degenerate_shapes() {
        assert!(validate_dims(&[]).is_err());
        assert!(validate_dims(&[4, 0]).is_err());
        assert!(validate_dims(&[2, 2, 2, 2]).is_err());
        assert!(validate_dims(&[1024, 1024]).is_ok());
    }

    #[test]
    fn element_sizes_match_storage() {
        assert_eq!(NativeType::U16.element_size_bytes(), 2);
        assert_eq!(NativeType::F32.element_size_bytes(), 4);
        assert_eq!(ChannelDataType::Float.native_type(), NativeType::F32);
    }
}
