//! Element-type conversions between raw storage and f32 samples.
//!
//! Kernel ops compute in f32 regardless of the memory object's element
//! type; these helpers do the converting reads and the rounding,
//! saturating writes for integer storage. Conversions go through
//! `from_ne_bytes`/`to_ne_bytes` so byte storage needs no alignment.

use crate::types::NativeType;
use anyhow::{ensure, Result};

pub fn bytes_to_f32(bytes: &[u8], ty: NativeType) -> Vec<f32> {
    match ty {
        NativeType::I8 => bytes.iter().map(|&v| v as i8 as f32).collect(),
        NativeType::U8 => bytes.iter().map(|&v| v as f32).collect(),
        NativeType::I16 => bytes
            .chunks_exact(2)
            .map(|c| i16::from_ne_bytes([c[0], c[1]]) as f32)
            .collect(),
        NativeType::U16 => bytes
            .chunks_exact(2)
            .map(|c| u16::from_ne_bytes([c[0], c[1]]) as f32)
            .collect(),
        NativeType::I32 => bytes
            .chunks_exact(4)
            .map(|c| i32::from_ne_bytes([c[0], c[1], c[2], c[3]]) as f32)
            .collect(),
        NativeType::U32 => bytes
            .chunks_exact(4)
            .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]) as f32)
            .collect(),
        NativeType::F32 => bytes
            .chunks_exact(4)
            .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
    }
}

pub fn write_f32s(bytes: &mut [u8], ty: NativeType, values: &[f32]) -> Result<()> {
    ensure!(
        bytes.len() == values.len() * ty.element_size_bytes(),
        "storage holds {} bytes but {} {:?} values need {}",
        bytes.len(),
        values.len(),
        ty,
        values.len() * ty.element_size_bytes()
    );

    match ty {
        NativeType::I8 => {
            for (slot, &v) in bytes.iter_mut().zip(values) {
                *slot = (round_saturating(v, i8::MIN as f32, i8::MAX as f32) as i8) as u8;
            }
        }
        NativeType::U8 => {
            for (slot, &v) in bytes.iter_mut().zip(values) {
                *slot = round_saturating(v, 0.0, u8::MAX as f32) as u8;
            }
        }
        NativeType::I16 => {
            for (slot, &v) in bytes.chunks_exact_mut(2).zip(values) {
                let raw = round_saturating(v, i16::MIN as f32, i16::MAX as f32) as i16;
                slot.copy_from_slice(&raw.to_ne_bytes());
            }
        }
        NativeType::U16 => {
            for (slot, &v) in bytes.chunks_exact_mut(2).zip(values) {
                let raw = round_saturating(v, 0.0, u16::MAX as f32) as u16;
                slot.copy_from_slice(&raw.to_ne_bytes());
            }
        }
        NativeType::I32 => {
            for (slot, &v) in bytes.chunks_exact_mut(4).zip(values) {
                let raw = round_saturating(v, i32::MIN as f32, i32::MAX as f32) as i32;
                slot.copy_from_slice(&raw.to_ne_bytes());
            }
        }
        NativeType::U32 => {
            for (slot, &v) in bytes.chunks_exact_mut(4).zip(values) {
                let raw = round_saturating(v, 0.0, u32::MAX as f32) as u32;
                slot.copy_from_slice(&raw.to_ne_bytes());
            }
        }
        NativeType::F32 => {
            for (slot, &v) in bytes.chunks_exact_mut(4).zip(values) {
                slot.copy_from_slice(&v.to_ne_bytes());
            }
        }
    }
    Ok(())
}

fn round_saturating(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.round().clamp(min, max)
}
