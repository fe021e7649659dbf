//! Shared types for the lucid compute stack.

pub mod buffer;
pub mod convert;
pub mod device;
pub mod image;
pub mod types;

pub use buffer::*;
pub use convert::*;
pub use device::*;
pub use image::*;
pub use types::*;
