//! Kernel primitives and host implementations for lucid.

pub mod blur;
pub mod config;
pub mod error;
pub mod minmax;
pub mod registry;

pub use blur::*;
pub use config::*;
pub use error::*;
pub use minmax::*;
pub use registry::*;
