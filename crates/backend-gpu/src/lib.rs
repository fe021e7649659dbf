//! GPU backend interface for lucid.

pub mod planner;
pub mod runtime;
pub mod shaders;

pub use planner::*;
pub use runtime::*;
