//! CPU backend integration for lucid.

pub mod planner;
pub mod runtime;

pub use planner::*;
pub use runtime::*;
