//! lucid: backend-agnostic compute contexts, buffers, and kernel ops.
//!
//! The entry flow mirrors how the library is used in practice: pick a
//! backend, select a device, open a context, bind a kernel executor, run
//! ops, release.
//!
//! ```no_run
//! use lucid::{Backend, KernelExecutor, Lucid};
//! use lucid_core::NativeType;
//!
//! # fn main() -> anyhow::Result<()> {
//! let lucid = Lucid::new(Backend::best());
//! let device = lucid.best_gpu_device();
//! let context = device.create_context()?;
//! let executor = KernelExecutor::new(&context)?;
//!
//! let buffer = executor.create_buffer(&[2048 * 2048 + 1], NativeType::F32)?;
//! let [min, max] = executor.min_max(&buffer, 128)?;
//! # let _ = (min, max);
//!
//! executor.close();
//! context.close();
//! # Ok(())
//! # }
//! ```

pub mod backend;
#[cfg(feature = "cli")]
pub mod cli;
pub mod context;
pub mod executor;

pub use backend::*;
pub use context::*;
pub use executor::*;
