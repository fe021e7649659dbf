//! Backend discovery and device selection.

use crate::context::Context;
use anyhow::Result;
use lucid_core::{BackendKind, DeviceInfo};
use tracing::info;

/// A selected compute backend. `best()` probes for a GPU and falls back to
/// the CPU backend, so construction never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backend {
    kind: BackendKind,
}

impl Backend {
    pub fn best() -> Self {
        if lucid_backend_gpu::probe() {
            info!("gpu backend available");
            Self::gpu()
        } else {
            info!("no gpu adapter answered, using cpu backend");
            Self::cpu()
        }
    }

    pub fn cpu() -> Self {
        Self {
            kind: BackendKind::Cpu,
        }
    }

    pub fn gpu() -> Self {
        Self {
            kind: BackendKind::Gpu,
        }
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }
}

/// Library entry point: enumerates devices for a chosen backend.
pub struct Lucid {
    backend: Backend,
}

impl Lucid {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Every visible device. The host CPU is always present; GPU adapters
    /// are listed only when the GPU backend is selected.
    pub fn devices(&self) -> Vec<Device> {
        let mut devices = Vec::new();
        if self.backend.kind() == BackendKind::Gpu {
            devices.extend(
                lucid_backend_gpu::enumerate_devices()
                    .into_iter()
                    .map(Device::new),
            );
        }
        devices.push(Device::new(DeviceInfo::host_cpu()));
        devices
    }

    /// The highest-scoring GPU device, or the CPU device when none exists.
    pub fn best_gpu_device(&self) -> Device {
        self.devices()
            .into_iter()
            .max_by_key(|device| device.info().kind.score())
            .unwrap_or_else(|| Device::new(DeviceInfo::host_cpu()))
    }

    pub fn cpu_device(&self) -> Device {
        Device::new(DeviceInfo::host_cpu())
    }
}

/// A compute device a context can be opened on.
#[derive(Debug, Clone)]
pub struct Device {
    info: DeviceInfo,
}

impl Device {
    pub fn new(info: DeviceInfo) -> Self {
        Self { info }
    }

    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn create_context(&self) -> Result<Context> {
        Context::new(self.info.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lucid_core::DeviceKind;

    #[test]
    fn cpu_device_is_always_enumerated() {
        let lucid = Lucid::new(Backend::cpu());
        let devices = lucid.devices();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].info().kind, DeviceKind::Cpu);
    }

    #[test]
    fn best_gpu_device_falls_back_to_cpu() {
        let lucid = Lucid::new(Backend::cpu());
        let device = lucid.best_gpu_device();
        assert_eq!(device.info().backend, BackendKind::Cpu);
    }
}
