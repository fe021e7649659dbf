//! Device and backend descriptors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which execution backend a device belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendKind {
    Cpu,
    Gpu,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Cpu => write!(f, "cpu"),
            BackendKind::Gpu => write!(f, "gpu"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceKind {
    Cpu,
    DiscreteGpu,
    IntegratedGpu,
    VirtualGpu,
    OtherGpu,
}

impl DeviceKind {
    /// Preference score used when picking a best device. Discrete GPUs win.
    pub fn score(&self) -> u32 {
        match self {
            DeviceKind::DiscreteGpu => 4,
            DeviceKind::IntegratedGpu => 3,
            DeviceKind::VirtualGpu => 2,
            DeviceKind::OtherGpu => 1,
            DeviceKind::Cpu => 0,
        }
    }

    pub fn is_gpu(&self) -> bool {
        !matches!(self, DeviceKind::Cpu)
    }
}

/// Information about a compute device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub name: String,
    pub backend: BackendKind,
    pub kind: DeviceKind,
    /// Driver or API the device is reached through ("Vulkan", "Metal", "host").
    pub driver: String,
}

impl DeviceInfo {
    pub fn host_cpu() -> Self {
        let threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            name: format!("host-cpu ({threads} threads)"),
            backend: BackendKind::Cpu,
            kind: DeviceKind::Cpu,
            driver: "host".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discrete_gpus_outrank_everything() {
        let kinds = [
            DeviceKind::Cpu,
            DeviceKind::OtherGpu,
            DeviceKind::VirtualGpu,
            DeviceKind::IntegratedGpu,
            DeviceKind::DiscreteGpu,
        ];
        for pair in kinds.windows(2) {
            assert!(pair[0].score() < pair[1].score());
        }
    }
}
