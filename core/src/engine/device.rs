use serde::Serialize;
use std::path::Path;

use crate::config::DevicePreference;
use crate::engine::error::EngineError;

const NVIDIA_DRIVER_PROBES: &[&str] = &["/proc/driver/nvidia/version", "/dev/nvidia0"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Cpu,
    Cuda,
    Mps,
}

impl Device {
    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Cpu => "cpu",
            Device::Cuda => "cuda",
            Device::Mps => "mps",
        }
    }
}

/// 主机加速能力探测结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceCapabilities {
    pub cuda: bool,
    pub mps: bool,
}

impl DeviceCapabilities {
    pub fn cpu_only() -> Self {
        Self::default()
    }

    pub fn detect() -> Self {
        let cuda = NVIDIA_DRIVER_PROBES
            .iter()
            .any(|probe| Path::new(probe).exists());
        let mps = cfg!(all(target_os = "macos", target_arch = "aarch64"));
        Self { cuda, mps }
    }
}

/// `auto` 依次选择 cuda、mps、cpu；显式偏好不可用时报错。
pub fn select_device(
    preference: DevicePreference,
    capabilities: DeviceCapabilities,
) -> Result<Device, EngineError> {
    match preference {
        DevicePreference::Auto => Ok(if capabilities.cuda {
            Device::Cuda
        } else if capabilities.mps {
            Device::Mps
        } else {
            Device::Cpu
        }),
        DevicePreference::Cpu => Ok(Device::Cpu),
        DevicePreference::Cuda if capabilities.cuda => Ok(Device::Cuda),
        DevicePreference::Mps if capabilities.mps => Ok(Device::Mps),
        DevicePreference::Cuda | DevicePreference::Mps => Err(EngineError::DeviceUnavailable {
            requested: preference.as_str(),
        }),
    }
}
