use crate::domain::generation::{Device, DevicePreference};
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, warn};

/// Detects whether a CUDA accelerator is usable by the model runtime.
pub struct DeviceProbe {
    nvidia_smi: PathBuf,
}

impl Default for DeviceProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceProbe {
    pub fn new() -> Self {
        Self {
            nvidia_smi: PathBuf::from("nvidia-smi"),
        }
    }

    pub fn with_nvidia_smi(nvidia_smi: impl Into<PathBuf>) -> Self {
        Self {
            nvidia_smi: nvidia_smi.into(),
        }
    }

    pub async fn select(&self, preference: DevicePreference) -> Device {
        if preference == DevicePreference::Cpu {
            return Device::Cpu;
        }
        Self::resolve(preference, self.accelerator_available().await)
    }

    /// Picks the device for `preference` given an earlier probe result.
    pub fn resolve(preference: DevicePreference, accelerator_available: bool) -> Device {
        match preference {
            DevicePreference::Cpu => Device::Cpu,
            DevicePreference::Cuda => {
                if !accelerator_available {
                    warn!("CUDA forced by configuration but no GPU was detected");
                }
                Device::Cuda
            }
            DevicePreference::Auto if accelerator_available => Device::Cuda,
            DevicePreference::Auto => Device::Cpu,
        }
    }

    pub async fn accelerator_available(&self) -> bool {
        let visible = std::env::var("CUDA_VISIBLE_DEVICES").ok();
        if devices_hidden(visible.as_deref()) {
            debug!("CUDA_VISIBLE_DEVICES hides all GPUs");
            return false;
        }

        match Command::new(&self.nvidia_smi).arg("-L").output().await {
            Ok(output) if output.status.success() => {
                let gpus = count_gpus(&String::from_utf8_lossy(&output.stdout));
                debug!("nvidia-smi reported {} GPU(s)", gpus);
                gpus > 0
            }
            Ok(output) => {
                debug!("nvidia-smi exited with {}", output.status);
                false
            }
            Err(e) => {
                debug!("nvidia-smi not available: {}", e);
                false
            }
        }
    }
}

fn devices_hidden(visible_devices: Option<&str>) -> bool {
    matches!(visible_devices.map(str::trim), Some("") | Some("-1"))
}

fn count_gpus(listing: &str) -> usize {
    listing
        .lines()
        .filter(|line| line.trim_start().starts_with("GPU "))
        .count()
}
