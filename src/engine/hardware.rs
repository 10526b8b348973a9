//! NVIDIA GPU detection and the dry-run backend used by the CLI

use std::process::Command;

use tracing::debug;

use crate::engine::backend::{DeviceInfo, Frame, HardwareBackend, HardwareSession, Packet};
use crate::engine::error::EncodeError;
use crate::engine::tuning::SessionParams;

/// Check if nvidia-smi is available
pub fn nvidia_smi_available() -> bool {
    Command::new("nvidia-smi")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Detect NVIDIA GPUs using nvidia-smi, in driver order
pub fn detect_nvidia_gpus() -> Vec<DeviceInfo> {
    // Older drivers do not know compute_cap; retry with the name alone
    query_gpus("--query-gpu=name,compute_cap")
        .or_else(|| query_gpus("--query-gpu=name"))
        .unwrap_or_default()
}

fn query_gpus(query: &str) -> Option<Vec<DeviceInfo>> {
    let output = Command::new("nvidia-smi")
        .args([query, "--format=csv,noheader"])
        .output()
        .ok()?;

    if !output.status.success() {
        debug!(query, status = %output.status, "nvidia-smi query failed");
        return None;
    }

    Some(parse_gpu_list(&String::from_utf8_lossy(&output.stdout)))
}

/// Parse `name[, major.minor]` lines as printed by nvidia-smi
pub fn parse_gpu_list(stdout: &str) -> Vec<DeviceInfo> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match line.rsplit_once(',') {
            Some((name, cap)) => match parse_compute_capability(cap.trim()) {
                Some(cc) => DeviceInfo {
                    name: name.trim().to_string(),
                    compute_capability: Some(cc),
                },
                None => DeviceInfo::new(line),
            },
            None => DeviceInfo::new(line),
        })
        .collect()
}

fn parse_compute_capability(cap: &str) -> Option<(u32, u32)> {
    let (major, minor) = cap.split_once('.')?;
    Some((major.parse().ok()?, minor.parse().ok()?))
}

/// Backend that accepts every session without touching the GPU.
///
/// `check` uses it to show what would be sent to the hardware.
#[derive(Debug, Clone)]
pub struct DryRunBackend {
    devices: Vec<DeviceInfo>,
}

impl DryRunBackend {
    pub fn new(devices: Vec<DeviceInfo>) -> Self {
        Self { devices }
    }

    /// Devices reported by nvidia-smi, or one placeholder when none is found
    pub fn detect() -> Self {
        let mut devices = detect_nvidia_gpus();
        if devices.is_empty() {
            devices.push(DeviceInfo::new("dry-run device"));
        }
        Self::new(devices)
    }
}

impl HardwareBackend for DryRunBackend {
    fn devices(&self) -> Vec<DeviceInfo> {
        self.devices.clone()
    }

    fn open(
        &self,
        device: usize,
        _params: &SessionParams,
    ) -> Result<Box<dyn HardwareSession>, EncodeError> {
        if device >= self.devices.len() {
            return Err(EncodeError::DeviceUnavailable(format!("no device #{}", device)));
        }
        Ok(Box::new(DryRunSession))
    }
}

struct DryRunSession;

impl HardwareSession for DryRunSession {
    fn encode(&mut self, _frame: Option<&Frame>) -> Result<Option<Packet>, EncodeError> {
        Ok(None)
    }

    fn close(&mut self) {}
}
