//! Device pool with automatic GPU detection.
//!
//! The NdArray CPU device is always available. A wgpu device is created when
//! a Vulkan, Metal or DX12 adapter can be opened.

use crate::error::{Error, Result};
use burn::backend::ndarray::NdArrayDevice;
use burn::backend::wgpu::{init_device, RuntimeOptions, WgpuDevice, WgpuSetup};
use tracing::{debug, warn};
use wgpu::{Backends, DeviceDescriptor, PowerPreference};

/// Where training and generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DevicePlacement {
    /// CPU via NdArray backend (always available).
    #[default]
    Cpu,
    /// GPU via Wgpu backend (requires GPU availability).
    Gpu,
}

pub struct DevicePool {
    gpu_device: Option<WgpuDevice>,
    cpu_device: NdArrayDevice,
}

impl DevicePool {
    /// Probe for a GPU; never fails, a missing adapter just leaves the pool CPU-only.
    pub fn new() -> Self {
        let gpu_device = match Self::init_gpu() {
            Ok(device) => Some(device),
            Err(e) => {
                debug!("GPU unavailable: {}", e);
                None
            }
        };

        Self {
            gpu_device,
            cpu_device: NdArrayDevice::default(),
        }
    }

    /// Skip GPU probing entirely.
    pub fn cpu_only() -> Self {
        Self {
            gpu_device: None,
            cpu_device: NdArrayDevice::default(),
        }
    }

    fn init_gpu() -> Result<WgpuDevice> {
        let setup = pollster::block_on(probe_adapter())?;
        Ok(init_device(setup, RuntimeOptions::default()))
    }

    pub fn has_gpu(&self) -> bool {
        self.gpu_device.is_some()
    }

    pub fn gpu_device(&self) -> Option<&WgpuDevice> {
        self.gpu_device.as_ref()
    }

    pub fn cpu_device(&self) -> &NdArrayDevice {
        &self.cpu_device
    }

    /// Best available placement.
    pub fn default_placement(&self) -> DevicePlacement {
        if self.has_gpu() {
            DevicePlacement::Gpu
        } else {
            DevicePlacement::Cpu
        }
    }

    /// Honour `requested` when possible, falling back to CPU.
    pub fn resolve(&self, requested: DevicePlacement) -> DevicePlacement {
        match requested {
            DevicePlacement::Gpu if !self.has_gpu() => {
                warn!("GPU requested but no adapter found, using CPU");
                DevicePlacement::Cpu
            }
            placement => placement,
        }
    }
}

/// Open the first high-performance adapter on a native graphics API.
async fn probe_adapter() -> Result<WgpuSetup> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: Backends::PRIMARY,
        ..Default::default()
    });

    let options = wgpu::RequestAdapterOptions {
        power_preference: PowerPreference::HighPerformance,
        ..Default::default()
    };
    let adapter = instance
        .request_adapter(&options)
        .await
        .map_err(|e| Error::BackendInit(format!("no GPU adapter: {e}")))?;

    let info = adapter.get_info();
    debug!("GPU adapter {} on {:?}", info.name, info.backend);

    let descriptor = DeviceDescriptor {
        label: Some("moodtrack"),
        ..Default::default()
    };
    let (device, queue) = adapter
        .request_device(&descriptor)
        .await
        .map_err(|e| Error::BackendInit(format!("{} refused a device: {e}", info.name)))?;

    Ok(WgpuSetup {
        instance,
        adapter,
        device,
        queue,
        backend: info.backend,
    })
}

impl Default for DevicePool {
    fn default() -> Self {
        Self::new()
    }
}
