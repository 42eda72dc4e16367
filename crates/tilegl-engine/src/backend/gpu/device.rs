use anyhow::{Context, Result};

/// Initialization parameters for the GPU backend.
///
/// Keep this structure minimal; add flags only when a concrete platform needs
/// them.
#[derive(Debug, Clone)]
pub struct GpuInit {
    pub power_preference: wgpu::PowerPreference,

    /// Allow a software adapter (e.g. on CI machines without a GPU).
    pub force_fallback_adapter: bool,

    /// Favour an empty set for portability.
    pub required_features: wgpu::Features,

    pub required_limits: wgpu::Limits,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
        }
    }
}

/// wgpu core objects without a surface; output goes to offscreen targets.
pub(crate) struct HeadlessGpu {
    // Kept alive for the lifetime of the device.
    _instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl HeadlessGpu {
    /// Adapter/device acquisition is asynchronous under wgpu; this blocks on it.
    pub(crate) fn new(init: GpuInit) -> Result<Self> {
        pollster::block_on(Self::request(init))
    }

    async fn request(init: GpuInit) -> Result<Self> {
        let GpuInit {
            power_preference,
            force_fallback_adapter,
            required_features,
            required_limits,
        } = init;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: None,
                force_fallback_adapter,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("tilegl device"),
                required_features,
                required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let info = adapter.get_info();
        log::info!("gpu backend: {} ({:?})", info.name, info.backend);

        Ok(Self { _instance: instance, adapter, device, queue })
    }

    #[inline]
    pub(crate) fn device(&self) -> &wgpu::Device {
        &self.device
    }

    #[inline]
    pub(crate) fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    #[inline]
    pub(crate) fn adapter_name(&self) -> String {
        self.adapter.get_info().name
    }
}
