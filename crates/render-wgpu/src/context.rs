use crate::error::GpuError;
use lensing_common::Extent;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Device, queue and configured presentation surface for one window.
pub struct GpuContext {
    pub(crate) surface: wgpu::Surface<'static>,
    pub(crate) device: wgpu::Device,
    pub(crate) queue: wgpu::Queue,
    pub(crate) config: wgpu::SurfaceConfiguration,
    window: Extent,
    device_lost: Arc<AtomicBool>,
}

impl GpuContext {
    /// Open a device compatible with `target` and configure its surface for
    /// a window of `window` pixels. Blocks on adapter and device requests.
    pub fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        window: Extent,
    ) -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(target)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or(GpuError::NoAdapter)?;
        let info = adapter.get_info();
        tracing::info!(adapter = %info.name, backend = ?info.backend, "GPU adapter selected");

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("lensing_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        let device_lost = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&device_lost);
        device.set_device_lost_callback(move |reason, message| {
            tracing::error!(?reason, %message, "GPU device lost");
            flag.store(true, Ordering::Release);
        });
        device.on_uncaptured_error(Box::new(|err| {
            tracing::error!("uncaptured GPU error: {err}");
        }));

        let caps = surface.get_capabilities(&adapter);
        // The output image is already display-encoded; a linear target keeps
        // the composite a plain copy.
        let format = caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or(GpuError::UnsupportedSurface)?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: window.width.max(1),
            height: window.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        if !window.is_empty() {
            surface.configure(&device, &config);
        }
        tracing::info!(?format, %window, "surface configured");

        Ok(Self {
            surface,
            device,
            queue,
            config,
            window,
            device_lost,
        })
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn window(&self) -> Extent {
        self.window
    }

    pub fn is_device_lost(&self) -> bool {
        self.device_lost.load(Ordering::Acquire)
    }

    /// Track a new window size. A zero-area window leaves the surface as
    /// is; frames are skipped until it has area again.
    pub fn resize(&mut self, window: Extent) {
        self.window = window;
        if window.is_empty() {
            return;
        }
        self.config.width = window.width;
        self.config.height = window.height;
        self.surface.configure(&self.device, &self.config);
    }

    /// Reapply the current configuration after the surface was lost or
    /// became outdated.
    pub(crate) fn reconfigure(&self) {
        if !self.window.is_empty() {
            self.surface.configure(&self.device, &self.config);
        }
    }
}
