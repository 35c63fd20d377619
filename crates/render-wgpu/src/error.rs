use thiserror::Error;

/// Startup failures of the GPU backend. All of them are fatal.
#[derive(Debug, Error)]
pub enum GpuError {
    #[error("no suitable GPU adapter found")]
    NoAdapter,

    #[error("failed to create presentation surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("failed to open GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("GPU allocation failed for {what}: {reason}")]
    OutOfMemory { what: &'static str, reason: String },

    #[error("GPU validation failed for {what}: {reason}")]
    Validation { what: &'static str, reason: String },

    #[error("surface reports no supported formats for this adapter")]
    UnsupportedSurface,
}

/// Run `create` inside a device error scope for `filter`, turning a captured
/// error into a [`GpuError`]. Blocks until the scope resolves.
pub(crate) fn scoped<T>(
    device: &wgpu::Device,
    filter: wgpu::ErrorFilter,
    what: &'static str,
    create: impl FnOnce() -> T,
) -> Result<T, GpuError> {
    device.push_error_scope(filter);
    let value = create();
    match pollster::block_on(device.pop_error_scope()) {
        None => Ok(value),
        Some(err) => {
            let reason = err.to_string();
            Err(match filter {
                wgpu::ErrorFilter::OutOfMemory => GpuError::OutOfMemory { what, reason },
                _ => GpuError::Validation { what, reason },
            })
        }
    }
}
