//! wgpu backend for the lensing viewer.
//!
//! Uploads the scene once into read-only storage, runs an injected compute
//! kernel over the fixed-resolution output image each frame, and letterboxes
//! that image into the window's swapchain.
//!
//! # Invariants
//! - The scene buffer is written exactly once, before the first frame.
//! - The kernel binding contract mirrors `FrameParameters` and `GpuObject`.
//! - Frames never wait on GPU completion; back-pressure comes from target
//!   acquisition only.

mod context;
mod error;
mod gpu;
mod kernel;
mod shaders;
mod upload;

pub use context::GpuContext;
pub use error::GpuError;
pub use gpu::{WgpuBackend, WgpuRecording, WgpuTarget};
pub use kernel::ShaderKernel;
pub use upload::{SceneBuffer, upload_scene};
