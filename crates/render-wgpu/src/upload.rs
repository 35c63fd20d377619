use crate::error::{GpuError, scoped};
use lensing_scene::Scene;

/// Device-resident, read-only copy of the scene's object records.
#[derive(Debug)]
pub struct SceneBuffer {
    buffer: wgpu::Buffer,
    count: u32,
}

impl SceneBuffer {
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn size(&self) -> u64 {
        self.buffer.size()
    }
}

/// Copy the scene into device storage through a host-visible staging buffer.
///
/// The staging buffer is released as soon as the copy is enqueued; the host
/// never waits for the copy to complete. Allocation failures are captured by
/// an error scope and reported, leaving no partial scene behind.
pub fn upload_scene(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    scene: &Scene,
) -> Result<SceneBuffer, GpuError> {
    let records = scene.gpu_records();
    let bytes: &[u8] = bytemuck::cast_slice(&records);
    let size = scene.byte_size();
    debug_assert_eq!(bytes.len() as u64, size);

    let buffer = scoped(device, wgpu::ErrorFilter::OutOfMemory, "scene storage", || {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scene_objects"),
            size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    })?;

    let staging = scoped(device, wgpu::ErrorFilter::OutOfMemory, "scene staging", || {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scene_staging"),
            size,
            usage: wgpu::BufferUsages::MAP_WRITE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: true,
        })
    })?;
    staging
        .slice(..)
        .get_mapped_range_mut()
        .copy_from_slice(bytes);
    staging.unmap();

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("scene_upload_encoder"),
    });
    encoder.copy_buffer_to_buffer(&staging, 0, &buffer, 0, size);
    // The copy holds its own reference; the staging allocation is freed once it retires.
    drop(staging);
    queue.submit(std::iter::once(encoder.finish()));

    tracing::debug!(objects = scene.len(), bytes = size, "scene uploaded");
    Ok(SceneBuffer {
        buffer,
        count: scene.object_count(),
    })
}
