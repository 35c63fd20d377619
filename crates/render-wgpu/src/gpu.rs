use crate::context::GpuContext;
use crate::error::{GpuError, scoped};
use crate::kernel::ShaderKernel;
use crate::shaders;
use crate::upload::{SceneBuffer, upload_scene};
use lensing_common::Extent;
use lensing_common::constants::{CLEAR_COLOR, OUTPUT_EXTENT};
use lensing_render::{DispatchGrid, FrameBackend, FrameError, FrameParameters, Viewport};
use lensing_scene::Scene;
use std::num::NonZeroU64;

const OUTPUT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// One frame's command stream.
pub struct WgpuRecording {
    encoder: wgpu::CommandEncoder,
}

/// An acquired swapchain image.
pub struct WgpuTarget {
    texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
}

/// GPU frame backend: compute kernel into a fixed-size storage image, then a
/// letterboxed full-screen copy into the swapchain.
pub struct WgpuBackend {
    context: GpuContext,
    _scene: SceneBuffer,
    params_buffer: wgpu::Buffer,
    compute_pipeline: wgpu::ComputePipeline,
    compute_bind_group: wgpu::BindGroup,
    composite_pipeline: wgpu::RenderPipeline,
    composite_bind_group: wgpu::BindGroup,
    _output: wgpu::Texture,
}

impl WgpuBackend {
    /// Upload `scene` and build both pipelines around `kernel`. Every
    /// allocation and shader compile is checked; any failure is fatal.
    pub fn new(context: GpuContext, scene: &Scene, kernel: &ShaderKernel) -> Result<Self, GpuError> {
        let device = &context.device;
        let scene_buffer = upload_scene(device, &context.queue, scene)?;

        let params_size = std::mem::size_of::<FrameParameters>() as u64;
        let params_buffer = scoped(device, wgpu::ErrorFilter::OutOfMemory, "frame parameters", || {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("frame_parameters"),
                size: params_size,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        })?;

        let output = scoped(device, wgpu::ErrorFilter::OutOfMemory, "output image", || {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some("output_image"),
                size: wgpu::Extent3d {
                    width: OUTPUT_EXTENT.width,
                    height: OUTPUT_EXTENT.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: OUTPUT_FORMAT,
                usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            })
        })?;
        let output_view = output.create_view(&Default::default());

        // Compute: params (0), objects (1), output image (2)
        let compute_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("kernel_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: NonZeroU64::new(params_size),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: OUTPUT_FORMAT,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
            ],
        });

        let compute_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("kernel_bind_group"),
            layout: &compute_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: scene_buffer.buffer().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&output_view),
                },
            ],
        });

        let compute_pipeline = scoped(device, wgpu::ErrorFilter::Validation, "compute kernel", || {
            let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(kernel.label()),
                source: wgpu::ShaderSource::Wgsl(kernel.source().into()),
            });
            let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("kernel_pipeline_layout"),
                bind_group_layouts: &[&compute_layout],
                push_constant_ranges: &[],
            });
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("kernel_pipeline"),
                layout: Some(&layout),
                module: &module,
                entry_point: Some(kernel.entry_point()),
                compilation_options: Default::default(),
                cache: None,
            })
        })?;

        // Composite: output image (0), nearest sampler (1)
        let composite_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("composite_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("composite_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let composite_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("composite_bind_group"),
            layout: &composite_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&output_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let surface_format = context.surface_format();
        let composite_pipeline = scoped(device, wgpu::ErrorFilter::Validation, "composite pipeline", || {
            let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("composite_shader"),
                source: wgpu::ShaderSource::Wgsl(shaders::COMPOSITE_SHADER.into()),
            });
            let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("composite_pipeline_layout"),
                bind_group_layouts: &[&composite_layout],
                push_constant_ranges: &[],
            });
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("composite_pipeline"),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &module,
                    entry_point: Some("vs_fullscreen"),
                    compilation_options: Default::default(),
                    buffers: &[],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &module,
                    entry_point: Some("fs_composite"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: surface_format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: Default::default(),
                multiview: None,
                cache: None,
            })
        })?;

        tracing::info!(
            kernel = kernel.label(),
            objects = scene_buffer.count(),
            bytes = scene_buffer.size(),
            output = %OUTPUT_EXTENT,
            "GPU backend ready"
        );

        Ok(Self {
            context,
            _scene: scene_buffer,
            params_buffer,
            compute_pipeline,
            compute_bind_group,
            composite_pipeline,
            composite_bind_group,
            _output: output,
        })
    }

    pub fn resize(&mut self, window: Extent) {
        tracing::debug!(%window, "window resized");
        self.context.resize(window);
    }
}

impl FrameBackend for WgpuBackend {
    type Recording = WgpuRecording;
    type Target = WgpuTarget;

    fn begin_recording(&mut self) -> Result<WgpuRecording, FrameError> {
        if self.context.is_device_lost() {
            return Err(FrameError::ContextUnavailable("device lost".into()));
        }
        let encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });
        Ok(WgpuRecording { encoder })
    }

    fn acquire_target(
        &mut self,
        _recording: &mut WgpuRecording,
    ) -> Result<Option<WgpuTarget>, FrameError> {
        if self.context.window().is_empty() {
            return Ok(None);
        }
        match self.context.surface.get_current_texture() {
            Ok(texture) => {
                let view = texture.texture.create_view(&Default::default());
                Ok(Some(WgpuTarget { texture, view }))
            }
            Err(err @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                self.context.reconfigure();
                Err(FrameError::TargetUnavailable(err.to_string()))
            }
            Err(err) => Err(FrameError::TargetUnavailable(err.to_string())),
        }
    }

    fn target_extent(&self, target: &WgpuTarget) -> Extent {
        Extent::new(target.texture.texture.width(), target.texture.texture.height())
    }

    fn dispatch(&mut self, recording: &mut WgpuRecording, params: &FrameParameters, grid: DispatchGrid) {
        self.context
            .queue
            .write_buffer(&self.params_buffer, 0, params.as_bytes());

        let mut pass = recording
            .encoder
            .begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("kernel_pass"),
                timestamp_writes: None,
            });
        pass.set_pipeline(&self.compute_pipeline);
        pass.set_bind_group(0, &self.compute_bind_group, &[]);
        pass.dispatch_workgroups(grid.groups_x, grid.groups_y, 1);
    }

    fn composite(&mut self, recording: &mut WgpuRecording, target: &WgpuTarget, viewport: Viewport) {
        let [r, g, b, a] = CLEAR_COLOR;
        let mut pass = recording
            .encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("composite_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r.into(),
                            g: g.into(),
                            b: b.into(),
                            a: a.into(),
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                ..Default::default()
            });
        pass.set_viewport(
            viewport.x as f32,
            viewport.y as f32,
            viewport.width as f32,
            viewport.height as f32,
            0.0,
            1.0,
        );
        pass.set_pipeline(&self.composite_pipeline);
        pass.set_bind_group(0, &self.composite_bind_group, &[]);
        pass.draw(0..3, 0..1);
    }

    fn submit(&mut self, recording: WgpuRecording, target: Option<WgpuTarget>) {
        self.context
            .queue
            .submit(std::iter::once(recording.encoder.finish()));
        if let Some(target) = target {
            target.texture.present();
        }
    }

    fn cancel(&mut self, recording: WgpuRecording) {
        drop(recording);
    }
}
