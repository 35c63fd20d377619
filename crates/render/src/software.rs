//! CPU implementation of [`FrameBackend`].
//!
//! Commands are recorded and only executed on submit, so a canceled frame
//! leaves no trace in the output image or the framebuffer. Submitted streams
//! are kept for inspection until taken. Used by tests and the headless CLI.

use crate::driver::{FrameBackend, FrameError};
use crate::kernel::{DispatchGrid, RenderKernel, RgbaImage};
use crate::letterbox::Viewport;
use crate::params::FrameParameters;
use lensing_common::Extent;
use lensing_common::constants::{CLEAR_COLOR, OUTPUT_EXTENT};
use lensing_scene::{GpuObject, Scene};

/// A recorded command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Dispatch {
        params: FrameParameters,
        grid: DispatchGrid,
    },
    Composite {
        target: Extent,
        viewport: Viewport,
    },
}

#[derive(Debug, Default)]
pub struct SoftwareRecording {
    commands: Vec<Command>,
}

/// Presentation target handed out for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoftwareTarget {
    extent: Extent,
}

/// A command stream that reached `submit`.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmittedFrame {
    pub commands: Vec<Command>,
    pub presented: bool,
}

impl SubmittedFrame {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn dispatches(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::Dispatch { .. }))
            .count()
    }

    pub fn composites(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::Composite { .. }))
            .count()
    }
}

/// Software backend running an injected [`RenderKernel`].
pub struct SoftwareBackend<K> {
    kernel: K,
    objects: Vec<GpuObject>,
    image: RgbaImage,
    window: Extent,
    framebuffer: RgbaImage,
    submitted: Vec<SubmittedFrame>,
    canceled: usize,
    fail_next_recording: Option<String>,
    fail_next_target: Option<String>,
}

impl<K: RenderKernel> SoftwareBackend<K> {
    pub fn new(kernel: K, scene: &Scene, window: Extent) -> Self {
        tracing::debug!(
            kernel = kernel.name(),
            objects = scene.len(),
            %window,
            "software backend created"
        );
        Self {
            kernel,
            objects: scene.gpu_records(),
            image: RgbaImage::new(OUTPUT_EXTENT),
            window,
            framebuffer: RgbaImage::new(window),
            submitted: Vec::new(),
            canceled: 0,
            fail_next_recording: None,
            fail_next_target: None,
        }
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Change the window size used for the next acquired target.
    pub fn resize(&mut self, window: Extent) {
        self.window = window;
    }

    /// Output image as last written by the kernel.
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Window contents as of the last presented frame.
    pub fn framebuffer(&self) -> &RgbaImage {
        &self.framebuffer
    }

    /// Streams submitted since construction or the last [`take_submitted`].
    ///
    /// [`take_submitted`]: Self::take_submitted
    pub fn submitted(&self) -> &[SubmittedFrame] {
        &self.submitted
    }

    /// Hand over the retained streams and start a fresh log. Long-running
    /// callers drain this to keep memory flat.
    pub fn take_submitted(&mut self) -> Vec<SubmittedFrame> {
        std::mem::take(&mut self.submitted)
    }

    pub fn canceled(&self) -> usize {
        self.canceled
    }

    pub fn fail_next_recording(&mut self, reason: impl Into<String>) {
        self.fail_next_recording = Some(reason.into());
    }

    pub fn fail_next_target(&mut self, reason: impl Into<String>) {
        self.fail_next_target = Some(reason.into());
    }

    fn execute(&mut self, commands: &[Command]) {
        for command in commands {
            match command {
                Command::Dispatch { params, grid } => {
                    self.kernel
                        .dispatch(params, &self.objects, *grid, &mut self.image);
                }
                Command::Composite { target, viewport } => {
                    composite_nearest(&self.image, &mut self.framebuffer, *target, *viewport);
                }
            }
        }
    }
}

/// Clear `dst` to the neutral color, then copy `src` into `viewport` with
/// nearest-neighbour sampling at pixel centers, as the GPU sampler does.
fn composite_nearest(src: &RgbaImage, dst: &mut RgbaImage, target: Extent, viewport: Viewport) {
    let clear = CLEAR_COLOR.map(|c| (c * 255.0).round() as u8);
    if dst.extent() != target {
        *dst = RgbaImage::filled(target, clear);
    } else {
        dst.fill(clear);
    }

    let image = src.extent();
    // Source texel under the destination pixel's center.
    let nearest = |v: u32, src_len: u32, dst_len: u32| {
        ((2 * v as u64 + 1) * src_len as u64 / (2 * dst_len as u64)) as u32
    };
    for vy in 0..viewport.height {
        let sy = nearest(vy, image.height, viewport.height);
        for vx in 0..viewport.width {
            let sx = nearest(vx, image.width, viewport.width);
            if let Some(px) = src.get(sx, sy) {
                dst.put(viewport.x + vx, viewport.y + vy, px);
            }
        }
    }
}

impl<K: RenderKernel> FrameBackend for SoftwareBackend<K> {
    type Recording = SoftwareRecording;
    type Target = SoftwareTarget;

    fn begin_recording(&mut self) -> Result<SoftwareRecording, FrameError> {
        match self.fail_next_recording.take() {
            Some(reason) => Err(FrameError::ContextUnavailable(reason)),
            None => Ok(SoftwareRecording::default()),
        }
    }

    fn acquire_target(
        &mut self,
        _recording: &mut SoftwareRecording,
    ) -> Result<Option<SoftwareTarget>, FrameError> {
        if let Some(reason) = self.fail_next_target.take() {
            return Err(FrameError::TargetUnavailable(reason));
        }
        if self.window.is_empty() {
            return Ok(None);
        }
        Ok(Some(SoftwareTarget {
            extent: self.window,
        }))
    }

    fn target_extent(&self, target: &SoftwareTarget) -> Extent {
        target.extent
    }

    fn dispatch(
        &mut self,
        recording: &mut SoftwareRecording,
        params: &FrameParameters,
        grid: DispatchGrid,
    ) {
        recording.commands.push(Command::Dispatch {
            params: *params,
            grid,
        });
    }

    fn composite(
        &mut self,
        recording: &mut SoftwareRecording,
        target: &SoftwareTarget,
        viewport: Viewport,
    ) {
        recording.commands.push(Command::Composite {
            target: target.extent,
            viewport,
        });
    }

    fn submit(&mut self, recording: SoftwareRecording, target: Option<SoftwareTarget>) {
        self.execute(&recording.commands);
        self.submitted.push(SubmittedFrame {
            commands: recording.commands,
            presented: target.is_some(),
        });
    }

    fn cancel(&mut self, recording: SoftwareRecording) {
        tracing::trace!(commands = recording.commands.len(), "recording canceled");
        self.canceled += 1;
    }
}
