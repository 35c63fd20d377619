use anyhow::Result;
use clap::Parser;
use lensing_common::Extent;
use lensing_common::constants::OUTPUT_EXTENT;
use lensing_input::{InputEvent, InputQueue, PointerState};
use lensing_render::{LoopControl, Session};
use lensing_render_wgpu::{GpuContext, ShaderKernel, WgpuBackend};
use lensing_scene::Scene;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "lensing-desktop", about = "Orbit a black hole and watch the light bend")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Render the diagnostic pattern instead of the lensing kernel
    #[arg(long)]
    stub_kernel: bool,
}

/// GPU-side state, created once the event loop has a window to offer.
struct Viewer {
    _window: Arc<Window>,
    backend: WgpuBackend,
}

struct LensingApp {
    scene: Scene,
    session: Session,
    kernel: ShaderKernel,
    queue: InputQueue,
    pointer: PointerState,
    viewer: Option<Viewer>,
    startup_error: Option<anyhow::Error>,
}

impl LensingApp {
    fn new(scene: Scene, kernel: ShaderKernel) -> Self {
        let session = Session::new(&scene);
        Self {
            scene,
            session,
            kernel,
            queue: InputQueue::new(),
            pointer: PointerState::new(),
            viewer: None,
            startup_error: None,
        }
    }

    fn open_viewer(&self, event_loop: &ActiveEventLoop) -> Result<Viewer> {
        let attrs = Window::default_attributes()
            .with_title("Lensing")
            .with_inner_size(PhysicalSize::new(OUTPUT_EXTENT.width, OUTPUT_EXTENT.height));
        let window = Arc::new(event_loop.create_window(attrs)?);
        let size = window.inner_size();

        let context = GpuContext::new(window.clone(), Extent::new(size.width, size.height))?;
        let backend = WgpuBackend::new(context, &self.scene, &self.kernel)?;
        Ok(Viewer {
            _window: window,
            backend,
        })
    }
}

impl ApplicationHandler for LensingApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.viewer.is_some() {
            return;
        }
        match self.open_viewer(event_loop) {
            Ok(viewer) => self.viewer = Some(viewer),
            Err(err) => {
                tracing::error!("startup failed: {err:#}");
                self.startup_error = Some(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let WindowEvent::Resized(size) = &event {
            if let Some(viewer) = &mut self.viewer {
                viewer.backend.resize(Extent::new(size.width, size.height));
            }
        }
        if let Some(input) = translate_window_event(&mut self.pointer, &event) {
            self.queue.push(input);
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if let Some(drag) = self.pointer.motion(delta.0 as f32, delta.1 as f32) {
                self.queue.push(drag);
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(viewer) = &mut self.viewer else {
            return;
        };
        if self.session.iterate(self.queue.drain(), &mut viewer.backend) == LoopControl::Exit {
            event_loop.exit();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        tracing::info!("lensing-desktop exiting ({})", self.session.stats());
    }
}

/// Map a window event onto the viewer's input, updating the button state
/// that gates raw motion. Motion itself arrives as a device event.
fn translate_window_event(pointer: &mut PointerState, event: &WindowEvent) -> Option<InputEvent> {
    match event {
        WindowEvent::CloseRequested => Some(InputEvent::Quit),
        WindowEvent::MouseInput {
            button: MouseButton::Left,
            state,
            ..
        } => {
            pointer.set_primary(*state == ElementState::Pressed);
            None
        }
        WindowEvent::Focused(false) | WindowEvent::CursorLeft { .. } => {
            pointer.release();
            None
        }
        WindowEvent::MouseWheel { delta, .. } => Some(match *delta {
            MouseScrollDelta::LineDelta(_, dy) => InputEvent::Wheel { delta: dy },
            MouseScrollDelta::PixelDelta(pos) => InputEvent::wheel_pixels(pos.y as f32),
        }),
        _ => None,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    tracing::info!("lensing-desktop starting");

    let scene = Scene::initialize()?;
    let kernel = if cli.stub_kernel {
        ShaderKernel::pattern()
    } else {
        ShaderKernel::geodesic()
    };

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = LensingApp::new(scene, kernel);
    event_loop.run_app(&mut app)?;

    match app.startup_error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
