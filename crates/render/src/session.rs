use crate::camera::OrbitCamera;
use crate::driver::{FrameBackend, FrameDriver, FrameOutcome, FrameStats};
use crate::params::{FrameConstants, FrameParameters};
use lensing_input::InputEvent;
use lensing_scene::Scene;

/// Whether the event loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Exit,
}

/// Application context owned by the event loop: camera, the constants
/// derived from the scene, and the frame driver.
#[derive(Debug)]
pub struct Session {
    camera: OrbitCamera,
    constants: FrameConstants,
    driver: FrameDriver,
    iterations: u64,
    last_outcome: Option<FrameOutcome>,
}

impl Session {
    pub fn new(scene: &Scene) -> Self {
        Self::with_camera(scene, OrbitCamera::default())
    }

    pub fn with_camera(scene: &Scene, camera: OrbitCamera) -> Self {
        Self {
            camera,
            constants: FrameConstants::new(scene),
            driver: FrameDriver::default(),
            iterations: 0,
            last_outcome: None,
        }
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn constants(&self) -> &FrameConstants {
        &self.constants
    }

    pub fn driver(&self) -> &FrameDriver {
        &self.driver
    }

    pub fn stats(&self) -> FrameStats {
        self.driver.stats()
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn last_outcome(&self) -> Option<&FrameOutcome> {
        self.last_outcome.as_ref()
    }

    /// Parameters for the camera's current state.
    pub fn frame_parameters(&self) -> FrameParameters {
        FrameParameters::build(&self.camera, &self.constants)
    }

    /// One loop iteration: apply every pending event in arrival order, then
    /// render exactly one frame. A `Quit` anywhere in the batch ends the loop
    /// without rendering.
    pub fn iterate<B: FrameBackend>(
        &mut self,
        events: impl IntoIterator<Item = InputEvent>,
        backend: &mut B,
    ) -> LoopControl {
        self.iterations += 1;
        let mut quit = false;
        let mut applied = 0usize;
        for event in events {
            if event == InputEvent::Quit {
                quit = true;
            }
            self.camera.apply(&event);
            applied += 1;
        }
        if applied > 0 {
            tracing::trace!(
                applied,
                yaw = self.camera.yaw(),
                pitch = self.camera.pitch(),
                distance = self.camera.distance(),
                "input applied"
            );
        }
        if quit {
            tracing::info!("quit requested after {} iterations ({})", self.iterations, self.stats());
            return LoopControl::Exit;
        }

        let params = self.frame_parameters();
        self.last_outcome = Some(self.driver.render_frame(backend, &params));
        LoopControl::Continue
    }
}
