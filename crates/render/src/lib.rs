//! Frame orchestration: orbit camera, per-frame kernel parameters, and the
//! backend-agnostic driver that sequences dispatch, composite and submit.
//!
//! # Invariants
//! - Nothing here touches a GPU directly; backends implement [`FrameBackend`].
//! - The camera basis is orthonormal for every reachable state.
//! - Within a frame, dispatch precedes composite precedes submit.
//! - A failed frame is canceled, never partially submitted.

mod camera;
mod driver;
mod kernel;
mod letterbox;
mod params;
mod session;
mod software;

pub use camera::{CameraBasis, OrbitCamera, POLE_CLEARANCE};
pub use driver::{FrameBackend, FrameDriver, FrameError, FrameOutcome, FramePhase, FrameStats};
pub use kernel::{DispatchGrid, Invocation, PatternKernel, RenderKernel, RgbaImage};
pub use letterbox::{Viewport, letterbox};
pub use params::{FrameConstants, FrameParameters, LAYOUT_VERSION, build_frame_parameters};
pub use session::{LoopControl, Session};
pub use software::{Command, SoftwareBackend, SoftwareRecording, SoftwareTarget, SubmittedFrame};
