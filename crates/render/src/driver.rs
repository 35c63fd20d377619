//! Render Pipeline Driver: sequences one frame against a [`FrameBackend`].
//!
//! # Frame state machine
//! `Idle → ContextAcquired → {TargetAcquired | TargetUnavailable | TargetEmpty}
//! → ComputeDispatched → Composited → Submitted → Idle`.
//!
//! Any failure returns to `Idle` after releasing what the frame acquired. A
//! failed frame is never retried within the same iteration.

use crate::kernel::DispatchGrid;
use crate::letterbox::{Viewport, letterbox};
use crate::params::FrameParameters;
use lensing_common::Extent;
use lensing_common::constants::{OUTPUT_EXTENT, WORKGROUP_SIZE};

/// Per-frame failures. None of them are fatal to the process.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("command recording unavailable: {0}")]
    ContextUnavailable(String),
    #[error("presentation target unavailable: {0}")]
    TargetUnavailable(String),
}

/// The device and swapchain services the driver sequences.
///
/// `Recording` is a command stream under construction. `Target` is the
/// presentation image for this frame. Dropping a recording without
/// `submit` or `cancel` is a backend bug.
pub trait FrameBackend {
    type Recording;
    type Target;

    /// Acquire a command-recording context for the current timeline slot.
    fn begin_recording(&mut self) -> Result<Self::Recording, FrameError>;

    /// Acquire a presentation target sized to the window. `Ok(None)` means
    /// the window currently has no area. May block on swapchain back-pressure.
    fn acquire_target(
        &mut self,
        recording: &mut Self::Recording,
    ) -> Result<Option<Self::Target>, FrameError>;

    fn target_extent(&self, target: &Self::Target) -> Extent;

    /// Record the kernel dispatch over the fixed-resolution output image.
    fn dispatch(
        &mut self,
        recording: &mut Self::Recording,
        params: &FrameParameters,
        grid: DispatchGrid,
    );

    /// Record the letterboxed copy of the output image into `target`.
    fn composite(
        &mut self,
        recording: &mut Self::Recording,
        target: &Self::Target,
        viewport: Viewport,
    );

    /// Submit without waiting for completion, presenting `target` if any.
    fn submit(&mut self, recording: Self::Recording, target: Option<Self::Target>);

    /// Discard a recording without submitting anything.
    fn cancel(&mut self, recording: Self::Recording);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    Idle,
    ContextAcquired,
    TargetAcquired,
    TargetUnavailable,
    TargetEmpty,
    ComputeDispatched,
    Composited,
    Submitted,
}

/// What happened to one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    Presented { viewport: Viewport },
    /// Zero-area target: an empty command stream was submitted.
    SkippedEmptyTarget,
    /// The frame was dropped; anything recorded was canceled.
    Abandoned(FrameError),
}

/// Running outcome counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frames: u64,
    pub presented: u64,
    pub skipped: u64,
    pub abandoned: u64,
}

impl std::fmt::Display for FrameStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "frames={} presented={} skipped={} abandoned={}",
            self.frames, self.presented, self.skipped, self.abandoned
        )
    }
}

/// Drives frames through the state machine.
#[derive(Debug)]
pub struct FrameDriver {
    image: Extent,
    grid: DispatchGrid,
    phase: FramePhase,
    path: Vec<FramePhase>,
    stats: FrameStats,
}

impl Default for FrameDriver {
    fn default() -> Self {
        Self::new(OUTPUT_EXTENT, WORKGROUP_SIZE)
    }
}

impl FrameDriver {
    pub fn new(image: Extent, workgroup_size: u32) -> Self {
        Self {
            image,
            grid: DispatchGrid::covering(image, workgroup_size),
            phase: FramePhase::Idle,
            path: Vec::with_capacity(8),
            stats: FrameStats::default(),
        }
    }

    pub fn image_extent(&self) -> Extent {
        self.image
    }

    pub fn grid(&self) -> DispatchGrid {
        self.grid
    }

    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    /// Phases visited by the most recent frame, starting and ending at `Idle`.
    pub fn last_path(&self) -> &[FramePhase] {
        &self.path
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Run one frame. Never blocks on GPU completion.
    pub fn render_frame<B: FrameBackend>(
        &mut self,
        backend: &mut B,
        params: &FrameParameters,
    ) -> FrameOutcome {
        let _span = tracing::trace_span!("render_frame", frame = self.stats.frames).entered();
        self.path.clear();
        self.enter(FramePhase::Idle);

        let outcome = self.run(backend, params);

        self.enter(FramePhase::Idle);
        self.stats.frames += 1;
        match &outcome {
            FrameOutcome::Presented { .. } => self.stats.presented += 1,
            FrameOutcome::SkippedEmptyTarget => self.stats.skipped += 1,
            FrameOutcome::Abandoned(e) => {
                self.stats.abandoned += 1;
                tracing::warn!("frame {} abandoned: {e}", self.stats.frames);
            }
        }
        outcome
    }

    fn run<B: FrameBackend>(&mut self, backend: &mut B, params: &FrameParameters) -> FrameOutcome {
        let mut recording = match backend.begin_recording() {
            Ok(r) => r,
            Err(e) => return FrameOutcome::Abandoned(e),
        };
        self.enter(FramePhase::ContextAcquired);

        let target = match backend.acquire_target(&mut recording) {
            Ok(Some(t)) => t,
            Ok(None) => return self.submit_empty(backend, recording),
            Err(e) => {
                self.enter(FramePhase::TargetUnavailable);
                backend.cancel(recording);
                return FrameOutcome::Abandoned(e);
            }
        };

        let target_extent = backend.target_extent(&target);
        let Some(viewport) = letterbox(target_extent, self.image) else {
            drop(target);
            return self.submit_empty(backend, recording);
        };
        self.enter(FramePhase::TargetAcquired);

        backend.dispatch(&mut recording, params, self.grid);
        self.enter(FramePhase::ComputeDispatched);

        backend.composite(&mut recording, &target, viewport);
        self.enter(FramePhase::Composited);

        backend.submit(recording, Some(target));
        self.enter(FramePhase::Submitted);
        tracing::trace!(?target_extent, ?viewport, "frame submitted");

        FrameOutcome::Presented { viewport }
    }

    fn submit_empty<B: FrameBackend>(
        &mut self,
        backend: &mut B,
        recording: B::Recording,
    ) -> FrameOutcome {
        self.enter(FramePhase::TargetEmpty);
        backend.submit(recording, None);
        self.enter(FramePhase::Submitted);
        tracing::trace!("zero-area target, submitted empty stream");
        FrameOutcome::SkippedEmptyTarget
    }

    fn enter(&mut self, phase: FramePhase) {
        self.phase = phase;
        self.path.push(phase);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::Zeroable;

    /// Scripted backend that logs every call.
    #[derive(Default)]
    struct ScriptedBackend {
        fail_recording: bool,
        target: Option<Result<Option<Extent>, FrameError>>,
        calls: Vec<&'static str>,
        open_recordings: i32,
    }

    impl FrameBackend for ScriptedBackend {
        type Recording = ();
        type Target = Extent;

        fn begin_recording(&mut self) -> Result<(), FrameError> {
            self.calls.push("begin");
            if self.fail_recording {
                return Err(FrameError::ContextUnavailable("device lost".into()));
            }
            self.open_recordings += 1;
            Ok(())
        }

        fn acquire_target(&mut self, _: &mut ()) -> Result<Option<Extent>, FrameError> {
            self.calls.push("acquire");
            self.target
                .clone()
                .unwrap_or(Ok(Some(Extent::new(1920, 1080))))
        }

        fn target_extent(&self, target: &Extent) -> Extent {
            *target
        }

        fn dispatch(&mut self, _: &mut (), _: &FrameParameters, _: DispatchGrid) {
            self.calls.push("dispatch");
        }

        fn composite(&mut self, _: &mut (), _: &Extent, _: Viewport) {
            self.calls.push("composite");
        }

        fn submit(&mut self, _: (), _: Option<Extent>) {
            self.calls.push("submit");
            self.open_recordings -= 1;
        }

        fn cancel(&mut self, _: ()) {
            self.calls.push("cancel");
            self.open_recordings -= 1;
        }
    }

    fn params() -> FrameParameters {
        FrameParameters::zeroed()
    }

    #[test]
    fn full_frame_follows_every_phase() {
        let mut backend = ScriptedBackend::default();
        let mut driver = FrameDriver::default();
        let outcome = driver.render_frame(&mut backend, &params());

        assert_eq!(
            outcome,
            FrameOutcome::Presented {
                viewport: Viewport {
                    x: 240,
                    y: 0,
                    width: 1440,
                    height: 1080
                }
            }
        );
        assert_eq!(
            backend.calls,
            ["begin", "acquire", "dispatch", "composite", "submit"]
        );
        assert_eq!(
            driver.last_path(),
            [
                FramePhase::Idle,
                FramePhase::ContextAcquired,
                FramePhase::TargetAcquired,
                FramePhase::ComputeDispatched,
                FramePhase::Composited,
                FramePhase::Submitted,
                FramePhase::Idle,
            ]
        );
        assert_eq!(driver.phase(), FramePhase::Idle);
        assert_eq!(backend.open_recordings, 0);
    }

    #[test]
    fn empty_target_submits_without_work() {
        let mut backend = ScriptedBackend {
            target: Some(Ok(None)),
            ..Default::default()
        };
        let mut driver = FrameDriver::default();
        let outcome = driver.render_frame(&mut backend, &params());

        assert_eq!(outcome, FrameOutcome::SkippedEmptyTarget);
        assert_eq!(backend.calls, ["begin", "acquire", "submit"]);
        assert!(driver.last_path().contains(&FramePhase::TargetEmpty));
        assert_eq!(driver.stats().skipped, 1);
    }

    #[test]
    fn zero_sized_target_is_treated_as_empty() {
        let mut backend = ScriptedBackend {
            target: Some(Ok(Some(Extent::new(0, 600)))),
            ..Default::default()
        };
        let mut driver = FrameDriver::default();
        assert_eq!(
            driver.render_frame(&mut backend, &params()),
            FrameOutcome::SkippedEmptyTarget
        );
        assert_eq!(backend.calls, ["begin", "acquire", "submit"]);
    }

    #[test]
    fn target_failure_cancels_recording() {
        let err = FrameError::TargetUnavailable("timeout".into());
        let mut backend = ScriptedBackend {
            target: Some(Err(err.clone())),
            ..Default::default()
        };
        let mut driver = FrameDriver::default();
        let outcome = driver.render_frame(&mut backend, &params());

        assert_eq!(outcome, FrameOutcome::Abandoned(err));
        assert_eq!(backend.calls, ["begin", "acquire", "cancel"]);
        assert_eq!(backend.open_recordings, 0);
        assert!(driver.last_path().contains(&FramePhase::TargetUnavailable));
        assert_eq!(driver.phase(), FramePhase::Idle);
    }

    #[test]
    fn recording_failure_abandons_before_acquiring() {
        let mut backend = ScriptedBackend {
            fail_recording: true,
            ..Default::default()
        };
        let mut driver = FrameDriver::default();
        let outcome = driver.render_frame(&mut backend, &params());

        assert!(matches!(
            outcome,
            FrameOutcome::Abandoned(FrameError::ContextUnavailable(_))
        ));
        assert_eq!(backend.calls, ["begin"]);
        assert_eq!(driver.last_path(), [FramePhase::Idle, FramePhase::Idle]);
    }

    #[test]
    fn stats_count_each_outcome() {
        let mut driver = FrameDriver::default();
        driver.render_frame(&mut ScriptedBackend::default(), &params());
        driver.render_frame(
            &mut ScriptedBackend {
                target: Some(Ok(None)),
                ..Default::default()
            },
            &params(),
        );
        driver.render_frame(
            &mut ScriptedBackend {
                fail_recording: true,
                ..Default::default()
            },
            &params(),
        );
        assert_eq!(
            driver.stats(),
            FrameStats {
                frames: 3,
                presented: 1,
                skipped: 1,
                abandoned: 1
            }
        );
    }

    #[test]
    fn grid_covers_fixed_output() {
        let driver = FrameDriver::default();
        assert_eq!(driver.grid().threads(), (960, 720));
        assert_eq!(driver.image_extent(), OUTPUT_EXTENT);
    }
}
