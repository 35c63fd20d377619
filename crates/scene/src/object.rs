use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::Serialize;

/// Errors from building scene objects.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error("radius must be positive and finite, got {0}")]
    InvalidRadius(f32),
    #[error("mass must be positive and finite, got {0}")]
    InvalidMass(f32),
    #[error("position must be finite, got {0:?}")]
    NonFinitePosition([f32; 3]),
    #[error("color channels must lie in [0, 1], got {0:?}")]
    InvalidColor([f32; 3]),
    #[error("object {index}: {source}")]
    Object {
        index: usize,
        #[source]
        source: Box<SceneError>,
    },
    #[error("scene has no objects")]
    Empty,
    #[error("central body index {index} out of range for {count} objects")]
    CentralOutOfRange { index: usize, count: usize },
    #[error("scene holds {0} objects, more than the kernel can address")]
    TooManyObjects(usize),
}

/// One gravitating, visible body. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SceneObject {
    position: Vec3,
    radius: f32,
    color: Vec3,
    mass: f32,
}

impl SceneObject {
    /// Build an object, rejecting degenerate or non-finite values.
    pub fn new(position: Vec3, radius: f32, color: Vec3, mass: f32) -> Result<Self, SceneError> {
        if !position.is_finite() {
            return Err(SceneError::NonFinitePosition(position.to_array()));
        }
        if !(radius.is_finite() && radius > 0.0) {
            return Err(SceneError::InvalidRadius(radius));
        }
        if !(mass.is_finite() && mass > 0.0) {
            return Err(SceneError::InvalidMass(mass));
        }
        if !color.to_array().iter().all(|c| (0.0..=1.0).contains(c)) {
            return Err(SceneError::InvalidColor(color.to_array()));
        }
        Ok(Self {
            position,
            radius,
            color,
            mass,
        })
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn color(&self) -> Vec3 {
        self.color
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }
}

/// GPU-side record for one [`SceneObject`].
///
/// Layout (32 bytes, matches a WGSL storage array element):
/// `position` @0, `radius` @12, `color` @16, `mass` @28.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct GpuObject {
    pub position: [f32; 3],
    pub radius: f32,
    pub color: [f32; 3],
    pub mass: f32,
}

impl From<&SceneObject> for GpuObject {
    fn from(obj: &SceneObject) -> Self {
        Self {
            position: obj.position.to_array(),
            radius: obj.radius,
            color: obj.color.to_array(),
            mass: obj.mass,
        }
    }
}
