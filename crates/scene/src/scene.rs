use crate::object::{GpuObject, SceneError, SceneObject};
use glam::Vec3;
use lensing_common::constants::{
    BLACK_HOLE_MASS, DISK_INNER_FACTOR, DISK_OUTER_FACTOR, GRAVITATIONAL_CONSTANT, SOLAR_MASS,
    SPEED_OF_LIGHT,
};
use serde::Serialize;

/// Schwarzschild radius `2GM / c^2` of a mass in kilograms, in meters.
///
/// Evaluated in `f32` so the compile-time constant and any runtime
/// re-derivation agree bit for bit.
pub const fn schwarzschild_radius(mass: f32) -> f32 {
    2.0 * GRAVITATIONAL_CONSTANT * mass / (SPEED_OF_LIGHT * SPEED_OF_LIGHT)
}

/// Radius of the central body.
pub const BLACK_HOLE_RADIUS: f32 = schwarzschild_radius(BLACK_HOLE_MASS);

const MARKER_RADIUS: f32 = 4.0e10;
const MARKER_ORBIT: f32 = 4.0e11;

/// Annulus around the central body that the kernel shades as a disk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DiskBand {
    pub inner: f32,
    pub outer: f32,
}

impl DiskBand {
    pub fn from_schwarzschild_radius(rs: f32) -> Self {
        Self {
            inner: rs * DISK_INNER_FACTOR,
            outer: rs * DISK_OUTER_FACTOR,
        }
    }
}

/// The fixed scene. Object order is the kernel-visible identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    objects: Vec<SceneObject>,
    central: usize,
}

impl Scene {
    /// Build the three fixed bodies: two luminous markers and the massive
    /// central body sized by its Schwarzschild radius.
    pub fn initialize() -> Result<Self, SceneError> {
        let specs = [
            (
                Vec3::new(MARKER_ORBIT, 0.0, 0.0),
                MARKER_RADIUS,
                Vec3::new(1.0, 1.0, 0.0),
                SOLAR_MASS,
            ),
            (
                Vec3::new(0.0, 0.0, MARKER_ORBIT),
                MARKER_RADIUS,
                Vec3::new(1.0, 0.0, 0.0),
                SOLAR_MASS,
            ),
            (Vec3::ZERO, BLACK_HOLE_RADIUS, Vec3::ZERO, BLACK_HOLE_MASS),
        ];

        let objects = specs
            .into_iter()
            .enumerate()
            .map(|(index, (position, radius, color, mass))| {
                SceneObject::new(position, radius, color, mass).map_err(|e| SceneError::Object {
                    index,
                    source: Box::new(e),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let scene = Self::from_objects(objects, 2)?;
        tracing::info!("scene initialized: {scene}");
        Ok(scene)
    }

    /// Build a scene from already-validated objects.
    pub fn from_objects(objects: Vec<SceneObject>, central: usize) -> Result<Self, SceneError> {
        if objects.is_empty() {
            return Err(SceneError::Empty);
        }
        if u32::try_from(objects.len()).is_err() {
            return Err(SceneError::TooManyObjects(objects.len()));
        }
        if central >= objects.len() {
            return Err(SceneError::CentralOutOfRange {
                index: central,
                count: objects.len(),
            });
        }
        Ok(Self { objects, central })
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Object count as the kernel sees it.
    pub fn object_count(&self) -> u32 {
        // Bounded by `from_objects`.
        self.objects.len() as u32
    }

    pub fn central_body(&self) -> &SceneObject {
        &self.objects[self.central]
    }

    pub fn disk_band(&self) -> DiskBand {
        DiskBand::from_schwarzschild_radius(schwarzschild_radius(self.central_body().mass()))
    }

    /// Contiguous GPU records in insertion order.
    pub fn gpu_records(&self) -> Vec<GpuObject> {
        self.objects.iter().map(GpuObject::from).collect()
    }

    /// Exact byte size of the GPU object array.
    pub fn byte_size(&self) -> u64 {
        (self.objects.len() * std::mem::size_of::<GpuObject>()) as u64
    }
}

impl std::fmt::Display for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let band = self.disk_band();
        write!(
            f,
            "{} objects, central mass {:.3e} kg, r_s {:.4e} m, disk {:.3e}..{:.3e} m",
            self.len(),
            self.central_body().mass(),
            self.central_body().radius(),
            band.inner,
            band.outer
        )
    }
}
