use glam::Vec3;
use lensing_common::constants::{
    INITIAL_DISTANCE, MIN_DISTANCE, PAN_SENSITIVITY, PITCH_LIMIT, ZOOM_SENSITIVITY,
};
use lensing_input::InputEvent;
use std::f32::consts::FRAC_PI_2;

/// Numerical margin from the poles used when building the basis. Unrelated
/// to [`PITCH_LIMIT`], which is chosen for how dragging feels.
pub const POLE_CLEARANCE: f32 = 1.0e-4;

/// Largest pitch a drag can reach: one ulp inside [`PITCH_LIMIT`], so the
/// band stays open.
const PITCH_MAX: f32 = f32::from_bits(PITCH_LIMIT.to_bits() - 1);

/// Orthonormal camera frame. `right × up = -forward`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBasis {
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,
}

/// Viewer orbiting the origin, parameterized by yaw, pitch and distance.
///
/// Only [`InputEvent`]s mutate it. It never touches GPU state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    yaw: f32,
    pitch: f32,
    distance: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            distance: INITIAL_DISTANCE,
        }
    }
}

impl OrbitCamera {
    /// Build a camera, clamping pitch and flooring distance into range.
    /// Non-finite inputs fall back to the default state's value.
    pub fn new(yaw: f32, pitch: f32, distance: f32) -> Self {
        let d = Self::default();
        Self {
            yaw: if yaw.is_finite() { yaw } else { d.yaw },
            pitch: if pitch.is_finite() {
                pitch.clamp(-PITCH_MAX, PITCH_MAX)
            } else {
                d.pitch
            },
            distance: if distance.is_finite() {
                distance.max(MIN_DISTANCE)
            } else {
                d.distance
            },
        }
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Apply one input event. `Quit` leaves the state untouched.
    pub fn apply(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::Wheel { delta } => self.zoom(delta),
            InputEvent::Drag { dx, dy } => self.rotate(dx, dy),
            InputEvent::Quit => {}
        }
    }

    /// Move toward the origin by `delta` wheel lines, never closer than
    /// [`MIN_DISTANCE`].
    pub fn zoom(&mut self, delta: f32) {
        if !delta.is_finite() {
            tracing::debug!(delta, "ignoring non-finite zoom");
            return;
        }
        self.distance = (self.distance - delta * ZOOM_SENSITIVITY).clamp(MIN_DISTANCE, f32::MAX);
    }

    /// Orbit by a pointer drag of `(dx, dy)` pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        if !(dx.is_finite() && dy.is_finite()) {
            tracing::debug!(dx, dy, "ignoring non-finite drag");
            return;
        }
        self.yaw += dx * PAN_SENSITIVITY;
        self.pitch = (self.pitch + dy * PAN_SENSITIVITY).clamp(-PITCH_MAX, PITCH_MAX);
    }

    /// Unit view direction: yaw turns about +Y, pitch elevates.
    pub fn forward(&self) -> Vec3 {
        let max = FRAC_PI_2 - POLE_CLEARANCE;
        let pitch = self.pitch.clamp(-max, max);
        Vec3::new(
            pitch.cos() * self.yaw.cos(),
            pitch.sin(),
            pitch.cos() * self.yaw.sin(),
        )
        .normalize()
    }

    /// Camera position: on the orbit sphere, looking at the origin.
    pub fn position(&self) -> Vec3 {
        -self.forward() * self.distance
    }

    /// Orthonormal basis. `right` comes from `forward × Y` and `up` from
    /// `right × forward`, so the frame stays orthonormal for any pitch the
    /// pole guard allows.
    pub fn basis(&self) -> CameraBasis {
        let forward = self.forward();
        let right = forward.cross(Vec3::Y).normalize();
        let up = right.cross(forward).normalize();
        CameraBasis { forward, right, up }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn assert_orthonormal(b: &CameraBasis) {
        assert!((b.forward.length() - 1.0).abs() < EPS);
        assert!((b.right.length() - 1.0).abs() < EPS);
        assert!((b.up.length() - 1.0).abs() < EPS);
        assert!(b.forward.dot(b.right).abs() < EPS);
        assert!(b.forward.dot(b.up).abs() < EPS);
        assert!(b.right.dot(b.up).abs() < EPS);
        // right-handed: right × up points back along -forward
        assert!((b.right.cross(b.up) + b.forward).length() < 1e-4);
    }

    #[test]
    fn default_state() {
        let cam = OrbitCamera::default();
        assert_eq!(cam.yaw(), 0.0);
        assert_eq!(cam.pitch(), 0.0);
        assert_eq!(cam.distance(), 1.0e11);
        assert_eq!(cam.forward(), Vec3::X);
    }

    #[test]
    fn pitch_stays_strictly_inside_poles() {
        let mut cam = OrbitCamera::default();
        for _ in 0..10_000 {
            cam.apply(&InputEvent::Drag { dx: 0.0, dy: 37.0 });
            assert!(cam.pitch() < FRAC_PI_2);
            assert!(cam.pitch() < PITCH_LIMIT);
        }
        for step in [1.0e6, -3.0, -1.0e9, 250.0, -250.0] {
            cam.apply(&InputEvent::Drag { dx: 0.0, dy: step });
            assert!(cam.pitch() > -FRAC_PI_2 && cam.pitch() < FRAC_PI_2);
        }
        cam.apply(&InputEvent::Drag { dx: 0.0, dy: -1.0e9 });
        assert!(cam.pitch() > -PITCH_LIMIT);
        assert_eq!(cam.pitch(), -PITCH_MAX);
    }

    #[test]
    fn basis_is_orthonormal_across_the_band() {
        let steps = 24;
        for i in 0..=steps {
            let pitch = -PITCH_LIMIT + 2.0 * PITCH_LIMIT * i as f32 / steps as f32;
            for j in 0..steps {
                let yaw = -10.0 + 20.0 * j as f32 / steps as f32;
                assert_orthonormal(&OrbitCamera::new(yaw, pitch, 5.0).basis());
            }
        }
    }

    #[test]
    fn basis_survives_pitch_at_the_pole() {
        // Bypass the drag clamp to exercise the numerical pole guard.
        let cam = OrbitCamera {
            yaw: 0.3,
            pitch: FRAC_PI_2,
            distance: 10.0,
        };
        let b = cam.basis();
        assert!(b.right.is_finite());
        assert!(b.right.length() > 0.5);
    }

    #[test]
    fn wheel_floors_distance_at_one() {
        let mut cam = OrbitCamera::default();
        cam.apply(&InputEvent::Wheel { delta: 1.0e6 });
        assert_eq!(cam.distance(), 1.0);
        for _ in 0..5 {
            cam.apply(&InputEvent::Wheel { delta: 3.0 });
            assert_eq!(cam.distance(), 1.0);
        }
        cam.apply(&InputEvent::Wheel { delta: f32::MAX });
        assert_eq!(cam.distance(), 1.0);
    }

    #[test]
    fn wheel_moves_by_zoom_sensitivity() {
        let mut cam = OrbitCamera::default();
        cam.apply(&InputEvent::Wheel { delta: 1.0 });
        assert_eq!(cam.distance(), 1.0e11 - 25.0e9);
        cam.apply(&InputEvent::Wheel { delta: -2.0 });
        assert_eq!(cam.distance(), 1.0e11 - 25.0e9 + 50.0e9);
    }

    #[test]
    fn non_finite_input_is_ignored() {
        let mut cam = OrbitCamera::default();
        let before = cam;
        cam.apply(&InputEvent::Wheel { delta: f32::NAN });
        cam.apply(&InputEvent::Drag {
            dx: f32::INFINITY,
            dy: 0.0,
        });
        cam.apply(&InputEvent::Quit);
        assert_eq!(cam, before);
    }

    #[test]
    fn nan_wheel_keeps_distance() {
        let mut cam = OrbitCamera::default();
        cam.apply(&InputEvent::Wheel { delta: f32::NAN });
        assert_eq!(cam.distance(), INITIAL_DISTANCE);
        cam.apply(&InputEvent::Wheel {
            delta: f32::NEG_INFINITY,
        });
        assert_eq!(cam.distance(), INITIAL_DISTANCE);
    }

    #[test]
    fn overflowing_zoom_stays_finite() {
        let mut cam = OrbitCamera::default();
        cam.apply(&InputEvent::Wheel { delta: -f32::MAX });
        assert_eq!(cam.distance(), f32::MAX);
        cam.apply(&InputEvent::Wheel { delta: f32::MAX });
        assert_eq!(cam.distance(), MIN_DISTANCE);
    }

    #[test]
    fn drag_rotates_in_horizontal_plane() {
        let mut cam = OrbitCamera::default();
        cam.apply(&InputEvent::Drag { dx: 100.0, dy: 0.0 });
        assert!((cam.yaw() - 0.2).abs() < 1e-6);
        assert_eq!(cam.pitch(), 0.0);
        let f = cam.forward();
        assert_eq!(f.y, 0.0);
        assert!((f.x - 0.2_f32.cos()).abs() < 1e-6);
        assert!((f.z - 0.2_f32.sin()).abs() < 1e-6);
    }

    #[test]
    fn position_orbits_origin() {
        let cam = OrbitCamera::new(1.0, 0.4, 250.0);
        assert!((cam.position().length() - 250.0).abs() < 1e-3);
        assert!(cam.position().normalize().dot(cam.forward()) < -0.999);
    }

    #[test]
    fn new_clamps_out_of_range_state() {
        let cam = OrbitCamera::new(0.0, 10.0, -4.0);
        assert_eq!(cam.pitch(), PITCH_MAX);
        assert!(cam.pitch() < PITCH_LIMIT);
        assert_eq!(cam.distance(), 1.0);
    }
}
