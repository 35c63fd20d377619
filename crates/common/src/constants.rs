//! Compile-time constants exposed at the system boundary.

use crate::types::Extent;
use std::f32::consts::{FRAC_PI_2, FRAC_PI_3};

/// Width of the fixed-resolution image the kernel writes.
pub const OUTPUT_WIDTH: u32 = 960;
/// Height of the fixed-resolution image the kernel writes.
pub const OUTPUT_HEIGHT: u32 = 720;
pub const OUTPUT_EXTENT: Extent = Extent::new(OUTPUT_WIDTH, OUTPUT_HEIGHT);

/// Edge length of one square compute work-group, in threads.
pub const WORKGROUP_SIZE: u32 = 8;

/// Vertical field of view (60 degrees).
pub const FOV_Y: f32 = FRAC_PI_3;

/// Radians of yaw/pitch per pixel of pointer drag.
pub const PAN_SENSITIVITY: f32 = 0.002;
/// Meters of orbit distance per wheel line.
pub const ZOOM_SENSITIVITY: f32 = 25.0e9;
pub const INITIAL_DISTANCE: f32 = 1.0e11;
pub const MIN_DISTANCE: f32 = 1.0;
/// Largest pitch magnitude reachable by dragging. Keeps the view short of
/// the poles so the orbit never visibly flips.
pub const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.01;

pub const SPEED_OF_LIGHT: f32 = 299_792_458.0;
pub const GRAVITATIONAL_CONSTANT: f32 = 6.674_30e-11;
pub const SOLAR_MASS: f32 = 1.988_92e30;
pub const BLACK_HOLE_MASS: f32 = 8.54e36;

/// Accretion band inner edge, in Schwarzschild radii.
pub const DISK_INNER_FACTOR: f32 = 2.2;
/// Accretion band outer edge, in Schwarzschild radii.
pub const DISK_OUTER_FACTOR: f32 = 5.2;

/// Neutral color for letterbox bars (linear RGBA).
pub const CLEAR_COLOR: [f32; 4] = [0.04, 0.04, 0.04, 1.0];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_is_four_by_three() {
        assert_eq!(OUTPUT_WIDTH * 3, OUTPUT_HEIGHT * 4);
    }

    #[test]
    fn pitch_limit_is_inside_the_poles() {
        assert!(PITCH_LIMIT < FRAC_PI_2);
        assert!(PITCH_LIMIT > 0.0);
    }

    #[test]
    fn fov_is_sixty_degrees() {
        assert!((FOV_Y.to_degrees() - 60.0).abs() < 1e-4);
    }
}
