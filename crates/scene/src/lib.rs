//! Scene Store: the fixed set of gravitating bodies and their GPU records.
//!
//! # Invariants
//! - Every object has a positive, finite radius and mass.
//! - Object count and order never change once a [`Scene`] exists. The index
//!   of an object is its identity in the kernel contract.
//! - [`GpuObject`] is 32 bytes with a fixed field order; the kernel reads
//!   the array as opaque bytes.

pub mod object;
pub mod scene;

pub use object::{GpuObject, SceneError, SceneObject};
pub use scene::{BLACK_HOLE_RADIUS, DiskBand, Scene, schwarzschild_radius};
