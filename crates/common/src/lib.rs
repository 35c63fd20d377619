//! Shared constants and small value types for the lensing viewer.
//!
//! Every boundary constant of the system lives in [`constants`]. None of
//! them are runtime-configurable.

pub mod constants;
pub mod types;

pub use types::Extent;
