//! Input: the three events the viewer recognizes, and the per-iteration
//! queue that holds them until the loop drains them.
//!
//! # Invariants
//! - Events are delivered in arrival order.
//! - Pointer motion only becomes a drag while the primary button is held.

pub mod event;
pub mod queue;

pub use event::{InputEvent, PIXELS_PER_LINE, PointerState};
pub use queue::InputQueue;
