/// Pixel scroll distance treated as one wheel line.
pub const PIXELS_PER_LINE: f32 = 120.0;

/// An input event the viewer reacts to. Anything else is dropped at the
/// windowing boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Vertical wheel movement in lines. Positive scrolls away from the user.
    Wheel { delta: f32 },
    /// Pointer motion while the primary button is held, in pixels.
    Drag { dx: f32, dy: f32 },
    /// The user asked to close the viewer.
    Quit,
}

impl InputEvent {
    /// Wheel event from a pixel-precise scroll delta.
    pub fn wheel_pixels(dy: f32) -> Self {
        Self::Wheel {
            delta: dy / PIXELS_PER_LINE,
        }
    }
}

/// Tracks the primary button so raw pointer motion can be turned into drags.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerState {
    primary_held: bool,
}

impl PointerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_primary(&mut self, pressed: bool) {
        if self.primary_held != pressed {
            tracing::trace!(pressed, "primary button");
        }
        self.primary_held = pressed;
    }

    /// The window lost focus or the cursor left it. A release delivered
    /// elsewhere would never reach us, so the drag ends here.
    pub fn release(&mut self) {
        self.set_primary(false);
    }

    /// Drag event for a relative motion, or `None` when the button is up.
    pub fn motion(&self, dx: f32, dy: f32) -> Option<InputEvent> {
        self.primary_held.then_some(InputEvent::Drag { dx, dy })
    }
}
