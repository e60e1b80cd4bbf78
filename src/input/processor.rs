//! Converts raw platform events into camera commands.
//!
//! The `InputProcessor` owns all transient pointer state (last cursor
//! position, which buttons are held, shift) and is the only thing between
//! host events and the orbit rig.

use glam::Vec2;

use super::event::{InputEvent, MouseButton};

/// Camera motion requested by user input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraCommand {
    /// Orbit around the target by a pointer drag.
    Rotate {
        /// Drag in physical pixels.
        delta: Vec2,
    },
    /// Slide the target in the view plane by a pointer drag.
    Pan {
        /// Drag in physical pixels.
        delta: Vec2,
    },
    /// Dolly toward (positive) or away from the target.
    Zoom {
        /// Scroll amount in wheel notches.
        delta: f32,
    },
}

/// Gesture currently in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Drag {
    None,
    Rotate,
    Pan,
}

/// Converts [`InputEvent`]s into [`CameraCommand`]s.
///
/// Left drag orbits, right or middle drag pans, shift + left drag pans,
/// scroll dollies.
#[derive(Debug)]
pub struct InputProcessor {
    last_cursor: Option<Vec2>,
    drag: Drag,
    shift_pressed: bool,
}

impl InputProcessor {
    /// Processor with no button held.
    #[must_use]
    pub fn new() -> Self {
        Self {
            last_cursor: None,
            drag: Drag::None,
            shift_pressed: false,
        }
    }

    /// Whether a drag gesture is in progress.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag != Drag::None
    }

    /// Process a raw input event and return zero or one commands.
    pub fn handle_event(&mut self, event: InputEvent) -> Option<CameraCommand> {
        match event {
            InputEvent::CursorMoved { x, y } => self.handle_cursor_moved(Vec2::new(x, y)),
            InputEvent::MouseButton { button, pressed } => {
                self.handle_mouse_button(button, pressed);
                None
            }
            InputEvent::Scroll { delta } => Some(CameraCommand::Zoom { delta }),
            InputEvent::ModifiersChanged { shift } => {
                self.shift_pressed = shift;
                None
            }
        }
    }

    fn handle_cursor_moved(&mut self, pos: Vec2) -> Option<CameraCommand> {
        let delta = self.last_cursor.map(|last| pos - last);
        self.last_cursor = Some(pos);
        let delta = delta.filter(|d| *d != Vec2::ZERO)?;

        match self.drag {
            Drag::None => None,
            Drag::Rotate => Some(CameraCommand::Rotate { delta }),
            Drag::Pan => Some(CameraCommand::Pan { delta }),
        }
    }

    fn handle_mouse_button(&mut self, button: MouseButton, pressed: bool) {
        if !pressed {
            self.drag = Drag::None;
            return;
        }
        self.drag = match button {
            MouseButton::Left if self.shift_pressed => Drag::Pan,
            MouseButton::Left => Drag::Rotate,
            MouseButton::Right | MouseButton::Middle => Drag::Pan,
        };
    }
}

impl Default for InputProcessor {
    fn default() -> Self {
        Self::new()
    }
}
