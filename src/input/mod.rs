//! Input handling: event types, key actions, and the processor that turns
//! raw host events into camera commands.

/// Platform-agnostic input events.
pub mod event;
/// Key-bindable viewer actions.
pub mod keyboard;
/// Converts raw events into camera commands.
pub mod processor;

pub use event::{InputEvent, MouseButton};
pub use keyboard::KeyAction;
pub use processor::{CameraCommand, InputProcessor};
