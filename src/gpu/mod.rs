//! GPU resource management.
//!
//! Device/surface initialization, growable buffers, the depth target and
//! the light rig uniform.

/// Growable GPU buffers.
pub mod dynamic_buffer;
/// Light rig uniform and bind group.
pub mod lighting;
/// wgpu device, surface, and queue initialization.
pub mod render_context;
/// Depth attachment.
pub mod texture;
