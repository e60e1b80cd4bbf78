//! Camera system for single-model viewing.
//!
//! Provides a perspective camera, auto-framing of a bounding box, an
//! orbit rig for interactive rotate/pan/dolly, and frustum tests.

/// Camera controller tying the orbit rig to a camera, plus its GPU binding.
pub mod controller;
/// Core camera struct and GPU uniform types.
pub mod core;
/// Bounding-box framing.
pub mod framing;
/// View frustum extraction and containment tests.
pub mod frustum;
/// Spherical orbit rig.
pub mod orbit;

pub use self::controller::{CameraBinding, CameraController};
pub use self::core::{Camera, CameraUniform};
pub use self::framing::{frame_area, frame_box, FRAME_MARGIN};
pub use self::orbit::OrbitControls;
