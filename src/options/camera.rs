use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
/// Camera projection, start-up pose and orbit control parameters.
pub struct CameraOptions {
    /// Vertical field of view in degrees.
    pub fovy: f32,
    /// Near clipping plane before a model is framed.
    pub znear: f32,
    /// Far clipping plane before a model is framed.
    pub zfar: f32,
    /// Start-up eye position.
    pub position: [f32; 3],
    /// Start-up orbit target.
    pub target: [f32; 3],
    /// Rotation sensitivity multiplier.
    pub rotate_speed: f32,
    /// Pan sensitivity multiplier.
    pub pan_speed: f32,
    /// Dolly sensitivity multiplier.
    pub zoom_speed: f32,
    /// Closest orbit distance.
    pub min_distance: f32,
    /// Farthest orbit distance before a model is framed. Once framed, the
    /// limit becomes `max_distance_factor` times the model size.
    pub max_distance: f32,
    /// Orbit distance limit as a multiple of the framed model's size.
    pub max_distance_factor: f32,
    /// Screen-space margin applied to the model diagonal when framing.
    pub frame_margin: f32,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            fovy: 45.0,
            znear: 0.1,
            zfar: 100.0,
            position: [0.0, 10.0, 20.0],
            target: [0.0, 5.0, 0.0],
            rotate_speed: 1.0,
            pan_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            max_distance_factor: 10.0,
            frame_margin: crate::camera::FRAME_MARGIN,
        }
    }
}
