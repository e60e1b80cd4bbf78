use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
/// Ambient + directional light rig.
pub struct LightingOptions {
    /// Ambient light color (linear RGB).
    pub ambient_color: [f32; 3],
    /// Ambient light intensity.
    pub ambient_intensity: f32,
    /// Directional light color (linear RGB).
    pub directional_color: [f32; 3],
    /// Directional light intensity.
    pub directional_intensity: f32,
    /// Directional light position; light travels from here toward
    /// `directional_target`.
    pub directional_position: [f32; 3],
    /// Point the directional light aims at.
    pub directional_target: [f32; 3],
}

impl Default for LightingOptions {
    fn default() -> Self {
        Self {
            ambient_color: [1.0, 1.0, 1.0],
            ambient_intensity: 0.8,
            directional_color: [1.0, 1.0, 1.0],
            directional_intensity: 2.5,
            directional_position: [0.0, 1.0, 0.0],
            directional_target: [0.0, 0.0, 0.0],
        }
    }
}
