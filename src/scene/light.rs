use glam::Vec3;

use crate::options::LightingOptions;

/// A light in the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    /// Uniform light from every direction.
    Ambient {
        /// Linear RGB color.
        color: Vec3,
        /// Intensity multiplier.
        intensity: f32,
    },
    /// Parallel rays travelling from `position` toward `target`.
    Directional {
        /// Linear RGB color.
        color: Vec3,
        /// Intensity multiplier.
        intensity: f32,
        /// Where the light sits.
        position: Vec3,
        /// What it aims at.
        target: Vec3,
    },
}

impl Light {
    /// Unit vector pointing from the lit surface toward the light, for
    /// directional lights. Straight down lights fall back to +Y.
    #[must_use]
    pub fn direction_to_light(&self) -> Option<Vec3> {
        match *self {
            Self::Ambient { .. } => None,
            Self::Directional {
                position, target, ..
            } => Some((position - target).try_normalize().unwrap_or(Vec3::Y)),
        }
    }
}

/// The viewer's fixed two-light rig: one ambient, one directional.
#[must_use]
pub fn light_rig(options: &LightingOptions) -> [Light; 2] {
    [
        Light::Ambient {
            color: Vec3::from_array(options.ambient_color),
            intensity: options.ambient_intensity,
        },
        Light::Directional {
            color: Vec3::from_array(options.directional_color),
            intensity: options.directional_intensity,
            position: Vec3::from_array(options.directional_position),
            target: Vec3::from_array(options.directional_target),
        },
    ]
}
