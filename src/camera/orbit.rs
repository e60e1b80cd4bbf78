//! Orbit controls: rotate, pan and dolly around a target point.
//!
//! The rig stores the camera offset from its target in spherical
//! coordinates (azimuth around +Y, polar angle from +Y). Input deltas are
//! in physical pixels and are scaled by the viewport height so a drag
//! across the full height is one full turn.

use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};

use super::core::Camera;
use crate::options::CameraOptions;

/// Keeps the polar angle off the poles, where the up vector degenerates.
const POLAR_EPSILON: f32 = 1e-6;

/// Per-notch dolly factor before `zoom_speed` scaling.
const DOLLY_BASE: f32 = 0.95;

/// Camera offset from the target.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Spherical {
    radius: f32,
    /// Azimuth around +Y, measured from +Z toward +X.
    theta: f32,
    /// Polar angle from +Y.
    phi: f32,
}

impl Spherical {
    fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius == 0.0 {
            return Self {
                radius: 0.0,
                theta: 0.0,
                phi: PI * 0.5,
            };
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    fn to_offset(self) -> Vec3 {
        let sin_phi = self.phi.sin();
        Vec3::new(
            self.radius * sin_phi * self.theta.sin(),
            self.radius * self.phi.cos(),
            self.radius * sin_phi * self.theta.cos(),
        )
    }
}

/// Interactive orbit rig driving a [`Camera`].
#[derive(Debug, Clone)]
pub struct OrbitControls {
    target: Vec3,
    spherical: Spherical,
    /// Closest the camera may dolly toward the target.
    pub min_distance: f32,
    /// Farthest the camera may dolly away from the target.
    pub max_distance: f32,
    /// Rotation sensitivity multiplier.
    pub rotate_speed: f32,
    /// Pan sensitivity multiplier.
    pub pan_speed: f32,
    /// Dolly sensitivity multiplier.
    pub zoom_speed: f32,
}

impl OrbitControls {
    /// Rig orbiting the camera's current target from its current position.
    #[must_use]
    pub fn new(camera: &Camera, options: &CameraOptions) -> Self {
        Self {
            target: camera.target,
            spherical: Spherical::from_offset(camera.eye - camera.target),
            min_distance: options.min_distance,
            max_distance: options.max_distance,
            rotate_speed: options.rotate_speed,
            pan_speed: options.pan_speed,
            zoom_speed: options.zoom_speed,
        }
    }

    /// Point the camera orbits around.
    #[must_use]
    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Current eye-to-target distance.
    #[must_use]
    pub fn distance(&self) -> f32 {
        self.spherical.radius
    }

    /// Move the orbit center without moving the camera; the camera is
    /// re-aimed on the next [`update`](Self::update).
    pub fn set_target(&mut self, target: Vec3, camera: &Camera) {
        self.target = target;
        self.spherical = Spherical::from_offset(camera.eye - target);
    }

    /// Re-read the camera position, e.g. after the camera was moved by
    /// something other than this rig.
    pub fn sync_from_camera(&mut self, camera: &Camera) {
        self.spherical = Spherical::from_offset(camera.eye - self.target);
    }

    /// Orbit by a pointer drag of `delta` pixels.
    pub fn rotate(&mut self, delta: Vec2, viewport_height: f32) {
        let height = viewport_height.max(1.0);
        self.spherical.theta -= TAU * delta.x / height * self.rotate_speed;
        self.spherical.phi -= TAU * delta.y / height * self.rotate_speed;
    }

    /// Slide target and camera together in the view plane so the point
    /// under the cursor follows a drag of `delta` pixels.
    pub fn pan(&mut self, delta: Vec2, viewport_height: f32, camera: &Camera) {
        let height = viewport_height.max(1.0);
        let half_height_world =
            self.spherical.radius * (camera.fovy * 0.5).to_radians().tan();
        let per_pixel = 2.0 * half_height_world / height * self.pan_speed;

        let forward = camera.forward();
        let right = forward.cross(camera.up).try_normalize().unwrap_or(Vec3::X);
        let up = right.cross(forward);

        self.target += right * (-delta.x * per_pixel) + up * (delta.y * per_pixel);
    }

    /// Dolly toward (`delta > 0`) or away from the target.
    pub fn dolly(&mut self, delta: f32) {
        let scale = DOLLY_BASE.powf(self.zoom_speed * delta.abs());
        if delta > 0.0 {
            self.spherical.radius *= scale;
        } else if delta < 0.0 {
            self.spherical.radius /= scale;
        }
    }

    /// Apply limits and write the result into `camera`.
    pub fn update(&mut self, camera: &mut Camera) {
        self.spherical.phi = self
            .spherical
            .phi
            .clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        self.spherical.theta = self.spherical.theta.rem_euclid(TAU);
        let max = self.max_distance.max(self.min_distance);
        self.spherical.radius = self.spherical.radius.clamp(self.min_distance, max);

        camera.eye = self.target + self.spherical.to_offset();
        camera.target = self.target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rig() -> (OrbitControls, Camera) {
        let camera = Camera::default();
        (OrbitControls::new(&camera, &CameraOptions::default()), camera)
    }

    #[test]
    fn update_without_input_keeps_camera() {
        let (mut controls, mut camera) = rig();
        let before = camera.eye;
        controls.update(&mut camera);
        assert!((camera.eye - before).length() < 1e-4);
        assert_eq!(camera.target, Vec3::new(0.0, 5.0, 0.0));
    }

    #[test]
    fn rotate_keeps_distance() {
        let (mut controls, mut camera) = rig();
        let distance = controls.distance();
        controls.rotate(Vec2::new(120.0, 35.0), 600.0);
        controls.update(&mut camera);
        assert!(((camera.eye - camera.target).length() - distance).abs() < 1e-4);
    }

    #[test]
    fn full_height_drag_is_full_turn() {
        let (mut controls, mut camera) = rig();
        let before = camera.eye;
        controls.rotate(Vec2::new(600.0, 0.0), 600.0);
        controls.update(&mut camera);
        assert!((camera.eye - before).length() < 1e-3);
    }

    #[test]
    fn polar_angle_stays_off_the_pole() {
        let (mut controls, mut camera) = rig();
        controls.rotate(Vec2::new(0.0, 10_000.0), 100.0);
        controls.update(&mut camera);
        assert!(camera.eye.is_finite());
        let offset = camera.eye - camera.target;
        assert!(offset.y > 0.0);
        assert!(Vec2::new(offset.x, offset.z).length() > 0.0);
    }

    #[test]
    fn dolly_respects_max_distance() {
        let (mut controls, mut camera) = rig();
        controls.max_distance = 30.0;
        for _ in 0..200 {
            controls.dolly(-1.0);
        }
        controls.update(&mut camera);
        assert!(((camera.eye - camera.target).length() - 30.0).abs() < 1e-3);
    }

    #[test]
    fn dolly_respects_min_distance() {
        let (mut controls, mut camera) = rig();
        controls.min_distance = 2.0;
        for _ in 0..500 {
            controls.dolly(1.0);
        }
        controls.update(&mut camera);
        assert!(((camera.eye - camera.target).length() - 2.0).abs() < 1e-3);
    }

    #[test]
    fn pan_moves_eye_and_target_together() {
        let (mut controls, mut camera) = rig();
        let offset_before = camera.eye - camera.target;
        let target_before = camera.target;
        controls.pan(Vec2::new(40.0, -10.0), 600.0, &camera);
        controls.update(&mut camera);
        assert!(camera.target != target_before);
        assert!(((camera.eye - camera.target) - offset_before).length() < 1e-4);
    }

    #[test]
    fn set_target_reaims_without_moving() {
        let (mut controls, mut camera) = rig();
        let eye = camera.eye;
        controls.set_target(Vec3::new(3.0, 1.0, -2.0), &camera);
        controls.update(&mut camera);
        assert!((camera.eye - eye).length() < 1e-4);
        assert_eq!(camera.target, Vec3::new(3.0, 1.0, -2.0));
    }
}
