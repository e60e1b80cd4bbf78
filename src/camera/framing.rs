//! Camera auto-framing.
//!
//! Places the camera so a bounding box fills the vertical field of view,
//! keeping whatever horizontal direction the camera was already looking
//! from. Framing works on the box diagonal rather than per-axis extents, so
//! long thin models can be under-framed from some azimuths.

use glam::Vec3;

use super::core::Camera;
use crate::bounds::BoundingBox;

/// Multiplier applied to the box diagonal so the model is inset from the
/// frame edges.
pub const FRAME_MARGIN: f32 = 1.2;

/// Smallest extent the framer will work with. A single-point model would
/// otherwise give a zero distance and `znear == zfar == 0`.
pub const MIN_FRAME_EXTENT: f32 = 1e-4;

/// Ratio between box size and the near plane, and between the far plane and
/// box size.
const DEPTH_RANGE_RATIO: f32 = 100.0;

/// Horizontal direction used when the camera sits straight above or below
/// the box center.
const FALLBACK_AZIMUTH: Vec3 = Vec3::Z;

fn clamp_extent(v: f32) -> f32 {
    if v.is_finite() {
        v.max(MIN_FRAME_EXTENT)
    } else {
        MIN_FRAME_EXTENT
    }
}

/// Distance from the center at which a sphere of diameter `size_to_fit`
/// exactly fills a vertical field of view of `fovy_degrees`.
#[must_use]
pub fn fit_distance(size_to_fit: f32, fovy_degrees: f32) -> f32 {
    let half_size = clamp_extent(size_to_fit) * 0.5;
    let half_fov = (fovy_degrees * 0.5).to_radians();
    half_size / half_fov.tan()
}

/// Unit vector in the XZ plane pointing from `center` toward `eye`.
#[must_use]
pub fn horizontal_direction(eye: Vec3, center: Vec3) -> Vec3 {
    ((eye - center) * Vec3::new(1.0, 0.0, 1.0))
        .try_normalize()
        .unwrap_or(FALLBACK_AZIMUTH)
}

/// Reposition `camera` so a box of diagonal `box_size` centered at
/// `box_center` is in view.
///
/// `size_to_fit` is how much of the screen the diagonal should occupy
/// (normally `box_size * FRAME_MARGIN`). Field of view, aspect and up
/// vector are carried over unchanged.
#[must_use]
pub fn frame_area(
    size_to_fit: f32,
    box_size: f32,
    box_center: Vec3,
    camera: &Camera,
) -> Camera {
    let distance = fit_distance(size_to_fit, camera.fovy);
    let direction = horizontal_direction(camera.eye, box_center);
    let box_size = clamp_extent(box_size);

    Camera {
        eye: box_center + direction * distance,
        target: box_center,
        znear: box_size / DEPTH_RANGE_RATIO,
        zfar: box_size * DEPTH_RANGE_RATIO,
        ..*camera
    }
}

/// Frame a bounding box with the standard margin.
#[must_use]
pub fn frame_box(bounds: &BoundingBox, camera: &Camera) -> Camera {
    let size = bounds.size();
    frame_area(size * FRAME_MARGIN, size, bounds.center(), camera)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::frustum::Frustum;

    fn camera_at(eye: Vec3) -> Camera {
        Camera {
            eye,
            ..Camera::default()
        }
    }

    #[test]
    fn distance_matches_pinhole_formula() {
        for fovy in [10.0_f32, 45.0, 90.0, 170.0] {
            for size in [0.5_f32, 1.0, 37.0, 1200.0] {
                let framed = frame_area(
                    size * FRAME_MARGIN,
                    size,
                    Vec3::ZERO,
                    &Camera {
                        fovy,
                        ..camera_at(Vec3::new(0.0, 3.0, 9.0))
                    },
                );
                let expected =
                    (size * FRAME_MARGIN * 0.5) / (fovy * 0.5).to_radians().tan();
                let got = framed.eye.length();
                assert!(
                    (got - expected).abs() <= expected * 1e-5,
                    "fovy {fovy} size {size}: {got} vs {expected}"
                );
                assert!(framed.znear > 0.0);
                assert!(framed.znear < framed.zfar);
            }
        }
    }

    #[test]
    fn near_and_far_scale_with_box_size() {
        let framed = frame_area(24.0, 20.0, Vec3::ZERO, &Camera::default());
        assert!((framed.znear - 0.2).abs() < 1e-6);
        assert!((framed.zfar - 2000.0).abs() < 1e-3);
    }

    #[test]
    fn framing_is_idempotent() {
        let center = Vec3::new(1.0, 2.0, 3.0);
        let start = camera_at(Vec3::new(-4.0, 7.0, 11.0));
        let once = frame_area(6.0, 5.0, center, &start);
        let twice = frame_area(6.0, 5.0, center, &once);
        assert!((once.eye - twice.eye).length() < 1e-5);
        assert_eq!(once.znear, twice.znear);
        assert_eq!(once.zfar, twice.zfar);
    }

    #[test]
    fn azimuth_is_preserved() {
        let center = Vec3::new(5.0, -1.0, 2.0);
        let start = camera_at(Vec3::new(8.0, 40.0, 6.0));
        let framed = frame_area(12.0, 10.0, center, &start);

        let before = horizontal_direction(start.eye, center);
        let offset = framed.eye - center;
        assert!(offset.y.abs() < 1e-6, "camera should sit level with center");
        assert!((offset.normalize() - before).length() < 1e-5);
        assert!((offset.length() - fit_distance(12.0, start.fovy)).abs() < 1e-4);
    }

    #[test]
    fn looks_at_box_center() {
        let center = Vec3::new(0.0, 4.0, 0.0);
        let framed = frame_area(3.0, 2.5, center, &Camera::default());
        assert_eq!(framed.target, center);
        assert!((framed.forward() - (center - framed.eye).normalize()).length() < 1e-6);
    }

    #[test]
    fn camera_directly_above_uses_fallback_azimuth() {
        let center = Vec3::new(1.0, 0.0, 1.0);
        let framed = frame_area(2.0, 1.0, center, &camera_at(Vec3::new(1.0, 50.0, 1.0)));
        assert!(framed.eye.is_finite());
        assert!((framed.eye - center).normalize().abs_diff_eq(FALLBACK_AZIMUTH, 1e-6));
    }

    #[test]
    fn zero_size_box_stays_finite() {
        let framed = frame_area(0.0, 0.0, Vec3::ONE, &Camera::default());
        assert!(framed.eye.is_finite());
        assert!(framed.znear.is_finite() && framed.zfar.is_finite());
        assert!(framed.znear > 0.0);
        assert!(framed.znear < framed.zfar);
        assert!((framed.eye - Vec3::ONE).length() > 0.0);
    }

    #[test]
    fn non_finite_size_is_clamped() {
        let framed = frame_area(f32::NAN, f32::INFINITY, Vec3::ZERO, &Camera::default());
        assert!(framed.eye.is_finite());
        assert!(framed.has_valid_projection());
    }

    #[test]
    fn framed_cube_is_inside_frustum() {
        let bounds = BoundingBox::from_corners(
            Vec3::new(-3.0, 1.0, -3.0),
            Vec3::new(3.0, 7.0, 3.0),
        );
        let start = Camera {
            aspect: 1.0,
            ..Camera::default()
        };
        let framed = frame_box(&bounds, &start);
        let frustum = Frustum::from_view_projection(framed.build_matrix());
        for corner in bounds.corners() {
            assert!(frustum.contains_point(corner), "corner {corner} clipped");
        }
        assert!(frustum.contains_sphere(bounds.center(), bounds.size() * 0.5));
    }
}
