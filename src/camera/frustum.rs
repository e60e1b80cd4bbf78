//! View frustum containment tests.
//!
//! Used to check how much of a model a camera actually sees after framing.

use glam::{Mat4, Vec3, Vec4};

use crate::bounds::BoundingBox;

/// Plane `normal · p + offset = 0`, normal pointing into the frustum.
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    /// Unit normal.
    pub normal: Vec3,
    /// Signed offset from the origin.
    pub offset: f32,
}

impl Plane {
    fn from_row(v: Vec4) -> Self {
        let len = v.truncate().length();
        if len > 0.0 {
            Self {
                normal: v.truncate() / len,
                offset: v.w / len,
            }
        } else {
            Self {
                normal: Vec3::ZERO,
                offset: 0.0,
            }
        }
    }

    /// Signed distance, positive on the inside.
    #[inline]
    #[must_use]
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.offset
    }
}

/// The six planes bounding what a camera sees.
#[derive(Debug, Clone)]
pub struct Frustum {
    /// Left, right, bottom, top, near, far.
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Gribb/Hartmann plane extraction for a right-handed projection with
    /// [0,1] depth.
    #[must_use]
    pub fn from_view_projection(vp: Mat4) -> Self {
        let (r0, r1, r2, r3) = (vp.row(0), vp.row(1), vp.row(2), vp.row(3));
        Self {
            planes: [
                Plane::from_row(r3 + r0),
                Plane::from_row(r3 - r0),
                Plane::from_row(r3 + r1),
                Plane::from_row(r3 - r1),
                Plane::from_row(r2),
                Plane::from_row(r3 - r2),
            ],
        }
    }

    /// Whether `point` is inside or on the boundary.
    #[must_use]
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|p| p.signed_distance(point) >= 0.0)
    }

    /// Whether the whole sphere is inside.
    #[must_use]
    pub fn contains_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|p| p.signed_distance(center) >= radius)
    }

    /// Whether every corner of `bounds` is inside.
    #[must_use]
    pub fn contains_box(&self, bounds: &BoundingBox) -> bool {
        !bounds.is_empty()
            && bounds.corners().iter().all(|&c| self.contains_point(c))
    }
}
