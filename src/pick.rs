//! Pointer picking via analytic ray casting.
//!
//! Clicks are resolved by intersecting a camera ray with the ground plane.
//! A miss (ray parallel to the ground, pointing away from it, or landing
//! outside the plane) is a `None`, never a crash.

use cgmath::{Point3, Vector3};

#[derive(Clone, Debug)]
pub struct Ray {
    pub origin: Point3<f32>,
    pub direction: Vector3<f32>,
}

impl Ray {
    /// Intersect with the y = 0 plane the ground lies in.
    pub fn intersect_with_floor(&self) -> Option<Point3<f32>> {
        if self.direction.y.abs() < f32::EPSILON {
            return None;
        }
        let t = -self.origin.y / self.direction.y;
        (t > 0.0).then(|| self.origin + self.direction * t)
    }
}

/// Resolve a click ray against the ground plane.
///
/// `half_extent` is half the ground's edge length; hits beyond it miss the
/// ground mesh and are discarded.
pub fn pick_ground(ray: &Ray, half_extent: f32) -> Option<Point3<f32>> {
    ray.intersect_with_floor()
        .filter(|point| point.x.abs() <= half_extent && point.z.abs() <= half_extent)
}
