//! Ray and bounding-sphere primitives for pointer picking.

use glam::Vec3;

/// A ray with a normalized direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Build a ray; returns `None` for a zero-length or non-finite direction.
    pub fn new(origin: Vec3, direction: Vec3) -> Option<Self> {
        let direction = direction.try_normalize()?;
        origin.is_finite().then_some(Self { origin, direction })
    }

    /// Ray from `origin` through `target`.
    pub fn towards(origin: Vec3, target: Vec3) -> Option<Self> {
        Self::new(origin, target - origin)
    }

    pub fn point_at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

/// Bounding sphere used as a pick volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl PickSphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            center,
            radius: radius.max(0.0),
        }
    }

    /// Distance along `ray` to the first surface crossing, if any.
    ///
    /// A ray starting inside the sphere reports distance 0.
    pub fn intersect(&self, ray: &Ray) -> Option<f32> {
        let oc = ray.origin - self.center;
        let b = oc.dot(ray.direction);
        let c = oc.length_squared() - self.radius * self.radius;
        if c <= 0.0 {
            return Some(0.0);
        }
        // Origin outside and pointing away.
        if b > 0.0 {
            return None;
        }
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }
        Some(-b - discriminant.sqrt())
    }
}
