use glam::Vec3;

/// Epsilon for floating point comparisons in ray intersection
pub const EPSILON: f32 = 1e-6;

/// A world-space ray.
///
/// The direction does not have to be normalized; hit distances are then
/// expressed in multiples of the direction length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Point at parameter `t` along the ray
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Result of resolving a ray against a triangle source.
///
/// `vertex_index` and `triangle_id` are expressed in the index space of the
/// source that was queried (mesh vertices, or marker vertices for handles).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickResult {
    /// Closest vertex of the hit triangle to the intersection point
    pub vertex_index: u32,
    /// World-space intersection point
    pub world_point: Vec3,
    /// Index of the nearest intersected triangle
    pub triangle_id: u32,
}

/// Infinite plane in Hessian normal form: `normal . p + constant = 0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub constant: f32,
}

impl Plane {
    /// Plane through `point` with the given normal (normalized here)
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.normalize_or_zero();
        Self {
            normal,
            constant: -normal.dot(point),
        }
    }

    /// Signed distance from a point to the plane
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.constant
    }

    /// Intersect a ray with the plane.
    ///
    /// Returns `None` when the ray is parallel to the plane or when the plane
    /// lies behind the ray origin.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<Vec3> {
        let denom = self.normal.dot(ray.direction);
        if denom.abs() < EPSILON {
            return None;
        }

        let t = -self.distance_to_point(ray.origin) / denom;
        if t < 0.0 {
            return None;
        }

        Some(ray.at(t))
    }
}
