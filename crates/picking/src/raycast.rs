//! Ray-triangle intersection for vertex picking.
//!
//! This module provides ray-triangle intersection using the Moller-Trumbore
//! algorithm and a brute-force nearest-depth search over any triangle source.

use glam::Vec3;

use crate::types::{Ray, EPSILON};

/// Result of a ray-triangle intersection test
#[derive(Debug, Clone, Copy)]
pub struct TriangleHit {
    /// Distance along the ray to the intersection point
    pub t: f32,
    /// Barycentric coordinate u (weight for vertex 1)
    pub u: f32,
    /// Barycentric coordinate v (weight for vertex 2)
    pub v: f32,
}

/// Indexed triangle geometry that a ray can be cast against.
///
/// Implementors guarantee that every index returned by `triangle_indices`
/// is a valid argument to `vertex_position`.
pub trait TriangleSource {
    fn triangle_count(&self) -> usize;

    /// Vertex indices of a triangle, `triangle < triangle_count()`
    fn triangle_indices(&self, triangle: usize) -> [u32; 3];

    /// World-space position of a vertex
    fn vertex_position(&self, vertex: u32) -> Vec3;

    /// World-space corner positions of a triangle
    fn triangle_positions(&self, triangle: usize) -> [Vec3; 3] {
        self.triangle_indices(triangle)
            .map(|vertex| self.vertex_position(vertex))
    }
}

/// Moller-Trumbore ray-triangle intersection algorithm.
///
/// Returns the hit distance and barycentric coordinates if the ray intersects
/// the triangle. Triangles are treated as double sided.
///
/// # Arguments
/// * `ray_origin` - Origin point of the ray
/// * `ray_dir` - Direction of the ray
/// * `v0`, `v1`, `v2` - Triangle vertices
///
/// # Returns
/// `Some(TriangleHit)` if ray intersects, `None` otherwise
pub fn ray_triangle_intersection(
    ray_origin: Vec3,
    ray_dir: Vec3,
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
) -> Option<TriangleHit> {
    // Edge vectors
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    // Begin calculating determinant - also used to calculate u parameter
    let pvec = ray_dir.cross(edge2);
    let det = edge1.dot(pvec);

    // If determinant is near zero, ray lies in plane of triangle or misses
    if det.abs() < EPSILON {
        return None;
    }

    let inv_det = 1.0 / det;

    // Calculate distance from v0 to ray origin
    let tvec = ray_origin - v0;

    // Calculate u parameter and test bounds
    let u = tvec.dot(pvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    // Prepare to test v parameter
    let qvec = tvec.cross(edge1);

    // Calculate v parameter and test bounds
    let v = ray_dir.dot(qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    // Calculate t - ray intersection distance
    let t = edge2.dot(qvec) * inv_det;

    // Only accept hits in front of the ray
    if t < EPSILON {
        return None;
    }

    Some(TriangleHit { t, u, v })
}

/// Cast a ray against every triangle of a source and keep the nearest hit.
///
/// On equal depth the lower triangle index wins.
///
/// # Returns
/// `Some((hit, triangle_id))` for the closest intersection, `None` if no hit
pub fn raycast_nearest<S: TriangleSource + ?Sized>(
    ray: &Ray,
    source: &S,
) -> Option<(TriangleHit, u32)> {
    let mut closest_hit: Option<(TriangleHit, u32)> = None;

    // Test all triangles (brute force, queries run per pointer event, not per frame)
    for tri_idx in 0..source.triangle_count() {
        let [v0, v1, v2] = source.triangle_positions(tri_idx);

        if let Some(hit) = ray_triangle_intersection(ray.origin, ray.direction, v0, v1, v2) {
            let dominated = match &closest_hit {
                Some((prev, _)) => hit.t >= prev.t,
                None => false,
            };
            if !dominated {
                closest_hit = Some((hit, tri_idx as u32));
            }
        }
    }

    closest_hit
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Soup {
        positions: Vec<Vec3>,
        triangles: Vec<[u32; 3]>,
    }

    impl TriangleSource for Soup {
        fn triangle_count(&self) -> usize {
            self.triangles.len()
        }

        fn triangle_indices(&self, triangle: usize) -> [u32; 3] {
            self.triangles[triangle]
        }

        fn vertex_position(&self, vertex: u32) -> Vec3 {
            self.positions[vertex as usize]
        }
    }

    #[test]
    fn test_ray_triangle_hit() {
        // Triangle in XY plane at z=0
        let v0 = Vec3::new(0.0, 0.0, 0.0);
        let v1 = Vec3::new(1.0, 0.0, 0.0);
        let v2 = Vec3::new(0.0, 1.0, 0.0);

        // Ray pointing down at center of triangle
        let origin = Vec3::new(0.25, 0.25, 1.0);
        let dir = Vec3::new(0.0, 0.0, -1.0);

        let hit = ray_triangle_intersection(origin, dir, v0, v1, v2);
        assert!(hit.is_some());

        let hit = hit.unwrap();
        assert!((hit.t - 1.0).abs() < EPSILON);
        assert!((hit.u - 0.25).abs() < EPSILON);
        assert!((hit.v - 0.25).abs() < EPSILON);
    }

    #[test]
    fn test_ray_triangle_miss() {
        let v0 = Vec3::new(0.0, 0.0, 0.0);
        let v1 = Vec3::new(1.0, 0.0, 0.0);
        let v2 = Vec3::new(0.0, 1.0, 0.0);

        // Ray pointing down but missing triangle
        let origin = Vec3::new(2.0, 2.0, 1.0);
        let dir = Vec3::new(0.0, 0.0, -1.0);

        assert!(ray_triangle_intersection(origin, dir, v0, v1, v2).is_none());
    }

    #[test]
    fn test_ray_triangle_behind() {
        let v0 = Vec3::new(0.0, 0.0, 0.0);
        let v1 = Vec3::new(1.0, 0.0, 0.0);
        let v2 = Vec3::new(0.0, 1.0, 0.0);

        // Ray pointing away from triangle
        let origin = Vec3::new(0.25, 0.25, 1.0);
        let dir = Vec3::new(0.0, 0.0, 1.0);

        assert!(ray_triangle_intersection(origin, dir, v0, v1, v2).is_none());
    }

    #[test]
    fn test_back_face_is_hit() {
        let v0 = Vec3::new(0.0, 0.0, 0.0);
        let v1 = Vec3::new(0.0, 1.0, 0.0);
        let v2 = Vec3::new(1.0, 0.0, 0.0);

        let origin = Vec3::new(0.25, 0.25, 1.0);
        let dir = Vec3::new(0.0, 0.0, -1.0);

        assert!(ray_triangle_intersection(origin, dir, v0, v1, v2).is_some());
    }

    #[test]
    fn test_nearest_depth_wins() {
        // Two stacked triangles, the far one listed first
        let soup = Soup {
            positions: vec![
                Vec3::new(-1.0, -1.0, -2.0),
                Vec3::new(1.0, -1.0, -2.0),
                Vec3::new(0.0, 1.0, -2.0),
                Vec3::new(-1.0, -1.0, 0.0),
                Vec3::new(1.0, -1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            triangles: vec![[0, 1, 2], [3, 4, 5]],
        };
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);

        let (hit, triangle) = raycast_nearest(&ray, &soup).unwrap();
        assert_eq!(triangle, 1);
        assert!((hit.t - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_equal_depth_keeps_lowest_triangle() {
        // Same triangle twice at identical depth
        let soup = Soup {
            positions: vec![
                Vec3::new(-1.0, -1.0, 0.0),
                Vec3::new(1.0, -1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            triangles: vec![[0, 1, 2], [2, 1, 0]],
        };
        let ray = Ray::new(Vec3::new(0.0, 0.0, 1.0), Vec3::NEG_Z);

        let (_, triangle) = raycast_nearest(&ray, &soup).unwrap();
        assert_eq!(triangle, 0);
    }

    #[test]
    fn test_empty_source_misses() {
        let soup = Soup {
            positions: vec![],
            triangles: vec![],
        };
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        assert!(raycast_nearest(&ray, &soup).is_none());
    }
}
