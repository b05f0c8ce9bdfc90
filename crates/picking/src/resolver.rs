//! Mesh correspondence resolver.
//!
//! Maps a ray to the nearest intersected triangle and, within it, to the
//! vertex closest to the intersection point. The same routine serves the full
//! face mesh and the handle marker set.

use glam::Vec3;
use tracing::trace;

use crate::raycast::{raycast_nearest, TriangleSource};
use crate::types::{PickResult, Ray};

/// Resolve a ray against a triangle source.
///
/// Returns `None` when the ray misses every triangle. A miss is not an error.
pub fn resolve<S: TriangleSource + ?Sized>(ray: &Ray, source: &S) -> Option<PickResult> {
    let (hit, triangle_id) = raycast_nearest(ray, source)?;
    let world_point = ray.at(hit.t);
    let corners = source.triangle_indices(triangle_id as usize);
    let vertex_index = closest_vertex(source, corners, world_point);

    trace!(
        "Resolved ray to triangle {} vertex {} at {:?}",
        triangle_id,
        vertex_index,
        world_point
    );

    Some(PickResult {
        vertex_index,
        world_point,
        triangle_id,
    })
}

/// Pick the corner with minimum Euclidean distance to `point`.
///
/// Exact ties go to the lowest vertex index, independent of winding order.
pub fn closest_vertex<S: TriangleSource + ?Sized>(
    source: &S,
    corners: [u32; 3],
    point: Vec3,
) -> u32 {
    let mut best = corners[0];
    let mut best_distance = source.vertex_position(best).distance_squared(point);

    for &vertex in &corners[1..] {
        let distance = source.vertex_position(vertex).distance_squared(point);
        if distance < best_distance || (distance == best_distance && vertex < best) {
            best = vertex;
            best_distance = distance;
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Mesh;

    /// Four vertices, one triangle [1, 2, 3]; vertex 0 is unused
    fn single_triangle_mesh() -> Mesh {
        Mesh::new(
            vec![
                9.0, 9.0, 9.0, // 0 (unreferenced)
                2.0, 0.0, 0.0, // 1
                0.0, 0.0, 0.0, // 2
                1.0, 3.0, 0.0, // 3
            ],
            vec![1, 2, 3],
        )
        .unwrap()
    }

    #[test]
    fn test_centroid_tie_breaks_to_lowest_index() {
        let mesh = single_triangle_mesh();
        // Centroid (1, 1, 0) is equidistant from vertices 1 and 2
        let ray = Ray::new(Vec3::new(1.0, 1.0, 5.0), Vec3::NEG_Z);

        let pick = resolve(&ray, &mesh).unwrap();
        assert_eq!(pick.vertex_index, 1);
        assert_eq!(pick.triangle_id, 0);
        assert!((pick.world_point - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_tie_break_ignores_winding() {
        let mesh = Mesh::new(
            vec![
                9.0, 9.0, 9.0, // 0
                2.0, 0.0, 0.0, // 1
                0.0, 0.0, 0.0, // 2
                1.0, 3.0, 0.0, // 3
            ],
            vec![3, 2, 1],
        )
        .unwrap();
        let ray = Ray::new(Vec3::new(1.0, 1.0, 5.0), Vec3::NEG_Z);

        assert_eq!(resolve(&ray, &mesh).unwrap().vertex_index, 1);
    }

    #[test]
    fn test_nearest_vertex_by_distance() {
        let mesh = single_triangle_mesh();
        // Close to vertex 3 at (1, 3)
        let ray = Ray::new(Vec3::new(1.0, 2.5, 5.0), Vec3::NEG_Z);

        assert_eq!(resolve(&ray, &mesh).unwrap().vertex_index, 3);
    }

    #[test]
    fn test_miss_yields_none() {
        let mesh = single_triangle_mesh();
        let ray = Ray::new(Vec3::new(5.0, 5.0, 5.0), Vec3::NEG_Z);

        assert!(resolve(&ray, &mesh).is_none());
    }

    /// Corner nearest to `point` by exhaustive ranking, lowest index on ties
    fn brute_force_nearest(mesh: &Mesh, corners: [u32; 3], point: Vec3) -> u32 {
        let mut ranked: Vec<(f32, u32)> = corners
            .iter()
            .map(|&vertex| (mesh.vertex_position(vertex).distance_squared(point), vertex))
            .collect();
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        ranked[0].1
    }

    #[test]
    fn test_nearest_vertex_matches_exhaustive_search() {
        let shapes = [
            // centroid equidistant from two corners
            [Vec3::new(2.0, 0.0, 0.0), Vec3::ZERO, Vec3::new(1.0, 3.0, 0.0)],
            [Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)],
            // tilted out of the XY plane
            [
                Vec3::new(-1.0, -0.5, 0.3),
                Vec3::new(1.5, -0.2, -0.4),
                Vec3::new(0.2, 1.1, 0.1),
            ],
            // sliver
            [Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0), Vec3::new(2.0, 0.2, 0.0)],
        ];
        let orders = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
        let direction = Vec3::new(0.05, -0.03, -1.0);
        let mut hits = 0;

        for shape in &shapes {
            for order in &orders {
                // corners go to vertex slots 1..=3 in permuted order, slot 0 unused
                let mut positions = vec![9.0; 12];
                for (slot, &corner) in order.iter().enumerate() {
                    positions[(slot + 1) * 3..(slot + 2) * 3]
                        .copy_from_slice(&shape[corner].to_array());
                }

                for corners in [[1, 2, 3], [3, 2, 1], [2, 3, 1]] {
                    let mesh = Mesh::new(positions.clone(), corners.to_vec()).unwrap();

                    for i in 0..=24 {
                        for j in 0..=24 {
                            let x = -1.5 + i as f32 * 0.25;
                            let y = -1.0 + j as f32 * 0.1875;
                            let ray = Ray::new(Vec3::new(x, y, 5.0), direction);
                            let Some(pick) = resolve(&ray, &mesh) else {
                                continue;
                            };
                            hits += 1;

                            assert_eq!(pick.triangle_id, 0);
                            assert_eq!(
                                pick.vertex_index,
                                brute_force_nearest(&mesh, corners, pick.world_point),
                                "ray {:?} over {:?} with order {:?}",
                                ray,
                                shape,
                                order
                            );
                        }
                    }
                }
            }
        }

        assert!(hits > 500);
    }
}
