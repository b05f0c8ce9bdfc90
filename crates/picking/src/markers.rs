//! Pickable geometry for annotation handle markers.
//!
//! Every marker is an octahedron of fixed radius around its center. Vertices
//! and triangles are generated on demand from the marker list, so moving a
//! marker is a single position write.

use glam::Vec3;

use crate::raycast::TriangleSource;

const OCTAHEDRON_VERTICES: u32 = 6;
const OCTAHEDRON_TRIANGLES: usize = 8;

/// Unit octahedron corner directions
const CORNERS: [Vec3; 6] = [
    Vec3::X,
    Vec3::NEG_X,
    Vec3::Y,
    Vec3::NEG_Y,
    Vec3::Z,
    Vec3::NEG_Z,
];

/// Octahedron faces, indices into `CORNERS`
const FACES: [[u32; 3]; OCTAHEDRON_TRIANGLES] = [
    [0, 2, 4],
    [2, 1, 4],
    [1, 3, 4],
    [3, 0, 4],
    [2, 0, 5],
    [1, 2, 5],
    [3, 1, 5],
    [0, 3, 5],
];

/// A single marker owned by some external key (a handle id)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub owner: u32,
    pub center: Vec3,
}

/// Set of octahedral markers queried as one triangle source
#[derive(Debug, Clone)]
pub struct MarkerSet {
    radius: f32,
    markers: Vec<Marker>,
}

impl MarkerSet {
    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            markers: Vec::new(),
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Add a marker for `owner` at `center`
    pub fn insert(&mut self, owner: u32, center: Vec3) {
        self.markers.push(Marker { owner, center });
    }

    /// Move the marker owned by `owner`. Returns false if there is none.
    pub fn set_center(&mut self, owner: u32, center: Vec3) -> bool {
        match self.markers.iter_mut().find(|m| m.owner == owner) {
            Some(marker) => {
                marker.center = center;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.markers.clear();
    }

    /// Owner of a marker-space vertex index
    pub fn owner_of_vertex(&self, vertex: u32) -> Option<u32> {
        self.markers
            .get((vertex / OCTAHEDRON_VERTICES) as usize)
            .map(|m| m.owner)
    }
}

impl TriangleSource for MarkerSet {
    fn triangle_count(&self) -> usize {
        self.markers.len() * OCTAHEDRON_TRIANGLES
    }

    fn triangle_indices(&self, triangle: usize) -> [u32; 3] {
        let base = (triangle / OCTAHEDRON_TRIANGLES) as u32 * OCTAHEDRON_VERTICES;
        FACES[triangle % OCTAHEDRON_TRIANGLES].map(|corner| base + corner)
    }

    fn vertex_position(&self, vertex: u32) -> Vec3 {
        let marker = &self.markers[(vertex / OCTAHEDRON_VERTICES) as usize];
        marker.center + CORNERS[(vertex % OCTAHEDRON_VERTICES) as usize] * self.radius
    }
}
