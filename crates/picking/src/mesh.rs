//! Render-side mesh storage.
//!
//! Positions are kept as a flat `[x, y, z, x, y, z, ...]` buffer so the frame
//! sync can overwrite them in one copy. Triangle topology is fixed at load.

use glam::Vec3;
use thiserror::Error;

use crate::raycast::TriangleSource;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeshError {
    #[error("Position buffer length {0} is not a multiple of 3")]
    PositionLength(usize),
    #[error("Index buffer length {0} is not a multiple of 3")]
    IndexLength(usize),
    #[error("Triangle {triangle} references vertex {index}, mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        triangle: usize,
        index: u32,
        vertex_count: usize,
    },
    #[error("Position copy of {actual} floats does not match mesh storage of {expected}")]
    CopyLength { expected: usize, actual: usize },
}

/// Triangle mesh with mutable positions and immutable topology
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Flat vertex positions, 3 floats per vertex
    positions: Vec<f32>,
    /// Triangle indices, 3 per triangle
    indices: Box<[u32]>,
    /// Set whenever positions change, cleared by the render side
    dirty: bool,
}

impl Mesh {
    /// Build a mesh from flat positions and triangle indices.
    ///
    /// Every index must reference an existing vertex.
    pub fn new(positions: Vec<f32>, indices: Vec<u32>) -> Result<Self, MeshError> {
        if positions.len() % 3 != 0 {
            return Err(MeshError::PositionLength(positions.len()));
        }
        if indices.len() % 3 != 0 {
            return Err(MeshError::IndexLength(indices.len()));
        }

        let vertex_count = positions.len() / 3;
        if let Some((slot, &index)) = indices
            .iter()
            .enumerate()
            .find(|(_, index)| **index as usize >= vertex_count)
        {
            return Err(MeshError::IndexOutOfRange {
                triangle: slot / 3,
                index,
                vertex_count,
            });
        }

        Ok(Self {
            positions,
            indices: indices.into_boxed_slice(),
            dirty: true,
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Flat position buffer
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// Flat triangle index buffer
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Position of a single vertex, `None` if out of range
    pub fn position(&self, vertex: u32) -> Option<Vec3> {
        let base = vertex as usize * 3;
        self.positions
            .get(base..base + 3)
            .map(|p| Vec3::new(p[0], p[1], p[2]))
    }

    /// Positions as an array of `[f32; 3]`, the layout render attributes expect
    pub fn position_triples(&self) -> Vec<[f32; 3]> {
        self.positions
            .chunks_exact(3)
            .map(|p| [p[0], p[1], p[2]])
            .collect()
    }

    /// Mutable access to the flat positions.
    ///
    /// The slice length is fixed, so the vertex count cannot change. Marks the
    /// geometry dirty.
    pub fn positions_mut(&mut self) -> &mut [f32] {
        self.dirty = true;
        &mut self.positions
    }

    /// Overwrite every position from a flat buffer of identical length
    pub fn copy_positions_from(&mut self, source: &[f32]) -> Result<(), MeshError> {
        if source.len() != self.positions.len() {
            return Err(MeshError::CopyLength {
                expected: self.positions.len(),
                actual: source.len(),
            });
        }
        self.positions_mut().copy_from_slice(source);
        Ok(())
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Return and clear the dirty flag
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }
}

impl TriangleSource for Mesh {
    fn triangle_count(&self) -> usize {
        Mesh::triangle_count(self)
    }

    fn triangle_indices(&self, triangle: usize) -> [u32; 3] {
        let base = triangle * 3;
        [
            self.indices[base],
            self.indices[base + 1],
            self.indices[base + 2],
        ]
    }

    fn vertex_position(&self, vertex: u32) -> Vec3 {
        let base = vertex as usize * 3;
        Vec3::new(
            self.positions[base],
            self.positions[base + 1],
            self.positions[base + 2],
        )
    }
}
